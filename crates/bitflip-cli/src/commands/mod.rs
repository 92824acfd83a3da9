//! CLI command implementations.

pub mod batch;
pub mod common;
pub mod compare;
pub mod correct;
pub mod encode;
pub mod error;
pub mod majority;
pub mod pipeline;
pub mod statevector;
