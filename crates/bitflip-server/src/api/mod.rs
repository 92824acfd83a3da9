//! API endpoint handlers.

pub mod blobs;
pub mod docs;
pub mod health;
pub mod qec;
