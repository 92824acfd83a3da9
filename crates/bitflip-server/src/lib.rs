//! Bitflip Server - REST interface to the 3-qubit bit-flip code.
//!
//! Exposes encoding, error injection, correction, statevector analysis and
//! majority-vote decoding over JSON, plus a small local blob store for
//! uploading and downloading files.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bitflip_server::{AppState, ServerConfig, create_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let addr = config.socket_addr()?;
//!     let state = Arc::new(AppState::new(config)?);
//!
//!     let app = create_router(state);
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod blob;
pub mod config;
pub mod dto;
pub mod error;
pub mod server;
pub mod state;

pub use blob::{BlobError, BlobInfo, BlobStore, StoredBlob};
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use server::create_router;
pub use state::AppState;
