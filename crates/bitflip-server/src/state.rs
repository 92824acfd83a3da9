//! Application state for the REST server.

use std::sync::Arc;

use bitflip_adapter_sim::SimulatorBackend;
use bitflip_hal::Backend;

use crate::blob::{BlobError, BlobStore};
use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Simulator used by every circuit endpoint.
    pub backend: Arc<SimulatorBackend>,
    /// Server configuration.
    pub config: ServerConfig,
    /// Upload directory.
    pub blobs: BlobStore,
}

impl AppState {
    /// Create state with a fresh simulator, opening the upload directory.
    pub fn new(config: ServerConfig) -> Result<Self, BlobError> {
        Self::with_backend(config, SimulatorBackend::new())
    }

    /// Create state around an existing simulator (e.g., a seeded one).
    pub fn with_backend(config: ServerConfig, backend: SimulatorBackend) -> Result<Self, BlobError> {
        let blobs = BlobStore::open(
            config.upload_dir.clone(),
            config.allowed_extensions.clone(),
            config.max_upload_bytes,
        )?;
        let backend_cap = backend.capabilities().max_shots;
        if config.max_shots > backend_cap {
            tracing::warn!(
                max_shots = config.max_shots,
                backend_cap,
                "max_shots exceeds the simulator limit, capping requests"
            );
        }
        Ok(Self {
            backend: Arc::new(backend),
            config,
            blobs,
        })
    }

    /// Largest shot count a request may ask for: the configured limit, never
    /// above what the simulator accepts.
    pub fn max_shots(&self) -> u32 {
        self.config
            .max_shots
            .min(self.backend.capabilities().max_shots)
    }

    /// Resolve the shot count of a request against the shot limits.
    pub fn shots(&self, requested: Option<u32>) -> Result<u32, bitflip_qec::QecError> {
        let shots = requested.unwrap_or(self.config.default_shots);
        let max = self.max_shots();
        if shots > max {
            return Err(bitflip_qec::QecError::invalid(format!(
                "shots must be at most {max}, got {shots}"
            )));
        }
        Ok(shots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(max_shots: u32, default_shots: u32) -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            upload_dir: dir.path().to_path_buf(),
            max_shots,
            default_shots,
            ..ServerConfig::default()
        };
        (AppState::new(config).unwrap(), dir)
    }

    #[test]
    fn test_shots_default_and_limit() {
        let (state, _dir) = state_with(500, 100);
        assert_eq!(state.shots(None).unwrap(), 100);
        assert_eq!(state.shots(Some(500)).unwrap(), 500);
        assert!(state.shots(Some(501)).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_shots_capped_by_simulator() {
        let (state, _dir) = state_with(200_000, 1000);
        let cap = state.backend.capabilities().max_shots;
        assert_eq!(state.max_shots(), cap);
        assert_eq!(state.shots(Some(cap)).unwrap(), cap);
        assert!(state.shots(Some(cap + 1)).unwrap_err().is_invalid_input());
    }
}
