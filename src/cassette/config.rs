//! Per-port cassette selection for replay.

use std::path::{Path, PathBuf};

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Cassette file per port. A port left `None` panics if used during replay.
#[derive(Debug, Clone, Default)]
pub struct CassetteConfig {
    /// Cassette for the clock port.
    pub clock: Option<PathBuf>,
    /// Cassette for the record store port.
    pub store: Option<PathBuf>,
}

/// Replayers loaded from a [`CassetteConfig`].
pub struct PortReplayers {
    /// Replayer for the clock port.
    pub clock: Option<CassetteReplayer>,
    /// Replayer for the record store port.
    pub store: Option<CassetteReplayer>,
}

impl CassetteConfig {
    /// A config with no cassettes; every port panics when called.
    #[must_use]
    pub fn panic_on_unspecified() -> Self {
        Self::default()
    }

    /// Reads and parses one cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cassette(path: &Path) -> Result<Cassette, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }

    /// Loads every configured cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured cassette cannot be read or parsed.
    pub fn load_all(&self) -> Result<PortReplayers, String> {
        let load = |path: &Option<PathBuf>| -> Result<Option<CassetteReplayer>, String> {
            path.as_deref()
                .map(|p| Self::load_cassette(p).map(|c| CassetteReplayer::new(&c)))
                .transpose()
        };
        Ok(PortReplayers { clock: load(&self.clock)?, store: load(&self.store)? })
    }
}
