// =============================================================================
// Shared Server State
// =============================================================================
//
// The analysis pipeline itself is stateless. The server only shares:
//   - the default AnalysisConfig (parking_lot::RwLock, replaced via the API)
//   - a lock-free counter of successful analyses
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::config::AnalysisConfig;

pub struct AppState {
    config: RwLock<AnalysisConfig>,
    analyses_served: AtomicU64,
}

impl AppState {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config: RwLock::new(config),
            analyses_served: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current defaults; the lock is released on return.
    pub fn config(&self) -> AnalysisConfig {
        self.config.read().clone()
    }

    pub fn replace_config(&self, config: AnalysisConfig) {
        *self.config.write() = config;
    }

    pub fn record_analysis(&self) -> u64 {
        self.analyses_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn analyses_served(&self) -> u64 {
        self.analyses_served.load(Ordering::Relaxed)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
