use nd_types::DEFAULT_DTYPE_SAMPLE_LIMIT;
use serde::{Deserialize, Serialize};

use crate::FrameError;

/// Per-container settings. Derived containers inherit their source's config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Rows rendered by `Display` before the middle is elided.
    pub max_display_rows: usize,
    /// Values inspected per column by dtype inference. Zero samples nothing.
    pub dtype_sample_limit: usize,
    /// Skip the column-major cache; column reads scan the rows instead.
    pub low_memory_mode: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_display_rows: 10,
            dtype_sample_limit: DEFAULT_DTYPE_SAMPLE_LIMIT,
            low_memory_mode: false,
        }
    }
}

impl FrameConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, FrameError> {
        serde_json::from_str(raw).map_err(|err| FrameError::Format(format!("config: {err}")))
    }

    #[must_use]
    pub fn with_low_memory_mode(mut self, enabled: bool) -> Self {
        self.low_memory_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_dtype_sample_limit(mut self, limit: usize) -> Self {
        self.dtype_sample_limit = limit;
        self
    }

    #[must_use]
    pub fn with_max_display_rows(mut self, rows: usize) -> Self {
        self.max_display_rows = rows;
        self
    }
}
