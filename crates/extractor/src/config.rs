use serde::{Deserialize, Serialize};

/// Default window size, in characters.
pub const DEFAULT_WINDOW_CHARS: usize = 1000;

/// Configuration for keyword-window classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Size of each scanned window in characters (the last window may be shorter)
    pub window_chars: usize,

    /// Modality names that select the biologic rule set (compared case-insensitively)
    pub biologic_modalities: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            window_chars: DEFAULT_WINDOW_CHARS,
            biologic_modalities: ["mAb", "CAR-T", "Fusion Protein", "AAV Gene Therapy", "ADC"]
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl ExtractorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window_chars == 0 {
            return Err("window_chars must be > 0".to_string());
        }

        if let Some(blank) = self
            .biologic_modalities
            .iter()
            .position(|name| name.trim().is_empty())
        {
            return Err(format!("biologic_modalities[{blank}] must be non-empty"));
        }

        Ok(())
    }

    /// Whether `modality` names a biologic product class.
    pub fn is_biologic(&self, modality: &str) -> bool {
        let modality = modality.to_lowercase();
        self.biologic_modalities
            .iter()
            .any(|name| name.to_lowercase() == modality)
    }
}
