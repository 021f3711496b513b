use serde::{Deserialize, Serialize};

/// Presentation settings for listing pages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
    /// Quotes per listing page. Values below 1 are treated as 1.
    /// TOML: `board.page_size`. Default: `10`.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl BoardConfig {
    pub fn page_size(&self) -> u32 {
        self.page_size.max(1)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}
