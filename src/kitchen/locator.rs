use crate::dataset::{PairRecord, SymbolId};

pub const DEFAULT_COMPOSITE_HOST: &str = "https://www.gstatic.com/android/keyboard/emojikitchen";
pub const DEFAULT_GLYPH_HOST: &str = "https://raw.githubusercontent.com/googlefonts/noto-emoji/main/png/128";

/// Builds URLs into the external asset stores. Pure string construction.
#[derive(Debug, Clone)]
pub struct AssetLocator {
    composite_host: String,
    glyph_host: String,
}

impl Default for AssetLocator {
    fn default() -> Self {
        Self::new(DEFAULT_COMPOSITE_HOST, DEFAULT_GLYPH_HOST)
    }
}

/// `1f468-200d-1f373` -> `1f468-u200d-u1f373`
fn store_segment(id: &SymbolId) -> String {
    id.as_str().replace('-', "-u")
}

impl AssetLocator {
    pub fn new(composite_host: impl Into<String>, glyph_host: impl Into<String>) -> Self {
        Self {
            composite_host: composite_host.into().trim_end_matches('/').to_string(),
            glyph_host: glyph_host.into().trim_end_matches('/').to_string(),
        }
    }

    /// Composite image path, in the record's stored order.
    pub fn build_asset_locator(&self, record: &PairRecord) -> String {
        let left = store_segment(&record.left);
        let right = store_segment(&record.right);
        format!(
            "{}/{}/u{}/u{}_u{}.png",
            self.composite_host, record.date, left, left, right
        )
    }

    pub fn glyph_locator(&self, id: &SymbolId) -> String {
        format!("{}/emoji_u{}.png", self.glyph_host, id)
    }
}
