use serde::Serialize;

use crate::dataset::SymbolId;
use super::locator::AssetLocator;
use super::selection::{Selection, SelectionState};

/// One of the two input slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Slot {
    Placeholder,
    Glyph { id: SymbolId, emoji: String, image: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// No record for the pair.
    NotFound,
    /// A record exists but the store did not confirm the image.
    AssetUnavailable,
}

/// The result panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    /// Fewer than two picks; nothing was looked up.
    Unresolved,
    NoCombination { reason: MissReason },
    Composite { image: String, date: String, left: SymbolId, right: SymbolId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub state: SelectionState,
    pub first: Slot,
    pub second: Slot,
    pub result: ResultView,
}

impl ViewModel {
    /// Pure projection of a selection and its resolved result.
    pub fn render(selection: &Selection, locator: &AssetLocator, result: ResultView) -> Self {
        let slot = |pick: Option<&SymbolId>| match pick {
            Some(id) => Slot::Glyph {
                id: id.clone(),
                emoji: id.to_emoji(),
                image: locator.glyph_locator(id),
            },
            None => Slot::Placeholder,
        };

        let picks = selection.picks();
        Self {
            state: selection.state(),
            first: slot(picks.first()),
            second: slot(picks.get(1)),
            result,
        }
    }

    /// One-line text form for terminals: `😀 + ? = ❌`.
    pub fn summary(&self) -> String {
        let glyph = |slot: &Slot| match slot {
            Slot::Glyph { emoji, .. } => emoji.clone(),
            Slot::Placeholder => "?".to_string(),
        };
        let result = match &self.result {
            ResultView::Unresolved => "?".to_string(),
            ResultView::NoCombination { .. } => "❌".to_string(),
            ResultView::Composite { image, .. } => image.clone(),
        };
        format!("{} + {} = {}", glyph(&self.first), glyph(&self.second), result)
    }
}
