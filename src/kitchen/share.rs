use url::form_urlencoded;

use crate::dataset::SymbolId;
use super::selection::{Selection, SelectionError};

/// Query parameter carrying one pick, repeated per pick.
pub const SHARE_PARAM: &str = "clicked";

/// `clicked=1f600&clicked=1f602`; empty for an empty selection.
pub fn encode_selection(selection: &Selection) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for pick in selection.picks() {
        serializer.append_pair(SHARE_PARAM, pick.as_str());
    }
    serializer.finish()
}

/// Accepts a bare query string, one with a leading `?`, or a full URL.
/// Unrelated parameters are ignored.
pub fn decode_selection(link: &str) -> Result<Selection, SelectionError> {
    let query = match link.split_once('?') {
        Some((_, query)) => query,
        None => link,
    };
    let query = query.split('#').next().unwrap_or_default();

    let mut picks = Vec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key != SHARE_PARAM {
            continue;
        }
        let id = SymbolId::parse(&value).map_err(|e| SelectionError::InvalidLink(e.to_string()))?;
        picks.push(id);
    }

    Ok(Selection::from_ids(picks))
}
