use std::path::Path;

use crate::{
    document::history::HistoryOpts,
    foundation::{
        core::{Rgba8, hex_color},
        error::{LayerfoldError, LayerfoldResult},
    },
};

/// Editor preferences consulted by the layer reductions. Missing JSON fields take their
/// defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Prefs {
    /// Color that fills the background layer where it has no pixels.
    #[serde(with = "hex_color")]
    pub bg_color: Rgba8,
    /// Weight blend modes by backdrop alpha instead of the legacy formula.
    pub new_blend: bool,
    pub undo: HistoryOpts,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            bg_color: [255, 255, 255, 255],
            new_blend: true,
            undo: HistoryOpts::default(),
        }
    }
}

impl Prefs {
    pub fn from_json_str(s: &str) -> LayerfoldResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> LayerfoldResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LayerfoldError::from(
                anyhow::Error::new(e).context(format!("read prefs '{}'", path.display())),
            )
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/prefs.rs"]
mod tests;
