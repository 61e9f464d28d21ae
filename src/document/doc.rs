use crate::{
    document::{history::UndoHistory, prefs::Prefs},
    foundation::{
        core::{Rgba8, TRANSPARENT},
        error::LayerfoldResult,
        ids::LayerId,
    },
    model::sprite::Sprite,
};

/// Emitted after a merge down has composited `src` into `dst` and before `src` is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerMergedDown {
    pub src: LayerId,
    pub dst: LayerId,
}

pub trait DocObserver {
    fn on_layer_merged_down(&mut self, _ev: &LayerMergedDown) {}
}

/// An editing session: the sprite, its undo history, preferences and observers.
pub struct Document {
    pub(crate) sprite: Sprite,
    pub(crate) history: UndoHistory,
    prefs: Prefs,
    observers: Vec<Box<dyn DocObserver>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("sprite", &self.sprite)
            .field("history", &self.history)
            .field("prefs", &self.prefs)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Document {
    pub fn new(sprite: Sprite, prefs: Prefs) -> Self {
        Self {
            history: UndoHistory::new(prefs.undo),
            sprite,
            prefs,
            observers: vec![],
        }
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    /// Direct access for building the sprite. Edits made here are not recorded.
    pub fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    pub fn into_sprite(self) -> Sprite {
        self.sprite
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn prefs(&self) -> &Prefs {
        &self.prefs
    }

    pub fn bg_color(&self) -> Rgba8 {
        self.prefs.bg_color
    }

    /// Color that clears `layer`: the preferred background color for the background
    /// layer, transparent for every other layer.
    pub fn color_to_clear_layer(&self, layer: LayerId) -> Rgba8 {
        match self.sprite.layer(layer) {
            Some(l) if l.is_background() => self.prefs.bg_color,
            _ => TRANSPARENT,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn DocObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn notify_layer_merged_down(&mut self, src: LayerId, dst: LayerId) {
        let ev = LayerMergedDown { src, dst };
        tracing::debug!(src = %src, dst = %dst, "layer merged down");
        for o in &mut self.observers {
            o.on_layer_merged_down(&ev);
        }
    }

    /// Reverts the newest history entry and returns its label.
    pub fn undo(&mut self) -> LayerfoldResult<String> {
        self.history.undo(&mut self.sprite)
    }

    pub fn redo(&mut self) -> LayerfoldResult<String> {
        self.history.redo(&mut self.sprite)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/doc.rs"]
mod tests;
