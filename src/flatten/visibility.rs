use std::ops::{Deref, DerefMut};

use crate::{
    document::transaction::Transaction, foundation::ids::LayerId,
    model::selected_layers::SelectedLayers,
};

/// Shows exactly the layers of a selection for as long as the guard lives.
///
/// Flags are flipped in place without going through the history and are put back when
/// the guard drops, including during unwinding. Commands can still be issued through the
/// guard, which dereferences to the wrapped transaction.
pub(crate) struct VisibilityOverride<'t, 'd> {
    tx: &'t mut Transaction<'d>,
    saved: Vec<(LayerId, bool)>,
}

impl<'t, 'd> VisibilityOverride<'t, 'd> {
    pub(crate) fn show_only(tx: &'t mut Transaction<'d>, shown: &SelectedLayers) -> Self {
        let sprite = tx.sprite_mut();
        let mut saved = vec![];
        for id in sprite.all_layers() {
            let visible = shown.contains(id);
            if let Some(layer) = sprite.layer_mut(id)
                && layer.visible != visible
            {
                saved.push((id, layer.visible));
                layer.visible = visible;
            }
        }
        tracing::trace!(changed = saved.len(), "visibility override");
        Self { tx, saved }
    }
}

impl<'d> Deref for VisibilityOverride<'_, 'd> {
    type Target = Transaction<'d>;

    fn deref(&self) -> &Self::Target {
        self.tx
    }
}

impl DerefMut for VisibilityOverride<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tx
    }
}

impl Drop for VisibilityOverride<'_, '_> {
    fn drop(&mut self) {
        let sprite = self.tx.sprite_mut();
        for (id, visible) in self.saved.drain(..) {
            if let Some(layer) = sprite.layer_mut(id) {
                layer.visible = visible;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/flatten/visibility.rs"]
mod tests;
