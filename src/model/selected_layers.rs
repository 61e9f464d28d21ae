use std::collections::BTreeSet;

use crate::{
    foundation::{
        error::{LayerfoldError, LayerfoldResult},
        ids::LayerId,
    },
    model::sprite::Sprite,
};

/// A set of layers picked by the user as flatten or merge targets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectedLayers {
    ids: BTreeSet<LayerId>,
}

impl FromIterator<LayerId> for SelectedLayers {
    fn from_iter<I: IntoIterator<Item = LayerId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl SelectedLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: LayerId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.ids.iter().copied()
    }

    /// Every id must resolve to a live, non-root layer.
    pub fn validate(&self, sprite: &Sprite) -> LayerfoldResult<()> {
        for &id in &self.ids {
            sprite.try_layer(id)?;
            if id == sprite.root() {
                return Err(LayerfoldError::validation(
                    "the root layer cannot be selected",
                ));
            }
        }
        Ok(())
    }

    /// Drops every selected layer that has a selected ancestor, so a group and its own
    /// children are never composited twice.
    pub fn remove_children_if_parent_is_selected(&mut self, sprite: &Sprite) {
        let snapshot = self.ids.clone();
        self.ids
            .retain(|&id| !snapshot.iter().any(|&other| sprite.is_ancestor(other, id)));
    }

    /// The selection closed over ancestors (so the selected layers are reachable) and over
    /// descendants of selected groups.
    pub fn propagate_selection(&self, sprite: &Sprite) -> SelectedLayers {
        let mut out = self.ids.clone();
        let all = sprite.all_layers();
        for &id in &self.ids {
            out.extend(all.iter().copied().filter(|&l| sprite.is_ancestor(id, l)));
            let mut parent = sprite.layer(id).and_then(|l| l.parent());
            while let Some(p) = parent {
                if p == sprite.root() {
                    break;
                }
                out.insert(p);
                parent = sprite.layer(p).and_then(|l| l.parent());
            }
        }
        SelectedLayers { ids: out }
    }

    /// Image layers denoted by the selection, bottom to top, with selected groups expanded
    /// to their image descendants. This order is the stack order used by flattening.
    pub fn to_browsable_layer_list(&self, sprite: &Sprite) -> Vec<LayerId> {
        if self.ids.is_empty() {
            return vec![];
        }
        sprite
            .image_layers()
            .into_iter()
            .filter(|&id| {
                self.ids.contains(&id)
                    || self.ids.iter().any(|&sel| sprite.is_ancestor(sel, id))
            })
            .collect()
    }

    /// Selected ids in stack order (bottom to top, a group before its children).
    pub fn in_stack_order(&self, sprite: &Sprite) -> Vec<LayerId> {
        sprite
            .all_layers()
            .into_iter()
            .filter(|id| self.ids.contains(id))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/selected_layers.rs"]
mod tests;
