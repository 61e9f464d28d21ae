use crate::{
    cmd::Cmd,
    foundation::{
        error::{LayerfoldError, LayerfoldResult},
        ids::LayerId,
    },
    model::{
        layer::Layer,
        sprite::{DetachedLayer, Sprite},
    },
    render::blend::BlendMode,
};

/// Inserts a layer subtree into `parent`, directly above `after` (at the bottom when
/// `after` is `None`).
#[derive(Debug)]
pub struct AddLayer {
    parent: LayerId,
    after: Option<LayerId>,
    id: LayerId,
    pending: Option<DetachedLayer>,
}

impl AddLayer {
    pub(crate) fn new(parent: LayerId, after: Option<LayerId>, layer: DetachedLayer) -> Self {
        Self {
            parent,
            after,
            id: layer.root,
            pending: Some(layer),
        }
    }

    /// An empty image layer. `id` comes from [`Sprite::alloc_layer_id`].
    pub fn image_layer(
        parent: LayerId,
        after: Option<LayerId>,
        id: LayerId,
        name: impl Into<String>,
    ) -> Self {
        Self::new(parent, after, DetachedLayer::new(Layer::new_image(id, name)))
    }

    pub fn layer_id(&self) -> LayerId {
        self.id
    }

    fn insert_index(&self, sprite: &Sprite) -> LayerfoldResult<usize> {
        let Some(after) = self.after else {
            return Ok(0);
        };
        let anchor = sprite.try_layer(after)?;
        if anchor.parent() != Some(self.parent) {
            return Err(LayerfoldError::validation(format!(
                "layer {after} is not a child of {}",
                self.parent
            )));
        }
        sprite
            .index_in_parent(after)
            .map(|i| i + 1)
            .ok_or_else(|| LayerfoldError::validation(format!("layer {after} is not linked")))
    }
}

impl Cmd for AddLayer {
    fn label(&self) -> &'static str {
        "add layer"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let index = self.insert_index(sprite)?;
        let layer = self.pending.take().ok_or_else(|| {
            LayerfoldError::history(format!("layer {} is already in the sprite", self.id))
        })?;
        sprite.attach_layer(layer, self.parent, index)
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let (layer, _, _) = sprite.detach_layer(self.id)?;
        self.pending = Some(layer);
        Ok(())
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.pending.as_ref().map_or(0, DetachedLayer::mem_size)
    }
}

/// Removes a layer with its whole subtree; undo puts it back at the same parent and index.
#[derive(Debug)]
pub struct RemoveLayer {
    id: LayerId,
    removed: Option<(DetachedLayer, LayerId, usize)>,
}

impl RemoveLayer {
    pub fn new(id: LayerId) -> Self {
        Self { id, removed: None }
    }
}

impl Cmd for RemoveLayer {
    fn label(&self) -> &'static str {
        "remove layer"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        self.removed = Some(sprite.detach_layer(self.id)?);
        Ok(())
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let (layer, parent, index) = self.removed.take().ok_or_else(|| {
            LayerfoldError::history(format!("layer {} was not removed", self.id))
        })?;
        sprite.attach_layer(layer, parent, index)
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.removed.as_ref().map_or(0, |(l, _, _)| l.mem_size())
    }
}

#[derive(Debug)]
pub struct SetLayerOpacity {
    id: LayerId,
    old: u8,
    new: u8,
}

impl SetLayerOpacity {
    pub fn new(id: LayerId, opacity: u8) -> Self {
        Self {
            id,
            old: opacity,
            new: opacity,
        }
    }
}

impl Cmd for SetLayerOpacity {
    fn label(&self) -> &'static str {
        "set layer opacity"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let layer = sprite.try_layer_mut(self.id)?;
        self.old = layer.opacity;
        layer.opacity = self.new;
        Ok(())
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        sprite.try_layer_mut(self.id)?.opacity = self.old;
        Ok(())
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

#[derive(Debug)]
pub struct SetLayerBlendMode {
    id: LayerId,
    old: BlendMode,
    new: BlendMode,
}

impl SetLayerBlendMode {
    pub fn new(id: LayerId, mode: BlendMode) -> Self {
        Self {
            id,
            old: mode,
            new: mode,
        }
    }
}

impl Cmd for SetLayerBlendMode {
    fn label(&self) -> &'static str {
        "set layer blend mode"
    }

    fn execute(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        let layer = sprite.try_layer_mut(self.id)?;
        self.old = layer.blend_mode;
        layer.blend_mode = self.new;
        Ok(())
    }

    fn undo(&mut self, sprite: &mut Sprite) -> LayerfoldResult<()> {
        sprite.try_layer_mut(self.id)?.blend_mode = self.old;
        Ok(())
    }

    fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cmd/layer.rs"]
mod tests;
