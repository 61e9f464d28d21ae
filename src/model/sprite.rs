use std::{collections::BTreeMap, sync::Arc};

use crate::{
    foundation::{
        core::{Canvas, FrameIndex, IRect, Point, Rgba8, TRANSPARENT, format_hex_color},
        error::{LayerfoldError, LayerfoldResult},
        ids::{CelId, IdAllocator, ImageId, LayerId},
    },
    model::{
        cel::Cel,
        image::{Image, ImageRef},
        layer::{Layer, LayerKind},
    },
};

/// Animated sprite: canvas, timeline length and the layer tree with its cels.
///
/// Layers and cels live in id-keyed tables; the tree only stores ids. Every reference held
/// outside the sprite (selections, undo records) is an id resolved at the moment of use.
#[derive(Clone, Debug)]
pub struct Sprite {
    canvas: Canvas,
    total_frames: u32,
    transparent_color: Rgba8,
    root: LayerId,
    layers: BTreeMap<LayerId, Layer>,
    cels: BTreeMap<CelId, Cel>,
    ids: IdAllocator,
}

/// A layer subtree taken out of a sprite (or built outside of it) together with its cels.
#[derive(Clone, Debug)]
pub(crate) struct DetachedLayer {
    pub(crate) root: LayerId,
    /// Pre-order; `layers[0]` is the subtree root.
    pub(crate) layers: Vec<Layer>,
    pub(crate) cels: Vec<Cel>,
}

impl DetachedLayer {
    pub(crate) fn new(layer: Layer) -> Self {
        Self {
            root: layer.id,
            layers: vec![layer],
            cels: vec![],
        }
    }

    /// Adds a cel to the subtree root, which must be an image layer.
    pub(crate) fn push_cel(&mut self, mut cel: Cel) -> LayerfoldResult<()> {
        let root_id = self.root;
        let LayerKind::Image { cels } = &mut self.layers[0].kind else {
            return Err(LayerfoldError::validation(format!(
                "cannot add a cel to group layer {root_id}"
            )));
        };
        if cels.contains_key(&cel.frame) {
            return Err(LayerfoldError::validation(format!(
                "layer {root_id} already has a cel at frame {}",
                cel.frame
            )));
        }
        cel.layer = root_id;
        cels.insert(cel.frame, cel.id);
        self.cels.push(cel);
        Ok(())
    }

    pub(crate) fn mem_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.layers.len() * std::mem::size_of::<Layer>()
            + self
                .cels
                .iter()
                .map(|c| std::mem::size_of::<Cel>() + c.image().byte_len())
                .sum::<usize>()
    }
}

impl Sprite {
    pub fn new(canvas: Canvas, total_frames: u32) -> LayerfoldResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(LayerfoldError::validation("canvas width/height must be > 0"));
        }
        if total_frames == 0 {
            return Err(LayerfoldError::validation("sprite must have at least one frame"));
        }
        let mut ids = IdAllocator::default();
        let root = ids.layer();
        let mut layers = BTreeMap::new();
        layers.insert(root, Layer::new_group(root, "root"));
        Ok(Self {
            canvas,
            total_frames,
            transparent_color: TRANSPARENT,
            root,
            layers,
            cels: BTreeMap::new(),
            ids,
        })
    }

    /// Rebuilds a sprite from raw tables. Used by the document loader, which validates
    /// the result with [`Sprite::validate`].
    pub(crate) fn from_parts(
        canvas: Canvas,
        total_frames: u32,
        transparent_color: Rgba8,
        root: LayerId,
        layers: BTreeMap<LayerId, Layer>,
        cels: BTreeMap<CelId, Cel>,
        ids: IdAllocator,
    ) -> Self {
        Self {
            canvas,
            total_frames,
            transparent_color,
            root,
            layers,
            cels,
            ids,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn bounds(&self) -> IRect {
        self.canvas.bounds()
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn frames(&self) -> impl Iterator<Item = FrameIndex> + use<> {
        (0..self.total_frames).map(FrameIndex)
    }

    pub fn transparent_color(&self) -> Rgba8 {
        self.transparent_color
    }

    pub fn root(&self) -> LayerId {
        self.root
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn try_layer(&self, id: LayerId) -> LayerfoldResult<&Layer> {
        self.layers.get(&id).ok_or(LayerfoldError::UnknownLayer(id))
    }

    /// Direct access for building a sprite. Edits made here bypass the undo history.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(&id)
    }

    pub(crate) fn try_layer_mut(&mut self, id: LayerId) -> LayerfoldResult<&mut Layer> {
        self.layers
            .get_mut(&id)
            .ok_or(LayerfoldError::UnknownLayer(id))
    }

    pub fn cel(&self, id: CelId) -> Option<&Cel> {
        self.cels.get(&id)
    }

    pub fn try_cel(&self, id: CelId) -> LayerfoldResult<&Cel> {
        self.cels.get(&id).ok_or(LayerfoldError::UnknownCel(id))
    }

    /// Direct access for building a sprite. Edits made here bypass the undo history.
    pub fn cel_mut(&mut self, id: CelId) -> Option<&mut Cel> {
        self.cels.get_mut(&id)
    }

    pub(crate) fn try_cel_mut(&mut self, id: CelId) -> LayerfoldResult<&mut Cel> {
        self.cels.get_mut(&id).ok_or(LayerfoldError::UnknownCel(id))
    }

    pub fn cel_at(&self, layer: LayerId, frame: FrameIndex) -> Option<&Cel> {
        let id = self.layers.get(&layer)?.cel_id(frame)?;
        self.cels.get(&id)
    }

    pub fn cels(&self) -> impl Iterator<Item = &Cel> {
        self.cels.values()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn alloc_layer_id(&mut self) -> LayerId {
        self.ids.layer()
    }

    pub fn alloc_cel_id(&mut self) -> CelId {
        self.ids.cel()
    }

    pub fn alloc_image_id(&mut self) -> ImageId {
        self.ids.image()
    }

    /// A mask-colored image with a fresh id.
    pub fn new_image(&mut self, width: u32, height: u32) -> Image {
        Image::new(self.ids.image(), width, height)
    }

    /// Number of *other* cels sharing this cel's image.
    pub fn cel_links(&self, id: CelId) -> usize {
        let Some(cel) = self.cels.get(&id) else {
            return 0;
        };
        let group = cel.link_group();
        self.cels
            .values()
            .filter(|c| c.id != id && c.link_group() == group)
            .count()
    }

    pub fn cels_using_image(&self, image: ImageId) -> Vec<CelId> {
        self.cels
            .values()
            .filter(|c| c.link_group() == image)
            .map(|c| c.id)
            .collect()
    }

    pub fn background_layer(&self) -> Option<LayerId> {
        let first = *self.layers.get(&self.root)?.children().first()?;
        self.layers
            .get(&first)
            .filter(|l| l.is_background())
            .map(|l| l.id)
    }

    pub fn index_in_parent(&self, id: LayerId) -> Option<usize> {
        let parent = self.layers.get(&id)?.parent?;
        self.layers
            .get(&parent)?
            .children()
            .iter()
            .position(|&c| c == id)
    }

    /// Sibling directly below `id`.
    pub fn previous(&self, id: LayerId) -> Option<LayerId> {
        let parent = self.layers.get(&id)?.parent?;
        let index = self.index_in_parent(id)?;
        if index == 0 {
            return None;
        }
        self.layers.get(&parent)?.children().get(index - 1).copied()
    }

    /// `true` when `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: LayerId, id: LayerId) -> bool {
        let mut cur = self.layers.get(&id).and_then(|l| l.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.layers.get(&p).and_then(|l| l.parent);
        }
        false
    }

    /// Every layer except the root, depth first, bottom to top, a group before its children.
    pub fn all_layers(&self) -> Vec<LayerId> {
        let mut out = Vec::with_capacity(self.layers.len());
        self.collect_subtree(self.root, &mut out);
        out.remove(0);
        out
    }

    /// Image layers in stack order (bottom to top), groups expanded.
    pub fn image_layers(&self) -> Vec<LayerId> {
        self.all_layers()
            .into_iter()
            .filter(|id| self.layers.get(id).is_some_and(Layer::is_image))
            .collect()
    }

    fn collect_subtree(&self, id: LayerId, out: &mut Vec<LayerId>) {
        let Some(layer) = self.layers.get(&id) else {
            return;
        };
        out.push(id);
        for &child in layer.children() {
            self.collect_subtree(child, out);
        }
    }

    /// Appends a new image layer on top of `parent`'s children.
    pub fn add_image_layer(&mut self, parent: LayerId, name: &str) -> LayerfoldResult<LayerId> {
        let id = self.ids.layer();
        self.push_child(parent, Layer::new_image(id, name))?;
        Ok(id)
    }

    pub fn add_group(&mut self, parent: LayerId, name: &str) -> LayerfoldResult<LayerId> {
        let id = self.ids.layer();
        self.push_child(parent, Layer::new_group(id, name))?;
        Ok(id)
    }

    fn push_child(&mut self, parent: LayerId, layer: Layer) -> LayerfoldResult<()> {
        let len = self.try_layer(parent)?.children().len();
        self.attach_layer(DetachedLayer::new(layer), parent, len)
    }

    /// Turns a root-level image layer into the background: moved to the bottom, opaque,
    /// normal blending.
    pub fn set_background(&mut self, id: LayerId) -> LayerfoldResult<()> {
        let layer = self.try_layer(id)?;
        if !layer.is_image() || layer.parent != Some(self.root) {
            return Err(LayerfoldError::validation(format!(
                "background layer {id} must be an image layer at the root"
            )));
        }
        if let Some(existing) = self.background_layer()
            && existing != id
        {
            return Err(LayerfoldError::validation("sprite already has a background layer"));
        }
        let root = self.root;
        if let LayerKind::Group { children } = &mut self.try_layer_mut(root)?.kind {
            children.retain(|&c| c != id);
            children.insert(0, id);
        }
        let layer = self.try_layer_mut(id)?;
        layer.background = true;
        layer.opacity = 255;
        layer.blend_mode = crate::render::blend::BlendMode::Normal;
        Ok(())
    }

    /// Places `image` as a new cel of `layer` at `frame`.
    pub fn add_cel(
        &mut self,
        layer: LayerId,
        frame: FrameIndex,
        image: Image,
        position: Point,
    ) -> LayerfoldResult<CelId> {
        self.add_cel_ref(layer, frame, Arc::new(image), position)
    }

    /// Places a cel sharing `image` with any cel that already holds it.
    pub fn add_cel_ref(
        &mut self,
        layer: LayerId,
        frame: FrameIndex,
        image: ImageRef,
        position: Point,
    ) -> LayerfoldResult<CelId> {
        let id = self.ids.cel();
        self.insert_cel(Cel::new(id, layer, frame, image).with_position(position))?;
        Ok(id)
    }

    /// New cel at `frame` of the same layer, linked to `src`.
    pub fn link_cel(&mut self, src: CelId, frame: FrameIndex) -> LayerfoldResult<CelId> {
        let cel = self.try_cel(src)?;
        let (layer, image, position) = (cel.layer, cel.image_ref(), cel.position);
        let (opacity, z_index) = (cel.opacity, cel.z_index);
        let id = self.ids.cel();
        self.insert_cel(
            Cel::new(id, layer, frame, image)
                .with_position(position)
                .with_opacity(opacity)
                .with_z_index(z_index),
        )?;
        Ok(id)
    }

    pub(crate) fn insert_cel(&mut self, cel: Cel) -> LayerfoldResult<()> {
        if cel.frame.0 >= self.total_frames {
            return Err(LayerfoldError::validation(format!(
                "cel {} frame {} is outside the sprite's {} frames",
                cel.id, cel.frame.0, self.total_frames
            )));
        }
        if self.cels.contains_key(&cel.id) {
            return Err(LayerfoldError::validation(format!(
                "cel {} is already in the sprite",
                cel.id
            )));
        }
        let layer = self.try_layer_mut(cel.layer)?;
        let LayerKind::Image { cels } = &mut layer.kind else {
            return Err(LayerfoldError::validation(format!(
                "cannot add a cel to group layer {}",
                cel.layer
            )));
        };
        if cels.contains_key(&cel.frame) {
            return Err(LayerfoldError::validation(format!(
                "layer {} already has a cel at frame {}",
                cel.layer, cel.frame
            )));
        }
        cels.insert(cel.frame, cel.id);
        self.cels.insert(cel.id, cel);
        Ok(())
    }

    pub(crate) fn take_cel(&mut self, id: CelId) -> LayerfoldResult<Cel> {
        let cel = self.cels.remove(&id).ok_or(LayerfoldError::UnknownCel(id))?;
        if let Some(layer) = self.layers.get_mut(&cel.layer)
            && let LayerKind::Image { cels } = &mut layer.kind
        {
            cels.remove(&cel.frame);
        }
        Ok(cel)
    }

    /// Swaps the image of one cel, returning the previous handle.
    pub(crate) fn set_cel_image(&mut self, id: CelId, image: ImageRef) -> LayerfoldResult<ImageRef> {
        let cel = self.try_cel_mut(id)?;
        Ok(std::mem::replace(&mut cel.image, image))
    }

    /// Inserts a detached subtree as child `index` of `parent`.
    pub(crate) fn attach_layer(
        &mut self,
        detached: DetachedLayer,
        parent: LayerId,
        index: usize,
    ) -> LayerfoldResult<()> {
        if self.layers.contains_key(&detached.root) {
            return Err(LayerfoldError::validation(format!(
                "layer {} is already in the sprite",
                detached.root
            )));
        }
        let LayerKind::Group { children } = &mut self.try_layer_mut(parent)?.kind else {
            return Err(LayerfoldError::validation(format!(
                "layer {parent} is not a group"
            )));
        };
        if index > children.len() {
            return Err(LayerfoldError::validation(format!(
                "insert index {index} out of range for group {parent}"
            )));
        }
        children.insert(index, detached.root);

        for mut layer in detached.layers {
            if layer.id == detached.root {
                layer.parent = Some(parent);
            }
            self.layers.insert(layer.id, layer);
        }
        for cel in detached.cels {
            self.cels.insert(cel.id, cel);
        }
        Ok(())
    }

    /// Removes `id` and its whole subtree. Returns the subtree, its parent and its index.
    pub(crate) fn detach_layer(
        &mut self,
        id: LayerId,
    ) -> LayerfoldResult<(DetachedLayer, LayerId, usize)> {
        if id == self.root {
            return Err(LayerfoldError::validation("the root layer cannot be removed"));
        }
        let parent = self
            .try_layer(id)?
            .parent
            .ok_or_else(|| LayerfoldError::validation(format!("layer {id} has no parent")))?;
        let index = self
            .index_in_parent(id)
            .ok_or_else(|| LayerfoldError::validation(format!("layer {id} is not linked")))?;

        let mut ids = vec![];
        self.collect_subtree(id, &mut ids);

        if let LayerKind::Group { children } = &mut self.try_layer_mut(parent)?.kind {
            children.remove(index);
        }

        let mut layers = Vec::with_capacity(ids.len());
        let mut cels = vec![];
        for lid in ids {
            let Some(layer) = self.layers.remove(&lid) else {
                continue;
            };
            for cid in layer.cel_ids() {
                if let Some(cel) = self.cels.remove(&cid) {
                    cels.push(cel);
                }
            }
            layers.push(layer);
        }

        Ok((
            DetachedLayer {
                root: id,
                layers,
                cels,
            },
            parent,
            index,
        ))
    }

    /// Checks the structural invariants of the sprite.
    pub fn validate(&self) -> LayerfoldResult<()> {
        // RGBA sprites use the fully transparent pixel as their mask.
        if self.transparent_color[3] != 0 {
            return Err(LayerfoldError::validation(format!(
                "transparent color {} must have zero alpha",
                format_hex_color(self.transparent_color)
            )));
        }
        let root = self.try_layer(self.root)?;
        if !root.is_group() || root.parent.is_some() {
            return Err(LayerfoldError::validation("root must be a parentless group"));
        }

        let reachable = self.all_layers();
        if reachable.len() + 1 != self.layers.len() {
            return Err(LayerfoldError::validation(
                "layer table contains layers unreachable from the root",
            ));
        }

        let mut backgrounds = 0;
        for &id in &reachable {
            let layer = self.try_layer(id)?;
            for &child in layer.children() {
                if self.try_layer(child)?.parent != Some(id) {
                    return Err(LayerfoldError::validation(format!(
                        "layer {child} has a stale parent link"
                    )));
                }
            }
            if layer.is_background() {
                backgrounds += 1;
                if self.background_layer() != Some(id) {
                    return Err(LayerfoldError::validation(
                        "background layer must be the bottom-most root layer",
                    ));
                }
            }
            if let LayerKind::Image { cels } = &layer.kind {
                for (frame, cid) in cels {
                    let cel = self.try_cel(*cid)?;
                    if cel.frame != *frame || cel.layer != id {
                        return Err(LayerfoldError::validation(format!(
                            "cel {cid} is indexed under the wrong layer/frame"
                        )));
                    }
                }
            }
        }
        if backgrounds > 1 {
            return Err(LayerfoldError::validation(
                "sprite has more than one background layer",
            ));
        }

        for cel in self.cels.values() {
            if cel.frame.0 >= self.total_frames {
                return Err(LayerfoldError::validation(format!(
                    "cel {} frame {} is out of range",
                    cel.id, cel.frame.0
                )));
            }
            if self.layers.get(&cel.layer).and_then(|l| l.cel_id(cel.frame)) != Some(cel.id) {
                return Err(LayerfoldError::validation(format!(
                    "cel {} is not indexed by its layer",
                    cel.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/sprite.rs"]
mod tests;
