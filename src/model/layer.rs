use std::collections::BTreeMap;

use crate::{
    foundation::{
        core::FrameIndex,
        ids::{CelId, LayerId},
    },
    render::blend::BlendMode,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerKind {
    /// Raster layer holding at most one cel per frame.
    Image { cels: BTreeMap<FrameIndex, CelId> },
    /// Container; children are stored bottom to top.
    Group { children: Vec<LayerId> },
}

/// A node of the sprite's layer tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) parent: Option<LayerId>,
    pub(crate) kind: LayerKind,
    pub(crate) name: String,
    pub(crate) visible: bool,
    pub(crate) background: bool,
    pub(crate) opacity: u8,
    pub(crate) blend_mode: BlendMode,
}

impl Layer {
    pub fn new_image(id: LayerId, name: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            name,
            LayerKind::Image {
                cels: BTreeMap::new(),
            },
        )
    }

    pub fn new_group(id: LayerId, name: impl Into<String>) -> Self {
        Self::with_kind(id, name, LayerKind::Group { children: vec![] })
    }

    fn with_kind(id: LayerId, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id,
            parent: None,
            kind,
            name: name.into(),
            visible: true,
            background: false,
            opacity: 255,
            blend_mode: BlendMode::Normal,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, LayerKind::Image { .. })
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group { .. })
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Background layers are always fully opaque.
    pub fn set_opacity(&mut self, opacity: u8) {
        if !self.background {
            self.opacity = opacity;
        }
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    pub fn cel_id(&self, frame: FrameIndex) -> Option<CelId> {
        match &self.kind {
            LayerKind::Image { cels } => cels.get(&frame).copied(),
            LayerKind::Group { .. } => None,
        }
    }

    /// Cel ids in frame order. Empty for groups.
    pub fn cel_ids(&self) -> Vec<CelId> {
        match &self.kind {
            LayerKind::Image { cels } => cels.values().copied().collect(),
            LayerKind::Group { .. } => vec![],
        }
    }

    pub fn children(&self) -> &[LayerId] {
        match &self.kind {
            LayerKind::Group { children } => children,
            LayerKind::Image { .. } => &[],
        }
    }
}
