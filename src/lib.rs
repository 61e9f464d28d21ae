//! Layerfold is an undoable layer-reduction engine for multi-frame raster sprites.
//!
//! It flattens any selection of layers into one image layer, or merges a layer into the
//! one beneath it, frame by frame:
//!
//! - Build or load a [`Sprite`] and wrap it in a [`Document`]
//! - Call [`flatten_layers`] or [`merge_down_layer`]
//! - Undo the whole reduction with [`Document::undo`]
#![forbid(unsafe_code)]

mod foundation;

/// Reversible operations recorded by the undo history.
pub mod cmd;
pub(crate) mod document;
pub(crate) mod flatten;
pub(crate) mod model;
pub(crate) mod render;

pub use crate::foundation::core::{
    Canvas, FrameIndex, IRect, Point, Rgba8, TRANSPARENT, format_hex_color, parse_hex_color,
};
pub use crate::foundation::error::{LayerfoldError, LayerfoldResult};
pub use crate::foundation::ids::{CelId, ImageId, LayerId};

pub use crate::cmd::cel::{
    AddCel, RemoveCel, SetCelOpacity, SetCelPosition, SetCelZIndex, UnlinkCel,
};
pub use crate::cmd::image::ReplaceImage;
pub use crate::cmd::layer::{AddLayer, RemoveLayer, SetLayerBlendMode, SetLayerOpacity};
pub use crate::cmd::{Cmd, CmdSequence};

pub use crate::model::cel::Cel;
pub use crate::model::image::{Image, ImageRef, crop_image, same_pixel};
pub use crate::model::layer::{Layer, LayerKind};
pub use crate::model::selected_layers::SelectedLayers;
pub use crate::model::sprite::Sprite;

pub use crate::render::blend::{BlendMode, blend_pixel, mul_un8};
pub use crate::render::renderer::{BgOptions, RenderOpts, Renderer, composite_image};
pub use crate::render::shrink::shrink_bounds;

pub use crate::document::doc::{DocObserver, Document, LayerMergedDown};
pub use crate::document::format::{CelFile, ImageFile, LayerFile, LayerFileKind, SpriteFile};
pub use crate::document::history::{HistoryOpts, UndoHistory};
pub use crate::document::prefs::Prefs;
pub use crate::document::transaction::Transaction;

pub use crate::flatten::layers::{FLATTENED_LAYER_NAME, FlattenOpts, flatten_layers};
pub use crate::flatten::merge_down::{can_merge_down, merge_down_layer};
