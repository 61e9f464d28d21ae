use std::sync::Arc;

use crate::{
    cmd::{
        cel::{AddCel, RemoveCel, SetCelOpacity, SetCelPosition, SetCelZIndex, UnlinkCel},
        image::ReplaceImage,
        layer::{AddLayer, RemoveLayer, SetLayerBlendMode, SetLayerOpacity},
    },
    document::{doc::Document, transaction::Transaction},
    flatten::visibility::VisibilityOverride,
    foundation::{
        core::{FrameIndex, IRect, Point, TRANSPARENT},
        error::{LayerfoldError, LayerfoldResult},
        ids::{CelId, LayerId},
    },
    model::{
        cel::Cel,
        image::{Image, crop_image},
        layer::Layer,
        selected_layers::SelectedLayers,
        sprite::DetachedLayer,
    },
    render::{
        blend::BlendMode,
        renderer::{BgOptions, RenderOpts, Renderer},
        shrink::shrink_bounds,
    },
};

pub const FLATTENED_LAYER_NAME: &str = "Flattened";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlattenOpts {
    pub new_blend: bool,
    /// Flatten into the bottom-most selected layer instead of a new layer.
    pub merge_down: bool,
}

impl Default for FlattenOpts {
    fn default() -> Self {
        Self {
            new_blend: true,
            merge_down: false,
        }
    }
}

/// The destination cel of a frame, as seen before any command for that frame runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ExistingCel {
    pub(crate) id: CelId,
    pub(crate) linked: bool,
    pub(crate) z_index: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReconcileCtx {
    /// The destination layer is created by this flatten.
    pub(crate) new_layer: bool,
    pub(crate) background_selected: bool,
    /// Number of image layers being flattened.
    pub(crate) layer_count: usize,
}

/// One reversible change to the destination layer for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CelStep {
    Remove(CelId),
    Unlink(CelId),
    SetOpacity(CelId, u8),
    SetPosition(CelId, Point),
    SetZIndex(CelId, i32),
    /// Swap the cel's current image for the cropped frame.
    ReplaceImage(CelId),
    /// New cel holding the cropped frame.
    Add(Point),
}

/// Decides how the destination cel of one frame follows the flattened result.
pub(crate) fn reconcile_flatten_cel(
    existing: Option<ExistingCel>,
    bounds: Option<IRect>,
    ctx: ReconcileCtx,
) -> Vec<CelStep> {
    let Some(bounds) = bounds else {
        return match existing {
            Some(cel) if !ctx.new_layer => vec![CelStep::Remove(cel.id)],
            _ => vec![],
        };
    };
    let Some(cel) = existing else {
        return vec![CelStep::Add(bounds.origin())];
    };

    let mut steps = vec![];
    if cel.linked {
        steps.push(CelStep::Unlink(cel.id));
    }
    if !ctx.new_layer {
        steps.push(CelStep::SetOpacity(cel.id, 255));
        steps.push(CelStep::SetPosition(cel.id, bounds.origin()));
    }
    // The layers above the destination are about to go away. Stopping at zero keeps the
    // cel from sinking below unselected layers under it.
    if !ctx.background_selected && cel.z_index > 0 {
        let removed = i32::try_from(ctx.layer_count.saturating_sub(1)).unwrap_or(i32::MAX);
        steps.push(CelStep::SetZIndex(cel.id, cel.z_index.saturating_sub(removed).max(0)));
    }
    steps.push(CelStep::ReplaceImage(cel.id));
    steps
}

enum Target {
    Existing(LayerId),
    New(DetachedLayer),
}

impl Target {
    fn id(&self) -> LayerId {
        match self {
            Target::Existing(id) => *id,
            Target::New(layer) => layer.root,
        }
    }
}

/// Reduces the selected layers to a single image layer across every frame, as one undo
/// step. Returns the layer holding the result, or `None` when the selection denotes no
/// image layer.
#[tracing::instrument(skip(doc, selection), fields(selected = selection.len()))]
pub fn flatten_layers(
    doc: &mut Document,
    selection: &SelectedLayers,
    opts: FlattenOpts,
) -> LayerfoldResult<Option<LayerId>> {
    let sprite = doc.sprite();
    selection.validate(sprite)?;

    let mut layers = selection.clone();
    layers.remove_children_if_parent_is_selected(sprite);
    let list = layers.to_browsable_layer_list(sprite);
    let (Some(&first), Some(&last)) = (list.first(), list.last()) else {
        tracing::debug!("nothing to flatten");
        return Ok(None);
    };

    let background_selected = layers
        .iter()
        .any(|id| sprite.layer(id).is_some_and(Layer::is_background));
    let visible_background = sprite
        .background_layer()
        .filter(|&id| sprite.layer(id).is_some_and(Layer::is_visible));
    // The selected entry (`first` itself or a selected group) that contains `first`.
    let anchor = layers
        .in_stack_order(sprite)
        .into_iter()
        .find(|&id| id == first || sprite.is_ancestor(id, first))
        .unwrap_or(first);

    let onto_background = background_selected && visible_background.is_some();
    let (mut target, seed) = match visible_background {
        Some(bg) if background_selected => (Target::Existing(bg), doc.bg_color()),
        _ if opts.merge_down => {
            if anchor != first {
                return Err(LayerfoldError::validation(format!(
                    "merge destination {first} lies inside selected group {anchor}"
                )));
            }
            (Target::Existing(first), sprite.transparent_color())
        }
        _ => {
            let seed = sprite.transparent_color();
            let id = doc.sprite_mut().alloc_layer_id();
            let layer = Layer::new_image(id, FLATTENED_LAYER_NAME);
            (Target::New(DetachedLayer::new(layer)), seed)
        }
    };
    let flat = target.id();
    tracing::debug!(
        dest = %flat,
        new_layer = matches!(target, Target::New(_)),
        layers = list.len(),
        "flattening"
    );

    let ctx = ReconcileCtx {
        new_layer: matches!(target, Target::New(_)),
        background_selected,
        layer_count: list.len(),
    };
    let shown = layers.propagate_selection(doc.sprite());
    let frames: Vec<FrameIndex> = doc.sprite().frames().collect();
    let canvas = doc.sprite().canvas();
    let mut scratch = doc.sprite_mut().new_image(canvas.width, canvas.height);
    // A background cel always spans the canvas, whatever its color.
    let shrink_ref = if onto_background {
        scratch.mask_color()
    } else {
        seed
    };
    let renderer = Renderer::new(RenderOpts {
        new_blend: opts.new_blend,
        bg: BgOptions::None,
    });

    let label = if opts.merge_down {
        "Merge Down Layer"
    } else {
        "Flatten Layers"
    };
    let mut tx = Transaction::new(doc, label);
    {
        let mut guard = VisibilityOverride::show_only(&mut tx, &shown);
        for frame in frames {
            scratch.clear(seed);
            renderer.render_sprite(&mut scratch, guard.sprite(), frame)?;
            let bounds = shrink_bounds(&scratch, shrink_ref, scratch.bounds());

            let existing = match &target {
                Target::Existing(id) => guard.sprite().cel_at(*id, frame).map(|c| ExistingCel {
                    id: c.id(),
                    linked: guard.sprite().cel_links(c.id()) > 0,
                    z_index: c.z_index(),
                }),
                Target::New(_) => None,
            };
            let steps = reconcile_flatten_cel(existing, bounds, ctx);
            tracing::trace!(frame = frame.0, ?bounds, ?steps, "frame reconciled");

            for step in steps {
                apply_step(&mut guard, &mut target, step, frame, &scratch, bounds)?;
            }
        }
    }

    if opts.merge_down {
        tx.document_mut().notify_layer_merged_down(last, flat);
    }

    match target {
        Target::New(layer) => {
            let parent = tx
                .sprite()
                .layer(anchor)
                .and_then(Layer::parent)
                .ok_or(LayerfoldError::UnknownLayer(anchor))?;
            tx.execute(AddLayer::new(parent, Some(anchor), layer))?;
        }
        Target::Existing(id) => {
            tx.execute(SetLayerOpacity::new(id, 255))?;
            tx.execute(SetLayerBlendMode::new(id, BlendMode::Normal))?;
        }
    }

    for id in layers.in_stack_order(tx.sprite()) {
        if id != flat {
            tx.execute(RemoveLayer::new(id))?;
        }
    }

    tx.commit();
    Ok(Some(flat))
}

fn apply_step(
    tx: &mut Transaction<'_>,
    target: &mut Target,
    step: CelStep,
    frame: FrameIndex,
    scratch: &Image,
    bounds: Option<IRect>,
) -> LayerfoldResult<()> {
    match step {
        CelStep::Remove(id) => tx.execute(RemoveCel::new(id)),
        CelStep::Unlink(id) => tx.execute(UnlinkCel::new(id)),
        CelStep::SetOpacity(id, v) => tx.execute(SetCelOpacity::new(id, v)),
        CelStep::SetPosition(id, p) => tx.execute(SetCelPosition::new(id, p)),
        CelStep::SetZIndex(id, z) => tx.execute(SetCelZIndex::new(id, z)),
        CelStep::ReplaceImage(id) => {
            let old = tx.sprite().try_cel(id)?.link_group();
            let image = cropped(tx, scratch, bounds)?;
            tx.execute(ReplaceImage::new(old, Arc::new(image)))
        }
        CelStep::Add(at) => {
            let image = cropped(tx, scratch, bounds)?;
            let cel_id = tx.sprite_mut().alloc_cel_id();
            let cel = Cel::new(cel_id, target.id(), frame, Arc::new(image)).with_position(at);
            match target {
                // Removing the new layer on undo discards the cel with it.
                Target::New(layer) => layer.push_cel(cel),
                Target::Existing(_) => tx.execute(AddCel::new(cel)),
            }
        }
    }
}

fn cropped(
    tx: &mut Transaction<'_>,
    scratch: &Image,
    bounds: Option<IRect>,
) -> LayerfoldResult<Image> {
    let bounds = bounds
        .ok_or_else(|| LayerfoldError::validation("cannot crop an empty frame"))?;
    let id = tx.sprite_mut().alloc_image_id();
    Ok(crop_image(id, scratch, bounds, TRANSPARENT))
}

#[cfg(test)]
#[path = "../../tests/unit/flatten/layers.rs"]
mod tests;
