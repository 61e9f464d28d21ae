use std::sync::Arc;

use crate::{
    cmd::{
        cel::{AddCel, SetCelOpacity, SetCelPosition, UnlinkCel},
        image::ReplaceImage,
        layer::RemoveLayer,
    },
    document::{doc::Document, transaction::Transaction},
    foundation::{
        core::{FrameIndex, Point},
        error::{LayerfoldError, LayerfoldResult},
        ids::{CelId, ImageId, LayerId},
    },
    model::{
        cel::Cel,
        image::{Image, crop_image},
        sprite::Sprite,
    },
    render::{
        blend::{BlendMode, mul_un8},
        renderer::composite_image,
        shrink::shrink_bounds,
    },
};

/// `true` when `top` is an image layer sitting directly above another image layer.
pub fn can_merge_down(sprite: &Sprite, top: LayerId) -> bool {
    let is_image = |id| sprite.layer(id).is_some_and(|l| l.is_image());
    is_image(top) && sprite.previous(top).is_some_and(is_image)
}

/// Which cel is composited onto which for one frame.
///
/// The top cel is normally the source. When the bottom cel has the higher z-index it
/// renders above the top one, so the roles swap. The layer that survives is the bottom
/// layer either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CelOrder {
    pub(crate) src: Option<CelId>,
    pub(crate) dst: Option<CelId>,
    pub(crate) swapped: bool,
}

pub(crate) fn resolve_order(top: Option<&Cel>, bottom: Option<&Cel>) -> CelOrder {
    match (top, bottom) {
        (Some(t), Some(b)) if b.z_index() > t.z_index() => CelOrder {
            src: Some(b.id()),
            dst: Some(t.id()),
            swapped: true,
        },
        _ => CelOrder {
            src: top.map(Cel::id),
            dst: bottom.map(Cel::id),
            swapped: false,
        },
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum MergePlan {
    Skip,
    /// The surviving layer has no cel: it receives a copy of the source.
    Copy {
        image: Image,
        position: Point,
        opacity: u8,
    },
    /// The source is composited over the destination and the result is written into the
    /// bottom layer's cel.
    Composite {
        survivor: CelId,
        image: Image,
        position: Point,
        opacity: u8,
    },
}

/// Plans the merge of `top` into `bottom` at `frame`. `image_id` names the image the
/// plan produces, if any.
pub(crate) fn plan_merge(
    doc: &Document,
    top: LayerId,
    bottom: LayerId,
    frame: FrameIndex,
    image_id: ImageId,
) -> LayerfoldResult<MergePlan> {
    let sprite = doc.sprite();
    let top_cel = sprite.cel_at(top, frame);
    let bottom_cel = sprite.cel_at(bottom, frame);
    let order = resolve_order(top_cel, bottom_cel);

    let Some(src_id) = order.src else {
        return Ok(MergePlan::Skip);
    };
    let src = sprite.try_cel(src_id)?;
    let (src_layer, dst_layer) = if order.swapped {
        (bottom, top)
    } else {
        (top, bottom)
    };
    let opacity = mul_un8(src.opacity(), sprite.try_layer(src_layer)?.opacity());

    let Some(dst_id) = order.dst else {
        let empty = shrink_bounds(src.image(), src.image().mask_color(), src.image().bounds())
            .is_none();
        if opacity == 0 || empty {
            return Ok(MergePlan::Skip);
        }
        return Ok(MergePlan::Copy {
            image: src.image().duplicate(image_id),
            position: src.position(),
            opacity,
        });
    };
    let dst = sprite.try_cel(dst_id)?;
    let survivor = bottom_cel
        .map(Cel::id)
        .ok_or_else(|| LayerfoldError::validation("merge destination lost its bottom cel"))?;

    let bounds = if sprite.try_layer(dst_layer)?.is_background() {
        sprite.bounds()
    } else {
        src.bounds().union(dst.bounds())
    };
    let clear = doc.color_to_clear_layer(dst_layer);
    let local = bounds.offset(-dst.position().x, -dst.position().y);
    let mut image = crop_image(image_id, dst.image(), local, clear);
    composite_image(
        &mut image,
        src.image(),
        Point::new(src.position().x - bounds.x, src.position().y - bounds.y),
        opacity,
        BlendMode::Normal,
        true,
    );

    Ok(MergePlan::Composite {
        survivor,
        image,
        position: bounds.origin(),
        opacity: dst.opacity(),
    })
}

/// Merges `top` into the image layer right below it, across every frame, as one undo
/// step. Returns the surviving layer.
#[tracing::instrument(skip(doc))]
pub fn merge_down_layer(doc: &mut Document, top: LayerId) -> LayerfoldResult<LayerId> {
    let sprite = doc.sprite();
    sprite.try_layer(top)?;
    if !can_merge_down(sprite, top) {
        return Err(LayerfoldError::validation(format!(
            "layer {top} cannot be merged down: both it and the layer below must be image layers"
        )));
    }
    let bottom = sprite
        .previous(top)
        .ok_or_else(|| LayerfoldError::validation(format!("layer {top} has no layer below")))?;
    let frames: Vec<FrameIndex> = sprite.frames().collect();

    let mut tx = Transaction::new(doc, "Merge Down Layer");
    for frame in frames {
        let image_id = tx.sprite_mut().alloc_image_id();
        let plan = plan_merge(tx.document(), top, bottom, frame, image_id)?;
        tracing::trace!(frame = frame.0, plan = plan_name(&plan), "frame planned");
        apply_plan(&mut tx, plan, bottom, frame)?;
    }

    tx.document_mut().notify_layer_merged_down(top, bottom);
    tx.execute(RemoveLayer::new(top))?;
    tx.commit();
    Ok(bottom)
}

fn plan_name(plan: &MergePlan) -> &'static str {
    match plan {
        MergePlan::Skip => "skip",
        MergePlan::Copy { .. } => "copy",
        MergePlan::Composite { .. } => "composite",
    }
}

fn apply_plan(
    tx: &mut Transaction<'_>,
    plan: MergePlan,
    bottom: LayerId,
    frame: FrameIndex,
) -> LayerfoldResult<()> {
    match plan {
        MergePlan::Skip => Ok(()),
        MergePlan::Copy {
            image,
            position,
            opacity,
        } => {
            let id = tx.sprite_mut().alloc_cel_id();
            let cel = Cel::new(id, bottom, frame, Arc::new(image))
                .with_position(position)
                .with_opacity(opacity);
            tx.execute(AddCel::new(cel))
        }
        MergePlan::Composite {
            survivor,
            image,
            position,
            opacity,
        } => {
            if tx.sprite().cel_links(survivor) > 0 {
                tx.execute(UnlinkCel::new(survivor))?;
            }
            tx.execute(SetCelPosition::new(survivor, position))?;
            tx.execute(SetCelOpacity::new(survivor, opacity))?;
            let old = tx.sprite().try_cel(survivor)?.link_group();
            tx.execute(ReplaceImage::new(old, Arc::new(image)))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/flatten/merge_down.rs"]
mod tests;
