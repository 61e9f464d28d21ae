use crate::{
    foundation::{
        core::{FrameIndex, IRect, Point, Rgba8},
        error::{LayerfoldError, LayerfoldResult},
        ids::{CelId, LayerId},
    },
    model::{image::Image, layer::LayerKind, sprite::Sprite},
    render::blend::{BlendMode, blend_pixel, mul_un8},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BgOptions {
    /// Keep whatever `dst` already holds.
    #[default]
    None,
    /// Clear `dst` to this color before painting.
    Solid(Rgba8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOpts {
    pub new_blend: bool,
    pub bg: BgOptions,
}

impl Default for RenderOpts {
    fn default() -> Self {
        Self {
            new_blend: true,
            bg: BgOptions::None,
        }
    }
}

/// One cel scheduled for painting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DrawItem {
    pub(crate) layer: LayerId,
    pub(crate) cel: CelId,
    /// Position of the layer among visible image layers, bottom to top.
    pub(crate) order: i64,
    pub(crate) z_index: i32,
    pub(crate) opacity: u8,
    pub(crate) mode: BlendMode,
}

#[derive(Clone, Debug, Default)]
pub struct Renderer {
    opts: RenderOpts,
}

impl Renderer {
    pub fn new(opts: RenderOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> RenderOpts {
        self.opts
    }

    /// Paints every visible image layer's cel at `frame` into the canvas-sized `dst`.
    #[tracing::instrument(skip(self, dst, sprite), fields(frame = frame.0))]
    pub fn render_sprite(
        &self,
        dst: &mut Image,
        sprite: &Sprite,
        frame: FrameIndex,
    ) -> LayerfoldResult<()> {
        let canvas = sprite.canvas();
        if dst.width() != canvas.width || dst.height() != canvas.height {
            return Err(LayerfoldError::validation(format!(
                "render target is {}x{}, sprite canvas is {}x{}",
                dst.width(),
                dst.height(),
                canvas.width,
                canvas.height
            )));
        }
        if frame.0 >= sprite.total_frames() {
            return Err(LayerfoldError::validation(format!(
                "frame {frame} is outside the sprite's {} frames",
                sprite.total_frames()
            )));
        }

        if let BgOptions::Solid(color) = self.opts.bg {
            dst.clear(color);
        }

        let items = draw_order(sprite, frame);
        for item in &items {
            let cel = sprite.try_cel(item.cel)?;
            tracing::trace!(layer = %item.layer, cel = %item.cel, opacity = item.opacity, "paint");
            composite_image(
                dst,
                cel.image(),
                cel.position(),
                item.opacity,
                item.mode,
                self.opts.new_blend,
            );
        }
        tracing::trace!(items = items.len(), "rendered frame");
        Ok(())
    }
}

/// Draw list for `frame`: visible image layers bottom to top (hidden groups hide their
/// subtree), sorted by `(order + z_index, z_index)`, ties kept in stack order.
pub(crate) fn draw_order(sprite: &Sprite, frame: FrameIndex) -> Vec<DrawItem> {
    let mut items = vec![];
    let mut order = 0i64;
    collect_visible(sprite, sprite.root(), 255, frame, &mut order, &mut items);
    items.sort_by_key(|i| (i.order + i64::from(i.z_index), i.z_index));
    items
}

fn collect_visible(
    sprite: &Sprite,
    group: LayerId,
    inherited_opacity: u8,
    frame: FrameIndex,
    order: &mut i64,
    out: &mut Vec<DrawItem>,
) {
    let Some(group) = sprite.layer(group) else {
        return;
    };
    for &child in group.children() {
        let Some(layer) = sprite.layer(child) else {
            continue;
        };
        if !layer.is_visible() {
            continue;
        }
        match layer.kind() {
            LayerKind::Group { .. } => collect_visible(
                sprite,
                child,
                mul_un8(inherited_opacity, layer.opacity()),
                frame,
                order,
                out,
            ),
            LayerKind::Image { .. } => {
                let layer_order = *order;
                *order += 1;
                let Some(cel) = sprite.cel_at(child, frame) else {
                    continue;
                };
                let mode = if layer.is_background() {
                    BlendMode::Normal
                } else {
                    layer.blend_mode()
                };
                out.push(DrawItem {
                    layer: child,
                    cel: cel.id(),
                    order: layer_order,
                    z_index: cel.z_index(),
                    opacity: mul_un8(
                        mul_un8(cel.opacity(), layer.opacity()),
                        inherited_opacity,
                    ),
                    mode,
                });
            }
        }
    }
}

/// Composites `src` placed at `at` (in `dst` coordinates) onto `dst`. Pixels falling
/// outside `dst` are dropped.
pub fn composite_image(
    dst: &mut Image,
    src: &Image,
    at: Point,
    opacity: u8,
    mode: BlendMode,
    new_blend: bool,
) {
    if opacity == 0 {
        return;
    }
    let area = IRect::at(at, src.width(), src.height()).intersect(dst.bounds());
    if area.is_empty() {
        return;
    }
    for y in area.y..(area.bottom() as i32) {
        for x in area.x..(area.right() as i32) {
            let s = src.get_pixel((x - at.x) as u32, (y - at.y) as u32);
            if s[3] == 0 {
                continue;
            }
            let d = dst.get_pixel(x as u32, y as u32);
            dst.put_pixel(
                x as u32,
                y as u32,
                blend_pixel(d, s, mode, opacity, new_blend),
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
