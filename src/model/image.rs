use std::sync::Arc;

use crate::foundation::{
    core::{IRect, Point, Rgba8, TRANSPARENT},
    error::{LayerfoldError, LayerfoldResult},
    ids::ImageId,
};

/// Shared handle to an image. Cels holding the same handle (same [`ImageId`]) are linked.
pub type ImageRef = Arc<Image>;

/// RGBA8 raster with straight alpha.
///
/// Images are treated as immutable once they are attached to a cel: edits build a new
/// image and swap it in through a reversible command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    id: ImageId,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    /// A `width` x `height` image filled with the mask color.
    pub fn new(id: ImageId, width: u32, height: u32) -> Self {
        Self::filled(id, width, height, TRANSPARENT)
    }

    pub fn filled(id: ImageId, width: u32, height: u32, color: Rgba8) -> Self {
        let px = (width as usize) * (height as usize);
        Self {
            id,
            width,
            height,
            data: color.repeat(px),
        }
    }

    pub fn from_rgba8(id: ImageId, width: u32, height: u32, data: Vec<u8>) -> LayerfoldResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| LayerfoldError::validation("image buffer size overflow"))?;
        if data.len() != expected {
            return Err(LayerfoldError::validation(format!(
                "image {id} expects {expected} bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            id,
            width,
            height,
            data,
        })
    }

    pub fn from_rgba_image(id: ImageId, img: &image::RgbaImage) -> Self {
        Self {
            id,
            width: img.width(),
            height: img.height(),
            data: img.as_raw().clone(),
        }
    }

    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Same pixels under a different identity. Used to give a linked cel a private copy.
    pub fn duplicate(&self, id: ImageId) -> Self {
        Self {
            id,
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> IRect {
        IRect::new(0, 0, self.width, self.height)
    }

    pub fn mask_color(&self) -> Rgba8 {
        TRANSPARENT
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, c: Rgba8) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&c);
    }

    pub fn clear(&mut self, color: Rgba8) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    pub fn fill_rect(&mut self, rect: IRect, color: Rgba8) {
        let r = rect.intersect(self.bounds());
        for y in r.y..(r.bottom() as i32) {
            for x in r.x..(r.right() as i32) {
                self.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    pub fn pixels(&self) -> impl Iterator<Item = Rgba8> + '_ {
        self.data.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Pixel equality used by bounds shrinking: two fully transparent pixels are the same
/// regardless of their color channels.
pub fn same_pixel(a: Rgba8, b: Rgba8) -> bool {
    (a[3] == 0 && b[3] == 0) || a == b
}

/// Copies the `rect` region of `src` (in `src` coordinates) into a new image of that size.
/// Pixels outside `src` are filled with `bg`.
pub fn crop_image(id: ImageId, src: &Image, rect: IRect, bg: Rgba8) -> Image {
    let mut out = Image::filled(id, rect.width, rect.height, bg);
    let overlap = rect.intersect(src.bounds());
    if overlap.is_empty() {
        return out;
    }
    for y in overlap.y..(overlap.bottom() as i32) {
        for x in overlap.x..(overlap.right() as i32) {
            let px = src.get_pixel(x as u32, y as u32);
            out.put_pixel((x - rect.x) as u32, (y - rect.y) as u32, px);
        }
    }
    out
}

/// Region of `image` placed at `at`, in the placing coordinate space.
pub fn placed_bounds(image: &Image, at: Point) -> IRect {
    IRect::at(at, image.width(), image.height())
}

#[cfg(test)]
#[path = "../../tests/unit/model/image.rs"]
mod tests;
