use crate::{
    foundation::core::{IRect, Rgba8},
    model::image::{Image, same_pixel},
};

/// Smallest rectangle inside `start` holding a pixel that differs from `bg`.
///
/// Returns `None` when every pixel of the region equals `bg` (a fully transparent
/// frame when `bg` is the mask color).
pub fn shrink_bounds(image: &Image, bg: Rgba8, start: IRect) -> Option<IRect> {
    let area = start.intersect(image.bounds());
    if area.is_empty() {
        return None;
    }
    let (x0, y0) = (area.x as u32, area.y as u32);
    let (x1, y1) = (area.right() as u32, area.bottom() as u32);

    let row_has_content = |y: u32| (x0..x1).any(|x| !same_pixel(image.get_pixel(x, y), bg));
    let col_has_content =
        |x: u32, top: u32, bottom: u32| (top..bottom).any(|y| !same_pixel(image.get_pixel(x, y), bg));

    let top = (y0..y1).find(|&y| row_has_content(y))?;
    let bottom = (top..y1).rev().find(|&y| row_has_content(y))? + 1;
    let left = (x0..x1).find(|&x| col_has_content(x, top, bottom))?;
    let right = (left..x1).rev().find(|&x| col_has_content(x, top, bottom))? + 1;

    Some(IRect::new(
        left as i32,
        top as i32,
        right - left,
        bottom - top,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/shrink.rs"]
mod tests;
