use crate::foundation::error::{LayerfoldError, LayerfoldResult};

/// Straight (non-premultiplied) RGBA8.
pub type Rgba8 = [u8; 4];

pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct FrameIndex(pub u32);

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> LayerfoldResult<Self> {
        if width == 0 || height == 0 {
            return Err(LayerfoldError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn bounds(self) -> IRect {
        IRect::new(0, 0, self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer rectangle, `[x, x + width) x [y, y + height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl IRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(origin: Point, width: u32, height: u32) -> Self {
        Self::new(origin.x, origin.y, width, height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    pub fn bottom(self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    pub fn contains(self, p: Point) -> bool {
        i64::from(p.x) >= i64::from(self.x)
            && i64::from(p.x) < self.right()
            && i64::from(p.y) >= i64::from(self.y)
            && i64::from(p.y) < self.bottom()
    }

    /// Smallest rectangle containing both. Empty rectangles are ignored.
    pub fn union(self, other: IRect) -> IRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        IRect::new(x0, y0, (x1 - i64::from(x0)) as u32, (y1 - i64::from(y0)) as u32)
    }

    pub fn intersect(self, other: IRect) -> IRect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= i64::from(x0) || y1 <= i64::from(y0) {
            return IRect::new(x0, y0, 0, 0);
        }
        IRect::new(x0, y0, (x1 - i64::from(x0)) as u32, (y1 - i64::from(y0)) as u32)
    }

    pub fn offset(self, dx: i32, dy: i32) -> IRect {
        IRect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
pub fn parse_hex_color(s: &str) -> LayerfoldResult<Rgba8> {
    let hex = s.trim().trim_start_matches('#');
    let nibble = |c: u8| -> LayerfoldResult<u8> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            _ => Err(LayerfoldError::validation(format!("invalid hex color '{s}'"))),
        }
    };
    let b = hex.as_bytes();
    match b.len() {
        3 => {
            let mut out = [0, 0, 0, 255];
            for i in 0..3 {
                let v = nibble(b[i])?;
                out[i] = v * 16 + v;
            }
            Ok(out)
        }
        6 | 8 => {
            let mut out = [0, 0, 0, 255];
            for (i, pair) in b.chunks_exact(2).enumerate() {
                out[i] = nibble(pair[0])? * 16 + nibble(pair[1])?;
            }
            Ok(out)
        }
        _ => Err(LayerfoldError::validation(format!(
            "invalid hex color '{s}' (expected #rgb, #rrggbb or #rrggbbaa)"
        ))),
    }
}

pub fn format_hex_color(c: Rgba8) -> String {
    format!("#{:02x}{:02x}{:02x}{:02x}", c[0], c[1], c[2], c[3])
}

/// Serde adapter storing an [`Rgba8`] as a `#rrggbbaa` string.
pub mod hex_color {
    use super::{Rgba8, format_hex_color, parse_hex_color};

    pub fn serialize<S: serde::Serializer>(c: &Rgba8, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_hex_color(*c))
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Rgba8, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(d)?;
        parse_hex_color(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
