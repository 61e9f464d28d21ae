use crate::foundation::core::Rgba8;

/// Separable blend modes applied when a layer is composited onto what lies below it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Addition,
    Subtract,
    Divide,
}

impl BlendMode {
    pub const ALL: [BlendMode; 15] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Addition,
        BlendMode::Subtract,
        BlendMode::Divide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color_dodge",
            BlendMode::ColorBurn => "color_burn",
            BlendMode::HardLight => "hard_light",
            BlendMode::SoftLight => "soft_light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Addition => "addition",
            BlendMode::Subtract => "subtract",
            BlendMode::Divide => "divide",
        }
    }

    pub fn parse(s: &str) -> Option<BlendMode> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|m| m.as_str() == key)
    }

    /// `B(backdrop, source)` for one color channel.
    fn channel(self, b: u8, s: u8) -> u8 {
        match self {
            BlendMode::Normal => s,
            BlendMode::Multiply => mul_un8(b, s),
            BlendMode::Screen => screen(b, s),
            BlendMode::Overlay => hard_light(s, b),
            BlendMode::Darken => b.min(s),
            BlendMode::Lighten => b.max(s),
            BlendMode::ColorDodge => {
                if b == 0 {
                    0
                } else if s == 255 {
                    255
                } else {
                    (u32::from(b) * 255 / (255 - u32::from(s))).min(255) as u8
                }
            }
            BlendMode::ColorBurn => {
                if b == 255 {
                    255
                } else if s == 0 {
                    0
                } else {
                    255 - ((255 - u32::from(b)) * 255 / u32::from(s)).min(255) as u8
                }
            }
            BlendMode::HardLight => hard_light(b, s),
            BlendMode::SoftLight => soft_light(b, s),
            BlendMode::Difference => b.abs_diff(s),
            BlendMode::Exclusion => {
                let v = i32::from(b) + i32::from(s) - 2 * i32::from(mul_un8(b, s));
                v.clamp(0, 255) as u8
            }
            BlendMode::Addition => b.saturating_add(s),
            BlendMode::Subtract => b.saturating_sub(s),
            BlendMode::Divide => {
                if b == 0 {
                    0
                } else if b >= s {
                    255
                } else {
                    div_un8(b, s)
                }
            }
        }
    }
}

/// `a * b / 255` rounded, for 8-bit unit values.
pub fn mul_un8(a: u8, b: u8) -> u8 {
    let t = u32::from(a) * u32::from(b) + 0x80;
    (((t >> 8) + t) >> 8) as u8
}

fn div_un8(a: u8, b: u8) -> u8 {
    ((u32::from(a) * 255 + u32::from(b) / 2) / u32::from(b)).min(255) as u8
}

fn screen(b: u8, s: u8) -> u8 {
    (i32::from(b) + i32::from(s) - i32::from(mul_un8(b, s))) as u8
}

fn hard_light(b: u8, s: u8) -> u8 {
    if s < 128 {
        mul_un8(b, s << 1)
    } else {
        screen(b, ((u16::from(s) << 1) - 255) as u8)
    }
}

fn soft_light(b: u8, s: u8) -> u8 {
    let cb = f32::from(b) / 255.0;
    let cs = f32::from(s) / 255.0;
    let d = if cb <= 0.25 {
        ((16.0 * cb - 12.0) * cb + 4.0) * cb
    } else {
        cb.sqrt()
    };
    let r = if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        cb + (2.0 * cs - 1.0) * (d - cb)
    };
    (r.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Source-over for straight-alpha pixels with an extra `opacity` factor on the source.
pub fn normal(backdrop: Rgba8, src: Rgba8, opacity: u8) -> Rgba8 {
    if backdrop[3] == 0 {
        return [src[0], src[1], src[2], mul_un8(src[3], opacity)];
    }
    if src[3] == 0 {
        return backdrop;
    }

    let sa = mul_un8(src[3], opacity);
    if sa == 0 {
        return backdrop;
    }
    let ba = backdrop[3];
    let ra = i32::from(sa) + i32::from(ba) - i32::from(mul_un8(ba, sa));

    let mut out = [0u8; 4];
    for i in 0..3 {
        let bc = i32::from(backdrop[i]);
        let sc = i32::from(src[i]);
        out[i] = (bc + (sc - bc) * i32::from(sa) / ra).clamp(0, 255) as u8;
    }
    out[3] = ra.clamp(0, 255) as u8;
    out
}

/// Blends `src` onto `backdrop` with `mode`, then composites the result with
/// [`normal`].
///
/// With `new_blend` the blended color is weighted by the backdrop alpha, so a blend mode
/// over a transparent backdrop shows the plain source. Without it the blend function is
/// applied as if the backdrop were opaque.
pub fn blend_pixel(backdrop: Rgba8, src: Rgba8, mode: BlendMode, opacity: u8, new_blend: bool) -> Rgba8 {
    if mode == BlendMode::Normal || src[3] == 0 {
        return normal(backdrop, src, opacity);
    }

    let ba = u32::from(backdrop[3]);
    let mut mixed = src;
    for i in 0..3 {
        let blended = mode.channel(backdrop[i], src[i]);
        mixed[i] = if new_blend {
            ((u32::from(blended) * ba + u32::from(src[i]) * (255 - ba) + 127) / 255) as u8
        } else {
            blended
        };
    }
    normal(backdrop, mixed, opacity)
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
