use super::*;

#[test]
fn mul_un8_matches_rounded_product() {
    assert_eq!(mul_un8(255, 255), 255);
    assert_eq!(mul_un8(0, 200), 0);
    assert_eq!(mul_un8(128, 255), 128);
    assert_eq!(mul_un8(128, 128), 64);
    for a in [0u8, 1, 17, 100, 128, 254, 255] {
        assert_eq!(mul_un8(a, 255), a);
    }
}

#[test]
fn normal_opacity_0_is_noop() {
    let dst = [10, 20, 30, 255];
    assert_eq!(normal(dst, [200, 200, 200, 255], 0), dst);
}

#[test]
fn normal_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    assert_eq!(normal(dst, [255, 255, 255, 0], 255), dst);
}

#[test]
fn normal_opaque_src_replaces_dst() {
    let src = [255, 0, 0, 255];
    assert_eq!(normal([0, 0, 255, 255], src, 255), src);
}

#[test]
fn normal_over_transparent_keeps_color_and_scales_alpha() {
    assert_eq!(normal([0, 0, 0, 0], [100, 110, 120, 200], 255), [100, 110, 120, 200]);
    assert_eq!(normal([0, 0, 0, 0], [100, 110, 120, 255], 128), [100, 110, 120, 128]);
}

#[test]
fn normal_half_opacity_mixes_colors_over_opaque() {
    let out = normal([0, 0, 0, 255], [255, 255, 255, 255], 128);
    assert_eq!(out[3], 255);
    assert!((127..=129).contains(&out[0]), "{out:?}");
}

#[test]
fn multiply_over_white_keeps_source() {
    let out = blend_pixel([255, 255, 255, 255], [40, 80, 120, 255], BlendMode::Multiply, 255, true);
    assert_eq!(out, [40, 80, 120, 255]);
}

#[test]
fn new_blend_shows_plain_source_over_transparent() {
    let src = [200, 100, 50, 255];
    let out = blend_pixel([0, 0, 0, 0], src, BlendMode::Multiply, 255, true);
    assert_eq!(out, src);
}

#[test]
fn legacy_blend_applies_mode_against_transparent_black() {
    let out = blend_pixel([0, 0, 0, 0], [200, 100, 50, 255], BlendMode::Multiply, 255, false);
    assert_eq!(out, [0, 0, 0, 255]);
}

#[test]
fn separable_modes_on_opaque_pixels() {
    let b = [100, 200, 50, 255];
    let s = [150, 50, 50, 255];
    let px = |m| blend_pixel(b, s, m, 255, true);

    assert_eq!(px(BlendMode::Darken), [100, 50, 50, 255]);
    assert_eq!(px(BlendMode::Lighten), [150, 200, 50, 255]);
    assert_eq!(px(BlendMode::Difference), [50, 150, 0, 255]);
    assert_eq!(px(BlendMode::Addition), [250, 250, 100, 255]);
    assert_eq!(px(BlendMode::Subtract), [0, 150, 0, 255]);
}

#[test]
fn screen_with_black_is_identity() {
    let b = [12, 130, 250, 255];
    assert_eq!(blend_pixel(b, [0, 0, 0, 255], BlendMode::Screen, 255, true), b);
}

#[test]
fn parse_accepts_common_spellings() {
    assert_eq!(BlendMode::parse("normal"), Some(BlendMode::Normal));
    assert_eq!(BlendMode::parse("Color-Dodge"), Some(BlendMode::ColorDodge));
    assert_eq!(BlendMode::parse("hard light"), Some(BlendMode::HardLight));
    assert_eq!(BlendMode::parse("hue"), None);
    for m in BlendMode::ALL {
        assert_eq!(BlendMode::parse(m.as_str()), Some(m));
    }
}

#[test]
fn serde_uses_snake_case_names() {
    let s = serde_json::to_string(&BlendMode::ColorBurn).unwrap();
    assert_eq!(s, "\"color_burn\"");
    let m: BlendMode = serde_json::from_str("\"soft_light\"").unwrap();
    assert_eq!(m, BlendMode::SoftLight);
}
