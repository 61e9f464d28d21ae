use super::*;
use crate::{
    document::prefs::Prefs,
    foundation::core::{Canvas, IRect, Rgba8},
};

const RED: Rgba8 = [255, 0, 0, 255];
const BLUE: Rgba8 = [0, 0, 255, 255];
const TRANSPARENT_PX: Rgba8 = [0, 0, 0, 0];

struct Fixture {
    doc: Document,
    bottom: LayerId,
    top: LayerId,
}

fn fixture() -> Fixture {
    let mut s = Sprite::new(Canvas::new(4, 4).unwrap(), 2).unwrap();
    let root = s.root();
    let bottom = s.add_image_layer(root, "bottom").unwrap();
    let top = s.add_image_layer(root, "top").unwrap();
    Fixture {
        doc: Document::new(s, Prefs::default()),
        bottom,
        top,
    }
}

fn put(doc: &mut Document, layer: LayerId, frame: u32, color: Rgba8, rect: IRect) -> CelId {
    let s = doc.sprite_mut();
    let id = s.alloc_image_id();
    s.add_cel(
        layer,
        FrameIndex(frame),
        Image::filled(id, rect.width, rect.height, color),
        rect.origin(),
    )
    .unwrap()
}

#[test]
fn order_defaults_to_top_over_bottom() {
    let img = Arc::new(Image::new(ImageId(1), 1, 1));
    let t = Cel::new(CelId(1), LayerId(1), FrameIndex(0), img.clone());
    let b = Cel::new(CelId(2), LayerId(2), FrameIndex(0), img);

    let o = resolve_order(Some(&t), Some(&b));
    assert_eq!((o.src, o.dst, o.swapped), (Some(CelId(1)), Some(CelId(2)), false));

    let o = resolve_order(None, Some(&b));
    assert_eq!((o.src, o.dst), (None, Some(CelId(2))));

    let o = resolve_order(Some(&t), None);
    assert_eq!((o.src, o.dst), (Some(CelId(1)), None));
}

#[test]
fn higher_bottom_z_index_swaps_roles() {
    let img = Arc::new(Image::new(ImageId(1), 1, 1));
    let t = Cel::new(CelId(1), LayerId(1), FrameIndex(0), img.clone()).with_z_index(1);
    let b = Cel::new(CelId(2), LayerId(2), FrameIndex(0), img).with_z_index(3);
    let o = resolve_order(Some(&t), Some(&b));
    assert_eq!((o.src, o.dst, o.swapped), (Some(CelId(2)), Some(CelId(1)), true));

    let b = b.with_z_index(1);
    assert!(!resolve_order(Some(&t), Some(&b)).swapped);
}

#[test]
fn can_merge_down_needs_an_image_layer_below() {
    let mut f = fixture();
    assert!(can_merge_down(f.doc.sprite(), f.top));
    assert!(!can_merge_down(f.doc.sprite(), f.bottom));

    let root = f.doc.sprite().root();
    let g = f.doc.sprite_mut().add_group(root, "g").unwrap();
    let above = f.doc.sprite_mut().add_image_layer(root, "above").unwrap();
    assert!(!can_merge_down(f.doc.sprite(), g));
    assert!(!can_merge_down(f.doc.sprite(), above));
}

#[test]
fn missing_source_is_skipped() {
    let mut f = fixture();
    put(&mut f.doc, f.bottom, 0, RED, IRect::new(0, 0, 2, 2));
    let plan = plan_merge(&f.doc, f.top, f.bottom, FrameIndex(0), ImageId(100)).unwrap();
    assert_eq!(plan, MergePlan::Skip);
}

#[test]
fn transparent_source_without_destination_is_skipped() {
    let mut f = fixture();
    put(&mut f.doc, f.top, 0, TRANSPARENT_PX, IRect::new(0, 0, 2, 2));
    let plan = plan_merge(&f.doc, f.top, f.bottom, FrameIndex(0), ImageId(100)).unwrap();
    assert_eq!(plan, MergePlan::Skip);
}

#[test]
fn source_without_destination_is_copied_with_combined_opacity() {
    let mut f = fixture();
    let c = put(&mut f.doc, f.top, 1, BLUE, IRect::new(1, 2, 2, 1));
    f.doc.sprite_mut().cel_mut(c).unwrap().set_opacity(128);
    f.doc.sprite_mut().layer_mut(f.top).unwrap().set_opacity(128);

    let plan = plan_merge(&f.doc, f.top, f.bottom, FrameIndex(1), ImageId(100)).unwrap();
    let MergePlan::Copy {
        image,
        position,
        opacity,
    } = plan
    else {
        panic!("expected a copy");
    };
    assert_eq!(image.id(), ImageId(100));
    assert_eq!((image.width(), image.height()), (2, 1));
    assert_eq!(position, Point::new(1, 2));
    assert_eq!(opacity, 64);
}

#[test]
fn overlapping_cels_composite_into_the_union() {
    let mut f = fixture();
    let b = put(&mut f.doc, f.bottom, 0, RED, IRect::new(0, 0, 2, 2));
    put(&mut f.doc, f.top, 0, BLUE, IRect::new(1, 1, 2, 2));
    f.doc.sprite_mut().cel_mut(b).unwrap().set_opacity(200);

    let plan = plan_merge(&f.doc, f.top, f.bottom, FrameIndex(0), ImageId(100)).unwrap();
    let MergePlan::Composite {
        survivor,
        image,
        position,
        opacity,
    } = plan
    else {
        panic!("expected a composite");
    };
    assert_eq!(survivor, b);
    assert_eq!(position, Point::new(0, 0));
    assert_eq!(opacity, 200);
    assert_eq!((image.width(), image.height()), (3, 3));
    assert_eq!(image.get_pixel(0, 0), RED);
    assert_eq!(image.get_pixel(1, 1), BLUE);
    assert_eq!(image.get_pixel(2, 0), TRANSPARENT_PX);
    assert_eq!(image.get_pixel(2, 2), BLUE);
}

#[test]
fn swapped_order_draws_bottom_content_over_top() {
    let mut f = fixture();
    let b = put(&mut f.doc, f.bottom, 0, RED, IRect::new(0, 0, 2, 2));
    let t = put(&mut f.doc, f.top, 0, BLUE, IRect::new(1, 1, 2, 2));
    f.doc.sprite_mut().cel_mut(b).unwrap().set_z_index(2);
    f.doc.sprite_mut().cel_mut(t).unwrap().set_opacity(77);

    let plan = plan_merge(&f.doc, f.top, f.bottom, FrameIndex(0), ImageId(100)).unwrap();
    let MergePlan::Composite {
        survivor,
        image,
        opacity,
        ..
    } = plan
    else {
        panic!("expected a composite");
    };
    assert_eq!(survivor, b);
    assert_eq!(opacity, 77);
    assert_eq!(image.get_pixel(1, 1), RED);
}

#[test]
fn background_destination_spans_the_canvas_and_pads_with_bg_color() {
    let mut f = fixture();
    f.doc.sprite_mut().set_background(f.bottom).unwrap();
    put(&mut f.doc, f.bottom, 0, RED, IRect::new(0, 0, 2, 2));
    put(&mut f.doc, f.top, 0, BLUE, IRect::new(3, 3, 1, 1));

    let plan = plan_merge(&f.doc, f.top, f.bottom, FrameIndex(0), ImageId(100)).unwrap();
    let MergePlan::Composite {
        image, position, ..
    } = plan
    else {
        panic!("expected a composite");
    };
    assert_eq!(position, Point::ZERO);
    assert_eq!((image.width(), image.height()), (4, 4));
    assert_eq!(image.get_pixel(0, 0), RED);
    assert_eq!(image.get_pixel(2, 0), f.doc.bg_color());
    assert_eq!(image.get_pixel(3, 3), BLUE);
}

#[test]
fn merge_down_rejects_bottom_most_layer() {
    let mut f = fixture();
    let err = merge_down_layer(&mut f.doc, f.bottom).unwrap_err();
    assert!(matches!(err, LayerfoldError::Validation(_)));
    let err = merge_down_layer(&mut f.doc, LayerId(999)).unwrap_err();
    assert!(matches!(err, LayerfoldError::UnknownLayer(_)));
}
