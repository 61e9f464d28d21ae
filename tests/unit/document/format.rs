use super::*;

fn sprite() -> Sprite {
    let mut s = Sprite::new(Canvas::new(3, 2).unwrap(), 2).unwrap();
    let root = s.root();
    let bg = s.add_image_layer(root, "bg").unwrap();
    let g = s.add_group(root, "g").unwrap();
    let a = s.add_image_layer(g, "a").unwrap();
    s.set_background(bg).unwrap();
    s.layer_mut(a).unwrap().set_blend_mode(BlendMode::Multiply);
    s.layer_mut(g).unwrap().set_visible(false);

    let id = s.alloc_image_id();
    s.add_cel(bg, FrameIndex(0), Image::filled(id, 3, 2, [255, 0, 0, 255]), Point::ZERO)
        .unwrap();
    let img = s.new_image(1, 1);
    let c = s.add_cel(a, FrameIndex(0), img, Point::new(2, 1)).unwrap();
    s.cel_mut(c).unwrap().set_z_index(-1);
    s.link_cel(c, FrameIndex(1)).unwrap();
    s
}

#[test]
fn round_trip_preserves_structure_and_links() {
    let s = sprite();
    let file = SpriteFile::from_sprite(&s);
    let json = file.to_json_string().unwrap();
    let back = SpriteFile::from_json_str(&json).unwrap();
    assert_eq!(back, file);

    let loaded = back.into_sprite().unwrap();
    assert_eq!(SpriteFile::from_sprite(&loaded), file);
    assert_eq!(loaded.all_layers(), s.all_layers());
    let a = loaded.image_layers()[1];
    let c0 = loaded.cel_at(a, FrameIndex(0)).unwrap().id();
    assert_eq!(loaded.cel_links(c0), 1);
}

#[test]
fn linked_cels_share_one_image_entry() {
    let file = SpriteFile::from_sprite(&sprite());
    assert_eq!(file.images.len(), 2);
}

#[test]
fn loaded_sprite_allocates_fresh_ids() {
    let s = sprite();
    let file = SpriteFile::from_sprite(&s);
    let mut loaded = file.into_sprite().unwrap();
    let fresh = loaded.alloc_layer_id();
    assert!(loaded.layer(fresh).is_none());
    assert!(s.all_layers().iter().all(|&l| l.0 < fresh.0));
}

#[test]
fn missing_image_is_rejected() {
    let mut file = SpriteFile::from_sprite(&sprite());
    file.images.clear();
    assert!(file.into_sprite().is_err());
}

#[test]
fn wrong_pixel_count_is_rejected() {
    let mut file = SpriteFile::from_sprite(&sprite());
    if let Some(img) = file.images.values_mut().next() {
        img.rgba.pop();
    }
    assert!(file.into_sprite().is_err());
}

#[test]
fn duplicate_layer_ids_are_rejected() {
    let mut file = SpriteFile::from_sprite(&sprite());
    let dup = file.layers[0].clone();
    file.layers.push(LayerFile {
        background: false,
        ..dup
    });
    assert!(file.into_sprite().is_err());
}

#[test]
fn out_of_range_frame_is_rejected() {
    let mut file = SpriteFile::from_sprite(&sprite());
    file.frames = 1;
    assert!(file.into_sprite().is_err());
}

#[test]
fn minimal_json_uses_defaults() {
    let json = r#"{
        "version": 1,
        "canvas": {"width": 1, "height": 1},
        "frames": 1,
        "root": 1,
        "layers": [
            {"id": 2, "name": "a", "type": "image",
             "cels": [{"id": 3, "frame": 0, "image": 4}]}
        ],
        "images": {"4": {"width": 1, "height": 1, "rgba": [1, 2, 3, 255]}}
    }"#;
    let s = SpriteFile::from_json_str(json).unwrap().into_sprite().unwrap();
    let cel = s.cel(CelId(3)).unwrap();
    assert_eq!((cel.opacity(), cel.z_index(), cel.position()), (255, 0, Point::ZERO));
    assert_eq!(s.transparent_color(), TRANSPARENT);
    assert!(s.layer(LayerId(2)).unwrap().is_visible());
}

#[test]
fn unsupported_version_is_rejected() {
    let mut file = SpriteFile::from_sprite(&sprite());
    file.version = 99;
    assert!(file.into_sprite().is_err());
}

#[test]
fn opaque_transparent_color_is_rejected() {
    let mut file = SpriteFile::from_sprite(&sprite());
    file.transparent_color = [255, 0, 255, 255];
    assert!(matches!(file.into_sprite(), Err(LayerfoldError::Validation(_))));
}
