use super::*;

#[test]
fn canvas_rejects_zero_size() {
    assert!(Canvas::new(0, 4).is_err());
    assert!(Canvas::new(4, 0).is_err());
    assert_eq!(Canvas::new(3, 2).unwrap().bounds(), IRect::new(0, 0, 3, 2));
}

#[test]
fn union_covers_both_rects() {
    let a = IRect::new(0, 0, 2, 2);
    let b = IRect::new(3, -1, 1, 1);
    assert_eq!(a.union(b), IRect::new(0, -1, 4, 3));
}

#[test]
fn union_ignores_empty_rects() {
    let a = IRect::new(5, 5, 2, 2);
    assert_eq!(a.union(IRect::default()), a);
    assert_eq!(IRect::default().union(a), a);
}

#[test]
fn intersect_of_disjoint_rects_is_empty() {
    let a = IRect::new(0, 0, 2, 2);
    let b = IRect::new(2, 0, 2, 2);
    assert!(a.intersect(b).is_empty());
    assert_eq!(
        a.intersect(IRect::new(1, 1, 5, 5)),
        IRect::new(1, 1, 1, 1)
    );
}

#[test]
fn contains_is_half_open() {
    let r = IRect::new(1, 1, 2, 2);
    assert!(r.contains(Point::new(1, 1)));
    assert!(r.contains(Point::new(2, 2)));
    assert!(!r.contains(Point::new(3, 1)));
    assert!(!r.contains(Point::new(0, 1)));
}

#[test]
fn hex_colors_parse_in_all_forms() {
    assert_eq!(parse_hex_color("#f00").unwrap(), [255, 0, 0, 255]);
    assert_eq!(parse_hex_color("00ff00").unwrap(), [0, 255, 0, 255]);
    assert_eq!(parse_hex_color("#0000ff80").unwrap(), [0, 0, 255, 128]);
    assert!(parse_hex_color("#12345").is_err());
    assert!(parse_hex_color("#zzzzzz").is_err());
}

#[test]
fn hex_color_format_roundtrips() {
    let c = [1, 2, 250, 7];
    assert_eq!(format_hex_color(c), "#0102fa07");
    assert_eq!(parse_hex_color(&format_hex_color(c)).unwrap(), c);
}
