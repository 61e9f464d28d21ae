use super::*;
use crate::{
    cmd::{
        cel::{SetCelOpacity, SetCelZIndex},
        layer::RemoveLayer,
    },
    foundation::core::{Canvas, FrameIndex, Point},
};

fn sprite() -> (Sprite, crate::foundation::ids::LayerId, crate::foundation::ids::CelId) {
    let mut s = Sprite::new(Canvas::new(4, 4).unwrap(), 1).unwrap();
    let root = s.root();
    let a = s.add_image_layer(root, "a").unwrap();
    let img = s.new_image(1, 1);
    let cel = s.add_cel(a, FrameIndex(0), img, Point::ZERO).unwrap();
    (s, a, cel)
}

#[test]
fn undo_reverts_in_reverse_order() {
    let (mut s, a, cel) = sprite();
    let mut seq = CmdSequence::new();
    seq.execute_and_add(Box::new(SetCelOpacity::new(cel, 10)), &mut s)
        .unwrap();
    seq.execute_and_add(Box::new(SetCelOpacity::new(cel, 20)), &mut s)
        .unwrap();
    seq.execute_and_add(Box::new(RemoveLayer::new(a)), &mut s)
        .unwrap();
    assert_eq!(seq.len(), 3);
    assert!(s.cel(cel).is_none());

    seq.undo(&mut s).unwrap();
    assert_eq!(s.cel(cel).unwrap().opacity(), 255);

    seq.redo(&mut s).unwrap();
    assert!(s.layer(a).is_none());
}

#[test]
fn failing_command_is_not_recorded() {
    let (mut s, _, _) = sprite();
    let mut seq = CmdSequence::new();
    let err = seq.execute_and_add(
        Box::new(SetCelZIndex::new(crate::foundation::ids::CelId(999), 1)),
        &mut s,
    );
    assert!(err.is_err());
    assert!(seq.is_empty());
}

#[test]
fn labels_and_memory_accumulate() {
    let (mut s, _, cel) = sprite();
    let mut seq = CmdSequence::new();
    let empty = seq.mem_size();
    seq.execute_and_add(Box::new(SetCelZIndex::new(cel, 3)), &mut s)
        .unwrap();
    assert!(seq.mem_size() > empty);
    assert_eq!(seq.labels().collect::<Vec<_>>(), vec!["set cel z-index"]);
}

#[test]
fn failed_undo_reapplies_the_reverted_commands() {
    let (mut s, _, first) = sprite();
    let root = s.root();
    let b = s.add_image_layer(root, "b").unwrap();
    let img = s.new_image(1, 1);
    let second = s.add_cel(b, FrameIndex(0), img, Point::ZERO).unwrap();

    let mut seq = CmdSequence::new();
    seq.execute_and_add(Box::new(SetCelOpacity::new(first, 10)), &mut s)
        .unwrap();
    seq.execute_and_add(Box::new(SetCelOpacity::new(second, 20)), &mut s)
        .unwrap();
    s.take_cel(first).unwrap();

    assert!(seq.undo(&mut s).is_err());
    assert_eq!(s.cel(second).unwrap().opacity(), 20);
}

#[test]
fn failed_redo_reverts_the_applied_commands() {
    let (mut s, _, first) = sprite();
    let root = s.root();
    let b = s.add_image_layer(root, "b").unwrap();
    let img = s.new_image(1, 1);
    let second = s.add_cel(b, FrameIndex(0), img, Point::ZERO).unwrap();

    let mut seq = CmdSequence::new();
    seq.execute_and_add(Box::new(SetCelOpacity::new(first, 10)), &mut s)
        .unwrap();
    seq.execute_and_add(Box::new(SetCelOpacity::new(second, 20)), &mut s)
        .unwrap();
    seq.undo(&mut s).unwrap();
    s.take_cel(second).unwrap();

    assert!(seq.redo(&mut s).is_err());
    assert_eq!(s.cel(first).unwrap().opacity(), 255);
}
