use super::*;
use crate::{
    cmd::cel::SetCelOpacity,
    foundation::{
        core::{Canvas, FrameIndex, Point},
        ids::CelId,
    },
};

fn sprite() -> (Sprite, CelId) {
    let mut s = Sprite::new(Canvas::new(4, 4).unwrap(), 1).unwrap();
    let root = s.root();
    let a = s.add_image_layer(root, "a").unwrap();
    let img = s.new_image(8, 8);
    let cel = s.add_cel(a, FrameIndex(0), img, Point::ZERO).unwrap();
    (s, cel)
}

fn step(s: &mut Sprite, cel: CelId, opacity: u8) -> CmdSequence {
    let mut seq = CmdSequence::new();
    seq.execute_and_add(Box::new(SetCelOpacity::new(cel, opacity)), s)
        .unwrap();
    seq
}

#[test]
fn undo_and_redo_walk_the_stacks() {
    let (mut s, cel) = sprite();
    let mut h = UndoHistory::default();
    let seq = step(&mut s, cel, 10);
    h.push("first", seq);
    let seq = step(&mut s, cel, 20);
    h.push("second", seq);
    assert_eq!(h.undo_labels().collect::<Vec<_>>(), vec!["second", "first"]);

    assert_eq!(h.undo(&mut s).unwrap(), "second");
    assert_eq!(s.cel(cel).unwrap().opacity(), 10);
    assert!(h.can_redo());

    assert_eq!(h.redo(&mut s).unwrap(), "second");
    assert_eq!(s.cel(cel).unwrap().opacity(), 20);
    assert!(!h.can_redo());
}

#[test]
fn new_entry_clears_redo() {
    let (mut s, cel) = sprite();
    let mut h = UndoHistory::default();
    let seq = step(&mut s, cel, 10);
    h.push("first", seq);
    h.undo(&mut s).unwrap();
    let seq = step(&mut s, cel, 30);
    h.push("other", seq);
    assert!(!h.can_redo());
    assert_eq!(h.undo_labels().collect::<Vec<_>>(), vec!["other"]);
}

#[test]
fn empty_stacks_report_history_errors() {
    let (mut s, _) = sprite();
    let mut h = UndoHistory::default();
    assert!(matches!(h.undo(&mut s), Err(LayerfoldError::History(_))));
    assert!(matches!(h.redo(&mut s), Err(LayerfoldError::History(_))));
}

#[test]
fn size_limit_drops_oldest_but_keeps_newest() {
    let (mut s, cel) = sprite();
    let mut h = UndoHistory::new(HistoryOpts {
        size_limit_bytes: Some(1),
    });
    let seq = step(&mut s, cel, 1);
    h.push("a", seq);
    let seq = step(&mut s, cel, 2);
    h.push("b", seq);
    let seq = step(&mut s, cel, 3);
    h.push("c", seq);

    assert_eq!(h.undo_labels().collect::<Vec<_>>(), vec!["c"]);
    assert!(h.mem_size() > 0);
}

#[test]
fn memory_tracks_entries() {
    let (mut s, cel) = sprite();
    let mut h = UndoHistory::default();
    assert_eq!(h.mem_size(), 0);
    let seq = step(&mut s, cel, 1);
    let expected = seq.mem_size();
    h.push("a", seq);
    assert_eq!(h.mem_size(), expected);
    h.undo(&mut s).unwrap();
    assert_eq!(h.mem_size(), expected);
}

#[test]
fn failed_undo_keeps_the_entry_and_the_sprite() {
    let (mut s, cel) = sprite();
    let mut h = UndoHistory::default();
    let seq = step(&mut s, cel, 10);
    h.push("gone", seq);
    let mem = h.mem_size();
    s.take_cel(cel).unwrap();

    assert!(matches!(h.undo(&mut s), Err(LayerfoldError::History(_))));
    assert_eq!(h.undo_labels().collect::<Vec<_>>(), vec!["gone"]);
    assert!(!h.can_redo());
    assert_eq!(h.mem_size(), mem);
}
