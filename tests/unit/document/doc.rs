use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::foundation::core::Canvas;

struct Recorder(Rc<RefCell<Vec<LayerMergedDown>>>);

impl DocObserver for Recorder {
    fn on_layer_merged_down(&mut self, ev: &LayerMergedDown) {
        self.0.borrow_mut().push(*ev);
    }
}

fn doc() -> (Document, LayerId, LayerId) {
    let mut s = Sprite::new(Canvas::new(2, 2).unwrap(), 1).unwrap();
    let root = s.root();
    let bg = s.add_image_layer(root, "bg").unwrap();
    let a = s.add_image_layer(root, "a").unwrap();
    s.set_background(bg).unwrap();
    let prefs = Prefs {
        bg_color: [9, 8, 7, 255],
        ..Prefs::default()
    };
    (Document::new(s, prefs), bg, a)
}

#[test]
fn clear_color_depends_on_background_flag() {
    let (d, bg, a) = doc();
    assert_eq!(d.bg_color(), [9, 8, 7, 255]);
    assert_eq!(d.color_to_clear_layer(bg), [9, 8, 7, 255]);
    assert_eq!(d.color_to_clear_layer(a), TRANSPARENT);
    assert_eq!(d.color_to_clear_layer(LayerId(404)), TRANSPARENT);
}

#[test]
fn observers_receive_merge_notifications() {
    let (mut d, bg, a) = doc();
    let seen = Rc::new(RefCell::new(vec![]));
    d.add_observer(Box::new(Recorder(seen.clone())));
    d.notify_layer_merged_down(a, bg);
    assert_eq!(*seen.borrow(), vec![LayerMergedDown { src: a, dst: bg }]);
}

#[test]
fn undo_without_history_fails() {
    let (mut d, _, _) = doc();
    assert!(d.undo().is_err());
    assert!(d.redo().is_err());
    assert!(!d.history().can_undo());
}
