use super::*;
use crate::foundation::core::Canvas;

struct Tree {
    sprite: Sprite,
    a: LayerId,
    g: LayerId,
    b: LayerId,
    c: LayerId,
    top: LayerId,
}

// a, g{b, c}, top
fn tree() -> Tree {
    let mut sprite = Sprite::new(Canvas::new(4, 4).unwrap(), 1).unwrap();
    let root = sprite.root();
    let a = sprite.add_image_layer(root, "a").unwrap();
    let g = sprite.add_group(root, "g").unwrap();
    let b = sprite.add_image_layer(g, "b").unwrap();
    let c = sprite.add_image_layer(g, "c").unwrap();
    let top = sprite.add_image_layer(root, "top").unwrap();
    Tree {
        sprite,
        a,
        g,
        b,
        c,
        top,
    }
}

#[test]
fn empty_selection_browses_to_nothing() {
    let t = tree();
    let sel = SelectedLayers::new();
    assert!(sel.to_browsable_layer_list(&t.sprite).is_empty());
}

#[test]
fn children_of_selected_groups_are_dropped() {
    let t = tree();
    let mut sel: SelectedLayers = [t.g, t.b, t.top].into_iter().collect();
    sel.remove_children_if_parent_is_selected(&t.sprite);
    assert!(sel.contains(t.g));
    assert!(!sel.contains(t.b));
    assert_eq!(sel.len(), 2);
}

#[test]
fn browsable_list_expands_groups_in_stack_order() {
    let t = tree();
    let mut sel: SelectedLayers = [t.top, t.g, t.c].into_iter().collect();
    sel.remove_children_if_parent_is_selected(&t.sprite);
    assert_eq!(
        sel.to_browsable_layer_list(&t.sprite),
        vec![t.b, t.c, t.top]
    );
}

#[test]
fn browsable_list_is_order_independent_of_insertion() {
    let t = tree();
    let one: SelectedLayers = [t.top, t.a].into_iter().collect();
    let two: SelectedLayers = [t.a, t.top].into_iter().collect();
    assert_eq!(one, two);
    assert_eq!(one.to_browsable_layer_list(&t.sprite), vec![t.a, t.top]);
}

#[test]
fn propagation_adds_ancestors_and_descendants() {
    let t = tree();
    let sel: SelectedLayers = [t.b].into_iter().collect();
    let shown = sel.propagate_selection(&t.sprite);
    assert!(shown.contains(t.g));
    assert!(shown.contains(t.b));
    assert!(!shown.contains(t.c));

    let sel: SelectedLayers = [t.g].into_iter().collect();
    let shown = sel.propagate_selection(&t.sprite);
    assert!(shown.contains(t.b) && shown.contains(t.c));
    assert!(!shown.contains(t.a));
}

#[test]
fn validate_rejects_unknown_and_root_layers() {
    let t = tree();
    let sel: SelectedLayers = [LayerId(999)].into_iter().collect();
    assert!(sel.validate(&t.sprite).is_err());
    let sel: SelectedLayers = [t.sprite.root()].into_iter().collect();
    assert!(sel.validate(&t.sprite).is_err());
    let sel: SelectedLayers = [t.a].into_iter().collect();
    assert!(sel.validate(&t.sprite).is_ok());
}

#[test]
fn stack_order_lists_groups_before_children() {
    let t = tree();
    let sel: SelectedLayers = [t.top, t.g, t.a].into_iter().collect();
    assert_eq!(sel.in_stack_order(&t.sprite), vec![t.a, t.g, t.top]);
}
