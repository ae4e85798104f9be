use frames::{ChangeEvent, FrameError, FrameId, FrameKind, FrameTree, Placement};
use rstest::rstest;

const IMPORTS: FrameId = FrameId(1);
const MAIN: FrameId = FrameId(3);

fn insert(tree: &mut FrameTree, parent: FrameId, kind: FrameKind) -> FrameId {
    tree.allocate_and_insert(Placement::append_to(parent), kind)
        .expect("insertion failed")
}

fn join(tree: &mut FrameTree, primary: FrameId, kind: FrameKind) -> FrameId {
    tree.allocate_and_insert(Placement::join(primary), kind)
        .expect("joint insertion failed")
}

fn body(tree: &FrameTree, parent: FrameId) -> Vec<u32> {
    tree.get(parent).unwrap().children_ids.iter().map(|id| id.0).collect()
}

fn chain(tree: &FrameTree, primary: FrameId) -> Vec<u32> {
    tree.get(primary).unwrap().joint_frame_ids.iter().map(|id| id.0).collect()
}

/// Main holds three assignments: 4, 5 and 6.
fn three_statements() -> FrameTree {
    let mut tree = FrameTree::new();
    for _ in 0..3 {
        insert(&mut tree, MAIN, FrameKind::VarAssign);
    }
    tree
}

#[rstest]
#[case(0, 2, vec![5, 6, 4])]
#[case(2, 0, vec![6, 4, 5])]
#[case(0, 1, vec![5, 4, 6])]
#[case(1, 0, vec![5, 4, 6])]
#[case(1, 1, vec![4, 5, 6])]
fn moved_within_a_body(
    #[case] old_index: usize,
    #[case] new_index: usize,
    #[case] expected: Vec<u32>,
) {
    let mut tree = three_statements();
    let element = tree.get(MAIN).unwrap().children_ids[old_index];
    let deleted = tree
        .reorder(MAIN, ChangeEvent::moved(old_index, new_index, element))
        .unwrap();
    assert!(deleted.is_empty());
    assert_eq!(body(&tree, MAIN), expected);
    tree.check_invariants().unwrap();
}

#[rstest]
#[case(ChangeEvent::moved(3, 0, FrameId(4)))]
#[case(ChangeEvent::moved(0, 3, FrameId(4)))]
#[case(ChangeEvent::removed(5, FrameId(4)))]
#[case(ChangeEvent::added(9, FrameId(4)))]
fn out_of_range_changes_are_rejected(#[case] event: ChangeEvent) {
    let mut tree = three_statements();
    let before = tree.clone();
    let err = tree.reorder(MAIN, event).unwrap_err();
    assert!(matches!(err, FrameError::IndexOutOfRange { .. }), "{err:?}");
    assert_eq!(tree, before);
}

#[test]
fn element_must_match_its_index() {
    let mut tree = three_statements();
    let err = tree.reorder(MAIN, ChangeEvent::moved(0, 2, FrameId(5))).unwrap_err();
    assert_eq!(
        err,
        FrameError::ElementMismatch {
            parent: MAIN,
            index: 0,
            expected: FrameId(5),
            found: FrameId(4),
        }
    );
}

#[test]
fn drag_into_another_body() {
    let mut tree = FrameTree::new();
    let if_frame = insert(&mut tree, MAIN, FrameKind::If);
    let statement = insert(&mut tree, MAIN, FrameKind::VarAssign);

    // The drag layer reports the destination first, then the source.
    assert!(tree.reorder(if_frame, ChangeEvent::added(0, statement)).unwrap().is_empty());
    assert!(tree.reorder(MAIN, ChangeEvent::removed(1, statement)).unwrap().is_empty());

    assert_eq!(body(&tree, if_frame), [statement.0]);
    assert_eq!(body(&tree, MAIN), [if_frame.0]);
    assert_eq!(tree.get(statement).unwrap().parent_id, Some(if_frame));
    tree.check_invariants().unwrap();
}

#[test]
fn a_lone_removal_deletes_the_subtree() {
    let mut tree = FrameTree::new();
    let while_frame = insert(&mut tree, MAIN, FrameKind::While);
    let inner = insert(&mut tree, while_frame, FrameKind::Break);

    let deleted = tree.reorder(MAIN, ChangeEvent::removed(0, while_frame)).unwrap();
    assert_eq!(deleted, [while_frame, inner]);
    assert!(!tree.contains(while_frame));
    assert!(!tree.contains(inner));
    assert!(body(&tree, MAIN).is_empty());
    tree.check_invariants().unwrap();
}

#[test]
fn moving_a_primary_carries_its_chain() {
    let mut tree = FrameTree::new();
    let while_frame = insert(&mut tree, MAIN, FrameKind::While);
    let if_frame = insert(&mut tree, MAIN, FrameKind::If);
    let else_frame = join(&mut tree, if_frame, FrameKind::Else);

    tree.move_frame(if_frame, while_frame, 0).unwrap();
    assert_eq!(tree.get(else_frame).unwrap().parent_id, Some(while_frame));
    assert_eq!(chain(&tree, if_frame), [else_frame.0]);
    tree.check_invariants().unwrap();
}

#[test]
fn frames_cannot_be_dropped_inside_themselves() {
    let mut tree = FrameTree::new();
    let outer = insert(&mut tree, MAIN, FrameKind::While);
    let inner = insert(&mut tree, outer, FrameKind::For);
    let before = tree.clone();

    assert!(tree.reorder(outer, ChangeEvent::added(0, outer)).is_err());
    assert!(tree.reorder(inner, ChangeEvent::added(0, outer)).is_err());
    assert!(tree.move_frame(outer, inner, 0).is_err());
    assert_eq!(tree, before);
}

#[test]
fn containers_and_joint_frames_are_not_draggable() {
    let mut tree = FrameTree::new();
    let if_frame = insert(&mut tree, MAIN, FrameKind::If);
    let else_frame = join(&mut tree, if_frame, FrameKind::Else);

    assert!(tree.reorder(if_frame, ChangeEvent::added(0, MAIN)).is_err());
    assert!(tree.reorder(MAIN, ChangeEvent::added(0, else_frame)).is_err());
    assert!(tree.reorder(FrameId::ROOT, ChangeEvent::removed(2, MAIN)).is_err());
    assert!(tree.move_frame(else_frame, MAIN, 0).is_err());
}

#[test]
fn checked_reorder_enforces_nesting_rules() {
    let mut tree = FrameTree::new();
    let import = insert(&mut tree, IMPORTS, FrameKind::Import);
    let before = tree.clone();

    let err = tree.reorder_checked(MAIN, ChangeEvent::added(0, import)).unwrap_err();
    assert!(matches!(err, FrameError::StructuralViolation { kind: FrameKind::Import, .. }));
    assert_eq!(tree, before);

    // The trusting variant leaves grammar to the drag layer.
    assert!(tree.reorder(MAIN, ChangeEvent::added(0, import)).is_ok());
}

#[test]
fn checked_reorder_enforces_drag_families() {
    let mut tree = FrameTree::new();
    let comment = insert(&mut tree, IMPORTS, FrameKind::Comment);

    // Comments are legal in both bodies, but imports and code do not mix.
    let err = tree.reorder_checked(MAIN, ChangeEvent::added(0, comment)).unwrap_err();
    assert!(matches!(err, FrameError::StructuralViolation { .. }));
    assert!(tree.move_frame(comment, MAIN, 0).is_err());

    let while_frame = insert(&mut tree, MAIN, FrameKind::While);
    let statement = insert(&mut tree, MAIN, FrameKind::Comment);
    tree.move_frame(statement, while_frame, 0).unwrap();
    assert_eq!(body(&tree, while_frame), [statement.0]);
}

#[test]
fn move_frame_is_atomic() {
    let mut tree = three_statements();
    let before = tree.clone();
    assert!(tree.move_frame(FrameId(4), IMPORTS, 0).is_err());
    assert!(tree.move_frame(FrameId(4), MAIN, 3).is_err());
    assert_eq!(tree, before);

    tree.move_frame(FrameId(4), MAIN, 2).unwrap();
    assert_eq!(body(&tree, MAIN), [5, 6, 4]);
}

#[test]
fn reorder_joint_chain() {
    let mut tree = FrameTree::new();
    let if_frame = insert(&mut tree, MAIN, FrameKind::If);
    let first = join(&mut tree, if_frame, FrameKind::Elif);
    let second = join(&mut tree, if_frame, FrameKind::Elif);
    let last = join(&mut tree, if_frame, FrameKind::Else);

    tree.move_joint_frame(if_frame, 0, 1).unwrap();
    assert_eq!(chain(&tree, if_frame), [second.0, first.0, last.0]);

    // `else` must stay last.
    let before = tree.clone();
    assert!(tree.move_joint_frame(if_frame, 2, 0).is_err());
    assert!(tree.move_joint_frame(if_frame, 0, 3).is_err());
    assert_eq!(tree, before);
}

#[test]
fn joint_frames_outside_a_drag_family_stay_put() {
    let mut tree = FrameTree::new();
    let try_frame = insert(&mut tree, MAIN, FrameKind::Try);
    join(&mut tree, try_frame, FrameKind::Except);
    join(&mut tree, try_frame, FrameKind::Finally);
    assert!(tree.move_joint_frame(try_frame, 1, 0).is_err());

    let for_frame = insert(&mut tree, MAIN, FrameKind::For);
    join(&mut tree, for_frame, FrameKind::Else);
    assert!(tree.move_joint_frame(for_frame, 0, 0).is_err());
}

#[test]
fn change_events_use_the_drag_layer_format() {
    let json = r#"{"moved": {"oldIndex": 0, "newIndex": 2, "element": {"id": 4}}}"#;
    let event: ChangeEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event, ChangeEvent::moved(0, 2, FrameId(4)));
    assert_eq!(
        serde_json::to_string(&ChangeEvent::added(1, FrameId(7))).unwrap(),
        r#"{"added":{"newIndex":1,"element":{"id":7}}}"#
    );
}
