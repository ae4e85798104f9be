use frames::caret::{check_stop, first_stop, stop_before};
use frames::{
    CaretPosition, CurrentFrame, Direction, FrameError, FrameId, FrameKind, FrameTree, Navigator,
    Placement,
};

const MAIN: FrameId = FrameId(3);

fn insert(tree: &mut FrameTree, placement: Placement, kind: FrameKind) -> FrameId {
    tree.allocate_and_insert(placement, kind).expect("insertion failed")
}

fn body(id: u32) -> CurrentFrame {
    CurrentFrame::new(FrameId(id), CaretPosition::Body)
}

fn below(id: u32) -> CurrentFrame {
    CurrentFrame::new(FrameId(id), CaretPosition::Below)
}

#[test]
fn descends_through_an_if_body() {
    let mut tree = FrameTree::new();
    let if_frame = insert(&mut tree, Placement::append_to(MAIN), FrameKind::If);
    let statement = insert(&mut tree, Placement::append_to(if_frame), FrameKind::Return);

    let mut caret = Navigator::new();
    caret.place(&mut tree, if_frame, CaretPosition::Body).unwrap();
    assert_eq!(
        caret.move_caret(&mut tree, Direction::Down).unwrap(),
        CurrentFrame::new(statement, CaretPosition::Below)
    );
    assert_eq!(
        caret.move_caret(&mut tree, Direction::Down).unwrap(),
        CurrentFrame::new(if_frame, CaretPosition::Below)
    );
}

/// main: if #4 { } elif #5 { break #6 }, while #7 { }
fn sample() -> FrameTree {
    let mut tree = FrameTree::new();
    let if_frame = insert(&mut tree, Placement::append_to(MAIN), FrameKind::If);
    let elif = insert(&mut tree, Placement::join(if_frame), FrameKind::Elif);
    insert(&mut tree, Placement::append_to(elif), FrameKind::Break);
    insert(&mut tree, Placement::append_to(MAIN), FrameKind::While);
    tree
}

fn document_order() -> Vec<CurrentFrame> {
    vec![
        body(0),
        body(1),
        below(1),
        body(2),
        below(2),
        body(3),
        body(4),
        body(5),
        below(6),
        below(4),
        body(7),
        below(7),
        below(3),
        below(0),
    ]
}

#[test]
fn down_visits_every_stop_in_document_order() {
    let mut tree = sample();
    let mut caret = Navigator::new();
    let mut visited = vec![caret.current()];
    for _ in 1..document_order().len() {
        visited.push(caret.move_caret(&mut tree, Direction::Down).unwrap());
    }
    assert_eq!(visited, document_order());

    // The end of the document is a dead end.
    assert_eq!(caret.move_caret(&mut tree, Direction::Down).unwrap(), below(0));
}

#[test]
fn up_is_the_inverse_of_down() {
    let mut tree = sample();
    let mut caret = Navigator::new();
    caret.place(&mut tree, FrameId::ROOT, CaretPosition::Below).unwrap();

    let mut visited = vec![caret.current()];
    for _ in 1..document_order().len() {
        visited.push(caret.move_caret(&mut tree, Direction::Up).unwrap());
    }
    let mut expected = document_order();
    expected.reverse();
    assert_eq!(visited, expected);

    assert_eq!(caret.move_caret(&mut tree, Direction::Up).unwrap(), body(0));
}

#[test]
fn markers_follow_the_caret() {
    let mut tree = sample();
    let mut caret = Navigator::new();
    caret.place(&mut tree, FrameId(7), CaretPosition::Body).unwrap();
    assert_eq!(tree.caret_marker(), Some((FrameId(7), CaretPosition::Body)));

    caret.move_caret(&mut tree, Direction::Down).unwrap();
    assert_eq!(tree.caret_marker(), Some((FrameId(7), CaretPosition::Below)));
    assert!(!tree.get(FrameId(7)).unwrap().caret_body);

    caret.move_caret(&mut tree, Direction::Up).unwrap();
    caret.move_caret(&mut tree, Direction::Up).unwrap();
    assert_eq!(tree.caret_marker(), Some((FrameId(4), CaretPosition::Below)));
    assert_eq!(tree.frames().filter(|frame| frame.caret_body || frame.caret_below).count(), 1);
    tree.check_invariants().unwrap();
}

#[test]
fn hidden_caret_keeps_its_position() {
    let mut tree = sample();
    let mut caret = Navigator::new();
    caret.place(&mut tree, FrameId(4), CaretPosition::Below).unwrap();
    caret.hide(&mut tree);
    assert!(caret.is_hidden());
    assert_eq!(tree.caret_marker(), None);

    caret.show(&mut tree).unwrap();
    assert_eq!(tree.caret_marker(), Some((FrameId(4), CaretPosition::Below)));
}

#[test]
fn statements_have_no_body_stop() {
    let mut tree = sample();
    let mut caret = Navigator::new();
    assert!(caret.place(&mut tree, FrameId(6), CaretPosition::Body).is_err());
    assert!(caret.place(&mut tree, FrameId(99), CaretPosition::Below).is_err());
    assert_eq!(caret.current(), body(0));
}

#[test]
fn both_and_none_move_like_below() {
    let mut tree = sample();
    let mut caret = Navigator::new();
    caret.place(&mut tree, FrameId(4), CaretPosition::Both).unwrap();
    assert_eq!(caret.move_caret(&mut tree, Direction::Down).unwrap(), body(7));

    caret.place(&mut tree, FrameId(7), CaretPosition::None).unwrap();
    assert_eq!(caret.move_caret(&mut tree, Direction::Down).unwrap(), below(3));
}

#[test]
fn stop_helpers() {
    let tree = sample();
    assert_eq!(first_stop(tree.get(FrameId(4)).unwrap()), body(4));
    assert_eq!(first_stop(tree.get(FrameId(6)).unwrap()), below(6));

    assert_eq!(stop_before(&tree, FrameId(4)).unwrap(), body(3));
    assert_eq!(stop_before(&tree, FrameId(7)).unwrap(), below(4));
    assert_eq!(stop_before(&tree, FrameId(5)).unwrap(), body(4));
    assert_eq!(stop_before(&tree, FrameId(6)).unwrap(), body(5));
}

#[test]
fn joint_frames_have_no_stop_below() {
    let mut tree = sample();
    let mut caret = Navigator::new();
    for position in [CaretPosition::Below, CaretPosition::Both, CaretPosition::None] {
        let result = caret.place(&mut tree, FrameId(5), position);
        assert!(
            matches!(result, Err(FrameError::StructuralViolation { frame: FrameId(5), .. })),
            "{position:?}: {result:?}"
        );
    }
    assert_eq!(caret.place(&mut tree, FrameId(5), CaretPosition::Body).unwrap(), body(5));
    assert_eq!(check_stop(&tree, FrameId(4), CaretPosition::Below), Ok(()));
    assert_eq!(tree.caret_marker(), Some((FrameId(5), CaretPosition::Body)));
}
