use frames::{
    CaretPosition, DocumentState, FrameError, FrameId, FrameKind, FrameSlotContent, FrameTree,
    Navigator, Placement,
};

const MAIN: FrameId = FrameId(3);

fn sample() -> FrameTree {
    let mut tree = FrameTree::new();
    let if_frame = tree
        .allocate_and_insert(Placement::append_to(MAIN), FrameKind::If)
        .unwrap();
    tree.set_slot_content(if_frame, 0, "ready").unwrap();
    tree.allocate_and_insert(Placement::join(if_frame), FrameKind::Else)
        .unwrap();
    tree.allocate_and_insert(Placement::append_to(if_frame), FrameKind::Break)
        .unwrap();
    Navigator::new()
        .place(&mut tree, if_frame, CaretPosition::Body)
        .unwrap();
    tree
}

fn assert_corrupt(state: DocumentState) {
    let result = FrameTree::from_state(state);
    assert!(matches!(result, Err(FrameError::CorruptDocument(_))), "{result:?}");
}

#[test]
fn json_round_trip() {
    let tree = sample();
    let json = tree.to_state().to_json().unwrap();
    let restored = FrameTree::from_state(DocumentState::from_json(&json).unwrap()).unwrap();
    assert_eq!(restored, tree);
    assert_eq!(restored.next_available_id(), FrameId(7));
    assert_eq!(restored.slot_content(FrameId(4), 0), "ready");
    assert_eq!(restored.caret_marker(), Some((FrameId(4), CaretPosition::Body)));
}

#[test]
fn persisted_field_names() {
    let value = serde_json::to_value(DocumentState::default()).unwrap();
    assert_eq!(value["nextAvailableId"], 4);
    let main = &value["frames"]["3"];
    assert_eq!(main["frameType"], "mainContainer");
    assert_eq!(main["parentId"], 0);
    assert_eq!(main["childrenIds"], serde_json::json!([]));
    assert_eq!(main["isVisible"], true);
}

#[test]
fn missing_fields_take_defaults() {
    let json = r#"{
        "nextAvailableId": 5,
        "frames": {
            "0": { "id": 0, "frameType": "root", "childrenIds": [1, 2, 3] },
            "1": { "id": 1, "frameType": "importsContainer", "parentId": 0 },
            "2": { "id": 2, "frameType": "funcDefsContainer", "parentId": 0 },
            "3": { "id": 3, "frameType": "mainContainer", "parentId": 0, "childrenIds": [4] },
            "4": { "id": 4, "frameType": "return", "parentId": 3,
                   "contentDict": { "0": { "code": "x" } } }
        }
    }"#;
    let tree = FrameTree::from_state(DocumentState::from_json(json).unwrap()).unwrap();
    let frame = tree.get(FrameId(4)).unwrap();
    assert!(frame.is_visible);
    assert!(!frame.is_disabled);
    assert_eq!(tree.slot_content(FrameId(4), 0), "x");
    assert!(tree.slot(FrameId(4), 0).unwrap().shown_label);
}

#[test]
fn unknown_frame_type_fails_to_parse() {
    let json = r#"{ "nextAvailableId": 1, "frames": { "0": { "id": 0, "frameType": "switch" } } }"#;
    assert!(DocumentState::from_json(json).is_err());
}

#[test]
fn dangling_child_is_corrupt() {
    let mut state = sample().to_state();
    state.frames.get_mut(&MAIN).unwrap().children_ids.push(FrameId(40));
    assert_corrupt(state);
}

#[test]
fn id_counter_must_exceed_every_id() {
    let mut state = sample().to_state();
    state.next_available_id = 5;
    assert_corrupt(state);
}

#[test]
fn unreferenced_frame_is_corrupt() {
    let mut state = sample().to_state();
    state.frames.get_mut(&FrameId(4)).unwrap().children_ids.clear();
    assert_corrupt(state);
}

#[test]
fn illegal_chain_is_corrupt() {
    let mut state = sample().to_state();
    state.frames.get_mut(&FrameId(5)).unwrap().kind = FrameKind::Except;
    assert_corrupt(state);
}

#[test]
fn forbidden_child_is_corrupt() {
    let mut state = sample().to_state();
    state.frames.get_mut(&FrameId(6)).unwrap().kind = FrameKind::Import;
    assert_corrupt(state);
}

#[test]
fn two_carets_are_corrupt() {
    let mut state = sample().to_state();
    state.frames.get_mut(&FrameId(6)).unwrap().caret_below = true;
    assert_corrupt(state);
}

#[test]
fn two_focused_slots_are_corrupt() {
    let mut tree = sample();
    tree.set_slot_focus(FrameId(4), 0, true).unwrap();
    let mut state = tree.to_state();
    let focused = FrameSlotContent {
        focused: true,
        ..FrameSlotContent::default()
    };
    state.frames.get_mut(&MAIN).unwrap().content.insert(0, focused);
    assert_corrupt(state);
}

#[test]
fn missing_root_is_corrupt() {
    let mut state = DocumentState::default();
    state.frames.remove(&FrameId::ROOT);
    assert_corrupt(state);
}

#[test]
fn extra_container_under_root_is_corrupt() {
    let mut state = sample().to_state();
    let mut extra = state.frames[&MAIN].clone();
    extra.id = FrameId(7);
    extra.children_ids.clear();
    extra.content.clear();
    state.frames.insert(FrameId(7), extra);
    state.next_available_id = 8;
    state.frames.get_mut(&FrameId::ROOT).unwrap().children_ids.push(FrameId(7));
    assert_corrupt(state);
}

#[test]
fn caret_below_a_joint_frame_is_corrupt() {
    let mut tree = sample();
    Navigator::new()
        .place(&mut tree, FrameId(4), CaretPosition::Below)
        .unwrap();
    let mut state = tree.to_state();
    state.frames.get_mut(&FrameId(4)).unwrap().caret_below = false;
    state.frames.get_mut(&FrameId(5)).unwrap().caret_below = true;
    assert_corrupt(state);
}
