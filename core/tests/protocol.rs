use serde_json::json;
use sweeper_core::{ClientRequest, HighscoreEntry, MineField, Point, Rect, StateUpdate, ViewCell};

#[test]
fn client_request_decodes_pascal_case_keys() {
    let req: ClientRequest =
        serde_json::from_str(r#"{"Kind":"uncover","X":3,"Y":-4,"Name":""}"#).unwrap();
    assert_eq!(req.kind, "uncover");
    assert_eq!(req.x, 3);
    assert_eq!(req.y, -4);
}

#[test]
fn absent_request_fields_default_to_zero_values() {
    let req: ClientRequest = serde_json::from_str(r#"{"Kind":"move"}"#).unwrap();
    assert_eq!(req.kind, "move");
    assert_eq!(req.x, 0);
    assert_eq!(req.y, 0);
    assert_eq!(req.name, "");
}

#[test]
fn malformed_requests_do_not_decode() {
    assert!(serde_json::from_str::<ClientRequest>("not json").is_err());
    assert!(serde_json::from_str::<ClientRequest>(r#"{"Kind":7}"#).is_err());
}

#[test]
fn view_cells_serialize_as_one_character_strings() {
    assert_eq!(serde_json::to_value(ViewCell::Count(3)).unwrap(), json!("3"));
    assert_eq!(serde_json::to_value(ViewCell::Blank).unwrap(), json!(" "));
    assert_eq!(serde_json::to_value(ViewCell::Flag).unwrap(), json!("P"));
    assert_eq!(serde_json::to_value(ViewCell::Question).unwrap(), json!("?"));
    assert_eq!(serde_json::to_value(ViewCell::Mine).unwrap(), json!("X"));

    let cell: ViewCell = serde_json::from_value(json!("5")).unwrap();
    assert_eq!(cell, ViewCell::Count(5));
    assert!(serde_json::from_value::<ViewCell>(json!("z")).is_err());
}

#[test]
fn state_update_uses_the_wire_field_names() {
    let mut field = MineField::new([0; 16], 5);
    field.uncover(Point::new(0, 0));
    let update = StateUpdate {
        score: 1,
        name: "Ann".to_string(),
        view_port: field.extract_view(Rect::new(-1, -1, 1, 1)),
        highscores: vec![HighscoreEntry {
            name: "Ann".to_string(),
            score: 1,
        }],
    };

    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(value["Score"], json!(1));
    assert_eq!(value["Name"], json!("Ann"));
    assert_eq!(value["ViewPort"]["Position"]["Min"]["X"], json!(-1));
    assert_eq!(value["ViewPort"]["Position"]["Max"]["Y"], json!(1));
    assert_eq!(value["ViewPort"]["Data"][1][1], json!("2"));
    assert_eq!(value["Highscores"][0]["Name"], json!("Ann"));

    let back: StateUpdate = serde_json::from_value(value).unwrap();
    assert_eq!(back.score, update.score);
    assert_eq!(back.view_port.data, update.view_port.data);
}
