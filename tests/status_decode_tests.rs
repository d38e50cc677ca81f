use naval_battle::{AttackStatus, CellMark, DefenseStatus, Position};

fn pos(s: &str) -> Position {
    s.parse().unwrap()
}

#[test]
fn defense_status_decodes_engine_payload() {
    let payload = r##"{
        "state": "q2",
        "total_attacks": 3,
        "ships_status": [
            {"name": "Battleship", "is_sunk": false, "hit_count": 1, "total_positions": 3,
             "positions": ["A1", "A2", "A3"], "hits": ["A2"]},
            {"name": "Submarine", "is_sunk": false, "hit_count": 0, "total_positions": 2},
            {"name": "Destroyer", "is_sunk": true, "hit_count": 1, "total_positions": 1}
        ],
        "grid": {"A1": "~", "A2": "X", "C1": "#", "E5": "O", "B3": "~"}
    }"##;
    let status: DefenseStatus = serde_json::from_str(payload).unwrap();
    assert_eq!(status.state_label(), "Hit");
    assert_eq!(status.total_attacks, 3);
    assert_eq!(status.ships_afloat(), 2);
    assert_eq!(status.ships_status[0].hits, vec![pos("A2")]);
    assert!(status.ships_status[1].positions.is_empty());
    assert_eq!(status.grid.mark(pos("A2")), CellMark::Hit);
    assert_eq!(status.grid.mark(pos("C1")), CellMark::Sunk);
    assert_eq!(status.grid.mark(pos("E5")), CellMark::Miss);
    assert_eq!(status.grid.mark(pos("A1")), CellMark::Empty);
    assert_eq!(status.grid.mark(pos("D4")), CellMark::Empty);
}

#[test]
fn unknown_tokens_and_cells_decode_to_empty() {
    let payload = r#"{
        "state": "q9",
        "total_attacks": 0,
        "grid": {"A1": "?", "B2": 7, "Z9": "X", "C3": null, "D4": "hit"}
    }"#;
    let status: DefenseStatus = serde_json::from_str(payload).unwrap();
    assert_eq!(status.state_label(), "q9");
    assert!(status.ships_status.is_empty());
    assert_eq!(status.grid.mark(pos("A1")), CellMark::Empty);
    assert_eq!(status.grid.mark(pos("B2")), CellMark::Empty);
    assert_eq!(status.grid.mark(pos("C3")), CellMark::Empty);
    assert_eq!(status.grid.mark(pos("D4")), CellMark::Hit);
    assert_eq!(status.grid.count(CellMark::Empty), 24);
}

#[test]
fn attack_status_without_grid_defaults_empty() {
    let payload = r#"{"total_attacks": 4, "hits": 1, "misses": 3, "sunk_ships": 0,
                      "accuracy": 25.0, "game_won": false}"#;
    let status: AttackStatus = serde_json::from_str(payload).unwrap();
    assert_eq!(status.total_attacks, 4);
    assert!((status.accuracy - 25.0).abs() < f64::EPSILON);
    assert_eq!(status.grid.count(CellMark::Empty), 25);
}

#[test]
fn grid_serializes_with_engine_tokens() {
    let mut status = AttackStatus::fresh();
    status.grid.set(pos("B4"), CellMark::Hit);
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["grid"]["B4"], "X");
    assert_eq!(json["grid"]["A1"], "~");
    assert_eq!(json["grid"].as_object().map(|m| m.len()), Some(25));
}

#[test]
fn decode_understands_glyphs_and_names() {
    assert_eq!(CellMark::decode("O"), CellMark::Miss);
    assert_eq!(CellMark::decode("miss"), CellMark::Miss);
    assert_eq!(CellMark::decode("x"), CellMark::Hit);
    assert_eq!(CellMark::decode("#"), CellMark::Sunk);
    assert_eq!(CellMark::decode("sunk"), CellMark::Sunk);
    assert_eq!(CellMark::decode(""), CellMark::Empty);
    assert_eq!(CellMark::decode("~"), CellMark::Empty);
}
