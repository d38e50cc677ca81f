use naval_battle::{
    FleetPlacement, PlacementError, Position, PositionSet, ShipType, Toggle, TOTAL_SHIP_CELLS,
};
use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

fn pos(s: &str) -> Position {
    s.parse().unwrap()
}

fn place(placement: &mut FleetPlacement, ship: ShipType, cells: &[&str]) {
    placement.select_ship_type(ship);
    for c in cells {
        placement.toggle_cell(pos(c));
    }
}

#[derive(Debug, Clone)]
enum Op {
    Select(ShipType),
    Toggle(usize, usize),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => prop_oneof![
            Just(ShipType::Battleship),
            Just(ShipType::Submarine),
            Just(ShipType::Destroyer)
        ]
        .prop_map(Op::Select),
        4 => (0..5usize, 0..5usize).prop_map(|(r, c)| Op::Toggle(r, c)),
        1 => Just(Op::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn toggles_never_oversize_or_overlap(ops in proptest::collection::vec(op(), 0..80)) {
        let mut placement = FleetPlacement::new();
        for op in ops {
            match op {
                Op::Select(ship) => placement.select_ship_type(ship),
                Op::Toggle(r, c) => {
                    placement.toggle_cell(Position::new(r, c).unwrap());
                }
                Op::Clear => placement.clear_active(),
            }
            let setup = placement.setup();
            let mut seen = PositionSet::new();
            for ship in ShipType::all() {
                let cells = setup.positions(ship);
                prop_assert!(cells.len() <= ship.size());
                prop_assert!(cells.is_disjoint(&seen));
                seen |= cells;
            }
            let complete = ShipType::all().all(|t| setup.count(t) == t.size());
            prop_assert_eq!(placement.all_ships_placed(), complete);
        }
    }

    #[test]
    fn commit_refused_until_every_ship_is_complete(ops in proptest::collection::vec(op(), 0..40)) {
        let mut placement = FleetPlacement::new();
        for op in ops {
            match op {
                Op::Select(ship) => placement.select_ship_type(ship),
                Op::Toggle(r, c) => {
                    placement.toggle_cell(Position::new(r, c).unwrap());
                }
                Op::Clear => placement.clear_active(),
            }
        }
        let ready = placement.all_ships_placed();
        let result = placement.commit("player1");
        prop_assert_eq!(result.is_ok(), ready);
        prop_assert_eq!(placement.is_locked(), ready);
    }

    #[test]
    fn auto_place_completes_any_partial_fleet(seed in any::<u64>(), r in 0..5usize, c in 0..5usize) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut placement = FleetPlacement::new();
        placement.select_ship_type(ShipType::Submarine);
        placement.toggle_cell(Position::new(r, c).unwrap());
        placement.auto_place(&mut rng).unwrap();
        prop_assert!(placement.all_ships_placed());
        prop_assert_eq!(placement.setup().occupied().len(), TOTAL_SHIP_CELLS);
        prop_assert_eq!(placement.active_ship(), ShipType::Submarine);
    }
}

#[test]
fn full_fleet_can_be_committed() {
    let mut placement = FleetPlacement::new();
    place(&mut placement, ShipType::Battleship, &["A1", "A2", "A3"]);
    place(&mut placement, ShipType::Submarine, &["B1", "B2"]);
    place(&mut placement, ShipType::Destroyer, &["C1"]);
    assert!(placement.all_ships_placed());

    let submission = placement.commit("player1").unwrap();
    assert_eq!(submission.game_id, "player1");
    let body = serde_json::to_value(&submission).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "battleship": ["A1", "A2", "A3"],
            "submarine": ["B1", "B2"],
            "destroyer": ["C1"],
            "game_id": "player1",
        })
    );
    assert!(placement.is_locked());
    assert_eq!(placement.toggle_cell(pos("D1")), Toggle::Ignored);
    assert_eq!(placement.commit("player1"), Err(PlacementError::Locked));
}

#[test]
fn occupied_cell_is_refused_for_another_ship() {
    let mut placement = FleetPlacement::new();
    place(&mut placement, ShipType::Battleship, &["A1", "A2", "A3"]);
    placement.select_ship_type(ShipType::Submarine);
    assert_eq!(placement.toggle_cell(pos("A1")), Toggle::Ignored);
    assert_eq!(placement.toggle_cell(pos("B1")), Toggle::Added);
    let sub: Vec<Position> = placement.setup().positions(ShipType::Submarine).iter().collect();
    assert_eq!(sub, vec![pos("B1")]);
    assert_eq!(placement.setup().owner(pos("A1")), Some(ShipType::Battleship));
}

#[test]
fn full_ship_ignores_extra_cells_but_allows_removal() {
    let mut placement = FleetPlacement::new();
    place(&mut placement, ShipType::Battleship, &["A1", "A2", "A3"]);
    assert!(placement.is_ship_complete(ShipType::Battleship));
    assert_eq!(placement.toggle_cell(pos("A4")), Toggle::Ignored);
    assert_eq!(placement.toggle_cell(pos("A2")), Toggle::Removed);
    assert!(!placement.is_ship_complete(ShipType::Battleship));
    assert_eq!(placement.toggle_cell(pos("A4")), Toggle::Added);
}

#[test]
fn incomplete_commit_names_the_first_missing_ship() {
    let mut placement = FleetPlacement::new();
    place(&mut placement, ShipType::Battleship, &["A1", "A2", "A3"]);
    place(&mut placement, ShipType::Destroyer, &["E5"]);
    assert_eq!(
        placement.commit("player1"),
        Err(PlacementError::FleetIncomplete(ShipType::Submarine))
    );
    assert!(!placement.is_locked());
}

#[test]
fn clear_only_touches_the_active_ship() {
    let mut placement = FleetPlacement::new();
    place(&mut placement, ShipType::Battleship, &["A1", "A2", "A3"]);
    place(&mut placement, ShipType::Submarine, &["B1", "B2"]);
    placement.clear_active();
    assert_eq!(placement.setup().count(ShipType::Submarine), 0);
    assert_eq!(placement.setup().count(ShipType::Battleship), 3);
}

#[test]
fn auto_place_keeps_complete_ships_and_is_seed_stable() {
    let mut a = FleetPlacement::new();
    place(&mut a, ShipType::Battleship, &["C1", "C2", "C3"]);
    let mut b = a.clone();
    a.auto_place(&mut SmallRng::seed_from_u64(7)).unwrap();
    b.auto_place(&mut SmallRng::seed_from_u64(7)).unwrap();
    assert_eq!(a.setup(), b.setup());
    let battleship: Vec<Position> = a.setup().positions(ShipType::Battleship).iter().collect();
    assert_eq!(battleship, vec![pos("C1"), pos("C2"), pos("C3")]);
    assert!(a.all_ships_placed());
}

#[test]
fn auto_place_refuses_a_locked_fleet() {
    let mut placement = FleetPlacement::new();
    placement.auto_place(&mut SmallRng::seed_from_u64(1)).unwrap();
    placement.commit("player1").unwrap();
    assert_eq!(
        placement.auto_place(&mut SmallRng::seed_from_u64(1)),
        Err(PlacementError::Locked)
    );
}
