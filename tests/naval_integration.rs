//! Naval engine integration tests

use carrier_war::battle::*;
use carrier_war::core::config::EngineConfig;
use carrier_war::core::error::CarrierError;
use carrier_war::core::types::{MatchResult, Side, UnitId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn open_board(size: u32, a: HexCoord, b: HexCoord) -> GameBoard {
    let mut units = side_roster(Side::A, a);
    units.extend(side_roster(Side::B, b));
    let config = EngineConfig {
        map_width: size,
        map_height: size,
        ..EngineConfig::default()
    };
    GameBoard::new(HexGrid::new(size, size), units, config).unwrap()
}

fn hold_both() -> [PlayerOrders; 2] {
    [PlayerOrders::hold(), PlayerOrders::hold()]
}

#[test]
fn test_carrier_crosses_small_sea() {
    let goal = HexCoord::new(4, 4);
    let mut board = open_board(5, HexCoord::new(0, 0), HexCoord::new(4, 0));
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let carrier_id = UnitId::carrier(Side::A, 1);

    let start = board.unit(&carrier_id).unwrap().pos;
    let mut distance = start.distance(&goal);
    assert_eq!(distance, 6);

    let orders = [PlayerOrders::move_carrier(goal), PlayerOrders::hold()];
    board.turn_forward(&orders, &mut rng).unwrap();
    distance = board.unit(&carrier_id).unwrap().pos.distance(&goal);
    assert_eq!(distance, 4);

    // Distance falls by the carrier's speed each turn until arrival (ceil(6 / 2) turns)
    for expected in [2, 0] {
        board.turn_forward(&hold_both(), &mut rng).unwrap();
        let now = board.unit(&carrier_id).unwrap().pos.distance(&goal);
        assert_eq!(now, expected);
        assert!(now < distance);
        distance = now;
    }

    // Then it holds
    board.turn_forward(&hold_both(), &mut rng).unwrap();
    assert_eq!(board.unit(&carrier_id).unwrap().pos, goal);
}

#[test]
fn test_carrier_routes_around_island() {
    let rows: Vec<Vec<u8>> = vec![
        vec![0, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 0, 0, 1, 0, 0, 0, 0],
        vec![0, 0, 0, 1, 0, 0, 0, 0],
        vec![0, 0, 0, 1, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0, 0, 0, 0],
    ];
    let grid = HexGrid::from_rows(&rows);
    let mut units = side_roster(Side::A, HexCoord::new(1, 2));
    units.extend(side_roster(Side::B, HexCoord::new(7, 7)));
    let config = EngineConfig {
        map_width: 8,
        map_height: 8,
        ..EngineConfig::default()
    };
    let mut board = GameBoard::new(grid, units, config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let goal = HexCoord::new(5, 2);

    let orders = [PlayerOrders::move_carrier(goal), PlayerOrders::hold()];
    let outcome = board.turn_forward(&orders, &mut rng).unwrap();
    let route = &outcome.reports[0].units[0].route;
    assert_eq!(route.first(), Some(&HexCoord::new(1, 2)));
    assert_eq!(route.last(), Some(&goal));
    assert!(route.iter().all(|c| board.grid.is_sea(*c)));

    for _ in 0..6 {
        if board.is_over() {
            break;
        }
        board.turn_forward(&hold_both(), &mut rng).unwrap();
    }
    let carrier = board.carrier(Side::A).unwrap();
    assert_eq!(carrier.pos, goal);
}

#[test]
fn test_squadron_scout_lifecycle() {
    let mut board = open_board(20, HexCoord::new(2, 2), HexCoord::new(17, 17));
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let squadron_id = UnitId::squadron(Side::A, 1);

    let orders = [PlayerOrders::launch(HexCoord::new(10, 2)), PlayerOrders::hold()];
    let outcome = board.turn_forward(&orders, &mut rng).unwrap();
    assert!(outcome
        .events
        .iter()
        .any(|e| matches!(&e.event_type, NavalEventType::Launched { unit_id, .. } if *unit_id == squadron_id)));

    let mut states = vec![board.unit(&squadron_id).unwrap().squadron_state()];
    for _ in 0..8 {
        board.turn_forward(&hold_both(), &mut rng).unwrap();
        let squadron = board.unit(&squadron_id).unwrap();
        if squadron.squadron_state() == Some(SquadronState::Outbound) {
            assert!(squadron.pos.is_valid());
        }
        states.push(squadron.squadron_state());
        if squadron.squadron_state() == Some(SquadronState::Base) {
            break;
        }
    }

    assert_eq!(states.first(), Some(&Some(SquadronState::Outbound)));
    assert!(states.contains(&Some(SquadronState::Returning)));
    assert_eq!(states.last(), Some(&Some(SquadronState::Base)));
    let squadron = board.unit(&squadron_id).unwrap();
    assert!(!squadron.pos.is_valid());
    assert_eq!(squadron.hp, squadron.max_hp);
}

#[test]
fn test_strike_damages_enemy_carrier() {
    let mut board = open_board(12, HexCoord::new(2, 2), HexCoord::new(6, 2));
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let enemy_id = UnitId::carrier(Side::B, 1);

    let orders = [PlayerOrders::launch(HexCoord::new(6, 2)), PlayerOrders::hold()];
    board.turn_forward(&orders, &mut rng).unwrap();

    let mut strike = None;
    for _ in 0..4 {
        let outcome = board.turn_forward(&hold_both(), &mut rng).unwrap();
        strike = outcome.events.iter().find_map(|e| match &e.event_type {
            NavalEventType::Strike { defender, damage, .. } if *defender == enemy_id => Some(*damage),
            _ => None,
        });
        if let Some(damage) = strike {
            assert!(outcome.reports[1].logs.iter().any(|l| l.contains("was hit")));
            assert!((0..=30).contains(&damage));
            break;
        }
    }

    let damage = strike.expect("squadron should strike within a few turns");
    let enemy = board.unit(&enemy_id).unwrap();
    assert_eq!(enemy.hp, 100 - damage);
}

#[test]
fn test_intel_marker_fades_after_three_turns() {
    let mut board = open_board(20, HexCoord::new(2, 2), HexCoord::new(5, 2));
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let enemy_id = UnitId::carrier(Side::B, 1);

    let initial = board.report(Side::A);
    assert!(initial.markers[&enemy_id].seen);

    // Enemy steams east out of sight and keeps going
    let away = [PlayerOrders::hold(), PlayerOrders::move_carrier(HexCoord::new(19, 2))];
    let outcome = board.turn_forward(&away, &mut rng).unwrap();
    let report = &outcome.reports[0];
    assert_eq!(report.markers[&enemy_id].ttl, 2);
    assert!(report.intel_paths.iter().any(|p| p.unit_id == enemy_id && p.turn == 1));

    let outcome = board.turn_forward(&hold_both(), &mut rng).unwrap();
    assert_eq!(outcome.reports[0].markers[&enemy_id].ttl, 1);

    let outcome = board.turn_forward(&hold_both(), &mut rng).unwrap();
    assert!(!outcome.reports[0].markers.contains_key(&enemy_id));
    assert!(!board.intel(Side::A).markers[&enemy_id].seen);

    // Turn-1 sighting path drops out after the retention window
    let outcome = board.turn_forward(&hold_both(), &mut rng).unwrap();
    assert!(outcome.reports[0].intel_paths.iter().all(|p| p.turn != 1));
}

#[test]
fn test_rejected_orders_leave_board_untouched() {
    let mut board = open_board(10, HexCoord::new(1, 1), HexCoord::new(8, 8));
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    board.grid.set_terrain(HexCoord::new(5, 5), Terrain::Land);

    let orders = [PlayerOrders::move_carrier(HexCoord::new(5, 5)), PlayerOrders::hold()];
    let result = board.turn_forward(&orders, &mut rng);
    match result {
        Err(CarrierError::OrdersRejected { side, reasons }) => {
            assert_eq!(side, Side::A);
            assert_eq!(reasons.len(), 1);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(board.turn, 1);
    assert!(board.carrier(Side::A).unwrap().target.is_none());
}

#[test]
fn test_generated_match_runs_to_turn_limit() {
    let config = EngineConfig {
        max_turns: 5,
        ..EngineConfig::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut board = GameBoard::generate(config, &mut rng).unwrap();
    assert!(board.grid.validate_sea_connectivity());

    let mut last = None;
    while !board.is_over() {
        last = Some(board.turn_forward(&hold_both(), &mut rng).unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.turn, 5);
    assert_eq!(last.status.result, Some(MatchResult::Draw));
    assert!(last
        .events
        .iter()
        .any(|e| matches!(e.event_type, NavalEventType::MatchEnded { .. })));

    let again = board.turn_forward(&hold_both(), &mut rng);
    assert!(matches!(again, Err(CarrierError::MatchOver)));
}

#[test]
fn test_seeded_matches_are_reproducible() {
    let play = |seed: u64| -> String {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut board = GameBoard::generate(EngineConfig::default(), &mut rng).unwrap();
        let heading = spawn_point(Side::B, 30, 30);
        let orders = [PlayerOrders::move_carrier(heading), PlayerOrders::hold()];
        let mut outcomes = vec![board.turn_forward(&orders, &mut rng).unwrap()];
        for _ in 0..4 {
            outcomes.push(board.turn_forward(&hold_both(), &mut rng).unwrap());
        }
        serde_json::to_string(&outcomes).unwrap()
    };
    assert_eq!(play(21), play(21));
}

#[test]
fn test_wall_connectivity_examples() {
    let mut rows = vec![vec![0u8; 5]; 5];
    rows[2] = vec![1, 1, 0, 1, 1];
    assert!(HexGrid::from_rows(&rows).validate_sea_connectivity());

    rows[2][2] = 1;
    assert!(!HexGrid::from_rows(&rows).validate_sea_connectivity());
}
