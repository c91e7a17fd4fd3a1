use battlegrid::{Board, BoardError, BoardState, Orientation, ShotOutcome, DEFAULT_FLEET};
use rand::{rngs::SmallRng, SeedableRng};

#[test]
fn test_two_cell_ship_hit_then_sunk() {
    let mut board = Board::new(true);
    board.place(0, 0, 2, Orientation::Horizontal).unwrap();

    assert_eq!(board.receive_shot(0, 0).unwrap(), ShotOutcome::Hit);
    assert!(!board.all_sunk());
    match board.receive_shot(0, 1).unwrap() {
        ShotOutcome::Sunk(ship) => {
            assert_eq!(ship.origin(), (0, 0));
            assert_eq!(ship.length(), 2);
            assert!(ship.is_sunk());
        }
        other => panic!("expected sunk, got {:?}", other),
    }
    assert!(board.all_sunk());
}

#[test]
fn test_repeat_shot_changes_nothing() {
    let mut board = Board::new(true);
    board.place(4, 4, 3, Orientation::Vertical).unwrap();
    assert_eq!(board.receive_shot(5, 4).unwrap(), ShotOutcome::Hit);
    let before = BoardState::from(&board);

    assert_eq!(board.receive_shot(5, 4).unwrap(), ShotOutcome::Repeat);
    assert_eq!(board.receive_shot(5, 4).unwrap(), ShotOutcome::Repeat);
    assert_eq!(BoardState::from(&board), before);
    assert_eq!(board.ships()[0].hit_count(), 1);

    assert_eq!(board.receive_shot(0, 0).unwrap(), ShotOutcome::Miss);
    assert_eq!(board.receive_shot(0, 0).unwrap(), ShotOutcome::Repeat);
}

#[test]
fn test_out_of_bounds_shot_is_an_error() {
    let mut board = Board::new(true);
    board.place(0, 0, 2, Orientation::Horizontal).unwrap();
    assert_eq!(
        board.receive_shot(10, 0),
        Err(BoardError::OutOfBounds { row: 10, col: 0 })
    );
    assert!(board.shots().is_empty());
}

#[test]
fn test_all_sunk_needs_a_ship() {
    assert!(!Board::new(true).all_sunk());
}

#[test]
fn test_placement_rules() {
    let mut board = Board::new(true);
    board.place(2, 2, 3, Orientation::Horizontal).unwrap();

    assert_eq!(
        board.check_placement(2, 3, 2, Orientation::Vertical),
        Err(BoardError::ShipOverlaps)
    );
    // Diagonal contact counts as touching.
    assert_eq!(
        board.check_placement(3, 5, 2, Orientation::Horizontal),
        Err(BoardError::ShipTouches)
    );
    assert_eq!(
        board.check_placement(0, 9, 2, Orientation::Horizontal),
        Err(BoardError::ShipOutOfBounds)
    );
    assert_eq!(
        board.check_placement(0, 0, 0, Orientation::Horizontal),
        Err(BoardError::InvalidLength(0))
    );
    assert!(board.can_place(4, 2, 3, Orientation::Horizontal));

    // Rejections never mutate.
    assert_eq!(board.ships().len(), 1);
    assert_eq!(board.occupancy().count_ones(), 3);
}

#[test]
fn test_touching_allowed_without_rule() {
    let mut board = Board::new(false);
    board.place(2, 2, 3, Orientation::Horizontal).unwrap();
    assert!(board.can_place(3, 2, 3, Orientation::Horizontal));
    assert!(!board.can_place(2, 4, 2, Orientation::Vertical));
}

#[test]
fn test_undo_last_placement_frees_cells() {
    let mut board = Board::new(true);
    board.place(0, 0, 4, Orientation::Vertical).unwrap();
    assert!(!board.can_place(0, 1, 2, Orientation::Horizontal));
    let ship = board.undo_last_placement().unwrap();
    assert_eq!(ship.length(), 4);
    assert!(board.can_place(0, 1, 2, Orientation::Horizontal));
    assert!(board.undo_last_placement().is_none());
    assert!(board.occupancy().is_empty());
}

#[test]
fn test_mark_surrounding_ring() {
    let mut board = Board::new(true);
    board.place(0, 0, 2, Orientation::Horizontal).unwrap();
    board.receive_shot(1, 1).unwrap();
    board.receive_shot(0, 0).unwrap();
    let ship = match board.receive_shot(0, 1).unwrap() {
        ShotOutcome::Sunk(ship) => ship,
        other => panic!("expected sunk, got {:?}", other),
    };
    let mut marked = board.mark_surrounding(&ship);
    marked.sort();
    // (1, 1) was already shot and is not reported again.
    assert_eq!(marked, vec![(0, 2), (1, 0), (1, 2)]);
    assert_eq!(board.hits().count_ones(), 2);
    assert_eq!(board.shots().count_ones(), 6);
}

#[test]
fn test_random_fleet_is_legal() {
    for seed in 0..20 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut board = Board::new(true);
        board.place_fleet_randomly(&mut rng, &DEFAULT_FLEET).unwrap();
        let mut lengths: Vec<_> = board.ships().iter().map(|s| s.length()).collect();
        lengths.sort();
        assert_eq!(lengths, vec![2, 3, 3, 4, 5]);
        assert_eq!(board.occupancy().count_ones(), 17);
        for (i, a) in board.ships().iter().enumerate() {
            for b in &board.ships()[i + 1..] {
                assert!((a.mask().dilate() & b.mask()).is_empty(), "ships touch");
            }
        }
    }
}

#[test]
fn test_random_fleet_gives_up_when_impossible() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut board = Board::new(true);
    let err = board.place_fleet_randomly(&mut rng, &[11]).unwrap_err();
    assert_eq!(err, BoardError::UnableToPlaceShip);
    assert!(board.ships().is_empty());
}

#[test]
fn test_extend_keeps_existing_ships() {
    let mut rng = SmallRng::seed_from_u64(3);
    let mut board = Board::new(true);
    board.place(9, 0, 5, Orientation::Horizontal).unwrap();
    board.extend_fleet_randomly(&mut rng, &[4, 3, 3, 2]).unwrap();
    assert_eq!(board.ships().len(), 5);
    assert_eq!(board.ships()[0].origin(), (9, 0));
}

#[test]
fn test_state_rejects_inconsistent_hits() {
    let mut board = Board::new(true);
    board.place(0, 0, 3, Orientation::Horizontal).unwrap();
    board.receive_shot(0, 0).unwrap();
    let good = BoardState::from(&board);
    assert_eq!(Board::try_from(good.clone()).unwrap(), board);

    // A hit on open water.
    let mut bad = good.clone();
    bad.hits.set(5, 5).unwrap();
    bad.shots.set(5, 5).unwrap();
    assert!(matches!(Board::try_from(bad), Err(BoardError::Inconsistent(_))));

    // A hit without a shot.
    let mut bad = good;
    bad.shots.clear(0, 0).unwrap();
    assert!(matches!(Board::try_from(bad), Err(BoardError::Inconsistent(_))));
}
