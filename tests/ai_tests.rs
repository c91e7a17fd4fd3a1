use battlegrid::{hunt_cell, AiMode, Grid, HuntTargetAi, LineOrientation, GRID_SIZE};
use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

#[test]
fn test_second_hit_pins_horizontal_line() {
    let mut ai = HuntTargetAi::new();
    ai.record_hit(3, 3);
    assert_eq!(ai.mode(), AiMode::Target);
    assert_eq!(ai.line(), LineOrientation::Unknown);
    let mut queue: Vec<_> = ai.target_queue().collect();
    queue.sort();
    assert_eq!(queue, vec![(2, 3), (3, 2), (3, 4), (4, 3)]);

    ai.record_hit(3, 4);
    assert_eq!(ai.line(), LineOrientation::Horizontal);
    let queue: Vec<_> = ai.target_queue().collect();
    assert!(queue.contains(&(3, 2)));
    assert!(queue.contains(&(3, 5)));
    assert!(!queue.contains(&(2, 3)));
    assert!(!queue.contains(&(4, 3)));
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_vertical_line_at_edge() {
    let mut ai = HuntTargetAi::new();
    ai.record_hit(0, 7);
    ai.record_hit(1, 7);
    assert_eq!(ai.line(), LineOrientation::Vertical);
    // Nothing above row 0.
    assert_eq!(ai.target_queue().collect::<Vec<_>>(), vec![(2, 7)]);
}

#[test]
fn test_stale_queue_entries_are_skipped() {
    let mut rng = SmallRng::seed_from_u64(1);
    let mut ai = HuntTargetAi::new();
    ai.record_hit(5, 5);
    let shots = Grid::from_cells([(5, 5), (4, 5), (6, 5)]).unwrap();
    let cell = ai.choose_cell(&shots, &mut rng).unwrap();
    assert_eq!(cell, (5, 4));
    assert_eq!(ai.choose_cell(&shots, &mut rng), Some((5, 6)));
}

#[test]
fn test_empty_queue_falls_back_to_hunt() {
    let mut rng = SmallRng::seed_from_u64(9);
    let mut ai = HuntTargetAi::new();
    let (r, c) = ai.choose_cell(&Grid::new(), &mut rng).unwrap();
    assert_eq!((r + c) % 2, 0);
}

#[test]
fn test_reset_to_hunt() {
    let mut ai = HuntTargetAi::new();
    ai.record_hit(2, 2);
    ai.record_hit(2, 3);
    ai.reset_to_hunt();
    assert_eq!(ai, HuntTargetAi::new());
    assert!(ai.is_consistent());
}

#[test]
fn test_hunt_prefers_parity_then_rest() {
    let mut rng = SmallRng::seed_from_u64(4);
    let even: Vec<_> = (0..GRID_SIZE)
        .flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
        .filter(|(r, c)| (r + c) % 2 == 0)
        .collect();
    let shots = Grid::from_cells(even).unwrap();
    for _ in 0..20 {
        let (r, c) = hunt_cell(&shots, &mut rng).unwrap();
        assert_eq!((r + c) % 2, 1);
        assert!(!shots.get(r, c).unwrap());
    }
    assert_eq!(hunt_cell(&!Grid::new(), &mut rng), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn queue_stays_on_the_line(
        row in 0..GRID_SIZE,
        col in 0..GRID_SIZE - 3,
        horizontal in any::<bool>(),
        extra in 0usize..3,
    ) {
        let mut ai = HuntTargetAi::new();
        let cells: Vec<(usize, usize)> = (0..2 + extra)
            .map(|i| if horizontal { (row, col + i) } else { (col + i, row) })
            .collect();
        for &(r, c) in &cells {
            ai.record_hit(r, c);
        }
        let expected = if horizontal { LineOrientation::Horizontal } else { LineOrientation::Vertical };
        prop_assert_eq!(ai.line(), expected);
        let queue: Vec<_> = ai.target_queue().collect();
        prop_assert!(!queue.is_empty() && queue.len() <= 2);
        for (r, c) in queue {
            if horizontal {
                prop_assert_eq!(r, row);
                prop_assert!(c + 1 == col || c == col + cells.len());
            } else {
                prop_assert_eq!(c, row);
                prop_assert!(r + 1 == col || r == col + cells.len());
            }
        }
    }
}
