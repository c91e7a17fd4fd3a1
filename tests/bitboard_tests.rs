use battlegrid::{neighbours, BitBoard, BitBoardError, Grid};

#[test]
fn test_try_new_sizes() {
    // Success for board that fits
    let ok = BitBoard::<u64, 8>::try_new();
    assert!(ok.is_ok());

    // Failure when board is too large
    let err = BitBoard::<u8, 3>::try_new();
    assert!(matches!(err, Err(BitBoardError::SizeTooLarge { .. })));
}

#[test]
fn test_get_set_clear() {
    let mut bb = BitBoard::<u16, 4>::new();
    assert!(bb.is_empty());

    bb.set(1, 1).unwrap();
    assert!(bb.get(1, 1).unwrap());

    bb.clear(1, 1).unwrap();
    assert!(!bb.get(1, 1).unwrap());

    assert!(matches!(
        bb.set(4, 0),
        Err(BitBoardError::IndexOutOfBounds { row: 4, col: 0 })
    ));
}

#[test]
fn test_from_cells_and_iter() {
    let bb = BitBoard::<u16, 4>::from_cells([(0, 1), (3, 3)]).unwrap();
    let bits: Vec<_> = bb.iter_set_bits().collect();
    assert_eq!(bits, vec![(0, 1), (3, 3)]);
}

#[test]
fn test_dilate_stays_on_board() {
    let corner = Grid::from_cells([(0, 0)]).unwrap();
    let grown: Vec<_> = corner.dilate().iter_set_bits().collect();
    assert_eq!(grown, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);

    // Right edge must not wrap onto the next row.
    let edge = Grid::from_cells([(4, 9)]).unwrap();
    let grown = edge.dilate();
    assert_eq!(grown.count_ones(), 6);
    assert!(!grown.get(5, 0).unwrap());
    assert!(!grown.get(4, 0).unwrap());
}

#[test]
fn test_not_is_canonical() {
    let all = !Grid::new();
    assert_eq!(all.count_ones(), 100);
    assert!(all.is_canonical());
    let raw = Grid::from_raw(u128::MAX);
    assert_eq!(raw.count_ones(), 100);
    assert!(raw.is_canonical());
}

#[test]
fn test_neighbours() {
    let mut n: Vec<_> = neighbours(0, 0, 10).collect();
    n.sort();
    assert_eq!(n, vec![(0, 1), (1, 0), (1, 1)]);
    assert_eq!(neighbours(5, 5, 10).count(), 8);
}
