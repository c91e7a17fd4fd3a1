use battlegrid::{FleetError, FleetLedger, Orientation, DEFAULT_FLEET};

#[test]
fn test_fifo_order_and_completion() {
    let mut ledger = FleetLedger::new(&DEFAULT_FLEET);
    assert_eq!(ledger.current_length(), Some(5));
    ledger.advance(0, 0, 5, Orientation::Horizontal).unwrap();
    assert_eq!(ledger.current_length(), Some(4));
    for (i, &len) in DEFAULT_FLEET[1..].iter().enumerate() {
        ledger
            .advance(2 * (i + 1), 0, len, Orientation::Horizontal)
            .unwrap();
    }
    assert!(ledger.complete());
    assert_eq!(ledger.current_length(), None);
    assert_eq!(
        ledger.advance(9, 9, 2, Orientation::Vertical),
        Err(FleetError::Complete)
    );
}

#[test]
fn test_out_of_order_length_removed_by_value() {
    let mut ledger = FleetLedger::new(&DEFAULT_FLEET);
    ledger.advance(0, 0, 3, Orientation::Vertical).unwrap();
    assert_eq!(ledger.remaining().collect::<Vec<_>>(), vec![5, 4, 3, 2]);
    assert_eq!(
        ledger.advance(0, 2, 7, Orientation::Vertical),
        Err(FleetError::LengthNotRemaining(7))
    );
    assert_eq!(ledger.placed().len(), 1);
}

#[test]
fn test_undo_restores_front() {
    let mut ledger = FleetLedger::new(&DEFAULT_FLEET);
    assert!(ledger.undo().is_none());
    let before: Vec<_> = ledger.remaining().collect();
    ledger.advance(1, 1, 5, Orientation::Horizontal).unwrap();
    let undone = ledger.undo().unwrap();
    assert_eq!((undone.row, undone.col, undone.length), (1, 1, 5));
    assert_eq!(ledger.remaining().collect::<Vec<_>>(), before);
    assert!(ledger.placed().is_empty());
}

#[test]
fn test_summary_lists_every_length() {
    let mut ledger = FleetLedger::new(&DEFAULT_FLEET);
    let summary = ledger.summary();
    assert_eq!(summary.get(&3), Some(&2));
    assert_eq!(summary.get(&5), Some(&1));

    ledger.advance(0, 0, 5, Orientation::Horizontal).unwrap();
    let summary = ledger.summary();
    assert_eq!(summary.get(&5), Some(&0));
    assert_eq!(summary.values().sum::<usize>(), 4);
}

#[test]
fn test_reset() {
    let mut ledger = FleetLedger::new(&[3, 2]);
    ledger.advance(0, 0, 3, Orientation::Horizontal).unwrap();
    ledger.reset();
    assert_eq!(ledger.remaining().collect::<Vec<_>>(), vec![3, 2]);
    assert!(ledger.placed().is_empty());
}
