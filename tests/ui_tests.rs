use battlegrid::ui::{coord_to_string, parse_coord, render_own_board, render_target_board};
use battlegrid::{level_from, Board, Grid, Orientation};
use log::LevelFilter;

#[test]
fn test_parse_coord() {
    assert_eq!(parse_coord("A1"), Some((0, 0)));
    assert_eq!(parse_coord(" c7 "), Some((6, 2)));
    assert_eq!(parse_coord("J10"), Some((9, 9)));
    assert_eq!(parse_coord("K1"), None);
    assert_eq!(parse_coord("A0"), None);
    assert_eq!(parse_coord("A11"), None);
    assert_eq!(parse_coord("7C"), None);
    assert_eq!(parse_coord(""), None);
    for (r, c) in [(0, 0), (4, 8), (9, 9)] {
        assert_eq!(parse_coord(&coord_to_string(r, c)), Some((r, c)));
    }
}

#[test]
fn test_render_boards() {
    let mut board = Board::new(true);
    board.place(0, 0, 2, Orientation::Horizontal).unwrap();
    board.receive_shot(0, 0).unwrap();
    board.receive_shot(5, 5).unwrap();
    let own = render_own_board(&board);
    let rows: Vec<&str> = own.lines().collect();
    assert_eq!(rows.len(), 11);
    assert!(rows[0].contains("A B C D E F G H I J"));
    assert_eq!(rows[1].trim_start(), "1  X S . . . . . . . .");
    assert!(rows[6].contains("o"));

    let target = render_target_board(&board.shots(), &board.hits());
    assert!(!target.contains('S'));
    assert_eq!(target.matches('X').count(), 1);
    assert_eq!(render_target_board(&Grid::new(), &Grid::new()).matches('.').count(), 100);
}

#[test]
fn test_level_from() {
    assert_eq!(level_from(None), LevelFilter::Info);
    assert_eq!(level_from(Some("debug")), LevelFilter::Debug);
    assert_eq!(level_from(Some(" WARN ")), LevelFilter::Warn);
    assert_eq!(level_from(Some("chatty")), LevelFilter::Info);
}
