use std::fmt::Write;

use crate::bitboard::Grid;
use crate::board::Board;
use crate::config::GRID_SIZE;
use crate::game::GameSession;

/// `(row, col)` as a board label such as `C7`.
pub fn coord_to_string(row: usize, col: usize) -> String {
    let col = (b'A' + col as u8) as char;
    format!("{}{}", col, row + 1)
}

/// Parse a label such as `c7` into `(row, col)`.
pub fn parse_coord(input: &str) -> Option<(usize, usize)> {
    let mut chars = input.trim().chars();
    let col_ch = chars.next()?.to_ascii_uppercase();
    if !col_ch.is_ascii_uppercase() {
        return None;
    }
    let col = (col_ch as u8 - b'A') as usize;
    let row: usize = chars.as_str().parse().ok()?;
    if row == 0 || row > GRID_SIZE || col >= GRID_SIZE {
        return None;
    }
    Some((row - 1, col))
}

fn render_grid(out: &mut String, cell: impl Fn(usize, usize) -> char) {
    out.push_str("   ");
    for c in 0..GRID_SIZE {
        let _ = write!(out, " {}", (b'A' + c as u8) as char);
    }
    out.push('\n');
    for r in 0..GRID_SIZE {
        let _ = write!(out, "{:2} ", r + 1);
        for c in 0..GRID_SIZE {
            let _ = write!(out, " {}", cell(r, c));
        }
        out.push('\n');
    }
}

/// Own board: `S` ship, `X` hit, `o` miss or marked water.
pub fn render_own_board(board: &Board) -> String {
    let mut out = String::new();
    let (occupancy, shots, hits) = (board.occupancy(), board.shots(), board.hits());
    render_grid(&mut out, |r, c| {
        if hits.get(r, c).unwrap_or(false) {
            'X'
        } else if shots.get(r, c).unwrap_or(false) {
            'o'
        } else if occupancy.get(r, c).unwrap_or(false) {
            'S'
        } else {
            '.'
        }
    });
    out
}

/// What we know of the opponent's board.
pub fn render_target_board(shots: &Grid, hits: &Grid) -> String {
    let mut out = String::new();
    render_grid(&mut out, |r, c| {
        if hits.get(r, c).unwrap_or(false) {
            'X'
        } else if shots.get(r, c).unwrap_or(false) {
            'o'
        } else {
            '.'
        }
    });
    out
}

/// Opponent view on top, own board below.
pub fn print_player_view(session: &GameSession) {
    let (shots, hits) = session.opponent_view();
    println!("Opponent board:");
    print!("{}", render_target_board(&shots, &hits));
    println!("\nYour board:");
    print!("{}", render_own_board(session.player_board()));
}
