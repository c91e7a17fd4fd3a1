use std::io::{self, BufRead, Write};

use rand::rngs::SmallRng;

use crate::ai::hunt_cell;
use crate::config::ship_name;
use crate::game::{Action, Effect, GameError, GameSession, ShotRecord};
use crate::player::Player;
use crate::player_ai::place_fleet_randomly;
use crate::ship::Orientation;
use crate::turn::TurnUpdate;
use crate::ui::{coord_to_string, parse_coord, render_own_board};

/// Human player on stdin/stdout.
#[derive(Debug, Default)]
pub struct CliPlayer;

impl CliPlayer {
    pub fn new() -> Self {
        Self
    }
}

fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

impl Player for CliPlayer {
    fn place_fleet(&mut self, rng: &mut SmallRng, session: &mut GameSession) -> Result<(), GameError> {
        println!("Place your ships: `A5` uses the current orientation, `A5 v` sets it.");
        println!("`r` rotates, `u` undoes, an empty line places the rest at random.");
        while let Some(length) = session.fleet().current_length() {
            print!("{}", render_own_board(session.player_board()));
            let prompt = format!(
                "Place {} (length {}, {:?}): ",
                ship_name(length),
                length,
                session.orientation()
            );
            let Some(line) = read_line(&prompt) else {
                return place_fleet_randomly(rng, session);
            };
            let mut parts = line.split_whitespace();
            let action = match parts.next() {
                None => return place_fleet_randomly(rng, session),
                Some("r") | Some("R") => session.rotate_orientation(),
                Some("u") | Some("U") => session.undo_last_placement(),
                Some(coord) => {
                    let Some((row, col)) = parse_coord(coord) else {
                        println!("Invalid coordinate");
                        continue;
                    };
                    let orientation = match parts.next() {
                        Some(o) if o.eq_ignore_ascii_case("v") => Orientation::Vertical,
                        Some(o) if o.eq_ignore_ascii_case("h") => Orientation::Horizontal,
                        _ => session.orientation(),
                    };
                    session.place_ship(row, col, length, orientation)
                }
            };
            match action {
                Action::Ok(Effect::Undone(p)) => {
                    println!("Removed ship at {}", coord_to_string(p.row, p.col))
                }
                Action::Ok(_) => {}
                Action::Invalid(reason) => println!("Error: {}", reason),
                Action::Repeat => {}
            }
        }
        Ok(())
    }

    fn select_target(&mut self, rng: &mut SmallRng, session: &GameSession) -> Option<(usize, usize)> {
        let shots = session.opponent_shots();
        let suggestion = hunt_cell(&shots, rng)?;
        loop {
            let prompt = format!(
                "Enter target [{}]: ",
                coord_to_string(suggestion.0, suggestion.1)
            );
            let line = read_line(&prompt)?;
            if line.is_empty() {
                return Some(suggestion);
            }
            match parse_coord(&line) {
                Some((r, c)) if shots.get(r, c).unwrap_or(true) => {
                    println!("Already fired at {}", coord_to_string(r, c))
                }
                Some(cell) => return Some(cell),
                None => println!("Invalid coordinate"),
            }
        }
    }

    fn handle_shot_result(&mut self, record: &ShotRecord) {
        println!(
            "You fired at {} -> {}",
            coord_to_string(record.row, record.col),
            describe(record)
        );
    }

    fn handle_opponent_shot(&mut self, record: &ShotRecord) {
        println!(
            "Opponent fired at {} -> {}",
            coord_to_string(record.row, record.col),
            describe(record)
        );
    }
}

fn describe(record: &ShotRecord) -> String {
    use crate::common::ShotOutcome;
    let base = match &record.outcome {
        ShotOutcome::Miss => "miss".to_string(),
        ShotOutcome::Hit => "hit".to_string(),
        ShotOutcome::Sunk(ship) => format!("sunk {}", ship.name()),
        ShotOutcome::Repeat => "already fired there".to_string(),
    };
    match record.update {
        TurnUpdate::Won(_) => format!("{}, game over", base),
        _ => base,
    }
}
