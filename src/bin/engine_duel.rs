//! Engine-vs-engine driver.
//!
//! Plays the engine against itself from the starting position, validating
//! every chosen move through the legality gate before applying it. The loop
//! halts on the first malformed or illegal step instead of propagating a
//! corrupted game, which is exactly the failure mode the explicit error
//! values exist for.
//!
//! Usage:
//!   engine_duel [depth] [max_fullmoves] [seed]

use std::process::ExitCode;

use chrono::Local;

use quince_chess::game_state::position::Position;
use quince_chess::move_generation::apply_move::apply_uci_if_legal;
use quince_chess::move_generation::legality_filter::is_king_in_check;
use quince_chess::options::{AnalysisOptions, SideName};
use quince_chess::search::negamax::AnalysisEngine;
use quince_chess::utils::render_position::render_position;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let depth: u32 = args.next().and_then(|a| a.parse().ok()).unwrap_or(2);
    let max_fullmoves: u16 = args.next().and_then(|a| a.parse().ok()).unwrap_or(60);
    let seed: u64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(0);

    let engine = AnalysisEngine::new();
    engine.set_seed(seed);

    let mut options = AnalysisOptions::default();
    options.search_depth = depth;

    let mut position = Position::new_game();
    println!(
        "[{}] duel start, depth {}, seed {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        depth,
        seed
    );

    loop {
        if position.fullmove_number > max_fullmoves {
            println!("move limit reached at {}", position.to_fen());
            break;
        }

        // Analyze whichever side is to move.
        options.engine_side = match position.side_to_move {
            quince_chess::game_state::chess_types::Color::White => SideName::White,
            quince_chess::game_state::chess_types::Color::Black => SideName::Black,
        };

        let result = match engine.choose_best_move(&position, &options) {
            Ok(result) => result,
            Err(error) => {
                eprintln!("search failed, halting: {error}");
                return ExitCode::FAILURE;
            }
        };

        let Some(uci) = result.best_uci else {
            let side = position.side_to_move;
            if is_king_in_check(&position, side) {
                println!("checkmate: {:?} is mated", side);
            } else {
                println!("stalemate");
            }
            break;
        };

        position = match apply_uci_if_legal(&position, &uci, &options) {
            Ok(next) => next,
            Err(error) => {
                eprintln!("engine proposed an unplayable move, halting: {error}");
                return ExitCode::FAILURE;
            }
        };

        println!(
            "[{}] {:>3}. {} score {} ({} nodes)",
            Local::now().format("%H:%M:%S%.3f"),
            position.fullmove_number,
            uci,
            result.score,
            result.nodes
        );
    }

    println!("{}", render_position(&position));
    println!("final: {}", position.to_fen());
    ExitCode::SUCCESS
}
