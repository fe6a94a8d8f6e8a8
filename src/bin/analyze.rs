//! Command-line analysis harness.
//!
//! Feeds a position and an options JSON string to the engine and prints the
//! result as JSON, mirroring what the GUI/server shells consume.
//!
//! Usage:
//!   analyze [--children] "<fen>" ['{"searchDepth":2,...}']

use std::process::ExitCode;

use serde_json::json;

use quince_chess::game_state::position::Position;
use quince_chess::options::AnalysisOptions;
use quince_chess::search::negamax::AnalysisEngine;
use quince_chess::search::search_context::ContinuationReason;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1).peekable();
    let mut children_mode = false;
    if args.peek().map(String::as_str) == Some("--children") {
        children_mode = true;
        args.next();
    }

    let Some(fen) = args.next() else {
        eprintln!("usage: analyze [--children] \"<fen>\" ['{{\"searchDepth\":2}}']");
        return ExitCode::from(2);
    };
    let options_json = args.next().unwrap_or_else(|| "{}".to_owned());

    let position = match Position::from_fen(&fen) {
        Ok(position) => position,
        Err(error) => {
            eprintln!("bad position notation: {error}");
            return ExitCode::from(2);
        }
    };
    let options = match AnalysisOptions::from_json(&options_json) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("bad options: {error}");
            return ExitCode::from(2);
        }
    };

    let engine = AnalysisEngine::new();

    if children_mode {
        match engine.score_children(&position, &options) {
            Ok(report) => {
                let children: Vec<_> = report
                    .children
                    .iter()
                    .map(|child| {
                        json!({
                            "uci": child.uci,
                            "agg": child.aggregate,
                            "imm": child.immediate_delta,
                            "fen": child.resulting.to_fen(),
                            "nodes": child.nodes,
                            "reasons": child.reasons.iter().map(reason_tag).collect::<Vec<_>>(),
                            "pv": child.pv,
                        })
                    })
                    .collect();
                let out = json!({
                    "parent": report.parent.to_fen(),
                    "depth": report.depth,
                    "baseEval": report.base_eval,
                    "children": children,
                });
                println!("{out}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("analysis failed: {error}");
                ExitCode::FAILURE
            }
        }
    } else {
        match engine.choose_best_move(&position, &options) {
            Ok(result) => {
                let out = json!({
                    "depth": result.plies,
                    "best": {
                        "uci": result.best_uci,
                        "score": result.score,
                        "imm": result.immediate_delta,
                        "nodes": result.nodes,
                        "pv": result.pv,
                    },
                    "baseEval": result.base_eval,
                });
                println!("{out}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("analysis failed: {error}");
                ExitCode::FAILURE
            }
        }
    }
}

fn reason_tag(reason: &ContinuationReason) -> &'static str {
    match reason {
        ContinuationReason::ThreefoldCutoff => "threefold-cutoff",
        ContinuationReason::CacheHit => "cache-hit",
        ContinuationReason::NoLegalMoves => "no-legal-moves",
        ContinuationReason::Cancelled => "cancelled",
    }
}
