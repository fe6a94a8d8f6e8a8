//! Error taxonomy for the analysis engine.
//!
//! Every fallible operation returns one of these as an explicit value so a
//! caller loop (for example an engine-vs-engine driver) can halt on the
//! first malformed or illegal step instead of propagating corrupted state.

use thiserror::Error;

/// Notation-level failures: a position or move string that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("board field does not decompress to 8 ranks of 8 squares: {0}")]
    MalformedBoard(String),
    #[error("missing {0} field in position notation")]
    MissingField(&'static str),
    #[error("position notation has extra trailing fields")]
    TrailingFields,
    #[error("invalid side-to-move field: {0}")]
    InvalidSide(String),
    #[error("invalid castling rights character: {0}")]
    InvalidCastling(char),
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("invalid {field}: {value}")]
    InvalidClock { field: &'static str, value: String },
    #[error("invalid move notation: {0}")]
    InvalidMove(String),
}

/// Engine-level failures for generation, application, and search requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("illegal move {mv} in position {fen}")]
    IllegalMove { mv: String, fen: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid position state: {0}")]
    InvalidState(String),
}
