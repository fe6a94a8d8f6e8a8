//! Position-notation parser.
//!
//! Accepts exactly six whitespace-separated fields (board, side, castling
//! rights, en-passant square, half-move clock, full-move number) and builds
//! a fully-populated `Position`, including occupancy caches.

use crate::errors::FormatError;
use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> Result<Position, FormatError> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or(FormatError::MissingField("board"))?;
    let side_part = parts.next().ok_or(FormatError::MissingField("side-to-move"))?;
    let castling_part = parts.next().ok_or(FormatError::MissingField("castling-rights"))?;
    let en_passant_part = parts.next().ok_or(FormatError::MissingField("en-passant"))?;
    let halfmove_part = parts.next().ok_or(FormatError::MissingField("halfmove-clock"))?;
    let fullmove_part = parts.next().ok_or(FormatError::MissingField("fullmove-number"))?;

    if parts.next().is_some() {
        return Err(FormatError::TrailingFields);
    }

    let mut position = Position::new_empty();

    parse_board(board_part, &mut position)?;
    position.side_to_move = parse_side_to_move(side_part)?;
    position.castling_rights = parse_castling_rights(castling_part)?;
    position.en_passant_square = parse_en_passant_square(en_passant_part)?;
    position.halfmove_clock = halfmove_part.parse::<u16>().map_err(|_| FormatError::InvalidClock {
        field: "halfmove clock",
        value: halfmove_part.to_owned(),
    })?;
    position.fullmove_number = fullmove_part.parse::<u16>().map_err(|_| FormatError::InvalidClock {
        field: "fullmove number",
        value: fullmove_part.to_owned(),
    })?;

    position.recalc_occupancy();

    Ok(position)
}

fn parse_board(board_part: &str, position: &mut Position) -> Result<(), FormatError> {
    let malformed = || FormatError::MalformedBoard(board_part.to_owned());

    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(malformed());
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_idx;
        let mut file = 0usize;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(malformed());
                }
                file += empty_count as usize;
                continue;
            }

            let (color, piece) = piece_from_fen_char(ch).ok_or_else(malformed)?;
            if file >= 8 {
                return Err(malformed());
            }

            let sq = board_rank * 8 + file;
            position.pieces[color.index()][piece.index()] |= 1u64 << sq;
            file += 1;
        }

        if file != 8 {
            return Err(malformed());
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> Result<Color, FormatError> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(FormatError::InvalidSide(side_part.to_owned())),
    }
}

fn parse_castling_rights(castling_part: &str) -> Result<CastlingRights, FormatError> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        match ch {
            'K' => rights |= CASTLE_WHITE_KINGSIDE,
            'Q' => rights |= CASTLE_WHITE_QUEENSIDE,
            'k' => rights |= CASTLE_BLACK_KINGSIDE,
            'q' => rights |= CASTLE_BLACK_QUEENSIDE,
            _ => return Err(FormatError::InvalidCastling(ch)),
        }
    }

    Ok(rights)
}

fn parse_en_passant_square(en_passant_part: &str) -> Result<Option<Square>, FormatError> {
    if en_passant_part == "-" {
        return Ok(None);
    }
    Ok(Some(algebraic_to_square(en_passant_part)?))
}

fn piece_from_fen_char(ch: char) -> Option<(Color, PieceKind)> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else if ch.is_ascii_lowercase() {
        Color::Black
    } else {
        return None;
    };

    let piece = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some((color, piece))
}
