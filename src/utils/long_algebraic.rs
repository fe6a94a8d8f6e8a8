//! Move-notation codec: origin square + destination square, with an
//! optional fifth lowercase promotion letter (for example "e7e8q").

use crate::errors::FormatError;
use crate::game_state::chess_types::*;
use crate::game_state::position::Position;
use crate::moves::move_descriptions::*;
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

/// Render a packed move description as move notation.
pub fn move_to_long_algebraic(mv: u64) -> Result<String, FormatError> {
    let mut out = String::new();
    out.push_str(&square_to_algebraic(move_from(mv))?);
    out.push_str(&square_to_algebraic(move_to(mv))?);

    if let Some(promotion) = promotion_piece(mv) {
        out.push(promotion_to_char(promotion)?);
    }

    Ok(out)
}

/// Parse move notation into a packed move description against a concrete
/// position. The position supplies the moved/captured pieces and the
/// special-move flags the bare text cannot carry.
pub fn long_algebraic_to_move(text: &str, position: &Position) -> Result<u64, FormatError> {
    let bytes = text.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return Err(FormatError::InvalidMove(text.to_owned()));
    }

    let from = algebraic_to_square(&text[0..2])?;
    let to = algebraic_to_square(&text[2..4])?;

    let (moving_color, moved) = position
        .piece_on_square(from)
        .ok_or_else(|| FormatError::InvalidMove(format!("{text}: no piece on origin square")))?;

    if moving_color != position.side_to_move {
        return Err(FormatError::InvalidMove(format!(
            "{text}: origin piece does not belong to the side to move"
        )));
    }

    let target = position.piece_on_square(to);
    let mut captured = target.map(|(_, piece)| piece);
    let mut flags = 0u64;

    if captured.is_some() {
        flags |= FLAG_CAPTURE;
    }
    if moved == PieceKind::Pawn && from.abs_diff(to) == 16 {
        flags |= FLAG_DOUBLE_PAWN_PUSH;
    }
    if moved == PieceKind::King && from.abs_diff(to) == 2 {
        flags |= FLAG_CASTLING;
    }

    if moved == PieceKind::Pawn
        && position.en_passant_square == Some(to)
        && from % 8 != to % 8
        && target.is_none()
    {
        captured = Some(PieceKind::Pawn);
        flags |= FLAG_CAPTURE | FLAG_EN_PASSANT;
    }

    let promotion = if bytes.len() == 5 {
        if moved != PieceKind::Pawn {
            return Err(FormatError::InvalidMove(format!("{text}: only pawns promote")));
        }
        let rank = to / 8;
        if rank != 0 && rank != 7 {
            return Err(FormatError::InvalidMove(format!(
                "{text}: promotion must end on the back rank"
            )));
        }
        Some(char_to_promotion(bytes[4] as char)?)
    } else {
        if moved == PieceKind::Pawn {
            let rank = to / 8;
            if rank == 0 || rank == 7 {
                return Err(FormatError::InvalidMove(format!(
                    "{text}: missing promotion piece"
                )));
            }
        }
        None
    };

    Ok(pack_move(from, to, moved, captured, promotion, flags))
}

fn promotion_to_char(piece: PieceKind) -> Result<char, FormatError> {
    match piece {
        PieceKind::Knight => Ok('n'),
        PieceKind::Bishop => Ok('b'),
        PieceKind::Rook => Ok('r'),
        PieceKind::Queen => Ok('q'),
        _ => Err(FormatError::InvalidMove(format!("invalid promotion piece {piece:?}"))),
    }
}

fn char_to_promotion(ch: char) -> Result<PieceKind, FormatError> {
    match ch.to_ascii_lowercase() {
        'n' => Ok(PieceKind::Knight),
        'b' => Ok(PieceKind::Bishop),
        'r' => Ok(PieceKind::Rook),
        'q' => Ok(PieceKind::Queen),
        _ => Err(FormatError::InvalidMove(format!("invalid promotion letter {ch}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{long_algebraic_to_move, move_to_long_algebraic};
    use crate::game_state::position::Position;
    use crate::moves::move_descriptions::{
        is_castling, is_double_pawn_push, is_en_passant, FLAG_CAPTURE,
    };

    #[test]
    fn round_trip_simple_and_promotion_moves() {
        let position = Position::from_fen("8/P7/8/8/8/8/4P3/k3K3 w - - 0 1").expect("notation should parse");

        let push = long_algebraic_to_move("e2e4", &position).expect("move should parse");
        assert!(is_double_pawn_push(push));
        assert_eq!(move_to_long_algebraic(push).expect("move should render"), "e2e4");

        let promo = long_algebraic_to_move("a7a8q", &position).expect("move should parse");
        assert_eq!(move_to_long_algebraic(promo).expect("move should render"), "a7a8q");
    }

    #[test]
    fn detects_castling_and_en_passant_flags() {
        let castle_pos =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").expect("notation should parse");
        let castle = long_algebraic_to_move("e1g1", &castle_pos).expect("move should parse");
        assert!(is_castling(castle));

        let ep_pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").expect("notation should parse");
        let ep = long_algebraic_to_move("e5d6", &ep_pos).expect("move should parse");
        assert!(is_en_passant(ep));
        assert_ne!(ep & FLAG_CAPTURE, 0);
    }

    #[test]
    fn rejects_malformed_moves() {
        let position = Position::new_game();
        assert!(long_algebraic_to_move("e2", &position).is_err());
        assert!(long_algebraic_to_move("e2e9", &position).is_err());
        assert!(long_algebraic_to_move("e3e4", &position).is_err());
        assert!(long_algebraic_to_move("e7e5", &position).is_err());
    }
}
