//! Square/text conversions for coordinate notation.

use crate::errors::FormatError;
use crate::game_state::chess_types::Square;

/// Convert coordinate notation (for example "e4") to a square index.
#[inline]
pub fn algebraic_to_square(text: &str) -> Result<Square, FormatError> {
    let bytes = text.as_bytes();
    if bytes.len() != 2 {
        return Err(FormatError::InvalidSquare(text.to_owned()));
    }

    let file = bytes[0];
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(FormatError::InvalidSquare(text.to_owned()));
    }

    Ok((rank - b'1') * 8 + (file - b'a'))
}

/// Convert a square index (`0..=63`) to coordinate notation.
#[inline]
pub fn square_to_algebraic(square: Square) -> Result<String, FormatError> {
    if square > 63 {
        return Err(FormatError::InvalidSquare(square.to_string()));
    }

    let file_char = char::from(b'a' + square % 8);
    let rank_char = char::from(b'1' + square / 8);
    Ok(format!("{file_char}{rank_char}"))
}
