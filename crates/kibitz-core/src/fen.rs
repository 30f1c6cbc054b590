//! FEN validation.
//!
//! Positions are rejected here, syntactically, before any bytes reach an
//! engine process. This is shape-checking (field counts, rank sums, legal
//! characters), not legality analysis: a position with no kings passes, the
//! engine is the authority on chess. The side to move is extracted because
//! score perspective depends on it.

use crate::error::EngineError;

/// Side to move, from a FEN's second field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

/// Validates a FEN string and returns the side to move.
///
/// Accepts 4 to 6 whitespace-separated fields: piece placement, side to
/// move, castling rights, en-passant square, and optionally the halfmove
/// clock and fullmove number.
pub fn validate(fen: &str) -> Result<Color, EngineError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(reject(fen, "expected at least 4 fields"));
    }
    if fields.len() > 6 {
        return Err(reject(fen, "too many fields"));
    }

    validate_placement(fen, fields[0])?;

    let color = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return Err(reject(fen, "side to move must be 'w' or 'b'")),
    };

    let castling = fields[2];
    if castling != "-"
        && (castling.is_empty() || !castling.chars().all(|c| matches!(c, 'K' | 'Q' | 'k' | 'q')))
    {
        return Err(reject(fen, "bad castling field"));
    }

    let ep = fields[3].as_bytes();
    if fields[3] != "-"
        && (ep.len() != 2 || !ep[0].is_ascii_lowercase() || ep[0] > b'h' || !matches!(ep[1], b'3' | b'6'))
    {
        return Err(reject(fen, "bad en-passant square"));
    }

    for counter in fields.iter().skip(4) {
        if counter.parse::<u32>().is_err() {
            return Err(reject(fen, "move counters must be numeric"));
        }
    }

    Ok(color)
}

fn validate_placement(fen: &str, placement: &str) -> Result<(), EngineError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(reject(fen, "expected 8 ranks"));
    }
    for rank in ranks {
        let mut files = 0u32;
        let mut prev_was_digit = false;
        for c in rank.chars() {
            if let Some(d) = c.to_digit(10) {
                if prev_was_digit {
                    return Err(reject(fen, "adjacent digits in rank"));
                }
                if d == 0 || d > 8 {
                    return Err(reject(fen, "bad skip count in rank"));
                }
                files += d;
                prev_was_digit = true;
            } else if matches!(c, 'p' | 'n' | 'b' | 'r' | 'q' | 'k' | 'P' | 'N' | 'B' | 'R' | 'Q' | 'K') {
                files += 1;
                prev_was_digit = false;
            } else {
                return Err(reject(fen, "bad piece character"));
            }
        }
        if files != 8 {
            return Err(reject(fen, "rank does not span 8 files"));
        }
    }
    Ok(())
}

fn reject(fen: &str, reason: &str) -> EngineError {
    EngineError::InvalidFen(format!("{reason} in \"{fen}\""))
}
