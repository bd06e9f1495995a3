// =============================================================================
// Algebraic notation
//
// parse() turns an untrusted move string into a ParsedMove without looking at
// the board. describe() goes the other way and produces the short notation we
// show in the move list and feed back to the oracle.
//
// Input is case-folded before matching, so piece letters are case-insensitive
// and a leading `b` always means the bishop, never the b-file pawn.
// =============================================================================

use crate::board::Square;
use crate::moves::ParsedMove;
use crate::piece::{Piece, PieceKind};

const KINGSIDE_TOKENS: [&str; 3] = ["o-o", "0-0", "oo"];
const QUEENSIDE_TOKENS: [&str; 3] = ["o-o-o", "0-0-0", "ooo"];

/// Trailing glyphs an oracle may append (check, mate, annotations).
const ANNOTATIONS: [char; 4] = ['+', '#', '!', '?'];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedNotation {
    #[error("notation `{0}` is too short")]
    TooShort(String),
    #[error("invalid destination square in `{0}`")]
    InvalidDestination(String),
    #[error("unknown piece `{piece}` in `{raw}`")]
    UnknownPiece { raw: String, piece: char },
    #[error("unrecognised notation `{0}`")]
    Syntax(String),
}

/// Parse a raw move string.
///
/// Accepted shapes, after trimming, lowercasing and stripping trailing
/// annotations:
/// - castling: `o-o`, `0-0`, `oo`, `o-o-o`, `0-0-0`, `ooo`
/// - plain: `e5`, `nf6`, `nbd7` (piece letter, optional source file)
/// - capture: `exd5`, `nxf6`, `xd5`, `rexd1`
pub fn parse(raw: &str) -> Result<ParsedMove, MalformedNotation> {
    let folded = raw.trim().to_lowercase();
    if folded.chars().count() < 2 {
        return Err(MalformedNotation::TooShort(raw.to_string()));
    }

    let text = folded.trim_end_matches(&ANNOTATIONS[..]);

    if KINGSIDE_TOKENS.contains(&text) {
        return Ok(castle(true));
    }
    if QUEENSIDE_TOKENS.contains(&text) {
        return Ok(castle(false));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return Err(MalformedNotation::TooShort(raw.to_string()));
    }

    let (prefix, dest) = chars.split_at(chars.len() - 2);
    let destination = Square::from_chars(dest[0], dest[1])
        .ok_or_else(|| MalformedNotation::InvalidDestination(raw.to_string()))?;

    let (prefix, is_capture) = match prefix.split_last() {
        Some((&'x', rest)) => (rest, true),
        _ => (prefix, false),
    };

    let (kind, disambiguator_file) = match *prefix {
        [] => (PieceKind::Pawn, None),
        [c] => match PieceKind::from_letter(c) {
            Some(kind) => (kind, None),
            // A bare source file only makes sense on a pawn capture.
            None if is_capture && is_file(c) => (PieceKind::Pawn, Some(c)),
            None => {
                return Err(MalformedNotation::UnknownPiece {
                    raw: raw.to_string(),
                    piece: c,
                })
            }
        },
        [p, f] => match PieceKind::from_letter(p) {
            Some(kind) if is_file(f) => (kind, Some(f)),
            Some(_) => return Err(MalformedNotation::Syntax(raw.to_string())),
            None => {
                return Err(MalformedNotation::UnknownPiece {
                    raw: raw.to_string(),
                    piece: p,
                })
            }
        },
        _ => return Err(MalformedNotation::Syntax(raw.to_string())),
    };

    Ok(ParsedMove {
        kind,
        disambiguator_file,
        destination,
        is_capture,
        is_castle_kingside: false,
        is_castle_queenside: false,
    })
}

fn is_file(c: char) -> bool {
    ('a'..='h').contains(&c)
}

fn castle(kingside: bool) -> ParsedMove {
    let col = if kingside { 6 } else { 2 };
    ParsedMove {
        kind: PieceKind::King,
        disambiguator_file: None,
        destination: Square::new(7, col),
        is_capture: false,
        is_castle_kingside: kingside,
        is_castle_queenside: !kingside,
    }
}

/// Short algebraic notation for a move, e.g. "e4", "Nf6", "exd5", "Qxh7",
/// "O-O". No check marks and no disambiguation between twin pieces.
pub fn describe(piece: Piece, from: Square, to: Square, captured: Option<Piece>) -> String {
    match piece.kind {
        PieceKind::Pawn => {
            if captured.is_some() || from.col != to.col {
                format!("{}x{}", from.file_char(), to)
            } else {
                to.to_string()
            }
        }
        PieceKind::King
            if from.row == piece.side.back_rank()
                && to.row == from.row
                && from.col == 4
                && (to.col == 6 || to.col == 2)
                && captured.is_none() =>
        {
            if to.col == 6 {
                "O-O".to_string()
            } else {
                "O-O-O".to_string()
            }
        }
        kind => {
            let letter = kind.letter().unwrap_or('?');
            let x = if captured.is_some() { "x" } else { "" };
            format!("{letter}{x}{to}")
        }
    }
}
