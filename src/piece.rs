use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// SAN letter for the piece. Pawns have none.
    pub fn letter(self) -> Option<char> {
        match self {
            PieceKind::Pawn => None,
            PieceKind::Knight => Some('N'),
            PieceKind::Bishop => Some('B'),
            PieceKind::Rook => Some('R'),
            PieceKind::Queen => Some('Q'),
            PieceKind::King => Some('K'),
        }
    }

    /// Parse a piece letter, case-insensitively. `p` is not accepted: pawns
    /// are written without a letter.
    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Row of this side's back rank. Row 0 is rank 8.
    pub fn back_rank(self) -> usize {
        match self {
            Side::White => 7,
            Side::Black => 0,
        }
    }

    /// Row delta of a pawn step: White moves up the board, Black down.
    pub fn forward(self) -> i32 {
        match self {
            Side::White => -1,
            Side::Black => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Piece { kind, side }
    }

    /// Unicode glyph shown by the presentation layer.
    pub fn symbol(self) -> char {
        match (self.side, self.kind) {
            (Side::White, PieceKind::King) => '♔',
            (Side::White, PieceKind::Queen) => '♕',
            (Side::White, PieceKind::Rook) => '♖',
            (Side::White, PieceKind::Bishop) => '♗',
            (Side::White, PieceKind::Knight) => '♘',
            (Side::White, PieceKind::Pawn) => '♙',
            (Side::Black, PieceKind::King) => '♚',
            (Side::Black, PieceKind::Queen) => '♛',
            (Side::Black, PieceKind::Rook) => '♜',
            (Side::Black, PieceKind::Bishop) => '♝',
            (Side::Black, PieceKind::Knight) => '♞',
            (Side::Black, PieceKind::Pawn) => '♟',
        }
    }

    pub fn from_symbol(c: char) -> Option<Piece> {
        let (kind, side) = match c {
            '♔' => (PieceKind::King, Side::White),
            '♕' => (PieceKind::Queen, Side::White),
            '♖' => (PieceKind::Rook, Side::White),
            '♗' => (PieceKind::Bishop, Side::White),
            '♘' => (PieceKind::Knight, Side::White),
            '♙' => (PieceKind::Pawn, Side::White),
            '♚' => (PieceKind::King, Side::Black),
            '♛' => (PieceKind::Queen, Side::Black),
            '♜' => (PieceKind::Rook, Side::Black),
            '♝' => (PieceKind::Bishop, Side::Black),
            '♞' => (PieceKind::Knight, Side::Black),
            '♟' => (PieceKind::Pawn, Side::Black),
            _ => return None,
        };
        Some(Piece::new(kind, side))
    }

    /// ASCII letter used in text snapshots: uppercase for White.
    pub fn fen_char(self) -> char {
        let c = self.kind.letter().unwrap_or('P');
        match self.side {
            Side::White => c,
            Side::Black => c.to_ascii_lowercase(),
        }
    }
}
