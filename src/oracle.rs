// =============================================================================
// Oracle collaborator
//
// The oracle is an untrusted text source: it is asked for a move and may
// answer with anything, or fail. This module defines the seam (the Oracle
// trait), the request we send across it, and the prompt rendered from that
// request. The transport to an actual model lives outside this crate.
// =============================================================================

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::piece::Side;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle returned an empty reply")]
    EmptyReply,
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle has no more replies")]
    Exhausted,
}

/// Knobs handed to whatever transport talks to the model, plus how much of
/// the running transcript is echoed back in each prompt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Number of most recent transcript lines included in the prompt.
    pub transcript_window: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            model: "gpt-4o".to_string(),
            max_tokens: 10,
            temperature: 0.1,
            transcript_window: 5,
        }
    }
}

impl OracleConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Everything the oracle is told about the game for one turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OracleRequest {
    pub side: Side,
    /// Text snapshot of the board, rank 8 first.
    pub board: String,
    pub last_move: Option<String>,
    pub history: Vec<String>,
    pub transcript: Vec<String>,
    pub config: OracleConfig,
}

impl OracleRequest {
    pub fn system_prompt(&self) -> String {
        let side = side_name(self.side);
        format!(
            "You are a chess engine playing {side}. Reply with a single move in \
             standard algebraic notation and nothing else. Only move {side} \
             pieces that are actually on the board."
        )
    }

    pub fn user_prompt(&self) -> String {
        let side = side_name(self.side);
        let opponent = side_name(self.side.opposite());
        let last = self.last_move.as_deref().unwrap_or("none");
        let history = if self.history.is_empty() {
            "none".to_string()
        } else {
            self.history.join(" ")
        };

        let mut prompt = format!(
            "You are playing {side} against {opponent}.\n\n\
             Current position (uppercase = White, lowercase = Black):\n{}\n\n\
             {opponent}'s last move: {last}\n\
             Move history: {history}\n\n\
             It is your turn. Answer with your move in standard algebraic \
             notation, for example e5, Nf6, O-O, exd5 or Qe7.",
            self.board
        );

        if !self.transcript.is_empty() {
            prompt.push_str("\n\nEarlier exchanges:\n");
            for line in &self.transcript {
                prompt.push_str(line);
                prompt.push('\n');
            }
        }
        prompt
    }
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::White => "White",
        Side::Black => "Black",
    }
}

/// A source of move suggestions.
pub trait Oracle {
    fn suggest_move(&mut self, request: &OracleRequest) -> Result<String, OracleError>;
}

impl<F> Oracle for F
where
    F: FnMut(&OracleRequest) -> Result<String, OracleError>,
{
    fn suggest_move(&mut self, request: &OracleRequest) -> Result<String, OracleError> {
        self(request)
    }
}

/// Replays a fixed list of replies, then reports [`OracleError::Exhausted`].
#[derive(Clone, Debug, Default)]
pub struct ScriptedOracle {
    replies: VecDeque<Result<String, OracleError>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedOracle {
            replies: replies.into_iter().map(|r| Ok(r.into())).collect(),
        }
    }

    pub fn push_reply(&mut self, reply: impl Into<String>) {
        self.replies.push_back(Ok(reply.into()));
    }

    pub fn push_failure(&mut self, err: OracleError) {
        self.replies.push_back(Err(err));
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl Oracle for ScriptedOracle {
    fn suggest_move(&mut self, _request: &OracleRequest) -> Result<String, OracleError> {
        self.replies.pop_front().unwrap_or(Err(OracleError::Exhausted))
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use noisy::NoisyOracle;

/// A stand-in for a badly behaved model: mostly well-formed notation that may
/// or may not fit the board, some castling, some garbage, some failures.
#[cfg(not(target_arch = "wasm32"))]
mod noisy {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::{Oracle, OracleError, OracleRequest};

    const PIECE_LETTERS: [&str; 6] = ["", "N", "B", "R", "Q", "K"];
    const CASTLES: [&str; 4] = ["O-O", "O-O-O", "0-0", "o-o-o"];
    const GARBAGE: [&str; 6] = [
        "Zz9",
        "I think e5 is best",
        "",
        "e",
        "Nf9",
        "Knight to f6",
    ];

    #[derive(Debug)]
    pub struct NoisyOracle {
        rng: StdRng,
    }

    impl NoisyOracle {
        pub fn new(seed: u64) -> Self {
            NoisyOracle {
                rng: StdRng::seed_from_u64(seed),
            }
        }

        fn square(&mut self) -> String {
            let file = (b'a' + self.rng.gen_range(0..8u8)) as char;
            let rank = (b'1' + self.rng.gen_range(0..8u8)) as char;
            format!("{file}{rank}")
        }
    }

    impl Oracle for NoisyOracle {
        fn suggest_move(&mut self, _request: &OracleRequest) -> Result<String, OracleError> {
            let roll: f64 = self.rng.gen();
            if roll < 0.55 {
                let letter = PIECE_LETTERS.choose(&mut self.rng).copied().unwrap_or("");
                let capture = if self.rng.gen_bool(0.2) { "x" } else { "" };
                let square = self.square();
                Ok(format!("{letter}{capture}{square}"))
            } else if roll < 0.65 {
                Ok(CASTLES.choose(&mut self.rng).copied().unwrap_or("O-O").to_string())
            } else if roll < 0.9 {
                Ok(GARBAGE.choose(&mut self.rng).copied().unwrap_or("").to_string())
            } else {
                Err(OracleError::Unavailable("simulated timeout".to_string()))
            }
        }
    }
}
