use std::fmt;
use std::str::FromStr;

use super::headers::Headers;

/// Game termination marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Ongoing,
}

impl GameResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }
}

impl FromStr for GameResult {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1-0" => Ok(Self::WhiteWins),
            "0-1" => Ok(Self::BlackWins),
            "1/2-1/2" => Ok(Self::Draw),
            "*" => Ok(Self::Ongoing),
            _ => Err(()),
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One half-move. `variations` are alternatives to this move, each starting
/// from the position before it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveNode {
    pub san: String,
    pub nags: Vec<u8>,
    pub comment: Option<String>,
    pub variations: Vec<Line>,
}

impl MoveNode {
    pub fn new(san: impl Into<String>) -> Self {
        Self {
            san: san.into(),
            ..Self::default()
        }
    }

}

/// An ordered run of moves. `intro` holds a comment that precedes the first
/// move; on the root line this is the pre-game comment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub intro: Option<String>,
    pub moves: Vec<MoveNode>,
}

impl Line {
    pub fn new(moves: Vec<MoveNode>) -> Self {
        Self { intro: None, moves }
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn sans(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(|node| node.san.as_str())
    }
}

/// A parsed game: tag pairs, the root line from the initial position and the
/// result token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Game {
    pub headers: Headers,
    pub line: Line,
    pub result: GameResult,
}

/// Appends `text` to an optional comment slot, separated by a space. A `}`
/// cannot appear inside a brace comment and is stored as `)`.
pub(crate) fn append_comment(slot: &mut Option<String>, text: &str) {
    let text = text.trim().replace('}', ")");
    if text.is_empty() {
        return;
    }
    match slot {
        Some(existing) if !existing.is_empty() => {
            existing.push(' ');
            existing.push_str(&text);
        }
        _ => *slot = Some(text),
    }
}
