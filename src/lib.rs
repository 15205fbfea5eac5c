//! Splits annotated PGN study games into linear chapters, one per branch at a
//! chosen split point.

pub mod error;
pub mod export;
pub mod input;
pub mod log;
pub mod pgn;
pub mod split;

use error::ParseError;
use pgn::{GameReader, ShakmatyOracle};
use split::{Chapter, SplitOptions, split_game};

/// Parses every game in `text` with the standard chess rules and splits each
/// one. Any parse error aborts the whole text.
pub fn split_pgn(text: &str, options: &SplitOptions) -> Result<Vec<Vec<Chapter>>, ParseError> {
    let oracle = ShakmatyOracle;
    GameReader::new(text, &oracle)
        .map(|game| game.map(|game| split_game(&game, options)))
        .collect()
}
