//! Choosing a split point in a parsed game and cutting it into chapters.

pub mod naming;
pub mod partition;
pub mod resolve;

pub use naming::{chapter_file_name, sanitize_file_stem};
pub use partition::{Chapter, partition};
pub use resolve::{SPLIT_MARKER, SplitPoint, SplitSource, Step, resolve};

use crate::log;
use crate::pgn::tree::Game;

pub const DEFAULT_MAIN_LINE_NAME: &str = "Main Line";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Comment substring that pins the split point.
    pub marker: String,
    /// Title of chapter 0.
    pub main_line_name: String,
    /// Written as the `UTCDate` tag of every chapter when set.
    pub utc_date: Option<String>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            marker: SPLIT_MARKER.to_string(),
            main_line_name: DEFAULT_MAIN_LINE_NAME.to_string(),
            utc_date: None,
        }
    }
}

/// Resolves the split point of `game` and partitions it.
pub fn split_game(game: &Game, options: &SplitOptions) -> Vec<Chapter> {
    let point = resolve(game, &options.marker);
    match &point {
        Some(point) => log::info(format!(
            "splitting at ply {} (move {}, {:?}) into {} chapters",
            point.ply(),
            point.move_number(),
            point.source,
            point.branch_count(game)
        )),
        None => log::info("no marker or variation found, keeping the game whole"),
    }
    partition(game, point.as_ref(), options)
}
