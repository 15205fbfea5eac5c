use crate::pgn::serialize::write_game;
use crate::pgn::tree::{Game, Line, MoveNode, append_comment};

use super::SplitOptions;
use super::naming::{chapter_file_name, main_line_title, strip_marker, variation_title};
use super::resolve::{SplitPoint, SplitSource};

/// One linear study chapter cut out of a branching game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub index: usize,
    pub name: String,
    pub game: Game,
    /// 0-based ply of the split node, `None` when the game was not split.
    pub split_ply: Option<usize>,
}

impl Chapter {
    pub fn file_name(&self) -> String {
        chapter_file_name(self.index, &self.name)
    }

    pub fn to_pgn(&self) -> String {
        write_game(&self.game)
    }

    /// Number of moves on the chapter's main line.
    pub fn move_count(&self) -> usize {
        self.game.line.len()
    }
}

/// Builds one chapter per branch at `split`: the main continuation first,
/// then each variation attached at the split node in source order. Without a
/// usable split point the whole game is returned as a single chapter.
pub fn partition(game: &Game, split: Option<&SplitPoint>, options: &SplitOptions) -> Vec<Chapter> {
    let Some((split, trunk, line)) = split.and_then(|split| {
        let (trunk, line) = collect_trunk(game, split)?;
        Some((split, trunk, line))
    }) else {
        return vec![whole_game(game, options)];
    };
    let Some(node) = line.moves.get(split.index) else {
        return vec![whole_game(game, options)];
    };

    let mut chapters = Vec::with_capacity(1 + node.variations.len());

    let mut continuation: Vec<MoveNode> = line.moves[split.index..].to_vec();
    if let Some(first) = continuation.first_mut() {
        first.variations.clear();
        if split.source == SplitSource::Marker {
            first.comment = first
                .comment
                .as_deref()
                .and_then(|comment| strip_marker(comment, &options.marker));
        }
    }
    let main_title = main_line_title(
        naming_comment(continuation.first(), &options.marker).as_deref(),
        &options.main_line_name,
    );
    let main_line = Line {
        intro: trunk.intro.clone(),
        moves: trunk.moves.iter().cloned().chain(continuation).collect(),
    };
    chapters.push(build_chapter(game, 0, main_title, main_line, split, options));

    for (i, variation) in node.variations.iter().enumerate() {
        let index = i + 1;
        let title = variation_title(
            naming_comment(variation.moves.first(), &options.marker).as_deref(),
            index,
        );

        let mut line = trunk.clone();
        if let Some(intro) = &variation.intro {
            carry_intro(&mut line, intro);
        }
        line.moves.extend(variation.moves.iter().cloned());

        chapters.push(build_chapter(game, index, title, line, split, options));
    }

    chapters
}

/// Moves strictly before the split node along the split path, plus the line
/// that holds the split node. Intros of variations entered on the way are
/// folded into the trunk.
fn collect_trunk<'g>(game: &'g Game, split: &SplitPoint) -> Option<(Line, &'g Line)> {
    let mut trunk = Line {
        intro: game.line.intro.clone(),
        moves: Vec::new(),
    };
    let mut line = &game.line;

    for step in &split.path {
        trunk.moves.extend(line.moves.get(..step.index)?.iter().cloned());
        line = line.moves.get(step.index)?.variations.get(step.variation)?;
        if let Some(intro) = &line.intro {
            carry_intro(&mut trunk, intro);
        }
    }
    trunk.moves.extend(line.moves.get(..split.index)?.iter().cloned());

    Some((trunk, line))
}

/// Attaches a variation's leading comment to the last trunk move, or to the
/// pre-game slot when the trunk has no moves.
fn carry_intro(trunk: &mut Line, intro: &str) {
    match trunk.moves.last_mut() {
        Some(last) => append_comment(&mut last.comment, intro),
        None => append_comment(&mut trunk.intro, intro),
    }
}

fn naming_comment(node: Option<&MoveNode>, marker: &str) -> Option<String> {
    node.and_then(|node| node.comment.as_deref())
        .and_then(|comment| strip_marker(comment, marker))
}

fn build_chapter(
    source: &Game,
    index: usize,
    name: String,
    line: Line,
    split: &SplitPoint,
    options: &SplitOptions,
) -> Chapter {
    let mut headers = source.headers.clone();
    let chapter_name = match source.headers.get("ChapterName") {
        Some(prefix) if !prefix.trim().is_empty() => format!("{}: {name}", prefix.trim()),
        _ => name.clone(),
    };
    headers.set("ChapterName", chapter_name);
    if let Some(date) = &options.utc_date {
        headers.set("UTCDate", date.as_str());
    }

    Chapter {
        index,
        name,
        game: Game {
            headers,
            line,
            result: source.result,
        },
        split_ply: Some(split.ply()),
    }
}

fn whole_game(game: &Game, options: &SplitOptions) -> Chapter {
    Chapter {
        index: 0,
        name: options.main_line_name.clone(),
        game: game.clone(),
        split_ply: None,
    }
}
