use crate::pgn::tree::{Game, Line, MoveNode};

/// Comment text that forces the split point onto the move carrying it.
pub const SPLIT_MARKER: &str = "[SPLIT_CHAPTERS]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSource {
    Marker,
    FirstBranch,
}

/// One hop from a line into a variation: the move at `index` and the
/// `variation`-th alternative attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub index: usize,
    pub variation: usize,
}

/// Where a game is partitioned. The split node is `index` in the line reached
/// by following `path` from the root line; an empty path means the root line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPoint {
    pub path: Vec<Step>,
    pub index: usize,
    pub source: SplitSource,
}

impl SplitPoint {
    /// The line holding the split node, or `None` if `game` does not match.
    pub fn line<'g>(&self, game: &'g Game) -> Option<&'g Line> {
        let mut line = &game.line;
        for step in &self.path {
            line = line.moves.get(step.index)?.variations.get(step.variation)?;
        }
        Some(line)
    }

    pub fn node<'g>(&self, game: &'g Game) -> Option<&'g MoveNode> {
        self.line(game)?.moves.get(self.index)
    }

    /// 0-based half-move index of the split node from the game start.
    pub fn ply(&self) -> usize {
        self.path.iter().map(|step| step.index).sum::<usize>() + self.index
    }

    /// Full-move number shown in PGN for the split node.
    pub fn move_number(&self) -> usize {
        self.ply() / 2 + 1
    }

    /// Main continuation plus every variation attached at the split node.
    pub fn branch_count(&self, game: &Game) -> usize {
        self.node(game).map_or(0, |node| 1 + node.variations.len())
    }
}

/// Picks the split point: a marker on the root line, else a marker in a
/// deeper line, else the first root-line move with variations. `None` means
/// the game is one chapter.
pub fn resolve(game: &Game, marker: &str) -> Option<SplitPoint> {
    find_marker(game, marker).or_else(|| first_branch(game))
}

fn has_marker(node: &MoveNode, marker: &str) -> bool {
    !marker.is_empty()
        && node
            .comment
            .as_deref()
            .is_some_and(|comment| comment.contains(marker))
}

/// Scans each line in ply order before any line nested under it; nested lines
/// are visited depth-first in source order.
fn find_marker(game: &Game, marker: &str) -> Option<SplitPoint> {
    let mut pending: Vec<(Vec<Step>, &Line)> = vec![(Vec::new(), &game.line)];

    while let Some((path, line)) = pending.pop() {
        if let Some(index) = line.moves.iter().position(|node| has_marker(node, marker)) {
            return Some(SplitPoint {
                path,
                index,
                source: SplitSource::Marker,
            });
        }

        let mut children = Vec::new();
        for (index, node) in line.moves.iter().enumerate() {
            for (variation, child) in node.variations.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(Step { index, variation });
                children.push((child_path, child));
            }
        }
        pending.extend(children.into_iter().rev());
    }

    None
}

fn first_branch(game: &Game) -> Option<SplitPoint> {
    game.line
        .moves
        .iter()
        .position(|node| !node.variations.is_empty())
        .map(|index| SplitPoint {
            path: Vec::new(),
            index,
            source: SplitSource::FirstBranch,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::oracle::ShakmatyOracle;
    use crate::pgn::parser::parse_game;

    fn game(text: &str) -> Game {
        parse_game(text, &ShakmatyOracle).unwrap()
    }

    #[test]
    fn test_first_branching_ply() {
        let g = game("1. d4 d5 2. c4 dxc4 {QGA} (2... c6 {Slav}) (2... e6 {QGD}) *");
        let split = resolve(&g, SPLIT_MARKER).unwrap();

        assert_eq!(split.source, SplitSource::FirstBranch);
        assert_eq!(split.path, vec![]);
        assert_eq!(split.index, 3);
        assert_eq!(split.move_number(), 2);
        assert_eq!(split.branch_count(&g), 3);
    }

    #[test]
    fn test_no_variations_and_no_marker_means_no_split() {
        let g = game("1. e4 e5 2. Nf3 Nc6 *");
        assert_eq!(resolve(&g, SPLIT_MARKER), None);
    }

    #[test]
    fn test_marker_beats_earlier_branch() {
        let g = game("1. e4 e5 (1... c5) 2. Nf3 {[SPLIT_CHAPTERS]} Nc6 (2... d6) (2... Nf6) *");
        let split = resolve(&g, SPLIT_MARKER).unwrap();

        assert_eq!(split.source, SplitSource::Marker);
        assert_eq!(split.index, 2);
        assert_eq!(split.node(&g).map(|n| n.san.as_str()), Some("Nf3"));
    }

    #[test]
    fn test_first_root_marker_wins() {
        let g = game("1. e4 {[SPLIT_CHAPTERS] a} e5 {[SPLIT_CHAPTERS] b} *");
        assert_eq!(resolve(&g, SPLIT_MARKER).map(|s| s.index), Some(0));
    }

    #[test]
    fn test_root_marker_beats_variation_marker() {
        let g = game("1. e4 e5 (1... c5 {[SPLIT_CHAPTERS]}) 2. Nf3 {[SPLIT_CHAPTERS]} *");
        let split = resolve(&g, SPLIT_MARKER).unwrap();
        assert_eq!((split.path.len(), split.index), (0, 2));
    }

    #[test]
    fn test_marker_in_nested_line() {
        let g = game("1. e4 e5 (1... c5 2. Nf3 {[SPLIT_CHAPTERS]} d6 (2... Nc6)) 2. Nf3 *");
        let split = resolve(&g, SPLIT_MARKER).unwrap();

        assert_eq!(split.path, vec![Step { index: 1, variation: 0 }]);
        assert_eq!(split.index, 1);
        assert_eq!(split.ply(), 2);
        assert_eq!(split.node(&g).map(|n| n.san.as_str()), Some("Nf3"));
    }

    #[test]
    fn test_marker_without_variations_is_single_branch() {
        let g = game("1. e4 e5 2. Nf3 {[SPLIT_CHAPTERS]} Nc6 *");
        let split = resolve(&g, SPLIT_MARKER).unwrap();
        assert_eq!(split.branch_count(&g), 1);
    }

    #[test]
    fn test_split_point_from_other_game_is_rejected() {
        let g = game("1. e4 *");
        let split = SplitPoint {
            path: vec![Step { index: 0, variation: 3 }],
            index: 0,
            source: SplitSource::Marker,
        };
        assert_eq!(split.node(&g), None);
        assert_eq!(split.branch_count(&g), 0);
    }
}
