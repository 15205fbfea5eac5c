use std::fmt::Write;

use super::headers::{Headers, SEVEN_TAG_ROSTER, escape};
use super::tree::{Game, GameResult, Line};

/// Column limit for movetext lines. Tokens are never split, so a single long
/// comment may exceed it.
pub const MAX_LINE_WIDTH: usize = 80;

const PRIORITY_TAGS: [&str; 2] = ["StudyName", "ChapterName"];

/// Renders a game as PGN: tag section, blank line, movetext and result.
pub fn write_game(game: &Game) -> String {
    let mut out = String::with_capacity(256);
    write_headers(&mut out, &game.headers, game.result);
    out.push('\n');
    out.push_str(&write_movetext(&game.line, game.result));
    out.push('\n');
    out
}

fn roster_default(tag: &str, result: GameResult) -> String {
    match tag {
        "Date" => "????.??.??".to_string(),
        "Result" => result.to_string(),
        _ => "?".to_string(),
    }
}

fn write_tag(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "[{} \"{}\"]", name, escape(value));
}

fn write_headers(out: &mut String, headers: &Headers, result: GameResult) {
    for tag in SEVEN_TAG_ROSTER {
        match headers.get(tag) {
            Some(value) => write_tag(out, tag, value),
            None => write_tag(out, tag, &roster_default(tag, result)),
        }
    }
    for tag in PRIORITY_TAGS {
        if let Some(value) = headers.get(tag) {
            write_tag(out, tag, value);
        }
    }
    for (name, value) in headers.iter() {
        if !SEVEN_TAG_ROSTER.contains(&name) && !PRIORITY_TAGS.contains(&name) {
            write_tag(out, name, value);
        }
    }
}

/// Renders a root line and result token as wrapped movetext.
pub fn write_movetext(line: &Line, result: GameResult) -> String {
    let mut writer = TokenWriter::default();
    write_line(&mut writer, line, 0);
    writer.push(result.as_str());
    writer.finish()
}

fn brace_comment(text: &str) -> String {
    format!("{{{}}}", text.replace('}', ")"))
}

/// Renders a line whose first move is ply `start_ply` (0 = White's first move).
fn write_line(writer: &mut TokenWriter, line: &Line, start_ply: usize) {
    let mut needs_number = true;

    if let Some(intro) = &line.intro {
        writer.push(&brace_comment(intro));
    }

    for (i, node) in line.moves.iter().enumerate() {
        let ply = start_ply + i;
        let move_number = ply / 2 + 1;

        let mut token = String::new();
        if ply % 2 == 0 {
            let _ = write!(token, "{move_number}. ");
        } else if needs_number {
            let _ = write!(token, "{move_number}... ");
        }
        token.push_str(&node.san);
        writer.push(&token);
        needs_number = false;

        for nag in &node.nags {
            writer.push(&format!("${nag}"));
        }
        if let Some(comment) = &node.comment {
            writer.push(&brace_comment(comment));
            needs_number = true;
        }

        for variation in &node.variations {
            writer.open_variation();
            write_line(writer, variation, ply);
            writer.close_variation();
            needs_number = true;
        }
    }
}

/// Joins tokens with single spaces and wraps at `MAX_LINE_WIDTH`. `(` sticks
/// to the following token and `)` to the preceding one.
#[derive(Default)]
struct TokenWriter {
    out: String,
    line_len: usize,
    glue_next: bool,
}

impl TokenWriter {
    fn push(&mut self, token: &str) {
        if self.glue_next {
            self.glue_next = false;
        } else if self.line_len > 0 {
            if self.line_len + 1 + token.len() > MAX_LINE_WIDTH {
                self.out.push('\n');
                self.line_len = 0;
            } else {
                self.out.push(' ');
                self.line_len += 1;
            }
        }
        self.out.push_str(token);
        self.line_len += token.len();
    }

    fn open_variation(&mut self) {
        self.push("(");
        self.glue_next = true;
    }

    fn close_variation(&mut self) {
        self.out.push(')');
        self.line_len += 1;
    }

    fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::oracle::ShakmatyOracle;
    use crate::pgn::parser::parse_game;
    use crate::pgn::tree::MoveNode;

    fn reserialize(text: &str) -> String {
        write_game(&parse_game(text, &ShakmatyOracle).unwrap())
    }

    #[test]
    fn test_movetext_numbering_and_variations() {
        let game = parse_game(
            "1. d4 d5 2. c4 dxc4 {QGA} (2... c6 {Slav}) (2... e6 {QGD}) *",
            &ShakmatyOracle,
        )
        .unwrap();

        assert_eq!(
            write_movetext(&game.line, game.result),
            "1. d4 d5 2. c4 dxc4 {QGA} (2... c6 {Slav}) (2... e6 {QGD}) *"
        );
    }

    #[test]
    fn test_black_move_after_variation_gets_number() {
        let game = parse_game("1. e4 (1. d4 d5) e5 2. Nf3 *", &ShakmatyOracle).unwrap();
        assert_eq!(
            write_movetext(&game.line, game.result),
            "1. e4 (1. d4 d5) 1... e5 2. Nf3 *"
        );
    }

    #[test]
    fn test_intro_and_nags() {
        let game = parse_game("{Start} 1. e4!? e5 ({Or} 1... c5 $1) *", &ShakmatyOracle).unwrap();
        assert_eq!(
            write_movetext(&game.line, game.result),
            "{Start} 1. e4 $5 e5 ({Or} 1... c5 $1) *"
        );
    }

    #[test]
    fn test_empty_game_is_result_only() {
        let game = Game::default();
        assert_eq!(
            write_game(&game),
            "[Event \"?\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n\
             [White \"?\"]\n[Black \"?\"]\n[Result \"*\"]\n\n*\n"
        );
    }

    #[test]
    fn test_header_order_roster_then_study_tags_then_custom() {
        let text = "[Annotator \"me\"]\n[ChapterName \"Ch\"]\n[White \"A\"]\n[Event \"E\"]\n\
                    [StudyName \"St\"]\n[ECO \"D20\"]\n\n1. d4 *";
        let out = reserialize(text);
        let tags: Vec<&str> = out
            .lines()
            .take_while(|l| l.starts_with('['))
            .map(|l| l[1..].split(' ').next().unwrap_or_default())
            .collect();

        assert_eq!(
            tags,
            vec![
                "Event", "Site", "Date", "Round", "White", "Black", "Result", "StudyName",
                "ChapterName", "Annotator", "ECO"
            ]
        );
    }

    #[test]
    fn test_long_movetext_wraps_between_tokens() {
        let moves: Vec<MoveNode> = (0..60).map(|_| MoveNode::new("Nf3")).collect();
        let text = write_movetext(&Line::new(moves), GameResult::Ongoing);

        assert!(text.lines().count() > 1);
        assert!(text.lines().all(|l| l.len() <= MAX_LINE_WIDTH));
        assert!(text.ends_with('*'));
    }

    #[test]
    fn test_rest_of_line_comment_with_brace_stays_closed() {
        let game = parse_game("1. e4 ; threat } of d4\n e5 *", &ShakmatyOracle).unwrap();
        let movetext = write_movetext(&game.line, game.result);
        assert_eq!(movetext, "1. e4 {threat ) of d4} 1... e5 *");

        let reparsed = parse_game(&movetext, &ShakmatyOracle).unwrap();
        assert_eq!(reparsed.line, game.line);
    }

    #[test]
    fn test_constructed_comment_brace_is_replaced() {
        let mut node = MoveNode::new("e4");
        node.comment = Some("a } b".to_string());
        assert_eq!(
            write_movetext(&Line::new(vec![node]), GameResult::Ongoing),
            "1. e4 {a ) b} *"
        );
    }

    #[test]
    fn test_round_trip_is_stable() {
        let inputs = [
            "[Event \"x\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0",
            "{Pre} 1. d4 d5 2. c4 dxc4 {QGA} (2... c6 {Slav} 3. Nf3 (3. Nc3 dxc4) 3... Nf6) \
             (2... e6 {QGD}) 3. e4 b5 *",
            "1. e4 c5 (1... e5 2. Nf3 (2. f4 exf4 (2... d5)) 2... Nc6) 2. Nf3 d6 { a very long \
             comment that will certainly push the movetext well past the eighty column limit } \
             3. d4 cxd4 4. Nxd4 Nf6 5. Nc3 a6 *",
            "1. f3 e5 2. g4 Qh4# 0-1",
            "1. e4 ; threat } of d4\n e5 *",
        ];

        for input in inputs {
            let once = reserialize(input);
            let twice = reserialize(&once);
            assert_eq!(once, twice, "unstable round trip for {input}");

            let a = parse_game(input, &ShakmatyOracle).unwrap();
            let b = parse_game(&once, &ShakmatyOracle).unwrap();
            assert_eq!(a.line, b.line);
            assert_eq!(a.result, b.result);
        }
    }
}
