use std::mem;

use smallvec::SmallVec;

use crate::error::{LegalityError, ParseError};
use crate::log;

use super::headers::parse_tag_section;
use super::oracle::LegalityOracle;
use super::tokenizer::{Token, TokenKind, Tokenizer};
use super::tree::{Game, GameResult, Line, MoveNode, append_comment};

pub const DEFAULT_MAX_VARIATION_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest accepted `(` nesting. Bounds every later recursive walk.
    pub max_variation_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_variation_depth: DEFAULT_MAX_VARIATION_DEPTH,
        }
    }
}

/// Parsed movetext of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movetext {
    pub line: Line,
    pub result: Option<GameResult>,
    /// Offset just past the last consumed token.
    pub end: usize,
}

/// One line under construction. `before_last` is the position a variation
/// opened here replays from.
struct Frame<P> {
    line: Line,
    start_ply: usize,
    before_last: P,
    current: P,
    last_number: u32,
    opened_at: usize,
}

impl<P: Clone> Frame<P> {
    fn new(start: P, start_ply: usize, opened_at: usize) -> Self {
        Self {
            line: Line::default(),
            start_ply,
            before_last: start.clone(),
            current: start,
            last_number: 0,
            opened_at,
        }
    }

    fn next_ply(&self) -> usize {
        self.start_ply + self.line.len()
    }
}

type FrameStack<P> = SmallVec<[Frame<P>; 8]>;

/// Parses movetext beginning at `offset` up to and including the first
/// root-level result token, or to the end of `text`.
pub fn parse_movetext<O: LegalityOracle>(
    text: &str,
    offset: usize,
    oracle: &O,
    options: ParseOptions,
) -> Result<Movetext, ParseError> {
    let mut tokens = Tokenizer::at(text, offset);
    let mut stack: FrameStack<O::Position> = SmallVec::new();
    stack.push(Frame::new(oracle.initial_position(), 0, offset));
    let mut result = None;

    for token in tokens.by_ref() {
        let token = token?;
        let depth = stack.len();
        let Some(frame) = stack.last_mut() else {
            break;
        };

        match token.kind {
            TokenKind::MoveNumber { number, .. } => {
                if number < frame.last_number {
                    return Err(ParseError::MoveNumberOutOfOrder {
                        offset: token.offset,
                        previous: frame.last_number,
                        found: number,
                    });
                }
                frame.last_number = number;
            }
            TokenKind::San(san) => {
                let ply = frame.next_ply() + 1;
                let (next, canonical) =
                    oracle
                        .apply_move(&frame.current, san)
                        .map_err(|reason| LegalityError {
                            san: san.to_string(),
                            ply,
                            offset: token.offset,
                            reason,
                        })?;
                frame.before_last = mem::replace(&mut frame.current, next);
                frame.line.moves.push(MoveNode::new(canonical));
            }
            TokenKind::Nag(code) => match frame.line.moves.last_mut() {
                Some(node) => node.nags.push(code),
                None => log::debug(format!("dropping ${code} at byte {} with no move", token.offset)),
            },
            TokenKind::Comment(body) => match frame.line.moves.last_mut() {
                Some(node) => append_comment(&mut node.comment, body),
                None => append_comment(&mut frame.line.intro, body),
            },
            TokenKind::OpenVariation => {
                if frame.line.is_empty() {
                    return Err(ParseError::VariationWithoutMove {
                        offset: token.offset,
                    });
                }
                if depth > options.max_variation_depth {
                    return Err(ParseError::NestingTooDeep {
                        offset: token.offset,
                        limit: options.max_variation_depth,
                    });
                }
                let start = frame.before_last.clone();
                let start_ply = frame.next_ply() - 1;
                stack.push(Frame::new(start, start_ply, token.offset));
            }
            TokenKind::CloseVariation => {
                if depth == 1 {
                    return Err(ParseError::UnmatchedCloseVariation {
                        offset: token.offset,
                    });
                }
                let Some(closed) = stack.pop() else {
                    break;
                };
                attach_variation(&mut stack, closed.line, token.offset);
            }
            TokenKind::Result(r) => {
                if depth > 1 {
                    return Err(ParseError::ResultInVariation {
                        offset: token.offset,
                    });
                }
                result = Some(r);
                break;
            }
        }
    }

    if stack.len() > 1 {
        let opened_at = stack.last().map_or(offset, |frame| frame.opened_at);
        return Err(ParseError::UnclosedVariation { offset: opened_at });
    }

    let line = stack.pop().map(|frame| frame.line).unwrap_or_default();
    Ok(Movetext {
        line,
        result,
        end: tokens.offset(),
    })
}

fn attach_variation<P>(stack: &mut FrameStack<P>, line: Line, offset: usize) {
    if line.is_empty() {
        log::debug(format!("dropping empty variation closed at byte {offset}"));
        return;
    }
    if let Some(node) = stack
        .last_mut()
        .and_then(|parent| parent.line.moves.last_mut())
    {
        node.variations.push(line);
    }
}

const BYTE_ORDER_MARK: char = '\u{feff}';

fn only_comments_remain(text: &str, pos: usize) -> bool {
    Tokenizer::at(text, pos).all(|token| {
        matches!(
            token,
            Ok(Token {
                kind: TokenKind::Comment(_),
                ..
            })
        )
    })
}

/// Iterates the games of a PGN text. The first error ends the iteration.
pub struct GameReader<'a, O: LegalityOracle> {
    text: &'a str,
    pos: usize,
    oracle: &'a O,
    options: ParseOptions,
}

impl<'a, O: LegalityOracle> GameReader<'a, O> {
    pub fn new(text: &'a str, oracle: &'a O) -> Self {
        Self::with_options(text, oracle, ParseOptions::default())
    }

    pub fn with_options(text: &'a str, oracle: &'a O, options: ParseOptions) -> Self {
        let pos = if text.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        Self {
            text,
            pos,
            oracle,
            options,
        }
    }

    fn read_game(&mut self) -> Result<Game, ParseError> {
        let (headers, movetext_start) = parse_tag_section(self.text, self.pos)?;
        let movetext = parse_movetext(self.text, movetext_start, self.oracle, self.options)?;
        self.pos = movetext.end;
        if movetext.result.is_some() && only_comments_remain(self.text, self.pos) {
            log::debug(format!("ignoring comments after the last result at byte {}", self.pos));
            self.pos = self.text.len();
        }

        let result = movetext
            .result
            .or_else(|| headers.get("Result").and_then(|r| r.parse().ok()))
            .unwrap_or_default();

        Ok(Game {
            headers,
            line: movetext.line,
            result,
        })
    }
}

impl<O: LegalityOracle> Iterator for GameReader<'_, O> {
    type Item = Result<Game, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.text[self.pos..].trim_start().chars().next()?;

        let game = self.read_game();
        if game.is_err() {
            self.pos = self.text.len();
        }
        Some(game)
    }
}

/// Parses the first game of `text`. Input without any game yields an empty
/// game rather than an error.
pub fn parse_game<O: LegalityOracle>(text: &str, oracle: &O) -> Result<Game, ParseError> {
    parse_game_with_options(text, oracle, ParseOptions::default())
}

pub fn parse_game_with_options<O: LegalityOracle>(
    text: &str,
    oracle: &O,
    options: ParseOptions,
) -> Result<Game, ParseError> {
    GameReader::with_options(text, oracle, options)
        .next()
        .unwrap_or_else(|| Ok(Game::default()))
}
