use crate::error::TokenizeError;

use super::tree::GameResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// `12.` or `12...`; `black` is set for the three-dot form.
    MoveNumber { number: u32, black: bool },
    San(&'a str),
    /// `$n`, or a suffix glyph such as `!?` mapped to its numeric code.
    Nag(u8),
    /// Raw text between `{` and `}` (or after `;`), untrimmed.
    Comment(&'a str),
    OpenVariation,
    CloseVariation,
    Result(GameResult),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Byte offset of the token's first character in the scanned text.
    pub offset: usize,
}

/// Movetext lexer. Offsets are absolute positions in `input`, so a tokenizer
/// started past a tag section still reports locations in the whole file.
///
/// After the first error the tokenizer is exhausted.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    pending: Option<Result<Token<'a>, TokenizeError>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::at(input, 0)
    }

    pub fn at(input: &'a str, offset: usize) -> Self {
        Self {
            input,
            pos: offset.min(input.len()),
            pending: None,
        }
    }

    /// Scan position: the byte just past the last token returned.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn fail(&mut self, err: TokenizeError) -> Option<Result<Token<'a>, TokenizeError>> {
        self.pos = self.input.len();
        self.pending = None;
        Some(Err(err))
    }

    fn token(kind: TokenKind<'a>, offset: usize) -> Option<Result<Token<'a>, TokenizeError>> {
        Some(Ok(Token { kind, offset }))
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.bytes().get(self.pos) {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn at_line_start(&self, offset: usize) -> bool {
        offset == 0 || self.bytes()[offset - 1] == b'\n'
    }

    fn line_end(&self, from: usize) -> usize {
        self.bytes()[from..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.input.len(), |i| from + i)
    }

    fn word_end(&self, from: usize) -> usize {
        self.bytes()[from..]
            .iter()
            .position(|&b| {
                b.is_ascii_whitespace() || matches!(b, b'{' | b'}' | b'(' | b')' | b';' | b'$')
            })
            .map_or(self.input.len(), |i| from + i)
    }

    fn brace_comment(&mut self, start: usize) -> Option<Result<Token<'a>, TokenizeError>> {
        let body = start + 1;
        match self.bytes()[body..].iter().position(|&b| b == b'}') {
            Some(len) => {
                self.pos = body + len + 1;
                Self::token(TokenKind::Comment(&self.input[body..body + len]), start)
            }
            None => self.fail(TokenizeError::UnterminatedComment { offset: start }),
        }
    }

    fn nag(&mut self, start: usize) -> Option<Result<Token<'a>, TokenizeError>> {
        let digits = self.bytes()[start + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            return self.fail(TokenizeError::UnexpectedCharacter {
                ch: '$',
                offset: start,
            });
        }
        let end = start + 1 + digits;
        self.pos = end;
        match self.input[start + 1..end].parse::<u8>() {
            Ok(code) => Self::token(TokenKind::Nag(code), start),
            Err(_) => self.fail(TokenizeError::UnexpectedCharacter {
                ch: '$',
                offset: start,
            }),
        }
    }

    fn number_or_result(&mut self, start: usize) -> Option<Result<Token<'a>, TokenizeError>> {
        let end = self.word_end(start);
        let word = &self.input[start..end];

        if let Ok(result) = word.parse::<GameResult>() {
            self.pos = end;
            return Self::token(TokenKind::Result(result), start);
        }
        if word.starts_with("0-0") {
            return self.san_word(start, end);
        }

        let digits = word.bytes().take_while(u8::is_ascii_digit).count();
        let dots = word[digits..].bytes().take_while(|&b| b == b'.').count();
        self.pos = start + digits + dots;
        let number = word[..digits].parse::<u32>().unwrap_or(u32::MAX);
        Self::token(
            TokenKind::MoveNumber {
                number,
                black: dots >= 3,
            },
            start,
        )
    }

    fn san_word(&mut self, start: usize, end: usize) -> Option<Result<Token<'a>, TokenizeError>> {
        let word = &self.input[start..end];
        let san_len = word.trim_end_matches(['!', '?']).len();
        self.pos = end;

        if san_len < word.len() {
            let glyph_offset = start + san_len;
            self.pending = Some(match glyph_code(&word[san_len..]) {
                Some(code) => Ok(Token {
                    kind: TokenKind::Nag(code),
                    offset: glyph_offset,
                }),
                None => Err(TokenizeError::UnexpectedCharacter {
                    ch: word.as_bytes()[san_len] as char,
                    offset: glyph_offset,
                }),
            });
        }

        Self::token(TokenKind::San(&word[..san_len]), start)
    }

    fn glyph(&mut self, start: usize) -> Option<Result<Token<'a>, TokenizeError>> {
        let end = self.word_end(start);
        match glyph_code(&self.input[start..end]) {
            Some(code) => {
                self.pos = end;
                Self::token(TokenKind::Nag(code), start)
            }
            None => self.fail(TokenizeError::UnexpectedCharacter {
                ch: self.bytes()[start] as char,
                offset: start,
            }),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            if pending.is_err() {
                self.pos = self.input.len();
            }
            return Some(pending);
        }

        loop {
            self.skip_whitespace();
            let start = self.pos;
            let b = *self.bytes().get(start)?;

            return match b {
                b'{' => self.brace_comment(start),
                b'}' => self.fail(TokenizeError::UnmatchedCloseBrace { offset: start }),
                b';' => {
                    let end = self.line_end(start);
                    self.pos = end;
                    Self::token(TokenKind::Comment(&self.input[start + 1..end]), start)
                }
                b'%' if self.at_line_start(start) => {
                    self.pos = self.line_end(start);
                    continue;
                }
                b'(' => {
                    self.pos += 1;
                    Self::token(TokenKind::OpenVariation, start)
                }
                b')' => {
                    self.pos += 1;
                    Self::token(TokenKind::CloseVariation, start)
                }
                b'*' => {
                    self.pos += 1;
                    Self::token(TokenKind::Result(GameResult::Ongoing), start)
                }
                b'$' => self.nag(start),
                b'!' | b'?' => self.glyph(start),
                b'0'..=b'9' => self.number_or_result(start),
                b if b.is_ascii_alphabetic() || b == b'-' => {
                    let end = self.word_end(start);
                    self.san_word(start, end)
                }
                _ => {
                    let ch = self.input[start..].chars().next().unwrap_or('\u{fffd}');
                    self.fail(TokenizeError::UnexpectedCharacter { ch, offset: start })
                }
            };
        }
    }
}

fn glyph_code(glyph: &str) -> Option<u8> {
    match glyph {
        "!" => Some(1),
        "?" => Some(2),
        "!!" => Some(3),
        "??" => Some(4),
        "!?" => Some(5),
        "?!" => Some(6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        Tokenizer::new(input)
            .map(|token| token.expect("tokenizes").kind)
            .collect()
    }

    #[test]
    fn test_basic_movetext() {
        assert_eq!(
            kinds("1. e4 e5 2. Nf3 1-0"),
            vec![
                TokenKind::MoveNumber {
                    number: 1,
                    black: false
                },
                TokenKind::San("e4"),
                TokenKind::San("e5"),
                TokenKind::MoveNumber {
                    number: 2,
                    black: false
                },
                TokenKind::San("Nf3"),
                TokenKind::Result(GameResult::WhiteWins),
            ]
        );
    }

    #[test]
    fn test_number_glued_to_move() {
        assert_eq!(
            kinds("1.e4 1...e5"),
            vec![
                TokenKind::MoveNumber {
                    number: 1,
                    black: false
                },
                TokenKind::San("e4"),
                TokenKind::MoveNumber {
                    number: 1,
                    black: true
                },
                TokenKind::San("e5"),
            ]
        );
    }

    #[test]
    fn test_parentheses_inside_comment_are_comment_text() {
        assert_eq!(
            kinds("e4 { see (a) and (b } e5"),
            vec![
                TokenKind::San("e4"),
                TokenKind::Comment(" see (a) and (b "),
                TokenKind::San("e5"),
            ]
        );
    }

    #[test]
    fn test_variation_delimiters() {
        assert_eq!(
            kinds("e4 (d4) e5"),
            vec![
                TokenKind::San("e4"),
                TokenKind::OpenVariation,
                TokenKind::San("d4"),
                TokenKind::CloseVariation,
                TokenKind::San("e5"),
            ]
        );
    }

    #[test]
    fn test_suffix_glyphs_become_nags() {
        assert_eq!(
            kinds("e4!? e5?? Nf3 $14"),
            vec![
                TokenKind::San("e4"),
                TokenKind::Nag(5),
                TokenKind::San("e5"),
                TokenKind::Nag(4),
                TokenKind::San("Nf3"),
                TokenKind::Nag(14),
            ]
        );
    }

    #[test]
    fn test_results_and_zero_castling() {
        assert_eq!(
            kinds("0-0 0-0-0 1/2-1/2"),
            vec![
                TokenKind::San("0-0"),
                TokenKind::San("0-0-0"),
                TokenKind::Result(GameResult::Draw),
            ]
        );
        assert_eq!(kinds("0-1"), vec![TokenKind::Result(GameResult::BlackWins)]);
        assert_eq!(kinds("*"), vec![TokenKind::Result(GameResult::Ongoing)]);
    }

    #[test]
    fn test_rest_of_line_comment_and_escape_line() {
        assert_eq!(
            kinds("e4 ; king pawn\n% escaped (line\ne5"),
            vec![
                TokenKind::San("e4"),
                TokenKind::Comment(" king pawn"),
                TokenKind::San("e5"),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_reports_offset() {
        let mut tokens = Tokenizer::new("1. e4 {never closed");
        assert!(tokens.next().unwrap().is_ok());
        assert!(tokens.next().unwrap().is_ok());
        assert_eq!(
            tokens.next(),
            Some(Err(TokenizeError::UnterminatedComment { offset: 6 }))
        );
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_stray_close_brace_is_an_error() {
        let errors: Vec<_> = Tokenizer::new("e4 } e5").filter_map(Result::err).collect();
        assert_eq!(errors, vec![TokenizeError::UnmatchedCloseBrace { offset: 3 }]);
    }

    #[test]
    fn test_offsets_are_absolute_when_started_mid_text() {
        let text = "[Event \"x\"]\n\n1. d4";
        let start = text.find('1').unwrap();
        let tokens: Vec<_> = Tokenizer::at(text, start).map(Result::unwrap).collect();
        assert_eq!(tokens[0].offset, start);
        assert_eq!(tokens[1].offset, start + 3);
    }

    #[test]
    fn test_tokenizer_is_restartable() {
        let tokens = Tokenizer::new("1. e4 { a } (1. d4) *");
        let first: Vec<_> = tokens.clone().collect();
        let second: Vec<_> = tokens.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unexpected_character() {
        let errors: Vec<_> = Tokenizer::new("e4 [e5]").filter_map(Result::err).collect();
        assert_eq!(
            errors,
            vec![TokenizeError::UnexpectedCharacter { ch: '[', offset: 3 }]
        );
    }
}
