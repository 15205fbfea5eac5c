//! PGN reading and writing: tokenizer, tree parser, serializer and a
//! re-read check against `pgn-reader`.

pub mod headers;
pub mod oracle;
pub mod parser;
pub mod serialize;
pub mod tokenizer;
pub mod tree;
pub mod verify;

pub use headers::{Headers, parse_tag_section};
pub use oracle::{LegalityOracle, ShakmatyOracle, TrustingOracle};
pub use parser::{GameReader, ParseOptions, parse_game, parse_game_with_options, parse_movetext};
pub use serialize::{write_game, write_movetext};
pub use tokenizer::{Token, TokenKind, Tokenizer};
pub use tree::{Game, GameResult, Line, MoveNode};
