use shakmaty::san::{San, SanError, SanPlus};
use shakmaty::{Chess, Position};

use crate::error::MoveRejection;

/// Move-legality capability the parser depends on. Positions are immutable
/// values: applying a move returns a new position and never touches the input.
pub trait LegalityOracle {
    type Position: Clone;

    fn initial_position(&self) -> Self::Position;

    /// Resolves `san` against `position`, returning the position after the
    /// move and the move's canonical SAN.
    fn apply_move(
        &self,
        position: &Self::Position,
        san: &str,
    ) -> Result<(Self::Position, String), MoveRejection>;
}

/// Full chess rules backed by `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl LegalityOracle for ShakmatyOracle {
    type Position = Chess;

    fn initial_position(&self) -> Chess {
        Chess::default()
    }

    fn apply_move(&self, position: &Chess, san: &str) -> Result<(Chess, String), MoveRejection> {
        let san_plus: SanPlus = normalize_castling(san)
            .parse()
            .map_err(|_| MoveRejection::Unparseable)?;

        let m = san_plus.san.to_move(position).map_err(|err| match err {
            SanError::AmbiguousSan => MoveRejection::Ambiguous,
            _ => MoveRejection::Illegal,
        })?;

        let canonical = San::from_move(position, m);
        let mut next = position.clone();
        next.play_unchecked(m);

        let mut text = canonical.to_string();
        if next.is_checkmate() {
            text.push('#');
        } else if next.is_check() {
            text.push('+');
        }
        Ok((next, text))
    }
}

fn normalize_castling(san: &str) -> String {
    if san.starts_with("0-0") {
        san.replace('0', "O")
    } else {
        san.to_string()
    }
}

/// Accepts any token as-is and only tracks the ply count. Useful when the
/// input is known to be legal and only the tree shape matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingOracle;

impl LegalityOracle for TrustingOracle {
    type Position = usize;

    fn initial_position(&self) -> usize {
        0
    }

    fn apply_move(&self, position: &usize, san: &str) -> Result<(usize, String), MoveRejection> {
        let valid = san
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '0');
        if !valid {
            return Err(MoveRejection::Unparseable);
        }
        Ok((position + 1, san.to_string()))
    }
}
