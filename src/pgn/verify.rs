use std::io;
use std::ops::ControlFlow;

use pgn_reader::{Nag, Outcome, RawComment, Reader, SanPlus, Skip, Visitor};
use smallvec::SmallVec;

use crate::error::{ErrorAccumulator, VerifyError};

use super::tree::{Game, GameResult};

type MoveList = SmallVec<[String; 128]>;

/// Main line of a PGN text as seen by `pgn-reader`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mainline {
    pub sans: MoveList,
    pub outcome: Option<String>,
}

/// Reads the first game of `pgn` with `pgn-reader`, keeping only main-line
/// SANs and the outcome. Comments, NAGs and variations are skipped.
pub fn read_mainline(pgn: &str) -> Result<Mainline, VerifyError> {
    let mut reader = Reader::new(io::Cursor::new(pgn.as_bytes()));
    let mut visitor = MainlineVisitor::default();

    match reader.read_game(&mut visitor) {
        Ok(Some(())) => Ok(visitor.mainline),
        Ok(None) => Err(VerifyError("no game found".to_string())),
        Err(err) => Err(VerifyError(format!("read error: {err}"))),
    }
}

/// Confirms that `rendered` re-reads as the main line and result of `game`.
pub fn check_game(game: &Game, rendered: &str) -> Result<(), VerifyError> {
    let mainline = read_mainline(rendered)?;
    let mut problems = ErrorAccumulator::default();

    let expected: Vec<&str> = game.line.sans().collect();
    if expected.len() != mainline.sans.len() {
        problems.push(&format!(
            "expected {} main-line moves, read {}",
            expected.len(),
            mainline.sans.len()
        ));
    }
    if let Some((ply, (want, got))) = expected
        .iter()
        .zip(mainline.sans.iter())
        .enumerate()
        .find(|(_, (want, got))| **want != got.as_str())
    {
        problems.push(&format!("ply {}: expected {want}, read {got}", ply + 1));
    }

    if let Some(outcome) = mainline.outcome.as_deref()
        && outcome != GameResult::Ongoing.as_str()
        && outcome != game.result.as_str()
    {
        problems.push(&format!(
            "expected result {}, read {outcome}",
            game.result
        ));
    }

    match problems.take() {
        Some(msg) => Err(VerifyError(msg)),
        None => Ok(()),
    }
}

#[derive(Default)]
struct MainlineVisitor {
    mainline: Mainline,
}

impl Visitor for MainlineVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.mainline = Mainline::default();
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(())
    }

    fn san(
        &mut self,
        _movetext: &mut Self::Movetext,
        san_plus: SanPlus,
    ) -> ControlFlow<Self::Output> {
        self.mainline.sans.push(san_plus.to_string());
        ControlFlow::Continue(())
    }

    fn nag(&mut self, _: &mut Self::Movetext, _: Nag) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn comment(&mut self, _: &mut Self::Movetext, _: RawComment<'_>) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        _: &mut Self::Movetext,
        _: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.mainline.outcome = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::oracle::ShakmatyOracle;
    use crate::pgn::parser::parse_game;
    use crate::pgn::serialize::write_game;

    #[test]
    fn test_read_mainline_skips_variations_and_comments() {
        let mainline =
            read_mainline("1. e4! {Best by test} (1. d4 d5) e5?? $1 2. Nf3 1-0").unwrap();
        assert_eq!(mainline.sans.to_vec(), vec!["e4", "e5", "Nf3"]);
        assert_eq!(mainline.outcome.as_deref(), Some("1-0"));
    }

    #[test]
    fn test_serialized_game_passes_check() {
        let game = parse_game(
            "[Event \"x\"]\n\n1. d4 d5 2. c4 dxc4 {QGA} (2... c6 {Slav}) 3. e4 1-0",
            &ShakmatyOracle,
        )
        .unwrap();
        let rendered = write_game(&game);

        assert_eq!(check_game(&game, &rendered), Ok(()));
    }

    #[test]
    fn test_mismatch_is_reported() {
        let game = parse_game("1. e4 e5 *", &ShakmatyOracle).unwrap();
        let err = check_game(&game, "1. e4 c5 2. Nf3 *").unwrap_err();

        assert_eq!(
            err.0,
            "expected 2 main-line moves, read 3; ply 2: expected e5, read c5"
        );
    }
}
