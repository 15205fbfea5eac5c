//! Writing chapters to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use thiserror::Error;

use crate::error::VerifyError;
use crate::log;
use crate::pgn::verify::check_game;
use crate::split::Chapter;

pub const MANIFEST_FILE: &str = "chapters.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create directory '{}': {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("chapter {index} ({name}): {source}")]
    Verify {
        index: usize,
        name: String,
        source: VerifyError,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Re-read every rendered chapter before writing anything.
    pub verify: bool,
    /// Also write `chapters.json` next to the chapter files.
    pub manifest: bool,
}

/// Renders every chapter and checks it re-reads as the same main line.
pub fn verify_chapters(chapters: &[Chapter]) -> Result<(), ExportError> {
    for chapter in chapters {
        check_game(&chapter.game, &chapter.to_pgn()).map_err(|source| {
            log::error(format!("chapter {} failed verification", chapter.index));
            ExportError::Verify {
                index: chapter.index,
                name: chapter.name.clone(),
                source,
            }
        })?;
    }
    Ok(())
}

/// JSON summary of the chapters, one entry per file.
pub fn manifest(chapters: &[Chapter]) -> Value {
    let entries: Vec<Value> = chapters
        .iter()
        .map(|chapter| {
            json!({
                "index": chapter.index,
                "name": chapter.name,
                "file": chapter.file_name(),
                "split_ply": chapter.split_ply,
                "moves": chapter.move_count(),
            })
        })
        .collect();
    json!({ "chapters": entries })
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf, ExportError> {
    fs::write(&path, contents).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Writes `{index:02}_{name}.pgn` for each chapter into `dir`, creating it if
/// needed. Verification runs before the first write so a failing set leaves
/// no files behind. Returns the written chapter paths in order.
pub fn write_chapters(
    dir: &Path,
    chapters: &[Chapter],
    options: ExportOptions,
) -> Result<Vec<PathBuf>, ExportError> {
    if options.verify {
        verify_chapters(chapters)?;
    }

    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(chapters.len());
    for chapter in chapters {
        let path = write_file(dir.join(chapter.file_name()), &chapter.to_pgn())?;
        log::debug(format!("wrote {}", path.display()));
        written.push(path);
    }

    if options.manifest {
        let text = serde_json::to_string_pretty(&manifest(chapters))
            .unwrap_or_else(|_| "{\"chapters\":[]}".to_string());
        write_file(dir.join(MANIFEST_FILE), &text)?;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgn::oracle::ShakmatyOracle;
    use crate::pgn::parser::parse_game;
    use crate::pgn::tree::MoveNode;
    use crate::split::{SplitOptions, split_game};

    fn scenario() -> Vec<Chapter> {
        let game = parse_game(
            "[Event \"QG\"]\n\n1. d4 d5 2. c4 dxc4 {QGA} (2... c6 {Slav}) (2... e6 {QGD}) *",
            &ShakmatyOracle,
        )
        .unwrap();
        split_game(&game, &SplitOptions::default())
    }

    #[test]
    fn test_write_chapters_creates_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        let chapters = scenario();

        let written = write_chapters(&out, &chapters, ExportOptions::default()).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["00_Main_Line_-_QGA.pgn", "01_Slav.pgn", "02_QGD.pgn"]);

        let slav = fs::read_to_string(&written[1]).unwrap();
        assert!(slav.starts_with("[Event \"QG\"]\n"));
        assert!(slav.contains("[ChapterName \"Slav\"]\n"));
        assert!(slav.ends_with("\n\n1. d4 d5 2. c4 c6 {Slav} *\n"));
        assert!(!out.join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_manifest_lists_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let options = ExportOptions {
            verify: true,
            manifest: true,
        };
        write_chapters(dir.path(), &scenario(), options).unwrap();

        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let entries = value["chapters"].as_array().unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["name"], "QGD");
        assert_eq!(entries[2]["file"], "02_QGD.pgn");
        assert_eq!(entries[0]["split_ply"], 3);
        assert_eq!(entries[0]["moves"], 4);
    }

    #[test]
    fn test_verification_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut chapters = scenario();
        chapters[1].game.line.moves.push(MoveNode::new("Nf3 Nf6"));

        let err = write_chapters(
            &out,
            &chapters,
            ExportOptions {
                verify: true,
                manifest: false,
            },
        )
        .unwrap_err();

        assert!(matches!(err, ExportError::Verify { index: 1, .. }));
        assert!(!out.exists());
    }
}
