//! Locating PGN inputs and reading them into memory.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::log;

type PgnInput = Box<dyn Read + Send>;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("failed to open file '{}': {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to initialize zstd decoder for '{}': {source}", path.display())]
    Decoder { path: PathBuf, source: io::Error },
    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    Plain,
    Zstd,
}

impl CompressionMode {
    /// Chosen from the file extension: `.zst` is zstd, anything else is plain.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expands each argument into paths. Arguments with glob metacharacters are
/// matched against the filesystem in sorted order; others are taken as-is.
pub fn expand_inputs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, InputError> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if !is_glob_pattern(pattern) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let matches: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|source| InputError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        if matches.is_empty() {
            log::warn(format!("pattern '{pattern}' matched no files"));
        }
        paths.extend(matches);
    }
    Ok(paths)
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<PgnInput, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|source| InputError::Decoder {
                path: path.to_path_buf(),
                source,
            }),
    }
}

/// Reads a whole PGN file, decompressing `.zst` inputs.
pub fn read_pgn(path: &Path) -> Result<String, InputError> {
    let mut input = open_input_stream(path, CompressionMode::for_path(path))?;
    let mut text = String::new();
    input
        .read_to_string(&mut text)
        .map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug(format!("read {} bytes from {}", text.len(), path.display()));
    Ok(text)
}

/// Short name for an input, used for its output sub-directory:
/// `games/study.pgn.zst` becomes `study`.
pub fn input_label(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    for ext in [".zst", ".pgn"] {
        if name.len() > ext.len() && name.to_ascii_lowercase().ends_with(ext) {
            name.truncate(name.len() - ext.len());
        }
    }
    if name.is_empty() { "input".to_string() } else { name }
}
