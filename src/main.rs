//! Command-line entry point: splits each input PGN into chapter files.
//!
//! Usage:
//!   chess-chapters study.pgn
//!   chess-chapters 'studies/*.pgn.zst' -o chapters --verify --manifest

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;

use chess_chapters::export::{ExportOptions, verify_chapters, write_chapters};
use chess_chapters::input::{expand_inputs, input_label, read_pgn};
use chess_chapters::log;
use chess_chapters::pgn::{Game, GameReader, ShakmatyOracle};
use chess_chapters::split::{SPLIT_MARKER, SplitOptions, split_game};

/// Split annotated PGN studies into one linear chapter per variation
#[derive(Parser, Debug)]
#[command(name = "chess-chapters", version)]
struct Args {
    /// PGN files or glob patterns; `.zst` files are decompressed
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Directory receiving the chapter files
    #[arg(long, short = 'o', default_value = "output")]
    output_dir: PathBuf,

    /// Comment text that pins the split point
    #[arg(long, default_value = SPLIT_MARKER)]
    marker: String,

    /// Do not stamp chapters with today's UTCDate
    #[arg(long)]
    no_date: bool,

    /// Re-read every chapter with a standard PGN reader before writing
    #[arg(long)]
    verify: bool,

    /// Write chapters.json next to the chapter files
    #[arg(long)]
    manifest: bool,
}

struct Job {
    input: PathBuf,
    output_dir: PathBuf,
}

/// One job per input. Several inputs each get a sub-directory named after the
/// file; clashing names get a numeric suffix.
fn plan_jobs(inputs: Vec<PathBuf>, root: &Path) -> Vec<Job> {
    if inputs.len() == 1 {
        return inputs
            .into_iter()
            .map(|input| Job {
                input,
                output_dir: root.to_path_buf(),
            })
            .collect();
    }

    let mut used: Vec<String> = Vec::with_capacity(inputs.len());
    inputs
        .into_iter()
        .map(|input| {
            let label = input_label(&input);
            let mut name = label.clone();
            let mut n = 2;
            while used.contains(&name) {
                name = format!("{label}_{n}");
                n += 1;
            }
            used.push(name.clone());
            Job {
                output_dir: root.join(&name),
                input,
            }
        })
        .collect()
}

/// Parses, splits and writes one input. Nothing is written when any game in
/// the file fails to parse or verify.
fn process(job: &Job, split_options: &SplitOptions, export: ExportOptions) -> Result<Vec<PathBuf>> {
    let text = read_pgn(&job.input)?;
    let oracle = ShakmatyOracle;
    let mut games = GameReader::new(&text, &oracle)
        .collect::<Result<Vec<Game>, _>>()
        .with_context(|| format!("failed to parse '{}'", job.input.display()))?;
    if games.is_empty() {
        log::warn(format!("no game found in '{}'", job.input.display()));
        games.push(Game::default());
    }

    let split: Vec<_> = games
        .iter()
        .map(|game| split_game(game, split_options))
        .collect();
    if export.verify {
        for chapters in &split {
            verify_chapters(chapters)
                .with_context(|| format!("verification failed for '{}'", job.input.display()))?;
        }
    }

    let multi_game = split.len() > 1;
    let mut written = Vec::new();
    for (i, chapters) in split.iter().enumerate() {
        let dir = if multi_game {
            job.output_dir.join(format!("game_{:02}", i + 1))
        } else {
            job.output_dir.clone()
        };
        let export = ExportOptions {
            verify: false,
            ..export
        };
        written.extend(write_chapters(&dir, chapters, export)?);
    }
    Ok(written)
}

fn run(args: Args) -> Result<usize> {
    let inputs = expand_inputs(args.inputs.as_slice())?;
    if inputs.is_empty() {
        bail!("no input files matched");
    }

    let split_options = SplitOptions {
        marker: args.marker,
        utc_date: (!args.no_date).then(|| Utc::now().format("%Y.%m.%d").to_string()),
        ..SplitOptions::default()
    };
    let export = ExportOptions {
        verify: args.verify,
        manifest: args.manifest,
    };
    let jobs = plan_jobs(inputs, &args.output_dir);
    let split_options = &split_options;

    let results: Vec<Result<Vec<PathBuf>>> = thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| scope.spawn(move || process(job, split_options, export)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("worker thread panicked")))
            })
            .collect()
    });

    let mut failures = 0;
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(paths) => {
                for path in paths {
                    println!("{}", path.display());
                }
            }
            Err(err) => {
                failures += 1;
                log::error(format!("{}: {err:#}", job.input.display()));
            }
        }
    }
    Ok(failures)
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            log::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
