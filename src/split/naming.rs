use std::sync::LazyLock;

use regex::Regex;

static EMBEDDED_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[%[^\]]*\]").expect("valid embedded command regex"));
static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid file name regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").expect("valid whitespace regex"));

/// Separators left dangling at either end once a marker is cut out.
const MARKER_REMNANTS: [char; 5] = ['-', ':', ',', ';', '|'];

/// Removes every occurrence of `marker` from `comment`. Returns `None` when
/// nothing but whitespace or separator punctuation remains.
pub fn strip_marker(comment: &str, marker: &str) -> Option<String> {
    if marker.is_empty() || !comment.contains(marker) {
        let trimmed = comment.trim();
        return (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    let removed = comment.replace(marker, " ");
    let collapsed = removed.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = collapsed.trim_matches(|c: char| c.is_whitespace() || MARKER_REMNANTS.contains(&c));

    let meaningful = !cleaned
        .chars()
        .all(|c| c.is_ascii_punctuation() || c.is_whitespace());
    meaningful.then(|| cleaned.to_string())
}

/// Comment text reduced to a one-line title: `[%eval ...]`-style commands
/// dropped and whitespace collapsed.
pub fn clean_title(comment: &str) -> String {
    let without_commands = EMBEDDED_COMMAND.replace_all(comment, " ");
    without_commands.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title for branch 0. A comment that already names the main line is used
/// as-is; any other comment is appended to `default`.
pub fn main_line_title(comment: Option<&str>, default: &str) -> String {
    let title = comment.map(clean_title).unwrap_or_default();
    if title.is_empty() {
        default.to_string()
    } else if title.contains(default) {
        title
    } else {
        format!("{default} - {title}")
    }
}

/// Title for branch `n >= 1`: the variation's first comment, or `Variation {n}`.
pub fn variation_title(comment: Option<&str>, n: usize) -> String {
    let title = comment.map(clean_title).unwrap_or_default();
    if title.is_empty() {
        format!("Variation {n}")
    } else {
        title
    }
}

/// Drops characters outside word characters, whitespace and `-`, then turns
/// whitespace into underscores.
pub fn sanitize_file_stem(name: &str) -> String {
    let kept = UNSAFE_FILE_CHARS.replace_all(name, "");
    let stem = WHITESPACE.replace_all(kept.trim(), "_").into_owned();
    if stem.is_empty() {
        "chapter".to_string()
    } else {
        stem
    }
}

pub fn chapter_file_name(index: usize, name: &str) -> String {
    format!("{:02}_{}.pgn", index, sanitize_file_stem(name))
}
