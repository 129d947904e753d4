//! Action extraction from model replies.
//!
//! A reply may carry at most one executable action: the first fenced shell
//! block. Everything else is thought text. Extra shell blocks are ignored
//! but counted, so the loop can tell the transcript (and the model) that
//! content was dropped.

use crate::types::Action;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Fence language tags treated as executable shell blocks.
const SHELL_TAGS: [&str; 4] = ["", "bash", "sh", "shell"];

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    // Opening fence with an info line, lazy body, closing fence on its own
    // line. Multiline + dot-matches-newline so bodies can span lines.
    FENCE_RE.get_or_init(|| {
        Regex::new(r"(?ms)^```([^\n]*)\n(.*?)^```[ \t]*$").expect("fence pattern is valid")
    })
}

/// Result of scanning one model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Reply text with the executed block removed; the whole reply when no
    /// action was found.
    pub thought: String,
    /// The first fenced shell block, if any.
    pub action: Option<Action>,
    /// Count of additional shell blocks that were dropped.
    pub ignored_blocks: usize,
}

/// Scan `reply` for fenced shell blocks and derive at most one action.
///
/// `project_root` is the default working directory; a fence info string of
/// the form ```` ```bash cwd=/path ```` overrides it for that action.
pub fn extract(reply: &str, project_root: &Path) -> Extraction {
    let mut blocks = Vec::new();
    for captures in fence_re().captures_iter(reply) {
        let info = captures.get(1).map_or("", |m| m.as_str());
        let Some(cwd) = parse_shell_info(info) else {
            // Non-shell fences (diffs, file contents, ...) stay in the thought.
            continue;
        };
        let span = captures.get(0).map_or("", |m| m.as_str());
        let body = captures.get(2).map_or("", |m| m.as_str());
        blocks.push((span.to_string(), body.trim().to_string(), cwd));
    }

    let mut blocks = blocks.into_iter();
    let Some((raw_span, command, cwd)) = blocks.next() else {
        return Extraction {
            thought: reply.trim().to_string(),
            action: None,
            ignored_blocks: 0,
        };
    };

    let thought = reply.replacen(&raw_span, "", 1).trim().to_string();
    let working_directory = cwd.unwrap_or_else(|| project_root.to_path_buf());
    Extraction {
        thought,
        action: Some(Action {
            command,
            working_directory,
            raw_span,
        }),
        ignored_blocks: blocks.count(),
    }
}

/// Parse a fence info string. Returns `None` for non-shell fences, and the
/// optional `cwd=` override for shell fences.
fn parse_shell_info(info: &str) -> Option<Option<PathBuf>> {
    let mut tokens = info.split_whitespace().peekable();
    let first = tokens.peek().copied();
    let tag = match first {
        Some(token) if !token.contains('=') => {
            tokens.next();
            token
        }
        _ => "",
    };
    if !SHELL_TAGS.contains(&tag) {
        return None;
    }

    let cwd = tokens
        .find_map(|token| token.strip_prefix("cwd="))
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);
    Some(cwd)
}
