//! UCI line handling: command construction and reply classification.
//!
//! Kept free of I/O so every shape the wire can take is unit-testable
//! without a child process.

use crate::model::{Score, SearchLimit};

/// The fields of one `info` line that matter for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InfoLine {
    pub depth: u32,
    pub multipv: u32,
    pub score: Score,
    pub pv: Vec<String>,
}

/// A reply line seen while a `go` is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GoReply {
    Info(InfoLine),
    /// The `bestmove` terminator; `None` when the engine printed `(none)`,
    /// i.e. the position has no legal moves.
    BestMove(Option<String>),
}

/// Builds the `go` command for a limit. An empty limit searches to the
/// default depth; zero-valued bounds are dropped.
pub(crate) fn go_command(limit: &SearchLimit) -> String {
    if limit.is_empty() {
        return format!("go depth {}", SearchLimit::DEFAULT_DEPTH);
    }
    let mut cmd = String::from("go");
    if let Some(depth) = limit.depth.filter(|d| *d > 0) {
        cmd.push_str(&format!(" depth {depth}"));
    }
    if let Some(movetime) = limit.movetime.filter(|t| !t.is_zero()) {
        cmd.push_str(&format!(" movetime {}", movetime.as_millis()));
    }
    if let Some(nodes) = limit.nodes.filter(|n| *n > 0) {
        cmd.push_str(&format!(" nodes {nodes}"));
    }
    cmd
}

/// Classifies one line of engine output during a search.
///
/// Returns `None` for chatter we do not need: `info string`, currmove
/// progress, and anything without a score.
pub(crate) fn parse_go_line(line: &str) -> Option<GoReply> {
    let mut tokens = line.split_whitespace();
    match tokens.next()? {
        "bestmove" => {
            let mv = tokens.next().filter(|m| *m != "(none)").map(String::from);
            Some(GoReply::BestMove(mv))
        }
        "info" => {
            let mut depth = 0u32;
            let mut multipv = 1u32;
            let mut score = None;
            let mut pv = Vec::new();
            while let Some(tok) = tokens.next() {
                match tok {
                    "depth" => depth = tokens.next()?.parse().ok()?,
                    "multipv" => multipv = tokens.next()?.parse().ok()?,
                    "score" => {
                        let kind = tokens.next()?;
                        let value: i32 = tokens.next()?.parse().ok()?;
                        score = Some(match kind {
                            "cp" => Score::Cp(value),
                            "mate" => Score::Mate(value),
                            _ => return None,
                        });
                    }
                    "string" => return None,
                    "pv" => {
                        pv = tokens.map(String::from).collect();
                        break;
                    }
                    _ => {}
                }
            }
            Some(GoReply::Info(InfoLine {
                depth,
                multipv,
                score: score?,
                pv,
            }))
        }
        _ => None,
    }
}

/// Version line of the handshake: `id name Stockfish 16` → `Stockfish 16`.
pub(crate) fn id_name(line: &str) -> Option<&str> {
    line.strip_prefix("id name ").map(str::trim)
}

/// First line of the `eval` table.
pub(crate) fn is_breakdown_header(line: &str) -> bool {
    line.contains("Term") && line.contains("White") && line.contains("Black")
}

/// Final aggregate row of the `eval` table.
pub(crate) fn is_breakdown_total(line: &str) -> bool {
    line.trim_start().starts_with("Total")
}
