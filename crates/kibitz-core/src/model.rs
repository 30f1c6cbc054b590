//! Search limits and evaluation results.

use std::time::Duration;

use serde::Serialize;

/// Bounds for a single search. Any combination of the three may be set; an
/// empty limit makes the engine search to [`SearchLimit::DEFAULT_DEPTH`].
/// Zero values count as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimit {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
}

impl SearchLimit {
    /// Depth substituted when no bound is given.
    pub const DEFAULT_DEPTH: u32 = 20;

    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn movetime(movetime: Duration) -> Self {
        Self {
            movetime: Some(movetime),
            ..Self::default()
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        Self {
            nodes: Some(nodes),
            ..Self::default()
        }
    }

    /// True when no usable bound is set.
    pub fn is_empty(&self) -> bool {
        self.depth.unwrap_or(0) == 0
            && self.movetime.unwrap_or(Duration::ZERO).is_zero()
            && self.nodes.unwrap_or(0) == 0
    }
}

/// An engine score: centipawns or mate distance, never both.
///
/// Values are from the side to move's perspective. A negative mate distance
/// means the side to move is the one getting mated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

impl Score {
    pub(crate) fn negated(self) -> Self {
        match self {
            Score::Cp(v) => Score::Cp(-v),
            Score::Mate(v) => Score::Mate(-v),
        }
    }
}

/// Result of one evaluation.
///
/// `score: None` is the empty result: the position had no legal moves
/// (checkmate or stalemate), the engine answered `bestmove (none)` and
/// there is nothing to score. `alternatives` holds the remaining MultiPV
/// variations in engine-reported order; their own `alternatives` are
/// always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    pub score: Option<Score>,
    pub depth: u32,
    pub best_line: Vec<String>,
    pub alternatives: Vec<EvaluationResult>,
}

impl EvaluationResult {
    /// True for the no-legal-moves result.
    pub fn is_empty(&self) -> bool {
        self.score.is_none() && self.best_line.is_empty()
    }

    /// Variations carried: the primary plus its alternatives.
    pub fn variation_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            1 + self.alternatives.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_limit_detection() {
        assert!(SearchLimit::default().is_empty());
        assert!(SearchLimit::depth(0).is_empty());
        assert!(SearchLimit::movetime(Duration::ZERO).is_empty());
        assert!(SearchLimit::nodes(0).is_empty());
        assert!(!SearchLimit::depth(12).is_empty());
        assert!(!SearchLimit::nodes(1_000_000).is_empty());
    }

    #[test]
    fn test_score_negation() {
        assert_eq!(Score::Cp(34).negated(), Score::Cp(-34));
        assert_eq!(Score::Mate(-2).negated(), Score::Mate(2));
    }

    #[test]
    fn test_default_result_is_empty() {
        let r = EvaluationResult::default();
        assert!(r.is_empty());
        assert_eq!(r.variation_count(), 0);
        assert!(r.alternatives.is_empty());
    }

    #[test]
    fn test_score_json_shape() {
        let json = serde_json::to_value(Score::Mate(3)).unwrap();
        assert_eq!(json["kind"], "mate");
        assert_eq!(json["value"], 3);
    }

    #[test]
    fn test_result_json_keeps_alternatives() {
        let r = EvaluationResult {
            score: Some(Score::Cp(15)),
            depth: 18,
            best_line: vec!["e2e4".into(), "e7e5".into()],
            alternatives: vec![EvaluationResult {
                score: Some(Score::Cp(-3)),
                depth: 18,
                best_line: vec!["d2d4".into()],
                alternatives: vec![],
            }],
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["score"]["kind"], "cp");
        assert_eq!(json["alternatives"][0]["score"]["value"], -3);
    }
}
