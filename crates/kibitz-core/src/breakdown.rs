//! Classical evaluation breakdown: types and table parser.
//!
//! Stockfish 16 and earlier print a fixed-column table for the `eval`
//! command, one row per evaluation term:
//!
//! ```text
//!       Term    |    White    |    Black    |    Total
//!               |   MG    EG  |   MG    EG  |   MG    EG
//! ------------------------------------------------------
//!     Material |  +4.12 +4.50|  -4.12 -4.50|  +0.00 +0.00
//!     Mobility |  +0.45 +0.31|  -0.00 -0.00|  +0.45 +0.31
//!        Total |             |             |  +0.56 +0.41
//! ```
//!
//! The parser is tolerant by construction: decoration lines are skipped,
//! unrecognized term names are ignored so newer engine builds with extra
//! rows keep working, and blank or unparseable cells read as 0.0.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Matches one table row: a term name followed by three `|`-separated cell
/// pairs, each cell an optional signed decimal.
static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(\w[\w\s]*?)\s*\|\s*([+-]?\d+\.\d+)?\s*([+-]?\d+\.\d+)?\s*\|\s*([+-]?\d+\.\d+)?\s*([+-]?\d+\.\d+)?\s*\|\s*([+-]?\d+\.\d+)?\s*([+-]?\d+\.\d+)?",
    )
    .expect("eval row pattern")
});

/// Middlegame and endgame components of one value, in pawns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseScore {
    pub mg: f64,
    pub eg: f64,
}

/// Per-side breakdown of one evaluation term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TermScore {
    pub white: PhaseScore,
    pub black: PhaseScore,
    pub total: PhaseScore,
}

/// Complete classical evaluation breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassicalBreakdown {
    pub material: TermScore,
    pub imbalance: TermScore,
    pub pawns: TermScore,
    pub knights: TermScore,
    pub bishops: TermScore,
    pub rooks: TermScore,
    pub queens: TermScore,
    pub mobility: TermScore,
    pub king_safety: TermScore,
    pub threats: TermScore,
    pub passed: TermScore,
    pub space: TermScore,
    pub winnable: TermScore,
    pub total: TermScore,
    /// Blended estimate in centipawns, derived from the total row as
    /// `(mg + eg) / 2 * 100` truncated toward zero. A display heuristic,
    /// not the engine's search evaluation.
    pub final_cp: i32,
}

impl ClassicalBreakdown {
    fn term_mut(&mut self, name: &str) -> Option<&mut TermScore> {
        Some(match name {
            "material" => &mut self.material,
            "imbalance" => &mut self.imbalance,
            "pawns" => &mut self.pawns,
            "knights" => &mut self.knights,
            "bishops" => &mut self.bishops,
            "rooks" => &mut self.rooks,
            "queens" => &mut self.queens,
            "mobility" => &mut self.mobility,
            "king safety" => &mut self.king_safety,
            "threats" => &mut self.threats,
            "passed" => &mut self.passed,
            "space" => &mut self.space,
            "winnable" => &mut self.winnable,
            "total" => &mut self.total,
            _ => return None,
        })
    }
}

impl fmt::Display for ClassicalBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classical evaluation breakdown:")?;
        for (label, term) in [
            ("Material:   ", &self.material),
            ("Mobility:   ", &self.mobility),
            ("King safety:", &self.king_safety),
            ("Threats:    ", &self.threats),
            ("Pawns:      ", &self.pawns),
            ("Space:      ", &self.space),
            ("Total:      ", &self.total),
        ] {
            writeln!(
                f,
                "  {label} MG={:+.2}  EG={:+.2}",
                term.total.mg, term.total.eg
            )?;
        }
        write!(f, "  Final (cp):  {:+}", self.final_cp)
    }
}

/// Parses `eval` table lines into a [`ClassicalBreakdown`].
///
/// Empty input yields the all-zero breakdown rather than an error; deciding
/// whether missing output means "unsupported engine" is the protocol
/// layer's job, not the parser's.
pub fn parse_breakdown<'a, I>(lines: I) -> ClassicalBreakdown
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = ClassicalBreakdown::default();

    for line in lines {
        // Header and separator decoration.
        if line.contains("---") || line.contains("Term") || line.contains("MG") {
            continue;
        }
        let Some(caps) = ROW.captures(line) else {
            continue;
        };
        let name = normalize_term(&caps[1]);
        let Some(term) = out.term_mut(&name) else {
            tracing::debug!(term = %name, "unknown eval term, ignoring");
            continue;
        };
        *term = TermScore {
            white: PhaseScore {
                mg: cell(caps.get(2)),
                eg: cell(caps.get(3)),
            },
            black: PhaseScore {
                mg: cell(caps.get(4)),
                eg: cell(caps.get(5)),
            },
            total: PhaseScore {
                mg: cell(caps.get(6)),
                eg: cell(caps.get(7)),
            },
        };
    }

    out.final_cp = ((out.total.total.mg + out.total.total.eg) / 2.0 * 100.0) as i32;
    out
}

fn normalize_term(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn cell(group: Option<regex::Match<'_>>) -> f64 {
    group
        .map(|m| m.as_str())
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
      Term    |    White    |    Black    |    Total
              |   MG    EG  |   MG    EG  |   MG    EG
------------------------------------------------------
    Material |  +4.12 +4.50|  -4.12 -4.50|  +0.00 +0.00
   Imbalance |  +0.02 -0.00|  -0.02 +0.00|  +0.00 +0.00
     Pawns   |  +0.00 +0.00|  -0.12 -0.08|  -0.12 -0.08
     Knights |  -0.15 +0.22|  +0.00 +0.00|  -0.15 +0.22
     Bishops |  +0.00 +0.00|  +0.00 +0.00|  +0.00 +0.00
       Rooks |  +0.00 +0.00|  +0.00 +0.00|  +0.00 +0.00
      Queens |  +0.00 +0.00|  +0.00 +0.00|  +0.00 +0.00
    Mobility |  +0.45 +0.31|  -0.00 -0.00|  +0.45 +0.31
 King safety |  +0.18 -0.04|  +0.00 +0.00|  +0.18 -0.04
     Threats |  +0.12 +0.00|  -0.00 -0.00|  +0.12 +0.00
      Passed |  +0.00 +0.00|  +0.00 +0.00|  +0.00 +0.00
       Space |  +0.08 +0.00|  -0.00 -0.00|  +0.08 +0.00
    Winnable |             |             |  +0.00 +0.00
------------------------------------------------------
       Total |             |             |  +0.56 +0.41";

    #[test]
    fn test_sample_table_values() {
        let b = parse_breakdown(SAMPLE.lines());
        assert_eq!(b.mobility.total.mg, 0.45);
        assert_eq!(b.mobility.total.eg, 0.31);
        assert_eq!(b.king_safety.total.mg, 0.18);
        assert_eq!(b.king_safety.total.eg, -0.04);
        assert_eq!(b.total.total.mg, 0.56);
        assert_eq!(b.total.total.eg, 0.41);
        assert_eq!(b.material.white.mg, 4.12);
        assert_eq!(b.material.black.eg, -4.50);
        assert_eq!(b.knights.total.mg, -0.15);
        assert_eq!(b.pawns.black.eg, -0.08);
    }

    #[test]
    fn test_final_cp_truncates_toward_zero() {
        // (0.56 + 0.41) / 2 * 100 = 48.5 -> 48, not a round to 49.
        let b = parse_breakdown(SAMPLE.lines());
        assert_eq!(b.final_cp, 48);

        let negated = "       Total |             |             |  -0.56 -0.41";
        let b = parse_breakdown([negated]);
        assert_eq!(b.final_cp, -48);
    }

    #[test]
    fn test_blank_cells_read_as_zero() {
        let b = parse_breakdown(SAMPLE.lines());
        assert_eq!(b.winnable.white.mg, 0.0);
        assert_eq!(b.winnable.black.eg, 0.0);
        assert_eq!(b.total.white.mg, 0.0);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let b = parse_breakdown(std::iter::empty());
        assert_eq!(b, ClassicalBreakdown::default());
        assert_eq!(b.final_cp, 0);
    }

    #[test]
    fn test_unknown_terms_ignored() {
        let lines = [
            "       Tempo |  +0.10 +0.10|  -0.10 -0.10|  +0.00 +0.00",
            "    Mobility |  +0.45 +0.31|  -0.00 -0.00|  +0.45 +0.31",
        ];
        let b = parse_breakdown(lines);
        assert_eq!(b.mobility.total.mg, 0.45);
        assert_eq!(b.material, TermScore::default());
    }

    #[test]
    fn test_term_names_case_and_space_insensitive() {
        let lines = ["   KING   SAFETY |  +1.00 +2.00|  +0.00 +0.00|  +1.00 +2.00"];
        let b = parse_breakdown(lines);
        assert_eq!(b.king_safety.total.mg, 1.00);
        assert_eq!(b.king_safety.total.eg, 2.00);
    }

    #[test]
    fn test_garbage_lines_skipped() {
        let lines = [
            "info string this is not a table",
            "| | | |",
            "bestmove e2e4",
            "",
        ];
        let b = parse_breakdown(lines);
        assert_eq!(b, ClassicalBreakdown::default());
    }

    #[test]
    fn test_display_formatting() {
        let b = parse_breakdown(SAMPLE.lines());
        let text = b.to_string();
        assert!(text.contains("Mobility:    MG=+0.45  EG=+0.31"));
        assert!(text.contains("King safety: MG=+0.18  EG=-0.04"));
        assert!(text.contains("Final (cp):  +48"));
    }
}
