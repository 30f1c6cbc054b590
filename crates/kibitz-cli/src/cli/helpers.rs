use kibitz_core::{EvaluationResult, Score};

/// Engine score in conventional notation: signed pawns with two decimals,
/// `#n` for mate in n (negative when the side to move gets mated).
pub fn format_score(score: Option<Score>) -> String {
    match score {
        Some(Score::Cp(cp)) => format!("{:+.2}", f64::from(cp) / 100.0),
        Some(Score::Mate(n)) => format!("#{n}"),
        None => "-".to_string(),
    }
}

pub fn print_result(result: &EvaluationResult) {
    if result.is_empty() {
        println!("no legal moves (checkmate or stalemate)");
        return;
    }
    println!(
        "{}  depth {}  pv {}",
        format_score(result.score),
        result.depth,
        result.best_line.join(" ")
    );
    for (i, alt) in result.alternatives.iter().enumerate() {
        println!(
            "  multipv {}: {}  pv {}",
            i + 2,
            format_score(alt.score),
            alt.best_line.join(" ")
        );
    }
}

pub fn print_batch_line(fen: &str, result: &EvaluationResult) {
    if result.is_empty() {
        println!("{fen}  no legal moves");
    } else {
        println!(
            "{fen}  {}  depth {}",
            format_score(result.score),
            result.depth
        );
    }
}
