/// Output formatting: terminal table and JSON.
use rankboard_core::RankedMember;
use serde::Serialize;

#[derive(Serialize)]
struct JsonListing<'a> {
    leaderboard: &'a str,
    total_members: u64,
    members: &'a [RankedMember],
}

/// Print a listing as a formatted terminal table.
pub fn print_table(leaderboard: &str, members: &[RankedMember], total_members: u64) {
    if members.is_empty() {
        println!("(no members)");
        return;
    }

    let name_width = name_width(members);
    let rank_width = members
        .iter()
        .map(|m| m.rank.to_string().len())
        .max()
        .unwrap_or(1)
        .max(4);

    println!("{:>rank_width$} | {:<name_width$} | {:>12}", "Rank", "Member", "Score");
    println!("{}-|-{}-|-{}", "-".repeat(rank_width), "-".repeat(name_width), "-".repeat(12));

    for m in members {
        let score = match m.score {
            Some(score) => format_score(score),
            None => "-".to_string(),
        };
        println!("{:>rank_width$} | {:<name_width$} | {:>12}", m.rank, m.member, score);
    }

    println!("\n{} of {} members of {}", members.len(), total_members, leaderboard);
}

/// Widest member id in characters, at least as wide as "Member".
/// Padding in `format!` counts chars, so byte length would misalign non-ASCII ids.
fn name_width(members: &[RankedMember]) -> usize {
    members
        .iter()
        .map(|m| m.member.chars().count())
        .max()
        .unwrap_or(6)
        .max(6)
}

/// Print a listing as JSON.
pub fn print_json(leaderboard: &str, members: &[RankedMember], total_members: u64) {
    let output = JsonListing {
        leaderboard,
        total_members,
        members,
    };
    print_value(&output);
}

/// Print any serializable value as pretty JSON.
pub fn print_value<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => crate::bail(format!("Failed to serialize output: {e}")),
    }
}

/// Whole numbers print without a fractional part.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        format!("{score}")
    }
}
