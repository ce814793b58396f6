//! Plain-text rendering of a split session.

use std::fmt::Write;

use engine::{CheckSummary, LineShare, SplitMode, SplitSession};

fn check_block(out: &mut String, check: &CheckSummary) {
    let seat = check
        .seat
        .map(|seat| format!(" (seat {seat})"))
        .unwrap_or_default();
    let _ = writeln!(out, "Check {}{seat}", check.check_id);
    for line in &check.lines {
        let share = match line.share {
            LineShare::Whole { quantity } if quantity > 1 => format!("{quantity} x "),
            LineShare::Whole { .. } => String::new(),
            LineShare::Claim { part, of } => format!("[{part}/{of}] "),
        };
        let name = match &line.category {
            Some(category) => format!("{} ({category})", line.name),
            None => line.name.clone(),
        };
        let _ = writeln!(out, "  {share}{name:<28} {:>9}", line.amount);
    }
    let _ = writeln!(out, "  {:<28} {:>9}", "subtotal", check.subtotal);
    if !check.tax.is_zero() {
        let _ = writeln!(out, "  {:<28} {:>9}", "tax", check.tax);
    }
    let _ = writeln!(out, "  {:<28} {:>9}", "total", check.total);
}

pub fn session(session: &SplitSession) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Order {} ({} mode), total {}",
        session.order_id(),
        session.mode(),
        session.original_total()
    );

    if session.mode() == SplitMode::Even {
        match session.even_split() {
            Ok(split) => {
                for (idx, share) in split.shares.iter().enumerate() {
                    let _ = writeln!(out, "Share {} of {}: {share}", idx + 1, split.num_ways);
                }
            }
            Err(err) => {
                let _ = writeln!(out, "cannot split evenly: {err}");
            }
        }
    } else {
        for check in session.checks() {
            check_block(&mut out, check);
        }
    }

    if session.has_integrity_issue() {
        let _ = writeln!(out, "Issues:");
        for issue in session.issues() {
            let _ = writeln!(out, "  {issue}");
        }
    }
    out
}
