//! Input Parsing
//!
//! Reads line-oriented task descriptions, one task per line:
//!
//! ```text
//! prime 42
//! pell 7
//! ```
//!
//! Unknown keywords, malformed lines, and negative operands are diagnosed and
//! skipped; a bad line never aborts the whole run.

use super::types::{Task, TaskKind};
use std::io::BufRead;

/// Reads every line of `input` and returns the parsed tasks, last line on top
/// (the pending pool is stack-like and order is irrelevant to correctness).
///
/// Returns an error only when reading the underlying stream fails.
pub fn parse_tasks(input: impl BufRead) -> std::io::Result<Vec<Task>> {
    let mut tasks = Vec::new();

    for line in input.lines() {
        let line = line?;
        match parse_line(&line) {
            Some(task) => tasks.push(task),
            None => {
                if !line.trim().is_empty() {
                    tracing::warn!("Invalid line skipped: {:?}", line);
                }
            }
        }
    }

    Ok(tasks)
}

/// Parses a single `<keyword> <non-negative-integer>` line.
fn parse_line(line: &str) -> Option<Task> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() != 2 {
        return None;
    }

    // u32 parsing already rejects negative operands.
    let operand: u32 = fields[1].parse().ok()?;

    let kind = match fields[0] {
        "prime" => TaskKind::Prime,
        "pell" => TaskKind::Pell,
        _ => return None,
    };

    Some(Task::new(kind, operand))
}
