use serde::{Deserialize, Serialize};

/// Modulus applied after each task execution to keep results bounded and
/// avoid overflow while accumulating.
pub const RESULT_MODULUS: i64 = 4000;

/// The operation a task performs on its operand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskKind {
    /// Largest prime divisor of the operand (0 when the operand is below 2).
    Prime,
    /// N-th Pell number, reduced modulo `RESULT_MODULUS` at every step.
    Pell,
}

/// An immutable unit of work.
///
/// Tasks travel to workers over HTTP as JSON, so the type is a plain data
/// carrier. Executing a task is deterministic: two honest workers given the
/// same task always produce the same value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub operand: u32,
    pub kind: TaskKind,
}

impl Task {
    pub fn new(kind: TaskKind, operand: u32) -> Self {
        Self { operand, kind }
    }

    /// Runs the task to completion and returns its result, already reduced
    /// modulo `RESULT_MODULUS`.
    pub fn execute(&self) -> i64 {
        let value = match self.kind {
            TaskKind::Prime => largest_prime_divisor(self.operand),
            TaskKind::Pell => pell(self.operand),
        };
        value % RESULT_MODULUS
    }
}

fn largest_prime_divisor(number: u32) -> i64 {
    let mut highest: u32 = 0;

    for candidate in 1..=number {
        if is_prime(candidate) && number % candidate == 0 && candidate > highest {
            highest = candidate;
        }
    }

    highest as i64
}

fn is_prime(x: u32) -> bool {
    if x <= 1 {
        return false;
    }

    for divisor in 2..x {
        if x % divisor == 0 {
            return false;
        }
    }

    true
}

fn pell(number: u32) -> i64 {
    if number == 0 {
        return 0;
    }

    // Iterative form of P(n) = 2*P(n-1) + P(n-2), reduced at each step so the
    // intermediate values stay inside i64 for arbitrary operands.
    let mut previous: i64 = 0;
    let mut current: i64 = 1;

    for _ in 1..number {
        let next = (2 * current + previous) % RESULT_MODULUS;
        previous = current;
        current = next;
    }

    current
}
