//! Worker Module Tests
//!
//! Verifies the calculator's batch execution, the overload rejection formula
//! (exact points plus statistical convergence with a seeded generator), and
//! the dishonest perturbation bounds.

#[cfg(test)]
mod tests {
    use crate::task::types::{Task, TaskKind, RESULT_MODULUS};
    use crate::worker::calculator::Calculator;
    use crate::worker::{BatchWorker, WorkerCallError};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // ============================================================
    // TEST 1: Honest batch execution
    // ============================================================

    #[tokio::test]
    async fn test_honest_calculator_sums_batch() {
        let calculator = Calculator::new(10, 0.0);
        let batch = vec![
            Task::new(TaskKind::Prime, 5),
            Task::new(TaskKind::Prime, 3),
            Task::new(TaskKind::Pell, 4),
        ];

        let expected: i64 = batch.iter().map(|t| t.execute()).sum::<i64>() % RESULT_MODULUS;

        let result = calculator.execute_batch(batch).await.unwrap();
        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_capacity_reports_configured_value() {
        let calculator = Calculator::new(7, 0.0);
        assert_eq!(BatchWorker::capacity(&calculator).await.unwrap(), 7);
    }

    // ============================================================
    // TEST 2: Rejection probability formula
    // ============================================================

    #[test]
    fn test_rejection_probability_points() {
        let calculator = Calculator::new(4, 0.0);

        // At or under capacity: never rejected.
        assert_eq!(calculator.rejection_probability(0), 0.0);
        assert_eq!(calculator.rejection_probability(4), 0.0);

        // One task over capacity: (5 - 4) / (5 * 4) = 0.05.
        assert!((calculator.rejection_probability(5) - 0.05).abs() < 1e-9);

        // Far over capacity: clamped to 1.
        assert_eq!(calculator.rejection_probability(24), 1.0);
        assert_eq!(calculator.rejection_probability(1000), 1.0);
    }

    #[test]
    fn test_batch_within_capacity_never_rejected() {
        let calculator = Calculator::new(4, 0.0);
        for draw in [0.0, 0.001, 0.5, 0.999] {
            assert!(!calculator.should_reject(4, draw));
        }
    }

    // ============================================================
    // TEST 3: Rejection rate converges to the formula
    // ============================================================

    #[test]
    fn test_rejection_rate_converges() {
        // Capacity 4, batch of 5: documented rate is 0.05.
        let calculator = Calculator::new(4, 0.0);
        let mut rng = StdRng::seed_from_u64(42);

        let trials = 20_000;
        let rejected = (0..trials)
            .filter(|_| calculator.should_reject(5, rng.gen::<f64>()))
            .count();

        let observed = rejected as f64 / trials as f64;
        assert!(
            (observed - 0.05).abs() < 0.01,
            "observed rejection rate {} too far from 0.05",
            observed
        );
    }

    // ============================================================
    // TEST 4: Dishonest mode
    // ============================================================

    #[tokio::test]
    async fn test_always_dishonest_calculator_perturbs_results() {
        let honest = Calculator::new(10, 0.0);
        let liar = Calculator::new(10, 100.0);
        let batch = vec![Task::new(TaskKind::Prime, 12), Task::new(TaskKind::Pell, 6)];

        let truth = honest.execute_batch(batch.clone()).await.unwrap();
        let lied = liar.execute_batch(batch).await.unwrap();

        // The offset is strictly positive and bounded.
        assert_ne!(lied, truth);
        assert!(lied > truth);
        assert!(lied - truth <= 997);
    }

    #[tokio::test]
    async fn test_never_dishonest_calculator_is_consistent() {
        let calculator = Calculator::new(10, 0.0);
        let batch = vec![Task::new(TaskKind::Pell, 9)];

        let first = calculator.execute_batch(batch.clone()).await.unwrap();
        for _ in 0..10 {
            assert_eq!(calculator.execute_batch(batch.clone()).await.unwrap(), first);
        }
    }

    // ============================================================
    // TEST 5: Overload surfaces as a declared rejection
    // ============================================================

    #[tokio::test]
    async fn test_grossly_oversized_batch_is_rejected() {
        // Probability clamps to 1, so the rejection is deterministic.
        let calculator = Calculator::new(2, 0.0);
        let batch = vec![Task::new(TaskKind::Prime, 1); 50];

        let result = calculator.execute_batch(batch).await;
        assert_eq!(result, Err(WorkerCallError::Overloaded));
    }
}
