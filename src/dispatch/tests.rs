//! Dispatch Module Tests
//!
//! Exercises the dispatcher against scripted in-process workers covering the
//! full fault model: honest workers, declared overloads, crashes mid-run,
//! dead capacity probes, and workers that silently corrupt results.
//!
//! ## Test Scopes
//! - **Queue / Pool**: batch popping, requeueing, and worker selection.
//! - **Notifier**: pairing, buffering of early finishers, FIFO delivery.
//! - **Strategies**: reference-sum equality, requeue idempotence, eviction,
//!   cross-check rejection of liars, and the fatal worker-exhaustion path.

#[cfg(test)]
mod tests {
    use crate::dispatch::dispatcher::{DispatchError, Dispatcher, WorkerSource};
    use crate::dispatch::notifier::CompletionNotifier;
    use crate::dispatch::pool::{WorkerHandle, WorkerPool};
    use crate::dispatch::queue::TaskQueue;
    use crate::dispatch::runner::{BatchOutcome, CompletedBatch};
    use crate::dispatch::strategy::{CollectError, DispatchStrategy};
    use crate::dispatch::trusting::TrustingStrategy;
    use crate::dispatch::verifying::VerifyingStrategy;
    use crate::task::types::{Task, TaskKind, RESULT_MODULUS};
    use crate::worker::{BatchWorker, WorkerCallError};

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // ============================================================
    // Scripted worker and worker source
    // ============================================================

    /// How a scripted worker behaves across the run.
    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        /// Computes every batch correctly.
        Honest,
        /// Completes every batch but perturbs the sum. Never signals anything.
        Lies,
        /// Capacity probes succeed; every execution fails at the transport.
        ExecutionsFail,
        /// Dead on arrival: even the capacity probe fails.
        CapacityFails,
        /// Declares itself overloaded for the first N executions, honest after.
        RejectsFirst(usize),
        /// Honest for N executions, then unreachable (probe included).
        DiesAfter(usize),
    }

    struct ScriptedWorker {
        capacity: usize,
        behavior: Behavior,
        executions: AtomicUsize,
    }

    impl ScriptedWorker {
        fn new(capacity: usize, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                capacity,
                behavior,
                executions: AtomicUsize::new(0),
            })
        }

        fn executions(&self) -> usize {
            self.executions.load(Ordering::SeqCst)
        }
    }

    fn honest_sum(batch: &[Task]) -> i64 {
        batch.iter().map(Task::execute).sum::<i64>() % RESULT_MODULUS
    }

    impl BatchWorker for ScriptedWorker {
        async fn execute_batch(&self, batch: Vec<Task>) -> Result<i64, WorkerCallError> {
            let call = self.executions.fetch_add(1, Ordering::SeqCst);

            match self.behavior {
                Behavior::Honest | Behavior::CapacityFails => Ok(honest_sum(&batch)),
                Behavior::Lies => Ok(honest_sum(&batch) + 7),
                Behavior::ExecutionsFail => {
                    Err(WorkerCallError::Unreachable("connection reset".to_string()))
                }
                Behavior::RejectsFirst(count) => {
                    if call < count {
                        Err(WorkerCallError::Overloaded)
                    } else {
                        Ok(honest_sum(&batch))
                    }
                }
                Behavior::DiesAfter(count) => {
                    if call < count {
                        Ok(honest_sum(&batch))
                    } else {
                        Err(WorkerCallError::Unreachable("connection reset".to_string()))
                    }
                }
            }
        }

        async fn capacity(&self) -> Result<usize, WorkerCallError> {
            match self.behavior {
                Behavior::CapacityFails => {
                    Err(WorkerCallError::Unreachable("connection refused".to_string()))
                }
                Behavior::DiesAfter(count) if self.executions() >= count => {
                    Err(WorkerCallError::Unreachable("connection refused".to_string()))
                }
                _ => Ok(self.capacity),
            }
        }
    }

    /// In-memory worker source recording evictions for assertions.
    struct TestSource {
        workers: Vec<WorkerHandle<ScriptedWorker>>,
        evicted: Arc<Mutex<Vec<String>>>,
    }

    impl TestSource {
        fn new(workers: Vec<(&str, Arc<ScriptedWorker>)>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let evicted = Arc::new(Mutex::new(Vec::new()));
            let source = Self {
                workers: workers
                    .into_iter()
                    .map(|(name, worker)| WorkerHandle::new(name, worker))
                    .collect(),
                evicted: evicted.clone(),
            };
            (source, evicted)
        }
    }

    impl WorkerSource for TestSource {
        type Worker = ScriptedWorker;

        fn discover(&self) -> Vec<WorkerHandle<ScriptedWorker>> {
            self.workers.clone()
        }

        fn evict(&self, name: &str) {
            self.evicted.lock().unwrap().push(name.to_string());
        }
    }

    /// Renders tasks back into the line format `calculate_operations` reads.
    fn input_for(tasks: &[Task]) -> String {
        tasks
            .iter()
            .map(|task| {
                let keyword = match task.kind {
                    TaskKind::Prime => "prime",
                    TaskKind::Pell => "pell",
                };
                format!("{} {}\n", keyword, task.operand)
            })
            .collect()
    }

    fn mixed_tasks() -> Vec<Task> {
        (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    Task::new(TaskKind::Prime, 30 + i)
                } else {
                    Task::new(TaskKind::Pell, i)
                }
            })
            .collect()
    }

    // ============================================================
    // TEST 1: TaskQueue
    // ============================================================

    #[test]
    fn test_queue_pop_clamps_to_remaining() {
        let mut queue = TaskQueue::from_tasks(vec![Task::new(TaskKind::Prime, 1); 3]);

        assert_eq!(queue.pop_batch(2).len(), 2);
        assert_eq!(queue.pop_batch(10).len(), 1);
        assert!(queue.is_empty());
        assert!(queue.pop_batch(5).is_empty());
    }

    #[test]
    fn test_queue_push_returns_tasks_to_pool() {
        let mut queue = TaskQueue::from_tasks(vec![Task::new(TaskKind::Pell, 2); 2]);

        let batch = queue.pop_batch(2);
        assert!(queue.is_empty());

        queue.push_batch(&batch);
        assert_eq!(queue.len(), 2);
    }

    // ============================================================
    // TEST 2: WorkerPool selection
    // ============================================================

    #[test]
    fn test_pool_distinct_pair_is_distinct() {
        let pool = WorkerPool::new(vec![
            WorkerHandle::new("calculator-a", ScriptedWorker::new(4, Behavior::Honest)),
            WorkerHandle::new("calculator-b", ScriptedWorker::new(4, Behavior::Honest)),
        ]);

        for _ in 0..50 {
            let (first, second) = pool.pick_distinct_pair().unwrap();
            assert_ne!(first.name, second.name);
        }
    }

    #[test]
    fn test_pool_distinct_pair_needs_two_workers() {
        let pool = WorkerPool::new(vec![WorkerHandle::new(
            "calculator-a",
            ScriptedWorker::new(4, Behavior::Honest),
        )]);

        assert!(pool.pick_distinct_pair().is_none());
    }

    #[test]
    fn test_pool_remove() {
        let mut pool = WorkerPool::new(vec![
            WorkerHandle::new("calculator-a", ScriptedWorker::new(4, Behavior::Honest)),
            WorkerHandle::new("calculator-b", ScriptedWorker::new(4, Behavior::Honest)),
        ]);

        assert!(pool.remove("calculator-a"));
        assert!(!pool.remove("calculator-a"));
        assert_eq!(pool.len(), 1);
    }

    // ============================================================
    // TEST 3: CompletionNotifier pairing
    // ============================================================

    fn completion(group: u64, worker: &str, outcome: BatchOutcome) -> CompletedBatch {
        CompletedBatch {
            group,
            worker: worker.to_string(),
            batch: Arc::new(vec![Task::new(TaskKind::Prime, 2)]),
            outcome,
        }
    }

    #[tokio::test]
    async fn test_notifier_surfaces_group_only_when_whole() {
        let mut notifier = CompletionNotifier::new();
        let (group, tx) = notifier.begin_group(2);

        tx.send(completion(group, "calculator-a", BatchOutcome::Completed(1)))
            .unwrap();

        // The partner finishes later, from another task.
        let tx_partner = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            tx_partner
                .send(completion(group, "calculator-b", BatchOutcome::Completed(1)))
                .unwrap();
        });

        let pair = notifier.next_complete_group().await;
        assert_eq!(pair.len(), 2);
        assert!(!notifier.has_outstanding());
    }

    #[tokio::test]
    async fn test_notifier_delivers_groups_in_completion_order() {
        let mut notifier = CompletionNotifier::new();
        let (first_group, tx) = notifier.begin_group(1);
        let (second_group, _) = notifier.begin_group(1);

        // The later-launched group completes first.
        tx.send(completion(second_group, "calculator-b", BatchOutcome::Completed(2)))
            .unwrap();
        tx.send(completion(first_group, "calculator-a", BatchOutcome::Completed(1)))
            .unwrap();

        let first_out = notifier.next_complete_group().await;
        assert_eq!(first_out[0].group, second_group);

        let second_out = notifier.next_complete_group().await;
        assert_eq!(second_out[0].group, first_group);
        assert!(!notifier.has_outstanding());
    }

    #[tokio::test]
    async fn test_notifier_buffers_early_finisher_of_incomplete_group() {
        let mut notifier = CompletionNotifier::new();
        let (pair_group, tx) = notifier.begin_group(2);
        let (solo_group, _) = notifier.begin_group(1);

        // Half of the pair arrives first, then the whole solo group.
        tx.send(completion(pair_group, "calculator-a", BatchOutcome::Completed(1)))
            .unwrap();
        tx.send(completion(solo_group, "calculator-c", BatchOutcome::Completed(3)))
            .unwrap();

        let solo_out = notifier.next_complete_group().await;
        assert_eq!(solo_out[0].group, solo_group);

        tx.send(completion(pair_group, "calculator-b", BatchOutcome::Rejected))
            .unwrap();

        let pair_out = notifier.next_complete_group().await;
        assert_eq!(pair_out.len(), 2);
        assert_eq!(pair_out[0].group, pair_group);
    }

    // ============================================================
    // TEST 4: Both strategies match the single-threaded reference
    // ============================================================

    #[tokio::test]
    async fn test_trusting_matches_reference_sum() {
        let tasks = mixed_tasks();
        let expected = tasks.iter().map(Task::execute).sum::<i64>() % RESULT_MODULUS;

        let (source, _) = TestSource::new(vec![
            ("calculator-a", ScriptedWorker::new(3, Behavior::Honest)),
            ("calculator-b", ScriptedWorker::new(5, Behavior::Honest)),
            ("calculator-c", ScriptedWorker::new(8, Behavior::Honest)),
        ]);

        let mut dispatcher = Dispatcher::new(source, TrustingStrategy::new());
        let result = dispatcher
            .calculate_operations(input_for(&tasks).as_bytes())
            .await
            .unwrap();

        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_verifying_matches_reference_sum() {
        let tasks = mixed_tasks();
        let expected = tasks.iter().map(Task::execute).sum::<i64>() % RESULT_MODULUS;

        let (source, _) = TestSource::new(vec![
            ("calculator-a", ScriptedWorker::new(3, Behavior::Honest)),
            ("calculator-b", ScriptedWorker::new(5, Behavior::Honest)),
            ("calculator-c", ScriptedWorker::new(8, Behavior::Honest)),
        ]);

        let mut dispatcher = Dispatcher::new(source, VerifyingStrategy::new());
        let result = dispatcher
            .calculate_operations(input_for(&tasks).as_bytes())
            .await
            .unwrap();

        assert_eq!(result, expected);
    }

    #[tokio::test]
    async fn test_single_trusting_worker_scenario() {
        // prime 5 + prime 3 on one well-behaved worker of capacity 10.
        let (source, _) = TestSource::new(vec![(
            "calculator-a",
            ScriptedWorker::new(10, Behavior::Honest),
        )]);

        let mut dispatcher = Dispatcher::new(source, TrustingStrategy::new());
        let result = dispatcher
            .calculate_operations("prime 5\nprime 3\n".as_bytes())
            .await
            .unwrap();

        assert_eq!(result, (5 + 3) % RESULT_MODULUS);
    }

    #[tokio::test]
    async fn test_empty_input_accumulates_nothing() {
        let (source, _) = TestSource::new(vec![]);
        let mut dispatcher = Dispatcher::new(source, TrustingStrategy::new());

        let result = dispatcher.calculate_operations("".as_bytes()).await.unwrap();
        assert_eq!(result, 0);
    }

    // ============================================================
    // TEST 5: Minimum pool size is fatal
    // ============================================================

    #[tokio::test]
    async fn test_trusting_fails_without_workers() {
        let (source, _) = TestSource::new(vec![]);
        let mut dispatcher = Dispatcher::new(source, TrustingStrategy::new());

        let result = dispatcher.calculate_operations("prime 5\n".as_bytes()).await;

        assert!(matches!(result, Err(DispatchError::InsufficientWorkers)));
    }

    #[tokio::test]
    async fn test_verifying_needs_two_workers() {
        // One worker cannot cross-check itself.
        let (source, _) = TestSource::new(vec![(
            "calculator-a",
            ScriptedWorker::new(10, Behavior::Honest),
        )]);

        let mut dispatcher = Dispatcher::new(source, VerifyingStrategy::new());
        let result = dispatcher.calculate_operations("prime 5\n".as_bytes()).await;

        assert!(matches!(result, Err(DispatchError::InsufficientWorkers)));
    }

    // ============================================================
    // TEST 6: Benign faults - overload and death
    // ============================================================

    #[tokio::test]
    async fn test_overloaded_batches_are_requeued_and_executed_once() {
        let tasks = mixed_tasks();
        let expected = tasks.iter().map(Task::execute).sum::<i64>() % RESULT_MODULUS;

        // Rejects its first three batches, then accepts. The worker stays in
        // the pool the whole time and every task lands in the result exactly
        // once despite the redistributions.
        let worker = ScriptedWorker::new(30, Behavior::RejectsFirst(3));
        let (source, evicted) = TestSource::new(vec![("calculator-a", worker.clone())]);

        let mut dispatcher = Dispatcher::new(source, TrustingStrategy::new());
        let result = dispatcher
            .calculate_operations(input_for(&tasks).as_bytes())
            .await
            .unwrap();

        assert_eq!(result, expected);
        assert!(worker.executions() >= 4);
        assert!(evicted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trusting_evicts_dead_worker_and_recovers() {
        let tasks = mixed_tasks();
        let expected = tasks.iter().map(Task::execute).sum::<i64>() % RESULT_MODULUS;

        let (source, evicted) = TestSource::new(vec![
            ("calculator-dead", ScriptedWorker::new(6, Behavior::ExecutionsFail)),
            ("calculator-b", ScriptedWorker::new(6, Behavior::Honest)),
        ]);

        let mut dispatcher = Dispatcher::new(source, TrustingStrategy::new());
        let result = dispatcher
            .calculate_operations(input_for(&tasks).as_bytes())
            .await
            .unwrap();

        assert_eq!(result, expected);
        assert!(evicted
            .lock()
            .unwrap()
            .contains(&"calculator-dead".to_string()));
    }

    #[tokio::test]
    async fn test_failed_capacity_probe_evicts_without_consuming_tasks() {
        let tasks = mixed_tasks();
        let expected = tasks.iter().map(Task::execute).sum::<i64>() % RESULT_MODULUS;

        let dead = ScriptedWorker::new(6, Behavior::CapacityFails);
        let (source, evicted) = TestSource::new(vec![
            ("calculator-dead", dead.clone()),
            ("calculator-b", ScriptedWorker::new(6, Behavior::Honest)),
        ]);

        let mut dispatcher = Dispatcher::new(source, TrustingStrategy::new());
        let result = dispatcher
            .calculate_operations(input_for(&tasks).as_bytes())
            .await
            .unwrap();

        assert_eq!(result, expected);
        // The probe failed before any batch was committed to the worker.
        assert_eq!(dead.executions(), 0);
        assert!(evicted
            .lock()
            .unwrap()
            .contains(&"calculator-dead".to_string()));
    }

    // ============================================================
    // TEST 7: Byzantine faults - the verifying cross-check
    // ============================================================

    #[tokio::test]
    async fn test_verifying_disagreement_requeues_once_and_blames_neither() {
        let pool = WorkerPool::new(vec![
            WorkerHandle::new("calculator-liar", ScriptedWorker::new(10, Behavior::Lies)),
            WorkerHandle::new("calculator-honest", ScriptedWorker::new(10, Behavior::Honest)),
        ]);
        let mut queue = TaskQueue::from_tasks(vec![Task::new(TaskKind::Prime, 12); 4]);
        let mut strategy = VerifyingStrategy::new();

        DispatchStrategy::<ScriptedWorker>::launch_batch(&mut strategy, &pool, &mut queue)
            .await
            .unwrap();
        assert!(queue.is_empty());

        let outcome =
            DispatchStrategy::<ScriptedWorker>::collect_result(&mut strategy, &mut queue).await;

        assert_eq!(outcome, Err(CollectError::Disagreement));
        // The shared batch went back exactly once, not once per member.
        assert_eq!(queue.len(), 4);
        assert!(!DispatchStrategy::<ScriptedWorker>::has_pending_results(
            &strategy
        ));
    }

    #[tokio::test]
    async fn test_verifying_never_accepts_a_liar() {
        // The liar corrupts every result, so no pair ever agrees. Once the
        // honest worker dies the pool is down to the liar alone and the call
        // must end in InsufficientWorkers, never in a wrong total.
        let liar = ScriptedWorker::new(50, Behavior::Lies);
        let honest = ScriptedWorker::new(50, Behavior::DiesAfter(5));

        let (source, evicted) = TestSource::new(vec![
            ("calculator-liar", liar.clone()),
            ("calculator-honest", honest.clone()),
        ]);

        let mut dispatcher = Dispatcher::new(source, VerifyingStrategy::new());
        let result = dispatcher
            .calculate_operations("prime 12\npell 6\n".as_bytes())
            .await;

        assert!(matches!(result, Err(DispatchError::InsufficientWorkers)));
        assert!(evicted
            .lock()
            .unwrap()
            .contains(&"calculator-honest".to_string()));
        // Every round had to go through the honest worker; the liar alone
        // never produced an accepted batch.
        assert!(honest.executions() >= 5);
    }

    #[tokio::test]
    async fn test_verifying_accepts_once_liar_turns_honest() {
        // One worker lies on its first batch only: the corrupted round is
        // discarded and retried, and the final total is still the reference
        // sum with every task counted exactly once.
        struct LiesOnce {
            lies_first: bool,
            inner: Arc<ScriptedWorker>,
        }

        impl BatchWorker for LiesOnce {
            async fn execute_batch(&self, batch: Vec<Task>) -> Result<i64, WorkerCallError> {
                let call = self.inner.executions.fetch_add(1, Ordering::SeqCst);
                if self.lies_first && call == 0 {
                    Ok(honest_sum(&batch) + 7)
                } else {
                    Ok(honest_sum(&batch))
                }
            }

            async fn capacity(&self) -> Result<usize, WorkerCallError> {
                Ok(self.inner.capacity)
            }
        }

        struct LiesOnceSource {
            workers: Vec<WorkerHandle<LiesOnce>>,
        }

        impl WorkerSource for LiesOnceSource {
            type Worker = LiesOnce;

            fn discover(&self) -> Vec<WorkerHandle<LiesOnce>> {
                self.workers.clone()
            }

            fn evict(&self, _name: &str) {}
        }

        let tasks = vec![
            Task::new(TaskKind::Prime, 12),
            Task::new(TaskKind::Pell, 6),
            Task::new(TaskKind::Prime, 97),
        ];
        let expected = tasks.iter().map(Task::execute).sum::<i64>() % RESULT_MODULUS;

        let source = LiesOnceSource {
            workers: vec![
                WorkerHandle::new(
                    "calculator-a",
                    Arc::new(LiesOnce {
                        lies_first: true,
                        inner: ScriptedWorker::new(50, Behavior::Honest),
                    }),
                ),
                WorkerHandle::new(
                    "calculator-b",
                    Arc::new(LiesOnce {
                        lies_first: false,
                        inner: ScriptedWorker::new(50, Behavior::Honest),
                    }),
                ),
            ],
        };

        let mut dispatcher = Dispatcher::new(source, VerifyingStrategy::new());
        let result = dispatcher
            .calculate_operations(input_for(&tasks).as_bytes())
            .await
            .unwrap();

        assert_eq!(result, expected);
    }
}
