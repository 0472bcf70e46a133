use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use super::context::ContextPool;
use crate::aspect::Aspect;
use crate::model::{CheckResult, ResultRecord, TestCase};
use crate::pipeline::CheckPipeline;
use crate::providers::agent::AgentFactory;
use crate::report::progress::{ProgressEvent, ProgressSink};

/// Drives the check pipeline over a test set with bounded parallelism.
#[derive(Debug, Clone)]
pub struct Coordinator {
    pipeline: Arc<CheckPipeline>,
    pool: Arc<ContextPool>,
    test_timeout: Option<Duration>,
}

impl Coordinator {
    pub fn new(pipeline: CheckPipeline, factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            pool: Arc::new(ContextPool::new(factory)),
            test_timeout: None,
        }
    }

    /// Deadline for one test, cache lookup included.
    pub fn with_test_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.test_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Evaluate every test and return one record per test, in input order.
    ///
    /// `concurrency <= 1` evaluates inline, one test at a time. Nothing
    /// escapes: a panicking or timed-out test yields a failing
    /// `code execution` record and its siblings carry on.
    pub async fn evaluate_all(
        &self,
        tests: &[TestCase],
        concurrency: usize,
        progress: Option<ProgressSink>,
    ) -> Vec<ResultRecord> {
        let total = tests.len();
        let groups: BTreeSet<&str> = tests.iter().map(|t| t.group.as_str()).collect();
        info!(
            tests = total,
            groups = groups.len(),
            concurrency,
            "evaluating test set"
        );
        let started = Instant::now();

        let records = if concurrency <= 1 {
            self.evaluate_sequential(tests, progress).await
        } else {
            self.evaluate_parallel(tests, concurrency, progress).await
        };

        info!(
            tests = total,
            contexts = self.pool.created(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluation finished"
        );
        records
    }

    async fn evaluate_sequential(
        &self,
        tests: &[TestCase],
        progress: Option<ProgressSink>,
    ) -> Vec<ResultRecord> {
        let mut records = Vec::with_capacity(tests.len());
        for test in tests {
            let work = evaluate_one(&self.pipeline, &self.pool, test, self.test_timeout);
            let record = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(record) => record,
                Err(payload) => panic_record(test, panic_message(payload.as_ref())),
            };
            records.push(record);
            emit(&progress, records.len(), tests.len());
        }
        records
    }

    async fn evaluate_parallel(
        &self,
        tests: &[TestCase],
        concurrency: usize,
        progress: Option<ProgressSink>,
    ) -> Vec<ResultRecord> {
        let total = tests.len();
        let sem = Arc::new(Semaphore::new(concurrency));
        let mut join_set = JoinSet::new();
        let mut positions = HashMap::with_capacity(total);
        let mut slots: Vec<Option<ResultRecord>> = vec![None; total];
        let mut done = 0;

        for (index, test) in tests.iter().enumerate() {
            // The semaphore is never closed, so a permit always arrives.
            let permit = sem.clone().acquire_owned().await.ok();
            while let Some(res) = join_set.try_join_next_with_id() {
                collect(res, tests, &positions, &mut slots);
                done += 1;
                emit(&progress, done, total);
            }

            let pipeline = Arc::clone(&self.pipeline);
            let pool = Arc::clone(&self.pool);
            let test = test.clone();
            let timeout = self.test_timeout;
            let handle = join_set.spawn(async move {
                let _permit = permit;
                evaluate_one(&pipeline, &pool, &test, timeout).await
            });
            positions.insert(handle.id(), index);
        }

        while let Some(res) = join_set.join_next_with_id().await {
            collect(res, tests, &positions, &mut slots);
            done += 1;
            emit(&progress, done, total);
        }

        slots.into_iter().flatten().collect()
    }
}

/// One unit of work: judgment cache, then a leased context and the stages.
async fn evaluate_one(
    pipeline: &CheckPipeline,
    pool: &Arc<ContextPool>,
    test: &TestCase,
    timeout: Option<Duration>,
) -> ResultRecord {
    let work = async {
        if let Some(record) = pipeline.cached(&test.id).await {
            return record;
        }
        let mut lease = match pool.checkout(&test.group).await {
            Ok(lease) => lease,
            Err(e) => {
                warn!(test_id = %test.id, group = %test.group, error = %e, "agent setup failed");
                return ResultRecord::new(
                    test.id.clone(),
                    vec![CheckResult::fail(
                        Aspect::CodeExecution,
                        format!("agent setup failed: {:#}", e),
                    )],
                );
            }
        };
        let record = pipeline.evaluate(test, lease.agent()).await;
        lease.release();
        record
    };

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(record) => record,
            Err(_) => {
                warn!(test_id = %test.id, secs = limit.as_secs(), "test timed out");
                ResultRecord::new(
                    test.id.clone(),
                    vec![CheckResult::fail(
                        Aspect::CodeExecution,
                        format!("timed out after {}s", limit.as_secs()),
                    )],
                )
            }
        },
        None => work.await,
    }
}

fn collect(
    res: Result<(tokio::task::Id, ResultRecord), JoinError>,
    tests: &[TestCase],
    positions: &HashMap<tokio::task::Id, usize>,
    slots: &mut [Option<ResultRecord>],
) {
    match res {
        Ok((id, record)) => {
            if let Some(&index) = positions.get(&id) {
                slots[index] = Some(record);
            }
        }
        Err(e) => {
            let Some(&index) = positions.get(&e.id()) else {
                warn!(error = %e, "lost track of a failed task");
                return;
            };
            let message = if e.is_panic() {
                panic_message(e.into_panic().as_ref())
            } else {
                "task cancelled".to_string()
            };
            slots[index] = Some(panic_record(&tests[index], message));
        }
    }
}

fn panic_record(test: &TestCase, message: String) -> ResultRecord {
    warn!(test_id = %test.id, %message, "test evaluation panicked");
    ResultRecord::new(
        test.id.clone(),
        vec![CheckResult::fail(
            Aspect::CodeExecution,
            format!("evaluation panicked: {}", message),
        )],
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn emit(progress: &Option<ProgressSink>, done: usize, total: usize) {
    if let Some(sink) = progress {
        sink(ProgressEvent { done, total });
    }
}
