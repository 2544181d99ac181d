use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::board::{LockOutcome, TaskSink};
use crate::config::ProducerConfig;
use crate::constants::operations;
use crate::error::{BoardError, Result};
use crate::models::TaskLookup;
use crate::observer::BoardObserver;
use crate::periodic::{run_periodic, PeriodicContext, Step};
use crate::shutdown::ShutdownSignal;

/// Which periodic behaviours a producer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerStrategy {
    /// Dependent: submit new tasks and poll submitted ones for completion.
    SubmitOnly,
    /// Supervisor: everything a dependent does, plus periodically bumping the
    /// priority number of a random submitted task.
    SubmitAndEscalate { escalate_interval: Duration },
}

impl ProducerStrategy {
    pub fn escalates(&self) -> bool {
        matches!(self, ProducerStrategy::SubmitAndEscalate { .. })
    }
}

/// State shared by one producer's periodic callbacks.
struct ProducerState {
    name: String,
    sink: Arc<dyn TaskSink>,
    max_priority: i64,
    lock_timeout: Option<Duration>,
    submitted: Mutex<Vec<String>>,
    submitted_total: AtomicU64,
    rng: Mutex<StdRng>,
}

impl fmt::Debug for ProducerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerState")
            .field("name", &self.name)
            .field("max_priority", &self.max_priority)
            .field("lock_timeout", &self.lock_timeout)
            .field("outstanding", &self.submitted.try_lock().map(|list| list.len()))
            .finish_non_exhaustive()
    }
}

impl ProducerState {
    fn submit_once(&self) -> Result<Option<String>> {
        let (name, priority) = {
            let mut rng = self.rng.lock();
            let tag: u32 = rng.gen();
            (
                format!("{}-task-{tag}", self.name),
                rng.gen_range(1..=self.max_priority),
            )
        };

        let outcome = match self.lock_timeout {
            Some(timeout) => self.sink.try_add_task(&name, priority, timeout)?,
            None => LockOutcome::Acquired(self.sink.add_task(&name, priority)?),
        };
        if outcome.is_skipped() {
            debug!(role = %self.name, task_name = %name, "Submission skipped this cycle");
            return Ok(None);
        }

        let mut submitted = self.submitted.lock();
        if !submitted.contains(&name) {
            submitted.push(name.clone());
        }
        drop(submitted);
        self.submitted_total.fetch_add(1, Ordering::Relaxed);
        Ok(Some(name))
    }

    fn poll_once(&self) -> Option<(String, TaskLookup)> {
        let name = self.pick()?;
        let lookup = self.sink.task_state(&name);
        match lookup {
            TaskLookup::Pending => {}
            TaskLookup::Done | TaskLookup::NotFound => {
                self.submitted.lock().retain(|submitted| submitted != &name);
                debug!(
                    role = %self.name,
                    task_name = %name,
                    state = ?lookup,
                    "Stopped tracking task"
                );
            }
        }
        Some((name, lookup))
    }

    fn escalate_once(&self) -> Option<(String, Option<i64>)> {
        let name = self.pick()?;
        let priority = self.sink.increase_priority(&name);
        Some((name, priority))
    }

    fn pick(&self) -> Option<String> {
        let submitted = self.submitted.lock();
        if submitted.is_empty() {
            return None;
        }
        let index = self.rng.lock().gen_range(0..submitted.len());
        Some(submitted[index].clone())
    }
}

/// A producer role driven by independent periodic timers.
///
/// Dependents and supervisors are the same type configured with a different
/// [`ProducerStrategy`]; the board is reached only through [`TaskSink`].
#[derive(Debug)]
pub struct PeriodicProducer {
    state: Arc<ProducerState>,
    strategy: ProducerStrategy,
    submit_interval: Duration,
    poll_interval: Duration,
    shutdown: ShutdownSignal,
    observer: Arc<dyn BoardObserver>,
}

impl PeriodicProducer {
    pub fn new(
        name: impl Into<String>,
        strategy: ProducerStrategy,
        config: &ProducerConfig,
        sink: Arc<dyn TaskSink>,
        shutdown: ShutdownSignal,
        observer: Arc<dyn BoardObserver>,
    ) -> Self {
        Self {
            state: Arc::new(ProducerState {
                name: name.into(),
                sink,
                max_priority: config.max_priority.max(1),
                lock_timeout: config.lock_timeout(),
                submitted: Mutex::new(Vec::new()),
                submitted_total: AtomicU64::new(0),
                rng: Mutex::new(StdRng::from_entropy()),
            }),
            strategy,
            submit_interval: config.submit_interval(),
            poll_interval: config.poll_interval(),
            shutdown,
            observer,
        }
    }

    /// A producer that submits and polls.
    pub fn dependent(
        name: impl Into<String>,
        config: &ProducerConfig,
        sink: Arc<dyn TaskSink>,
        shutdown: ShutdownSignal,
        observer: Arc<dyn BoardObserver>,
    ) -> Self {
        Self::new(
            name,
            ProducerStrategy::SubmitOnly,
            config,
            sink,
            shutdown,
            observer,
        )
    }

    /// A producer that submits, polls and escalates.
    pub fn supervisor(
        name: impl Into<String>,
        config: &ProducerConfig,
        sink: Arc<dyn TaskSink>,
        shutdown: ShutdownSignal,
        observer: Arc<dyn BoardObserver>,
    ) -> Self {
        let strategy = ProducerStrategy::SubmitAndEscalate {
            escalate_interval: config.escalate_interval(),
        };
        Self::new(name, strategy, config, sink, shutdown, observer)
    }

    /// Replace the entropy-seeded generator, for reproducible task names.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.state.rng.lock() = StdRng::seed_from_u64(seed);
        self
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn strategy(&self) -> ProducerStrategy {
        self.strategy
    }

    /// Submit one new task. Returns its name, or `None` when a bounded-wait
    /// submission was skipped.
    pub fn submit_once(&self) -> Result<Option<String>> {
        self.state.submit_once()
    }

    /// Check one random submitted task; finished (or unknown) tasks are
    /// dropped from the local list.
    pub fn poll_once(&self) -> Option<(String, TaskLookup)> {
        self.state.poll_once()
    }

    /// Bump the priority number of one random submitted task.
    pub fn escalate_once(&self) -> Option<(String, Option<i64>)> {
        self.state.escalate_once()
    }

    pub fn outstanding(&self) -> Vec<String> {
        self.state.submitted.lock().clone()
    }

    pub fn submitted_count(&self) -> u64 {
        self.state.submitted_total.load(Ordering::Relaxed)
    }

    /// Start this producer's timers on the current tokio runtime.
    pub fn spawn(self) -> Result<ProducerHandle> {
        let runtime = Handle::try_current().map_err(|e| {
            BoardError::invalid_state(format!("producer requires a tokio runtime: {e}"))
        })?;

        let mut tasks = Vec::with_capacity(3);

        let state = Arc::clone(&self.state);
        tasks.push(runtime.spawn(run_periodic(
            self.context(operations::SUBMIT, self.submit_interval),
            move || state.submit_once().map(|_| Step::Continue),
        )));

        let state = Arc::clone(&self.state);
        tasks.push(runtime.spawn(run_periodic(
            self.context(operations::POLL, self.poll_interval),
            move || {
                state.poll_once();
                Ok(Step::Continue)
            },
        )));

        if let ProducerStrategy::SubmitAndEscalate { escalate_interval } = self.strategy {
            let state = Arc::clone(&self.state);
            tasks.push(runtime.spawn(run_periodic(
                self.context(operations::ESCALATE, escalate_interval),
                move || {
                    state.escalate_once();
                    Ok(Step::Continue)
                },
            )));
        }

        info!(
            role = %self.state.name,
            strategy = ?self.strategy,
            timers = tasks.len(),
            "Producer started"
        );

        Ok(ProducerHandle {
            producer: self,
            tasks,
        })
    }

    fn context(&self, operation: &'static str, period: Duration) -> PeriodicContext {
        PeriodicContext {
            role: self.state.name.clone(),
            operation,
            period,
            shutdown: self.shutdown.clone(),
            observer: Arc::clone(&self.observer),
        }
    }
}

/// A running producer. The timers stop on shutdown; `join` waits for them.
#[derive(Debug)]
pub struct ProducerHandle {
    producer: PeriodicProducer,
    tasks: Vec<JoinHandle<()>>,
}

impl ProducerHandle {
    pub fn producer(&self) -> &PeriodicProducer {
        &self.producer
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Stop the timers without waiting for shutdown.
    pub fn abort(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    /// Wait for every timer to end and hand back the producer.
    pub async fn join(self) -> PeriodicProducer {
        for task in self.tasks {
            // Aborted timers are an expected way to stop
            let _ = task.await;
        }
        self.producer
    }
}
