//! # Board Simulation
//!
//! Wires one executor, a set of dependents and a set of supervisors around a
//! shared shutdown signal and runs them until the board drains, overloads or
//! the optional deadline passes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{self, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::board::{BoardSnapshot, TaskSink};
use crate::config::BoardConfig;
use crate::error::Result;
use crate::executor::{Executor, ExecutorState};
use crate::observer::{BoardObserver, TracingObserver};
use crate::roles::{PeriodicProducer, ProducerHandle};
use crate::shutdown::{ShutdownSignal, Termination};
use crate::stats::BoardStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerSummary {
    pub name: String,
    pub escalates: bool,
    pub submitted: u64,
    pub outstanding: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub executor_id: Uuid,
    /// `None` when the deadline passed before a terminal condition
    pub termination: Option<Termination>,
    /// Executor state observed just before disposal
    pub final_state: ExecutorState,
    pub elapsed_ms: u64,
    pub stats: BoardStats,
    pub producers: Vec<ProducerSummary>,
    pub board: BoardSnapshot,
}

#[derive(Debug)]
pub struct Simulation {
    config: BoardConfig,
    observer: Arc<dyn BoardObserver>,
}

impl Simulation {
    pub fn new(config: BoardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn BoardObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub async fn run(self) -> Result<SimulationReport> {
        let started = Instant::now();
        let shutdown = ShutdownSignal::new();
        let executor = Arc::new(Executor::spawn(
            &self.config.executor,
            shutdown.clone(),
            Arc::clone(&self.observer),
        )?);

        info!(
            executor_id = %executor.id(),
            dependents = self.config.simulation.dependents,
            supervisors = self.config.simulation.supervisors,
            "🚀 Simulation started"
        );

        let handles = self.spawn_producers(&executor, &shutdown)?;

        let termination = match self.config.simulation.deadline() {
            Some(deadline) => match time::timeout(deadline, shutdown.wait()).await {
                Ok(()) => shutdown.reason(),
                Err(_) => None,
            },
            None => {
                shutdown.wait().await;
                shutdown.reason()
            }
        };

        if termination.is_some() {
            // Let the tick loop settle into its terminal state
            executor.join().await;
        } else {
            warn!(
                deadline_ms = ?self.config.simulation.deadline_ms,
                "Simulation deadline passed before the board terminated"
            );
            for handle in &handles {
                handle.abort();
            }
        }

        let final_state = executor.state();
        executor.dispose();

        let mut producers = Vec::with_capacity(handles.len());
        for handle in handles {
            let producer = handle.join().await;
            producers.push(ProducerSummary {
                name: producer.name().to_string(),
                escalates: producer.strategy().escalates(),
                submitted: producer.submitted_count(),
                outstanding: producer.outstanding().len(),
            });
        }

        let report = SimulationReport {
            executor_id: executor.id(),
            termination,
            final_state,
            elapsed_ms: started.elapsed().as_millis() as u64,
            stats: executor.stats(),
            producers,
            board: executor.snapshot(),
        };

        info!(
            termination = ?report.termination,
            executed = report.stats.executed,
            pending = report.board.pending,
            elapsed_ms = report.elapsed_ms,
            "🏁 Simulation finished"
        );
        Ok(report)
    }

    fn spawn_producers(
        &self,
        executor: &Arc<Executor>,
        shutdown: &ShutdownSignal,
    ) -> Result<Vec<ProducerHandle>> {
        let sink: Arc<dyn TaskSink> = Arc::clone(executor) as Arc<dyn TaskSink>;
        let simulation = &self.config.simulation;
        let mut handles = Vec::with_capacity(simulation.dependents + simulation.supervisors);

        for index in 1..=simulation.dependents {
            let producer = PeriodicProducer::dependent(
                format!("dependent-{index}"),
                &self.config.dependent,
                Arc::clone(&sink),
                shutdown.clone(),
                Arc::clone(&self.observer),
            );
            handles.push(producer.spawn()?);
        }

        for index in 1..=simulation.supervisors {
            let producer = PeriodicProducer::supervisor(
                format!("supervisor-{index}"),
                &self.config.supervisor,
                Arc::clone(&sink),
                shutdown.clone(),
                Arc::clone(&self.observer),
            );
            handles.push(producer.spawn()?);
        }

        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExecutorConfig, ProducerConfig, SimulationConfig};
    use crate::observer::NoopObserver;

    fn producer(submit_interval_ms: u64) -> ProducerConfig {
        ProducerConfig {
            submit_interval_ms,
            poll_interval_ms: submit_interval_ms * 3,
            escalate_interval_ms: submit_interval_ms * 2,
            max_priority: 5,
            lock_timeout_ms: None,
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = BoardConfig::default();
        config.executor.max_tasks = 0;
        assert!(Simulation::new(config).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_executor_drains() {
        let config = BoardConfig {
            executor: ExecutorConfig {
                max_tasks: 10,
                tick_interval_ms: 10,
            },
            dependent: producer(95),
            supervisor: producer(95),
            simulation: SimulationConfig {
                dependents: 1,
                supervisors: 0,
                deadline_ms: Some(5_000),
            },
            ..BoardConfig::default()
        };

        let report = Simulation::new(config)
            .unwrap()
            .with_observer(Arc::new(NoopObserver))
            .run()
            .await
            .unwrap();

        assert!(matches!(report.termination, Some(Termination::Drained { .. })));
        assert_eq!(report.final_state, ExecutorState::Draining);
        assert_eq!(report.board.pending, 0);
        assert_eq!(report.producers.len(), 1);
        assert!(!report.producers[0].escalates);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_executor_overloads() {
        let config = BoardConfig {
            executor: ExecutorConfig {
                max_tasks: 5,
                tick_interval_ms: 1_000,
            },
            dependent: producer(45),
            supervisor: producer(45),
            simulation: SimulationConfig {
                dependents: 2,
                supervisors: 1,
                deadline_ms: Some(10_000),
            },
            ..BoardConfig::default()
        };

        let report = Simulation::new(config)
            .unwrap()
            .with_observer(Arc::new(NoopObserver))
            .run()
            .await
            .unwrap();

        let Some(Termination::Overloaded { unfinished }) = report.termination else {
            panic!("expected overload, got {:?}", report.termination);
        };
        assert!(unfinished > 5);
        assert!(unfinished <= report.board.pending);
        assert_eq!(report.final_state, ExecutorState::Overloaded);
        assert_eq!(report.stats.executed, 1);
        assert_eq!(report.producers.iter().filter(|p| p.escalates).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_without_producers() {
        let config = BoardConfig {
            simulation: SimulationConfig {
                dependents: 0,
                supervisors: 0,
                deadline_ms: Some(2_000),
            },
            ..BoardConfig::default()
        };

        let report = Simulation::new(config)
            .unwrap()
            .with_observer(Arc::new(NoopObserver))
            .run()
            .await
            .unwrap();

        assert!(report.termination.is_none());
        assert_eq!(report.final_state, ExecutorState::Running);
        assert!(report.elapsed_ms >= 2_000);
        assert_eq!(report.board.total, 0);
    }
}
