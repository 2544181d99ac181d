mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use taskboard::config::ExecutorConfig;
use taskboard::constants::DONE_PRIORITY;
use taskboard::{
    AddOutcome, BoardObserver, Executor, ExecutorState, ShutdownSignal, TaskBoard, TaskLookup,
    TaskRecord, TaskStatus, Termination,
};

#[test]
fn parallel_adds_keep_names_unique() {
    let board = Arc::new(TaskBoard::new(usize::MAX));
    let writers = 8;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|writer| {
            let board = Arc::clone(&board);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut inserted = 0;
                for i in 0..200 {
                    // Half the names are shared by every writer
                    let name = if i % 2 == 0 {
                        format!("shared-{i}")
                    } else {
                        format!("writer-{writer}-{i}")
                    };
                    if board.add_task(&name, i64::from(i % 7)).unwrap() == AddOutcome::Inserted {
                        inserted += 1;
                    }
                }
                inserted
            })
        })
        .collect();

    let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // 100 shared names plus 100 private names per writer
    assert_eq!(inserted, 100 + writers * 100);
    assert_eq!(board.len(), inserted);
    let names: HashSet<_> = board.snapshot().tasks.into_iter().map(|t| t.name).collect();
    assert_eq!(names.len(), inserted);
    assert_eq!(board.stats().duplicates as usize, 100 * (writers - 1));
}

#[test]
fn readers_never_observe_partial_completion() {
    let board = Arc::new(TaskBoard::new(usize::MAX));
    let names: Vec<String> = (0..300).map(|i| format!("task-{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        board.add_task(name, (i % 11) as i64).unwrap();
    }

    let running = Arc::new(AtomicBool::new(true));
    let readers: Vec<_> = (0..4)
        .map(|reader| {
            let board = Arc::clone(&board);
            let running = Arc::clone(&running);
            let names = names.clone();
            thread::spawn(move || {
                let mut checks = 0usize;
                let mut i = reader;
                while running.load(Ordering::Acquire) {
                    let name = &names[i % names.len()];
                    let record = board.get(name).unwrap();
                    match record.status {
                        TaskStatus::Done => {
                            assert_eq!(record.priority, DONE_PRIORITY);
                            assert!(record.completed_at.is_some());
                        }
                        TaskStatus::Pending => assert!(record.completed_at.is_none()),
                    }
                    assert_ne!(board.task_state(name), TaskLookup::NotFound);
                    checks += 1;
                    i += 7;
                }
                checks
            })
        })
        .collect();

    let executor = {
        let board = Arc::clone(&board);
        thread::spawn(move || {
            let mut executed = Vec::new();
            while let Some(task) = board.tick().executed {
                executed.push(task.name);
            }
            executed
        })
    };

    let executed = executor.join().unwrap();
    running.store(false, Ordering::Release);
    let checks: usize = readers.into_iter().map(|h| h.join().unwrap()).sum();

    assert_eq!(executed.len(), names.len());
    assert!(checks > 0);
    assert!(names.iter().all(|name| board.is_task_done(name)));
}

#[test]
fn escalation_races_with_execution() {
    let board = Arc::new(common::board_with(
        &[("alpha", 5), ("beta", 5), ("gamma", 5), ("delta", 5)],
        usize::MAX,
    ));

    let escalator = {
        let board = Arc::clone(&board);
        thread::spawn(move || {
            let mut bumps = 0;
            for round in 0..500 {
                let name = ["alpha", "beta", "gamma", "delta"][round % 4];
                if board.increase_priority(name).is_some() {
                    bumps += 1;
                }
            }
            bumps
        })
    };

    let ticker = {
        let board = Arc::clone(&board);
        thread::spawn(move || {
            let mut executed = 0;
            while board.tick().executed.is_some() {
                executed += 1;
            }
            executed
        })
    };

    let bumps = escalator.join().unwrap();
    let executed = ticker.join().unwrap();

    assert_eq!(bumps, 500);
    assert_eq!(executed, 4);
    assert_eq!(board.stats().escalations, 500);
    assert_eq!(board.pending_count(), 0);
}

/// Stalls the first execution report so a second tick can finish its whole
/// locked section in the meantime.
#[derive(Debug, Default)]
struct StallFirstExecution {
    stalled: AtomicBool,
    terminations: parking_lot::Mutex<Vec<Termination>>,
}

impl BoardObserver for StallFirstExecution {
    fn task_executed(&self, _task: &TaskRecord) {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(50));
        }
    }

    fn terminated(&self, termination: &Termination) {
        self.terminations.lock().push(*termination);
    }
}

#[test]
fn concurrent_ticks_signal_the_first_terminal_condition() {
    let observer = Arc::new(StallFirstExecution::default());
    let shutdown = ShutdownSignal::new();
    let executor = Arc::new(Executor::new(
        &ExecutorConfig {
            max_tasks: 2,
            tick_interval_ms: 10,
        },
        shutdown.clone(),
        Arc::clone(&observer) as Arc<dyn BoardObserver>,
    ));
    for (name, priority) in [("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)] {
        executor.add_task(name, priority).unwrap();
    }

    let barrier = Arc::new(Barrier::new(2));
    let tickers: Vec<_> = (0..2)
        .map(|_| {
            let executor = Arc::clone(&executor);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                executor.tick().termination
            })
        })
        .collect();
    let mut seen: Vec<Termination> = tickers
        .into_iter()
        .filter_map(|ticker| ticker.join().unwrap())
        .collect();
    seen.sort_by_key(|termination| match termination {
        Termination::Overloaded { unfinished } => std::cmp::Reverse(*unfinished),
        Termination::Drained { executed } => std::cmp::Reverse(*executed),
    });

    // Whichever tick took the lock first saw four pending and must own the signal
    let first = Termination::Overloaded { unfinished: 4 };
    assert_eq!(seen, vec![first, Termination::Overloaded { unfinished: 3 }]);
    assert_eq!(shutdown.reason(), Some(first));
    assert_eq!(*observer.terminations.lock(), vec![first]);
    assert_eq!(executor.state(), ExecutorState::Overloaded);
}
