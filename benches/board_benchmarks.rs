use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::sync::Arc;
use std::thread;
use taskboard::TaskBoard;

fn filled_board(count: usize) -> TaskBoard {
    let board = TaskBoard::new(usize::MAX);
    for i in 0..count {
        let _ = board.add_task(&format!("task-{i}"), (i % 10) as i64);
    }
    board
}

fn benchmark_add_task(c: &mut Criterion) {
    c.bench_function("add_task_1000", |b| {
        b.iter_batched(
            || TaskBoard::new(usize::MAX),
            |board| {
                for i in 0..1000 {
                    let _ = board.add_task(&format!("task-{i}"), black_box(i % 10));
                }
                board
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_tick(c: &mut Criterion) {
    c.bench_function("drain_1000", |b| {
        b.iter_batched(
            || filled_board(1000),
            |board| {
                while board.tick().executed.is_some() {}
                board
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_contended_reads(c: &mut Criterion) {
    c.bench_function("task_state_with_4_readers", |b| {
        b.iter_batched(
            || Arc::new(filled_board(500)),
            |board| {
                let readers: Vec<_> = (0..4)
                    .map(|reader| {
                        let board = Arc::clone(&board);
                        thread::spawn(move || {
                            for i in 0..500 {
                                black_box(board.task_state(&format!("task-{}", (i + reader) % 500)));
                            }
                        })
                    })
                    .collect();
                while board.tick().executed.is_some() {}
                for reader in readers {
                    let _ = reader.join();
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, benchmark_add_task, benchmark_tick, benchmark_contended_reads);
criterion_main!(benches);
