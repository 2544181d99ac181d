pub mod task;

pub use task::{TaskLookup, TaskRecord, TaskStatus};
