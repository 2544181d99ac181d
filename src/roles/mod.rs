//! # Producer Roles
//!
//! Dependents submit tasks and poll for their completion; supervisors also
//! reprioritize. Both are a [`PeriodicProducer`] configured with a
//! [`ProducerStrategy`], each behaviour on its own timer, all stopping once
//! the shared shutdown signal is set.

mod producer;

pub use producer::{PeriodicProducer, ProducerHandle, ProducerStrategy};
