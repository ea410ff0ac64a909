//! Builder for configuring active sources

use crate::active::{ActiveSource, Executor};
use crate::config::{ActiveConfig, DEFAULT_CAPACITY};
use crate::producer::Producer;

/// Configures an [`ActiveSource`] before it is created
pub struct ActiveSourceBuilder<T: Send + 'static> {
    producer: Box<dyn Producer<T>>,
    capacity: usize,
    executor: Executor,
}

impl<T: Send + 'static> ActiveSourceBuilder<T> {
    pub(crate) fn new(producer: Box<dyn Producer<T>>) -> Self {
        Self {
            producer,
            capacity: DEFAULT_CAPACITY,
            executor: Executor::default(),
        }
    }

    /// Prefetch buffer size; 0 makes the producer hand off one item at a time
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Apply capacity and executor settings from configuration
    pub fn config(self, config: &ActiveConfig) -> Self {
        self.capacity(config.capacity)
            .executor(Executor::from_kind(config.executor, &config.thread_name))
    }

    pub fn build(self) -> ActiveSource<T> {
        ActiveSource::assemble(self.producer, self.capacity, self.executor)
    }
}
