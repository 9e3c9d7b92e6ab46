//! Fixed-size worker pool draining a shared task queue.
//!
//! Lifecycle is `new → start → add* → close → join`. Tasks are plain values;
//! the work itself is done by an injected [`TaskExecutor`], so the pool knows
//! nothing about the network or the filesystem.
//!
//! A panicking task takes down only the worker that ran it. The remaining
//! workers keep draining the queue, so the pool runs degraded rather than
//! failing; `join` reports how many workers were lost.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Executes one task. Failures must be handled inside `execute`; the pool
/// has no channel for them.
#[async_trait::async_trait]
pub trait TaskExecutor<T>: Send + Sync {
    async fn execute(&self, task: T);
}

/// Queue sizing. `Bounded(0)` is treated as `Bounded(1)` since tokio channels
/// have no rendezvous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCapacity {
    Bounded(usize),
    Unbounded,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("task submitted after the pool was closed")]
    Closed,
}

/// Outcome of a drained pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    /// Tasks run to completion by workers that exited normally.
    pub completed: usize,
    pub panicked_workers: usize,
}

enum QueueSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

enum QueueReceiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

impl<T> QueueReceiver<T> {
    async fn recv(&mut self) -> Option<T> {
        match self {
            QueueReceiver::Bounded(rx) => rx.recv().await,
            QueueReceiver::Unbounded(rx) => rx.recv().await,
        }
    }
}

pub struct WorkerPool<T> {
    size: usize,
    sender: Option<QueueSender<T>>,
    receiver: Arc<Mutex<QueueReceiver<T>>>,
    executor: Arc<dyn TaskExecutor<T>>,
    workers: Vec<JoinHandle<usize>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(size: usize, capacity: QueueCapacity, executor: Arc<dyn TaskExecutor<T>>) -> Self {
        let size = if size == 0 {
            tracing::warn!("Worker pool size 0 requested, using 1");
            1
        } else {
            size
        };
        let (sender, receiver) = match capacity {
            QueueCapacity::Bounded(n) => {
                let (tx, rx) = mpsc::channel(n.max(1));
                (QueueSender::Bounded(tx), QueueReceiver::Bounded(rx))
            }
            QueueCapacity::Unbounded => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
            }
        };
        Self {
            size,
            sender: Some(sender),
            receiver: Arc::new(Mutex::new(receiver)),
            executor,
            workers: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Spawn exactly `size` workers. Calling it again is a no-op.
    pub fn start(&mut self) {
        if !self.workers.is_empty() {
            return;
        }
        for worker_id in 0..self.size {
            let receiver = Arc::clone(&self.receiver);
            let executor = Arc::clone(&self.executor);
            self.workers
                .push(tokio::spawn(run_worker(worker_id, receiver, executor)));
        }
    }

    /// Queue one task, waiting for room when a bounded queue is full.
    pub async fn add(&self, task: T) -> Result<(), PoolError> {
        match &self.sender {
            Some(QueueSender::Bounded(tx)) => tx.send(task).await.map_err(|_| PoolError::Closed),
            Some(QueueSender::Unbounded(tx)) => tx.send(task).map_err(|_| PoolError::Closed),
            None => Err(PoolError::Closed),
        }
    }

    /// Signal that no more tasks will be queued. Workers exit once the queue
    /// is drained.
    pub fn close(&mut self) {
        self.sender = None;
    }

    /// Wait for every worker to drain the queue and exit.
    pub async fn join(mut self) -> PoolReport {
        if self.sender.is_some() {
            tracing::debug!("Joining a pool that was not closed; closing it");
            self.close();
        }

        let mut report = PoolReport {
            workers: self.workers.len(),
            ..PoolReport::default()
        };
        for handle in self.workers.drain(..) {
            match handle.await {
                Ok(completed) => report.completed += completed,
                Err(e) if e.is_panic() => {
                    tracing::error!("Worker terminated by a panicking task: {}", e);
                    report.panicked_workers += 1;
                }
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    report.panicked_workers += 1;
                }
            }
        }
        report
    }
}

async fn run_worker<T>(
    worker_id: usize,
    receiver: Arc<Mutex<QueueReceiver<T>>>,
    executor: Arc<dyn TaskExecutor<T>>,
) -> usize {
    let mut completed = 0usize;
    loop {
        // Guard is released before the task runs so other workers can claim
        // the next one.
        let next = receiver.lock().await.recv().await;
        let Some(task) = next else { break };
        executor.execute(task).await;
        completed += 1;
    }
    tracing::trace!(worker_id, completed, "Worker drained queue");
    completed
}
