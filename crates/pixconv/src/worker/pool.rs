use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::job::JobExecutor;

use super::task::ConversionTask;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Fixed set of OS threads pulling conversion tasks from a bounded queue.
pub struct WorkerPool {
    task_sender: Sender<ConversionTask>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(executor: Arc<JobExecutor>, worker_count: usize) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed(
                "worker_count must be > 0".to_string(),
            ));
        }

        let (task_sender, task_receiver) = bounded::<ConversionTask>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_executor = Arc::clone(&executor);

            let handle = thread::Builder::new()
                .name(format!("pixconv-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, task_rx, shutdown_flag, worker_executor))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            task_sender,
            workers,
            shutdown,
        })
    }

    /// Queues a task, blocking while the queue is full.
    pub fn submit(&self, task: ConversionTask) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.task_sender
            .send(task)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    /// Stops accepting tasks. Already queued tasks still run.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Drains the queue and joins every worker.
    pub fn wait(self) {
        drop(self.task_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<ConversionTask>,
    shutdown: Arc<AtomicBool>,
    executor: Arc<JobExecutor>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        match task_receiver.recv_timeout(POLL_INTERVAL) {
            Ok(mut task) => {
                debug!("Worker {} processing job {}", worker_id, task.job_id);

                let outcome = executor.execute(&task);
                if let Err(ref e) = outcome {
                    error!(
                        "Worker {} could not record job {}: {}",
                        worker_id, task.job_id, e
                    );
                }

                if let Some(reply) = task.reply.take() {
                    // The submitter may have given up waiting.
                    let _ = reply.send(outcome.map(|record| record.status));
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                // Only exit on shutdown once the queue is empty.
                if shutdown.load(Ordering::Relaxed) {
                    debug!("Worker {} received shutdown signal", worker_id);
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Worker {} task channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
