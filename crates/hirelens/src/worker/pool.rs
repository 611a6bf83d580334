use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use tokio::runtime::Runtime;

use crate::audit::AuditEntry;
use crate::db::candidate_repo::{self, Claim};
use crate::error::WorkerError;
use crate::model::{CandidateStatus, LogStatus, Stage};
use crate::pipeline::Pipeline;
use crate::worker::job::{RunJob, RunOutcome};
use crate::worker::TriggerError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct WorkerPool {
    pipeline: Arc<Pipeline>,
    job_sender: Sender<RunJob>,
    result_receiver: Receiver<RunOutcome>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Starts `worker_count` threads, each with its own current-thread
    /// runtime driving one run at a time.
    pub fn new(pipeline: Arc<Pipeline>, worker_count: usize) -> Result<Self, WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::SpawnFailed("worker_count must be > 0".to_string()));
        }

        let (job_sender, job_receiver) = bounded::<RunJob>(worker_count * 2);
        // Unbounded: callers enqueue a whole batch before draining outcomes.
        let (result_sender, result_receiver) = unbounded::<RunOutcome>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let spawned = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| WorkerError::Runtime(e.to_string()))
                .and_then(|runtime| {
                    let worker = Worker {
                        id: worker_id,
                        jobs: job_receiver.clone(),
                        retries: job_sender.clone(),
                        results: result_sender.clone(),
                        shutdown: Arc::clone(&shutdown),
                        pipeline: Arc::clone(&pipeline),
                        runtime,
                    };
                    thread::Builder::new()
                        .name(format!("hirelens-worker-{}", worker_id))
                        .spawn(move || worker.run())
                        .map_err(|e| WorkerError::SpawnFailed(e.to_string()))
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Workers already started exit on their next poll.
                    shutdown.store(true, Ordering::Relaxed);
                    return Err(e);
                }
            }
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            pipeline,
            job_sender,
            result_receiver,
            workers,
            shutdown,
        })
    }

    /// Claims the candidate for a new run and enqueues it.
    ///
    /// Rejected with [`TriggerError::AlreadyProcessing`] while a run is in
    /// progress; such a trigger is never queued.
    pub fn trigger(&self, candidate_id: &str) -> Result<RunJob, TriggerError> {
        let db = self.pipeline.db();
        let run_handle = uuid::Uuid::new_v4().to_string();

        match candidate_repo::claim_run(db, candidate_id, &run_handle)? {
            Claim::Claimed => {}
            Claim::AlreadyProcessing => {
                return Err(TriggerError::AlreadyProcessing(candidate_id.to_string()))
            }
            Claim::NotFound => return Err(TriggerError::CandidateNotFound(candidate_id.to_string())),
        }

        let job = RunJob::new(candidate_id, &run_handle);
        if let Err(e) = self.submit(job.clone()) {
            // Release the claim so the candidate is not stuck in processing.
            let message = e.to_string();
            let entry = AuditEntry::new(candidate_id, Stage::PipelineError, LogStatus::Failed)
                .with_message("Run could not be queued")
                .with_error(message.as_str());
            if let Err(db_err) = candidate_repo::finish_run(
                db,
                candidate_id,
                &run_handle,
                CandidateStatus::Failed,
                Some(&message),
                &entry,
            ) {
                error!("Failed to release claim on {}: {}", candidate_id, db_err);
            }
            return Err(e.into());
        }

        debug!("Queued run {} for candidate {}", run_handle, candidate_id);
        Ok(job)
    }

    /// Enqueues an already claimed run.
    pub fn submit(&self, job: RunJob) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        self.job_sender
            .send(job)
            .map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<RunOutcome> {
        self.result_receiver.try_recv().ok()
    }

    pub fn recv_result(&self) -> Option<RunOutcome> {
        self.result_receiver.recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<RunOutcome> {
        self.result_receiver.recv_timeout(timeout).ok()
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stops accepting work, lets the workers drain the queue and joins them.
    /// Retries still waiting for their delay are dropped.
    pub fn wait(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        drop(self.job_sender);

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
}

struct Worker {
    id: usize,
    jobs: Receiver<RunJob>,
    retries: Sender<RunJob>,
    results: Sender<RunOutcome>,
    shutdown: Arc<AtomicBool>,
    pipeline: Arc<Pipeline>,
    runtime: Runtime,
}

impl Worker {
    fn run(self) {
        debug!("Worker {} started", self.id);

        loop {
            match self.jobs.recv_timeout(POLL_INTERVAL) {
                Ok(job) => {
                    debug!(
                        "Worker {} running candidate {} (attempt {})",
                        self.id, job.candidate_id, job.attempt
                    );

                    let mut outcome = self.runtime.block_on(self.pipeline.run(job));
                    if outcome.retry_scheduled && !self.schedule_retry(&outcome.job) {
                        outcome.retry_scheduled = false;
                    }

                    if let Err(e) = self.results.send(outcome) {
                        error!("Worker {} failed to send result: {}", self.id, e);
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        debug!("Worker {} received shutdown signal", self.id);
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Worker {} job channel disconnected", self.id);
                    break;
                }
            }
        }

        debug!("Worker {} stopped", self.id);
    }

    /// Re-enqueues the next attempt after the configured delay from a
    /// sleeper thread, so the worker stays free meanwhile.
    fn schedule_retry(&self, job: &RunJob) -> bool {
        let next = job.next_attempt();
        let delay = self.pipeline.config().retry_delay;
        let sender = self.retries.clone();

        info!(
            "Retrying candidate {} in {}s (attempt {})",
            next.candidate_id,
            delay.as_secs(),
            next.attempt
        );

        let spawned = thread::Builder::new()
            .name(format!("hirelens-retry-{}", next.candidate_id))
            .spawn(move || {
                thread::sleep(delay);
                let candidate_id = next.candidate_id.clone();
                if sender.send(next).is_err() {
                    warn!(
                        "Worker pool stopped; dropping retry for candidate {}",
                        candidate_id
                    );
                }
            });

        match spawned {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to schedule retry for {}: {}", job.candidate_id, e);
                false
            }
        }
    }
}
