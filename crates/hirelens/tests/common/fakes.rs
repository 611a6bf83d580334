//! Scripted stand-ins for the pipeline's network collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use hirelens::enrichment::{EnrichmentError, EnrichmentResult, ProfileFetcher};
use hirelens::error::StorageError;
use hirelens::evaluator::{EvaluationError, EvaluationRequest, EvaluationResult, Evaluator};
use hirelens::notifier::{EvaluationSummary, NotificationError, Notifier};
use hirelens::storage::{BlobStore, FileBlobStore};

use super::builders::evaluation;

/// Answers with queued results, then with `fallback` once the queue is empty.
pub struct FakeEvaluator {
    script: Mutex<VecDeque<Result<EvaluationResult, EvaluationError>>>,
    fallback: EvaluationResult,
    delay: Duration,
    requests: Mutex<Vec<EvaluationRequest>>,
}

impl FakeEvaluator {
    pub fn scoring(score: u8) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: evaluation(score),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, result: Result<EvaluationResult, EvaluationError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn failing(error: EvaluationError) -> Self {
        Self::scoring(7).then(Err(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<EvaluationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Evaluator for FakeEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluationError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Records every summary; fails with `error` when set.
pub struct FakeNotifier {
    error: Option<String>,
    sent: Mutex<Vec<EvaluationSummary>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            error: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<EvaluationSummary> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, summary: &EvaluationSummary) -> Result<String, NotificationError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(summary.clone());
        match &self.error {
            Some(error) => Err(NotificationError::Delivery(error.clone())),
            None => Ok(format!("msg-{}", sent.len())),
        }
    }
}

/// Returns one fixed result (or error) for any handle.
pub struct FakeFetcher {
    result: Result<EnrichmentResult, EnrichmentError>,
    handles: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn returning(result: EnrichmentResult) -> Self {
        Self {
            result: Ok(result),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: EnrichmentError) -> Self {
        Self {
            result: Err(error),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn handles(&self) -> Vec<String> {
        self.handles.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileFetcher for FakeFetcher {
    async fn fetch(&self, handle: &str) -> Result<EnrichmentResult, EnrichmentError> {
        self.handles.lock().unwrap().push(handle.to_string());
        self.result.clone()
    }
}

/// Delegates to a [`FileBlobStore`] but refuses writes under one prefix.
pub struct RejectingBlobStore {
    inner: FileBlobStore,
    rejected_prefix: &'static str,
}

impl RejectingBlobStore {
    pub fn new(inner: FileBlobStore, rejected_prefix: &'static str) -> Self {
        Self {
            inner,
            rejected_prefix,
        }
    }
}

impl BlobStore for RejectingBlobStore {
    fn read(&self, blob_ref: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.read(blob_ref)
    }

    fn write(&self, prefix: &str, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        if prefix == self.rejected_prefix {
            return Err(StorageError::WriteFile {
                path: std::path::PathBuf::from(prefix).join(name),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.write(prefix, name, bytes)
    }

    fn delete(&self, blob_ref: &str) -> Result<(), StorageError> {
        self.inner.delete(blob_ref)
    }
}
