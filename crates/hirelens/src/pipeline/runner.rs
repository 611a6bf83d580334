use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::audit::{AuditEntry, AuditSink, DbAuditSink, StageTimer};
use crate::config::Config;
use crate::db::enrichment_repo::{self, EnrichmentRow};
use crate::db::evaluation_repo::{self, EvaluationRow};
use crate::db::{candidate_repo, job_requirement_repo, now_timestamp, resume_repo, Database};
use crate::detector;
use crate::enrichment::{analyze, EnrichmentResult, GitHubClient, ProfileAnalysis, ProfileFetcher};
use crate::evaluator::{EvaluationRequest, EvaluationResult, Evaluator, OpenAiEvaluator};
use crate::extractor::Extractor;
use crate::model::{CandidateStatus, LogStatus, Stage};
use crate::notifier::{EvaluationSummary, Notifier, TelegramNotifier};
use crate::report::{ReportGenerator, ReportInput};
use crate::storage::{BlobStore, FileBlobStore};
use crate::worker::job::{RunJob, RunOutcome};

use super::config::PipelineConfig;
use super::context::{RunContext, StoredEvaluation};
use super::error::{is_retryable_failure, PipelineError, PipelineWarning};

/// The collaborators a pipeline drives. Optional ones disable their stage.
pub struct PipelineServices {
    pub db: Database,
    pub blobs: Arc<dyn BlobStore>,
    pub extractor: Extractor,
    pub fetcher: Option<Arc<dyn ProfileFetcher>>,
    pub evaluator: Arc<dyn Evaluator>,
    pub reports: ReportGenerator,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub audit: Arc<dyn AuditSink>,
}

pub struct Pipeline {
    config: PipelineConfig,
    db: Database,
    blobs: Arc<dyn BlobStore>,
    extractor: Extractor,
    fetcher: Option<Arc<dyn ProfileFetcher>>,
    evaluator: Arc<dyn Evaluator>,
    reports: ReportGenerator,
    notifier: Option<Arc<dyn Notifier>>,
    audit: Arc<dyn AuditSink>,
}

impl Pipeline {
    /// Production constructor. Builds every client from config; secrets are
    /// resolved here so a missing key fails before any run starts.
    pub fn from_config(config: &Config, db: Database) -> crate::Result<Self> {
        let blobs: Arc<dyn BlobStore> = Arc::new(FileBlobStore::new(config.storage_directory()));
        let extractor = Extractor::from_config(&config.extraction)?;

        let fetcher: Option<Arc<dyn ProfileFetcher>> = if config.github.enabled {
            Some(Arc::new(GitHubClient::from_config(&config.github)?))
        } else {
            info!("GitHub enrichment disabled");
            None
        };

        let evaluator: Arc<dyn Evaluator> = Arc::new(OpenAiEvaluator::from_config(&config.ai)?);

        let notifier: Option<Arc<dyn Notifier>> = if config.telegram.enabled {
            Some(Arc::new(TelegramNotifier::from_config(&config.telegram)?))
        } else {
            info!("Telegram notifications disabled");
            None
        };

        let audit: Arc<dyn AuditSink> = Arc::new(DbAuditSink::new(db.clone()));

        Ok(Self::new(
            PipelineConfig::from_config(config),
            PipelineServices {
                db,
                blobs,
                extractor,
                fetcher,
                evaluator,
                reports: ReportGenerator::new(),
                notifier,
                audit,
            },
        ))
    }

    /// Injection constructor, used by tests and embedders.
    pub fn new(config: PipelineConfig, services: PipelineServices) -> Self {
        let PipelineServices {
            db,
            blobs,
            extractor,
            fetcher,
            evaluator,
            reports,
            notifier,
            audit,
        } = services;
        Self {
            config,
            db,
            blobs,
            extractor,
            fetcher,
            evaluator,
            reports,
            notifier,
            audit,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs one attempt for a claimed candidate. Never fails: every error
    /// ends up in the candidate row, the audit trail and the outcome.
    pub async fn run(&self, job: RunJob) -> RunOutcome {
        let span = info_span!("pipeline",
            candidate_id = %job.candidate_id,
            run_handle = %job.run_handle,
            attempt = job.attempt,
        );
        self.run_attempt(job).instrument(span).await
    }

    async fn run_attempt(&self, job: RunJob) -> RunOutcome {
        match candidate_repo::begin_run(&self.db, &job.candidate_id, &job.run_handle) {
            Ok(true) => {}
            Ok(false) => {
                info!("Run {} is no longer current, dropping it", job.run_handle);
                return RunOutcome::superseded(job);
            }
            Err(e) => {
                error!("Failed to start run: {}", e);
                return RunOutcome::failed(job, e.to_string(), Vec::new(), false);
            }
        }

        self.audit.record(
            AuditEntry::new(&job.candidate_id, Stage::PipelineStart, LogStatus::Started)
                .with_message(format!("Run attempt {}", job.attempt))
                .with_metadata(json!({
                    "attempt": job.attempt,
                    "run_handle": job.run_handle,
                })),
        );

        let started = Instant::now();
        match self.load(&job) {
            Ok(mut ctx) => match self.execute(&mut ctx).await {
                Ok(()) => self.complete(ctx, started.elapsed()),
                Err(e) => {
                    let warnings = std::mem::take(&mut ctx.warnings);
                    self.fail(job, e, warnings, started.elapsed())
                }
            },
            Err(e) => self.fail(job, e, Vec::new(), started.elapsed()),
        }
    }

    fn load(&self, job: &RunJob) -> Result<RunContext, PipelineError> {
        let candidate = candidate_repo::find_by_id(&self.db, &job.candidate_id)?
            .ok_or_else(|| PipelineError::CandidateNotFound(job.candidate_id.clone()))?;
        let requirement = job_requirement_repo::find_by_id(&self.db, &candidate.requirement_id)?
            .ok_or_else(|| PipelineError::RequirementNotFound(candidate.requirement_id.clone()))?;
        let resume = resume_repo::find_by_candidate(&self.db, &candidate.id)?
            .ok_or_else(|| PipelineError::ResumeMissing(candidate.id.clone()))?;
        Ok(RunContext::new(job.clone(), candidate, requirement, resume))
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
        // Stage: resume parsing (fatal)
        {
            let _step = info_span!("resume_parsing").entered();
            self.step_parse_resume(ctx)?;
        }

        // Stage: profile detection and fetch
        self.step_enrich(ctx)
            .instrument(info_span!("github_enrichment"))
            .await;

        // Stage: evaluation (fatal)
        let evaluation = self
            .step_evaluate(ctx)
            .instrument(info_span!("ai_evaluation"))
            .await?;

        // Stage: report
        {
            let _step = info_span!("document_generation").entered();
            self.step_generate_report(ctx, &evaluation);
        }

        // Stage: notification
        self.step_notify(ctx, &evaluation)
            .instrument(info_span!("telegram_notification"))
            .await;

        ctx.evaluation = Some(evaluation);
        Ok(())
    }

    fn complete(&self, ctx: RunContext, elapsed: Duration) -> RunOutcome {
        let RunContext {
            job,
            evaluation,
            warnings,
            ..
        } = ctx;
        let metadata = match &evaluation {
            Some(stored) => json!({
                "evaluation_id": stored.id,
                "score": stored.result.score,
                "recommendation": stored.result.recommendation.as_str(),
                "warnings": warnings.len(),
            }),
            None => json!({ "warnings": warnings.len() }),
        };
        let entry = AuditEntry::new(&job.candidate_id, Stage::PipelineComplete, LogStatus::Completed)
            .with_message("Pipeline completed")
            .with_metadata(metadata)
            .with_duration(elapsed.as_secs_f64());

        match candidate_repo::finish_run(
            &self.db,
            &job.candidate_id,
            &job.run_handle,
            CandidateStatus::Completed,
            None,
            &entry,
        ) {
            Ok(true) => {
                info!(
                    "Run completed in {:.1}s with {} warning(s)",
                    elapsed.as_secs_f64(),
                    warnings.len()
                );
                RunOutcome::completed(job, evaluation.map(|e| e.id), warnings)
            }
            Ok(false) => {
                info!("Run {} was superseded before it finished", job.run_handle);
                RunOutcome::superseded(job)
            }
            Err(e) => {
                error!("Failed to mark run completed: {}", e);
                RunOutcome::failed(job, e.to_string(), warnings, false)
            }
        }
    }

    fn fail(
        &self,
        job: RunJob,
        err: PipelineError,
        warnings: Vec<PipelineWarning>,
        elapsed: Duration,
    ) -> RunOutcome {
        let message = err.to_string();
        let retry = is_retryable_failure(&message) && job.attempt < self.config.max_run_attempts;

        let summary = if retry {
            format!(
                "Run failed; retrying in {}s",
                self.config.retry_delay.as_secs()
            )
        } else {
            "Run failed".to_string()
        };
        let entry = AuditEntry::new(&job.candidate_id, Stage::PipelineError, LogStatus::Failed)
            .with_message(summary)
            .with_error(message.as_str())
            .with_metadata(json!({
                "attempt": job.attempt,
                "retry_scheduled": retry,
            }))
            .with_duration(elapsed.as_secs_f64());

        match candidate_repo::finish_run(
            &self.db,
            &job.candidate_id,
            &job.run_handle,
            CandidateStatus::Failed,
            Some(&message),
            &entry,
        ) {
            Ok(true) => {
                warn!("Run attempt {} failed: {}", job.attempt, message);
                RunOutcome::failed(job, message, warnings, retry)
            }
            Ok(false) => {
                info!("Run {} was superseded before it failed", job.run_handle);
                RunOutcome::superseded(job)
            }
            Err(e) => {
                error!("Failed to mark run failed ({}): {}", message, e);
                RunOutcome::failed(job, message, warnings, false)
            }
        }
    }

    fn step_parse_resume(&self, ctx: &mut RunContext) -> Result<(), PipelineError> {
        let timer = StageTimer::start(
            self.audit.as_ref(),
            &ctx.candidate.id,
            Stage::ResumeParsing,
            "Extracting resume text",
        );

        let extracted = self
            .blobs
            .read(&ctx.resume.file_ref)
            .map_err(PipelineError::ResumeUnreadable)
            .and_then(|bytes| Ok(self.extractor.extract(&bytes, ctx.resume.file_kind)?));

        let text = match extracted {
            Ok(text) => text,
            Err(e) => {
                if let Err(db_err) =
                    resume_repo::record_extraction_error(&self.db, &ctx.candidate.id, &e.to_string())
                {
                    warn!("Failed to store extraction error: {}", db_err);
                }
                timer.failed("Resume parsing failed", e.to_string());
                return Err(e);
            }
        };

        if let Err(e) = resume_repo::record_extraction(&self.db, &ctx.candidate.id, &text) {
            let e = PipelineError::from(e);
            timer.failed("Failed to store extracted text", e.to_string());
            return Err(e);
        }

        let characters = text.chars().count();
        debug!("Extracted {} characters", characters);
        timer.completed(
            format!("Extracted {} characters", characters),
            json!({
                "characters": characters,
                "file_kind": ctx.resume.file_kind.as_str(),
            }),
        );
        ctx.resume_text = Some(text);
        Ok(())
    }

    async fn step_enrich(&self, ctx: &mut RunContext) {
        let candidate_id = ctx.candidate.id.clone();
        let detection = StageTimer::start(
            self.audit.as_ref(),
            &candidate_id,
            Stage::GithubDetection,
            "Looking for a GitHub profile",
        );

        let Some(fetcher) = self.fetcher.as_ref() else {
            detection.skipped("GitHub enrichment disabled");
            return;
        };
        let Some(handle) = detector::detect(ctx.resume_text.as_deref().unwrap_or_default()) else {
            detection.skipped("No GitHub profile found in resume");
            return;
        };
        detection.completed(
            format!("Found GitHub profile {}", handle),
            json!({ "username": handle }),
        );
        ctx.github_handle = Some(handle.clone());

        let timer = StageTimer::start(
            self.audit.as_ref(),
            &candidate_id,
            Stage::GithubFetch,
            &format!("Fetching GitHub profile {}", handle),
        );
        let profile_url = detector::profile_url(&handle);

        let fetched = match fetcher.fetch(&handle).await {
            Ok(fetched) => fetched,
            Err(e) => {
                let failed = EnrichmentRow::failed(&candidate_id, &handle, &profile_url, &e.to_string());
                if let Err(db_err) = enrichment_repo::upsert(&self.db, &failed) {
                    warn!("Failed to record enrichment failure: {}", db_err);
                }
                warn!("GitHub enrichment failed: {}", e);
                timer.failed("GitHub enrichment failed", e.to_string());
                ctx.warnings.push(PipelineWarning {
                    stage: Stage::GithubFetch,
                    error: e.to_string(),
                });
                return;
            }
        };

        let analysis = analyze(&fetched.repositories, Utc::now());
        match self.store_enrichment(&candidate_id, &handle, &profile_url, &fetched, &analysis) {
            Ok(()) => timer.completed(
                format!("Analyzed {} repositories", fetched.repositories.len()),
                json!({
                    "username": handle,
                    "repositories": fetched.repositories.len(),
                    "languages": analysis.languages,
                }),
            ),
            Err(e) => {
                warn!("Failed to store GitHub profile: {}", e);
                timer.failed("Failed to store GitHub profile", e.to_string());
                ctx.warnings.push(PipelineWarning {
                    stage: Stage::GithubFetch,
                    error: e.to_string(),
                });
            }
        }
        // The analysis is usable for the evaluation even if storing it failed.
        ctx.github_analysis = Some(analysis);
    }

    fn store_enrichment(
        &self,
        candidate_id: &str,
        handle: &str,
        profile_url: &str,
        fetched: &EnrichmentResult,
        analysis: &ProfileAnalysis,
    ) -> Result<(), PipelineError> {
        let row = EnrichmentRow {
            candidate_id: candidate_id.to_string(),
            username: handle.to_string(),
            profile_url: profile_url.to_string(),
            profile: serde_json::to_value(&fetched.profile)?,
            repositories: serde_json::to_value(&fetched.repositories)?,
            analysis: serde_json::to_value(analysis)?,
            fetch_error: None,
            fetched_at: now_timestamp(),
        };
        enrichment_repo::upsert(&self.db, &row)?;
        Ok(())
    }

    async fn step_evaluate(&self, ctx: &mut RunContext) -> Result<StoredEvaluation, PipelineError> {
        let timer = StageTimer::start(
            self.audit.as_ref(),
            &ctx.candidate.id,
            Stage::AiEvaluation,
            "Evaluating candidate",
        );
        let started = Instant::now();

        let request = EvaluationRequest {
            job: ctx.requirement.clone(),
            resume_text: ctx.resume_text.clone().unwrap_or_default(),
            github: ctx.github_analysis.clone(),
        };

        let result = match self.evaluator.evaluate(&request).await {
            Ok(result) => result,
            Err(e) => {
                timer.failed("AI evaluation failed", e.to_string());
                return Err(e.into());
            }
        };

        match self.store_evaluation(&ctx.candidate.id, &result, started.elapsed()) {
            Ok(id) => {
                timer.completed(
                    format!("Scored {}/10: {}", result.score, result.recommendation),
                    json!({
                        "evaluation_id": id,
                        "score": result.score,
                        "recommendation": result.recommendation.as_str(),
                        "model": result.model,
                    }),
                );
                Ok(StoredEvaluation { id, result })
            }
            Err(e) => {
                timer.failed("Failed to store evaluation", e.to_string());
                Err(e)
            }
        }
    }

    fn store_evaluation(
        &self,
        candidate_id: &str,
        result: &EvaluationResult,
        elapsed: Duration,
    ) -> Result<String, PipelineError> {
        let analysis = serde_json::to_value(&result.analysis)?;
        let mut row = EvaluationRow::new(
            candidate_id,
            result.score,
            result.recommendation,
            analysis,
            &result.model,
        );
        row.processing_seconds = Some(elapsed.as_secs_f64());
        evaluation_repo::insert_current(&self.db, &row)?;
        Ok(row.id)
    }

    fn step_generate_report(&self, ctx: &mut RunContext, evaluation: &StoredEvaluation) {
        let timer = StageTimer::start(
            self.audit.as_ref(),
            &ctx.candidate.id,
            Stage::DocumentGeneration,
            "Rendering assessment report",
        );

        match self.write_report(ctx, evaluation) {
            Ok(report_ref) => {
                timer.completed("Report stored", json!({ "report_ref": report_ref }));
                ctx.report_ref = Some(report_ref);
            }
            Err(e) => {
                warn!("Report generation failed: {}", e);
                timer.failed("Report generation failed", e.to_string());
                ctx.warnings.push(PipelineWarning {
                    stage: Stage::DocumentGeneration,
                    error: e.to_string(),
                });
            }
        }
    }

    fn write_report(
        &self,
        ctx: &RunContext,
        evaluation: &StoredEvaluation,
    ) -> Result<String, PipelineError> {
        let result = &evaluation.result;
        let rendered = self.reports.render(&ReportInput {
            candidate_name: &ctx.candidate.name,
            candidate_email: &ctx.candidate.email,
            position: &ctx.requirement.title,
            score: result.score,
            recommendation: result.recommendation,
            analysis: &result.analysis,
            model: &result.model,
            generated_at: Utc::now(),
        })?;
        let report_ref = self
            .blobs
            .write("reports", &rendered.filename, &rendered.bytes)
            .map_err(PipelineError::ReportStorage)?;
        evaluation_repo::set_report_ref(&self.db, &evaluation.id, &report_ref)?;
        Ok(report_ref)
    }

    async fn step_notify(&self, ctx: &mut RunContext, evaluation: &StoredEvaluation) {
        let timer = StageTimer::start(
            self.audit.as_ref(),
            &ctx.candidate.id,
            Stage::TelegramNotification,
            "Notifying hiring team",
        );

        let Some(notifier) = self.notifier.as_ref() else {
            timer.skipped("Telegram notifications disabled");
            return;
        };

        let summary = EvaluationSummary {
            evaluation_id: evaluation.id.clone(),
            candidate_id: ctx.candidate.id.clone(),
            candidate_name: ctx.candidate.name.clone(),
            candidate_email: ctx.candidate.email.clone(),
            position: ctx.requirement.title.clone(),
            score: evaluation.result.score,
            recommendation: evaluation.result.recommendation,
            analysis: evaluation.result.analysis.clone(),
        };

        match notifier.notify(&summary).await {
            Ok(message_id) => {
                if let Err(e) =
                    evaluation_repo::set_notification_message_id(&self.db, &evaluation.id, &message_id)
                {
                    warn!("Failed to store notification message id: {}", e);
                }
                timer.completed("Notification sent", json!({ "message_id": message_id }));
                ctx.notification_message_id = Some(message_id);
            }
            Err(e) => {
                warn!("Notification failed: {}", e);
                timer.failed("Notification failed", e.to_string());
                ctx.warnings.push(PipelineWarning {
                    stage: Stage::TelegramNotification,
                    error: e.to_string(),
                });
            }
        }
    }
}
