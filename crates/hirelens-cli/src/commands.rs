use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;

use hirelens::config::{default_config_path, load_config, load_config_from_str};
use hirelens::db::job_requirement_repo::{self, JobRequirementRow};
use hirelens::db::{candidate_repo, evaluation_repo, feedback_repo, processing_log_repo};
use hirelens::notifier::CallbackEvent;
use hirelens::{
    handle_callback, submit_resumes, Config, Database, FileBlobStore, IntakeLimits, Pipeline,
    RunOutcome, RunStatus, SubmitRequest, UploadedFile, WorkerPool,
};

/// Loads the given file, or the default one if it exists, or built-in
/// defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Ok(load_config(path)?);
    }
    match default_config_path() {
        Some(path) if path.exists() => Ok(load_config(&path)?),
        _ => {
            info!("No configuration file found, using defaults");
            Ok(load_config_from_str(r#"{"version": "1.0"}"#)?)
        }
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let path = config.database_path();
    Database::open(&path).with_context(|| format!("opening database {}", path.display()))
}

fn start_pool(config: &Config, db: Database) -> Result<WorkerPool> {
    let pipeline = Arc::new(Pipeline::from_config(config, db)?);
    Ok(WorkerPool::new(pipeline, config.worker_count)?)
}

pub fn job_add(
    config: &Config,
    title: &str,
    description: &str,
    required: Vec<String>,
    nice: Vec<String>,
    years: u32,
) -> Result<()> {
    let db = open_database(config)?;
    let mut requirement = JobRequirementRow::new(title, description);
    requirement.required_skills = clean_list(required);
    requirement.nice_to_have_skills = clean_list(nice);
    requirement.min_experience_years = years;
    job_requirement_repo::insert(&db, &requirement)?;
    println!("{}", requirement.id);
    Ok(())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn job_deactivate(config: &Config, id: &str) -> Result<()> {
    let db = open_database(config)?;
    if !job_requirement_repo::set_active(&db, id, false)? {
        bail!("Job requirement {} not found", id);
    }
    println!("Deactivated {}", id);
    Ok(())
}

pub struct Submission {
    pub job_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub files: Vec<PathBuf>,
}

pub fn submit(config: &Config, submission: Submission) -> Result<()> {
    let mut files = Vec::with_capacity(submission.files.len());
    for path in &submission.files {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(UploadedFile { filename, bytes });
    }

    let db = open_database(config)?;
    let blobs = FileBlobStore::new(config.storage_directory());
    let request = SubmitRequest {
        requirement_id: submission.job_id,
        files,
        name: submission.name,
        email: submission.email,
        phone: submission.phone,
        linkedin_url: submission.linkedin,
    };
    let outcome = submit_resumes(&db, &blobs, IntakeLimits::from(&config.intake), &request)?;

    for duplicate in &outcome.duplicates {
        println!(
            "{}: duplicate of candidate {}",
            duplicate.filename, duplicate.existing_candidate_id
        );
    }
    if outcome.created.is_empty() {
        return Ok(());
    }

    let pool = start_pool(config, db)?;
    let mut pending = HashSet::new();
    for created in &outcome.created {
        println!("{}: candidate {}", created.filename, created.candidate_id);
        match pool.trigger(&created.candidate_id) {
            Ok(_) => {
                pending.insert(created.candidate_id.clone());
            }
            Err(e) => println!("{}: not queued: {}", created.candidate_id, e),
        }
    }

    let outcomes = wait_for_runs(&pool, pending);
    pool.wait();
    report_failures(&outcomes)
}

pub fn reprocess(config: &Config, candidate_id: &str) -> Result<()> {
    let db = open_database(config)?;
    let pool = start_pool(config, db)?;

    if let Err(e) = pool.trigger(candidate_id) {
        pool.wait();
        return Err(e.into());
    }

    let outcomes = wait_for_runs(&pool, HashSet::from([candidate_id.to_string()]));
    pool.wait();
    report_failures(&outcomes)
}

/// Blocks until every candidate in `pending` produced its final outcome.
fn wait_for_runs(pool: &WorkerPool, mut pending: HashSet<String>) -> Vec<RunOutcome> {
    let mut finished = Vec::new();
    while !pending.is_empty() {
        let Some(outcome) = pool.recv_result() else {
            break;
        };
        print_outcome(&outcome);
        if outcome.is_final() {
            pending.remove(outcome.candidate_id());
            finished.push(outcome);
        }
    }
    finished
}

fn print_outcome(outcome: &RunOutcome) {
    let id = outcome.candidate_id();
    match outcome.status {
        RunStatus::Completed => {
            println!(
                "{}: completed (evaluation {})",
                id,
                outcome.evaluation_id.as_deref().unwrap_or("-")
            );
            for warning in &outcome.warnings {
                println!("{}:   {} failed: {}", id, warning.stage, warning.error);
            }
        }
        RunStatus::Failed => {
            let error = outcome.error.as_deref().unwrap_or("unknown error");
            if outcome.retry_scheduled {
                println!("{}: attempt {} failed, retrying: {}", id, outcome.job.attempt, error);
            } else {
                println!("{}: failed: {}", id, error);
            }
        }
        RunStatus::Superseded => println!("{}: superseded by a newer run", id),
    }
}

fn report_failures(outcomes: &[RunOutcome]) -> Result<()> {
    let failed = outcomes
        .iter()
        .filter(|o| o.status == RunStatus::Failed)
        .count();
    if failed > 0 {
        bail!("{} of {} run(s) failed", failed, outcomes.len());
    }
    Ok(())
}

pub fn status(config: &Config, candidate_id: &str) -> Result<()> {
    let db = open_database(config)?;
    let Some(candidate) = candidate_repo::find_by_id(&db, candidate_id)? else {
        bail!("Candidate {} not found", candidate_id);
    };

    println!("Candidate:   {} ({})", candidate.name, candidate.id);
    println!("Email:       {}", candidate.email);
    println!("Requirement: {}", candidate.requirement_id);
    println!("Status:      {}", candidate.status);
    if let Some(error) = &candidate.error_message {
        println!("Error:       {}", error);
    }

    let Some(evaluation) = evaluation_repo::find_current_by_candidate(&db, candidate_id)? else {
        println!("No evaluation yet");
        return Ok(());
    };
    println!();
    println!("Evaluation:  {}", evaluation.id);
    println!("Score:       {}/10", evaluation.score);
    println!("Verdict:     {}", evaluation.recommendation);
    println!("Model:       {}", evaluation.model);
    if let Some(report) = &evaluation.report_ref {
        println!("Report:      {}", config.storage_directory().join(report).display());
    }
    if let Some(message_id) = &evaluation.notification_message_id {
        println!("Message:     {}", message_id);
    }

    let feedback = feedback_repo::list_by_evaluation(&db, &evaluation.id)?;
    if !feedback.is_empty() {
        println!();
        println!("Feedback:");
        for fb in feedback {
            let who = fb.stakeholder_name.as_deref().unwrap_or(&fb.stakeholder_id);
            match &fb.comment {
                Some(comment) => println!("  {} {} by {}: {}", fb.created_at, fb.kind, who, comment),
                None => println!("  {} {} by {}", fb.created_at, fb.kind, who),
            }
        }
    }
    Ok(())
}

pub fn logs(config: &Config, candidate_id: &str) -> Result<()> {
    let db = open_database(config)?;
    if candidate_repo::find_by_id(&db, candidate_id)?.is_none() {
        bail!("Candidate {} not found", candidate_id);
    }

    for entry in processing_log_repo::list_by_candidate(&db, candidate_id)? {
        let mut line = format!("{} {:<22} {:<11}", entry.created_at, entry.stage, entry.status);
        if let Some(seconds) = entry.duration_seconds {
            line.push_str(&format!(" {:>7.2}s", seconds));
        }
        if let Some(message) = &entry.message {
            line.push_str(&format!("  {}", message));
        }
        if let Some(error) = &entry.error_message {
            line.push_str(&format!("  [{}]", error));
        }
        println!("{}", line);
    }
    Ok(())
}

pub enum CallbackSource {
    Update(PathBuf),
    Fields {
        data: String,
        from_id: String,
        from_name: Option<String>,
        callback_id: Option<String>,
        comment: Option<String>,
    },
}

pub fn callback(config: &Config, source: CallbackSource) -> Result<()> {
    let event = match source {
        CallbackSource::Update(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let update: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?;
            CallbackEvent::from_update(&update)?
        }
        CallbackSource::Fields {
            data,
            from_id,
            from_name,
            callback_id,
            comment,
        } => CallbackEvent {
            callback_id,
            data,
            respondent_id: from_id,
            respondent_name: from_name,
            comment,
            chat_id: None,
        },
    };

    let db = open_database(config)?;
    let feedback = handle_callback(&db, &event)?;
    println!(
        "Recorded {} on evaluation {} ({})",
        feedback.kind, feedback.evaluation_id, feedback.id
    );
    Ok(())
}
