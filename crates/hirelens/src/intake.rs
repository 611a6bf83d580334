//! Resume intake: validates uploads and creates pending candidates.
//!
//! Blobs are written first; candidate and resume rows for one file are then
//! created in a single transaction. Runs are not started here; the caller
//! triggers them with the returned candidate ids.

use log::{info, warn};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::IntakeConfig;
use crate::db::candidate_repo::{self, CandidateRow};
use crate::db::job_requirement_repo;
use crate::db::resume_repo::{self, ResumeRow};
use crate::db::{Database, DatabaseError};
use crate::error::StorageError;
use crate::model::FileKind;
use crate::sanitize::{mask_email, redact_path};
use crate::storage::BlobStore;

const BLOB_PREFIX: &str = "resumes";
const PLACEHOLDER_DOMAIN: &str = "unknown.invalid";

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("No files submitted")]
    NoFiles,

    #[error("Too many files: {count} submitted, at most {max} allowed")]
    TooManyFiles { count: usize, max: usize },

    #[error("Unsupported file type: '{filename}' (allowed: pdf, txt, doc, docx)")]
    UnsupportedFileType { filename: String },

    #[error("File '{filename}' is {size} bytes, larger than the {max} byte limit")]
    FileTooLarge { filename: String, size: u64, max: u64 },

    #[error("File '{filename}' is empty")]
    EmptyFile { filename: String },

    #[error("Job requirement {0} not found")]
    RequirementNotFound(String),

    #[error("Job requirement {0} is not active")]
    RequirementInactive(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy)]
pub struct IntakeLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
}

impl From<&IntakeConfig> for IntakeLimits {
    fn from(config: &IntakeConfig) -> Self {
        Self {
            max_files: config.max_files,
            max_file_bytes: config.max_file_bytes,
        }
    }
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self::from(&IntakeConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One submission. Identity fields only apply when exactly one file is
/// submitted; otherwise each candidate is named after its file.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub requirement_id: String,
    pub files: Vec<UploadedFile>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedCandidate {
    pub candidate_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateFile {
    pub filename: String,
    /// The candidate that already holds this exact resume.
    pub existing_candidate_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeOutcome {
    pub created: Vec<CreatedCandidate>,
    pub duplicates: Vec<DuplicateFile>,
}

/// Validates every file up front, then stores each non-duplicate file as a
/// new pending candidate.
pub fn submit_resumes(
    db: &Database,
    blobs: &dyn BlobStore,
    limits: IntakeLimits,
    request: &SubmitRequest,
) -> Result<IntakeOutcome, IntakeError> {
    let requirement = job_requirement_repo::find_by_id(db, &request.requirement_id)?
        .ok_or_else(|| IntakeError::RequirementNotFound(request.requirement_id.clone()))?;
    if !requirement.is_active {
        return Err(IntakeError::RequirementInactive(requirement.id));
    }

    let kinds = validate(&request.files, limits)?;
    let single = request.files.len() == 1;
    let mut outcome = IntakeOutcome::default();

    for (file, kind) in request.files.iter().zip(kinds) {
        let derived = name_from_filename(&file.filename);
        let (name, email) = if single {
            let name = request.name.clone().unwrap_or(derived);
            let email = request
                .email
                .clone()
                .unwrap_or_else(|| placeholder_email(&name));
            (name, email)
        } else {
            let email = placeholder_email(&derived);
            (derived, email)
        };

        let fingerprint = fingerprint(&file.bytes);
        if let Some(existing) = resume_repo::find_duplicate(db, &fingerprint, &email, &requirement.id)? {
            info!(
                "Skipping duplicate resume {} (already candidate {})",
                redact_path(std::path::Path::new(&file.filename)),
                existing
            );
            outcome.duplicates.push(DuplicateFile {
                filename: file.filename.clone(),
                existing_candidate_id: existing,
            });
            continue;
        }

        let blob_ref = blobs.write(BLOB_PREFIX, &file.filename, &file.bytes)?;

        let mut candidate = CandidateRow::new(&requirement.id, &name, &email);
        if single {
            candidate.phone = request.phone.clone();
            candidate.linkedin_url = request.linkedin_url.clone();
        }
        let resume = ResumeRow::new(&candidate.id, &blob_ref, &file.filename, kind, &fingerprint);

        let inserted = db.with_transaction(|tx| {
            candidate_repo::insert_in(tx, &candidate)?;
            resume_repo::insert_in(tx, &resume)?;
            Ok(())
        });
        if let Err(e) = inserted {
            if let Err(cleanup) = blobs.delete(&blob_ref) {
                warn!("Failed to remove orphaned blob {}: {}", blob_ref, cleanup);
            }
            return Err(e.into());
        }

        info!(
            "Created candidate {} <{}> from {}",
            candidate.id,
            mask_email(&candidate.email),
            blob_ref
        );
        outcome.created.push(CreatedCandidate {
            candidate_id: candidate.id,
            filename: file.filename.clone(),
        });
    }

    Ok(outcome)
}

fn validate(files: &[UploadedFile], limits: IntakeLimits) -> Result<Vec<FileKind>, IntakeError> {
    if files.is_empty() {
        return Err(IntakeError::NoFiles);
    }
    if files.len() > limits.max_files {
        return Err(IntakeError::TooManyFiles {
            count: files.len(),
            max: limits.max_files,
        });
    }

    files
        .iter()
        .map(|file| {
            let kind = FileKind::from_filename(&file.filename).ok_or_else(|| {
                IntakeError::UnsupportedFileType {
                    filename: file.filename.clone(),
                }
            })?;
            let size = file.bytes.len() as u64;
            if size == 0 {
                return Err(IntakeError::EmptyFile {
                    filename: file.filename.clone(),
                });
            }
            if size > limits.max_file_bytes {
                return Err(IntakeError::FileTooLarge {
                    filename: file.filename.clone(),
                    size,
                    max: limits.max_file_bytes,
                });
            }
            Ok(kind)
        })
        .collect()
}

/// Hex SHA-256 of the file contents.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// `jane_doe-cv.pdf` → `Jane Doe Cv`
pub fn name_from_filename(filename: &str) -> String {
    let base = std::path::Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let words: Vec<String> = base
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();
    if words.is_empty() {
        "Unknown Candidate".to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `Jane Doe` → `jane.doe@unknown.invalid`
pub fn placeholder_email(name: &str) -> String {
    let local: Vec<String> = name
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();
    let local = if local.is_empty() {
        "candidate".to_string()
    } else {
        local.join(".")
    };
    format!("{}@{}", local, PLACEHOLDER_DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seed_requirement;
    use crate::model::CandidateStatus;
    use crate::storage::FileBlobStore;
    use tempfile::TempDir;

    fn upload(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    fn setup() -> (Database, TempDir, FileBlobStore, String) {
        let db = Database::open_in_memory().unwrap();
        let req = seed_requirement(&db);
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path());
        (db, dir, store, req.id)
    }

    #[test]
    fn test_name_from_filename() {
        assert_eq!(name_from_filename("jane_doe.pdf"), "Jane Doe");
        assert_eq!(name_from_filename("JOHN-SMITH.resume.docx"), "John Smith Resume");
        assert_eq!(name_from_filename(".pdf"), "Pdf");
        assert_eq!(name_from_filename("___.txt"), "Unknown Candidate");
    }

    #[test]
    fn test_placeholder_email() {
        assert_eq!(placeholder_email("Jane Doe"), "jane.doe@unknown.invalid");
        assert_eq!(placeholder_email("Zoë O'Neil"), "zo.oneil@unknown.invalid");
        assert_eq!(placeholder_email("  "), "candidate@unknown.invalid");
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_single_file_uses_explicit_identity() {
        let (db, _dir, store, req_id) = setup();
        let request = SubmitRequest {
            requirement_id: req_id,
            files: vec![upload("cv.txt", b"Rust developer")],
            name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
            phone: Some("+44 20 0000".into()),
            ..Default::default()
        };
        let outcome = submit_resumes(&db, &store, IntakeLimits::default(), &request).unwrap();
        assert_eq!(outcome.created.len(), 1);

        let candidate = candidate_repo::find_by_id(&db, &outcome.created[0].candidate_id)
            .unwrap()
            .unwrap();
        assert_eq!(candidate.name, "Ada Lovelace");
        assert_eq!(candidate.email, "ada@example.com");
        assert_eq!(candidate.phone.as_deref(), Some("+44 20 0000"));
        assert_eq!(candidate.status, CandidateStatus::Pending);

        let resume = resume_repo::find_by_candidate(&db, &candidate.id).unwrap().unwrap();
        assert_eq!(resume.file_kind, FileKind::PlainText);
        assert!(resume.file_ref.starts_with("resumes/"));
        assert_eq!(store.read(&resume.file_ref).unwrap(), b"Rust developer");
    }

    #[test]
    fn test_multiple_files_named_after_files() {
        let (db, _dir, store, req_id) = setup();
        let request = SubmitRequest {
            requirement_id: req_id,
            files: vec![upload("jane_doe.pdf", b"%PDF-1.4 a"), upload("john_roe.txt", b"b")],
            name: Some("Ignored".into()),
            ..Default::default()
        };
        let outcome = submit_resumes(&db, &store, IntakeLimits::default(), &request).unwrap();
        assert_eq!(outcome.created.len(), 2);

        let jane = candidate_repo::find_by_id(&db, &outcome.created[0].candidate_id)
            .unwrap()
            .unwrap();
        assert_eq!(jane.name, "Jane Doe");
        assert_eq!(jane.email, "jane.doe@unknown.invalid");
    }

    #[test]
    fn test_duplicate_resume_not_recreated() {
        let (db, _dir, store, req_id) = setup();
        let request = SubmitRequest {
            requirement_id: req_id,
            files: vec![upload("jane_doe.txt", b"same bytes")],
            ..Default::default()
        };
        let first = submit_resumes(&db, &store, IntakeLimits::default(), &request).unwrap();
        let second = submit_resumes(&db, &store, IntakeLimits::default(), &request).unwrap();

        assert!(second.created.is_empty());
        assert_eq!(
            second.duplicates,
            vec![DuplicateFile {
                filename: "jane_doe.txt".into(),
                existing_candidate_id: first.created[0].candidate_id.clone(),
            }]
        );
    }

    #[test]
    fn test_validation_rejects_before_writing() {
        let (db, dir, store, req_id) = setup();
        let limits = IntakeLimits {
            max_files: 2,
            max_file_bytes: 4,
        };
        let submit = |files: Vec<UploadedFile>| {
            submit_resumes(
                &db,
                &store,
                limits,
                &SubmitRequest {
                    requirement_id: req_id.clone(),
                    files,
                    ..Default::default()
                },
            )
        };

        assert!(matches!(submit(vec![]), Err(IntakeError::NoFiles)));
        assert!(matches!(
            submit(vec![upload("a.txt", b"1"), upload("b.txt", b"2"), upload("c.txt", b"3")]),
            Err(IntakeError::TooManyFiles { count: 3, max: 2 })
        ));
        assert!(matches!(
            submit(vec![upload("a.rtf", b"1")]),
            Err(IntakeError::UnsupportedFileType { .. })
        ));
        assert!(matches!(
            submit(vec![upload("a.txt", b"")]),
            Err(IntakeError::EmptyFile { .. })
        ));
        assert!(matches!(
            submit(vec![upload("ok.txt", b"1"), upload("big.txt", b"12345")]),
            Err(IntakeError::FileTooLarge { size: 5, max: 4, .. })
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_insert_removes_stored_blob() {
        let (db, dir, store, req_id) = setup();
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_resume BEFORE INSERT ON resumes
                 BEGIN SELECT RAISE(ABORT, 'insert rejected'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let request = SubmitRequest {
            requirement_id: req_id.clone(),
            files: vec![upload("jane.txt", b"Rust engineer")],
            ..Default::default()
        };
        let result = submit_resumes(&db, &store, IntakeLimits::default(), &request);
        assert!(matches!(result, Err(IntakeError::Database(_))));

        let leftover: Vec<_> = walk_files(dir.path());
        assert!(leftover.is_empty(), "orphaned blobs: {:?}", leftover);
        let candidates: u32 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM candidates", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(candidates, 0);
    }

    fn walk_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                files.extend(walk_files(&path));
            } else {
                files.push(path);
            }
        }
        files
    }

    #[test]
    fn test_inactive_or_unknown_requirement() {
        let (db, _dir, store, req_id) = setup();
        let request = |id: &str| SubmitRequest {
            requirement_id: id.to_string(),
            files: vec![upload("a.txt", b"x")],
            ..Default::default()
        };

        assert!(matches!(
            submit_resumes(&db, &store, IntakeLimits::default(), &request("nope")),
            Err(IntakeError::RequirementNotFound(_))
        ));

        job_requirement_repo::set_active(&db, &req_id, false).unwrap();
        assert!(matches!(
            submit_resumes(&db, &store, IntakeLimits::default(), &request(&req_id)),
            Err(IntakeError::RequirementInactive(_))
        ));
    }
}
