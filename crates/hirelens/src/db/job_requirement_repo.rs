//! Job requirement repository: CRUD operations for the `job_requirements` table.

use rusqlite::{params, Row};

use super::{now_timestamp, Database, DatabaseError};

/// A job requirement row. Skill lists are stored as JSON arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequirementRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub nice_to_have_skills: Vec<String>,
    pub min_experience_years: u32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl JobRequirementRow {
    /// Builds a fresh, active requirement with a generated id.
    pub fn new(title: &str, description: &str) -> Self {
        let now = now_timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            required_skills: Vec::new(),
            nice_to_have_skills: Vec::new(),
            min_experience_years: 0,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let required: String = row.get("required_skills")?;
        let nice: String = row.get("nice_to_have_skills")?;
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            required_skills: decode_skills(&required),
            nice_to_have_skills: decode_skills(&nice),
            min_experience_years: row.get("min_experience_years")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

fn decode_skills(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed skill list '{}': {}", raw, e);
        Vec::new()
    })
}

fn encode_skills(skills: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(skills).map_err(|e| DatabaseError::Json {
        column: "skills",
        source: e,
    })
}

/// Inserts a new requirement row.
pub fn insert(db: &Database, req: &JobRequirementRow) -> Result<(), DatabaseError> {
    let required = encode_skills(&req.required_skills)?;
    let nice = encode_skills(&req.nice_to_have_skills)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO job_requirements (id, title, description, required_skills,
             nice_to_have_skills, min_experience_years, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                req.id,
                req.title,
                req.description,
                required,
                nice,
                req.min_experience_years,
                req.is_active,
                req.created_at,
                req.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a requirement by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRequirementRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM job_requirements WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRequirementRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Toggles whether new candidates may reference the requirement.
/// Returns false when no such requirement exists.
pub fn set_active(db: &Database, id: &str, active: bool) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE job_requirements SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, active, now_timestamp()],
        )?;
        Ok(changed > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample() -> JobRequirementRow {
        let mut req = JobRequirementRow::new("Backend Engineer", "Build and run services");
        req.required_skills = vec!["Rust".to_string(), "SQL".to_string()];
        req.nice_to_have_skills = vec!["Kubernetes".to_string()];
        req.min_experience_years = 3;
        req
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let req = sample();
        insert(&db, &req).unwrap();

        let found = find_by_id(&db, &req.id).unwrap().unwrap();
        assert_eq!(found, req);
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, "nope").unwrap().is_none());
    }

    #[test]
    fn test_set_active() {
        let db = test_db();
        let req = sample();
        insert(&db, &req).unwrap();

        assert!(set_active(&db, &req.id, false).unwrap());
        assert!(!find_by_id(&db, &req.id).unwrap().unwrap().is_active);
        assert!(!set_active(&db, "missing", false).unwrap());
    }
}
