use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::filter::{present, JobFilter};
use crate::models::{Employer, JobListing};

/// Read/write contract the dashboard and pages depend on.
pub trait ListingStore {
    fn list_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<JobListing>>;
    fn get_job_by_id(&self, id: &str) -> StoreResult<Option<JobListing>>;
    /// Assigns a fresh id and posting time; returns the stored listing.
    fn add_job(&self, job: JobListing) -> StoreResult<JobListing>;
    fn update_job(&self, job: &JobListing) -> StoreResult<()>;
    fn delete_job(&self, id: &str) -> StoreResult<()>;

    fn list_employers(&self) -> StoreResult<Vec<Employer>>;
    fn get_employer_by_name(&self, name: &str) -> StoreResult<Option<Employer>>;
    fn add_employer(&self, employer: &Employer) -> StoreResult<()>;
    fn update_employer(&self, employer: &Employer) -> StoreResult<()>;
    fn delete_employer(&self, name: &str) -> StoreResult<()>;
}

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS employers (
                name TEXT PRIMARY KEY COLLATE NOCASE,
                company_vision TEXT,
                tech_stack TEXT
            );

            CREATE TABLE IF NOT EXISTS jobs (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE COLLATE NOCASE,
                title TEXT,
                employer_name TEXT,
                description TEXT,
                location TEXT,
                apply_url TEXT,
                date_posted TEXT NOT NULL,
                job_type TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_employer ON jobs(employer_name);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='jobs'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'jobboard init' first."
            ));
        }
        Ok(())
    }

    // --- Seed import / export ---

    /// Loads JSON arrays in the jobs.json / employer.json layout.
    /// Listings keep their id and posting time when present. Either both
    /// files land or nothing does.
    pub fn import_json(
        &self,
        jobs_file: Option<&Path>,
        employers_file: Option<&Path>,
    ) -> Result<(usize, usize)> {
        let jobs: Vec<JobListing> = match jobs_file {
            Some(path) => read_json(path, "job")?,
            None => Vec::new(),
        };
        let employers: Vec<Employer> = match employers_file {
            Some(path) => read_json(path, "employer")?,
            None => Vec::new(),
        };

        let mut jobs_added = 0;
        let mut employers_added = 0;
        let tx = self.conn.unchecked_transaction()?;

        for mut job in jobs {
            if present(&job.id).is_none() {
                job.id = Some(Uuid::new_v4().to_string());
            }
            self.insert_job(&job)
                .with_context(|| format!("Failed to import job '{}'", job.id()))?;
            jobs_added += 1;
        }

        for employer in employers {
            match self.add_employer(&employer) {
                Ok(()) => employers_added += 1,
                Err(e @ (StoreError::MissingName | StoreError::DuplicateName(_))) => {
                    warn!(error = %e, "skipping employer during import");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().context("Failed to commit seed import")?;
        debug!(jobs = jobs_added, employers = employers_added, "seed import committed");
        Ok((jobs_added, employers_added))
    }

    pub fn export_json(&self) -> Result<serde_json::Value> {
        let jobs = self.list_jobs(&JobFilter::default())?;
        let employers = self.list_employers()?;
        Ok(serde_json::json!({
            "jobs": jobs,
            "employers": employers,
        }))
    }

    fn insert_job(&self, job: &JobListing) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO jobs (id, title, employer_name, description, location, apply_url,
                               date_posted, job_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                job.id,
                job.title,
                job.employer_name,
                job.description,
                job.location,
                job.apply_url,
                job.date_posted.to_rfc3339(),
                job.job_type,
            ],
        )?;
        Ok(())
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<JobListing> {
        let posted: String = row.get(6)?;
        let date_posted = DateTime::parse_from_rfc3339(&posted)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
        Ok(JobListing {
            id: row.get(0)?,
            title: row.get(1)?,
            employer_name: row.get(2)?,
            description: row.get(3)?,
            location: row.get(4)?,
            apply_url: row.get(5)?,
            date_posted,
            job_type: row.get(7)?,
        })
    }

    fn row_to_employer(row: &rusqlite::Row) -> rusqlite::Result<Employer> {
        Ok(Employer {
            name: row.get(0)?,
            company_vision: row.get(1)?,
            tech_stack: row.get(2)?,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid {} JSON in {}", what, path.display()))
}

const JOB_COLUMNS: &str =
    "id, title, employer_name, description, location, apply_url, date_posted, job_type";

impl ListingStore for Database {
    fn list_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<JobListing>> {
        let sql = format!("SELECT {} FROM jobs ORDER BY seq", JOB_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let all = stmt
            .query_map([], Self::row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(filter.apply(all))
    }

    fn get_job_by_id(&self, id: &str) -> StoreResult<Option<JobListing>> {
        let sql = format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS);
        let job = self
            .conn
            .query_row(&sql, [id], Self::row_to_job)
            .optional()?;
        Ok(job)
    }

    fn add_job(&self, mut job: JobListing) -> StoreResult<JobListing> {
        job.id = Some(Uuid::new_v4().to_string());
        job.date_posted = Utc::now();
        self.insert_job(&job)?;
        debug!(id = job.id(), "job inserted");
        Ok(job)
    }

    fn update_job(&self, job: &JobListing) -> StoreResult<()> {
        // date_posted is owned by the store and never overwritten
        let changed = self.conn.execute(
            "UPDATE jobs SET title = ?1, employer_name = ?2, description = ?3,
                    location = ?4, apply_url = ?5, job_type = ?6
             WHERE id = ?7",
            params![
                job.title,
                job.employer_name,
                job.description,
                job.location,
                job.apply_url,
                job.job_type,
                job.id(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::JobNotFound(job.id().to_string()));
        }
        Ok(())
    }

    fn delete_job(&self, id: &str) -> StoreResult<()> {
        let changed = self.conn.execute("DELETE FROM jobs WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(StoreError::JobNotFound(id.to_string()));
        }
        Ok(())
    }

    fn list_employers(&self) -> StoreResult<Vec<Employer>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, company_vision, tech_stack FROM employers ORDER BY rowid")?;
        let rows = stmt
            .query_map([], Self::row_to_employer)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_employer_by_name(&self, name: &str) -> StoreResult<Option<Employer>> {
        if name.is_empty() {
            return Ok(None);
        }
        let employer = self
            .conn
            .query_row(
                "SELECT name, company_vision, tech_stack FROM employers WHERE name = ?1",
                [name],
                Self::row_to_employer,
            )
            .optional()?;
        Ok(employer)
    }

    fn add_employer(&self, employer: &Employer) -> StoreResult<()> {
        let name = present(&employer.name).ok_or(StoreError::MissingName)?;
        if self.get_employer_by_name(name)?.is_some() {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        self.conn.execute(
            "INSERT INTO employers (name, company_vision, tech_stack) VALUES (?1, ?2, ?3)",
            params![name, employer.company_vision, employer.tech_stack],
        )?;
        Ok(())
    }

    fn update_employer(&self, employer: &Employer) -> StoreResult<()> {
        let name = present(&employer.name).ok_or(StoreError::MissingName)?;
        let changed = self.conn.execute(
            "UPDATE employers SET name = ?1, company_vision = ?2, tech_stack = ?3 WHERE name = ?1",
            params![name, employer.company_vision, employer.tech_stack],
        )?;
        if changed == 0 {
            return Err(StoreError::EmployerNotFound(name.to_string()));
        }
        Ok(())
    }

    fn delete_employer(&self, name: &str) -> StoreResult<()> {
        if name.is_empty() {
            return Err(StoreError::MissingName);
        }
        let changed = self
            .conn
            .execute("DELETE FROM employers WHERE name = ?1", [name])?;
        if changed == 0 {
            return Err(StoreError::EmployerNotFound(name.to_string()));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::seeded;
    use super::*;
    use crate::models::fixtures::job;

    #[test]
    fn uninitialized_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("x.db")).unwrap();
        assert!(db.ensure_initialized().is_err());
        db.init().unwrap();
        db.ensure_initialized().unwrap();
    }

    #[test]
    fn list_jobs_applies_filter_in_insertion_order() {
        let db = seeded();
        let all = db.list_jobs(&JobFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title(), "Software Developer");

        let filter = JobFilter {
            location: Some("PORTLAND".into()),
            ..Default::default()
        };
        let hits = db.list_jobs(&filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title(), "Data Analyst");
    }

    #[test]
    fn add_job_assigns_id_and_timestamp() {
        let db = Database::open_in_memory().unwrap();
        let mut draft = job("QA Engineer", "TestCo", "Remote", "Contract");
        draft.id = Some("client-supplied".into());
        let before = Utc::now();
        let stored = db.add_job(draft).unwrap();

        assert_ne!(stored.id(), "client-supplied");
        assert!(Uuid::parse_str(stored.id()).is_ok());
        assert!(stored.date_posted >= before);

        let found = db.get_job_by_id(&stored.id().to_uppercase()).unwrap();
        assert_eq!(found.map(|j| j.title), Some(Some("QA Engineer".into())));
    }

    #[test]
    fn update_job_keeps_posting_time() {
        let db = Database::open_in_memory().unwrap();
        let stored = db.add_job(job("Dev", "A", "Remote", "Full-time")).unwrap();

        let mut edited = stored.clone();
        edited.title = Some("Senior Dev".into());
        edited.date_posted = DateTime::<Utc>::UNIX_EPOCH;
        db.update_job(&edited).unwrap();

        let reloaded = db.get_job_by_id(stored.id()).unwrap().unwrap();
        assert_eq!(reloaded.title(), "Senior Dev");
        assert_eq!(
            reloaded.date_posted.timestamp(),
            stored.date_posted.timestamp()
        );
    }

    #[test]
    fn missing_jobs_are_tagged_not_found() {
        let db = Database::open_in_memory().unwrap();
        let ghost = JobListing {
            id: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(db.update_job(&ghost), Err(StoreError::JobNotFound(_))));
        assert!(matches!(db.delete_job("nope"), Err(StoreError::JobNotFound(_))));
        assert!(db.get_job_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn employer_errors_are_distinct() {
        let db = seeded();
        assert!(matches!(
            db.add_employer(&Employer::default()),
            Err(StoreError::MissingName)
        ));
        assert!(matches!(
            db.add_employer(&Employer::new("techcorp", "v", "s")),
            Err(StoreError::DuplicateName(_))
        ));
        assert!(matches!(
            db.update_employer(&Employer::new("Nobody", "v", "s")),
            Err(StoreError::EmployerNotFound(_))
        ));
        assert!(matches!(db.delete_employer(""), Err(StoreError::MissingName)));
        assert!(matches!(
            db.delete_employer("Nobody"),
            Err(StoreError::EmployerNotFound(_))
        ));
    }

    #[test]
    fn employer_lookup_is_case_insensitive() {
        let db = seeded();
        let found = db.get_employer_by_name("webcorp").unwrap().unwrap();
        assert_eq!(found.name(), "WebCorp");
        assert!(db.get_employer_by_name("").unwrap().is_none());

        db.update_employer(&Employer::new("WebCorp", "New vision", "Go")).unwrap();
        let found = db.get_employer_by_name("WebCorp").unwrap().unwrap();
        assert_eq!(found.company_vision.as_deref(), Some("New vision"));

        db.delete_employer("WEBCORP").unwrap();
        assert_eq!(db.list_employers().unwrap().len(), 2);
    }

    #[test]
    fn import_reads_seed_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = dir.path().join("jobs.json");
        let employers = dir.path().join("employer.json");
        std::fs::write(
            &jobs,
            r#"[{"id":"j1","title":"Dev","employer_name":"TechCorp","description":"d",
                "location":"Seattle, WA","apply_url":"https://x.io",
                "date_posted":"2024-05-01T00:00:00Z",
                "job_type":"Full-time"},
               {"title":"No Id","date_posted":"2024-05-02T00:00:00Z"}]"#,
        )
        .unwrap();
        std::fs::write(
            &employers,
            r#"[{"employer_name":"TechCorp","company_vision":"v","tech_stack":"s"},
               {"employer_name":"techcorp","company_vision":"dup","tech_stack":"s"},
               {"company_vision":"nameless"}]"#,
        )
        .unwrap();

        let db = Database::open_in_memory().unwrap();
        let (j, e) = db.import_json(Some(&jobs), Some(&employers)).unwrap();
        assert_eq!((j, e), (2, 1));
        assert!(db.get_job_by_id("j1").unwrap().is_some());

        let exported = db.export_json().unwrap();
        assert_eq!(exported["jobs"].as_array().unwrap().len(), 2);
        assert_eq!(exported["employers"][0]["employer_name"], "TechCorp");
    }

    #[test]
    fn failed_import_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = dir.path().join("jobs.json");
        let employers = dir.path().join("employer.json");
        std::fs::write(
            &jobs,
            r#"[{"id":"j1","title":"First","date_posted":"2024-05-01T00:00:00Z"},
               {"id":"j1","title":"Again","date_posted":"2024-05-02T00:00:00Z"}]"#,
        )
        .unwrap();
        std::fs::write(
            &employers,
            r#"[{"employer_name":"TechCorp","company_vision":"v","tech_stack":"s"}]"#,
        )
        .unwrap();

        let db = Database::open_in_memory().unwrap();
        let err = db.import_json(Some(&jobs), Some(&employers)).unwrap_err();
        assert!(err.to_string().contains("Failed to import job 'j1'"));
        assert!(db.list_jobs(&JobFilter::default()).unwrap().is_empty());
        assert!(db.list_employers().unwrap().is_empty());

        std::fs::write(
            &jobs,
            r#"[{"id":"j1","title":"First","date_posted":"2024-05-01T00:00:00Z"}]"#,
        )
        .unwrap();
        let (j, e) = db.import_json(Some(&jobs), Some(&employers)).unwrap();
        assert_eq!((j, e), (1, 1));
    }
}
