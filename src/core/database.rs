// src/core/database.rs
//! SQLite connection and the submission repository

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::Path;

use crate::app_log;
use crate::core::FsOps;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            FsOps::ensure_dir_exists(parent).await?;
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        app_log!(
            info,
            "Database connection established: {}",
            database_path.display()
        );

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn submissions(&self) -> SubmissionRepository<'_> {
        SubmissionRepository::new(&self.pool)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company TEXT NOT NULL,
                position TEXT NOT NULL,
                submission_date TEXT NOT NULL,
                cv_json TEXT NOT NULL,
                cover_letter_json TEXT NOT NULL,
                cv_pdf BLOB NOT NULL,
                cover_letter_pdf BLOB NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_company ON submissions(company);")
            .execute(&self.pool)
            .await?;

        app_log!(info, "Database migrations completed");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

// ===== Submission Models =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmissionSummary {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub submission_date: DateTime<Utc>,
}

/// Stored submission without the PDF blobs
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmissionRecord {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub submission_date: DateTime<Utc>,
    pub cv_json: String,
    pub cover_letter_json: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionDocuments {
    pub company: String,
    pub position: String,
    pub cv_pdf: Vec<u8>,
    pub cover_letter_pdf: Vec<u8>,
}

/// Row contents written by `save` and `update`
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub company: String,
    pub position: String,
    pub cv_json: String,
    pub cover_letter_json: String,
    pub cv_pdf: Vec<u8>,
    pub cover_letter_pdf: Vec<u8>,
}

// ===== Submission Repository =====

pub struct SubmissionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SubmissionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, submission: &NewSubmission) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO submissions
                (company, position, submission_date, cv_json, cover_letter_json, cv_pdf, cover_letter_pdf)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&submission.company)
        .bind(&submission.position)
        .bind(Utc::now())
        .bind(&submission.cv_json)
        .bind(&submission.cover_letter_json)
        .bind(&submission.cv_pdf)
        .bind(&submission.cover_letter_pdf)
        .execute(self.pool)
        .await
        .context("Failed to insert submission")?;

        let id = result.last_insert_rowid();
        app_log!(
            info,
            "Saved submission {} ({} / {})",
            id,
            submission.company,
            submission.position
        );
        Ok(id)
    }

    /// Overwrite an existing row; returns false when the id does not exist
    pub async fn update(&self, id: i64, submission: &NewSubmission) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET company = ?, position = ?, submission_date = ?, cv_json = ?,
                cover_letter_json = ?, cv_pdf = ?, cover_letter_pdf = ?
            WHERE id = ?
            "#,
        )
        .bind(&submission.company)
        .bind(&submission.position)
        .bind(Utc::now())
        .bind(&submission.cv_json)
        .bind(&submission.cover_letter_json)
        .bind(&submission.cv_pdf)
        .bind(&submission.cover_letter_pdf)
        .bind(id)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to update submission {}", id))?;

        let updated = result.rows_affected() > 0;
        if updated {
            app_log!(info, "Updated submission {}", id);
        }
        Ok(updated)
    }

    /// All submissions, oldest first
    pub async fn list(&self) -> Result<Vec<SubmissionSummary>> {
        let submissions = sqlx::query_as::<_, SubmissionSummary>(
            r#"
            SELECT id, company, position, submission_date
            FROM submissions
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(submissions)
    }

    /// Case-insensitive substring match on company or position
    pub async fn search(&self, query: &str) -> Result<Vec<SubmissionSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list().await;
        }

        let needle = query.to_lowercase();
        let submissions = self
            .list()
            .await?
            .into_iter()
            .filter(|s| {
                s.company.to_lowercase().contains(&needle)
                    || s.position.to_lowercase().contains(&needle)
            })
            .collect();

        Ok(submissions)
    }

    pub async fn get(&self, id: i64) -> Result<Option<SubmissionRecord>> {
        let record = sqlx::query_as::<_, SubmissionRecord>(
            r#"
            SELECT id, company, position, submission_date, cv_json, cover_letter_json
            FROM submissions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    pub async fn get_documents(&self, id: i64) -> Result<Option<SubmissionDocuments>> {
        let documents = sqlx::query_as::<_, SubmissionDocuments>(
            r#"
            SELECT company, position, cv_pdf, cover_letter_pdf
            FROM submissions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(documents)
    }

    pub async fn latest_id(&self) -> Result<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM submissions")
            .fetch_one(self.pool)
            .await?;
        Ok(id)
    }

    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            app_log!(info, "Deleted submission {}", id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(company: &str, position: &str) -> NewSubmission {
        NewSubmission {
            company: company.to_string(),
            position: position.to_string(),
            cv_json: "{}".to_string(),
            cover_letter_json: "{}".to_string(),
            cv_pdf: b"%PDF-cv".to_vec(),
            cover_letter_pdf: b"%PDF-letter".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_save_list_search_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("submissions.db")).await.unwrap();
        db.health_check().await.unwrap();
        let repo = db.submissions();

        assert_eq!(repo.latest_id().await.unwrap(), None);

        let first = repo.save(&submission("Acme", "Backend Engineer")).await.unwrap();
        let second = repo.save(&submission("Globex", "Data Analyst")).await.unwrap();
        assert_eq!(repo.latest_id().await.unwrap(), Some(second));

        let all = repo.list().await.unwrap();
        assert_eq!(
            all.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![first, second]
        );

        let found = repo.search("acme").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].company, "Acme");
        assert_eq!(repo.search("ANALYST").await.unwrap()[0].id, second);
        assert!(repo.search("nothing").await.unwrap().is_empty());
        assert_eq!(repo.search("  ").await.unwrap().len(), 2);

        assert!(repo.delete(first).await.unwrap());
        assert!(!repo.delete(first).await.unwrap());
        assert!(repo.get(first).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("submissions.db")).await.unwrap();
        let repo = db.submissions();

        let id = repo.save(&submission("Über GmbH", "Ingénieur")).await.unwrap();
        repo.save(&submission("Acme", "Engineer")).await.unwrap();

        let by_company = repo.search("über").await.unwrap();
        assert_eq!(by_company.len(), 1);
        assert_eq!(by_company[0].id, id);
        assert_eq!(repo.search("INGÉNIEUR").await.unwrap()[0].id, id);
        assert_eq!(repo.search("gmbh").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_documents() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("submissions.db")).await.unwrap();
        let repo = db.submissions();

        let id = repo.save(&submission("Acme", "Engineer")).await.unwrap();

        let mut changed = submission("Acme Corp", "Senior Engineer");
        changed.cv_pdf = b"%PDF-new".to_vec();
        assert!(repo.update(id, &changed).await.unwrap());
        assert!(!repo.update(id + 100, &changed).await.unwrap());

        let record = repo.get(id).await.unwrap().unwrap();
        assert_eq!(record.company, "Acme Corp");
        assert_eq!(record.position, "Senior Engineer");

        let documents = repo.get_documents(id).await.unwrap().unwrap();
        assert_eq!(documents.cv_pdf, b"%PDF-new");
        assert_eq!(documents.cover_letter_pdf, b"%PDF-letter");
    }
}
