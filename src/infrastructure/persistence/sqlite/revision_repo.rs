//! SQLite Revision Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{RepositoryError, RevisionRepositoryPort};
use crate::domain::revision::{ChapterProposal, ProposalStatus, Revision, RevisionStatus};

const REVISION_COLUMNS: &str = "id, book_id, status, original_word_count, current_word_count, \
     target_word_count, tolerance_percent, words_to_cut, chapters_total, chapters_reviewed, \
     words_cut_so_far, created_at, updated_at, closed_at";

const PROPOSAL_COLUMNS: &str = "id, revision_id, chapter_id, position, title, original_content, \
     original_word_count, target_word_count, priority_score, veb_issues, status, \
     condensed_content, condensed_word_count, actual_reduction, cuts_explanation, \
     preserved_elements, error_message, reviewer_notes, created_at, updated_at";

/// SQLite Revision Repository
pub struct SqliteRevisionRepository {
    pool: DbPool,
}

impl SqliteRevisionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate(db.message().to_string())
        }
        _ => RepositoryError::DatabaseError(e.to_string()),
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn parse_count(value: i64, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::SerializationError(format!("{} out of range: {}", column, value))
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(s: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(s).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

#[derive(FromRow)]
struct RevisionRow {
    id: String,
    book_id: String,
    status: String,
    original_word_count: i64,
    current_word_count: i64,
    target_word_count: i64,
    tolerance_percent: f64,
    words_to_cut: i64,
    chapters_total: i64,
    chapters_reviewed: i64,
    words_cut_so_far: i64,
    created_at: String,
    updated_at: String,
    closed_at: Option<String>,
}

impl TryFrom<RevisionRow> for Revision {
    type Error = RepositoryError;

    fn try_from(row: RevisionRow) -> Result<Self, Self::Error> {
        Ok(Revision {
            id: parse_uuid(&row.id)?,
            book_id: parse_uuid(&row.book_id)?,
            status: RevisionStatus::from_str(&row.status).ok_or_else(|| {
                RepositoryError::SerializationError(format!("unknown revision status: {}", row.status))
            })?,
            original_word_count: parse_count(row.original_word_count, "original_word_count")?,
            current_word_count: parse_count(row.current_word_count, "current_word_count")?,
            target_word_count: parse_count(row.target_word_count, "target_word_count")?,
            tolerance_percent: row.tolerance_percent,
            words_to_cut: parse_count(row.words_to_cut, "words_to_cut")?,
            chapters_total: parse_count(row.chapters_total, "chapters_total")?,
            chapters_reviewed: parse_count(row.chapters_reviewed, "chapters_reviewed")?,
            words_cut_so_far: parse_count(row.words_cut_so_far, "words_cut_so_far")?,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
            closed_at: row.closed_at.as_deref().map(parse_time).transpose()?,
        })
    }
}

#[derive(FromRow)]
struct ProposalRow {
    id: String,
    revision_id: String,
    chapter_id: String,
    position: i64,
    title: Option<String>,
    original_content: String,
    original_word_count: i64,
    target_word_count: i64,
    priority_score: i64,
    veb_issues: Option<String>,
    status: String,
    condensed_content: Option<String>,
    condensed_word_count: Option<i64>,
    actual_reduction: Option<i64>,
    cuts_explanation: String,
    preserved_elements: String,
    error_message: Option<String>,
    reviewer_notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProposalRow> for ChapterProposal {
    type Error = RepositoryError;

    fn try_from(row: ProposalRow) -> Result<Self, Self::Error> {
        Ok(ChapterProposal {
            id: parse_uuid(&row.id)?,
            revision_id: parse_uuid(&row.revision_id)?,
            chapter_id: parse_uuid(&row.chapter_id)?,
            position: parse_count(row.position, "position")?,
            title: row.title,
            original_content: row.original_content,
            original_word_count: parse_count(row.original_word_count, "original_word_count")?,
            target_word_count: parse_count(row.target_word_count, "target_word_count")?,
            priority_score: u8::try_from(row.priority_score).unwrap_or(100),
            veb_issues: row.veb_issues.as_deref().map(from_json).transpose()?,
            status: ProposalStatus::from_str(&row.status).ok_or_else(|| {
                RepositoryError::SerializationError(format!("unknown proposal status: {}", row.status))
            })?,
            condensed_content: row.condensed_content,
            condensed_word_count: row
                .condensed_word_count
                .map(|v| parse_count(v, "condensed_word_count"))
                .transpose()?,
            actual_reduction: row
                .actual_reduction
                .map(|v| parse_count(v, "actual_reduction"))
                .transpose()?,
            cuts_explanation: from_json(&row.cuts_explanation)?,
            preserved_elements: from_json(&row.preserved_elements)?,
            error_message: row.error_message,
            reviewer_notes: row.reviewer_notes,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
        })
    }
}

async fn update_revision_in(
    tx: &mut Transaction<'_, Sqlite>,
    revision: &Revision,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE revisions SET
            status = ?,
            current_word_count = ?,
            chapters_reviewed = ?,
            words_cut_so_far = ?,
            updated_at = ?,
            closed_at = ?
        WHERE id = ?
        "#,
    )
    .bind(revision.status.as_str())
    .bind(i64::from(revision.current_word_count))
    .bind(i64::from(revision.chapters_reviewed))
    .bind(i64::from(revision.words_cut_so_far))
    .bind(revision.updated_at.to_rfc3339())
    .bind(revision.closed_at.map(|t| t.to_rfc3339()))
    .bind(revision.id.to_string())
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;

    Ok(result.rows_affected())
}

async fn update_proposal_in(
    tx: &mut Transaction<'_, Sqlite>,
    proposal: &ChapterProposal,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE chapter_proposals SET
            status = ?,
            condensed_content = ?,
            condensed_word_count = ?,
            actual_reduction = ?,
            cuts_explanation = ?,
            preserved_elements = ?,
            error_message = ?,
            reviewer_notes = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(proposal.status.as_str())
    .bind(proposal.condensed_content.as_deref())
    .bind(proposal.condensed_word_count.map(i64::from))
    .bind(proposal.actual_reduction.map(i64::from))
    .bind(to_json(&proposal.cuts_explanation)?)
    .bind(to_json(&proposal.preserved_elements)?)
    .bind(proposal.error_message.as_deref())
    .bind(proposal.reviewer_notes.as_deref())
    .bind(proposal.updated_at.to_rfc3339())
    .bind(proposal.id.to_string())
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;

    Ok(result.rows_affected())
}

#[async_trait]
impl RevisionRepositoryPort for SqliteRevisionRepository {
    async fn create_revision(
        &self,
        revision: &Revision,
        proposals: &[ChapterProposal],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(&format!(
            "INSERT INTO revisions ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            REVISION_COLUMNS
        ))
        .bind(revision.id.to_string())
        .bind(revision.book_id.to_string())
        .bind(revision.status.as_str())
        .bind(i64::from(revision.original_word_count))
        .bind(i64::from(revision.current_word_count))
        .bind(i64::from(revision.target_word_count))
        .bind(revision.tolerance_percent)
        .bind(i64::from(revision.words_to_cut))
        .bind(i64::from(revision.chapters_total))
        .bind(i64::from(revision.chapters_reviewed))
        .bind(i64::from(revision.words_cut_so_far))
        .bind(revision.created_at.to_rfc3339())
        .bind(revision.updated_at.to_rfc3339())
        .bind(revision.closed_at.map(|t| t.to_rfc3339()))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        for proposal in proposals {
            let veb_issues = proposal.veb_issues.as_ref().map(to_json).transpose()?;
            sqlx::query(&format!(
                "INSERT INTO chapter_proposals ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                PROPOSAL_COLUMNS
            ))
            .bind(proposal.id.to_string())
            .bind(proposal.revision_id.to_string())
            .bind(proposal.chapter_id.to_string())
            .bind(i64::from(proposal.position))
            .bind(proposal.title.as_deref())
            .bind(&proposal.original_content)
            .bind(i64::from(proposal.original_word_count))
            .bind(i64::from(proposal.target_word_count))
            .bind(i64::from(proposal.priority_score))
            .bind(veb_issues)
            .bind(proposal.status.as_str())
            .bind(proposal.condensed_content.as_deref())
            .bind(proposal.condensed_word_count.map(i64::from))
            .bind(proposal.actual_reduction.map(i64::from))
            .bind(to_json(&proposal.cuts_explanation)?)
            .bind(to_json(&proposal.preserved_elements)?)
            .bind(proposal.error_message.as_deref())
            .bind(proposal.reviewer_notes.as_deref())
            .bind(proposal.created_at.to_rfc3339())
            .bind(proposal.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn update_revision(&self, revision: &Revision) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        if update_revision_in(&mut tx, revision).await? == 0 {
            return Err(RepositoryError::NotFound(format!("Revision {}", revision.id)));
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Revision>, RepositoryError> {
        let row: Option<RevisionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM revisions WHERE id = ?",
            REVISION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Revision::try_from).transpose()
    }

    async fn find_active_by_book(&self, book_id: Uuid) -> Result<Option<Revision>, RepositoryError> {
        let row: Option<RevisionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM revisions WHERE book_id = ? AND status = 'active'",
            REVISION_COLUMNS
        ))
        .bind(book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Revision::try_from).transpose()
    }

    async fn find_proposals(&self, revision_id: Uuid) -> Result<Vec<ChapterProposal>, RepositoryError> {
        let rows: Vec<ProposalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapter_proposals WHERE revision_id = ? ORDER BY position",
            PROPOSAL_COLUMNS
        ))
        .bind(revision_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(ChapterProposal::try_from).collect()
    }

    async fn find_proposal(
        &self,
        revision_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Option<ChapterProposal>, RepositoryError> {
        let row: Option<ProposalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapter_proposals WHERE revision_id = ? AND chapter_id = ?",
            PROPOSAL_COLUMNS
        ))
        .bind(revision_id.to_string())
        .bind(chapter_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(ChapterProposal::try_from).transpose()
    }

    async fn update_proposal(&self, proposal: &ChapterProposal) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        if update_proposal_in(&mut tx, proposal).await? == 0 {
            return Err(RepositoryError::NotFound(format!("Proposal {}", proposal.id)));
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn save_review(
        &self,
        revision: &Revision,
        proposal: &ChapterProposal,
    ) -> Result<(), RepositoryError> {
        // 提案状态和修订计数必须一起落盘
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        if update_proposal_in(&mut tx, proposal).await? == 0 {
            return Err(RepositoryError::NotFound(format!("Proposal {}", proposal.id)));
        }
        if update_revision_in(&mut tx, revision).await? == 0 {
            return Err(RepositoryError::NotFound(format!("Revision {}", revision.id)));
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn fail_in_flight_proposals(&self, message: &str) -> Result<usize, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE chapter_proposals SET
                status = 'error',
                error_message = ?,
                condensed_content = NULL,
                condensed_word_count = NULL,
                actual_reduction = NULL,
                cuts_explanation = '[]',
                preserved_elements = '[]',
                updated_at = ?
            WHERE status = 'generating'
            "#,
        )
        .bind(message)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() as usize)
    }
}
