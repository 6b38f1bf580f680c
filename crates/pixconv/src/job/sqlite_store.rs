//! Job store backed by the `jobs` table.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::db::job_repo::{self, JobFilter, JobRow};
use crate::db::{Database, DatabaseError};
use crate::error::ErrorKind;
use crate::format::FormatId;
use crate::pipeline::OutputArtifact;

use super::error::StoreError;
use super::record::{JobFailure, JobRecord, JobStatus, Transition};
use super::store::{JobQuery, JobStore, DEFAULT_LIST_LIMIT};

// ─── Helpers ────────────────────────────────────────────────────────────────

fn corrupt(id: &str, reason: impl Into<String>) -> StoreError {
    StoreError::Database(DatabaseError::CorruptRow {
        id: id.to_string(),
        reason: reason.into(),
    })
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str, job_id: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!(
                "Failed to parse timestamp '{}' for job {}: {}",
                s,
                job_id,
                e
            );
            Utc::now()
        })
}

fn parse_format(s: &str, job_id: &str) -> Result<FormatId, StoreError> {
    FormatId::parse(s).ok_or_else(|| corrupt(job_id, format!("unknown format '{}'", s)))
}

fn to_row(record: &JobRecord) -> Result<JobRow, StoreError> {
    let artifact = record.result.as_ref();
    Ok(JobRow {
        id: record.id.clone(),
        original_name: record.original_name.clone(),
        source_format: record.source_format.as_str().to_string(),
        target_format: record.target_format.as_str().to_string(),
        status: record.status.as_str().to_string(),
        progress: record.progress,
        settings: serde_json::to_string(&record.settings)?,
        result_mime: artifact.map(|a| a.mime_type.clone()),
        result_bytes: artifact.map(|a| a.bytes.clone()),
        result_width: artifact.and_then(|a| a.dimensions).map(|(w, _)| w),
        result_height: artifact.and_then(|a| a.dimensions).map(|(_, h)| h),
        result_degraded: artifact.map(|a| a.degraded),
        error_kind: record.error.as_ref().map(|e| e.kind.as_str().to_string()),
        error_message: record.error.as_ref().map(|e| e.message.clone()),
        created_at: format_timestamp(record.created_at),
        updated_at: format_timestamp(record.updated_at),
        completed_at: record.completed_at.map(format_timestamp),
    })
}

fn from_row(row: JobRow) -> Result<JobRecord, StoreError> {
    let id = row.id;
    let status = JobStatus::parse(&row.status)
        .ok_or_else(|| corrupt(&id, format!("unknown status '{}'", row.status)))?;
    let target_format = parse_format(&row.target_format, &id)?;

    let result = match (row.result_bytes, row.result_mime) {
        (Some(bytes), Some(mime_type)) => Some(OutputArtifact {
            format: target_format,
            mime_type,
            bytes,
            dimensions: row.result_width.zip(row.result_height),
            degraded: row.result_degraded.unwrap_or(false),
        }),
        _ => None,
    };

    let error = match row.error_kind {
        Some(kind) => {
            let kind = ErrorKind::parse(&kind)
                .ok_or_else(|| corrupt(&id, format!("unknown error kind '{}'", kind)))?;
            Some(JobFailure::new(kind, row.error_message.unwrap_or_default()))
        }
        None => None,
    };

    Ok(JobRecord {
        source_format: parse_format(&row.source_format, &id)?,
        target_format,
        status,
        progress: row.progress,
        result,
        error,
        settings: serde_json::from_str(&row.settings)?,
        created_at: parse_timestamp(&row.created_at, &id),
        updated_at: parse_timestamp(&row.updated_at, &id),
        completed_at: row.completed_at.as_deref().map(|s| parse_timestamp(s, &id)),
        original_name: row.original_name,
        id,
    })
}

// ─── SqliteJobStore ─────────────────────────────────────────────────────────

/// Durable store. Artifacts are kept inline as BLOBs.
#[derive(Clone)]
pub struct SqliteJobStore {
    db: Database,
}

impl SqliteJobStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl JobStore for SqliteJobStore {
    fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        let row = to_row(&record)?;
        self.db.with_transaction(|tx| {
            if job_repo::find_by_id_in(tx, &row.id)?.is_some() {
                return Err(StoreError::Duplicate(row.id.clone()));
            }
            job_repo::insert_in(tx, &row)?;
            Ok(())
        })
    }

    fn get(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        job_repo::find_by_id(&self.db, id)?
            .map(from_row)
            .transpose()
    }

    fn apply(&self, id: &str, transition: Transition) -> Result<JobRecord, StoreError> {
        self.db.with_transaction(|tx| {
            let row = job_repo::find_by_id_in(tx, id)?
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            let mut record = from_row(row)?;
            record.apply(transition)?;
            job_repo::update_in(tx, &to_row(&record)?)?;
            Ok(record)
        })
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(job_repo::delete(&self.db, id)?)
    }

    fn list(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError> {
        let filter = JobFilter {
            status: query.status.map(|s| s.as_str().to_string()),
            target_format: query.target_format.map(|f| f.as_str().to_string()),
            limit: Some(query.limit.unwrap_or(DEFAULT_LIST_LIMIT) as u64),
            offset: query.offset.map(|o| o as u64),
        };
        let rows = job_repo::query(&self.db, &filter)?;
        rows.into_iter().map(from_row).collect()
    }
}
