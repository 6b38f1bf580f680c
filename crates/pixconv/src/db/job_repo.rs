//! Job repository: CRUD operations for the `jobs` table.
//!
//! Functions come in two flavours. The `&Database` ones take the connection
//! lock themselves; the `*_in` ones run on a connection or transaction the
//! caller already holds.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: String,
    pub original_name: String,
    pub source_format: String,
    pub target_format: String,
    pub status: String,
    pub progress: u8,
    /// Conversion settings as JSON text.
    pub settings: String,
    pub result_mime: Option<String>,
    pub result_bytes: Option<Vec<u8>>,
    pub result_width: Option<u32>,
    pub result_height: Option<u32>,
    pub result_degraded: Option<bool>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            original_name: row.get("original_name")?,
            source_format: row.get("source_format")?,
            target_format: row.get("target_format")?,
            status: row.get("status")?,
            progress: row.get("progress")?,
            settings: row.get("settings")?,
            result_mime: row.get("result_mime")?,
            result_bytes: row.get("result_bytes")?,
            result_width: row.get("result_width")?,
            result_height: row.get("result_height")?,
            result_degraded: row.get("result_degraded")?,
            error_kind: row.get("error_kind")?,
            error_message: row.get("error_message")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub status: Option<String>,
    pub target_format: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| insert_in(conn, job))
}

pub fn insert_in(conn: &Connection, job: &JobRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO jobs (id, original_name, source_format, target_format, status, progress,
         settings, result_mime, result_bytes, result_width, result_height, result_degraded,
         error_kind, error_message, created_at, updated_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            job.id,
            job.original_name,
            job.source_format,
            job.target_format,
            job.status,
            job.progress,
            job.settings,
            job.result_mime,
            job.result_bytes,
            job.result_width,
            job.result_height,
            job.result_degraded,
            job.error_kind,
            job.error_message,
            job.created_at,
            job.updated_at,
            job.completed_at,
        ],
    )?;
    Ok(())
}

/// Overwrites every mutable column. `id`, `original_name`, formats,
/// settings and `created_at` are fixed at creation and left untouched.
pub fn update(db: &Database, job: &JobRow) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| update_in(conn, job))
}

/// Returns whether a row was updated.
pub fn update_in(conn: &Connection, job: &JobRow) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE jobs SET status=?2, progress=?3, result_mime=?4, result_bytes=?5,
         result_width=?6, result_height=?7, result_degraded=?8, error_kind=?9,
         error_message=?10, updated_at=?11, completed_at=?12
         WHERE id=?1",
        params![
            job.id,
            job.status,
            job.progress,
            job.result_mime,
            job.result_bytes,
            job.result_width,
            job.result_height,
            job.result_degraded,
            job.error_kind,
            job.error_message,
            job.updated_at,
            job.completed_at,
        ],
    )?;
    Ok(changed > 0)
}

pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| find_by_id_in(conn, id))
}

pub fn find_by_id_in(conn: &Connection, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM jobs WHERE id = ?1",
            params![id],
            JobRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Returns whether a row was deleted.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let removed = conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    })
}

/// Queries jobs with filters, newest first, returning (rows, total_count).
pub fn query(db: &Database, filter: &JobFilter) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.clone()));
        }
        if let Some(ref target_format) = filter.target_format {
            conditions.push(format!("target_format = ?{}", param_values.len() + 1));
            param_values.push(Box::new(target_format.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_job(id: &str) -> JobRow {
        JobRow {
            id: id.to_string(),
            original_name: "photo.png".to_string(),
            source_format: "png".to_string(),
            target_format: "webp".to_string(),
            status: "pending".to_string(),
            progress: 0,
            settings: r#"{"compressionLevel":85,"removeBackground":false}"#.to_string(),
            result_mime: None,
            result_bytes: None,
            result_width: None,
            result_height: None,
            result_degraded: None,
            error_kind: None,
            error_message: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: None,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        insert(&db, &sample_job("job-1")).unwrap();

        let found = find_by_id(&db, "job-1").unwrap().unwrap();
        assert_eq!(found, sample_job("job-1"));
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, "nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_update_stores_artifact_blob() {
        let db = test_db();
        let mut job = sample_job("job-2");
        insert(&db, &job).unwrap();

        job.status = "completed".to_string();
        job.progress = 100;
        job.result_mime = Some("image/webp".to_string());
        job.result_bytes = Some(vec![b'R', b'I', b'F', b'F', 0, 1, 2]);
        job.result_width = Some(4);
        job.result_height = Some(3);
        job.result_degraded = Some(false);
        job.completed_at = Some("2026-01-01T01:00:00Z".to_string());
        assert!(update(&db, &job).unwrap());

        let found = find_by_id(&db, "job-2").unwrap().unwrap();
        assert_eq!(found.status, "completed");
        assert_eq!(found.result_bytes.as_deref(), Some(&[b'R', b'I', b'F', b'F', 0, 1, 2][..]));
        assert_eq!(found.result_degraded, Some(false));
        assert!(found.completed_at.is_some());
    }

    #[test]
    fn test_update_missing_row() {
        let db = test_db();
        assert!(!update(&db, &sample_job("ghost")).unwrap());
    }

    #[test]
    fn test_delete() {
        let db = test_db();
        insert(&db, &sample_job("d1")).unwrap();
        assert!(delete(&db, "d1").unwrap());
        assert!(!delete(&db, "d1").unwrap());
        assert!(find_by_id(&db, "d1").unwrap().is_none());
    }

    #[test]
    fn test_query_with_status_filter() {
        let db = test_db();
        insert(&db, &sample_job("s1")).unwrap();

        let mut failed = sample_job("s2");
        failed.status = "failed".to_string();
        failed.error_kind = Some("decode_failed".to_string());
        insert(&db, &failed).unwrap();

        let rows = query(
            &db,
            &JobFilter {
                status: Some("failed".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "s2");
    }

    #[test]
    fn test_query_with_target_format_filter() {
        let db = test_db();
        insert(&db, &sample_job("t1")).unwrap();

        let mut gif = sample_job("t2");
        gif.target_format = "gif".to_string();
        insert(&db, &gif).unwrap();

        let rows = query(
            &db,
            &JobFilter {
                target_format: Some("gif".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t2"]);
    }

    #[test]
    fn test_query_newest_first_with_pagination() {
        let db = test_db();
        for i in 0..10 {
            let mut job = sample_job(&format!("p{}", i));
            job.created_at = format!("2026-01-{:02}T00:00:00Z", i + 1);
            insert(&db, &job).unwrap();
        }

        let rows = query(
            &db,
            &JobFilter {
                limit: Some(3),
                offset: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["p8", "p7", "p6"]);
    }
}
