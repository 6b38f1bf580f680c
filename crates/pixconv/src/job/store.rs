use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::format::FormatId;

use super::error::StoreError;
use super::record::{JobRecord, JobStatus, Transition};

/// Listing filter, newest first.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub status: Option<JobStatus>,
    pub target_format: Option<FormatId>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Default page size when a query gives no limit.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Keyed persistence for job records.
///
/// `apply` is atomic per id: the read, the transition check and the write
/// happen without any other writer observing an intermediate state.
pub trait JobStore: Send + Sync {
    fn create(&self, record: JobRecord) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// Applies `transition` and returns the updated record.
    fn apply(&self, id: &str, transition: Transition) -> Result<JobRecord, StoreError>;

    /// Returns whether a record was removed.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    fn list(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError>;
}

/// Process-local store, lost on restart.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobRecord>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobRecord>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.write();
        if jobs.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        jobs.insert(record.id.clone(), record);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.read().get(id).cloned())
    }

    fn apply(&self, id: &str, transition: Transition) -> Result<JobRecord, StoreError> {
        let mut jobs = self.write();
        let record = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        // Apply to a copy so a rejected transition leaves the stored record
        // untouched.
        let mut updated = record.clone();
        updated.apply(transition)?;
        *record = updated.clone();
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.write().remove(id).is_some())
    }

    fn list(&self, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError> {
        let jobs = self.read();
        let mut matching: Vec<&JobRecord> = jobs
            .values()
            .filter(|r| query.status.map_or(true, |s| r.status == s))
            .filter(|r| query.target_format.map_or(true, |f| r.target_format == f))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(matching
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .cloned()
            .collect())
    }
}
