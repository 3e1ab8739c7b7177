//! Prediction usage repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{UsageRecord, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct UsageData {
    #[serde(default)]
    records: Vec<UsageRecord>,
}

/// Repository for per-user quota records
pub struct UsageRepository {
    path: PathBuf,
    records: RwLock<HashMap<UserId, UsageRecord>>,
}

impl UsageRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Load records from disk
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: UsageData = read_json(&self.path)?;

        let mut records = self
            .records
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        records.clear();
        for record in file_data.records {
            records.insert(record.user_id, record);
        }
        Ok(())
    }

    /// Save records to disk
    pub fn save(&self) -> BudgetResult<()> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut list: Vec<_> = records.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        write_json_atomic(&self.path, &UsageData { records: list })
    }

    pub fn get(&self, user_id: UserId) -> BudgetResult<Option<UsageRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(records.get(&user_id).cloned())
    }

    /// Insert or replace a record (call `save` to persist)
    pub fn upsert(&self, record: UsageRecord) -> BudgetResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        records.insert(record.user_id, record);
        Ok(())
    }

    pub fn get_all(&self) -> BudgetResult<Vec<UsageRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(records.values().cloned().collect())
    }

    pub fn count(&self) -> BudgetResult<usize> {
        let records = self
            .records
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(records.len())
    }
}
