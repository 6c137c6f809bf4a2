//! JSON snapshot persistence.
//!
//! The snapshot holds every collection in its nested shape. Loading runs the
//! legacy expense migration before deserializing, so files written before
//! expenses carried a `status` still load.

use std::path::Path;

use chrono::{DateTime, Utc};
use grantwise_core::budget::{Budget, ExpenseStatus};
use grantwise_core::document::{Document, Template};
use grantwise_core::grant::{Grant, Task};
use grantwise_core::payment::PaymentRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::EntityStore;

/// Persisted form of the entity store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was written.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// Grants.
    #[serde(default)]
    pub grants: Vec<Grant>,
    /// Budgets in nested form.
    #[serde(default)]
    pub budgets: Vec<Budget>,
    /// Document metadata.
    #[serde(default)]
    pub documents: Vec<Document>,
    /// Tasks.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Payment requests.
    #[serde(default)]
    pub payment_requests: Vec<PaymentRequest>,
    /// Templates.
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl Snapshot {
    /// Parses snapshot JSON, migrating legacy expenses first.
    ///
    /// Returns the snapshot and the number of expenses backfilled.
    pub fn from_json(json: &str) -> Result<(Self, usize), StoreError> {
        let mut value: Value = serde_json::from_str(json)?;
        let backfilled = migrate_legacy_expenses(&mut value);
        Ok((serde_json::from_value(value)?, backfilled))
    }
}

/// Backfills `status` on expenses that only carry the legacy `spent` flag.
///
/// An absent or `true` flag becomes `spent`, only `false` becomes
/// `planned`. The legacy flag is removed. Returns the number of expenses
/// touched.
pub fn migrate_legacy_expenses(snapshot: &mut Value) -> usize {
    let Some(budgets) = snapshot.get_mut("budgets").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut backfilled = 0;
    let expenses = budgets
        .iter_mut()
        .filter_map(|b| b.get_mut("categories").and_then(Value::as_array_mut))
        .flatten()
        .filter_map(|c| c.get_mut("mini_pools").and_then(Value::as_array_mut))
        .flatten()
        .filter_map(|m| m.get_mut("expenses").and_then(Value::as_array_mut))
        .flatten()
        .filter_map(Value::as_object_mut);

    for expense in expenses {
        let legacy = expense.remove("spent");
        if expense.contains_key("status") {
            continue;
        }
        let status = ExpenseStatus::from_legacy_flag(legacy.as_ref().and_then(Value::as_bool));
        expense.insert("status".to_string(), Value::from(status.as_str()));
        backfilled += 1;
    }
    backfilled
}

/// Loads the store from `path`. A missing file yields an empty store.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_snapshot(path: &Path) -> Result<EntityStore, StoreError> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(EntityStore::new());
        }
        Err(e) => return Err(e.into()),
    };

    let (snapshot, backfilled) = Snapshot::from_json(&json)?;
    if backfilled > 0 {
        info!(backfilled, "Backfilled legacy expense status");
    }
    let store = EntityStore::from_snapshot(snapshot);
    info!(
        path = %path.display(),
        grants = store.grant_count(),
        "Snapshot loaded"
    );
    Ok(store)
}

/// Writes the store to `path` atomically (temp file, then rename).
///
/// # Errors
///
/// Returns an error if the snapshot cannot be serialized or written.
pub async fn save_snapshot(store: &EntityStore, path: &Path) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(&store.to_snapshot())?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!(path = %path.display(), bytes = json.len(), "Snapshot saved");
    Ok(())
}
