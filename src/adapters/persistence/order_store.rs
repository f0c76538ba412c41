//! Order Store - Atomic JSON Order Persistence
//!
//! Keeps every order record in memory and mirrors the full set to
//! `orders.json` after each mutation using atomic writes (write to a
//! tmp file, then rename). The file is always either the old or the
//! new version, never a partial write.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::order::{OrderRecord, OrderStatus};
use crate::ports::order_store::{OrderQuery, OrderStore};

/// Current on-disk snapshot layout.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct OrderSnapshot {
    version: u32,
    orders: Vec<OrderRecord>,
}

#[derive(Debug, Clone)]
struct SnapshotPaths {
    file: PathBuf,
    tmp: PathBuf,
}

/// JSON-file backed order store.
pub struct JsonOrderStore {
    /// `None` keeps the store memory-only.
    paths: Option<SnapshotPaths>,
    orders: RwLock<HashMap<Uuid, OrderRecord>>,
}

impl JsonOrderStore {
    /// Open (or create) the store in the given data directory, loading
    /// any existing snapshot.
    pub async fn open(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        let paths = SnapshotPaths {
            file: dir.join("orders.json"),
            tmp: dir.join("orders.json.tmp"),
        };
        let orders = Self::load(&paths.file).await?;

        info!(
            path = %paths.file.display(),
            orders = orders.len(),
            "Order store opened"
        );

        Ok(Self {
            paths: Some(paths),
            orders: RwLock::new(orders),
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            paths: None,
            orders: RwLock::new(HashMap::new()),
        }
    }

    async fn load(path: &Path) -> Result<HashMap<Uuid, OrderRecord>> {
        if !path.exists() {
            info!("No order snapshot found, starting fresh");
            return Ok(HashMap::new());
        }

        let json = fs::read_to_string(path)
            .await
            .context("Failed to read order snapshot")?;
        let snapshot: OrderSnapshot =
            serde_json::from_str(&json).context("Failed to parse order snapshot")?;
        anyhow::ensure!(
            snapshot.version == SNAPSHOT_VERSION,
            "Unsupported order snapshot version {}",
            snapshot.version
        );

        Ok(snapshot
            .orders
            .into_iter()
            .map(|record| (record.id, record))
            .collect())
    }

    /// Write the whole map atomically (tmp → rename). Callers hold the
    /// write lock, so snapshots never interleave.
    async fn persist(&self, orders: &HashMap<Uuid, OrderRecord>) -> Result<()> {
        let Some(paths) = &self.paths else {
            return Ok(());
        };

        let mut records: Vec<&OrderRecord> = orders.values().collect();
        records.sort_by_key(|r| r.created_at);

        let json = serde_json::to_string_pretty(&serde_json::json!({
            "version": SNAPSHOT_VERSION,
            "orders": records,
        }))
        .context("Failed to serialize orders")?;

        fs::write(&paths.tmp, &json)
            .await
            .context("Failed to write tmp order snapshot")?;
        fs::rename(&paths.tmp, &paths.file)
            .await
            .context("Failed to rename order snapshot")?;

        debug!(orders = records.len(), "Order snapshot saved");
        Ok(())
    }
}

#[async_trait]
impl OrderStore for JsonOrderStore {
    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn insert(&self, record: &OrderRecord) -> Result<()> {
        let mut orders = self.orders.write().await;
        anyhow::ensure!(
            !orders.contains_key(&record.id),
            "Order {} already exists",
            record.id
        );
        orders.insert(record.id, record.clone());
        if let Err(e) = self.persist(&orders).await {
            orders.remove(&record.id);
            return Err(e);
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrderRecord>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list(&self, query: &OrderQuery) -> Result<Vec<OrderRecord>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<OrderRecord> = orders
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(query.limit);
        Ok(matching)
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<OrderRecord> {
        let mut orders = self.orders.write().await;
        let record = orders
            .get_mut(&id)
            .with_context(|| format!("Order {id} not found"))?;

        let previous = record.clone();
        record.transition(status)?;
        let updated = record.clone();

        if let Err(e) = self.persist(&orders).await {
            orders.insert(id, previous);
            return Err(e);
        }

        info!(status = %updated.status, "Order status updated");
        Ok(updated)
    }

    async fn is_healthy(&self) -> bool {
        match &self.paths {
            None => true,
            Some(paths) if !paths.file.exists() => true,
            Some(paths) => fs::metadata(&paths.file).await.is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calculation::{CalculationRequest, OrderCalculationEngine};
    use crate::domain::routing::{LegSubmission, TradeIntent};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn record(owner: &str, age_secs: i64) -> OrderRecord {
        let intent = TradeIntent {
            request: CalculationRequest::new(dec!(100), dec!(95), dec!(1)),
            input_token: "SOL".to_string(),
            output_token: "USDC".to_string(),
            owner: owner.to_string(),
        };
        let set = OrderCalculationEngine::default()
            .calculate(&intent.request)
            .unwrap();
        let leg = LegSubmission::route(&intent, &set.buy_order);
        let mut record = OrderRecord::new_pending(
            &intent,
            &set.buy_order,
            &leg,
            "handle".to_string(),
            "req".to_string(),
            "AQID".to_string(),
        )
        .unwrap();
        record.created_at -= Duration::seconds(age_secs);
        record
    }

    fn temp_dir() -> String {
        std::env::temp_dir()
            .join(format!("order-store-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let store = JsonOrderStore::in_memory();
        let old = record("alice", 60);
        let new = record("alice", 0);
        let other = record("bob", 30);
        for r in [&old, &new, &other] {
            store.insert(r).await.unwrap();
        }

        let query = OrderQuery {
            owner: Some("alice".to_string()),
            ..OrderQuery::default()
        };
        let listed = store.list(&query).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, new.id);
        assert_eq!(listed[1].id, old.id);

        let limited = store
            .list(&OrderQuery {
                limit: 1,
                ..OrderQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, new.id);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = JsonOrderStore::in_memory();
        let r = record("alice", 0);
        store.insert(&r).await.unwrap();
        assert!(store.insert(&r).await.is_err());
    }

    #[tokio::test]
    async fn test_terminal_status_is_final() {
        let store = JsonOrderStore::in_memory();
        let r = record("alice", 0);
        store.insert(&r).await.unwrap();

        let updated = store.update_status(r.id, OrderStatus::Executed).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Executed);

        assert!(store.update_status(r.id, OrderStatus::Cancelled).await.is_err());
        let stored = store.get(r.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Executed);
    }

    #[tokio::test]
    async fn test_unknown_order_update_fails() {
        let store = JsonOrderStore::in_memory();
        let err = store
            .update_status(Uuid::new_v4(), OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = temp_dir();
        let r = record("alice", 0);
        {
            let store = JsonOrderStore::open(&dir).await.unwrap();
            store.insert(&r).await.unwrap();
            store.update_status(r.id, OrderStatus::Cancelled).await.unwrap();
        }

        let reopened = JsonOrderStore::open(&dir).await.unwrap();
        let loaded = reopened.get(r.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Cancelled);
        assert_eq!(loaded.metadata, r.metadata);
        assert!(reopened.is_healthy().await);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
