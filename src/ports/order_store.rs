//! Order Store Port - Order Record Persistence
//!
//! Stores one record per submitted leg, keyed by an opaque id. The store
//! handle is constructed once in `main` and passed to whoever needs it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{OrderRecord, OrderStatus};
use crate::domain::routing::OwnerId;

/// Default bound on list results.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Filter for order listings. Results are most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
  /// Only orders made by this owner.
  pub owner: Option<OwnerId>,
  /// Only orders in this status.
  pub status: Option<OrderStatus>,
  /// Maximum number of records returned.
  pub limit: usize,
}

impl Default for OrderQuery {
  fn default() -> Self {
    Self {
      owner: None,
      status: None,
      limit: DEFAULT_LIST_LIMIT,
    }
  }
}

impl OrderQuery {
  /// Whether a record passes the owner/status filter.
  pub fn matches(&self, record: &OrderRecord) -> bool {
    self.owner.as_ref().is_none_or(|owner| &record.owner == owner)
      && self.status.is_none_or(|status| record.status == status)
  }
}

/// Trait for order record storage.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
  /// Persist a new record.
  async fn insert(&self, record: &OrderRecord) -> anyhow::Result<()>;

  /// Fetch a record by id.
  async fn get(&self, id: Uuid) -> anyhow::Result<Option<OrderRecord>>;

  /// List records matching the query, most recent first, bounded by `limit`.
  async fn list(&self, query: &OrderQuery) -> anyhow::Result<Vec<OrderRecord>>;

  /// Move a record to a new status and return the updated record.
  ///
  /// # Errors
  /// Unknown id, or a transition the lifecycle forbids.
  async fn update_status(&self, id: Uuid, status: OrderStatus) -> anyhow::Result<OrderRecord>;

  /// Check if the store is writable.
  async fn is_healthy(&self) -> bool;
}
