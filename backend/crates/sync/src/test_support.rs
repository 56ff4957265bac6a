//! In-memory fakes for the marketplace and the repositories.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use printdesk_common::error::{PrintdeskError, PrintdeskResult};
use printdesk_db::checks::models::{AutomatedCheck, CheckStatus};
use printdesk_db::checks::repositories::AutomatedCheckRepository;
use printdesk_db::orders::models::OrderUpsert;
use printdesk_db::orders::repositories::OrderRepository;
use printdesk_db::products::models::{NewProduct, Product};
use printdesk_db::products::repositories::ProductRepository;
use printdesk_db::sync::models::{NewSyncHistory, SyncHistory, SyncLock};
use printdesk_db::sync::repositories::{SyncHistoryRepository, SyncLockRepository};
use printdesk_marketplace::{
    AccessToken, ExternalOrder, ExternalOrderItem, Marketplace, OrderItemsPage, OrderStatus,
    OrdersPage, SpApiError,
};
use tokio::time::Instant;
use uuid::Uuid;

pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, day, hour, 0, 0).unwrap()
}

pub fn order(id: &str, status: OrderStatus, purchase_date: DateTime<Utc>) -> ExternalOrder {
    ExternalOrder {
        amazon_order_id: id.to_string(),
        status,
        purchase_date,
    }
}

pub fn item(asin: &str, title: &str) -> ExternalOrderItem {
    ExternalOrderItem {
        asin: asin.to_string(),
        title: title.to_string(),
        quantity_ordered: 1,
        seller_sku: None,
    }
}

// ── Marketplace ─────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeMarketplace {
    pub token_error: bool,
    pub pages: Mutex<VecDeque<Result<OrdersPage, String>>>,
    pub items: Mutex<HashMap<String, Vec<ExternalOrderItem>>>,
    pub failing_items: Mutex<Vec<String>>,
    pub token_calls: AtomicU32,
    pub order_calls: AtomicU32,
    pub cursors_seen: Mutex<Vec<Option<String>>>,
    pub order_call_times: Mutex<Vec<Instant>>,
}

impl FakeMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, orders: Vec<ExternalOrder>, next_cursor: Option<&str>) -> Self {
        self.pages.lock().unwrap().push_back(Ok(OrdersPage {
            orders,
            next_cursor: next_cursor.map(str::to_string),
        }));
        self
    }

    pub fn with_page_error(self, message: &str) -> Self {
        self.pages
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn with_items(self, order_id: &str, items: Vec<ExternalOrderItem>) -> Self {
        self.items
            .lock()
            .unwrap()
            .insert(order_id.to_string(), items);
        self
    }

    pub fn with_failing_items(self, order_id: &str) -> Self {
        self.failing_items
            .lock()
            .unwrap()
            .push(order_id.to_string());
        self
    }

    pub fn with_token_error(mut self) -> Self {
        self.token_error = true;
        self
    }
}

#[async_trait]
impl Marketplace for FakeMarketplace {
    async fn get_access_token(&self) -> Result<AccessToken, SpApiError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        if self.token_error {
            return Err(SpApiError::Auth {
                attempts: 4,
                last_error: "HTTP 400 Bad Request: invalid_grant".to_string(),
            });
        }
        Ok(AccessToken::new("Atza|fake"))
    }

    async fn get_orders(
        &self,
        _token: &AccessToken,
        _created_after: DateTime<Utc>,
        cursor: Option<&str>,
        _deadline: Option<Instant>,
    ) -> Result<OrdersPage, SpApiError> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        self.order_call_times.lock().unwrap().push(Instant::now());
        self.cursors_seen
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));

        match self.pages.lock().unwrap().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(SpApiError::MaxRetriesExceeded {
                attempts: 10,
                last_error: message,
            }),
            None => Ok(OrdersPage::default()),
        }
    }

    async fn get_order_items(
        &self,
        _token: &AccessToken,
        order_id: &str,
    ) -> Result<OrderItemsPage, SpApiError> {
        if self
            .failing_items
            .lock()
            .unwrap()
            .iter()
            .any(|id| id == order_id)
        {
            return Err(SpApiError::MaxRetriesExceeded {
                attempts: 4,
                last_error: "HTTP 500 Internal Server Error".to_string(),
            });
        }
        let items = self
            .items
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .unwrap_or_default();
        Ok(OrderItemsPage {
            payload: serde_json::json!({ "AmazonOrderId": order_id, "OrderItems": items }),
            items,
        })
    }
}

// ── Products ────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryProducts {
    pub rows: Mutex<HashMap<String, Product>>,
    /// Number of upcoming calls that fail with a database error.
    pub failures_left: AtomicU32,
    pub calls: AtomicU32,
}

impl InMemoryProducts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(times: u32) -> Self {
        let repo = Self::default();
        repo.failures_left.store(times, Ordering::SeqCst);
        repo
    }

    pub fn title_of(&self, asin: &str) -> Option<String> {
        self.rows.lock().unwrap().get(asin).map(|p| p.title.clone())
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn maybe_fail(&self) -> PrintdeskResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(PrintdeskError::Database("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProducts {
    async fn find_by_asin(&self, asin: &str) -> PrintdeskResult<Option<Product>> {
        self.maybe_fail()?;
        Ok(self.rows.lock().unwrap().get(asin).cloned())
    }

    async fn insert_if_absent(&self, product: &NewProduct) -> PrintdeskResult<bool> {
        self.maybe_fail()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&product.asin) {
            return Ok(false);
        }
        let now = Utc::now();
        rows.insert(
            product.asin.clone(),
            Product {
                id: Uuid::new_v4(),
                asin: product.asin.clone(),
                title: product.title.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(true)
    }
}

// ── Orders ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryOrders {
    pub upserts: Mutex<Vec<OrderUpsert>>,
    pub failures_left: AtomicU32,
    pub failing_order: Mutex<Option<String>>,
    pub calls: AtomicU32,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(times: u32) -> Self {
        let repo = Self::default();
        repo.failures_left.store(times, Ordering::SeqCst);
        repo
    }

    /// Every upsert of `order_id` fails.
    pub fn always_failing_for(order_id: &str) -> Self {
        let repo = Self::default();
        *repo.failing_order.lock().unwrap() = Some(order_id.to_string());
        repo
    }

    pub fn persisted_ids(&self) -> Vec<String> {
        self.upserts
            .lock()
            .unwrap()
            .iter()
            .map(|o| o.amazon_order_id.clone())
            .collect()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn upsert_with_status(&self, order: &OrderUpsert) -> PrintdeskResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_order.lock().unwrap().as_deref() == Some(order.amazon_order_id.as_str()) {
            return Err(PrintdeskError::Database("function raised".to_string()));
        }
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(PrintdeskError::Database("deadlock detected".to_string()));
        }
        self.upserts.lock().unwrap().push(order.clone());
        Ok(())
    }
}

// ── Sync history + lock ─────────────────────────────────────────

pub struct InMemorySyncStore {
    pub history: Mutex<Vec<SyncHistory>>,
    pub holder: Mutex<Option<Uuid>>,
    pub last_synced_at: Mutex<Option<DateTime<Utc>>>,
    pub heartbeats: AtomicU32,
    pub releases: AtomicU32,
}

impl InMemorySyncStore {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(Vec::new()),
            holder: Mutex::new(None),
            last_synced_at: Mutex::new(None),
            heartbeats: AtomicU32::new(0),
            releases: AtomicU32::new(0),
        }
    }

    pub fn with_watermark(self, at: DateTime<Utc>) -> Self {
        *self.last_synced_at.lock().unwrap() = Some(at);
        self
    }

    /// Simulate another run holding a fresh lock.
    pub fn held_by_other_run(self) -> Self {
        *self.holder.lock().unwrap() = Some(Uuid::new_v4());
        self
    }

    pub fn history(&self) -> Vec<SyncHistory> {
        self.history.lock().unwrap().clone()
    }

    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        *self.last_synced_at.lock().unwrap()
    }

    pub fn is_locked(&self) -> bool {
        self.holder.lock().unwrap().is_some()
    }

    fn lock_row(&self, sync_type: &str) -> SyncLock {
        let holder = *self.holder.lock().unwrap();
        SyncLock {
            sync_type: sync_type.to_string(),
            status: if holder.is_some() { "running" } else { "idle" }.to_string(),
            run_id: holder,
            heartbeat_at: holder.map(|_| Utc::now()),
            last_synced_at: self.watermark(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SyncHistoryRepository for InMemorySyncStore {
    async fn insert(&self, entry: NewSyncHistory) -> PrintdeskResult<SyncHistory> {
        let row = SyncHistory {
            id: Uuid::new_v4(),
            sync_type: entry.sync_type,
            started_at: entry.started_at,
            completed_at: entry.completed_at,
            items_processed: entry.items_processed,
            status: entry.status,
            error_message: entry.error_message,
            created_at: Utc::now(),
        };
        self.history.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_recent(&self, sync_type: &str, limit: i64) -> PrintdeskResult<Vec<SyncHistory>> {
        Ok(self
            .history()
            .into_iter()
            .rev()
            .filter(|h| h.sync_type == sync_type)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl SyncLockRepository for InMemorySyncStore {
    async fn get_or_create(&self, sync_type: &str) -> PrintdeskResult<SyncLock> {
        Ok(self.lock_row(sync_type))
    }

    async fn acquire_lock(
        &self,
        sync_type: &str,
        run_id: Uuid,
        _stale_before: DateTime<Utc>,
    ) -> PrintdeskResult<Option<SyncLock>> {
        {
            let mut holder = self.holder.lock().unwrap();
            if holder.is_some() {
                return Ok(None);
            }
            *holder = Some(run_id);
        }
        Ok(Some(self.lock_row(sync_type)))
    }

    async fn heartbeat(&self, _sync_type: &str, _run_id: Uuid) -> PrintdeskResult<()> {
        self.heartbeats.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn advance_watermark(
        &self,
        _sync_type: &str,
        _run_id: Uuid,
        synced_through: DateTime<Utc>,
    ) -> PrintdeskResult<()> {
        let mut current = self.last_synced_at.lock().unwrap();
        if current.map_or(true, |c| synced_through > c) {
            *current = Some(synced_through);
        }
        Ok(())
    }

    async fn release_lock(&self, _sync_type: &str, run_id: Uuid) -> PrintdeskResult<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        let mut holder = self.holder.lock().unwrap();
        if *holder == Some(run_id) {
            *holder = None;
        }
        Ok(())
    }
}

// ── Automated checks ────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryChecks {
    pub rows: Mutex<Vec<AutomatedCheck>>,
    pub rule_error: Option<String>,
    pub finish_error: Option<String>,
    pub rule_calls: AtomicU32,
    pub finishes: AtomicU32,
}

impl InMemoryChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule_error(message: &str) -> Self {
        Self {
            rule_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_finish_error(message: &str) -> Self {
        Self {
            finish_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<AutomatedCheck> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutomatedCheckRepository for InMemoryChecks {
    async fn start(&self, check_type: &str) -> PrintdeskResult<AutomatedCheck> {
        let check = AutomatedCheck {
            id: Uuid::new_v4(),
            check_type: check_type.to_string(),
            status: CheckStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        };
        self.rows.lock().unwrap().push(check.clone());
        Ok(check)
    }

    async fn finish(
        &self,
        id: Uuid,
        status: CheckStatus,
        error_message: Option<&str>,
    ) -> PrintdeskResult<AutomatedCheck> {
        self.finishes.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.finish_error {
            return Err(PrintdeskError::Database(message.clone()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PrintdeskError::NotFound(format!("automated check {id}")))?;
        row.status = status;
        row.completed_at = Some(Utc::now());
        row.error_message = error_message.map(str::to_string);
        Ok(row.clone())
    }

    async fn evaluate_alert_rules(&self) -> PrintdeskResult<()> {
        self.rule_calls.fetch_add(1, Ordering::SeqCst);
        match &self.rule_error {
            Some(message) => Err(PrintdeskError::Database(message.clone())),
            None => Ok(()),
        }
    }
}
