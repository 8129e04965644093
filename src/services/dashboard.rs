//! IT dashboard: keeps the operator's view of pending setups and current IT
//! accounts fresh without a manual reload.
//!
//! One task owns the polling loop. Timer ticks, visibility changes and manual
//! refresh requests are funnelled through it, so refreshes never overlap, and
//! every refresh races the shutdown token so a torn-down dashboard drops its
//! in-flight requests instead of applying stale responses.

use crate::{
    models::{Department, ItAccount, ItAccountDraft, Notification, TelephonyProvider},
    services::{
        api_client::{ApiClient, ApiError},
        notification_store::NotificationStore,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const SERVER_RESTARTING_MESSAGE: &str = "Network error: Server might be restarting...";

/// Remote data the dashboard reconciles against.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    async fn fetch_it_accounts(&self) -> Result<Vec<ItAccount>, ApiError>;
    async fn fetch_departments(&self) -> Result<Vec<Department>, ApiError>;
}

#[async_trait]
impl DashboardBackend for ApiClient {
    async fn fetch_it_accounts(&self) -> Result<Vec<ItAccount>, ApiError> {
        self.list_it_accounts().await
    }

    async fn fetch_departments(&self) -> Result<Vec<Department>, ApiError> {
        self.list_departments().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshTrigger {
    Timer,
    Visible,
    Manual,
}

/// A pending notification plus whether the backend already holds an IT
/// account for that employee.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSetup {
    pub notification: Notification,
    pub has_account: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub records: Vec<ItAccount>,
    pub departments: Vec<Department>,
    pub pending: Vec<PendingSetup>,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_refreshing: bool,
}

impl DashboardSnapshot {
    /// True when the IT-account list was never loaded or is older than `max_age`.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.last_updated {
            None => true,
            Some(at) => (Utc::now() - at)
                .to_std()
                .map(|age| age > max_age)
                .unwrap_or(false),
        }
    }

    /// IT accounts matching a department and a case-insensitive text query.
    ///
    /// `None` matches every department. The query is matched against the
    /// employee name, system id, email addresses, telephony id and provider;
    /// an empty query matches everything.
    pub fn filtered_records(&self, query: &str, department: Option<&str>) -> Vec<&ItAccount> {
        let query = query.to_lowercase();
        self.records
            .iter()
            .filter(|record| department.map_or(true, |d| record.department.as_deref() == Some(d)))
            .filter(|record| query.is_empty() || search_text(record).contains(&query))
            .collect()
    }
}

fn search_text(record: &ItAccount) -> String {
    // accounts without a provider are Vitel lines
    let provider = match record.telephony.provider {
        Some(TelephonyProvider::Vonage) => "vonage",
        _ => "vitel",
    };
    let emails: Vec<&str> = record.emails.iter().map(|e| e.email.as_str()).collect();
    format!(
        "{} {} {} {} {}",
        record.employee_name,
        record.system_id,
        emails.join(" "),
        record.telephony.id.as_deref().unwrap_or(""),
        provider
    )
    .to_lowercase()
}

/// Pairs pending notifications with the accounts already on the server.
pub fn reconcile(pending: Vec<Notification>, records: &[ItAccount]) -> Vec<PendingSetup> {
    let provisioned: HashSet<&str> = records.iter().map(|r| r.employee_id.as_str()).collect();
    pending
        .into_iter()
        .map(|notification| PendingSetup {
            has_account: provisioned.contains(notification.employee_id.as_str()),
            notification,
        })
        .collect()
}

pub struct Dashboard {
    backend: Arc<dyn DashboardBackend>,
    store: Arc<NotificationStore>,
    poll_interval: Duration,
    snapshot: watch::Sender<DashboardSnapshot>,
    refresh_requested: Notify,
}

impl Dashboard {
    pub fn new(
        backend: Arc<dyn DashboardBackend>,
        store: Arc<NotificationStore>,
        poll_interval: Duration,
    ) -> Self {
        let (snapshot, _) = watch::channel(DashboardSnapshot::default());
        Self {
            backend,
            store,
            poll_interval,
            snapshot,
            refresh_requested: Notify::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Asks the running loop for a full refresh. Requests made while a
    /// refresh is already running collapse into one follow-up refresh.
    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    /// Opens the IT account form for a pending notification.
    ///
    /// The notification stays pending; only a completed setup marks it.
    pub fn select(&self, notification_id: &str) -> Option<ItAccountDraft> {
        let notification = self
            .store
            .get(notification_id)
            .filter(Notification::is_pending)?;
        info!(
            "Opening IT setup for {} ({})",
            notification.employee_name, notification.employee_id
        );
        Some(ItAccountDraft::from(&notification))
    }

    /// Runs until `shutdown` is cancelled.
    pub async fn run(
        self: Arc<Self>,
        mut visibility: watch::Receiver<Visibility>,
        shutdown: CancellationToken,
    ) {
        info!("IT dashboard started, polling every {:?}", self.poll_interval);
        visibility.borrow_and_update();

        tokio::select! {
            _ = shutdown.cancelled() => {
                self.stop();
                return;
            }
            _ = self.load_all() => {}
        }

        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut visibility_open = true;

        loop {
            let trigger = tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if !visibility.borrow().is_visible() {
                        debug!("Dashboard hidden, skipping poll");
                        continue;
                    }
                    RefreshTrigger::Timer
                }
                changed = visibility.changed(), if visibility_open => {
                    if changed.is_err() {
                        // sender gone: keep the last known state for good
                        visibility_open = false;
                        continue;
                    }
                    if !visibility.borrow_and_update().is_visible() {
                        continue;
                    }
                    RefreshTrigger::Visible
                }
                _ = self.refresh_requested.notified() => RefreshTrigger::Manual,
            };

            debug!("Dashboard refresh triggered by {:?}", trigger);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.refresh(trigger) => {}
            }

            // whatever happened during the refresh is already covered by it
            ticker.reset();
            visibility.borrow_and_update();
        }

        self.stop();
    }

    fn stop(&self) {
        self.snapshot.send_modify(|s| s.is_refreshing = false);
        info!("IT dashboard stopped");
    }

    /// Mount-time load: accounts and departments in parallel, then the local queue.
    async fn load_all(&self) {
        self.snapshot.send_modify(|s| s.is_refreshing = true);
        futures::join!(self.load_it_records(), self.load_departments());
        self.load_pending();
        self.snapshot.send_modify(|s| s.is_refreshing = false);
    }

    async fn refresh(&self, trigger: RefreshTrigger) {
        match trigger {
            RefreshTrigger::Manual => self.load_all().await,
            RefreshTrigger::Timer | RefreshTrigger::Visible => {
                self.load_it_records().await;
                self.load_pending();
            }
        }
    }

    async fn load_it_records(&self) {
        match self.backend.fetch_it_accounts().await {
            Ok(records) => {
                debug!("Loaded {} IT accounts", records.len());
                self.snapshot.send_modify(|s| {
                    s.records = records;
                    s.last_error = None;
                    s.last_updated = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!("Failed to load IT records: {}", e);
                let message = if e.is_network() || e.is_unexplained() {
                    SERVER_RESTARTING_MESSAGE.to_string()
                } else {
                    e.message
                };
                self.snapshot.send_modify(|s| s.last_error = Some(message));
            }
        }
    }

    async fn load_departments(&self) {
        match self.backend.fetch_departments().await {
            Ok(departments) => self.snapshot.send_modify(|s| s.departments = departments),
            Err(e) => warn!("Failed to load departments, keeping previous list: {}", e),
        }
    }

    fn load_pending(&self) {
        let pending = self.store.list_pending();
        self.snapshot.send_modify(|s| s.pending = reconcile(pending, &s.records));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailCredential;
    use crate::services::notifier::NotificationProducer;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeBackend {
        accounts: Mutex<Vec<ItAccount>>,
        failing: AtomicBool,
        account_calls: AtomicUsize,
        department_calls: AtomicUsize,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl DashboardBackend for FakeBackend {
        async fn fetch_it_accounts(&self) -> Result<Vec<ItAccount>, ApiError> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                time::sleep(delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(ApiError::new(0, "connection refused"));
            }
            Ok(self.accounts.lock().clone())
        }

        async fn fetch_departments(&self) -> Result<Vec<Department>, ApiError> {
            self.department_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Department {
                id: "d1".to_string(),
                name: "Engineering".to_string(),
                created_at: Utc::now(),
            }])
        }
    }

    fn account_for(employee_id: &str) -> ItAccount {
        let now = Utc::now();
        ItAccount {
            id: format!("acc-{}", employee_id),
            employee_id: employee_id.to_string(),
            employee_name: "Someone".to_string(),
            system_id: format!("SYS-{}", employee_id),
            table_number: None,
            department: None,
            emails: Vec::new(),
            telephony: Default::default(),
            license: Default::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    struct Harness {
        backend: Arc<FakeBackend>,
        store: Arc<NotificationStore>,
        dashboard: Arc<Dashboard>,
        visibility: watch::Sender<Visibility>,
        shutdown: CancellationToken,
        handle: tokio::task::JoinHandle<()>,
    }

    fn start(backend: FakeBackend) -> Harness {
        let backend = Arc::new(backend);
        let store = Arc::new(NotificationStore::in_memory());
        let dashboard = Arc::new(Dashboard::new(
            backend.clone(),
            store.clone(),
            Duration::from_secs(10),
        ));
        let (visibility, visibility_rx) = watch::channel(Visibility::Visible);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(dashboard.clone().run(visibility_rx, shutdown.clone()));
        Harness {
            backend,
            store,
            dashboard,
            visibility,
            shutdown,
            handle,
        }
    }

    async fn settle() {
        time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn mount_loads_everything_and_reconciles() {
        let backend = FakeBackend::default();
        backend.accounts.lock().push(account_for("e1"));
        let h = start(backend);
        let producer = NotificationProducer::new(h.store.clone());
        producer.notify_new_employee("e1", "Alice", "Engineering", "T1").unwrap();
        producer.notify_new_employee("e2", "Bob", "Engineering", "T2").unwrap();

        h.dashboard.request_refresh();
        settle().await;

        let snapshot = h.dashboard.snapshot();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.departments.len(), 1);
        assert_eq!(snapshot.pending.len(), 2);
        assert!(snapshot.pending[0].has_account);
        assert!(!snapshot.pending[1].has_account);
        assert!(snapshot.last_error.is_none());
        assert!(!snapshot.is_refreshing);

        h.shutdown.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timer_ticks_refresh_accounts_but_not_departments() {
        let h = start(FakeBackend::default());
        settle().await;
        assert_eq!(h.backend.account_calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(31)).await;
        assert_eq!(h.backend.account_calls.load(Ordering::SeqCst), 4);
        assert_eq!(h.backend.department_calls.load(Ordering::SeqCst), 1);

        h.shutdown.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_dashboard_skips_ticks_and_refreshes_on_return() {
        let h = start(FakeBackend::default());
        settle().await;

        h.visibility.send(Visibility::Hidden).unwrap();
        time::sleep(Duration::from_secs(35)).await;
        assert_eq!(h.backend.account_calls.load(Ordering::SeqCst), 1);

        h.visibility.send(Visibility::Visible).unwrap();
        settle().await;
        assert_eq!(h.backend.account_calls.load(Ordering::SeqCst), 2);

        h.shutdown.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_is_reported_and_retried() {
        let backend = FakeBackend::default();
        backend.failing.store(true, Ordering::SeqCst);
        let h = start(backend);
        settle().await;

        let snapshot = h.dashboard.snapshot();
        assert_eq!(snapshot.last_error.as_deref(), Some(SERVER_RESTARTING_MESSAGE));
        assert!(snapshot.last_updated.is_none());
        assert!(snapshot.is_stale(Duration::from_secs(60)));

        h.backend.failing.store(false, Ordering::SeqCst);
        time::sleep(Duration::from_secs(10)).await;

        let snapshot = h.dashboard.snapshot();
        assert!(snapshot.last_error.is_none());
        assert!(snapshot.last_updated.is_some());

        h.shutdown.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_requests_coalesce() {
        let h = start(FakeBackend::default());
        settle().await;
        assert_eq!(h.backend.department_calls.load(Ordering::SeqCst), 1);

        // the first request wakes the idle loop, the rest collapse into one follow-up
        h.dashboard.request_refresh();
        h.dashboard.request_refresh();
        h.dashboard.request_refresh();
        settle().await;
        assert_eq!(h.backend.department_calls.load(Ordering::SeqCst), 3);

        settle().await;
        assert_eq!(h.backend.department_calls.load(Ordering::SeqCst), 3);

        h.shutdown.cancel();
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_drops_in_flight_fetch() {
        let backend = FakeBackend {
            delay: Some(Duration::from_secs(60)),
            ..FakeBackend::default()
        };
        backend.accounts.lock().push(account_for("e1"));
        let h = start(backend);
        settle().await;
        assert!(h.dashboard.snapshot().is_refreshing);

        h.shutdown.cancel();
        h.handle.await.unwrap();

        let snapshot = h.dashboard.snapshot();
        assert!(snapshot.records.is_empty());
        assert!(!snapshot.is_refreshing);
    }

    fn filter_fixture() -> DashboardSnapshot {
        let mut alice = account_for("e1");
        alice.employee_name = "Alice Smith".to_string();
        alice.department = Some("Engineering".to_string());
        alice.emails = vec![EmailCredential {
            email: "alice.smith@corp.example".to_string(),
            ..Default::default()
        }];
        alice.telephony.id = Some("VG-204".to_string());

        let mut bob = account_for("e2");
        bob.employee_name = "Bob Jones".to_string();
        bob.department = Some("Sales".to_string());
        bob.telephony.provider = Some(TelephonyProvider::Vonage);

        DashboardSnapshot {
            records: vec![alice, bob],
            ..Default::default()
        }
    }

    fn names(records: Vec<&ItAccount>) -> Vec<&str> {
        records.into_iter().map(|r| r.employee_name.as_str()).collect()
    }

    #[test]
    fn filter_by_department() {
        let snapshot = filter_fixture();
        assert_eq!(names(snapshot.filtered_records("", Some("Sales"))), vec!["Bob Jones"]);
        assert_eq!(names(snapshot.filtered_records("", None)).len(), 2);
        assert!(snapshot.filtered_records("", Some("sales")).is_empty());
        assert!(snapshot.filtered_records("alice", Some("Sales")).is_empty());
    }

    #[test]
    fn filter_matches_email_and_telephony_id() {
        let snapshot = filter_fixture();
        assert_eq!(names(snapshot.filtered_records("SMITH@CORP", None)), vec!["Alice Smith"]);
        assert_eq!(names(snapshot.filtered_records("vg-204", None)), vec!["Alice Smith"]);
        assert_eq!(names(snapshot.filtered_records("sys-e2", None)), vec!["Bob Jones"]);
    }

    #[test]
    fn missing_provider_counts_as_vitel() {
        let snapshot = filter_fixture();
        assert_eq!(names(snapshot.filtered_records("vitel", None)), vec!["Alice Smith"]);
        assert_eq!(names(snapshot.filtered_records("vonage", None)), vec!["Bob Jones"]);
    }

    #[tokio::test(start_paused = true)]
    async fn bare_status_failure_reads_as_restart() {
        struct Bare;

        #[async_trait]
        impl DashboardBackend for Bare {
            async fn fetch_it_accounts(&self) -> Result<Vec<ItAccount>, ApiError> {
                Err(ApiError::new(502, "API request failed with status 502"))
            }

            async fn fetch_departments(&self) -> Result<Vec<Department>, ApiError> {
                Ok(Vec::new())
            }
        }

        let dashboard = Arc::new(Dashboard::new(
            Arc::new(Bare),
            Arc::new(NotificationStore::in_memory()),
            Duration::from_secs(10),
        ));
        let (_visibility, visibility_rx) = watch::channel(Visibility::Visible);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(dashboard.clone().run(visibility_rx, shutdown.clone()));
        settle().await;

        assert_eq!(
            dashboard.snapshot().last_error.as_deref(),
            Some(SERVER_RESTARTING_MESSAGE)
        );

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn select_builds_draft_without_processing() {
        let store = Arc::new(NotificationStore::in_memory());
        let dashboard = Dashboard::new(
            Arc::new(FakeBackend::default()),
            store.clone(),
            Duration::from_secs(10),
        );
        let n = NotificationProducer::new(store.clone())
            .notify_new_employee("e1", "Alice", "Engineering", "T12")
            .unwrap();

        let first = dashboard.select(&n.id).unwrap();
        let second = dashboard.select(&n.id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.table_number, "T12");
        assert_eq!(store.list_pending().len(), 1);

        store.mark_processed(&n.id).unwrap();
        assert!(dashboard.select(&n.id).is_none());
        assert!(dashboard.select("missing").is_none());
    }
}
