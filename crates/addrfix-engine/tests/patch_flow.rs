//! End-to-end page flows through `Patch` on a headless page, with tokio's
//! clock paused so every timer fires deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use addrfix_core::{AppConfig, OrderId, StoreRecord};
use addrfix_engine::{
    options_from_texts, HeadlessPage, LoopReport, LoopState, Notification, OptionListControl,
    PageOutcome, Patch, SelectElement,
};
use addrfix_store::{MemoryBackend, PersistenceStore, StorageBackend, StoreError};
use chrono::Utc;

const MARKER: &str = "vm.model.address";
const DETAIL_URL: &str = "https://erp.example.com/Sales/OrderDetails?ID=42";
const EDIT_URL: &str = "https://erp.example.com/Sales/AddOrder?ID=42&edit=1";
const DISABLED_URL: &str = "https://erp.example.com/Sales/AddOrder?ID=42&edit=1&bind-nopatch";

fn order() -> OrderId {
    OrderId::parse("42").expect("valid order id")
}

fn seeded_store(label: &str) -> Arc<PersistenceStore> {
    let store = Arc::new(PersistenceStore::in_memory("bind"));
    assert!(store.set(&StoreRecord::suggested(order(), label, Utc::now())));
    store
}

fn reconciled(outcome: Option<PageOutcome>) -> LoopReport {
    match outcome {
        Some(PageOutcome::Reconciled(report)) => report,
        other => panic!("expected a reconcile outcome, got {other:?}"),
    }
}

#[derive(Clone, Default)]
struct CountingBackend {
    inner: Arc<MemoryBackend>,
    calls: Arc<AtomicUsize>,
}

impl StorageBackend for CountingBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.keys()
    }
}

#[tokio::test(start_paused = true)]
async fn captured_address_is_restored_on_edit() {
    let store = Arc::new(PersistenceStore::in_memory("bind"));
    let page = HeadlessPage::new();
    page.set_address_label(Some("Av. Siempre Viva 742"));

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page.clone(),
        DETAIL_URL,
    )
    .unwrap();
    assert_eq!(patch.settle().await, Some(PageOutcome::Captured(true)));
    let captured = store.get(&order()).expect("record captured");
    assert_eq!(captured.store_label, "Av. Siempre Viva 742");
    assert_eq!(captured.user_selected, None);

    let element = SelectElement::with_texts(&["Calle 10", " av.  siempre viva   742 "]);
    page.mount(MARKER, element.clone());
    assert!(patch.location_changed(EDIT_URL).unwrap());

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::Applied { index: 2 });
    assert_eq!(element.selected_index(), Some(2));
    assert_eq!(
        element.notifications(),
        vec![Notification::Input, Notification::Change, Notification::Blur]
    );
    assert!(store.get(&order()).is_none());
    assert_eq!(element.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn late_options_are_applied_after_debounce() {
    let store = seeded_store("Calle 99");
    let page = HeadlessPage::new();
    let element = SelectElement::with_texts(&["Calle 10"]);
    page.mount(MARKER, element.clone());

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page,
        EDIT_URL,
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;
    element.set_options(options_from_texts(&["Calle 10", "Calle 99"]));

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::Applied { index: 2 });
    assert_eq!(report.attempts, 3, "ticks at 0, 250 and 500 ms only");
    assert!(store.get(&order()).is_none());
}

#[tokio::test(start_paused = true)]
async fn user_choice_overrides_stored_address() {
    let store = seeded_store("Calle 99");
    let page = HeadlessPage::new();
    let element = SelectElement::with_texts(&["Calle 10", "Calle 11"]);
    page.mount(MARKER, element.clone());

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page,
        EDIT_URL,
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(610)).await;
    element.user_select(2);

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::UserOverridden);
    assert_eq!(report.attempts, 3);

    let stored = store.get(&order()).expect("record overwritten");
    assert_eq!(stored.store_id.as_deref(), Some("2"));
    assert_eq!(stored.store_label, "Calle 11");
    assert!(stored.is_user_selected());

    // Nothing automated touches the control afterwards.
    element.set_options(options_from_texts(&["Calle 99"]));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(element.value_writes(), 0);
    assert_eq!(element.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unmatched_label_expires_after_twenty_attempts() {
    let store = seeded_store("Nowhere 1");
    let before = store.raw(&order());
    let page = HeadlessPage::new();
    let element = SelectElement::with_texts(&["Calle 10", "Calle 11"]);
    page.mount(MARKER, element.clone());

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page,
        EDIT_URL,
    )
    .unwrap();

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::Expired);
    assert_eq!(report.attempts, 20);
    assert_eq!(store.raw(&order()), before);
    assert_eq!(element.value_writes(), 0);
    assert_eq!(element.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn safety_timeout_ends_slow_loop() {
    let store = seeded_store("Nowhere 1");
    let page = HeadlessPage::new();
    page.mount(MARKER, SelectElement::with_texts(&["Calle 10"]));

    let mut config = AppConfig::default();
    config.timings.retry_interval = Duration::from_millis(1_500);

    let started = tokio::time::Instant::now();
    let mut patch = Patch::boot(Arc::new(config), Arc::clone(&store), page, EDIT_URL).unwrap();

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::Expired);
    assert_eq!(report.attempts, 4, "ticks at 0, 1.5, 3 and 4.5 s");
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_secs(5) && elapsed < Duration::from_millis(6_000),
        "loop should end at the 5 s safety timeout, ended after {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn existing_selection_is_left_alone() {
    let store = seeded_store("Calle 10");
    let before = store.raw(&order());
    let page = HeadlessPage::new();
    let element = SelectElement::with_texts(&["Calle 10", "Calle 11"]);
    element.preselect(2);
    page.mount(MARKER, element.clone());

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page,
        EDIT_URL,
    )
    .unwrap();

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::Skipped);
    assert_eq!(element.selected_index(), Some(2));
    assert_eq!(element.value_writes(), 0);
    assert!(element.notifications().is_empty());
    assert_eq!(store.raw(&order()), before);
}

#[tokio::test(start_paused = true)]
async fn control_rendered_late_is_found_by_second_lookup() {
    let store = seeded_store("Calle 10");
    let page = HeadlessPage::new();

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page.clone(),
        EDIT_URL,
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(700)).await;
    let element = SelectElement::with_texts(&["Calle 10"]);
    page.mount(MARKER, element.clone());

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::Applied { index: 1 });
    assert_eq!(page.lookups(), 3);
}

#[tokio::test(start_paused = true)]
async fn control_never_rendered_ends_quietly() {
    let store = seeded_store("Calle 10");
    let before = store.raw(&order());
    let page = HeadlessPage::new();

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page.clone(),
        EDIT_URL,
    )
    .unwrap();

    let report = reconciled(patch.settle().await);
    assert_eq!(report.state, LoopState::ControlMissing);
    assert_eq!(page.lookups(), 3);
    assert_eq!(store.raw(&order()), before);
}

#[tokio::test(start_paused = true)]
async fn edit_without_record_does_nothing() {
    let store = Arc::new(PersistenceStore::in_memory("bind"));
    let page = HeadlessPage::new();
    page.mount(MARKER, SelectElement::with_texts(&["Calle 10"]));

    let mut patch = Patch::boot(Arc::new(AppConfig::default()), store, page.clone(), EDIT_URL)
        .unwrap();

    assert_eq!(patch.settle().await, Some(PageOutcome::NoRecord));
    assert_eq!(page.lookups(), 0);
}

#[tokio::test(start_paused = true)]
async fn disable_flag_makes_patch_inert_for_page_lifetime() {
    let backend = CountingBackend::default();
    let calls = Arc::clone(&backend.calls);
    let store = Arc::new(PersistenceStore::new("bind", backend));
    let page = HeadlessPage::new();
    page.set_address_label(Some("Calle 10"));
    let element = SelectElement::with_texts(&["Calle 10"]);
    page.mount(MARKER, element.clone());

    let mut patch = Patch::boot(Arc::new(AppConfig::default()), store, page.clone(), DISABLED_URL)
        .unwrap();
    assert!(patch.is_disabled());
    assert_eq!(patch.settle().await, None);

    assert!(!patch.location_changed(DETAIL_URL).unwrap());
    assert!(!patch.location_changed(EDIT_URL).unwrap());
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(page.label_reads(), 0);
    assert_eq!(page.lookups(), 0);
    assert_eq!(element.value_writes(), 0);
    assert!(element.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn navigation_supersedes_running_loop() {
    let store = seeded_store("Nowhere 1");
    let before = store.raw(&order());
    let page = HeadlessPage::new();
    let element = SelectElement::with_texts(&["Calle 10"]);
    page.mount(MARKER, element.clone());

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page,
        EDIT_URL,
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(element.subscriber_count(), 1);

    assert!(patch
        .location_changed("https://erp.example.com/Sales/Orders")
        .unwrap());
    assert_eq!(patch.settle().await, Some(PageOutcome::Ignored));

    assert_eq!(element.subscriber_count(), 0);
    assert_eq!(store.raw(&order()), before);
}

#[tokio::test(start_paused = true)]
async fn same_url_is_not_redispatched() {
    let store = Arc::new(PersistenceStore::in_memory("bind"));
    let page = HeadlessPage::new();
    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        store,
        page,
        "https://erp.example.com/Home",
    )
    .unwrap();

    assert_eq!(patch.settle().await, Some(PageOutcome::Ignored));
    assert!(!patch.location_changed("https://erp.example.com/Home").unwrap());
    assert_eq!(patch.settle().await, None);
}

#[tokio::test(start_paused = true)]
async fn unparsable_navigation_keeps_current_view() {
    let store = seeded_store("Nowhere 1");
    let page = HeadlessPage::new();
    let element = SelectElement::with_texts(&["Calle 10"]);
    page.mount(MARKER, element.clone());

    let mut patch = Patch::boot(
        Arc::new(AppConfig::default()),
        Arc::clone(&store),
        page,
        EDIT_URL,
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(1_000)).await;

    assert!(patch.location_changed("not a url").is_err());
    assert!(patch.location_changed("not a url").is_err());
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(element.subscriber_count(), 1);

    assert!(!patch.location_changed(EDIT_URL).unwrap());
    assert!(patch
        .location_changed("https://erp.example.com/Sales/Orders")
        .unwrap());
    assert_eq!(patch.settle().await, Some(PageOutcome::Ignored));
}
