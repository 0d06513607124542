//! Top-level wiring: boot on a page, dispatch per route, follow in-app
//! navigation.

use std::sync::Arc;

use addrfix_core::AppConfig;
use addrfix_store::PersistenceStore;
use tokio::task::JoinHandle;
use url::Url;

use crate::capture::Capturer;
use crate::driver::drive;
use crate::error::EngineError;
use crate::navigation::NavigationTracker;
use crate::page::Page;
use crate::reconcile::{LoopReport, ReconcileSettings, Reconciler};
use crate::route::{parse_page_url, Route};

/// What one page view's dispatch ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Disabled,
    Ignored,
    /// Detail view; `true` if a record was written.
    Captured(bool),
    /// Edit view with nothing stored for the order.
    NoRecord,
    Reconciled(LoopReport),
}

/// The address patch attached to one browser page.
///
/// Each page view (the initial load and every in-app navigation) gets one
/// dispatch task. A newer page view aborts the previous view's task, so at
/// most one reconciliation loop runs per page.
pub struct Patch<P: Page> {
    config: Arc<AppConfig>,
    store: Arc<PersistenceStore>,
    page: P,
    /// `None` once the opt-out parameter was seen at boot.
    navigation: Option<NavigationTracker>,
    active: Option<JoinHandle<PageOutcome>>,
}

impl<P: Page> std::fmt::Debug for Patch<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Patch")
            .field("navigation", &self.navigation)
            .field("active", &self.active.is_some())
            .finish_non_exhaustive()
    }
}

impl<P: Page> Patch<P> {
    /// Attaches to a page loaded at `url` and dispatches immediately.
    ///
    /// With the opt-out parameter present the patch stays inert for the
    /// page's whole lifetime: no store access, no control access, and
    /// navigation is ignored.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidUrl`] if `url` cannot be parsed.
    pub fn boot(
        config: Arc<AppConfig>,
        store: Arc<PersistenceStore>,
        page: P,
        url: &str,
    ) -> Result<Self, EngineError> {
        let parsed = parse_page_url(url)?;
        let mut patch = Self {
            config,
            store,
            page,
            navigation: None,
            active: None,
        };

        if Route::resolve(&parsed, &patch.config.routes) == Route::Disabled {
            tracing::info!(%url, "address patch disabled by URL");
            return Ok(patch);
        }

        patch.navigation = Some(NavigationTracker::init(url));
        patch.spawn_dispatch(parsed, false);
        Ok(patch)
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.navigation.is_none()
    }

    /// Called by the navigation detector with the page's current URL.
    ///
    /// Returns `true` if the URL changed and a new dispatch was scheduled
    /// (after the configured navigation delay).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidUrl`] if a changed `url` cannot be parsed.
    pub fn location_changed(&mut self, url: &str) -> Result<bool, EngineError> {
        let Some(navigation) = self.navigation.as_mut() else {
            return Ok(false);
        };
        if navigation.current() == url {
            return Ok(false);
        }
        // An unparsable URL leaves the tracker and the running view alone.
        let parsed = parse_page_url(url)?;
        navigation.observe(url);
        tracing::debug!(%url, "in-app navigation detected");
        self.spawn_dispatch(parsed, true);
        Ok(true)
    }

    /// Waits for the current page view's dispatch to finish.
    ///
    /// Returns `None` if nothing was dispatched or the task was aborted.
    pub async fn settle(&mut self) -> Option<PageOutcome> {
        let handle = self.active.take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "page dispatch did not complete");
                None
            }
        }
    }

    fn spawn_dispatch(&mut self, url: Url, delayed: bool) {
        if let Some(previous) = self.active.take() {
            previous.abort();
        }
        let config = Arc::clone(&self.config);
        let store = Arc::clone(&self.store);
        let page = self.page.clone();
        self.active = Some(tokio::spawn(async move {
            if delayed {
                tokio::time::sleep(config.timings.navigation_delay).await;
            }
            dispatch(&config, store, page, &url).await
        }));
    }
}

impl<P: Page> Drop for Patch<P> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.abort();
        }
    }
}

/// Runs the handling `url` needs on `page`.
pub async fn dispatch<P: Page>(
    config: &AppConfig,
    store: Arc<PersistenceStore>,
    page: P,
    url: &Url,
) -> PageOutcome {
    match Route::resolve(url, &config.routes) {
        Route::Disabled => PageOutcome::Disabled,
        Route::Ignored => PageOutcome::Ignored,
        Route::Detail { order_id } => {
            let captured = Capturer::new(store)
                .capture_after(config.timings.capture_delay, &order_id, &page)
                .await;
            PageOutcome::Captured(captured)
        }
        Route::Edit { order_id } => {
            let Some(record) = store.get(&order_id) else {
                tracing::info!(%order_id, "no stored address for order");
                return PageOutcome::NoRecord;
            };
            tracing::info!(%order_id, label = %record.store_label, "restoring stored address");
            let machine = Reconciler::new(
                record,
                store,
                page,
                ReconcileSettings::from_app_config(config),
            );
            PageOutcome::Reconciled(drive(machine).await)
        }
    }
}
