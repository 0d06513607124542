//! Drives the patch against a headless page so stored records can be
//! produced and checked without a browser.

use std::sync::Arc;
use std::time::Duration;

use addrfix_core::{AppConfig, OrderId, RouteConfig};
use addrfix_engine::{options_from_texts, HeadlessPage, PageOutcome, Patch, SelectElement};
use addrfix_store::PersistenceStore;

use crate::records::{describe, parse_order};
use crate::scenario::{Scenario, Step};

const SIMULATED_ORIGIN: &str = "https://erp.local";

pub(crate) fn detail_url(routes: &RouteConfig, order_id: &OrderId) -> String {
    format!(
        "{SIMULATED_ORIGIN}{}?{}={order_id}",
        routes.detail_path, routes.order_param
    )
}

pub(crate) fn edit_url(routes: &RouteConfig, order_id: &OrderId) -> String {
    format!(
        "{SIMULATED_ORIGIN}{}?{}={order_id}&{}=1",
        routes.edit_path, routes.order_param, routes.edit_param
    )
}

pub(crate) fn describe_outcome(outcome: Option<&PageOutcome>) -> String {
    match outcome {
        None => "page view was superseded before finishing".to_string(),
        Some(PageOutcome::Disabled) => "patch disabled for this page".to_string(),
        Some(PageOutcome::Ignored) => "page is not an order view".to_string(),
        Some(PageOutcome::Captured(true)) => "address captured".to_string(),
        Some(PageOutcome::Captured(false)) => "no address label to capture".to_string(),
        Some(PageOutcome::NoRecord) => "no stored address for this order".to_string(),
        Some(PageOutcome::Reconciled(report)) => format!(
            "order {}: {} after {} attempt(s)",
            report.order_id, report.state, report.attempts
        ),
    }
}

pub(crate) async fn capture(
    config: Arc<AppConfig>,
    store: Arc<PersistenceStore>,
    order: &str,
    label: &str,
) -> anyhow::Result<()> {
    let order_id = parse_order(order)?;
    let page = HeadlessPage::new();
    page.set_address_label(Some(label));

    let url = detail_url(&config.routes, &order_id);
    let mut patch = Patch::boot(config, Arc::clone(&store), page, &url)?;
    let outcome = patch.settle().await;
    println!("{}", describe_outcome(outcome.as_ref()));

    if let Some(record) = store.get(&order_id) {
        println!("{}", describe(&record));
    }
    Ok(())
}

pub(crate) async fn restore(
    config: Arc<AppConfig>,
    store: Arc<PersistenceStore>,
    order: &str,
    options: &[String],
) -> anyhow::Result<()> {
    if options.is_empty() {
        anyhow::bail!("at least one --option is required");
    }
    let order_id = parse_order(order)?;
    let page = HeadlessPage::new();
    let element = SelectElement::with_texts(options);
    page.mount(&config.control_marker, element.clone());

    let url = edit_url(&config.routes, &order_id);
    let mut patch = Patch::boot(config, store, page, &url)?;
    let outcome = patch.settle().await;
    println!("{}", describe_outcome(outcome.as_ref()));
    println!(
        "selected: {}",
        element.selected_text().unwrap_or_else(|| "(none)".to_string())
    );
    Ok(())
}

pub(crate) async fn replay(
    config: Arc<AppConfig>,
    store: Arc<PersistenceStore>,
    scenario: Scenario,
) -> anyhow::Result<()> {
    let page = HeadlessPage::new();
    let marker = config.control_marker.clone();
    let mut patch: Option<Patch<HeadlessPage>> = None;

    for (n, step) in scenario.steps.into_iter().enumerate() {
        tracing::debug!(step = n + 1, ?step, "replaying step");
        match step {
            Step::Navigate { url } => match patch.as_mut() {
                Some(active) => {
                    if !active.location_changed(&url)? {
                        println!("[{}] {url}: same page, nothing to do", n + 1);
                    }
                }
                None => {
                    let booted =
                        Patch::boot(Arc::clone(&config), Arc::clone(&store), page.clone(), &url)?;
                    if booted.is_disabled() {
                        println!("[{}] {url}: patch disabled", n + 1);
                    }
                    patch = Some(booted);
                }
            },
            Step::Label { text } => page.set_address_label(text.as_deref()),
            Step::Options { texts } => match page.element(&marker) {
                Some(element) => element.set_options(options_from_texts(&texts)),
                None => page.mount(&marker, SelectElement::with_texts(&texts)),
            },
            Step::Select { index } => {
                let element = page
                    .element(&marker)
                    .ok_or_else(|| anyhow::anyhow!("step {}: no address control rendered", n + 1))?;
                element.user_select(index);
            }
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
            Step::Settle => {
                let outcome = match patch.as_mut() {
                    Some(active) => active.settle().await,
                    None => None,
                };
                println!("[{}] {}", n + 1, describe_outcome(outcome.as_ref()));
            }
        }
    }

    if let Some(element) = page.element(&marker) {
        println!(
            "final selection: {}",
            element.selected_text().unwrap_or_else(|| "(none)".to_string())
        );
    }
    Ok(())
}
