//! `records` sub-commands: read-only views and manual cleanup of the store.

use addrfix_core::{OrderId, StoreRecord};
use addrfix_store::PersistenceStore;
use chrono::{DateTime, Utc};
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum RecordsCommands {
    /// List every stored record
    List,
    /// Print one record as stored
    Show {
        #[arg(long)]
        order: String,
    },
    /// Delete one record
    Clear {
        #[arg(long)]
        order: String,
    },
}

pub(crate) fn parse_order(raw: &str) -> anyhow::Result<OrderId> {
    OrderId::parse(raw).ok_or_else(|| anyhow::anyhow!("order id must not be blank"))
}

pub(crate) fn run(store: &PersistenceStore, command: RecordsCommands) -> anyhow::Result<()> {
    match command {
        RecordsCommands::List => {
            let records = store.records();
            if records.is_empty() {
                println!("no stored addresses");
            }
            for record in &records {
                println!("{}", describe(record));
            }
        }
        RecordsCommands::Show { order } => {
            let order_id = parse_order(&order)?;
            match store.raw(&order_id) {
                Some(raw) => println!("{} = {raw}", store.key(&order_id)),
                None => println!("no stored address for order {order_id}"),
            }
        }
        RecordsCommands::Clear { order } => {
            let order_id = parse_order(&order)?;
            store.remove(&order_id);
            println!("cleared order {order_id}");
        }
    }
    Ok(())
}

/// One-line summary: order, label, origin and capture time.
pub(crate) fn describe(record: &StoreRecord) -> String {
    let origin = if record.is_user_selected() {
        format!(
            "user-selected (store {})",
            record.store_id.as_deref().unwrap_or("?")
        )
    } else {
        "captured".to_string()
    };
    let at = DateTime::<Utc>::from_timestamp_millis(record.timestamp)
        .map_or_else(|| record.timestamp.to_string(), |at| at.to_rfc3339());
    format!(
        "order {}: \"{}\" [{origin}] at {at}",
        record.order_id, record.store_label
    )
}
