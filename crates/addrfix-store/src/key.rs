use addrfix_core::OrderId;

/// Builds the storage key `<namespace>:order:<order_id>:store`.
#[must_use]
pub fn record_key(namespace: &str, order_id: &OrderId) -> String {
    format!("{namespace}:order:{order_id}:store")
}

/// Inverse of [`record_key`]. Returns `None` for keys outside `namespace`
/// or with a different shape.
#[must_use]
pub fn parse_record_key(namespace: &str, key: &str) -> Option<OrderId> {
    let rest = key.strip_prefix(namespace)?.strip_prefix(":order:")?;
    let id = rest.strip_suffix(":store")?;
    OrderId::parse(id)
}
