//! Maps a page URL to the handling it needs.

use addrfix_core::{OrderId, RouteConfig};
use url::Url;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The opt-out query parameter is present.
    Disabled,
    /// Order detail view: capture the displayed address.
    Detail { order_id: OrderId },
    /// Order editor in edit mode: restore the address.
    Edit { order_id: OrderId },
    /// Anything else, including detail or editor pages without an order id
    /// and the editor outside edit mode.
    Ignored,
}

impl Route {
    #[must_use]
    pub fn resolve(url: &Url, routes: &RouteConfig) -> Self {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        if param(&routes.disable_param).is_some() {
            return Self::Disabled;
        }

        let path = url.path();
        let order_id = param(&routes.order_param).and_then(|raw| OrderId::parse(&raw));

        if path.contains(&routes.detail_path) {
            return order_id.map_or(Self::Ignored, |order_id| Self::Detail { order_id });
        }
        if path.contains(&routes.edit_path) {
            let editing = param(&routes.edit_param).as_deref() == Some("1");
            return match order_id {
                Some(order_id) if editing => Self::Edit { order_id },
                _ => Self::Ignored,
            };
        }
        Self::Ignored
    }
}

/// # Errors
///
/// Returns [`EngineError::InvalidUrl`] if `raw` is not an absolute URL.
pub fn parse_page_url(raw: &str) -> Result<Url, EngineError> {
    Url::parse(raw).map_err(|source| EngineError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
