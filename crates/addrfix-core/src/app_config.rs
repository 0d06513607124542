use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NAMESPACE: &str = "bind";
pub const DEFAULT_STORE_PATH: &str = "./addrfix-store.json";
pub const DEFAULT_DETAIL_PATH: &str = "/Sales/OrderDetails";
pub const DEFAULT_EDIT_PATH: &str = "/Sales/AddOrder";
pub const DEFAULT_ORDER_PARAM: &str = "ID";
pub const DEFAULT_EDIT_PARAM: &str = "edit";
pub const DEFAULT_DISABLE_PARAM: &str = "bind-nopatch";
pub const DEFAULT_CONTROL_MARKER: &str = "vm.model.address";
pub const DEFAULT_VALUE_PREFIX: &str = "string:";

/// Scheduling knobs for capture, discovery and the reconciliation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    /// Wait before reading the detail page; it offers no render-complete signal.
    pub capture_delay: Duration,
    /// Offsets (from loop start) of the two scheduled control lookups.
    pub discovery_offsets: [Duration; 2],
    pub retry_interval: Duration,
    pub max_attempts: u32,
    pub debounce: Duration,
    /// Hard stop measured from entry into the observing phase.
    pub observe_timeout: Duration,
    pub navigation_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            capture_delay: Duration::from_millis(1_000),
            discovery_offsets: [Duration::from_millis(300), Duration::from_millis(1_200)],
            retry_interval: Duration::from_millis(250),
            max_attempts: 20,
            debounce: Duration::from_millis(100),
            observe_timeout: Duration::from_millis(5_000),
            navigation_delay: Duration::from_millis(500),
        }
    }
}

/// URL conventions of the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub detail_path: String,
    pub edit_path: String,
    pub order_param: String,
    pub edit_param: String,
    pub disable_param: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            detail_path: DEFAULT_DETAIL_PATH.to_string(),
            edit_path: DEFAULT_EDIT_PATH.to_string(),
            order_param: DEFAULT_ORDER_PARAM.to_string(),
            edit_param: DEFAULT_EDIT_PARAM.to_string(),
            disable_param: DEFAULT_DISABLE_PARAM.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub namespace: String,
    pub store_path: PathBuf,
    pub log_level: String,
    pub routes: RouteConfig,
    pub control_marker: String,
    pub value_prefix: String,
    pub timings: Timings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            log_level: "info".to_string(),
            routes: RouteConfig::default(),
            control_marker: DEFAULT_CONTROL_MARKER.to_string(),
            value_prefix: DEFAULT_VALUE_PREFIX.to_string(),
            timings: Timings::default(),
        }
    }
}
