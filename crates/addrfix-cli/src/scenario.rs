//! YAML-scripted page sessions for `addrfix replay`.
//!
//! ```yaml
//! steps:
//!   - action: label
//!     text: "Av. Siempre Viva 742"
//!   - action: navigate
//!     url: "https://erp.example.com/Sales/OrderDetails?ID=42"
//!   - action: settle
//!   - action: options
//!     texts: ["Calle 10", "Av. Siempre Viva 742"]
//!   - action: navigate
//!     url: "https://erp.example.com/Sales/AddOrder?ID=42&edit=1"
//!   - action: settle
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// First occurrence loads the page; later ones are in-app navigations.
    Navigate { url: String },
    /// Detail-view address text; omit `text` to clear it.
    Label {
        #[serde(default)]
        text: Option<String>,
    },
    /// Render the edit view's address control (or re-render its options).
    Options { texts: Vec<String> },
    /// The user picks option `index` (0 is the blank default).
    Select { index: usize },
    Wait { ms: u64 },
    /// Wait for the current page view to finish and print its outcome.
    Settle,
}

impl Scenario {
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        let scenario: Self = serde_yaml::from_str(yaml).context("invalid scenario YAML")?;
        anyhow::ensure!(
            scenario
                .steps
                .iter()
                .any(|step| matches!(step, Step::Navigate { .. })),
            "scenario never navigates to a page"
        );
        Ok(scenario)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_step_kind() {
        let scenario = Scenario::parse(
            r#"
steps:
  - action: label
    text: "Calle 10"
  - action: label
  - action: navigate
    url: "https://erp.example.com/Sales/OrderDetails?ID=42"
  - action: options
    texts: ["Calle 10", "Calle 11"]
  - action: select
    index: 2
  - action: wait
    ms: 300
  - action: settle
"#,
        )
        .unwrap();

        assert_eq!(
            scenario.steps,
            vec![
                Step::Label {
                    text: Some("Calle 10".to_string())
                },
                Step::Label { text: None },
                Step::Navigate {
                    url: "https://erp.example.com/Sales/OrderDetails?ID=42".to_string()
                },
                Step::Options {
                    texts: vec!["Calle 10".to_string(), "Calle 11".to_string()]
                },
                Step::Select { index: 2 },
                Step::Wait { ms: 300 },
                Step::Settle,
            ]
        );
    }

    #[test]
    fn rejects_scenario_without_navigation() {
        let err = Scenario::parse("steps:\n  - action: settle\n").unwrap_err();
        assert!(err.to_string().contains("never navigates"));
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(Scenario::parse("steps:\n  - action: teleport\n").is_err());
    }
}
