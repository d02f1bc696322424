use serde::{Deserialize, Serialize};

/// Request handed to the tab host when a step opens links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLinksRequest {
    pub link_urls: Vec<String>,
    pub max_tabs: usize,
    pub close_on_done: bool,
    /// Script to run in every opened tab once it loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_name: Option<String>,
}
