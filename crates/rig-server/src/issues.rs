//! Issue search endpoint.

use rig_core::entities::IssueRecord;

use crate::{ServerClient, error::ServerError, http::query};

/// Page size used when walking search results (the server maximum).
const PAGE_SIZE: usize = 500;

/// Filters for [`ServerClient::search_issues`]. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
    pub component_keys: Vec<String>,
    pub rules: Vec<String>,
}

impl IssueQuery {
    #[must_use]
    pub fn for_component(key: impl Into<String>) -> Self {
        Self {
            component_keys: vec![key.into()],
            rules: Vec::new(),
        }
    }

    fn params(&self, page: usize) -> String {
        let component_keys = self.component_keys.join(",");
        let rules = self.rules.join(",");
        let page = page.to_string();
        let page_size = PAGE_SIZE.to_string();

        let mut pairs = Vec::with_capacity(4);
        if !component_keys.is_empty() {
            pairs.push(("componentKeys", component_keys.as_str()));
        }
        if !rules.is_empty() {
            pairs.push(("rules", rules.as_str()));
        }
        pairs.push(("p", page.as_str()));
        pairs.push(("ps", page_size.as_str()));
        query(&pairs)
    }
}

#[derive(Debug, serde::Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<RawIssue>,
    paging: Option<Paging>,
    /// Pre-paging servers report the total at the top level.
    total: Option<usize>,
}

#[derive(Debug, serde::Deserialize)]
struct Paging {
    total: usize,
}

#[derive(Debug, serde::Deserialize)]
struct RawIssue {
    rule: String,
    component: String,
    message: Option<String>,
    line: Option<u32>,
}

impl From<RawIssue> for IssueRecord {
    fn from(raw: RawIssue) -> Self {
        Self {
            rule_key: raw.rule,
            component_key: raw.component,
            message: raw.message,
            line: raw.line,
        }
    }
}

impl ServerClient {
    /// `GET api/issues/search`, following pages until every issue was read.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if any page request fails or cannot be parsed.
    pub async fn search_issues(&self, filter: &IssueQuery) -> Result<Vec<IssueRecord>, ServerError> {
        let mut issues = Vec::new();
        let mut page = 1;

        loop {
            let resp: SearchResponse = self
                .get(&format!("api/issues/search?{}", filter.params(page)))
                .await?
                .json()
                .await?;

            let total = resp
                .paging
                .map(|p| p.total)
                .or(resp.total)
                .unwrap_or(0);
            let received = resp.issues.len();
            issues.extend(resp.issues.into_iter().map(IssueRecord::from));

            if received == 0 || issues.len() >= total {
                break;
            }
            page += 1;
        }

        tracing::debug!(count = issues.len(), "issues fetched");
        Ok(issues)
    }
}
