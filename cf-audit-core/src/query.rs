//! Audit event filter and its query-string form

use serde::{Deserialize, Serialize};

/// Sort order applied when the filter does not name one
pub const DEFAULT_ORDER_BY: &str = "-created_at";

/// Server-side filter for `/v3/audit_events`
///
/// Empty collections mean "no filter on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEventFilter {
    pub types: Vec<String>,
    pub target_guids: Vec<String>,
    pub space_guids: Vec<String>,
    pub organization_guids: Vec<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub order_by: Option<String>,
}

impl AuditEventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_target_guids<I, S>(mut self, guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_guids = guids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_space_guids<I, S>(mut self, guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.space_guids = guids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_organization_guids<I, S>(mut self, guids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.organization_guids = guids.into_iter().map(Into::into).collect();
        self
    }

    /// Sort order sent to the API, falling back to [`DEFAULT_ORDER_BY`]
    pub fn effective_order_by(&self) -> &str {
        match self.order_by.as_deref() {
            Some(order_by) if !order_by.is_empty() => order_by,
            _ => DEFAULT_ORDER_BY,
        }
    }

    /// Query parameters in the order they are sent
    ///
    /// `order_by` is always present. Guid and type lists are comma-joined and
    /// only emitted when non-empty. Paging is only emitted when set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("order_by", self.effective_order_by().to_string())];

        let lists = [
            ("organization_guids", &self.organization_guids),
            ("space_guids", &self.space_guids),
            ("target_guids", &self.target_guids),
            ("types", &self.types),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                pairs.push((key, values.join(",")));
            }
        }

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }

        pairs
    }
}
