// SPDX-FileCopyrightText: 2026 Flowdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listing query parameters for the record table endpoints.
//!
//! The backend does pagination, sorting, and filtering server-side; the
//! filter payload is an opaque JSON document passed through verbatim.

use serde::{Deserialize, Serialize};

/// Server-side sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Query for one page of a record table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    pub skip: u64,
    pub limit: u64,
    pub sort_field: String,
    pub sort_order: SortOrder,
    /// Opaque JSON filter payload, forwarded untouched.
    pub filter: Option<serde_json::Value>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 15,
            sort_field: "pk".to_string(),
            sort_order: SortOrder::Desc,
            filter: None,
        }
    }
}

impl ListQuery {
    /// Query pairs in the backend's expected parameter names.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
            ("sortField", self.sort_field.clone()),
            ("sortOrder", self.sort_order.to_string()),
        ];
        if let Some(filter) = &self.filter {
            pairs.push(("filterModel", filter.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_matches_table_defaults() {
        let query = ListQuery::default();
        let pairs = query.to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("skip", "0".to_string()),
                ("limit", "15".to_string()),
                ("sortField", "pk".to_string()),
                ("sortOrder", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn filter_is_forwarded_as_json() {
        let query = ListQuery {
            filter: Some(serde_json::json!({"items": [{"field": "label", "value": "relax"}]})),
            ..ListQuery::default()
        };
        let pairs = query.to_pairs();
        let filter = &pairs.iter().find(|(k, _)| *k == "filterModel").unwrap().1;
        assert!(filter.contains("relax"));
    }
}
