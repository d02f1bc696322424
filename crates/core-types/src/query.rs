//! Replay-time query descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lookup API used to run a [`QueryDescriptor`] against a page.
///
/// The serialized names are part of the stored script format and must not
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchApi {
    /// Structural CSS query, all matching element nodes
    #[serde(rename = "querySelector")]
    CssQuery,

    /// Native identifier lookup
    #[serde(rename = "getElementById")]
    ById,

    /// Exact equality against trimmed text content
    #[serde(rename = "getElementsByText")]
    TextEquality,
}

impl SearchApi {
    pub fn name(&self) -> &'static str {
        match self {
            SearchApi::CssQuery => "css",
            SearchApi::ById => "id",
            SearchApi::TextEquality => "text",
        }
    }
}

/// A single typed query strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryDescriptor {
    #[serde(rename = "searchAPI")]
    pub search_api: SearchApi,

    #[serde(rename = "queryString")]
    pub query_string: String,
}

impl QueryDescriptor {
    pub fn new(search_api: SearchApi, query_string: impl Into<String>) -> Self {
        Self {
            search_api,
            query_string: query_string.into(),
        }
    }

    pub fn css(query: impl Into<String>) -> Self {
        Self::new(SearchApi::CssQuery, query)
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(SearchApi::ById, id)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(SearchApi::TextEquality, text)
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.search_api.name(), self.query_string)
    }
}

/// Persisted form of an element selection: the only thing the resolver sees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepElement {
    pub selectors: Vec<QueryDescriptor>,
}

impl StepElement {
    pub fn new(selectors: Vec<QueryDescriptor>) -> Self {
        Self { selectors }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Compact representation for logs.
    pub fn describe(&self) -> String {
        self.selectors
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" & ")
    }
}
