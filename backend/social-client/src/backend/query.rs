/// Query clauses for list requests, rendered in the backend's query syntax
use serde_json::json;
use std::fmt;

pub const UPDATED_AT: &str = "$updatedAt";
pub const CREATED_AT: &str = "$createdAt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Attribute equals any of the values
    Equal(String, Vec<String>),
    /// Full-text search on an indexed attribute
    Search(String, String),
    OrderDesc(String),
    Limit(u32),
    /// Start after the document with this id, in the current sort order
    CursorAfter(String),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Query::Equal(attribute.into(), vec![value.into()])
    }

    pub fn search(attribute: impl Into<String>, term: impl Into<String>) -> Self {
        Query::Search(attribute.into(), term.into())
    }

    pub fn order_desc(attribute: impl Into<String>) -> Self {
        Query::OrderDesc(attribute.into())
    }

    pub fn limit(n: u32) -> Self {
        Query::Limit(n)
    }

    pub fn cursor_after(document_id: impl Into<String>) -> Self {
        Query::CursorAfter(document_id.into())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Equal(attr, values) => write!(f, "equal({}, {})", json!(attr), json!(values)),
            Query::Search(attr, term) => write!(f, "search({}, {})", json!(attr), json!([term])),
            Query::OrderDesc(attr) => write!(f, "orderDesc({})", json!(attr)),
            Query::Limit(n) => write!(f, "limit({})", n),
            Query::CursorAfter(id) => write!(f, "cursorAfter({})", json!(id)),
        }
    }
}
