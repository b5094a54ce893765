//! pre-built operation helper
//!
//! operation trait implemented by the typed graphql queries in [`crate::jira`]
//! and by downstream crates that ship their own documents.

use serde::de::DeserializeOwned;

/// graphql operation contract for pre-built documents
pub trait Operation {
    /// graphql query or mutation string
    const QUERY: &'static str;
    /// operation name defined in `QUERY`
    const NAME: &'static str;
    /// estimated point cost charged against the local budget
    const COST: u32 = 1;
    /// experimental api flags the operation needs
    const EXPERIMENTAL_APIS: &'static [&'static str] = &[];
    /// response payload type
    type Response: DeserializeOwned;
}
