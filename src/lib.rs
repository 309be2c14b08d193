//! urifind - Find document URIs for matching content nodes.
//!
//! This library walks a tree-shaped content store, matches nodes against a
//! filter expression, maps each match to its nearest enclosing document
//! node, reconstructs the document URIs from the ancestor chain and returns
//! them as a sorted, visibility-decorated list.

pub mod query;
pub mod store;
pub mod types;
pub mod uri;

pub use query::{
    CompareOp, FilterClause, FilterError, FilterExpression, closest_document, document_ancestors,
    find_matching, normalize_filter,
};
pub use store::{ContentStore, Context, ContextOptions, NodeId, NodeTypeRegistry, StoreError};
pub use types::{
    CONTENT_TYPE, DOCUMENT_TYPE, HIDDEN_GLYPH, NodePath, PropertyValue, URI_PATH_SEGMENT,
    VISIBLE_GLYPH,
};
pub use uri::{FindError, FindOptions, decorated_uri, find_uris_by_filter, find_uris_by_node_type};
