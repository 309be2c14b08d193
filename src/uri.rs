//! Breadcrumb URI reconstruction and output formatting.
//!
//! The one portable algorithm of the tool: map each matched node to its
//! nearest document ancestor, rebuild the document's absolute path from its
//! document-type ancestor chain, propagate the hidden flag root-ward, and
//! emit a lexicographically sorted list of decorated URIs.

use crate::query::{
    FilterError, FilterExpression, closest_document, document_ancestors, find_matching,
    normalize_filter,
};
use crate::store::{ContentStore, Context, ContextOptions, NodeId, StoreError};
use crate::types::{HIDDEN_GLYPH, URI_PATH_SEGMENT, VISIBLE_GLYPH};
use thiserror::Error;

/// Nodes at tree depth <= 2 are site-root-level: they contribute no URI
/// path segment.
const SITE_ROOT_DEPTH: usize = 2;

#[derive(Error, Debug)]
pub enum FindError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Options shared by both find operations.
#[derive(Debug, Clone)]
pub struct FindOptions {
    /// Tree path to search under.
    pub site_node_path: String,
    /// Domain prefix for composed URIs; a trailing `/` is stripped.
    pub domain: String,
    /// Also match nodes that are hidden or access-restricted.
    pub include_hidden: bool,
    /// Language dimension to resolve nodes in.
    pub language: Option<String>,
}

impl Default for FindOptions {
    fn default() -> Self {
        FindOptions {
            site_node_path: "/sites".to_string(),
            domain: String::new(),
            include_hidden: false,
            language: None,
        }
    }
}

/// Find URIs of documents containing nodes of the given node type.
///
/// Builds `[instanceof {nodeType}]` and delegates to the filter operation.
pub fn find_uris_by_node_type(
    store: &ContentStore,
    node_type: &str,
    options: &FindOptions,
) -> Result<Vec<String>, FindError> {
    find_uris_by_filter(store, &format!("[instanceof {}]", node_type), options)
}

/// Find URIs of documents containing nodes matching the filter expression.
///
/// Returns the full decorated list, sorted byte-wise. Duplicates are kept:
/// a document reached via two matching descendants appears twice.
pub fn find_uris_by_filter(
    store: &ContentStore,
    filter: &str,
    options: &FindOptions,
) -> Result<Vec<String>, FindError> {
    let ctx = store.context(ContextOptions {
        include_hidden: options.include_hidden,
        language: options.language.clone(),
    });
    let site_node = ctx.resolve(&options.site_node_path)?;
    let filter = FilterExpression::parse(&normalize_filter(filter))?;
    let domain = options.domain.trim_end_matches('/');

    let mut uris: Vec<String> = find_matching(&ctx, site_node, &filter)
        .into_iter()
        .filter_map(|node| closest_document(&ctx, node))
        .map(|document| decorated_uri(&ctx, document, domain))
        .collect();
    uris.sort();
    Ok(uris)
}

/// Compose the decorated URI line for one document node.
///
/// A document at depth <= 2 maps to the site root: its URI body stays empty
/// and its own segment is ignored, but its own hidden flag still counts.
/// Deeper documents walk their document ancestors nearest-first, prepending
/// `/segment` for each one of depth > 2; the hidden flag is a monotonic OR
/// over the node and its whole document chain. A missing segment property
/// becomes an empty segment (doubled slash), never an error.
pub fn decorated_uri(ctx: &Context<'_>, document: NodeId, domain: &str) -> String {
    let mut uri = String::new();
    let mut hidden = ctx.is_hidden(document);

    if ctx.depth(document) > SITE_ROOT_DEPTH {
        uri = format!("/{}", segment(ctx, document));
        for ancestor in document_ancestors(ctx, document) {
            hidden = hidden || ctx.is_hidden(ancestor);
            if ctx.depth(ancestor) > SITE_ROOT_DEPTH {
                uri = format!("/{}{}", segment(ctx, ancestor), uri);
            }
        }
    }

    let glyph = if hidden { HIDDEN_GLYPH } else { VISIBLE_GLYPH };
    format!("{} {}{}", glyph, domain, uri)
}

fn segment(ctx: &Context<'_>, node: NodeId) -> String {
    ctx.property(node, URI_PATH_SEGMENT)
        .map(|v| v.as_text())
        .unwrap_or_default()
}
