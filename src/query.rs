//! Filter expressions and tree queries.
//!
//! Implements the subset of the original filter language the tool uses:
//! `[instanceof T]`, `[!instanceof T]` and property clauses
//! `[prop <op> value]` with `=`, `!=`, `^=`, `$=`, `*=`. Clauses are
//! AND-chained. `instanceof` honors supertype inheritance from the store's
//! node-type registry.

use crate::store::{Context, NodeId};
use crate::types::CONTENT_TYPE;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Empty filter expression")]
    Empty,
    #[error("Expected '[' at start of clause: {0}")]
    MissingBracket(String),
    #[error("Unterminated clause: {0}")]
    Unterminated(String),
    #[error("Malformed clause: [{0}]")]
    MalformedClause(String),
}

/// Comparison operator in a property clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    Contains,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    InstanceOf(String),
    NotInstanceOf(String),
    Property {
        name: String,
        op: CompareOp,
        value: String,
    },
}

/// A parsed, AND-chained sequence of filter clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    clauses: Vec<FilterClause>,
}

/// Prepend the default content-classification predicate unless the caller's
/// expression already carries an `instanceof` predicate of its own.
pub fn normalize_filter(raw: &str) -> String {
    if raw.contains("[instanceof ") || raw.contains("[!instanceof ") {
        raw.to_string()
    } else {
        format!("[instanceof {}]{}", CONTENT_TYPE, raw)
    }
}

impl FilterExpression {
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        let mut rest = raw.trim();
        if rest.is_empty() {
            return Err(FilterError::Empty);
        }
        let mut clauses = Vec::new();
        while !rest.is_empty() {
            if !rest.starts_with('[') {
                return Err(FilterError::MissingBracket(rest.to_string()));
            }
            let end = rest
                .find(']')
                .ok_or_else(|| FilterError::Unterminated(rest.to_string()))?;
            clauses.push(parse_clause(&rest[1..end])?);
            rest = rest[end + 1..].trim_start();
        }
        Ok(FilterExpression { clauses })
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// A node matches when every clause matches.
    pub fn matches(&self, ctx: &Context<'_>, node: NodeId) -> bool {
        self.clauses.iter().all(|clause| clause.matches(ctx, node))
    }
}

fn parse_clause(body: &str) -> Result<FilterClause, FilterError> {
    let body = body.trim();
    if let Some(type_name) = body.strip_prefix("instanceof ") {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(FilterError::MalformedClause(body.to_string()));
        }
        return Ok(FilterClause::InstanceOf(type_name.to_string()));
    }
    if let Some(type_name) = body.strip_prefix("!instanceof ") {
        let type_name = type_name.trim();
        if type_name.is_empty() {
            return Err(FilterError::MalformedClause(body.to_string()));
        }
        return Ok(FilterClause::NotInstanceOf(type_name.to_string()));
    }

    // Property clause. Two-character operators must be tried before '='.
    for (token, op) in [
        ("!=", CompareOp::NotEquals),
        ("^=", CompareOp::StartsWith),
        ("$=", CompareOp::EndsWith),
        ("*=", CompareOp::Contains),
        ("=", CompareOp::Equals),
    ] {
        if let Some(pos) = body.find(token) {
            let name = body[..pos].trim();
            let value = unquote(body[pos + token.len()..].trim());
            if name.is_empty() {
                return Err(FilterError::MalformedClause(body.to_string()));
            }
            return Ok(FilterClause::Property {
                name: name.to_string(),
                op,
                value,
            });
        }
    }
    Err(FilterError::MalformedClause(body.to_string()))
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')));
    stripped.unwrap_or(value).to_string()
}

impl FilterClause {
    fn matches(&self, ctx: &Context<'_>, node: NodeId) -> bool {
        match self {
            FilterClause::InstanceOf(target) => ctx.is_of_type(node, target),
            FilterClause::NotInstanceOf(target) => !ctx.is_of_type(node, target),
            FilterClause::Property { name, op, value } => {
                let actual = ctx.property(node, name).map(|v| v.as_text());
                match op {
                    CompareOp::Equals => actual.as_deref() == Some(value),
                    CompareOp::NotEquals => actual.as_deref() != Some(value),
                    CompareOp::StartsWith => {
                        actual.as_deref().is_some_and(|a| a.starts_with(value))
                    }
                    CompareOp::EndsWith => {
                        actual.as_deref().is_some_and(|a| a.ends_with(value))
                    }
                    CompareOp::Contains => {
                        actual.as_deref().is_some_and(|a| a.contains(value))
                    }
                }
            }
        }
    }
}

/// Depth-first search for matching nodes under (and excluding) the root.
///
/// Hidden and restricted subtrees are pruned per the context options. Result
/// order is traversal order; callers sort the formatted output, not the
/// nodes.
pub fn find_matching(ctx: &Context<'_>, root: NodeId, filter: &FilterExpression) -> Vec<NodeId> {
    let mut matches = Vec::new();
    let mut stack: Vec<NodeId> = ctx.children(root).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        if !ctx.is_traversable(node) {
            continue;
        }
        if filter.matches(ctx, node) {
            matches.push(node);
        }
        stack.extend(ctx.children(node).iter().rev().copied());
    }
    matches
}

/// Nearest document-type node, walking upward from `node` inclusive.
pub fn closest_document(ctx: &Context<'_>, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(id) = current {
        if ctx.is_document(id) {
            return Some(id);
        }
        current = ctx.parent(id);
    }
    None
}

/// Document-type ancestors of `node`, nearest first, excluding the node
/// itself.
pub fn document_ancestors(ctx: &Context<'_>, node: NodeId) -> Vec<NodeId> {
    let mut ancestors = Vec::new();
    let mut current = ctx.parent(node);
    while let Some(id) = current {
        if ctx.is_document(id) {
            ancestors.push(id);
        }
        current = ctx.parent(id);
    }
    ancestors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentStore, ContextOptions};

    const SNAPSHOT: &str = r#"
nodeTypes:
  "Neos.Neos:Document": {}
  "Neos.Neos:Content": {}
  "Acme.Site:Page":
    superTypes: ["Neos.Neos:Document"]
  "Acme.Site:Text":
    superTypes: ["Neos.Neos:Content"]
  "Acme.Site:Code":
    superTypes: ["Acme.Site:Text"]
root:
  children:
    sites:
      children:
        acme:
          type: "Acme.Site:Page"
          properties:
            uriPathSegment: acme
          children:
            about:
              type: "Acme.Site:Page"
              properties:
                uriPathSegment: about
              children:
                main:
                  children:
                    intro:
                      type: "Acme.Site:Text"
                      properties:
                        someProp: 1
                        title: "Welcome aboard"
                    snippet:
                      type: "Acme.Site:Code"
                      properties:
                        someProp: 2
            hidden-page:
              type: "Acme.Site:Page"
              hidden: true
              properties:
                uriPathSegment: hidden-page
              children:
                main:
                  children:
                    body:
                      type: "Acme.Site:Text"
"#;

    fn store() -> ContentStore {
        ContentStore::from_yaml(SNAPSHOT).unwrap()
    }

    #[test]
    fn test_normalize_prepends_default_predicate() {
        assert_eq!(
            normalize_filter("[someProp = 1]"),
            "[instanceof Neos.Neos:Content][someProp = 1]"
        );
    }

    #[test]
    fn test_normalize_keeps_instanceof_filters() {
        assert_eq!(
            normalize_filter("[instanceof Acme.Site:Text]"),
            "[instanceof Acme.Site:Text]"
        );
        assert_eq!(
            normalize_filter("[!instanceof Acme.Site:Text]"),
            "[!instanceof Acme.Site:Text]"
        );
    }

    #[test]
    fn test_parse_clause_chain() {
        let filter = FilterExpression::parse("[instanceof Acme.Site:Text][someProp = 1]").unwrap();
        assert_eq!(
            filter.clauses(),
            &[
                FilterClause::InstanceOf("Acme.Site:Text".to_string()),
                FilterClause::Property {
                    name: "someProp".to_string(),
                    op: CompareOp::Equals,
                    value: "1".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_quoted_value_and_two_char_ops() {
        let filter = FilterExpression::parse("[title ^= 'Welcome']").unwrap();
        assert_eq!(
            filter.clauses(),
            &[FilterClause::Property {
                name: "title".to_string(),
                op: CompareOp::StartsWith,
                value: "Welcome".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            FilterExpression::parse(""),
            Err(FilterError::Empty)
        ));
        assert!(matches!(
            FilterExpression::parse("someProp = 1"),
            Err(FilterError::MissingBracket(_))
        ));
        assert!(matches!(
            FilterExpression::parse("[someProp = 1"),
            Err(FilterError::Unterminated(_))
        ));
        assert!(matches!(
            FilterExpression::parse("[instanceof ]"),
            Err(FilterError::MalformedClause(_))
        ));
        assert!(matches!(
            FilterExpression::parse("[someProp]"),
            Err(FilterError::MalformedClause(_))
        ));
    }

    #[test]
    fn test_instanceof_matches_subtypes() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let root = ctx.resolve("/sites").unwrap();
        let filter = FilterExpression::parse("[instanceof Acme.Site:Text]").unwrap();
        // Both the direct instance and the Code subtype instance match.
        assert_eq!(find_matching(&ctx, root, &filter).len(), 2);
    }

    #[test]
    fn test_not_instanceof_excludes_subtypes() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let root = ctx.resolve("/sites").unwrap();
        let filter = FilterExpression::parse(
            "[instanceof Neos.Neos:Content][!instanceof Acme.Site:Code]",
        )
        .unwrap();
        let matches = find_matching(&ctx, root, &filter);
        assert_eq!(matches.len(), 1);
        assert_eq!(ctx.path(matches[0]).to_string(), "/sites/acme/about/main/intro");
    }

    #[test]
    fn test_property_clause_filters() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let root = ctx.resolve("/sites").unwrap();
        let filter = FilterExpression::parse(&normalize_filter("[someProp = 1]")).unwrap();
        let matches = find_matching(&ctx, root, &filter);
        assert_eq!(matches.len(), 1);
        assert_eq!(ctx.path(matches[0]).to_string(), "/sites/acme/about/main/intro");
    }

    #[test]
    fn test_absent_property_matches_not_equals_only() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let root = ctx.resolve("/sites").unwrap();

        let eq = FilterExpression::parse("[instanceof Acme.Site:Text][missing = 1]").unwrap();
        assert!(find_matching(&ctx, root, &eq).is_empty());

        let ne = FilterExpression::parse("[instanceof Acme.Site:Text][missing != 1]").unwrap();
        assert_eq!(find_matching(&ctx, root, &ne).len(), 2);
    }

    #[test]
    fn test_hidden_subtree_pruned_without_include_hidden() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let root = ctx.resolve("/sites").unwrap();
        let filter = FilterExpression::parse("[instanceof Neos.Neos:Content]").unwrap();
        let paths: Vec<String> = find_matching(&ctx, root, &filter)
            .iter()
            .map(|&n| ctx.path(n).to_string())
            .collect();
        assert!(!paths.iter().any(|p| p.contains("hidden-page")));

        let all = store.context(ContextOptions {
            include_hidden: true,
            language: None,
        });
        let paths: Vec<String> = find_matching(&all, root, &filter)
            .iter()
            .map(|&n| all.path(n).to_string())
            .collect();
        assert!(paths.iter().any(|p| p.contains("hidden-page")));
    }

    #[test]
    fn test_closest_document_is_inclusive() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let about = ctx.resolve("/sites/acme/about").unwrap();
        let intro = ctx.resolve("/sites/acme/about/main/intro").unwrap();

        assert_eq!(closest_document(&ctx, about), Some(about));
        assert_eq!(closest_document(&ctx, intro), Some(about));
    }

    #[test]
    fn test_closest_document_none_outside_documents() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let sites = ctx.resolve("/sites").unwrap();
        assert_eq!(closest_document(&ctx, sites), None);
    }

    #[test]
    fn test_document_ancestors_nearest_first() {
        let store = store();
        let ctx = store.context(ContextOptions::default());
        let intro = ctx.resolve("/sites/acme/about/main/intro").unwrap();
        let chain: Vec<String> = document_ancestors(&ctx, intro)
            .iter()
            .map(|&n| ctx.path(n).to_string())
            .collect();
        assert_eq!(chain, vec!["/sites/acme/about", "/sites/acme"]);
    }
}
