//! Path tree (segment trie) for route resolution.
//!
//! # Responsibilities
//! - Index route patterns segment by segment
//! - Resolve a concrete path to the node holding its per-method entries
//! - Capture named and wildcard parameters along the way
//!
//! # Pattern Syntax
//! ```text
//! /users            literal segment, exact match
//! /users/:id        named parameter, matches exactly one segment
//! /files/*          wildcard, captures the rest of the path under "*"
//! /files/*rest      wildcard, captures the rest of the path under "rest"
//! ```
//!
//! # Design Decisions
//! - Precedence at every position: static > named > wildcard
//! - Empty segments are ignored, so `/users/` and `/users` are one path
//! - A node only matches if some method is registered on it; otherwise
//!   resolution backtracks to the next candidate at that position
//! - Built once before serving, read-only afterwards (no interior mutability)

use std::collections::HashMap;

use axum::http::Method;

use crate::routing::Params;

pub const PARAM_SIGIL: char = ':';
pub const WILDCARD_SIGIL: char = '*';

/// Name a bare `*` wildcard captures under.
pub const WILDCARD_DEFAULT_NAME: &str = "*";

/// Kind of segment a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Root,
    Static,
    Param,
    Wildcard,
}

/// One parsed pattern segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    Wildcard(&'a str),
}

impl<'a> Segment<'a> {
    fn parse(raw: &'a str) -> Self {
        if let Some(name) = raw.strip_prefix(PARAM_SIGIL) {
            Segment::Param(name)
        } else if let Some(name) = raw.strip_prefix(WILDCARD_SIGIL) {
            if name.is_empty() {
                Segment::Wildcard(WILDCARD_DEFAULT_NAME)
            } else {
                Segment::Wildcard(name)
            }
        } else {
            Segment::Static(raw)
        }
    }
}

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A node of the path tree.
///
/// Owns its children exclusively: any number of static children keyed by
/// literal, at most one named-parameter child and at most one wildcard child.
#[derive(Debug)]
pub struct Node<T> {
    label: String,
    kind: SegmentKind,
    methods: HashMap<Method, T>,
    static_children: HashMap<String, Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(label: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            label: label.into(),
            kind,
            methods: HashMap::new(),
            static_children: HashMap::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Literal for static nodes, bound parameter name otherwise.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Entries registered on this node, keyed by method.
    pub fn methods(&self) -> &HashMap<Method, T> {
        &self.methods
    }

    /// Methods registered on this node in a stable order.
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut allowed: Vec<Method> = self.methods.keys().cloned().collect();
        allowed.sort_by_key(method_rank);
        allowed
    }

    fn is_routable(&self) -> bool {
        !self.methods.is_empty()
    }
}

/// Ordering used when listing methods (e.g. in an `Allow` header).
fn method_rank(method: &Method) -> (usize, String) {
    const ORDER: [Method; 7] = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let rank = ORDER.iter().position(|m| m == method).unwrap_or(ORDER.len());
    (rank, method.as_str().to_string())
}

/// Segment trie mapping (method, pattern) to a value of type `T`.
#[derive(Debug)]
pub struct PathTree<T> {
    root: Node<T>,
}

impl<T> Default for PathTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PathTree<T> {
    pub fn new() -> Self {
        Self {
            root: Node::new("", SegmentKind::Root),
        }
    }

    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    /// Register `value` for `method` at `pattern`, replacing any previous
    /// registration of the same pair. Returns the stored value.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> &mut T {
        let mut node = &mut self.root;
        let mut segments = split_path(pattern).into_iter();

        while let Some(raw) = segments.next() {
            node = match Segment::parse(raw) {
                Segment::Static(literal) => node
                    .static_children
                    .entry(literal.to_string())
                    .or_insert_with(|| Node::new(literal, SegmentKind::Static)),
                Segment::Param(name) => {
                    let child = node
                        .param_child
                        .get_or_insert_with(|| Box::new(Node::new(name, SegmentKind::Param)));
                    if child.label != name {
                        tracing::warn!(
                            pattern = %pattern,
                            bound = %child.label,
                            requested = %name,
                            "Parameter already bound at this position, keeping existing name"
                        );
                    }
                    &mut **child
                }
                Segment::Wildcard(name) => {
                    let child = node
                        .wildcard_child
                        .get_or_insert_with(|| Box::new(Node::new(name, SegmentKind::Wildcard)));
                    let ignored: Vec<&str> = segments.by_ref().collect();
                    if !ignored.is_empty() {
                        tracing::warn!(
                            pattern = %pattern,
                            ignored = ?ignored,
                            "Segments after a wildcard are not indexed"
                        );
                    }
                    &mut **child
                }
            };
        }

        match node.methods.entry(method) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                tracing::debug!(pattern = %pattern, method = %slot.key(), "Replacing route");
                slot.insert(value);
                slot.into_mut()
            }
            std::collections::hash_map::Entry::Vacant(slot) => slot.insert(value),
        }
    }

    /// Resolve `segments` to the node registered for them.
    ///
    /// Captures land in `params`. On `None` the contents of `params` are
    /// meaningless and must be discarded.
    pub fn traverse<'t>(&'t self, segments: &[&str], params: &mut Params) -> Option<&'t Node<T>> {
        Self::resolve(&self.root, segments, params)
    }

    fn resolve<'t>(node: &'t Node<T>, segments: &[&str], params: &mut Params) -> Option<&'t Node<T>> {
        let Some((first, rest)) = segments.split_first() else {
            return node.is_routable().then_some(node);
        };

        if let Some(child) = node.static_children.get(*first) {
            if let Some(found) = Self::resolve(child, rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = node.param_child.as_deref() {
            let mark = params.len();
            params.push(child.label.clone(), *first);
            if let Some(found) = Self::resolve(child, rest, params) {
                return Some(found);
            }
            params.truncate(mark);
        }

        if let Some(child) = node.wildcard_child.as_deref() {
            if child.is_routable() {
                params.push(child.label.clone(), segments.join("/"));
                return Some(child);
            }
        }

        None
    }

    /// Convenience for `traverse(split_path(path), params)`.
    pub fn lookup<'t>(&'t self, path: &str, params: &mut Params) -> Option<&'t Node<T>> {
        self.traverse(&split_path(path), params)
    }
}
