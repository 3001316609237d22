//! Minimal DOM model standing in for the host's container element.
//!
//! Extensions build owned [`Element`] trees and append them into a
//! [`Container`]. The container flattens every appended tree into an arena
//! addressed by [`NodeId`], so listeners can refer to nodes by id and mutate
//! the container when an event is dispatched.
//!
//! ```text
//! Element (builder) ──append──▶ Container arena ──to_html──▶ host
//!                                   │  ▲
//!                        dispatch ──┘  └── listener mutates (disable, class)
//! ```
//!
//! Only the behavior extensions rely on is modeled: attributes, inline
//! styles, class lists, text content, `<select>` values, the `disabled` flag
//! and click listeners. Text and attribute values are escaped on
//! serialization.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Elements whose text content is emitted verbatim.
const RAW_TEXT_TAGS: &[&str] = &["style", "script"];
/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &["img", "source", "br", "hr", "input", "meta", "link"];

/// Index of a node inside a [`Container`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its container's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Events a node can receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
}

/// Callback invoked when an event is dispatched to a node.
///
/// Receives the container (so it can read and mutate other nodes) and the
/// id of the node the event was dispatched to.
pub type Listener = Arc<dyn Fn(&mut Container, NodeId) + Send + Sync>;

// ── Element builder ──────────────────────────────────────────────────

/// An owned element tree, built before being appended to a [`Container`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub styles: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set an attribute, replacing any previous value with the same name.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_pair(&mut self.attributes, name.into(), value.into());
        self
    }

    /// Set a boolean attribute (serialized without a value).
    pub fn flag(self, name: impl Into<String>) -> Self {
        self.attr(name, "")
    }

    /// Conditionally set a boolean attribute.
    pub fn flag_if(self, condition: bool, name: impl Into<String>) -> Self {
        if condition { self.flag(name) } else { self }
    }

    /// Set an inline style property.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        set_pair(&mut self.styles, property.into(), value.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Set the text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }
}

fn set_pair(pairs: &mut Vec<(String, String)>, name: String, value: String) {
    if let Some(existing) = pairs.iter_mut().find(|(n, _)| *n == name) {
        existing.1 = value;
    } else {
        pairs.push((name, value));
    }
}

// ── Container arena ──────────────────────────────────────────────────

/// A node stored in a [`Container`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub styles: Vec<(String, String)>,
    pub classes: Vec<String>,
    pub text: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Current value of a form control, set by user interaction.
    pub value: Option<String>,
}

/// The host-owned element that extensions render into.
///
/// Extensions may only append. Nothing in this crate clears a container;
/// that is the host's decision.
#[derive(Default)]
pub struct Container {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    listeners: HashMap<(NodeId, EventKind), Vec<Listener>>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subtree as the last top-level child. Returns its root id.
    pub fn append(&mut self, element: Element) -> NodeId {
        let id = self.insert(element, None);
        self.roots.push(id);
        id
    }

    fn insert(&mut self, element: Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: element.tag,
            attributes: element.attributes,
            styles: element.styles,
            classes: element.classes,
            text: element.text,
            children: Vec::new(),
            parent,
            value: None,
        });
        for child in element.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    /// Top-level nodes in append order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Total number of nodes ever appended.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Children of a node, in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The node and all of its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// First node at or below `scope` carrying `class`, like
    /// `querySelector('.class')`.
    pub fn query_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.has_class(*id, class))
    }

    /// All nodes at or below `scope` with the given tag.
    pub fn query_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|n| n.tag == tag))
            .collect()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.get_mut(id) {
            set_pair(&mut node.attributes, name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.get_mut(id) {
            node.attributes.retain(|(n, _)| n != name);
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.get(id)?
            .styles
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.text.as_deref()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.get_mut(id)
            && !node.classes.iter().any(|c| c == class)
        {
            node.classes.push(class.to_string());
        }
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.attribute(id, "disabled").is_some()
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if disabled {
            self.set_attribute(id, "disabled", "");
        } else {
            self.remove_attribute(id, "disabled");
        }
    }

    // ── Form values ──

    /// Option values of a `<select>`, in document order.
    pub fn option_values(&self, select: NodeId) -> Vec<String> {
        self.children(select)
            .iter()
            .filter_map(|id| {
                let node = self.get(*id)?;
                if node.tag != "option" {
                    return None;
                }
                Some(
                    self.attribute(*id, "value")
                        .map(str::to_string)
                        .or_else(|| node.text.clone())
                        .unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Current value of a form control.
    ///
    /// For a `<select>` with no explicit choice this is the first option's
    /// value, matching browser behavior. Returns `None` for nodes without a
    /// value.
    pub fn value(&self, id: NodeId) -> Option<String> {
        let node = self.get(id)?;
        if let Some(value) = &node.value {
            return Some(value.clone());
        }
        if node.tag == "select" {
            return self.option_values(id).into_iter().next();
        }
        self.attribute(id, "value").map(str::to_string)
    }

    /// Choose an option of a `<select>` by value.
    ///
    /// Returns `false` (and leaves the value unchanged) when the node is not
    /// a select, is disabled, or has no option with that value.
    pub fn choose(&mut self, select: NodeId, value: &str) -> bool {
        let is_select = self.get(select).is_some_and(|n| n.tag == "select");
        if !is_select || self.is_disabled(select) {
            return false;
        }
        if !self.option_values(select).iter().any(|v| v == value) {
            return false;
        }
        if let Some(node) = self.get_mut(select) {
            node.value = Some(value.to_string());
        }
        true
    }

    // ── Events ──

    /// Register a listener for `kind` events on `id`.
    pub fn on(
        &mut self,
        id: NodeId,
        kind: EventKind,
        listener: impl Fn(&mut Container, NodeId) + Send + Sync + 'static,
    ) {
        self.listeners
            .entry((id, kind))
            .or_default()
            .push(Arc::new(listener));
    }

    /// Dispatch an event to a node, running its listeners in registration
    /// order. Disabled nodes do not receive events.
    ///
    /// Returns the number of listeners that ran.
    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) -> usize {
        if self.get(id).is_none() || self.is_disabled(id) {
            return 0;
        }
        let listeners = self
            .listeners
            .get(&(id, kind))
            .cloned()
            .unwrap_or_default();
        for listener in &listeners {
            (**listener)(self, id);
        }
        listeners.len()
    }

    /// Shorthand for dispatching [`EventKind::Click`].
    pub fn click(&mut self, id: NodeId) -> usize {
        self.dispatch(id, EventKind::Click)
    }

    // ── Serialization ──

    /// Serialize every top-level node to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            self.write_html(*root, &mut out);
        }
        out
    }

    /// Serialize a single subtree to HTML.
    pub fn node_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        out.push('<');
        out.push_str(&node.tag);
        if !node.classes.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&escape(&node.classes.join(" ")));
            out.push('"');
        }
        for (name, value) in &node.attributes {
            out.push(' ');
            out.push_str(name);
            if !value.is_empty() {
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
        }
        if !node.styles.is_empty() {
            let css: Vec<String> = node
                .styles
                .iter()
                .map(|(p, v)| format!("{p}: {v}"))
                .collect();
            out.push_str(" style=\"");
            out.push_str(&escape(&css.join("; ")));
            out.push('"');
        }
        out.push('>');

        if VOID_TAGS.contains(&node.tag.as_str()) {
            return;
        }
        if let Some(text) = &node.text {
            if RAW_TEXT_TAGS.contains(&node.tag.as_str()) {
                out.push_str(text);
            } else {
                out.push_str(&escape(text));
            }
        }
        for child in &node.children {
            self.write_html(*child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
