//! # XML Arena
//!
//! An owned, mutable XML tree. Parts are parsed with `roxmltree` (read-only)
//! and copied into an arena of nodes whose children are ordered id lists, so
//! splicing an element is an index insertion and removing one is a detach.
//!
//! Names keep both the resolved namespace URI and the prefix they were
//! written with. Matching always goes through the URI; writing uses the
//! prefix. Namespace declarations are kept on the element that declared
//! them, so serialization reproduces the original scoping.
//!
//! Detached nodes stay in the arena but are unreachable from the root and
//! never serialized.

use crate::ns;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: QName,
        /// `xmlns` / `xmlns:prefix` declarations made on this element
        namespaces: Vec<(Option<String>, String)>,
        attributes: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        value: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl XmlTree {
    /// Parse a part into an owned tree
    pub fn parse(text: &str) -> Result<Self, roxmltree::Error> {
        let document = roxmltree::Document::parse(text)?;

        let mut tree = XmlTree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.import(document.root_element());

        Ok(tree)
    }

    /// A tree holding a single root element that declares `namespace` as the
    /// default namespace.
    pub fn with_root(namespace: &str, local: &str) -> Self {
        let mut tree = XmlTree {
            nodes: Vec::new(),
            root: NodeId(0),
        };

        tree.root = tree.push(NodeKind::Element {
            name: QName {
                namespace: Some(namespace.to_string()),
                prefix: None,
                local: local.to_string(),
            },
            namespaces: vec![(None, namespace.to_string())],
            attributes: Vec::new(),
        });

        tree
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn import(&mut self, node: roxmltree::Node) -> NodeId {
        let kind = if node.is_element() {
            element_kind(node)
        } else if node.is_comment() {
            NodeKind::Comment(node.text().unwrap_or_default().to_string())
        } else if let Some(pi) = node.pi() {
            NodeKind::ProcessingInstruction {
                target: pi.target.to_string(),
                value: pi.value.map(str::to_string),
            }
        } else {
            NodeKind::Text(node.text().unwrap_or_default().to_string())
        };

        let id = self.push(kind);

        if node.is_element() {
            for child in node.children() {
                let child_id = self.import(child);
                self.nodes[child_id.0].parent = Some(id);
                self.nodes[id.0].children.push(child_id);
            }
        }

        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn name(&self, id: NodeId) -> Option<&QName> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId, namespace: &str, local: &str) -> bool {
        self.name(id).is_some_and(|name| name.is(namespace, local))
    }

    /// Local name of an element in `namespace`
    pub fn local_name_in(&self, id: NodeId, namespace: &str) -> Option<&str> {
        self.name(id)
            .filter(|name| name.namespace.as_deref() == Some(namespace))
            .map(|name| name.local.as_str())
    }

    pub fn child_elements<'a>(
        &'a self,
        id: NodeId,
        namespace: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.is_element(*child, namespace, local))
    }

    pub fn first_child_element(&self, id: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.child_elements(id, namespace, local).next()
    }

    /// All nodes below `id` in document order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();

        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }

        out
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of all text nodes below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    pub fn attribute(&self, id: NodeId, namespace: Option<&str>, local: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|attr| attr.name.local == local && attr.name.namespace.as_deref() == namespace)
                .map(|attr| attr.value.as_str()),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, namespace: Option<&str>, local: &str, value: &str) {
        let prefix = namespace.map(|uri| self.attribute_prefix(uri));

        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            match attributes
                .iter_mut()
                .find(|attr| attr.name.local == local && attr.name.namespace.as_deref() == namespace)
            {
                Some(attr) => attr.value = value.to_string(),
                None => attributes.push(Attribute {
                    name: QName {
                        namespace: namespace.map(str::to_string),
                        prefix,
                        local: local.to_string(),
                    },
                    value: value.to_string(),
                }),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, namespace: Option<&str>, local: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id.0].kind {
            attributes
                .retain(|attr| !(attr.name.local == local && attr.name.namespace.as_deref() == namespace));
        }
    }

    /// Prefix bound to `namespace` on the root element, declaring it with the
    /// conventional prefix when absent. `None` means the default namespace.
    pub fn ensure_namespace(&mut self, namespace: &str) -> Option<String> {
        if namespace == ns::XML {
            return Some("xml".to_string());
        }

        let root = self.root;
        if let NodeKind::Element { namespaces, .. } = &self.nodes[root.0].kind {
            if let Some((prefix, _)) = namespaces
                .iter()
                .find(|(prefix, uri)| uri == namespace && prefix.is_some())
                .or_else(|| namespaces.iter().find(|(_, uri)| uri == namespace))
            {
                return prefix.clone();
            }
        }

        let prefix = self.free_prefix(ns::conventional_prefix(namespace));
        if let NodeKind::Element { namespaces, .. } = &mut self.nodes[root.0].kind {
            namespaces.push((Some(prefix.clone()), namespace.to_string()));
        }

        Some(prefix)
    }

    fn attribute_prefix(&mut self, namespace: &str) -> String {
        if namespace == ns::XML {
            return "xml".to_string();
        }

        let root = self.root;
        let bound = match &self.nodes[root.0].kind {
            NodeKind::Element { namespaces, .. } => namespaces
                .iter()
                .find(|(prefix, uri)| uri == namespace && prefix.is_some())
                .and_then(|(prefix, _)| prefix.clone()),
            _ => None,
        };

        if let Some(prefix) = bound {
            return prefix;
        }

        let prefix = self.free_prefix(ns::conventional_prefix(namespace));
        if let NodeKind::Element { namespaces, .. } = &mut self.nodes[root.0].kind {
            namespaces.push((Some(prefix.clone()), namespace.to_string()));
        }
        prefix
    }

    fn free_prefix(&self, preferred: &str) -> String {
        let taken = |candidate: &str| match &self.nodes[self.root.0].kind {
            NodeKind::Element { namespaces, .. } => namespaces
                .iter()
                .any(|(prefix, _)| prefix.as_deref() == Some(candidate)),
            _ => false,
        };

        if !taken(preferred) {
            return preferred.to_string();
        }

        (1..)
            .map(|n| format!("{}{}", preferred, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| preferred.to_string())
    }

    /// Create a detached element
    pub fn create_element(&mut self, namespace: &str, local: &str) -> NodeId {
        let prefix = self.ensure_namespace(namespace);

        self.push(NodeKind::Element {
            name: QName {
                namespace: Some(namespace.to_string()),
                prefix,
                local: local.to_string(),
            },
            namespaces: Vec::new(),
            attributes: Vec::new(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Remove `id` from its parent. The node stays usable for re-insertion.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(index) = self.index_in_parent(id) {
            if let Some(parent) = self.nodes[id.0].parent {
                self.nodes[parent.0].children.remove(index);
            }
        }
        self.nodes[id.0].parent = None;
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `node` as the next sibling of `anchor`. A detached anchor
    /// leaves the tree unchanged and returns `false`.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> bool {
        if anchor == node {
            return true;
        }

        self.detach(node);
        match (self.parent(anchor), self.index_in_parent(anchor)) {
            (Some(parent), Some(index)) => {
                self.insert_child(parent, index + 1, node);
                true
            }
            _ => false,
        }
    }

    /// Keep only the children of `id` for which `keep` returns true
    pub fn retain_children(&mut self, id: NodeId, keep: impl Fn(&XmlTree, NodeId) -> bool) {
        let removed: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|child| !keep(self, *child))
            .collect();

        for child in removed {
            self.detach(child);
        }
    }

    /// Existing `local` child of `parent`, or a new one inserted so that the
    /// children keep the sequence given by `order` (local names in schema
    /// order). Children not listed in `order` are treated as coming last.
    pub fn ensure_child(
        &mut self,
        parent: NodeId,
        namespace: &str,
        local: &str,
        order: &[&str],
    ) -> NodeId {
        if let Some(existing) = self.first_child_element(parent, namespace, local) {
            return existing;
        }

        let rank = |name: &str| order.iter().position(|n| *n == name).unwrap_or(order.len());
        let own_rank = rank(local);

        let index = self
            .children(parent)
            .iter()
            .position(|child| {
                self.local_name_in(*child, namespace)
                    .is_some_and(|name| rank(name) > own_rank)
            })
            .unwrap_or(self.children(parent).len());

        let child = self.create_element(namespace, local);
        self.insert_child(parent, index, child);
        child
    }

    /// Serialize the tree with an XML declaration
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        self.write_node(self.root, &mut out);
        out
    }

    /// Serialize one subtree, without declaration
    pub fn node_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];

        match &node.kind {
            NodeKind::Element {
                name,
                namespaces,
                attributes,
            } => {
                let qualified = name.qualified();
                out.push('<');
                out.push_str(&qualified);

                for (prefix, uri) in namespaces {
                    match prefix {
                        Some(prefix) => {
                            out.push_str(" xmlns:");
                            out.push_str(prefix);
                        }
                        None => out.push_str(" xmlns"),
                    }
                    out.push_str("=\"");
                    escape_attribute(uri, out);
                    out.push('"');
                }

                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name.qualified());
                    out.push_str("=\"");
                    escape_attribute(&attr.value, out);
                    out.push('"');
                }

                if node.children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    for child in &node.children {
                        self.write_node(*child, out);
                    }
                    out.push_str("</");
                    out.push_str(&qualified);
                    out.push('>');
                }
            }
            NodeKind::Text(text) => escape_text(text, out),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction { target, value } => {
                out.push_str("<?");
                out.push_str(target);
                if let Some(value) = value {
                    out.push(' ');
                    out.push_str(value);
                }
                out.push_str("?>");
            }
        }
    }
}

fn element_kind(node: roxmltree::Node) -> NodeKind {
    let tag = node.tag_name();

    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    let namespaces = node
        .namespaces()
        .filter(|ns| ns.uri() != ns::XML && !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect();

    let attributes = node
        .attributes()
        .map(|attr| Attribute {
            name: QName {
                namespace: attr.namespace().map(str::to_string),
                prefix: attr.namespace().and_then(|uri| attribute_prefix_of(node, uri)),
                local: attr.name().to_string(),
            },
            value: attr.value().to_string(),
        })
        .collect();

    NodeKind::Element {
        name: QName {
            namespace: tag.namespace().map(str::to_string),
            prefix: tag.namespace().and_then(|uri| element_prefix_of(node, uri)),
            local: tag.name().to_string(),
        },
        namespaces,
        attributes,
    }
}

fn element_prefix_of(node: roxmltree::Node, uri: &str) -> Option<String> {
    if uri == ns::XML {
        return Some("xml".to_string());
    }
    node.lookup_prefix(uri).map(str::to_string)
}

/// Attributes never live in the default namespace, so only prefixed bindings
/// count.
fn attribute_prefix_of(node: roxmltree::Node, uri: &str) -> Option<String> {
    if uri == ns::XML {
        return Some("xml".to_string());
    }
    node.namespaces()
        .find(|ns| ns.uri() == uri && ns.name().is_some())
        .and_then(|ns| ns.name())
        .map(str::to_string)
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
}
