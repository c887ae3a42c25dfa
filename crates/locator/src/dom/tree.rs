// ABOUTME: Arena view of an HTML document: element nodes in a flat Vec with parent indices.
// ABOUTME: Built from scraper/ego-tree; exposes tag/id/class, depth, ancestors and target values.

use ego_tree::NodeId;
use scraper::{ElementRef, Html};

/// Index of a node in an [`HtmlTree`]. Index 0 is the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    pub const ROOT: NodeIndex = NodeIndex(0);
}

/// One element of the document (or the document root itself).
#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    id: String,
    class: String,
    parent: Option<NodeIndex>,
    depth: usize,
    handle: Option<NodeId>,
}

impl Node {
    fn root(handle: Option<NodeId>) -> Self {
        Self {
            tag: String::new(),
            id: String::new(),
            class: String::new(),
            parent: None,
            depth: 0,
            handle,
        }
    }

    /// Lowercase tag name; empty for the document root.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The `id` attribute, or `""` when absent.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw `class` attribute, or `""` when absent.
    pub fn class_value(&self) -> &str {
        &self.class
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Number of parent hops to the document root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A parsed document flattened into an arena.
///
/// Nodes are stored in document order with the root at index 0, so
/// `find_by_tag` returns candidates in document order and ancestor walks are
/// plain index hops.
pub struct HtmlTree {
    nodes: Vec<Node>,
    doc: Option<Html>,
}

impl std::fmt::Debug for HtmlTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlTree")
            .field("nodes", &self.nodes.len())
            .field("has_document", &self.doc.is_some())
            .finish()
    }
}

impl HtmlTree {
    /// Parses a full HTML document.
    pub fn parse_document(html: &str) -> Self {
        Self::from_html(Html::parse_document(html))
    }

    /// Parses an HTML fragment. The fragment's elements sit under an `<html>`
    /// element, one level below the root.
    pub fn parse_fragment(html: &str) -> Self {
        Self::from_html(Html::parse_fragment(html))
    }

    /// Flattens an already-parsed scraper document.
    pub fn from_html(doc: Html) -> Self {
        let root = doc.tree.root();
        let mut nodes = vec![Node::root(Some(root.id()))];

        let mut stack: Vec<_> = root.children().rev().map(|c| (c, NodeIndex::ROOT)).collect();
        while let Some((node, parent)) = stack.pop() {
            let Some(el) = node.value().as_element() else {
                continue;
            };
            let index = NodeIndex(nodes.len());
            nodes.push(Node {
                tag: el.name().to_ascii_lowercase(),
                id: el.id().unwrap_or("").to_string(),
                class: el.attr("class").unwrap_or("").to_string(),
                parent: Some(parent),
                depth: nodes[parent.0].depth + 1,
                handle: Some(node.id()),
            });
            stack.extend(node.children().rev().map(|c| (c, index)));
        }

        Self {
            nodes,
            doc: Some(doc),
        }
    }

    /// Starts a hand-built tree with only a document root.
    pub fn builder() -> TreeBuilder {
        TreeBuilder {
            nodes: vec![Node::root(None)],
        }
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.node(index).and_then(Node::parent)
    }

    /// Parent hops from `index` to the root; 0 for unknown indices.
    pub fn depth(&self, index: NodeIndex) -> usize {
        self.node(index).map_or(0, Node::depth)
    }

    /// Every element with the given tag, ASCII case-insensitively, in
    /// document order. The root never matches.
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, n)| n.tag.eq_ignore_ascii_case(tag))
            .map(|(i, _)| NodeIndex(i))
            .collect()
    }

    /// Element ancestors of `index`, starting with `index` itself and
    /// stopping before the document root.
    pub fn chain(&self, index: NodeIndex) -> Chain<'_> {
        Chain {
            tree: self,
            next: Some(index),
        }
    }

    fn element(&self, index: NodeIndex) -> Option<ElementRef<'_>> {
        let handle = self.node(index)?.handle?;
        let doc = self.doc.as_ref()?;
        ElementRef::wrap(doc.tree.get(handle)?)
    }

    /// Descendant text of an element with whitespace collapsed.
    pub fn text(&self, index: NodeIndex) -> Option<String> {
        let el = self.element(index)?;
        Some(normalize_whitespace(&el.text().collect::<String>()))
    }

    /// Inner HTML of an element.
    pub fn inner_html(&self, index: NodeIndex) -> Option<String> {
        self.element(index).map(|el| el.inner_html())
    }

    /// Attribute value of an element. `id` and `class` also work on
    /// hand-built trees.
    pub fn attr(&self, index: NodeIndex, name: &str) -> Option<String> {
        if let Some(el) = self.element(index) {
            return el.value().attr(name).map(str::to_string);
        }
        let node = self.node(index)?;
        match name {
            "id" if !node.id.is_empty() => Some(node.id.clone()),
            "class" if !node.class.is_empty() => Some(node.class.clone()),
            _ => None,
        }
    }

    /// Resolves a path target against a node: `text` (also the default when
    /// no target is given), `html`, or an attribute name. Blank values count
    /// as missing.
    pub fn resolve(&self, index: NodeIndex, target: Option<&str>) -> Option<String> {
        let value = match target {
            None | Some("text") => self.text(index),
            Some("html") => self.inner_html(index),
            Some(attr) => self.attr(index, attr).map(|v| v.trim().to_string()),
        }?;
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Iterator over a node and its element ancestors.
pub struct Chain<'a> {
    tree: &'a HtmlTree,
    next: Option<NodeIndex>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = (NodeIndex, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let node = self.tree.node(index)?;
        if node.is_root() {
            self.next = None;
            return None;
        }
        self.next = node.parent;
        Some((index, node))
    }
}

/// Builds an [`HtmlTree`] node by node, for callers with their own parser.
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    /// Appends an element under `parent` and returns its index. Children
    /// should be pushed in document order.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not returned by this builder.
    pub fn push(
        &mut self,
        parent: NodeIndex,
        tag: &str,
        id: Option<&str>,
        class: Option<&str>,
    ) -> NodeIndex {
        let depth = self.nodes[parent.0].depth + 1;
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            id: id.unwrap_or("").to_string(),
            class: class.unwrap_or("").to_string(),
            parent: Some(parent),
            depth,
            handle: None,
        });
        index
    }

    pub fn build(self) -> HtmlTree {
        HtmlTree {
            nodes: self.nodes,
            doc: None,
        }
    }
}

/// Normalizes whitespace in a string by collapsing runs of whitespace into single spaces.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
