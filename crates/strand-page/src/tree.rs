//! Page tree (arena-based allocation)
//!
//! Nodes are never freed; a detached node simply drops out of the link
//! structure and can be spliced back in later. Replacement is the core
//! operation here: renderer markup takes a placeholder's position, and
//! the displaced node is handed back so destroy() can restore it.

use crate::{ElementData, Node, NodeData, NodeId, PageError};

/// Arena-based page tree
#[derive(Debug)]
pub struct Page {
    nodes: Vec<Node>,
}

impl Page {
    /// Create a page with an empty document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !id.is_valid() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Number of nodes in the arena (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a new detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::element(tag));
        id
    }

    /// Element data of a node
    pub fn element(&self, id: NodeId) -> Result<&ElementData, PageError> {
        self.get(id)
            .ok_or(PageError::NoSuchNode(id))?
            .as_element()
            .ok_or(PageError::NotAnElement(id))
    }

    /// Mutable element data of a node
    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, PageError> {
        self.get_mut(id)
            .ok_or(PageError::NoSuchNode(id))?
            .as_element_mut()
            .ok_or(PageError::NotAnElement(id))
    }

    /// Tag name of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag.as_str())
    }

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.get(parent).is_some() && self.get(child).is_some());
        let old_last = self.nodes[parent.0 as usize].last_child;

        {
            let node = &mut self.nodes[child.0 as usize];
            node.parent = parent;
            node.prev_sibling = old_last;
            node.next_sibling = NodeId::NONE;
        }
        if old_last.is_valid() {
            self.nodes[old_last.0 as usize].next_sibling = child;
        } else {
            self.nodes[parent.0 as usize].first_child = child;
        }
        self.nodes[parent.0 as usize].last_child = child;
    }

    /// Unlink a node from its parent and siblings (subtree kept intact)
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };
        if prev.is_valid() {
            self.nodes[prev.0 as usize].next_sibling = next;
        } else if parent.is_valid() {
            self.nodes[parent.0 as usize].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.0 as usize].prev_sibling = prev;
        } else if parent.is_valid() {
            self.nodes[parent.0 as usize].last_child = prev;
        }
        let node = &mut self.nodes[id.0 as usize];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Put `new` in `old`'s tree position; `old` comes back detached
    ///
    /// The returned id is the displaced node, still alive in the arena,
    /// so a later `replace_node(new, old)` restores the original state.
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<NodeId, PageError> {
        if self.get(old).is_none() {
            return Err(PageError::NoSuchNode(old));
        }
        if self.get(new).is_none() {
            return Err(PageError::NoSuchNode(new));
        }
        let (parent, prev) = {
            let n = &self.nodes[old.0 as usize];
            (n.parent, n.prev_sibling)
        };
        if !parent.is_valid() {
            return Err(PageError::Detached(old));
        }
        self.detach(new);
        self.detach(old);
        // Splice new in after old's former previous sibling
        if prev.is_valid() {
            self.insert_after(parent, prev, new);
        } else {
            self.insert_first(parent, new);
        }
        Ok(old)
    }

    fn insert_first(&mut self, parent: NodeId, child: NodeId) {
        let old_first = self.nodes[parent.0 as usize].first_child;
        {
            let node = &mut self.nodes[child.0 as usize];
            node.parent = parent;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = old_first;
        }
        if old_first.is_valid() {
            self.nodes[old_first.0 as usize].prev_sibling = child;
        } else {
            self.nodes[parent.0 as usize].last_child = child;
        }
        self.nodes[parent.0 as usize].first_child = child;
    }

    fn insert_after(&mut self, parent: NodeId, anchor: NodeId, child: NodeId) {
        let next = self.nodes[anchor.0 as usize].next_sibling;
        {
            let node = &mut self.nodes[child.0 as usize];
            node.parent = parent;
            node.prev_sibling = anchor;
            node.next_sibling = next;
        }
        self.nodes[anchor.0 as usize].next_sibling = child;
        if next.is_valid() {
            self.nodes[next.0 as usize].prev_sibling = child;
        } else {
            self.nodes[parent.0 as usize].last_child = child;
        }
    }

    /// Iterate direct children of a node
    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        ChildIter {
            page: self,
            next: self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Find an attached element by id attribute (depth-first, first match)
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_with_id(NodeId::ROOT, id)
    }

    fn find_with_id(&self, start: NodeId, target: &str) -> Option<NodeId> {
        for (node_id, node) in self.children(start) {
            if let Some(elem) = node.as_element() {
                if elem.id() == Some(target) {
                    return Some(node_id);
                }
            }
            if let Some(found) = self.find_with_id(node_id, target) {
                return Some(found);
            }
        }
        None
    }

    /// True when the node is reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        while let Some(node) = self.get(cur) {
            if cur == NodeId::ROOT {
                return true;
            }
            if matches!(node.data, NodeData::Document) {
                return true;
            }
            cur = node.parent;
            if !cur.is_valid() {
                return false;
            }
        }
        false
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

struct ChildIter<'a> {
    page: &'a Page,
    next: NodeId,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.page.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}
