//! Page Node
//!
//! Link-based node layout: parent/sibling/child ids instead of
//! pointers, so nodes stay cheap to move around during replacement.

use crate::NodeId;

/// A node in the page tree
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if root or detached)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data: NodeData::Element(ElementData::new(tag)),
        }
    }

    /// Create the document root node
    pub fn document() -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data: NodeData::Document,
        }
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Tag name, lowercase
    pub tag: String,
    /// Attributes in set order
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                attr.value = value.to_string();
                return;
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// The element's id attribute
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }
}

/// Attribute
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_attrs() {
        let mut elem = ElementData::new("VIDEO");
        assert_eq!(elem.tag, "video");

        elem.set_attr("width", "640");
        elem.set_attr("width", "800");
        assert_eq!(elem.attr("width"), Some("800"));
        assert_eq!(elem.attrs.len(), 1);
        assert_eq!(elem.attr("height"), None);
    }

    #[test]
    fn test_element_id() {
        let mut elem = ElementData::new("div");
        assert_eq!(elem.id(), None);
        elem.set_attr("id", "player_1");
        assert_eq!(elem.id(), Some("player_1"));
    }
}
