//! The in-memory document tree.
//!
//! A document is a single root [`DocumentNode`] that owns every node below it.
//! Objects keep their children in insertion order so that serializing an
//! untouched subtree reproduces it in the same order it was read.

/// A typed value stored in a [`DocumentNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    /// Ordered named children.
    Object(Vec<DocumentNode>),
    /// A value carrying a KV3 type flag, e.g. `resource_name:"particles/foo.vpcf"`.
    Flagged { flag: String, value: Box<Value> },
    /// A KV3 binary blob (`#[ 01 02 ]`).
    Binary(Vec<u8>),
}

impl Value {
    /// Build an empty object value.
    pub fn object() -> Self {
        Value::Object(Vec::new())
    }

    /// Returns the string content, looking through a type flag.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Flagged { value, .. } => value.as_str(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.unflagged(), Value::Object(_))
    }

    /// Strip any type flag and return the underlying value.
    pub fn unflagged(&self) -> &Value {
        match self {
            Value::Flagged { value, .. } => value.unflagged(),
            other => other,
        }
    }

    fn unflagged_mut(&mut self) -> &mut Value {
        match self {
            Value::Flagged { value, .. } => value.unflagged_mut(),
            other => other,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// A named node of a document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    pub name: String,
    pub value: Value,
}

impl DocumentNode {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a node holding an object with the given children.
    pub fn object(name: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        Self {
            name: name.into(),
            value: Value::Object(children),
        }
    }

    /// Immediate children of an object node. Empty for every other value.
    pub fn children(&self) -> &[DocumentNode] {
        match self.value.unflagged() {
            Value::Object(children) => children,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<DocumentNode>> {
        match self.value.unflagged_mut() {
            Value::Object(children) => Some(children),
            _ => None,
        }
    }

    /// Exact-name lookup among immediate children.
    ///
    /// Returns `None` both when the child is absent and when this node is not
    /// an object. When a KV1 block repeats a key, the first occurrence wins.
    pub fn find_child(&self, name: &str) -> Option<&DocumentNode> {
        self.children().iter().find(|child| child.name == name)
    }

    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut DocumentNode> {
        self.children_mut()?
            .iter_mut()
            .find(|child| child.name == name)
    }

    /// Position of the first child named `name`.
    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children().iter().position(|child| child.name == name)
    }

    pub fn child_at_mut(&mut self, index: usize) -> Option<&mut DocumentNode> {
        self.children_mut()?.get_mut(index)
    }

    /// All immediate children named `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocumentNode> + 'a {
        self.children().iter().filter(move |child| child.name == name)
    }

    /// Follow a chain of child names from this node.
    pub fn find_path(&self, path: &[&str]) -> Option<&DocumentNode> {
        path.iter()
            .try_fold(self, |node, name| node.find_child(name))
    }

    pub fn find_path_mut(&mut self, path: &[&str]) -> Option<&mut DocumentNode> {
        let mut node = self;
        for name in path {
            node = node.find_child_mut(name)?;
        }
        Some(node)
    }

    /// Replace this node's value, keeping its name and sibling position.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
    }

    /// Insert a child, replacing the value of an existing child with the same
    /// name in place. Non-object nodes are turned into an empty object first.
    pub fn insert(&mut self, child: DocumentNode) {
        if self.children_mut().is_none() {
            self.value = Value::object();
        }
        let Some(children) = self.children_mut() else {
            return;
        };
        match children.iter_mut().find(|c| c.name == child.name) {
            Some(existing) => existing.value = child.value,
            None => children.push(child),
        }
    }

    /// Append a child without checking for an existing one of the same name.
    ///
    /// KV1 blocks such as `SearchPaths` rely on repeated keys.
    pub fn push(&mut self, child: DocumentNode) {
        if self.children_mut().is_none() {
            self.value = Value::object();
        }
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
    }

    /// Remove and return every child named `name`.
    pub fn remove_all(&mut self, name: &str) -> Vec<DocumentNode> {
        let Some(children) = self.children_mut() else {
            return Vec::new();
        };
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(children)
            .into_iter()
            .partition(|child| child.name == name);
        *children = kept;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero() -> DocumentNode {
        DocumentNode::object(
            "hero_atlas",
            vec![
                DocumentNode::new("_base", "hero_base"),
                DocumentNode::object(
                    "m_mapBoundAbilities",
                    vec![
                        DocumentNode::new("ESlot_Signature_1", "ability_a"),
                        DocumentNode::new("ESlot_Signature_2", "ability_b"),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn find_child_is_not_recursive() {
        let node = hero();
        assert!(node.find_child("_base").is_some());
        assert!(node.find_child("ESlot_Signature_1").is_none());
        assert!(node
            .find_path(&["m_mapBoundAbilities", "ESlot_Signature_1"])
            .is_some());
    }

    #[test]
    fn find_child_on_scalar_is_absent() {
        let node = DocumentNode::new("x", 5_i64);
        assert!(node.find_child("anything").is_none());
        assert!(node.children().is_empty());
    }

    #[test]
    fn set_value_keeps_position() {
        let mut node = hero();
        node.find_path_mut(&["m_mapBoundAbilities", "ESlot_Signature_1"])
            .unwrap()
            .set_value("ability_z");

        let slots = node.find_child("m_mapBoundAbilities").unwrap();
        assert_eq!(slots.child_index("ESlot_Signature_1"), Some(0));
        assert_eq!(
            slots.find_child("ESlot_Signature_1").unwrap().value.as_str(),
            Some("ability_z")
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut node = hero();
        node.insert(DocumentNode::new("_base", "other_base"));
        node.insert(DocumentNode::new("m_bDisabled", true));

        assert_eq!(node.children().len(), 3);
        assert_eq!(node.child_index("_base"), Some(0));
        assert_eq!(node.children()[2].name, "m_bDisabled");
    }

    #[test]
    fn push_allows_repeated_keys() {
        let mut block = DocumentNode::object("SearchPaths", vec![]);
        block.push(DocumentNode::new("Game", "citadel"));
        block.push(DocumentNode::new("Game", "core"));

        let games: Vec<_> = block
            .find_all("Game")
            .filter_map(|n| n.value.as_str())
            .collect();
        assert_eq!(games, vec!["citadel", "core"]);

        let removed = block.remove_all("Game");
        assert_eq!(removed.len(), 2);
        assert!(block.children().is_empty());
    }

    #[test]
    fn flagged_object_exposes_children() {
        let node = DocumentNode {
            name: "m_WeaponInfo".to_string(),
            value: Value::Flagged {
                flag: "subclass".to_string(),
                value: Box::new(Value::Object(vec![DocumentNode::new("m_iBullets", 1_i64)])),
            },
        };
        assert_eq!(
            node.find_child("m_iBullets").and_then(|n| n.value.as_i64()),
            Some(1)
        );
    }
}
