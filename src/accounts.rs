// 🌳 Account Tree - Chart of accounts as an explicit tree
//
// "Expenses:Toys:Computer" becomes Expenses → Toys → Computer.
// A node is selectable when its full path is itself an account, independent
// of whether it has sub-accounts.

use crate::account::{self, SEP};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountNode {
    /// Segment name (e.g., "Toys")
    pub name: String,

    /// True when the path to this node is a bookable account
    pub selectable: bool,

    pub children: Vec<AccountNode>,
}

impl AccountNode {
    fn new(name: &str) -> Self {
        AccountNode {
            name: name.to_string(),
            selectable: false,
            children: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|child| child.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&AccountNode> {
        self.children.iter().find(|child| child.name == name)
    }

    fn child_mut_or_insert(&mut self, name: &str) -> &mut AccountNode {
        let index = match self.child_index(name) {
            Some(index) => index,
            None => {
                self.children.push(AccountNode::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn sort_children(&mut self) {
        self.children.sort_by(|a, b| a.name.cmp(&b.name));
        for child in &mut self.children {
            child.sort_children();
        }
    }

    fn collect_names(&self, prefix: &str, out: &mut Vec<String>) {
        for child in &self.children {
            let path = if prefix.is_empty() {
                child.name.clone()
            } else {
                format!("{}{}{}", prefix, SEP, child.name)
            };
            if child.selectable {
                out.push(path.clone());
            }
            child.collect_names(&path, out);
        }
    }
}

/// Chart of accounts. Top-level children follow the account type order
/// (Assets, Liabilities, Equity, Income, Expenses), deeper levels are
/// alphabetical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountTree {
    root: AccountNode,
}

impl AccountTree {
    pub fn new() -> Self {
        AccountTree {
            root: AccountNode::new(""),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = AccountTree::new();
        for name in names {
            tree.add(name.as_ref());
        }
        tree.sort();
        tree
    }

    /// Add an account, creating intermediate nodes as non-selectable
    fn add(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }

        let mut node = &mut self.root;
        for segment in account::segments(name) {
            node = node.child_mut_or_insert(segment);
        }
        node.selectable = true;
    }

    fn sort(&mut self) {
        self.root.sort_children();
        self.root
            .children
            .sort_by(|a, b| account::sort_key(&a.name).cmp(&account::sort_key(&b.name)));
    }

    /// Top-level nodes
    pub fn roots(&self) -> &[AccountNode] {
        &self.root.children
    }

    pub(crate) fn root(&self) -> &AccountNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Node addressed by a full account name
    pub fn find(&self, name: &str) -> Option<&AccountNode> {
        account::segments(name).try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// Every selectable account, depth first in tree order
    pub fn names(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_names("", &mut out);
        out
    }
}

impl Default for AccountTree {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
