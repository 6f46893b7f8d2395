// 🧭 Account Selector - Cursor navigation through the account tree
//
// The cursor holds one sibling index per depth. Every operation keeps it a
// valid path through the tree: movement clamps instead of wrapping.

use crate::account::SEP;
use crate::accounts::{AccountNode, AccountTree};
use crate::error::{ReviewError, ReviewResult};

/// One column of the tree along the cursor, for rendering
#[derive(Debug, Clone, Copy)]
pub struct Level<'a> {
    pub nodes: &'a [AccountNode],

    /// Index highlighted by the cursor at this depth (None for the preview
    /// of the current node's children)
    pub selected: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AccountSelector<'a> {
    tree: &'a AccountTree,
    cursor: Vec<usize>,
}

impl<'a> AccountSelector<'a> {
    pub fn new(tree: &'a AccountTree) -> ReviewResult<Self> {
        if tree.is_empty() {
            return Err(ReviewError::EmptyAccountTree);
        }
        Ok(AccountSelector {
            tree,
            cursor: vec![0],
        })
    }

    pub fn reset(&mut self) {
        self.cursor = vec![0];
    }

    // ========================================================================
    // PATH RESOLUTION
    // ========================================================================

    /// Full account name under the cursor
    pub fn account(&self) -> String {
        let mut names = Vec::with_capacity(self.cursor.len());
        let mut node = self.tree.root();
        for &index in &self.cursor {
            node = &node.children[index];
            names.push(node.name.as_str());
        }
        names.join(&SEP.to_string())
    }

    /// Move the cursor onto `account`
    pub fn set_account(&mut self, account: &str) -> ReviewResult<()> {
        let mut cursor = Vec::new();
        let mut node = self.tree.root();

        for segment in crate::account::segments(account) {
            let index = node
                .child_index(segment)
                .ok_or_else(|| ReviewError::AccountNotFound {
                    path: account.to_string(),
                    segment: segment.to_string(),
                })?;
            cursor.push(index);
            node = &node.children[index];
        }

        self.cursor = cursor;
        Ok(())
    }

    pub fn cursor(&self) -> &[usize] {
        &self.cursor
    }

    /// Restore a cursor; rejected unless it is a valid path
    pub fn set_cursor(&mut self, cursor: Vec<usize>) -> ReviewResult<()> {
        if cursor.is_empty() || !self.is_valid_path(&cursor) {
            return Err(ReviewError::InvalidCursor { cursor });
        }
        self.cursor = cursor;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.cursor.len()
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    pub fn prev_sibling(&mut self) {
        if let Some(last) = self.cursor.last_mut() {
            *last = last.saturating_sub(1);
        }
    }

    pub fn next_sibling(&mut self) {
        let count = self.walk(&self.cursor[..self.cursor.len() - 1]).children.len();
        if let Some(last) = self.cursor.last_mut() {
            *last = (*last + 1).min(count - 1);
        }
    }

    pub fn ascend(&mut self) {
        if self.cursor.len() > 1 {
            self.cursor.pop();
        }
    }

    pub fn descend(&mut self) {
        if self.current_node().has_children() {
            self.cursor.push(0);
        }
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    /// Subtree rooted at the cursor
    pub fn current_node(&self) -> &'a AccountNode {
        self.walk(&self.cursor)
    }

    /// Whether the account under the cursor can be booked to
    pub fn is_selectable(&self) -> bool {
        self.current_node().selectable
    }

    /// Sibling lists along the cursor followed by the current node's children
    pub fn levels(&self) -> Vec<Level<'a>> {
        let mut levels = Vec::with_capacity(self.cursor.len() + 1);
        let mut node = self.tree.root();
        for &index in &self.cursor {
            levels.push(Level {
                nodes: &node.children,
                selected: Some(index),
            });
            node = &node.children[index];
        }
        if node.has_children() {
            levels.push(Level {
                nodes: &node.children,
                selected: None,
            });
        }
        levels
    }

    pub fn tree(&self) -> &'a AccountTree {
        self.tree
    }

    fn walk(&self, path: &[usize]) -> &'a AccountNode {
        let tree: &'a AccountTree = self.tree;
        path.iter()
            .fold(tree.root(), |node, &index| &node.children[index])
    }

    fn is_valid_path(&self, path: &[usize]) -> bool {
        let mut node = self.tree.root();
        for &index in path {
            match node.children.get(index) {
                Some(child) => node = child,
                None => return false,
            }
        }
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> AccountTree {
        AccountTree::from_names([
            "Assets:Bank:Checking",
            "Assets:Bank:Savings",
            "Expenses:Coffee",
            "Expenses:Food",
            "Expenses:Food:Restaurants",
            "Expenses:Toys:Computer",
        ])
    }

    #[test]
    fn test_descend_to_leaf() {
        let tree = AccountTree::from_names(["Expenses:Toys:Computer"]);
        let mut selector = AccountSelector::new(&tree).unwrap();

        assert_eq!(selector.cursor(), &[0]);
        selector.descend();
        assert_eq!(selector.cursor(), &[0, 0]);
        selector.descend();
        assert_eq!(selector.cursor(), &[0, 0, 0]);
        assert_eq!(selector.account(), "Expenses:Toys:Computer");
        assert!(selector.is_selectable());

        selector.descend();
        assert_eq!(selector.cursor(), &[0, 0, 0]);
    }

    #[test]
    fn test_sibling_clamping() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();

        selector.prev_sibling();
        assert_eq!(selector.cursor(), &[0]);

        selector.next_sibling();
        assert_eq!(selector.account(), "Expenses");
        selector.next_sibling();
        assert_eq!(selector.cursor(), &[1]);
        assert_eq!(selector.account(), "Expenses");
    }

    #[test]
    fn test_ascend_stops_at_root_level() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();

        selector.ascend();
        assert_eq!(selector.cursor(), &[0]);

        selector.descend();
        selector.descend();
        assert_eq!(selector.account(), "Assets:Bank:Checking");
        selector.ascend();
        assert_eq!(selector.account(), "Assets:Bank");
        assert!(!selector.is_selectable());
    }

    #[test]
    fn test_set_account_round_trip() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();

        for name in tree.names() {
            selector.set_account(&name).unwrap();
            assert_eq!(selector.account(), name);
        }
    }

    #[test]
    fn test_set_account_unknown_segment() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();
        selector.set_account("Expenses:Coffee").unwrap();

        let err = selector.set_account("Expenses:Travel").unwrap_err();
        assert!(matches!(
            err,
            ReviewError::AccountNotFound { ref segment, .. } if segment == "Travel"
        ));
        assert_eq!(selector.account(), "Expenses:Coffee");
    }

    #[test]
    fn test_selectable_node_with_children() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();
        selector.set_account("Expenses:Food").unwrap();

        assert!(selector.is_selectable());
        selector.descend();
        assert_eq!(selector.account(), "Expenses:Food:Restaurants");
    }

    #[test]
    fn test_set_cursor_validates() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();

        selector.set_cursor(vec![1, 2, 0]).unwrap();
        assert_eq!(selector.account(), "Expenses:Toys:Computer");

        assert!(selector.set_cursor(vec![]).is_err());
        assert!(selector.set_cursor(vec![5]).is_err());
        assert!(selector.set_cursor(vec![1, 0, 0]).is_err());
        assert_eq!(selector.cursor(), &[1, 2, 0]);
    }

    #[test]
    fn test_levels_follow_cursor() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();
        selector.set_account("Expenses:Food").unwrap();

        let levels = selector.levels();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].selected, Some(1));
        assert_eq!(levels[1].nodes.len(), 3);
        assert_eq!(levels[1].selected, Some(1));
        assert_eq!(levels[2].nodes[0].name, "Restaurants");
        assert_eq!(levels[2].selected, None);
    }

    #[test]
    fn test_empty_tree_rejected() {
        let tree = AccountTree::new();
        assert!(matches!(
            AccountSelector::new(&tree),
            Err(ReviewError::EmptyAccountTree)
        ));
    }

    #[test]
    fn test_reset() {
        let tree = sample_tree();
        let mut selector = AccountSelector::new(&tree).unwrap();
        selector.set_account("Expenses:Toys:Computer").unwrap();
        selector.reset();
        assert_eq!(selector.cursor(), &[0]);
    }
}
