//! # Tree Utilities
//!
//! Generic algorithms over anything implementing [`TreeNode`]: reference
//! trees, metadata trees, and the plain [`Tree<T>`].
//!
//! A node is either a leaf (`children()` is `None`) or an internal node
//! with a possibly empty child list. The distinction matters to [`map`],
//! whose callback sees `None` for leaves, and to [`difference`], which
//! compares leaves by value and internal nodes by their children.

use serde::Serialize;

pub trait TreeNode: Sized {
    fn children(&self) -> Option<&[Self]>;
}

/// A value with optional children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tree<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Tree<T>>>,
}

impl<T> Tree<T> {
    pub fn leaf(value: T) -> Self {
        Self {
            value,
            children: None,
        }
    }

    pub fn node(value: T, children: Vec<Tree<T>>) -> Self {
        Self {
            value,
            children: Some(children),
        }
    }
}

impl<T> TreeNode for Tree<T> {
    fn children(&self) -> Option<&[Self]> {
        self.children.as_deref()
    }
}

/// Pre-order list of all nodes, root first.
pub fn flatten<N: TreeNode>(root: &N) -> Vec<&N> {
    let mut out = Vec::new();
    collect(root, &mut out);
    out
}

fn collect<'n, N: TreeNode>(node: &'n N, out: &mut Vec<&'n N>) {
    out.push(node);
    for child in node.children().unwrap_or_default() {
        collect(child, out);
    }
}

/// Visits nodes in pre-order until `f` returns `true`.
///
/// Returns whether traversal was stopped early.
pub fn for_each<N: TreeNode>(root: &N, f: &mut impl FnMut(&N) -> bool) -> bool {
    if f(root) {
        return true;
    }
    root.children()
        .unwrap_or_default()
        .iter()
        .any(|child| for_each(child, f))
}

/// Children assignment chosen by a [`map`] callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedChildren<U> {
    /// Use the computed children, including any changes the callback made
    /// to them in place.
    Inherit,
    /// Use exactly these children, `None` included.
    Explicit(Option<Vec<Tree<U>>>),
}

/// What a [`map`] callback returns for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapped<U> {
    pub value: U,
    pub children: MappedChildren<U>,
}

impl<U> Mapped<U> {
    pub fn new(value: U) -> Self {
        Self {
            value,
            children: MappedChildren::Inherit,
        }
    }

    pub fn with_children(value: U, children: Option<Vec<Tree<U>>>) -> Self {
        Self {
            value,
            children: MappedChildren::Explicit(children),
        }
    }
}

/// Structure-preserving map.
///
/// Children are mapped first; then `f` receives the node and the mapped
/// children (`None` for a leaf) and builds the new node.
pub fn map<N, U>(root: &N, f: &mut impl FnMut(&N, Option<&mut Vec<Tree<U>>>) -> Mapped<U>) -> Tree<U>
where
    N: TreeNode,
{
    let mut children: Option<Vec<Tree<U>>> = root
        .children()
        .map(|nodes| nodes.iter().map(|child| map(child, f)).collect());

    let mapped = f(root, children.as_mut());
    let children = match mapped.children {
        MappedChildren::Inherit => children,
        MappedChildren::Explicit(explicit) => explicit,
    };

    Tree {
        value: mapped.value,
        children,
    }
}

/// Where two trees differ.
#[derive(Debug, PartialEq, Eq)]
pub struct Difference<'a, N> {
    /// Position of this node among its siblings.
    pub index: usize,
    pub object1: Option<&'a N>,
    pub object2: Option<&'a N>,
    /// Differing children only; empty for leaves.
    pub children: Vec<Difference<'a, N>>,
}

/// Structural diff of two trees of the same shape.
///
/// Leaves are compared with `equals`; internal nodes are compared child by
/// child. Returns `None` when nothing differs.
pub fn difference<'a, N: TreeNode>(
    tree1: &'a N,
    tree2: &'a N,
    equals: &impl Fn(&N, &N) -> bool,
) -> Option<Difference<'a, N>> {
    diff_at(0, Some(tree1), Some(tree2), equals)
}

fn diff_at<'a, N: TreeNode>(
    index: usize,
    node1: Option<&'a N>,
    node2: Option<&'a N>,
    equals: &impl Fn(&N, &N) -> bool,
) -> Option<Difference<'a, N>> {
    let leaf = |index| Difference {
        index,
        object1: node1,
        object2: node2,
        children: Vec::new(),
    };

    let (Some(a), Some(b)) = (node1, node2) else {
        return Some(leaf(index));
    };

    match (a.children(), b.children()) {
        (Some(c1), Some(c2)) => {
            let children: Vec<_> = (0..c1.len().max(c2.len()))
                .filter_map(|i| diff_at(i, c1.get(i), c2.get(i), equals))
                .collect();
            (!children.is_empty()).then(|| Difference {
                index,
                object1: Some(a),
                object2: Some(b),
                children,
            })
        }
        _ => (!equals(a, b)).then(|| leaf(index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Tree<&'static str> {
        Tree::node(
            "root",
            vec![
                Tree::node("a", vec![Tree::leaf("a1"), Tree::leaf("a2")]),
                Tree::leaf("b"),
                Tree::node("c", vec![]),
            ],
        )
    }

    fn values<T: Copy>(nodes: Vec<&Tree<T>>) -> Vec<T> {
        nodes.into_iter().map(|n| n.value).collect()
    }

    #[test]
    fn flatten_is_pre_order() {
        let tree = sample();
        assert_eq!(values(flatten(&tree)), vec!["root", "a", "a1", "a2", "b", "c"]);
    }

    #[test]
    fn for_each_visits_everything_when_not_stopped() {
        let tree = sample();
        let mut seen = Vec::new();
        let stopped = for_each(&tree, &mut |n| {
            seen.push(n.value);
            false
        });
        assert!(!stopped);
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn for_each_stops_early() {
        let tree = sample();
        let mut seen = Vec::new();
        let stopped = for_each(&tree, &mut |n| {
            seen.push(n.value);
            n.value == "a1"
        });
        assert!(stopped);
        assert_eq!(seen, vec!["root", "a", "a1"]);
    }

    #[test]
    fn map_preserves_shape() {
        let tree = sample();
        let mapped = map(&tree, &mut |n, _| Mapped::new(n.value.len()));

        assert_eq!(flatten(&mapped).len(), flatten(&tree).len());
        assert_eq!(values(flatten(&mapped)), vec![4, 1, 2, 2, 1, 1]);
        assert_eq!(mapped.children.as_ref().unwrap()[2].children, Some(vec![]));
    }

    #[test]
    fn map_passes_none_for_leaves() {
        let tree = sample();
        let mut leaves = Vec::new();
        map(&tree, &mut |n, children| {
            if children.is_none() {
                leaves.push(n.value);
            }
            Mapped::new(())
        });
        assert_eq!(leaves, vec!["a1", "a2", "b"]);
    }

    #[test]
    fn map_children_are_mapped_before_the_parent() {
        let tree = sample();
        let mut order = Vec::new();
        map(&tree, &mut |n, _| {
            order.push(n.value);
            Mapped::new(())
        });
        assert_eq!(order, vec!["a1", "a2", "a", "b", "c", "root"]);
    }

    #[test]
    fn map_keeps_in_place_changes_to_inherited_children() {
        let tree = sample();
        let mapped = map(&tree, &mut |n, children| {
            if let Some(children) = children {
                children.retain(|c| c.value != "a2");
            }
            Mapped::new(n.value)
        });
        assert_eq!(values(flatten(&mapped)), vec!["root", "a", "a1", "b", "c"]);
    }

    #[test]
    fn map_keeps_explicit_children() {
        let tree = sample();
        let mapped = map(&tree, &mut |n, _| match n.value {
            "a" => Mapped::with_children(n.value, None),
            "c" => Mapped::with_children(n.value, Some(vec![Tree::leaf("new")])),
            _ => Mapped::new(n.value),
        });
        assert_eq!(values(flatten(&mapped)), vec!["root", "a", "b", "c", "new"]);
        assert_eq!(mapped.children.as_ref().unwrap()[0].children, None);
    }

    #[test]
    fn difference_is_reflexive() {
        let tree = sample();
        assert_eq!(difference(&tree, &tree, &|a, b| a.value == b.value), None);
    }

    #[test]
    fn difference_lists_only_differing_leaves() {
        let tree1 = sample();
        let mut tree2 = sample();
        tree2.children.as_mut().unwrap()[0].children.as_mut().unwrap()[1].value = "changed";

        let diff = difference(&tree1, &tree2, &|a, b| a.value == b.value).unwrap();

        assert_eq!(diff.index, 0);
        assert_eq!(diff.children.len(), 1);
        let a = &diff.children[0];
        assert_eq!(a.index, 0);
        assert_eq!(a.children.len(), 1);
        assert_eq!(a.children[0].index, 1);
        assert_eq!(a.children[0].object1.map(|n| n.value), Some("a2"));
        assert_eq!(a.children[0].object2.map(|n| n.value), Some("changed"));
        assert!(a.children[0].children.is_empty());
    }

    #[test]
    fn difference_ignores_internal_values() {
        let tree1 = sample();
        let mut tree2 = sample();
        tree2.value = "renamed";
        assert_eq!(difference(&tree1, &tree2, &|a, b| a.value == b.value), None);
    }

    #[test]
    fn difference_reports_missing_children() {
        let tree1 = sample();
        let mut tree2 = sample();
        tree2.children.as_mut().unwrap().pop();

        let diff = difference(&tree1, &tree2, &|a, b| a.value == b.value).unwrap();
        assert_eq!(diff.children.len(), 1);
        assert_eq!(diff.children[0].index, 2);
        assert_eq!(diff.children[0].object1.map(|n| n.value), Some("c"));
        assert_eq!(diff.children[0].object2, None);
    }
}
