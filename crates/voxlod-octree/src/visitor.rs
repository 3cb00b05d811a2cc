//! Depth-first traversal driven by a pair of callbacks.

use crate::node::{NodeIndex, OctreeNode};
use crate::store::NodeStore;

/// Callbacks run around each node's children.
///
/// `pre_children` decides whether to descend. `post_children` runs after the
/// children were visited (or skipped), in post-order.
pub struct NodeVisitor<Pre, Post> {
    pub pre_children: Pre,
    pub post_children: Post,
}

impl<Pre, Post> NodeVisitor<Pre, Post> {
    pub const fn new(pre_children: Pre, post_children: Post) -> Self {
        Self {
            pre_children,
            post_children,
        }
    }
}

impl<Pre> NodeVisitor<Pre, fn(NodeIndex, &OctreeNode)> {
    /// Visitor with only a pre-order callback.
    pub fn pre_order(pre_children: Pre) -> Self {
        Self::new(pre_children, |_, _| {})
    }
}

impl<Pre> NodeVisitor<Pre, fn(&mut NodeStore, NodeIndex)> {
    /// Mutating visitor with only a pre-order callback.
    pub fn pre_order_mut(pre_children: Pre) -> Self {
        Self::new(pre_children, |_, _| {})
    }
}

/// Walk the subtree rooted at `index` without mutating it.
pub fn walk<Pre, Post>(store: &NodeStore, index: NodeIndex, visitor: &mut NodeVisitor<Pre, Post>)
where
    Pre: FnMut(NodeIndex, &OctreeNode) -> bool,
    Post: FnMut(NodeIndex, &OctreeNode),
{
    let node = &store[index];
    if (visitor.pre_children)(index, node) {
        for child in node.children() {
            walk(store, child, visitor);
        }
    }
    (visitor.post_children)(index, node);
}

/// Walk the subtree rooted at `index`, handing the whole store to each callback.
///
/// The child list is read after `pre_children` returns, so callbacks may
/// update any node state except the hierarchy links.
pub fn walk_mut<Pre, Post>(
    store: &mut NodeStore,
    index: NodeIndex,
    visitor: &mut NodeVisitor<Pre, Post>,
) where
    Pre: FnMut(&mut NodeStore, NodeIndex) -> bool,
    Post: FnMut(&mut NodeStore, NodeIndex),
{
    if (visitor.pre_children)(store, index) {
        let children = store[index].children;
        for child in children.into_iter().flatten() {
            walk_mut(store, child, visitor);
        }
    }
    (visitor.post_children)(store, index);
}
