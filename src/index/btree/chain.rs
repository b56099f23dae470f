//! The leaf chain: a doubly linked list over leaves, ordered by key.
//!
//! The chain is kept apart from the node store. Nodes do not carry sibling
//! pointers; instead the tree calls [`LeafChain::splice_after`] from every
//! leaf split and [`LeafChain::unlink`] from every leaf merge, in the same
//! step that changes the ownership structure.
//!
//! ```text
//!   head                                      tail
//!    │                                         │
//!    ▼                                         ▼
//!  [Leaf 0] ⇄ [Leaf 4] ⇄ [Leaf 1] ⇄ ... ⇄ [Leaf 7] → NULL
//! ```

use crate::common::NodeId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Link {
    prev: Option<NodeId>,
    next: Option<NodeId>,
    linked: bool,
}

/// Sibling relation over leaf node handles.
pub(crate) struct LeafChain {
    /// Indexed by `NodeId::index()`.
    links: Vec<Link>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl LeafChain {
    /// A chain holding the single leaf `only`.
    pub(crate) fn new(only: NodeId) -> Self {
        let mut chain = Self {
            links: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        };
        chain.reset(only);
        chain
    }

    /// Drop every link and start over with the single leaf `only`.
    pub(crate) fn reset(&mut self, only: NodeId) {
        self.links.clear();
        *self.link_mut(only) = Link {
            prev: None,
            next: None,
            linked: true,
        };
        self.head = Some(only);
        self.tail = Some(only);
        self.len = 1;
    }

    /// Leftmost leaf.
    #[inline]
    pub(crate) fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Rightmost leaf.
    #[inline]
    pub(crate) fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    /// Number of linked leaves.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn next(&self, leaf: NodeId) -> Option<NodeId> {
        self.link(leaf).next
    }

    #[inline]
    pub(crate) fn prev(&self, leaf: NodeId) -> Option<NodeId> {
        self.link(leaf).prev
    }

    pub(crate) fn contains(&self, leaf: NodeId) -> bool {
        self.links
            .get(leaf.index())
            .is_some_and(|link| link.linked)
    }

    /// Link `new_leaf` directly after `at`.
    pub(crate) fn splice_after(&mut self, at: NodeId, new_leaf: NodeId) {
        assert!(self.contains(at), "{} is not in the leaf chain", at);
        assert!(!self.contains(new_leaf), "{} is already in the leaf chain", new_leaf);

        let next = self.link(at).next;
        *self.link_mut(new_leaf) = Link {
            prev: Some(at),
            next,
            linked: true,
        };
        self.link_mut(at).next = Some(new_leaf);
        match next {
            Some(next) => self.link_mut(next).prev = Some(new_leaf),
            None => self.tail = Some(new_leaf),
        }
        self.len += 1;
    }

    /// Remove `leaf`, joining its former neighbours directly.
    pub(crate) fn unlink(&mut self, leaf: NodeId) {
        assert!(self.contains(leaf), "{} is not in the leaf chain", leaf);

        let Link { prev, next, .. } = std::mem::take(self.link_mut(leaf));
        match prev {
            Some(prev) => self.link_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.link_mut(next).prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    /// Leaves from head to tail.
    pub(crate) fn iter(&self) -> ChainIter<'_> {
        ChainIter {
            chain: self,
            cursor: self.head,
        }
    }

    fn link(&self, leaf: NodeId) -> &Link {
        match self.links.get(leaf.index()) {
            Some(link) if link.linked => link,
            _ => panic!("{} is not in the leaf chain", leaf),
        }
    }

    fn link_mut(&mut self, leaf: NodeId) -> &mut Link {
        if self.links.len() <= leaf.index() {
            self.links.resize(leaf.index() + 1, Link::default());
        }
        &mut self.links[leaf.index()]
    }
}

pub(crate) struct ChainIter<'a> {
    chain: &'a LeafChain,
    cursor: Option<NodeId>,
}

impl Iterator for ChainIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.cursor?;
        self.cursor = self.chain.next(current);
        Some(current)
    }
}
