use crate::arena::Entry;

/// Priority reserved for the header. Nodes draw their priority from `[0, MAX_PRIORITY)`.
pub const MAX_PRIORITY: u32 = u32::max_value();

/// A side of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// A non-owning reference to either a node or the header of a treap.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Link {
    Header,
    Node(Entry),
}

impl Link {
    pub fn entry(self) -> Option<Entry> {
        match self {
            Link::Header => None,
            Link::Node(entry) => Some(entry),
        }
    }
}

/// The sentinel of a treap. It owns the root and caches the extremal nodes; both caches point
/// back at the header while the treap is empty.
#[derive(Debug)]
pub struct Header {
    pub root: Option<Entry>,
    pub leftmost: Link,
    pub rightmost: Link,
}

impl Header {
    pub fn new() -> Self {
        Header {
            root: None,
            leftmost: Link::Header,
            rightmost: Link::Header,
        }
    }

    pub fn reset(&mut self) {
        self.root = None;
        self.leftmost = Link::Header;
        self.rightmost = Link::Header;
    }

    pub fn priority(&self) -> u32 {
        MAX_PRIORITY
    }
}

/// A struct representing an internal node of a treap.
///
/// The children are owned by the node; the parent link is only used to walk upwards.
pub struct Node<T> {
    pub(crate) value: T,
    pub(crate) priority: u32,
    pub(crate) len: usize,
    pub(crate) left: Option<Entry>,
    pub(crate) right: Option<Entry>,
    pub(crate) parent: Link,
}

impl<T> Node<T> {
    pub(crate) fn new(value: T, priority: u32) -> Self {
        Node {
            value,
            priority,
            len: 1,
            left: None,
            right: None,
            parent: Link::Header,
        }
    }

    /// Returns the stored value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns the heap priority of the node.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Returns the number of nodes in the subtree rooted at this node.
    pub fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn child(&self, direction: Direction) -> Option<Entry> {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub(crate) fn set_child(&mut self, direction: Direction, child: Option<Entry>) {
        match direction {
            Direction::Left => self.left = child,
            Direction::Right => self.right = child,
        }
    }
}
