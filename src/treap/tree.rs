use crate::arena::{Allocator, Entry, Result};
use crate::treap::node::{Direction, Header, Link, Node};
use crate::treap::Comparator;
use log::debug;
use std::marker::PhantomData;

pub fn node<T, A>(nodes: &A, entry: Entry) -> &Node<T>
where
    A: Allocator<Node<T>>,
{
    nodes.get(&entry).expect("Expected a live node.")
}

pub fn node_mut<T, A>(nodes: &mut A, entry: Entry) -> &mut Node<T>
where
    A: Allocator<Node<T>>,
{
    nodes.get_mut(&entry).expect("Expected a live node.")
}

pub fn len<T, A>(nodes: &A, tree: Option<Entry>) -> usize
where
    A: Allocator<Node<T>>,
{
    tree.map_or(0, |entry| node(nodes, entry).len)
}

pub fn update<T, A>(nodes: &mut A, entry: Entry)
where
    A: Allocator<Node<T>>,
{
    let (left, right) = {
        let curr = node(nodes, entry);
        (curr.left, curr.right)
    };
    let new_len = 1 + len(nodes, left) + len(nodes, right);
    node_mut(nodes, entry).len = new_len;
}

pub fn minimum<T, A>(nodes: &A, mut entry: Entry) -> Entry
where
    A: Allocator<Node<T>>,
{
    while let Some(left) = node(nodes, entry).left {
        entry = left;
    }
    entry
}

pub fn maximum<T, A>(nodes: &A, mut entry: Entry) -> Entry
where
    A: Allocator<Node<T>>,
{
    while let Some(right) = node(nodes, entry).right {
        entry = right;
    }
    entry
}

// Lifts the child opposite to `direction` into the position of `entry`. A missing pivot makes the
// rotation a no-op.
pub fn rotate<T, A>(nodes: &mut A, header: &mut Header, entry: Entry, direction: Direction)
where
    A: Allocator<Node<T>>,
{
    let opposite = direction.opposite();
    let pivot = match node(nodes, entry).child(opposite) {
        Some(pivot) => pivot,
        None => return,
    };

    let inner = node(nodes, pivot).child(direction);
    node_mut(nodes, entry).set_child(opposite, inner);
    if let Some(inner) = inner {
        node_mut(nodes, inner).parent = Link::Node(entry);
    }

    let parent = node(nodes, entry).parent;
    {
        let pivot_node = node_mut(nodes, pivot);
        pivot_node.set_child(direction, Some(entry));
        pivot_node.parent = parent;
    }
    match parent {
        Link::Header => header.root = Some(pivot),
        Link::Node(parent_entry) => {
            let parent_node = node_mut(nodes, parent_entry);
            if parent_node.left == Some(entry) {
                parent_node.left = Some(pivot);
            } else {
                parent_node.right = Some(pivot);
            }
        },
    }
    node_mut(nodes, entry).parent = Link::Node(pivot);

    update(nodes, entry);
    update(nodes, pivot);
}

// Links the allocated node `new_entry` below `tree`, then restores the heap property on the way
// back up. `direction` is the side of `parent` that `tree` hangs from; it is ignored when `parent`
// is the header.
pub fn insert<T, A, C>(
    nodes: &mut A,
    header: &mut Header,
    comparator: &C,
    tree: Option<Entry>,
    parent: Link,
    new_entry: Entry,
    direction: Direction,
) where
    A: Allocator<Node<T>>,
    C: Comparator<T>,
{
    match tree {
        Some(entry) => {
            let goes_left = {
                let new_value = &node(nodes, new_entry).value;
                comparator.less(new_value, &node(nodes, entry).value)
            };
            let direction = if goes_left {
                Direction::Left
            } else {
                Direction::Right
            };
            let child = node(nodes, entry).child(direction);
            insert(nodes, header, comparator, child, Link::Node(entry), new_entry, direction);

            let is_heap_property_violated = match node(nodes, entry).child(direction) {
                Some(child) => node(nodes, child).priority > node(nodes, entry).priority,
                None => false,
            };
            if is_heap_property_violated {
                rotate(nodes, header, entry, direction.opposite());
            }
            update(nodes, entry);
        },
        None => {
            {
                let new_node = node_mut(nodes, new_entry);
                new_node.len = 1;
                new_node.left = None;
                new_node.right = None;
                new_node.parent = parent;
            }
            match parent {
                Link::Header => {
                    header.root = Some(new_entry);
                    header.leftmost = Link::Node(new_entry);
                    header.rightmost = Link::Node(new_entry);
                },
                Link::Node(parent_entry) => {
                    node_mut(nodes, parent_entry).set_child(direction, Some(new_entry));
                    match direction {
                        Direction::Left if header.leftmost == parent => {
                            header.leftmost = Link::Node(new_entry);
                        },
                        Direction::Right if header.rightmost == parent => {
                            header.rightmost = Link::Node(new_entry);
                        },
                        _ => {},
                    }
                },
            }
        },
    }
}

pub fn successor<T, A>(nodes: &A, header: &Header, link: Link) -> Link
where
    A: Allocator<Node<T>>,
{
    let mut entry = match link {
        Link::Header => return header.leftmost,
        Link::Node(entry) => entry,
    };
    if let Some(right) = node(nodes, entry).right {
        return Link::Node(minimum(nodes, right));
    }

    let mut parent = node(nodes, entry).parent;
    while let Link::Node(parent_entry) = parent {
        let parent_node = node(nodes, parent_entry);
        if parent_node.right != Some(entry) {
            break;
        }
        entry = parent_entry;
        parent = parent_node.parent;
    }
    parent
}

pub fn predecessor<T, A>(nodes: &A, header: &Header, link: Link) -> Link
where
    A: Allocator<Node<T>>,
{
    let mut entry = match link {
        Link::Header => return header.rightmost,
        Link::Node(entry) => entry,
    };
    if let Some(left) = node(nodes, entry).left {
        return Link::Node(maximum(nodes, left));
    }

    let mut parent = node(nodes, entry).parent;
    while let Link::Node(parent_entry) = parent {
        let parent_node = node(nodes, parent_entry);
        if parent_node.left != Some(entry) {
            break;
        }
        entry = parent_entry;
        parent = parent_node.parent;
    }
    parent
}

// Returns the first node for which `is_before` is false, assuming `is_before` is true for a prefix
// of the in-order sequence.
pub fn partition_point<T, A, F>(nodes: &A, mut tree: Option<Entry>, is_before: F) -> Link
where
    A: Allocator<Node<T>>,
    F: Fn(&T) -> bool,
{
    let mut ret = Link::Header;
    while let Some(entry) = tree {
        let curr = node(nodes, entry);
        if is_before(&curr.value) {
            tree = curr.right;
        } else {
            ret = Link::Node(entry);
            tree = curr.left;
        }
    }
    ret
}

pub fn height<T, A>(nodes: &A, tree: Option<Entry>) -> usize
where
    A: Allocator<Node<T>>,
{
    let mut ret = 0;
    let mut stack: Vec<(Entry, usize)> = tree.into_iter().map(|entry| (entry, 1)).collect();
    while let Some((entry, depth)) = stack.pop() {
        ret = ret.max(depth);
        let curr = node(nodes, entry);
        stack.extend(curr.left.map(|left| (left, depth + 1)));
        stack.extend(curr.right.map(|right| (right, depth + 1)));
    }
    ret
}

// Frees every node of `tree`. The right subtree of each node is torn down recursively while the
// left spine is walked in a loop. Returns the number of freed nodes.
pub fn erase<T, A>(nodes: &mut A, mut tree: Option<Entry>) -> usize
where
    A: Allocator<Node<T>>,
{
    let mut freed = 0;
    while let Some(entry) = tree {
        let right = node(nodes, entry).right;
        freed += erase(nodes, right);
        tree = node(nodes, entry).left;
        nodes.free(&entry);
        freed += 1;
    }
    freed
}

// Owns a subtree that is still being copied. Unless disarmed, dropping it frees the subtree, which
// covers both an early return on a refused allocation and unwinding out of a panicking `clone`.
struct PartialClone<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    nodes: &'a mut A,
    top: Option<Entry>,
    _marker: PhantomData<T>,
}

impl<'a, T, A> Drop for PartialClone<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    fn drop(&mut self) {
        if let Some(top) = self.top.take() {
            let freed = erase(&mut *self.nodes, Some(top));
            debug!("tore down {} nodes of an incomplete treap copy", freed);
        }
    }
}

// Owns a node that is allocated but not yet linked. Unless disarmed, dropping it frees the node,
// which covers unwinding out of a panicking comparator during the descent of `insert`.
pub struct UnlinkedNode<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    nodes: &'a mut A,
    entry: Option<Entry>,
    _marker: PhantomData<T>,
}

impl<'a, T, A> UnlinkedNode<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    pub fn new(nodes: &'a mut A, entry: Entry) -> Self {
        UnlinkedNode {
            nodes,
            entry: Some(entry),
            _marker: PhantomData,
        }
    }

    pub fn nodes(&mut self) -> &mut A {
        &mut *self.nodes
    }

    pub fn disarm(mut self) {
        self.entry = None;
    }
}

impl<'a, T, A> Drop for UnlinkedNode<'a, T, A>
where
    A: Allocator<Node<T>>,
{
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.nodes.free(&entry);
            debug!("freed a node whose insertion was interrupted");
        }
    }
}

// Copies the subtree at `entry` from `source` into `target`, keeping every priority so the copy
// has the same shape. A subtree is attached to its parent only once it is complete.
pub fn clone_subtree<T, A, B>(
    source: &A,
    entry: Entry,
    parent: Link,
    target: &mut B,
) -> Result<Entry>
where
    T: Clone,
    A: Allocator<Node<T>>,
    B: Allocator<Node<T>>,
{
    let source_node = node(source, entry);
    let mut top_node = Node::new(source_node.value.clone(), source_node.priority);
    top_node.parent = parent;
    let top = target.allocate(top_node)?;

    let mut guard = PartialClone {
        nodes: target,
        top: Some(top),
        _marker: PhantomData,
    };
    if let Some(left) = source_node.left {
        let left_copy = clone_subtree(source, left, Link::Node(top), &mut *guard.nodes)?;
        node_mut(&mut *guard.nodes, top).left = Some(left_copy);
    }
    if let Some(right) = source_node.right {
        let right_copy = clone_subtree(source, right, Link::Node(top), &mut *guard.nodes)?;
        node_mut(&mut *guard.nodes, top).right = Some(right_copy);
    }
    update(&mut *guard.nodes, top);

    guard.top = None;
    Ok(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{Error, TypedArena};
    use crate::treap::Natural;

    // Inserts values with explicit priorities so the shape of the treap is known.
    fn build(values: &[(u32, u32)]) -> (TypedArena<Node<u32>>, Header) {
        let mut nodes = TypedArena::new(16);
        let mut header = Header::new();
        for &(value, priority) in values {
            let entry = nodes.allocate(Node::new(value, priority)).unwrap();
            let root = header.root;
            insert(&mut nodes, &mut header, &Natural, root, Link::Header, entry, Direction::Left);
        }
        (nodes, header)
    }

    fn value_of(nodes: &TypedArena<Node<u32>>, link: Link) -> Option<u32> {
        link.entry().map(|entry| nodes[entry].value)
    }

    fn in_order(nodes: &TypedArena<Node<u32>>, header: &Header) -> Vec<u32> {
        let mut ret = Vec::new();
        let mut curr = header.leftmost;
        while let Link::Node(entry) = curr {
            ret.push(nodes[entry].value);
            curr = successor(nodes, header, curr);
        }
        ret
    }

    #[test]
    fn test_insert_shape_follows_priorities() {
        let (nodes, header) = build(&[(2, 10), (1, 20), (3, 5)]);
        let root = header.root.unwrap();
        assert_eq!(nodes[root].value, 1);
        assert_eq!(nodes[root].len, 3);
        assert_eq!(nodes[root].parent, Link::Header);

        let right = nodes[root].right.unwrap();
        assert_eq!(nodes[right].value, 2);
        assert_eq!(nodes[right].parent, Link::Node(root));
        assert_eq!(nodes[right].len, 2);
        assert_eq!(value_of(&nodes, header.leftmost), Some(1));
        assert_eq!(value_of(&nodes, header.rightmost), Some(3));
    }

    #[test]
    fn test_insert_duplicates_go_right() {
        let (nodes, header) = build(&[(1, 10), (1, 5)]);
        let root = header.root.unwrap();
        assert_eq!(nodes[root].priority, 10);
        let right = nodes[root].right.unwrap();
        assert_eq!(nodes[right].priority, 5);
        assert_eq!(header.rightmost, Link::Node(right));
    }

    #[test]
    fn test_rotate() {
        let (mut nodes, mut header) = build(&[(2, 30), (1, 20), (3, 10)]);
        let root = header.root.unwrap();
        rotate(&mut nodes, &mut header, root, Direction::Right);

        let new_root = header.root.unwrap();
        assert_eq!(nodes[new_root].value, 1);
        assert_eq!(nodes[new_root].parent, Link::Header);
        assert_eq!(nodes[new_root].len, 3);
        assert_eq!(nodes[new_root].right, Some(root));
        assert_eq!(nodes[root].parent, Link::Node(new_root));
        assert_eq!(nodes[root].len, 2);
        assert_eq!(in_order(&nodes, &header), vec![1, 2, 3]);
    }

    #[test]
    fn test_rotate_without_pivot() {
        let (mut nodes, mut header) = build(&[(2, 30), (3, 10)]);
        let root = header.root.unwrap();
        rotate(&mut nodes, &mut header, root, Direction::Right);
        assert_eq!(header.root, Some(root));
        assert_eq!(nodes[root].len, 2);
    }

    #[test]
    fn test_successor_predecessor() {
        let (nodes, header) = build(&[(4, 50), (2, 40), (6, 30), (1, 20), (3, 10), (5, 0)]);
        assert_eq!(in_order(&nodes, &header), vec![1, 2, 3, 4, 5, 6]);

        let mut reversed = Vec::new();
        let mut curr = predecessor(&nodes, &header, Link::Header);
        while let Link::Node(entry) = curr {
            reversed.push(nodes[entry].value);
            curr = predecessor(&nodes, &header, curr);
        }
        assert_eq!(reversed, vec![6, 5, 4, 3, 2, 1]);
        assert_eq!(successor(&nodes, &header, Link::Header), header.leftmost);
    }

    #[test]
    fn test_partition_point() {
        let (nodes, header) = build(&[(1, 5), (3, 7), (3, 2), (5, 9)]);
        let lower = partition_point(&nodes, header.root, |value| *value < 3);
        let upper = partition_point(&nodes, header.root, |value| *value <= 3);
        assert_eq!(value_of(&nodes, lower), Some(3));
        assert_eq!(value_of(&nodes, upper), Some(5));
        assert_eq!(partition_point(&nodes, header.root, |value| *value < 9), Link::Header);
    }

    #[test]
    fn test_height_of_chain() {
        let (nodes, header) = build(&[(1, 4), (2, 3), (3, 2), (4, 1)]);
        assert_eq!(height(&nodes, header.root), 4);
        assert_eq!(height(&nodes, None), 0);
    }

    #[test]
    fn test_erase() {
        let (mut nodes, header) = build(&[(4, 1), (3, 2), (2, 3), (1, 4), (5, 0)]);
        assert_eq!(erase(&mut nodes, header.root), 5);
        assert!(nodes.is_empty());
        assert_eq!(nodes.allocations(), nodes.deallocations());
    }

    #[test]
    fn test_clone_subtree_preserves_shape() {
        let (nodes, header) = build(&[(4, 50), (2, 40), (6, 30), (1, 20), (3, 10)]);
        let mut target = TypedArena::new(4);
        let root = clone_subtree(&nodes, header.root.unwrap(), Link::Header, &mut target).unwrap();

        let source_root = header.root.unwrap();
        assert_eq!(target[root].value, nodes[source_root].value);
        assert_eq!(target[root].priority, nodes[source_root].priority);
        assert_eq!(target[root].len, 5);
        let left = target[root].left.unwrap();
        assert_eq!(target[left].value, 2);
        assert_eq!(target[left].parent, Link::Node(root));
        assert_eq!(target[left].len, 3);
    }

    #[test]
    fn test_unlinked_node_is_freed_unless_disarmed() {
        let mut nodes: TypedArena<Node<u32>> = TypedArena::new(4);
        let entry = nodes.allocate(Node::new(1, 10)).unwrap();
        drop(UnlinkedNode::new(&mut nodes, entry));
        assert!(nodes.is_empty());
        assert_eq!(nodes.deallocations(), 1);

        let entry = nodes.allocate(Node::new(2, 20)).unwrap();
        UnlinkedNode::new(&mut nodes, entry).disarm();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[entry].value(), &2);
    }

    #[test]
    fn test_clone_subtree_failure_frees_partial_copy() {
        let (nodes, header) = build(&[(4, 50), (2, 40), (6, 30), (1, 20), (3, 10)]);
        let mut target = TypedArena::with_limit(4, 3);
        let ret = clone_subtree(&nodes, header.root.unwrap(), Link::Header, &mut target);
        assert_eq!(ret, Err(Error::CapacityExceeded(3)));
        assert!(target.is_empty());
        assert_eq!(target.allocations(), 3);
        assert_eq!(target.deallocations(), 3);
    }
}
