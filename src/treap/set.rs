use crate::arena::{Allocator, Entry, Result, TypedArena};
use crate::treap::node::{Direction, Header, Link, Node, MAX_PRIORITY};
use crate::treap::tree;
use crate::treap::{Comparator, Natural};
use log::{debug, trace};
use rand::{Rng, SeedableRng, StdRng, XorShiftRng};
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::ptr;

fn seeded_rng(seed: u64) -> XorShiftRng {
    let seed = [seed as usize, (seed >> 32) as usize];
    let mut seeder: StdRng = SeedableRng::from_seed(&seed[..]);
    seeder.gen()
}

/// An ordered multiset implemented by a treap.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property. Each
/// node has a value and a randomly generated priority, and the priority of a node is never
/// exceeded by the priorities of its children. By randomly generating priorities, the expected
/// height of the tree is proportional to the logarithm of the number of values, without any
/// rebalancing bookkeeping.
///
/// Values are placed with a `Comparator`, and equal values are all kept: a new value is placed
/// after the values that compare equal to it. Nodes are requested from an `Allocator`, a
/// `TypedArena` by default. Each multiset draws priorities from its own random number generator,
/// which can be seeded for reproducible shapes.
///
/// # Examples
///
/// ```
/// use treap_collections::treap::TreapMultiset;
///
/// let mut set = TreapMultiset::new();
/// set.insert(5).unwrap();
/// set.insert(3).unwrap();
/// set.insert(5).unwrap();
///
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.min(), Some(&3));
/// assert_eq!(set.count(&5), 2);
/// assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&3, &5, &5]);
///
/// let mut cursor = set.end();
/// cursor.move_prev();
/// assert_eq!(cursor.get(), Some(&5));
/// ```
pub struct TreapMultiset<T, C = Natural, A = TypedArena<Node<T>>>
where
    A: Allocator<Node<T>>,
{
    nodes: A,
    header: Header,
    comparator: C,
    rng: XorShiftRng,
    _marker: PhantomData<T>,
}

impl<T> TreapMultiset<T>
where
    T: Ord,
{
    /// Constructs a new, empty `TreapMultiset<T>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let set: TreapMultiset<u32> = TreapMultiset::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_comparator_and_allocator(Natural, TypedArena::default())
    }

    /// Constructs a new, empty `TreapMultiset<T>` whose priorities are generated from `seed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::with_seed(7);
    /// set.insert(1).unwrap();
    /// ```
    pub fn with_seed(seed: u64) -> Self {
        let mut set = Self::new();
        set.reseed(seed);
        set
    }
}

impl<T, C> TreapMultiset<T, C>
where
    C: Comparator<T>,
{
    /// Constructs a new, empty `TreapMultiset<T, C>` that orders values with `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_comparator_and_allocator(comparator, TypedArena::default())
    }
}

impl<T, A> TreapMultiset<T, Natural, A>
where
    T: Ord,
    A: Allocator<Node<T>>,
{
    /// Constructs a new, empty `TreapMultiset<T, Natural, A>` that requests its nodes from
    /// `allocator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::arena::TypedArena;
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::with_allocator(TypedArena::with_limit(16, 1));
    /// assert!(set.insert(1).is_ok());
    /// assert!(set.insert(2).is_err());
    /// ```
    pub fn with_allocator(allocator: A) -> Self {
        Self::with_comparator_and_allocator(Natural, allocator)
    }
}

impl<T, C, A> TreapMultiset<T, C, A>
where
    A: Allocator<Node<T>>,
{
    /// Constructs a new, empty `TreapMultiset<T, C, A>` from a comparator and an empty allocator.
    pub fn with_comparator_and_allocator(comparator: C, allocator: A) -> Self {
        TreapMultiset {
            nodes: allocator,
            header: Header::new(),
            comparator,
            rng: rand::weak_rng(),
            _marker: PhantomData,
        }
    }

    /// Replaces the random number generator of the multiset with one seeded from `seed`. Values
    /// inserted afterwards draw their priorities from the new generator.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = seeded_rng(seed);
    }

    /// Returns the number of values in the multiset.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// set.insert(1).unwrap();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn len(&self) -> usize {
        tree::len(&self.nodes, self.header.root)
    }

    /// Returns `true` if the multiset is empty.
    pub fn is_empty(&self) -> bool {
        self.header.root.is_none()
    }

    /// Clears the multiset, freeing every node.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// set.insert(1).unwrap();
    /// set.clear();
    /// assert!(set.is_empty());
    /// assert_eq!(set.begin(), set.end());
    /// ```
    pub fn clear(&mut self) {
        let freed = tree::erase(&mut self.nodes, self.header.root.take());
        self.header.reset();
        trace!("cleared {} nodes from treap", freed);
    }

    /// Returns a cursor at the minimum value, or at the end if the multiset is empty.
    pub fn begin(&self) -> Cursor<'_, T, C, A> {
        Cursor {
            set: self,
            link: self.header.leftmost,
        }
    }

    /// Returns a cursor past the maximum value.
    pub fn end(&self) -> Cursor<'_, T, C, A> {
        Cursor {
            set: self,
            link: Link::Header,
        }
    }

    /// Returns the minimum value of the multiset. Returns `None` if the multiset is empty.
    pub fn min(&self) -> Option<&T> {
        self.header
            .leftmost
            .entry()
            .map(|entry| &tree::node(&self.nodes, entry).value)
    }

    /// Returns the maximum value of the multiset. Returns `None` if the multiset is empty.
    pub fn max(&self) -> Option<&T> {
        self.header
            .rightmost
            .entry()
            .map(|entry| &tree::node(&self.nodes, entry).value)
    }

    /// Returns the number of levels of the underlying tree.
    pub fn height(&self) -> usize {
        tree::height(&self.nodes, self.header.root)
    }

    /// Returns the allocator that holds the nodes of the multiset.
    pub fn allocator(&self) -> &A {
        &self.nodes
    }

    /// Returns an iterator over the multiset. The iterator yields values in order and can also be
    /// consumed from the back.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// set.insert(3).unwrap();
    /// set.insert(1).unwrap();
    ///
    /// let mut iterator = set.iter();
    /// assert_eq!(iterator.next(), Some(&1));
    /// assert_eq!(iterator.next_back(), Some(&3));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, T, C, A> {
        Iter {
            set: self,
            front: self.header.leftmost,
            back: self.header.rightmost,
            len: self.len(),
        }
    }

    /// Returns a printable dump of the tree: the header followed by every node in pre-order,
    /// indented by depth, with its priority and subtree size.
    pub fn structure(&self) -> Structure<'_, T, C, A> {
        Structure { set: self }
    }

    pub(crate) fn range_by<F, G>(&self, is_before_start: F, is_before_end: G) -> Range<'_, T, C, A>
    where
        F: Fn(&T) -> bool,
        G: Fn(&T) -> bool,
    {
        Range {
            set: self,
            front: tree::partition_point(&self.nodes, self.header.root, is_before_start),
            end: tree::partition_point(&self.nodes, self.header.root, is_before_end),
        }
    }
}

impl<T, C, A> TreapMultiset<T, C, A>
where
    C: Comparator<T>,
    A: Allocator<Node<T>>,
{
    /// Inserts a value into the multiset and returns a cursor to it. Values that compare equal to
    /// an existing value are kept and placed after it. Returns an error if the allocator cannot
    /// provide a node; the multiset is unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// let cursor = set.insert(1).unwrap();
    /// assert_eq!(cursor.get(), Some(&1));
    /// ```
    pub fn insert(&mut self, value: T) -> Result<Cursor<'_, T, C, A>> {
        let priority = self.rng.gen_range(0, MAX_PRIORITY);
        let entry = self.nodes.allocate(Node::new(value, priority))?;
        {
            let TreapMultiset {
                ref mut nodes,
                ref mut header,
                ref comparator,
                ..
            } = *self;
            let root = header.root;
            let mut unlinked = tree::UnlinkedNode::new(nodes, entry);
            tree::insert(
                unlinked.nodes(),
                header,
                comparator,
                root,
                Link::Header,
                entry,
                Direction::Left,
            );
            unlinked.disarm();
        }
        Ok(Cursor {
            set: self,
            link: Link::Node(entry),
        })
    }

    /// Returns a cursor at the first value that does not go before `value`, or at the end if
    /// there is no such value.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// set.insert(1).unwrap();
    /// set.insert(3).unwrap();
    /// assert_eq!(set.lower_bound(&2).get(), Some(&3));
    /// assert_eq!(set.lower_bound(&3).get(), Some(&3));
    /// assert_eq!(set.lower_bound(&4), set.end());
    /// ```
    pub fn lower_bound(&self, value: &T) -> Cursor<'_, T, C, A> {
        let comparator = &self.comparator;
        Cursor {
            set: self,
            link: tree::partition_point(&self.nodes, self.header.root, |curr| {
                comparator.less(curr, value)
            }),
        }
    }

    /// Returns a cursor at the first value that goes after `value`, or at the end if there is no
    /// such value.
    pub fn upper_bound(&self, value: &T) -> Cursor<'_, T, C, A> {
        let comparator = &self.comparator;
        Cursor {
            set: self,
            link: tree::partition_point(&self.nodes, self.header.root, |curr| {
                !comparator.less(value, curr)
            }),
        }
    }

    /// Returns a cursor at the first value equal to `value`. Returns `None` if there is no such
    /// value.
    pub fn find(&self, value: &T) -> Option<Cursor<'_, T, C, A>> {
        let cursor = self.lower_bound(value);
        match cursor.get() {
            Some(curr) if !self.comparator.less(value, curr) => Some(cursor),
            _ => None,
        }
    }

    /// Checks if a value equal to `value` exists in the multiset.
    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Returns an iterator over the values equal to `value`, in insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// set.extend(vec![2, 1, 2, 3]);
    /// assert_eq!(set.equal_range(&2).collect::<Vec<&u32>>(), vec![&2, &2]);
    /// ```
    pub fn equal_range(&self, value: &T) -> Range<'_, T, C, A> {
        let comparator = &self.comparator;
        self.range_by(
            |curr| comparator.less(curr, value),
            |curr| !comparator.less(value, curr),
        )
    }

    /// Returns the number of values equal to `value`.
    pub fn count(&self, value: &T) -> usize {
        self.equal_range(value).count()
    }
}

impl<T, C, A> TreapMultiset<T, C, A>
where
    C: Clone,
    A: Allocator<Node<T>>,
{
    /// Moves the contents of the multiset into a new multiset in constant time. The multiset is
    /// left empty with a fresh allocator configured like the old one.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// set.insert(1).unwrap();
    ///
    /// let moved = set.take();
    /// assert!(set.is_empty());
    /// assert_eq!(moved.iter().collect::<Vec<&u32>>(), vec![&1]);
    /// ```
    pub fn take(&mut self) -> Self {
        let nodes = self.nodes.spawn();
        TreapMultiset {
            nodes: mem::replace(&mut self.nodes, nodes),
            header: mem::replace(&mut self.header, Header::new()),
            comparator: self.comparator.clone(),
            rng: self.rng.clone(),
            _marker: PhantomData,
        }
    }

    /// Moves the contents of `source` into a new multiset that uses `allocator`. If the storage of
    /// `source` is compatible with `allocator`, the nodes are handed over in constant time.
    /// Otherwise every value is copied into `allocator` and `source` is cleared. On error,
    /// `source` is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::arena::TypedArena;
    /// use treap_collections::treap::TreapMultiset;
    ///
    /// let mut set = TreapMultiset::new();
    /// set.insert(1).unwrap();
    ///
    /// let moved = TreapMultiset::move_in(&mut set, TypedArena::new(8)).unwrap();
    /// assert!(set.is_empty());
    /// assert_eq!(moved.len(), 1);
    /// ```
    pub fn move_in(source: &mut Self, allocator: A) -> Result<Self>
    where
        T: Clone,
    {
        if source.nodes.is_compatible(&allocator) {
            return Ok(TreapMultiset {
                nodes: mem::replace(&mut source.nodes, allocator),
                header: mem::replace(&mut source.header, Header::new()),
                comparator: source.comparator.clone(),
                rng: source.rng.clone(),
                _marker: PhantomData,
            });
        }

        debug!(
            "allocators are incompatible, copying {} values instead of moving them",
            source.len(),
        );
        let ret = source.try_clone_in(allocator)?;
        source.clear();
        Ok(ret)
    }

    /// Returns a copy of the multiset whose nodes live in a fresh allocator configured like the
    /// current one. The copy has the same shape as the multiset. Returns an error if the new
    /// allocator cannot provide enough nodes; everything copied so far is freed in that case.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
    {
        self.try_clone_in(self.nodes.spawn())
    }

    /// Returns a copy of the multiset whose nodes live in `allocator`.
    pub fn try_clone_in<B>(&self, allocator: B) -> Result<TreapMultiset<T, C, B>>
    where
        T: Clone,
        B: Allocator<Node<T>>,
    {
        let mut ret = TreapMultiset {
            nodes: allocator,
            header: Header::new(),
            comparator: self.comparator.clone(),
            rng: self.rng.clone(),
            _marker: PhantomData,
        };
        if let Some(root) = self.header.root {
            let root = tree::clone_subtree(&self.nodes, root, Link::Header, &mut ret.nodes)?;
            ret.header.root = Some(root);
            ret.header.leftmost = Link::Node(tree::minimum(&ret.nodes, root));
            ret.header.rightmost = Link::Node(tree::maximum(&ret.nodes, root));
        }
        Ok(ret)
    }
}

impl<T, C, A> Drop for TreapMultiset<T, C, A>
where
    A: Allocator<Node<T>>,
{
    fn drop(&mut self) {
        tree::erase(&mut self.nodes, self.header.root.take());
    }
}

impl<T, C, A> Clone for TreapMultiset<T, C, A>
where
    T: Clone,
    C: Clone,
    A: Allocator<Node<T>>,
{
    /// # Panics
    ///
    /// Panics if the allocator cannot provide enough nodes. Use `try_clone` to handle the error.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(set) => set,
            Err(error) => panic!("Error: failed to clone treap: {}", error),
        }
    }
}

impl<T> Default for TreapMultiset<T>
where
    T: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C, A> fmt::Debug for TreapMultiset<T, C, A>
where
    T: fmt::Debug,
    A: Allocator<Node<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C, A> PartialEq for TreapMultiset<T, C, A>
where
    T: PartialEq,
    A: Allocator<Node<T>>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, C, A> Eq for TreapMultiset<T, C, A>
where
    T: Eq,
    A: Allocator<Node<T>>,
{
}

impl<T, C, A> Extend<T> for TreapMultiset<T, C, A>
where
    C: Comparator<T>,
    A: Allocator<Node<T>>,
{
    /// # Panics
    ///
    /// Panics if the allocator cannot provide a node.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(error) = self.insert(value) {
                panic!("Error: failed to insert into treap: {}", error);
            }
        }
    }
}

impl<T> FromIterator<T> for TreapMultiset<T>
where
    T: Ord,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, C, A> IntoIterator for TreapMultiset<T, C, A>
where
    A: Allocator<Node<T>>,
{
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(mut self) -> Self::IntoIter {
        let len = self.len();
        let current = self.header.root.take();
        self.header.reset();
        let nodes = self.nodes.spawn();
        IntoIter {
            nodes: mem::replace(&mut self.nodes, nodes),
            current,
            stack: Vec::new(),
            len,
            _marker: PhantomData,
        }
    }
}

impl<'a, T, C, A> IntoIterator for &'a TreapMultiset<T, C, A>
where
    A: Allocator<Node<T>>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A bidirectional position in a `TreapMultiset<T, C, A>`.
///
/// A cursor either points at a value or at the end of the multiset. Moving forward from the
/// maximum reaches the end, and moving forward from the end wraps around to the minimum; moving
/// backward mirrors this, so iterating backward can start at `end()`. Two cursors are equal if they
/// point at the same node of the same multiset.
pub struct Cursor<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    set: &'a TreapMultiset<T, C, A>,
    link: Link,
}

impl<'a, T, C, A> Cursor<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    /// Returns the value at the cursor, or `None` at the end.
    pub fn get(&self) -> Option<&'a T> {
        let set = self.set;
        self.link
            .entry()
            .map(|entry| &tree::node(&set.nodes, entry).value)
    }

    /// Returns `true` if the cursor is past the maximum value.
    pub fn is_end(&self) -> bool {
        self.link == Link::Header
    }

    /// Moves the cursor to the next value in order.
    pub fn move_next(&mut self) {
        self.link = tree::successor(&self.set.nodes, &self.set.header, self.link);
    }

    /// Moves the cursor to the previous value in order.
    pub fn move_prev(&mut self) {
        self.link = tree::predecessor(&self.set.nodes, &self.set.header, self.link);
    }
}

impl<'a, T, C, A> Clone for Cursor<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T, C, A> Copy for Cursor<'a, T, C, A> where A: Allocator<Node<T>> {}

impl<'a, T, C, A> PartialEq for Cursor<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.set, other.set) && self.link == other.link
    }
}

impl<'a, T, C, A> Eq for Cursor<'a, T, C, A> where A: Allocator<Node<T>> {}

impl<'a, T, C, A> fmt::Debug for Cursor<'a, T, C, A>
where
    T: fmt::Debug,
    A: Allocator<Node<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// An iterator for `TreapMultiset<T, C, A>`
///
/// This iterator traverses the values of a treap in-order and yields immutable references.
pub struct Iter<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    set: &'a TreapMultiset<T, C, A>,
    front: Link,
    back: Link,
    len: usize,
}

impl<'a, T, C, A> Iterator for Iter<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let set = self.set;
        let entry = self.front.entry()?;
        self.front = tree::successor(&set.nodes, &set.header, self.front);
        self.len -= 1;
        Some(&tree::node(&set.nodes, entry).value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T, C, A> DoubleEndedIterator for Iter<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let set = self.set;
        let entry = self.back.entry()?;
        self.back = tree::predecessor(&set.nodes, &set.header, self.back);
        self.len -= 1;
        Some(&tree::node(&set.nodes, entry).value)
    }
}

impl<'a, T, C, A> ExactSizeIterator for Iter<'a, T, C, A> where A: Allocator<Node<T>> {}

/// An iterator over a contiguous run of values of a `TreapMultiset<T, C, A>`.
pub struct Range<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    set: &'a TreapMultiset<T, C, A>,
    front: Link,
    end: Link,
}

impl<'a, T, C, A> Iterator for Range<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.end {
            return None;
        }
        let set = self.set;
        let entry = self.front.entry()?;
        self.front = tree::successor(&set.nodes, &set.header, self.front);
        Some(&tree::node(&set.nodes, entry).value)
    }
}

/// An owning iterator for `TreapMultiset<T, C, A>`
///
/// This iterator traverses the values of a treap in-order, freeing each node as its value is
/// yielded. Values that are not consumed are dropped with the iterator.
pub struct IntoIter<T, A>
where
    A: Allocator<Node<T>>,
{
    nodes: A,
    current: Option<Entry>,
    stack: Vec<Entry>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T, A> Iterator for IntoIter<T, A>
where
    A: Allocator<Node<T>>,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.current {
            self.current = tree::node(&self.nodes, entry).left;
            self.stack.push(entry);
        }
        let entry = self.stack.pop()?;
        self.current = tree::node(&self.nodes, entry).right;
        self.len -= 1;
        Some(self.nodes.free(&entry).value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<T, A> ExactSizeIterator for IntoIter<T, A> where A: Allocator<Node<T>> {}

impl<T, A> Drop for IntoIter<T, A>
where
    A: Allocator<Node<T>>,
{
    fn drop(&mut self) {
        tree::erase(&mut self.nodes, self.current.take());
        // the left subtrees of stacked nodes have already been consumed
        while let Some(entry) = self.stack.pop() {
            let right = tree::node(&self.nodes, entry).right;
            tree::erase(&mut self.nodes, right);
            self.nodes.free(&entry);
        }
    }
}

/// A printable dump of the tree behind a `TreapMultiset<T, C, A>`.
pub struct Structure<'a, T, C, A>
where
    A: Allocator<Node<T>>,
{
    set: &'a TreapMultiset<T, C, A>,
}

impl<'a, T, C, A> fmt::Display for Structure<'a, T, C, A>
where
    T: fmt::Debug,
    A: Allocator<Node<T>>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let TreapMultiset {
            ref nodes,
            ref header,
            ..
        } = *self.set;
        writeln!(
            f,
            "header priority={} root={:?} leftmost={:?} rightmost={:?}",
            header.priority(),
            header.root,
            header.leftmost,
            header.rightmost,
        )?;

        let mut stack: Vec<(Entry, usize)> = header.root.into_iter().map(|root| (root, 0)).collect();
        while let Some((entry, depth)) = stack.pop() {
            let curr = tree::node(nodes, entry);
            writeln!(
                f,
                "{:indent$}{:?} priority={} size={}",
                "",
                curr.value(),
                curr.priority(),
                curr.len(),
                indent = depth * 2,
            )?;
            stack.extend(curr.right.map(|right| (right, depth + 1)));
            stack.extend(curr.left.map(|left| (left, depth + 1)));
        }
        Ok(())
    }
}
