use crate::arena::{Allocator, Result, TypedArena};
use crate::entry::Entry;
use crate::treap::node::Node;
use crate::treap::set::{IntoIter, Iter, TreapMultiset};
use crate::treap::Natural;
use std::fmt;

/// An ordered multimap implemented by a treap.
///
/// The multimap stores key-value pairs in a `TreapMultiset` that orders them by key alone. A key
/// can be inserted any number of times and the values of a key are kept in insertion order.
///
/// # Examples
///
/// ```
/// use treap_collections::treap::TreapMultimap;
///
/// let mut map = TreapMultimap::new();
/// map.insert(1, "a").unwrap();
/// map.insert(0, "b").unwrap();
/// map.insert(1, "c").unwrap();
///
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.get(&1), Some(&"a"));
/// assert_eq!(map.get_all(&1).collect::<Vec<&&str>>(), vec![&"a", &"c"]);
/// assert_eq!(map.get(&2), None);
/// assert_eq!(map.min(), Some(&0));
/// ```
pub struct TreapMultimap<K, V, A = TypedArena<Node<Entry<K, V>>>>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    set: TreapMultiset<Entry<K, V>, Natural, A>,
}

impl<K, V> TreapMultimap<K, V>
where
    K: Ord,
{
    /// Constructs a new, empty `TreapMultimap<K, V>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultimap;
    ///
    /// let map: TreapMultimap<u32, u32> = TreapMultimap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        TreapMultimap {
            set: TreapMultiset::new(),
        }
    }

    /// Constructs a new, empty `TreapMultimap<K, V>` whose priorities are generated from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        TreapMultimap {
            set: TreapMultiset::with_seed(seed),
        }
    }
}

impl<K, V, A> TreapMultimap<K, V, A>
where
    K: Ord,
    A: Allocator<Node<Entry<K, V>>>,
{
    /// Constructs a new, empty `TreapMultimap<K, V, A>` that requests its nodes from `allocator`.
    pub fn with_allocator(allocator: A) -> Self {
        TreapMultimap {
            set: TreapMultiset::with_allocator(allocator),
        }
    }

    /// Inserts a key-value pair into the map. A key that already exists gets another value, placed
    /// after its existing values. Returns an error if the allocator cannot provide a node.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultimap;
    ///
    /// let mut map = TreapMultimap::new();
    /// map.insert(1, 1).unwrap();
    /// map.insert(1, 2).unwrap();
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.set.insert(Entry { key, value })?;
        Ok(())
    }

    /// Checks if a key exists in the map.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns an immutable reference to the first value inserted for a particular key. Returns
    /// `None` if the key does not exist in the map.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_all(key).next()
    }

    /// Returns an iterator over every value of a particular key, in insertion order.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultimap;
    ///
    /// let mut map = TreapMultimap::new();
    /// map.insert(2, 'x').unwrap();
    /// map.insert(1, 'y').unwrap();
    /// map.insert(2, 'z').unwrap();
    /// assert_eq!(map.get_all(&2).cloned().collect::<String>(), "xz");
    /// ```
    pub fn get_all(&self, key: &K) -> impl Iterator<Item = &V> {
        self.set
            .range_by(|entry| entry.key < *key, |entry| entry.key <= *key)
            .map(|entry| &entry.value)
    }
}

impl<K, V, A> TreapMultimap<K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    /// Returns the number of key-value pairs in the map.
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Clears the map, removing all key-value pairs.
    pub fn clear(&mut self) {
        self.set.clear();
    }

    /// Returns the minimum key of the map. Returns `None` if the map is empty.
    pub fn min(&self) -> Option<&K> {
        self.set.min().map(|entry| &entry.key)
    }

    /// Returns the maximum key of the map. Returns `None` if the map is empty.
    pub fn max(&self) -> Option<&K> {
        self.set.max().map(|entry| &entry.key)
    }

    /// Returns an iterator over the map. The iterator will yield key-value pairs in order of their
    /// keys, and in insertion order among equal keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::treap::TreapMultimap;
    ///
    /// let mut map = TreapMultimap::new();
    /// map.insert(1, 1).unwrap();
    /// map.insert(0, 2).unwrap();
    ///
    /// let mut iterator = map.iter();
    /// assert_eq!(iterator.next(), Some((&0, &2)));
    /// assert_eq!(iterator.next(), Some((&1, &1)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> TreapMultimapIter<'_, K, V, A> {
        TreapMultimapIter {
            inner: self.set.iter(),
        }
    }

    /// Returns a copy of the map whose nodes live in a fresh allocator configured like the current
    /// one.
    pub fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
    {
        Ok(TreapMultimap {
            set: self.set.try_clone()?,
        })
    }
}

impl<K, V> Default for TreapMultimap<K, V>
where
    K: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A> Clone for TreapMultimap<K, V, A>
where
    K: Clone,
    V: Clone,
    A: Allocator<Node<Entry<K, V>>>,
{
    fn clone(&self) -> Self {
        TreapMultimap {
            set: self.set.clone(),
        }
    }
}

impl<K, V, A> fmt::Debug for TreapMultimap<K, V, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: Allocator<Node<Entry<K, V>>>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, A> IntoIterator for TreapMultimap<K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    type Item = (K, V);
    type IntoIter = TreapMultimapIntoIter<K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        TreapMultimapIntoIter {
            inner: self.set.into_iter(),
        }
    }
}

impl<'a, K, V, A> IntoIterator for &'a TreapMultimap<K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = TreapMultimapIter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `TreapMultimap<K, V, A>`.
///
/// This iterator traverses the elements of the map in-order and yields owned entries.
pub struct TreapMultimapIntoIter<K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    inner: IntoIter<Entry<K, V>, A>,
}

impl<K, V, A> Iterator for TreapMultimapIntoIter<K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|Entry { key, value }| (key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator for `TreapMultimap<K, V, A>`.
///
/// This iterator traverses the elements of the map in-order and yields immutable references.
pub struct TreapMultimapIter<'a, K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    inner: Iter<'a, Entry<K, V>, Natural, A>,
}

impl<'a, K, V, A> Iterator for TreapMultimapIter<'a, K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, A> DoubleEndedIterator for TreapMultimapIter<'a, K, V, A>
where
    A: Allocator<Node<Entry<K, V>>>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| (&entry.key, &entry.value))
    }
}
