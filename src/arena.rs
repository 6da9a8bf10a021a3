//! Allocation strategies for fixed-size tree nodes.
//!
//! Every node of a treap is requested from an `Allocator` and addressed through the `Entry`
//! handle it returns. The default strategy is `TypedArena`, a chunked slab that recycles freed
//! blocks through an intrusive free list.

use log::debug;
use std::error;
use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut};
use std::result;
use std::vec::Vec;

/// The default number of objects per chunk of a `TypedArena<T>`.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// A handle to an object stored in an `Allocator`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Entry {
    chunk_index: usize,
    block_index: usize,
}

impl Entry {
    /// Constructs a handle from a chunk index and an index into that chunk. Allocators other than
    /// `TypedArena<T>` that keep a single flat buffer can use a chunk index of `0`.
    pub fn new(chunk_index: usize, block_index: usize) -> Self {
        Entry {
            chunk_index,
            block_index,
        }
    }

    /// Returns the chunk index of the handle.
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    /// Returns the index of the handle inside its chunk.
    pub fn block_index(&self) -> usize {
        self.block_index
    }
}

/// An enum representing the ways an allocation can fail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The allocator already holds its maximum number of live objects.
    CapacityExceeded(usize),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CapacityExceeded(limit) => {
                write!(f, "allocation limit of {} objects exceeded", limit)
            },
        }
    }
}

/// Convenience `Result` type for fallible container operations.
pub type Result<T> = result::Result<T, Error>;

/// A strategy for allocating and freeing objects of a single type.
///
/// Containers request all of their node memory through this trait, so swapping the strategy
/// changes where nodes live and whether moving a container between strategies can reuse the
/// existing storage.
pub trait Allocator<T> {
    /// Stores `value` and returns a handle to it. If the allocation fails, `value` is dropped.
    fn allocate(&mut self, value: T) -> Result<Entry>;

    /// Releases the object behind `entry` and returns it.
    ///
    /// # Panics
    ///
    /// Implementations panic if `entry` does not refer to a live object.
    fn free(&mut self, entry: &Entry) -> T;

    /// Returns an immutable reference to a live object, or `None` for an invalid handle.
    fn get(&self, entry: &Entry) -> Option<&T>;

    /// Returns a mutable reference to a live object, or `None` for an invalid handle.
    fn get_mut(&mut self, entry: &Entry) -> Option<&mut T>;

    /// Returns the number of live objects.
    fn len(&self) -> usize;

    /// Returns `true` if there are no live objects.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a new, empty allocator configured like this one.
    fn spawn(&self) -> Self
    where
        Self: Sized;

    /// Returns `true` if the storage owned by `self` can be adopted by a container that was handed
    /// `other`, making a move between the two constant time.
    fn is_compatible(&self, other: &Self) -> bool
    where
        Self: Sized;
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<Entry>),
}

/// A fast, but limited allocator that only allocates a single type of object.
///
/// Objects are stored in chunks of a fixed size, so growing the arena never moves existing
/// objects. Freed blocks are chained into a free list and handed out again by later allocations.
/// An optional limit caps the number of live objects; allocating beyond it fails with
/// `Error::CapacityExceeded`. The arena also counts every allocation and deallocation over its
/// lifetime.
///
/// # Examples
///
/// ```
/// use treap_collections::arena::{Allocator, TypedArena};
///
/// let mut arena = TypedArena::new(1024);
///
/// let x = arena.allocate(1).unwrap();
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(&x), 2);
/// assert_eq!(arena.allocations(), arena.deallocations());
/// ```
pub struct TypedArena<T> {
    head: Option<Entry>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    limit: Option<usize>,
    size: usize,
    capacity: usize,
    allocations: usize,
    deallocations: usize,
}

impl<T> TypedArena<T> {
    fn is_valid_entry(&self, entry: &Entry) -> bool {
        entry.chunk_index < self.chunks.len()
            && entry.block_index < self.chunks[entry.chunk_index].len()
    }

    /// Constructs a new, empty `TypedArena<T>` with a specific number of objects per chunk.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::arena::TypedArena;
    ///
    /// // creates a new TypedArena<T> that contains a maximum of 1024 u32's per chunk
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size: chunk_size.max(1),
            limit: None,
            size: 0,
            capacity: 0,
            allocations: 0,
            deallocations: 0,
        }
    }

    /// Constructs a new, empty `TypedArena<T>` that holds at most `limit` live objects.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::arena::{Allocator, Error, TypedArena};
    ///
    /// let mut arena = TypedArena::with_limit(16, 1);
    /// assert!(arena.allocate(0).is_ok());
    /// assert_eq!(arena.allocate(1), Err(Error::CapacityExceeded(1)));
    /// ```
    pub fn with_limit(chunk_size: usize, limit: usize) -> Self {
        let mut arena = Self::new(chunk_size);
        arena.limit = Some(limit);
        arena
    }

    /// Returns the number of objects per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the maximum number of live objects, if the arena is limited.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the number of successful allocations over the lifetime of the arena.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Returns the number of deallocations over the lifetime of the arena.
    pub fn deallocations(&self) -> usize {
        self.deallocations
    }
}

impl<T> Allocator<T> for TypedArena<T> {
    /// Allocates an object in the typed arena and returns an Entry. The Entry can later be used to
    /// retrieve mutable and immutable references to the object, and deallocate the object.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::arena::{Allocator, TypedArena};
    ///
    /// let mut arena = TypedArena::new(2);
    /// let x = arena.allocate(0).unwrap();
    /// let y = arena.allocate(1).unwrap();
    /// let z = arena.allocate(2).unwrap();
    /// assert_eq!((x.chunk_index(), x.block_index()), (0, 0));
    /// assert_eq!((y.chunk_index(), y.block_index()), (0, 1));
    /// assert_eq!((z.chunk_index(), z.block_index()), (1, 0));
    /// ```
    fn allocate(&mut self, value: T) -> Result<Entry> {
        if let Some(limit) = self.limit {
            if self.size >= limit {
                debug!("typed arena refused allocation at its limit of {} objects", limit);
                return Err(Error::CapacityExceeded(limit));
            }
        }

        if self.size == self.capacity {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
            self.capacity += self.chunk_size;
        }
        self.size += 1;
        self.allocations += 1;

        match self.head.take() {
            None => {
                let chunk_count = self.chunks.len();
                let last_chunk = &mut self.chunks[chunk_count - 1];
                last_chunk.push(Block::Occupied(value));
                Ok(Entry {
                    chunk_index: chunk_count - 1,
                    block_index: last_chunk.len() - 1,
                })
            },
            Some(entry) => {
                let vacant_block = mem::replace(
                    &mut self.chunks[entry.chunk_index][entry.block_index],
                    Block::Occupied(value),
                );

                match vacant_block {
                    Block::Vacant(next_entry) => {
                        self.head = next_entry;
                        Ok(entry)
                    },
                    Block::Occupied(_) => panic!("Expected a vacant block."),
                }
            },
        }
    }

    /// Deallocates an object in the typed arena and returns the object.
    ///
    /// # Panics
    ///
    /// Panics if entry corresponds to an invalid or vacant value.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::arena::{Allocator, TypedArena};
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0).unwrap();
    /// assert_eq!(arena.free(&x), 0);
    /// ```
    fn free(&mut self, entry: &Entry) -> T {
        if !self.is_valid_entry(entry) {
            panic!("Error: attempting to free invalid block.");
        }
        let block = &mut self.chunks[entry.chunk_index][entry.block_index];
        if let Block::Vacant(_) = block {
            panic!("Error: attempting to free vacant block.");
        }
        match mem::replace(block, Block::Vacant(self.head.take())) {
            Block::Occupied(value) => {
                self.size -= 1;
                self.deallocations += 1;
                self.head = Some(*entry);
                value
            },
            Block::Vacant(_) => unreachable!(),
        }
    }

    /// Returns an immutable reference to an object in the typed arena. Returns `None` if the entry
    /// does not correspond to a valid object.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_collections::arena::{Allocator, TypedArena};
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0).unwrap();
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    fn get(&self, entry: &Entry) -> Option<&T> {
        if !self.is_valid_entry(entry) {
            return None;
        }
        match self.chunks[entry.chunk_index][entry.block_index] {
            Block::Occupied(ref value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    /// Returns a mutable reference to an object in the typed arena. Returns `None` if the entry
    /// does not correspond to a valid object.
    fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        if !self.is_valid_entry(entry) {
            return None;
        }
        match self.chunks[entry.chunk_index][entry.block_index] {
            Block::Occupied(ref mut value) => Some(value),
            Block::Vacant(_) => None,
        }
    }

    fn len(&self) -> usize {
        self.size
    }

    fn spawn(&self) -> Self {
        let mut arena = Self::new(self.chunk_size);
        arena.limit = self.limit;
        arena
    }

    fn is_compatible(&self, other: &Self) -> bool {
        self.chunk_size == other.chunk_size && self.limit == other.limit && other.size == 0
    }
}

impl<T> Default for TypedArena<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl<T> Index<Entry> for TypedArena<T> {
    type Output = T;

    fn index(&self, entry: Entry) -> &Self::Output {
        self.get(&entry).expect("Error: entry out of bounds.")
    }
}

impl<T> IndexMut<Entry> for TypedArena<T> {
    fn index_mut(&mut self, entry: Entry) -> &mut Self::Output {
        self.get_mut(&entry).expect("Error: entry out of bounds.")
    }
}

#[cfg(test)]
mod tests {
    use super::{Allocator, Entry, Error, TypedArena};

    #[test]
    #[should_panic]
    fn test_free_invalid_block() {
        let mut arena: TypedArena<u32> = TypedArena::new(1024);
        arena.free(&Entry::new(0, 0));
    }

    #[test]
    #[should_panic]
    fn test_free_vacant_block() {
        let mut arena = TypedArena::new(1024);
        let entry = arena.allocate(0).unwrap();
        arena.free(&entry);
        arena.free(&entry);
    }

    #[test]
    fn test_allocate_multiple_chunks() {
        let mut arena = TypedArena::new(2);
        assert_eq!(arena.allocate(0), Ok(Entry::new(0, 0)));
        assert_eq!(arena.allocate(0), Ok(Entry::new(0, 1)));
        let entry = arena.allocate(0).unwrap();
        assert_eq!(entry.chunk_index(), 1);
        assert_eq!(entry.block_index(), 0);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_free_reuses_block() {
        let mut arena = TypedArena::new(1024);
        let first = arena.allocate(0).unwrap();
        let second = arena.allocate(1).unwrap();
        assert_eq!(arena.free(&first), 0);
        assert_eq!(arena.free(&second), 1);
        assert_eq!(arena.allocate(2), Ok(second));
        assert_eq!(arena.allocate(3), Ok(first));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_get_vacant_block() {
        let mut arena = TypedArena::new(1024);
        let entry = arena.allocate(0).unwrap();
        arena.free(&entry);
        assert_eq!(arena.get(&entry), None);
        assert_eq!(arena.get(&Entry::new(3, 0)), None);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = TypedArena::new(1024);
        let entry = arena.allocate(0).unwrap();
        *arena.get_mut(&entry).unwrap() = 1;
        assert_eq!(arena.get(&entry), Some(&1));
        assert_eq!(arena.get_mut(&Entry::new(0, 1)), None);
    }

    #[test]
    fn test_limit() {
        let mut arena = TypedArena::with_limit(1, 2);
        let entry = arena.allocate(0).unwrap();
        arena.allocate(1).unwrap();
        assert_eq!(arena.allocate(2), Err(Error::CapacityExceeded(2)));
        assert_eq!(arena.len(), 2);

        arena.free(&entry);
        assert!(arena.allocate(3).is_ok());
    }

    #[test]
    fn test_counters() {
        let mut arena = TypedArena::with_limit(4, 1);
        let entry = arena.allocate(0).unwrap();
        assert!(arena.allocate(1).is_err());
        arena.free(&entry);
        assert_eq!(arena.allocations(), 1);
        assert_eq!(arena.deallocations(), 1);
    }

    #[test]
    fn test_spawn_and_compatibility() {
        let mut arena: TypedArena<u32> = TypedArena::with_limit(8, 100);
        let spawned = arena.spawn();
        assert_eq!(spawned.chunk_size(), 8);
        assert_eq!(spawned.limit(), Some(100));
        assert!(arena.is_compatible(&spawned));

        arena.allocate(0).unwrap();
        assert!(!spawned.is_compatible(&arena));
        assert!(!arena.is_compatible(&TypedArena::new(8)));
    }
}
