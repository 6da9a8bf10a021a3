//! # treap-collections
//!
//! Ordered multiset and multimap collections backed by a treap, a binary search tree that keeps
//! itself balanced in expectation by maintaining a heap over random per-node priorities.
//!
//! Nodes are stored in a pluggable `Allocator`, a chunked slab arena by default, and addressed by
//! handles. Each node keeps a link to its parent, which gives the collections bidirectional
//! cursors and iterators, and the collections cache their minimum and maximum values.
//!
//! # Examples
//!
//! ```
//! use treap_collections::treap::TreapMultiset;
//!
//! let mut set = TreapMultiset::new();
//! for value in vec![5, 3, 8, 1, 4] {
//!     set.insert(value).unwrap();
//! }
//!
//! assert_eq!(set.len(), 5);
//! assert_eq!(set.iter().cloned().collect::<Vec<u32>>(), vec![1, 3, 4, 5, 8]);
//! ```

pub mod arena;
pub mod entry;
pub mod treap;

pub use crate::treap::{Comparator, Natural, TreapMultimap, TreapMultiset};
