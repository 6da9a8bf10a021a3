//! Probabilistic binary search tree where each node also maintains the heap invariant.
//!
//! Nodes live in a pluggable `Allocator` and are addressed by handles. Every node keeps a link to
//! its parent so the containers can hand out bidirectional cursors, and a header caches the root
//! together with the minimum and maximum nodes.

mod map;
mod node;
mod set;
mod tree;

pub use self::map::{TreapMultimap, TreapMultimapIntoIter, TreapMultimapIter};
pub use self::node::{Node, MAX_PRIORITY};
pub use self::set::{Cursor, IntoIter, Iter, Range, Structure, TreapMultiset};

/// A strict weak ordering used to place elements in a treap.
///
/// Any `Fn(&T, &T) -> bool` closure that returns `true` when its first argument goes before its
/// second argument is a comparator.
///
/// # Examples
///
/// ```
/// use treap_collections::treap::TreapMultiset;
///
/// let mut set = TreapMultiset::with_comparator(|lhs: &u32, rhs: &u32| lhs > rhs);
/// set.extend(vec![1, 3, 2]);
/// assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&3, &2, &1]);
/// ```
pub trait Comparator<T: ?Sized> {
    /// Returns `true` if `lhs` goes strictly before `rhs`.
    fn less(&self, lhs: &T, rhs: &T) -> bool;
}

/// A comparator that uses the `Ord` implementation of the element type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Natural;

impl<T> Comparator<T> for Natural
where
    T: Ord + ?Sized,
{
    fn less(&self, lhs: &T, rhs: &T) -> bool {
        lhs < rhs
    }
}

impl<T, F> Comparator<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> bool,
{
    fn less(&self, lhs: &T, rhs: &T) -> bool {
        self(lhs, rhs)
    }
}
