use std::cell::Cell;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use treap_collections::arena::{Allocator, Entry, Result, TypedArena};
use treap_collections::treap::TreapMultiset;

#[derive(Default)]
struct Counters {
    allocated: Cell<usize>,
    freed: Cell<usize>,
}

impl Counters {
    fn live(&self) -> usize {
        self.allocated.get() - self.freed.get()
    }
}

// Forwards to a `TypedArena` and records every allocation and free in counters that are shared
// with all spawned allocators.
struct CountingAllocator<T> {
    inner: TypedArena<T>,
    counters: Rc<Counters>,
}

impl<T> CountingAllocator<T> {
    fn new(counters: &Rc<Counters>) -> Self {
        CountingAllocator {
            inner: TypedArena::new(8),
            counters: Rc::clone(counters),
        }
    }
}

impl<T> Allocator<T> for CountingAllocator<T> {
    fn allocate(&mut self, value: T) -> Result<Entry> {
        let entry = self.inner.allocate(value)?;
        self.counters.allocated.set(self.counters.allocated.get() + 1);
        Ok(entry)
    }

    fn free(&mut self, entry: &Entry) -> T {
        self.counters.freed.set(self.counters.freed.get() + 1);
        self.inner.free(entry)
    }

    fn get(&self, entry: &Entry) -> Option<&T> {
        self.inner.get(entry)
    }

    fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        self.inner.get_mut(entry)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn spawn(&self) -> Self {
        CountingAllocator {
            inner: self.inner.spawn(),
            counters: Rc::clone(&self.counters),
        }
    }

    fn is_compatible(&self, other: &Self) -> bool {
        self.inner.is_compatible(&other.inner)
    }
}

// Panics once the shared fuse has been cloned down to zero.
struct Fused {
    value: u32,
    fuse: Rc<Cell<usize>>,
}

impl Clone for Fused {
    fn clone(&self) -> Self {
        let remaining = self.fuse.get();
        if remaining == 0 {
            panic!("fuse burned out");
        }
        self.fuse.set(remaining - 1);
        Fused {
            value: self.value,
            fuse: Rc::clone(&self.fuse),
        }
    }
}

impl PartialEq for Fused {
    fn eq(&self, other: &Fused) -> bool {
        self.value == other.value
    }
}

impl Eq for Fused {}

impl PartialOrd for Fused {
    fn partial_cmp(&self, other: &Fused) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fused {
    fn cmp(&self, other: &Fused) -> Ordering {
        self.value.cmp(&other.value)
    }
}

#[test]
fn int_test_clone_and_drop_free_every_node() {
    let counters = Rc::new(Counters::default());
    let mut set = TreapMultiset::with_allocator(CountingAllocator::new(&counters));
    set.reseed(4);
    set.extend(0..100u32);
    assert_eq!(counters.allocated.get(), 100);

    let copy = set.clone();
    assert_eq!(counters.allocated.get(), 200);
    assert_eq!(copy.len(), 100);
    assert_eq!(copy, set);

    drop(copy);
    assert_eq!(counters.freed.get(), 100);
    assert_eq!(counters.live(), 100);
    assert_eq!(set.len(), 100);
    assert_eq!(set.allocator().len(), 100);
    assert_eq!(set.iter().cloned().collect::<Vec<u32>>(), (0..100).collect::<Vec<u32>>());

    drop(set);
    assert_eq!(counters.allocated.get(), 200);
    assert_eq!(counters.freed.get(), 200);
}

#[test]
fn int_test_panicking_comparator_frees_new_node() {
    let counters = Rc::new(Counters::default());
    let armed = Rc::new(Cell::new(false));
    let comparator = {
        let armed = Rc::clone(&armed);
        move |lhs: &u32, rhs: &u32| {
            if armed.get() {
                panic!("comparator failed");
            }
            lhs < rhs
        }
    };
    let mut set = TreapMultiset::with_comparator_and_allocator(
        comparator,
        CountingAllocator::new(&counters),
    );
    set.extend(0..10u32);

    armed.set(true);
    let ret = panic::catch_unwind(AssertUnwindSafe(|| set.insert(99).is_ok()));
    assert!(ret.is_err());
    assert_eq!(counters.allocated.get(), 11);
    assert_eq!(counters.live(), 10);
    assert_eq!(set.len(), 10);
    assert_eq!(set.allocator().len(), 10);

    armed.set(false);
    assert_eq!(set.iter().cloned().collect::<Vec<u32>>(), (0..10).collect::<Vec<u32>>());
    set.clear();
    assert_eq!(counters.live(), 0);
    assert_eq!(counters.allocated.get(), counters.freed.get());
}

#[test]
fn int_test_clear_frees_every_node() {
    let counters = Rc::new(Counters::default());
    let mut set = TreapMultiset::with_allocator(CountingAllocator::new(&counters));
    set.extend(vec![3u32, 1, 2, 3]);
    set.clear();
    assert_eq!(counters.live(), 0);
    assert!(set.allocator().is_empty());
}

#[test]
fn int_test_partial_into_iter_frees_every_node() {
    let counters = Rc::new(Counters::default());
    let mut set = TreapMultiset::with_allocator(CountingAllocator::new(&counters));
    set.extend(0..64u32);
    {
        let mut iter = set.into_iter();
        assert_eq!(iter.next(), Some(0));
        assert_eq!(iter.next(), Some(1));
        assert_eq!(counters.freed.get(), 2);
    }
    assert_eq!(counters.allocated.get(), 64);
    assert_eq!(counters.live(), 0);
}

#[test]
fn int_test_take_is_constant_time() {
    let counters = Rc::new(Counters::default());
    let mut set = TreapMultiset::with_allocator(CountingAllocator::new(&counters));
    set.extend(0..32u32);
    let moved = set.take();
    assert_eq!(counters.allocated.get(), 32);
    assert_eq!(counters.freed.get(), 0);
    assert_eq!(moved.len(), 32);
    assert!(set.is_empty());
}

#[test]
fn int_test_panicking_clone_is_torn_down() {
    let counters = Rc::new(Counters::default());
    let fuse = Rc::new(Cell::new(0));
    let mut set = TreapMultiset::with_allocator(CountingAllocator::new(&counters));
    set.reseed(8);
    for value in 0..50 {
        set.insert(Fused {
            value,
            fuse: Rc::clone(&fuse),
        })
        .unwrap();
    }

    fuse.set(20);
    let ret = panic::catch_unwind(AssertUnwindSafe(|| set.clone()));
    assert!(ret.is_err());
    assert_eq!(counters.allocated.get(), 70);
    assert_eq!(counters.live(), 50);

    // the source is intact
    assert_eq!(set.len(), 50);
    assert_eq!(
        set.iter().map(|curr| curr.value).collect::<Vec<u32>>(),
        (0..50).collect::<Vec<u32>>(),
    );
}

#[test]
fn int_test_refused_clone_is_torn_down() {
    let set = (0..10u32).collect::<TreapMultiset<u32>>();
    let ret = set.try_clone_in(TypedArena::with_limit(4, 6));
    assert!(ret.is_err());
    assert_eq!(set.len(), 10);
}
