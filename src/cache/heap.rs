//! Priority Queue Module
//!
//! Generic array-backed binary heap ordered by a caller-supplied comparator.

// == Comparator ==
/// Default comparator for totally-ordered values: `a` comes before `b` when `a < b`.
pub fn default_comparator<T: PartialOrd>(a: &T, b: &T) -> bool {
    a < b
}

// == Priority Queue ==
/// Array-backed binary heap.
///
/// The comparator answers "must `a` be positioned at or before `b`?" with
/// strict semantics; ties may resolve either way and are not stable. With
/// [`default_comparator`] the queue is a min-heap.
///
/// Only the heap property holds over the backing storage: iterating it does
/// not yield sorted order. Use [`PriorityQueue::for_each`] to observe global
/// order without mutating the queue.
#[derive(Debug)]
pub struct PriorityQueue<T, C>
where
    C: Fn(&T, &T) -> bool,
{
    /// Backing storage; `array.len()` is the heap size
    array: Vec<T>,
    /// Strict "comes before" ordering
    comparator: C,
}

impl<T: PartialOrd> PriorityQueue<T, fn(&T, &T) -> bool> {
    // == Constructor ==
    /// Creates an empty min-heap over the natural `<` ordering.
    pub fn min() -> Self {
        Self::with_comparator(default_comparator::<T>)
    }
}

impl<T, C> PriorityQueue<T, C>
where
    C: Fn(&T, &T) -> bool,
{
    // == Constructor ==
    /// Creates an empty queue ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            array: Vec::new(),
            comparator,
        }
    }

    // == Add ==
    /// Inserts an element in O(log n): append at the end, then sift up until
    /// the parent no longer orders after the new element.
    pub fn add(&mut self, item: T) {
        self.array.push(item);
        let mut idx = self.array.len() - 1;
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !(self.comparator)(&self.array[idx], &self.array[parent]) {
                break;
            }
            self.array.swap(idx, parent);
            idx = parent;
        }
    }

    // == Heapify ==
    /// Adopts `items` as backing storage and restores the heap property in
    /// O(n) by sinking every index from `len / 2` down to the root.
    pub fn heapify(&mut self, items: Vec<T>) {
        self.array = items;
        if self.array.is_empty() {
            return;
        }
        for idx in (0..=self.array.len() / 2).rev() {
            self.sink(idx);
        }
    }

    // == Sink ==
    /// Standard sift-down: swap with the preceding child until the element
    /// reaches a leaf or no child orders before it.
    fn sink(&mut self, mut idx: usize) {
        let size = self.array.len();
        let half = size / 2;
        while idx < half {
            let left = idx * 2 + 1;
            let right = left + 1;
            let mut best = left;
            if right < size && (self.comparator)(&self.array[right], &self.array[left]) {
                best = right;
            }
            if !(self.comparator)(&self.array[best], &self.array[idx]) {
                break;
            }
            self.array.swap(idx, best);
            idx = best;
        }
    }

    // == Peek ==
    /// Returns the root without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.array.first()
    }

    // == Poll ==
    /// Removes and returns the root in O(log n): the last element moves to
    /// the root and sinks.
    pub fn poll(&mut self) -> Option<T> {
        if self.array.is_empty() {
            return None;
        }
        let last = self.array.len() - 1;
        self.array.swap(0, last);
        let res = self.array.pop();
        if !self.array.is_empty() {
            self.sink(0);
        }
        res
    }

    // == Remove ==
    /// Removes the first element equal to `item`. O(n) scan plus an O(log n)
    /// fix-up. Returns whether an element was removed.
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.array.iter().position(|e| e == item) {
            Some(idx) => {
                self.remove_at(idx);
                true
            }
            None => false,
        }
    }

    // == Remove At ==
    /// Removes the element at `idx` by forcing it to the root with an
    /// unconditional upward percolation and then polling.
    ///
    /// The percolation deliberately ignores heap order; `poll` repairs the
    /// whole heap with one sink immediately after. This two-step strategy
    /// costs the same O(log n) as a dedicated remove-at-index and reuses the
    /// poll logic.
    pub fn remove_at(&mut self, idx: usize) -> Option<T> {
        if idx >= self.array.len() {
            return None;
        }
        self.percolate_up_force(idx);
        self.poll()
    }

    /// Moves the element at `idx` to the root regardless of ordering,
    /// shifting each ancestor down one level.
    fn percolate_up_force(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            self.array.swap(idx, parent);
            idx = parent;
        }
    }

    // == Remove One ==
    /// Removes and returns the first stored element satisfying `predicate`,
    /// in storage order. O(n) scan plus O(log n) fix-up.
    pub fn remove_one<F>(&mut self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let idx = self.array.iter().position(|e| predicate(e))?;
        self.remove_at(idx)
    }

    // == Remove Many ==
    /// Removes up to `limit` elements satisfying `predicate`, in poll order.
    ///
    /// Drains the heap via repeated polls, keeping matches and buffering
    /// everything else, then re-adds the buffered elements. O(n log n) worst
    /// case for a full drain, not O(log n) per removal; the heap supports no
    /// sublinear arbitrary-predicate deletion, so the drain is the correct
    /// strategy. `limit = None` removes every match.
    pub fn remove_many<F>(&mut self, predicate: F, limit: Option<usize>) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        if self.array.is_empty() {
            return Vec::new();
        }

        let limit = limit.unwrap_or(self.array.len()).min(self.array.len());
        let mut removed = Vec::with_capacity(limit);
        let mut kept = Vec::new();

        while removed.len() < limit {
            match self.poll() {
                Some(item) if predicate(&item) => removed.push(item),
                Some(item) => kept.push(item),
                None => break,
            }
        }

        for item in kept {
            self.add(item);
        }

        removed
    }

    // == Replace Top ==
    /// Swaps the root for `item` and sinks it; returns the old root.
    pub fn replace_top(&mut self, item: T) -> Option<T> {
        if self.array.is_empty() {
            return None;
        }
        let old = std::mem::replace(&mut self.array[0], item);
        self.sink(0);
        Some(old)
    }

    // == Clear ==
    /// Removes every element.
    pub fn clear(&mut self) {
        self.array.clear();
    }

    // == For Each ==
    /// Visits every element in full priority order without mutating the
    /// queue, by polling a clone. O(n log n).
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(T, usize),
        T: Clone,
        C: Clone,
    {
        let mut clone = self.clone();
        let mut idx = 0;
        while let Some(item) = clone.poll() {
            f(item, idx);
            idx += 1;
        }
    }

    // == Length ==
    /// Returns the number of stored elements.
    pub fn len(&self) -> usize {
        self.array.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }
}

// == Clone ==
/// Shallow copy sharing the comparator, with independent backing storage.
impl<T, C> Clone for PriorityQueue<T, C>
where
    T: Clone,
    C: Fn(&T, &T) -> bool + Clone,
{
    fn clone(&self) -> Self {
        Self {
            array: self.array.clone(),
            comparator: self.comparator.clone(),
        }
    }
}
