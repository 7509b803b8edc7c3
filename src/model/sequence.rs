//! Persistent, order-preserving sequence annotated with cached subtree measures.
//!
//! The sequence is a weight-balanced binary tree built from join/split
//! primitives. Nodes are immutable and shared through [`Arc`], so cloning a
//! sequence is O(1) and every clone is a stable snapshot: mutating one clone
//! rebuilds only the O(log n) path it touches.

use std::fmt;
use std::sync::Arc;

/// An associative combine with an identity element (`Default`).
pub trait Summary: Clone + Default {
    /// Folds `other` onto the right of `self`.
    fn add_summary(&mut self, other: &Self);

    fn combine(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.add_summary(other);
        out
    }
}

/// Something that can report a [`Summary`] of itself.
pub trait Measured: Clone {
    type Measure: Summary;

    fn measure(&self) -> Self::Measure;
}

// Balance parameters of the weight-balanced tree, as in Adams' sets.
const DELTA: usize = 3;
const RATIO: usize = 2;

type Link<T> = Option<Arc<Node<T>>>;

struct Node<T: Measured> {
    item: T,
    left: Link<T>,
    right: Link<T>,
    len: usize,
    measure: T::Measure,
}

pub struct AnnotatedSequence<T: Measured> {
    root: Link<T>,
}

impl<T: Measured> Clone for AnnotatedSequence<T> {
    fn clone(&self) -> Self { Self { root: self.root.clone() } }
}

impl<T: Measured> Default for AnnotatedSequence<T> {
    fn default() -> Self { Self { root: None } }
}

impl<T: Measured + fmt::Debug> fmt::Debug for AnnotatedSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Measured> AnnotatedSequence<T> {
    pub fn new() -> Self { Self::default() }

    pub fn singleton(item: T) -> Self { Self { root: node(None, item, None) } }

    /// Builds a perfectly balanced tree in O(n).
    pub fn from_vec(items: Vec<T>) -> Self {
        fn build<T: Measured>(items: &[T]) -> Link<T> {
            if items.is_empty() {
                return None;
            }
            let mid = items.len() / 2;
            node(build(&items[..mid]), items[mid].clone(), build(&items[mid + 1..]))
        }
        Self { root: build(&items) }
    }

    /// Number of elements stored in the tree, independent of any measure.
    pub fn len(&self) -> usize { len_of(&self.root) }

    pub fn is_empty(&self) -> bool { self.root.is_none() }

    pub fn measure(&self) -> T::Measure {
        self.root.as_ref().map(|n| n.measure.clone()).unwrap_or_default()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter { stack: Vec::new() };
        iter.descend_left(&self.root);
        iter
    }

    pub fn to_vec(&self) -> Vec<T> { self.iter().cloned().collect() }

    pub fn first(&self) -> Option<&T> {
        let mut cur = self.root.as_ref()?;
        while let Some(left) = cur.left.as_ref() {
            cur = left;
        }
        Some(&cur.item)
    }

    pub fn last(&self) -> Option<&T> {
        let mut cur = self.root.as_ref()?;
        while let Some(right) = cur.right.as_ref() {
            cur = right;
        }
        Some(&cur.item)
    }

    pub fn push_back(&mut self, item: T) { self.root = insert_max(item, self.root.take()); }

    pub fn push_front(&mut self, item: T) { self.root = insert_min(item, self.root.take()); }

    pub fn pop_front(&mut self) -> Option<T> {
        let (item, rest) = pop_min(self.root.take()?);
        self.root = rest;
        Some(item)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        let (item, rest) = pop_max(self.root.take()?);
        self.root = rest;
        Some(item)
    }

    pub fn concat(left: Self, right: Self) -> Self {
        Self { root: concat_links(left.root, right.root) }
    }

    /// Splits so that the left part holds the first `at` elements.
    pub fn split_at(&self, at: usize) -> (Self, Self) {
        let (left, right) = split_link(self.root.clone(), at);
        (Self { root: left }, Self { root: right })
    }

    /// Position of the first element for which `pred(left, right)` holds.
    ///
    /// `left` is the combined measure of everything up to and including the
    /// candidate, `right` the measure of everything after it. `pred` must be
    /// monotonic (false, then true) scanning from the left.
    pub fn position_by<F>(&self, mut pred: F) -> Option<usize>
    where F: FnMut(&T::Measure, &T::Measure) -> bool {
        let zero = T::Measure::default();
        find(&self.root, &zero, &zero, &mut pred, 0)
    }

    /// Splits around the first element matching `pred` (see [`Self::position_by`]).
    pub fn search_by<F>(&self, pred: F) -> Option<(Self, T, Self)>
    where F: FnMut(&T::Measure, &T::Measure) -> bool {
        let at = self.position_by(pred)?;
        let (before, rest) = split_link(self.root.clone(), at);
        let (item, after) = pop_min(rest?);
        Some((Self { root: before }, item, Self { root: after }))
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        fn depth_of<T: Measured>(link: &Link<T>) -> usize {
            link.as_ref().map_or(0, |n| 1 + depth_of(&n.left).max(depth_of(&n.right)))
        }
        depth_of(&self.root)
    }
}

impl<T: Measured> FromIterator<T> for AnnotatedSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T: Measured> IntoIterator for &'a AnnotatedSequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

pub struct Iter<'a, T: Measured> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T: Measured> Iter<'a, T> {
    fn descend_left(&mut self, mut link: &'a Link<T>) {
        while let Some(n) = link {
            self.stack.push(n);
            link = &n.left;
        }
    }
}

impl<'a, T: Measured> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        self.descend_left(&n.right);
        Some(&n.item)
    }
}

fn len_of<T: Measured>(link: &Link<T>) -> usize { link.as_ref().map_or(0, |n| n.len) }

fn node<T: Measured>(left: Link<T>, item: T, right: Link<T>) -> Link<T> {
    let mut measure = left.as_ref().map(|n| n.measure.clone()).unwrap_or_default();
    measure.add_summary(&item.measure());
    if let Some(r) = &right {
        measure.add_summary(&r.measure);
    }
    let len = len_of(&left) + len_of(&right) + 1;
    Some(Arc::new(Node { item, left, right, len, measure }))
}

fn parts<T: Measured>(n: &Arc<Node<T>>) -> (Link<T>, T, Link<T>) {
    (n.left.clone(), n.item.clone(), n.right.clone())
}

fn balance<T: Measured>(left: Link<T>, item: T, right: Link<T>) -> Link<T> {
    let (ln, rn) = (len_of(&left), len_of(&right));
    if ln + rn <= 1 {
        node(left, item, right)
    } else if rn > DELTA * ln {
        rotate_left(left, item, right)
    } else if ln > DELTA * rn {
        rotate_right(left, item, right)
    } else {
        node(left, item, right)
    }
}

fn rotate_left<T: Measured>(left: Link<T>, item: T, right: Link<T>) -> Link<T> {
    let Some(r) = right else {
        return node(left, item, None);
    };
    let (rl, ritem, rr) = parts(&r);
    match rl {
        Some(inner) if inner.len >= RATIO * len_of(&rr) => {
            let (rll, rlitem, rlr) = parts(&inner);
            node(node(left, item, rll), rlitem, node(rlr, ritem, rr))
        }
        rl => node(node(left, item, rl), ritem, rr),
    }
}

fn rotate_right<T: Measured>(left: Link<T>, item: T, right: Link<T>) -> Link<T> {
    let Some(l) = left else {
        return node(None, item, right);
    };
    let (ll, litem, lr) = parts(&l);
    match lr {
        Some(inner) if inner.len >= RATIO * len_of(&ll) => {
            let (lrl, lritem, lrr) = parts(&inner);
            node(node(ll, litem, lrl), lritem, node(lrr, item, right))
        }
        lr => node(ll, litem, node(lr, item, right)),
    }
}

fn insert_min<T: Measured>(item: T, link: Link<T>) -> Link<T> {
    match link {
        None => node(None, item, None),
        Some(n) => {
            let (l, x, r) = parts(&n);
            balance(insert_min(item, l), x, r)
        }
    }
}

fn insert_max<T: Measured>(item: T, link: Link<T>) -> Link<T> {
    match link {
        None => node(None, item, None),
        Some(n) => {
            let (l, x, r) = parts(&n);
            balance(l, x, insert_max(item, r))
        }
    }
}

/// Joins `left ++ [item] ++ right`, rebalancing along the spine of the taller side.
fn link<T: Measured>(left: Link<T>, item: T, right: Link<T>) -> Link<T> {
    match (left, right) {
        (None, right) => insert_min(item, right),
        (left, None) => insert_max(item, left),
        (Some(l), Some(r)) => {
            if DELTA * l.len < r.len {
                let (rl, ritem, rr) = parts(&r);
                balance(link(Some(l), item, rl), ritem, rr)
            } else if DELTA * r.len < l.len {
                let (ll, litem, lr) = parts(&l);
                balance(ll, litem, link(lr, item, Some(r)))
            } else {
                node(Some(l), item, Some(r))
            }
        }
    }
}

fn pop_min<T: Measured>(n: Arc<Node<T>>) -> (T, Link<T>) {
    let (l, x, r) = parts(&n);
    match l {
        None => (x, r),
        Some(l) => {
            let (min, rest) = pop_min(l);
            (min, balance(rest, x, r))
        }
    }
}

fn pop_max<T: Measured>(n: Arc<Node<T>>) -> (T, Link<T>) {
    let (l, x, r) = parts(&n);
    match r {
        None => (x, l),
        Some(r) => {
            let (max, rest) = pop_max(r);
            (max, balance(l, x, rest))
        }
    }
}

fn concat_links<T: Measured>(left: Link<T>, right: Link<T>) -> Link<T> {
    match right {
        None => left,
        Some(r) => {
            let (min, rest) = pop_min(r);
            link(left, min, rest)
        }
    }
}

fn split_link<T: Measured>(link_: Link<T>, at: usize) -> (Link<T>, Link<T>) {
    let Some(n) = link_ else {
        return (None, None);
    };
    let (l, x, r) = parts(&n);
    let ln = len_of(&l);
    if at <= ln {
        let (ll, lr) = split_link(l, at);
        (ll, link(lr, x, r))
    } else {
        let (rl, rr) = split_link(r, at - ln - 1);
        (link(l, x, rl), rr)
    }
}

fn find<T, F>(
    link_: &Link<T>,
    acc_left: &T::Measure,
    acc_right: &T::Measure,
    pred: &mut F,
    offset: usize,
) -> Option<usize>
where
    T: Measured,
    F: FnMut(&T::Measure, &T::Measure) -> bool,
{
    let n = link_.as_ref()?;
    let item_measure = n.item.measure();

    let mut through_left = acc_left.clone();
    if let Some(l) = &n.left {
        through_left.add_summary(&l.measure);
    }
    let mut after_item = T::Measure::default();
    if let Some(r) = &n.right {
        after_item.add_summary(&r.measure);
    }
    after_item.add_summary(acc_right);

    if n.left.is_some() {
        let from_item = item_measure.combine(&after_item);
        if pred(&through_left, &from_item) {
            return find(&n.left, acc_left, &from_item, pred, offset);
        }
    }

    let mut through_item = through_left;
    through_item.add_summary(&item_measure);
    let here = offset + len_of(&n.left);
    if pred(&through_item, &after_item) {
        return Some(here);
    }
    find(&n.right, &through_item, acc_right, pred, here + 1)
}
