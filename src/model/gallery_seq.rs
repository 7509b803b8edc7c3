//! The gallery's item sequence and the placeholder bookkeeping around it.
//!
//! Every split is a search over the cached measures: by index (`count`), by
//! vertical offset (`height` / `last_row_start`), by date (`last_date`) or by
//! identity (`images` / `items`). Splits that land inside a placeholder divide
//! the run rather than failing.

use chrono::{DateTime, Utc};
use tracing::trace;

use super::item::{Item, Placeholder};
use super::measure::{ItemId, Measure, PhotoId};
use super::sequence::{AnnotatedSequence, Iter};
use crate::gallery::error::{GalleryError, Result};

/// Which side of a split point the matched element lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

#[derive(Clone, Default, Debug)]
pub struct GallerySequence {
    seq: AnnotatedSequence<Item>,
}

impl PartialEq for GallerySequence {
    fn eq(&self, other: &Self) -> bool {
        self.seq.len() == other.seq.len() && self.iter().eq(other.iter())
    }
}

/// Outcome of reconciling a fetched run with the current sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeResult {
    pub before: GallerySequence,
    pub middle: GallerySequence,
    pub after: GallerySequence,
}

/// An unloaded stretch and the loaded photos bracketing it. `None` on a side
/// means the stretch reaches that end of the sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gap {
    pub prev: Option<PhotoId>,
    pub next: Option<PhotoId>,
}

type Found = (AnnotatedSequence<Item>, Item, AnnotatedSequence<Item>);

impl GallerySequence {
    pub fn new() -> Self { Self::default() }

    /// Builds a sequence from items in order. Adjacent placeholder runs are
    /// joined and empty ones dropped.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut out: Vec<Item> = Vec::new();
        for item in items {
            if let Item::Placeholder(next) = &item {
                if next.count == 0 {
                    continue;
                }
                if let Some(Item::Placeholder(last)) = out.last_mut() {
                    *last = last.join(next);
                    continue;
                }
            }
            out.push(item);
        }
        Self { seq: AnnotatedSequence::from_vec(out) }
    }

    fn wrap(seq: AnnotatedSequence<Item>) -> Self { Self { seq } }

    fn wrap_found((before, item, after): Found) -> (Self, Item, Self) {
        (Self::wrap(before), item, Self::wrap(after))
    }

    pub fn measure(&self) -> Measure { self.seq.measure() }

    /// Number of items, counting every unit of every placeholder run.
    pub fn len(&self) -> usize { self.measure().count }

    pub fn is_empty(&self) -> bool { self.seq.is_empty() }

    pub fn height(&self) -> f64 { self.measure().height }

    pub fn loaded_count(&self) -> usize { self.measure().loaded_count }

    pub fn needs_load(&self) -> bool { self.measure().needs_load() }

    pub fn is_photo_loaded(&self, id: &PhotoId) -> bool { self.measure().images.contains(id) }

    pub fn is_item_loaded(&self, id: &ItemId) -> bool { self.measure().items.contains(id) }

    pub fn first(&self) -> Option<&Item> { self.seq.first() }

    pub fn last(&self) -> Option<&Item> { self.seq.last() }

    pub fn iter(&self) -> Iter<'_, Item> { self.seq.iter() }

    pub fn to_vec(&self) -> Vec<Item> { self.seq.to_vec() }

    pub fn pop_front(&mut self) -> Option<Item> { self.seq.pop_front() }

    pub fn pop_back(&mut self) -> Option<Item> { self.seq.pop_back() }

    pub fn without_rows(&self) -> Self {
        Self::from_items(self.iter().filter(|item| !item.is_row()).cloned())
    }

    /// Appends `item`; a placeholder meeting a trailing placeholder is combined
    /// with it (see [`Placeholder::combine`]).
    pub fn push_back(&mut self, item: Item) {
        if let Item::Placeholder(next) = &item {
            if next.count == 0 {
                return;
            }
            if let Some(Item::Placeholder(last)) = self.seq.last() {
                let (combined, _, _) = last.combine(next);
                self.seq.pop_back();
                self.seq.push_back(combined.into());
                return;
            }
        }
        self.seq.push_back(item);
    }

    pub fn push_front(&mut self, item: Item) {
        if let Item::Placeholder(prev) = &item {
            if prev.count == 0 {
                return;
            }
            if let Some(Item::Placeholder(first)) = self.seq.first() {
                let (combined, _, _) = first.combine(prev);
                self.seq.pop_front();
                self.seq.push_front(combined.into());
                return;
            }
        }
        self.seq.push_front(item);
    }

    /// Concatenates two runs. Placeholders meeting at the seam are halves of
    /// one run and are joined additively.
    pub fn concat(left: Self, right: Self) -> Self {
        let seam = match (left.seq.last(), right.seq.first()) {
            (Some(Item::Placeholder(a)), Some(Item::Placeholder(b))) => Some(a.join(b)),
            _ => None,
        };
        let (mut left, mut right) = (left.seq, right.seq);
        if let Some(joined) = seam {
            left.pop_back();
            right.pop_front();
            left.push_back(joined.into());
        }
        Self::wrap(AnnotatedSequence::concat(left, right))
    }

    pub fn concat3(a: Self, b: Self, c: Self) -> Self { Self::concat(Self::concat(a, b), c) }

    pub fn search_for_photo(&self, id: &PhotoId) -> Option<(Self, Item, Self)> {
        if !self.is_photo_loaded(id) {
            return None;
        }
        self.seq.search_by(|l, _| l.images.contains(id)).map(Self::wrap_found)
    }

    pub fn search_for_item(&self, id: &ItemId) -> Option<(Self, Item, Self)> {
        if !self.is_item_loaded(id) {
            return None;
        }
        self.seq.search_by(|l, _| l.items.contains(id)).map(Self::wrap_found)
    }

    /// The first unloaded stretch after the loaded photo `id`, skipping over
    /// any photos already loaded next to it.
    pub fn gap_after(&self, id: &PhotoId) -> Option<Gap> {
        let (_, _, after) = self.search_for_photo(id)?;
        let (head, _, tail) = after.seq.search_by(|l, _| l.needs_load())?;
        Some(Gap {
            prev: head.measure().last_image.or_else(|| Some(id.clone())),
            next: tail.measure().first_image,
        })
    }

    /// The last unloaded stretch before the loaded photo `id`.
    pub fn gap_before(&self, id: &PhotoId) -> Option<Gap> {
        let (before, _, _) = self.search_for_photo(id)?;
        if !before.needs_load() {
            return None;
        }
        let (head, _, tail) = before.seq.search_by(|_, r| !r.needs_load())?;
        Some(Gap {
            prev: head.measure().last_image,
            next: tail.measure().first_image.or_else(|| Some(id.clone())),
        })
    }

    /// Splits so the left side holds `index` items. Negative indices count
    /// from the end. Out-of-range indices put everything on one side.
    pub fn split_at_index(&self, index: isize) -> (Self, Self) {
        let total = self.len();
        let at = if index < 0 {
            let back = index.unsigned_abs();
            if back >= total {
                return (Self::new(), self.clone());
            }
            total - back
        } else {
            index.unsigned_abs()
        };
        if at >= total {
            return (self.clone(), Self::new());
        }

        let Some((mut before, matched, mut after)) = self.seq.search_by(|l, _| l.count > at)
        else {
            return (self.clone(), Self::new());
        };
        match matched {
            Item::Placeholder(ph) => {
                let (left, right) = ph.split(at - before.measure().count);
                if let Some(left) = left {
                    before.push_back(left.into());
                }
                if let Some(right) = right {
                    after.push_front(right.into());
                }
            }
            item => {
                debug_assert!(!item.is_row(), "index split landed on a row");
                after.push_front(item);
            }
        }
        (Self::wrap(before), Self::wrap(after))
    }

    /// Splits at vertical offset `y`.
    ///
    /// `Before` cuts at the first element whose running height passes `y`, so
    /// the row containing `y` starts the right side. `After` cuts at the first
    /// row starting at or below `y`, so the row containing `y` stays left. A
    /// placeholder straddling `y` on a `Before` cut is divided by whole units;
    /// an `After` cut keeps it whole. Either way each unit lands on one side.
    pub fn split_at_height(&self, y: f64, side: Side) -> (Self, Self) {
        let found = match side {
            Side::Before => self.seq.search_by(|l, _| l.height > y),
            Side::After => self.seq.search_by(|l, _| l.last_row_start() >= y),
        };
        let Some((mut before, matched, mut after)) = found else {
            return if y <= 0.0 {
                (Self::new(), self.clone())
            } else {
                (self.clone(), Self::new())
            };
        };
        match matched {
            Item::Placeholder(ph) if side == Side::Before && ph.height > 0.0 => {
                let offset = y - before.measure().height;
                let units = (offset / ph.height * ph.count as f64).floor().max(0.0) as usize;
                let (left, right) = ph.split(units.min(ph.count.saturating_sub(1)));
                if let Some(left) = left {
                    before.push_back(left.into());
                }
                if let Some(right) = right {
                    after.push_front(right.into());
                }
            }
            item => after.push_front(item),
        }
        (Self::wrap(before), Self::wrap(after))
    }

    /// Splits a date-ordered sequence at the insertion point for a photo
    /// created at `date` with id `tie_break`.
    ///
    /// Items dated before `date` go left. Among items dated exactly `date`,
    /// photos whose id sorts at or below `tie_break` go left. When nothing is
    /// dated at or after `date`, everything goes left.
    pub fn split_at_date(&self, date: DateTime<Utc>, tie_break: &PhotoId) -> (Self, Self) {
        let Some((before, first, mut rest)) =
            self.seq.search_by(|l, _| l.last_date.is_some_and(|d| d >= date))
        else {
            return (self.clone(), Self::new());
        };
        rest.push_front(first);

        let (block, tail) = match rest.search_by(|l, _| l.last_date.is_some_and(|d| d > date)) {
            Some((block, next, mut tail)) => {
                tail.push_front(next);
                (block, tail)
            }
            None => (rest, AnnotatedSequence::new()),
        };

        let cut = block
            .iter()
            .position(|item| matches!(item, Item::Photo(photo) if photo.id > *tie_break))
            .unwrap_or(block.len());
        let (same_left, same_right) = block.split_at(cut);
        trace!(?date, cut, same_day = block.len(), "split at date");

        (
            Self::concat(Self::wrap(before), Self::wrap(same_left)),
            Self::concat(Self::wrap(same_right), Self::wrap(tail)),
        )
    }

    /// Places a new photo in date order, or at the end when it has no date.
    ///
    /// Where that place borders an unloaded run the photo joins the run as one
    /// more unit, so the load that later covers the run fetches it in place.
    /// Returns the pieces around the change and whether the photo went in as
    /// a loaded item.
    pub fn insert_by_date(
        &self,
        photo: Item,
        date: Option<DateTime<Utc>>,
        tie_break: &PhotoId,
    ) -> (MergeResult, bool) {
        let (before, after) = match date {
            Some(date) => self.split_at_date(date, tie_break),
            None => (self.clone(), Self::new()),
        };
        if let Some(before) = before.grow_edge_run(Side::Before) {
            return (MergeResult { before, middle: Self::new(), after }, false);
        }
        if let Some(after) = after.grow_edge_run(Side::After) {
            return (MergeResult { before, middle: Self::new(), after }, false);
        }
        let middle = Self::from_items([photo]);
        (MergeResult { before, middle, after }, true)
    }

    /// Adds a unit to the placeholder at the `Before` (last) or `After`
    /// (first) counted position, if that position is a placeholder.
    fn grow_edge_run(&self, edge: Side) -> Option<Self> {
        let found = match edge {
            Side::Before => self.seq.search_by(|_, r| r.count == 0),
            Side::After => self.seq.search_by(|l, _| l.count > 0),
        };
        let (mut head, Item::Placeholder(ph), tail) = found? else {
            return None;
        };
        head.push_back(ph.grow_one().into());
        Some(Self::wrap(AnnotatedSequence::concat(head, tail)))
    }

    /// Splits around a loaded photo, placing it on `side`. When the photo is
    /// not loaded the whole sequence is the left side.
    pub fn split_at_photo(&self, id: &PhotoId, side: Side) -> (Self, Self) {
        Self::place(self.search_for_photo(id), side, self)
    }

    pub fn split_at_item(&self, id: &ItemId, side: Side) -> (Self, Self) {
        Self::place(self.search_for_item(id), side, self)
    }

    fn place(found: Option<(Self, Item, Self)>, side: Side, whole: &Self) -> (Self, Self) {
        match found {
            None => (whole.clone(), Self::new()),
            Some((mut before, item, after)) if side == Side::After => {
                before.seq.push_back(item);
                (before, after)
            }
            Some((before, item, mut after)) => {
                after.seq.push_front(item);
                (before, after)
            }
        }
    }

    /// Reconciles `fetched` with this sequence.
    ///
    /// When the fetched run starts with a loaded photo, everything ahead of
    /// that photo is kept as `before`; the remainder and the fetched run are then
    /// walked in lockstep. Rows are dropped, placeholders consume units of
    /// each other or of concrete items, and concrete items on both sides must
    /// carry the same identity. Once the fetched run is exhausted the rest of
    /// this sequence is `after`; if this sequence runs out first the rest of
    /// the fetched run is.
    ///
    /// A fetched photo may only land where this sequence holds that photo or
    /// an unloaded unit. Any other overlap is a misalignment.
    pub fn merge(&self, fetched: &Self) -> Result<MergeResult> {
        let Some(head) = fetched.first() else {
            return Ok(MergeResult { before: self.clone(), ..MergeResult::default() });
        };
        let (before, current) = match head {
            Item::Photo(photo) if self.is_photo_loaded(&photo.id) => {
                self.split_at_photo(&photo.id, Side::Before)
            }
            _ => (Self::new(), self.clone()),
        };
        let overlap = fetched.iter().filter_map(Item::photo_id).find(|id| before.is_photo_loaded(id));
        if let Some(dup) = overlap {
            return Err(GalleryError::MergeMisalignment {
                expected: None,
                got: Some(ItemId::from(dup)),
            });
        }

        let mut current = current.seq;
        let mut incoming = fetched.seq.clone();
        let mut middle = Self::new();

        while let Some(new) = incoming.pop_front() {
            let Some(cur) = current.pop_front() else {
                incoming.push_front(new);
                current = std::mem::take(&mut incoming);
                break;
            };
            match (cur, new) {
                (Item::Row(_), new) => incoming.push_front(new),
                (cur, Item::Row(_)) => current.push_front(cur),
                (Item::Placeholder(c), Item::Placeholder(n)) => {
                    check_units(&c)?;
                    check_units(&n)?;
                    let (combined, rest_cur, rest_new) = c.combine(&n);
                    middle.push_back(combined.into());
                    if let Some(rest) = rest_cur {
                        current.push_front(rest.into());
                    }
                    if let Some(rest) = rest_new {
                        incoming.push_front(rest.into());
                    }
                }
                (Item::Placeholder(c), new) => {
                    check_units(&c)?;
                    if let Some(id) = new.photo_id().filter(|id| current.measure().images.contains(*id)) {
                        return Err(GalleryError::MergeMisalignment {
                            expected: None,
                            got: Some(ItemId::from(id)),
                        });
                    }
                    if let Some(rest) = c.remove_one() {
                        current.push_front(rest.into());
                    }
                    middle.push_back(new);
                }
                (cur, Item::Placeholder(n)) => {
                    check_units(&n)?;
                    if let Some(id) = cur.photo_id().filter(|id| incoming.measure().images.contains(*id)) {
                        return Err(GalleryError::MergeMisalignment {
                            expected: Some(ItemId::from(id)),
                            got: None,
                        });
                    }
                    if let Some(rest) = n.remove_one() {
                        incoming.push_front(rest.into());
                    }
                    middle.push_back(cur);
                }
                (cur, new) => {
                    if cur.item_id() != new.item_id() {
                        return Err(GalleryError::MergeMisalignment {
                            expected: cur.item_id(),
                            got: new.item_id(),
                        });
                    }
                    middle.push_back(cur);
                }
            }
        }

        Ok(MergeResult {
            before,
            middle,
            after: Self::wrap(current),
        })
    }
}

fn check_units(ph: &Placeholder) -> Result<()> {
    if ph.count == 0 {
        debug_assert!(false, "zero-length placeholder in merge");
        return Err(GalleryError::PlaceholderUnderflow);
    }
    Ok(())
}

impl FromIterator<Item> for GallerySequence {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self { Self::from_items(iter) }
}

impl<'a> IntoIterator for &'a GallerySequence {
    type Item = &'a Item;
    type IntoIter = Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}
