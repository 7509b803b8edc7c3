use chrono::{DateTime, Utc};

use super::sequence::Summary;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(::std::sync::Arc<str>);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self { Self(::std::sync::Arc::from(id.as_ref())) }

            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self { Self::new(s) }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self { Self(::std::sync::Arc::from(s)) }
        }
    };
}

pub(crate) use string_id;

string_id! {
    /// Global identity of a photo or video.
    PhotoId
}

string_id! {
    /// Identity of an addressable gallery entry: an album membership or a text block.
    ItemId
}

impl From<&PhotoId> for ItemId {
    fn from(id: &PhotoId) -> Self { ItemId(id.0.clone()) }
}

/// Aggregate statistics for a contiguous run of gallery items.
///
/// First-* fields come from the leftmost contributor that has one, last-*
/// fields from the rightmost, so a combined measure always describes the real
/// boundaries of its run regardless of placeholders or rows in between.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Measure {
    pub count: usize,
    pub loaded_count: usize,
    pub height: f64,
    pub images: im::HashSet<PhotoId>,
    pub items: im::HashSet<ItemId>,
    pub first_date: Option<DateTime<Utc>>,
    pub last_date: Option<DateTime<Utc>>,
    pub first_image: Option<PhotoId>,
    pub last_image: Option<PhotoId>,
    pub first_item: Option<ItemId>,
    pub last_item: Option<ItemId>,
    pub last_row_height: Option<f64>,
}

impl Measure {
    pub fn needs_load(&self) -> bool { self.loaded_count < self.count }

    /// Offset at which the row holding the last element of this run begins.
    pub fn last_row_start(&self) -> f64 { self.height - self.last_row_height.unwrap_or(0.0) }
}

fn union<A: std::hash::Hash + Eq + Clone>(a: &mut im::HashSet<A>, b: &im::HashSet<A>) {
    if b.is_empty() {
        return;
    }
    if a.is_empty() {
        *a = b.clone();
        return;
    }
    // Fold the smaller set into the larger one. Each combine costs O(smaller
    // set), so rebuilding a node's measure is linear in the photos under its
    // lighter children.
    if a.len() < b.len() {
        let mut big = b.clone();
        big.extend(a.iter().cloned());
        *a = big;
    } else {
        a.extend(b.iter().cloned());
    }
}

impl Summary for Measure {
    fn add_summary(&mut self, other: &Self) {
        self.count += other.count;
        self.loaded_count += other.loaded_count;
        self.height += other.height;
        union(&mut self.images, &other.images);
        union(&mut self.items, &other.items);

        if self.first_date.is_none() {
            self.first_date = other.first_date;
        }
        if self.first_image.is_none() {
            self.first_image = other.first_image.clone();
        }
        if self.first_item.is_none() {
            self.first_item = other.first_item.clone();
        }
        if other.last_date.is_some() {
            self.last_date = other.last_date;
        }
        if other.last_image.is_some() {
            self.last_image = other.last_image.clone();
        }
        if other.last_item.is_some() {
            self.last_item = other.last_item.clone();
        }
        if other.last_row_height.is_some() {
            self.last_row_height = other.last_row_height;
        }
    }
}
