//! Windowed, incrementally laid out photo gallery.
//!
//! A gallery is an arbitrarily long, date-ordered sequence of photos, videos
//! and text blocks of which only a window is ever materialized; the rest is
//! held as placeholder runs. [`model`] holds the sequence and its measures,
//! [`layout_engine`] the justified row layout, and [`gallery`] the loaders
//! that slide the window against a [`gallery::GallerySource`].

pub mod common;
pub mod gallery;
pub mod layout_engine;
pub mod model;
