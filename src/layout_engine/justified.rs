use serde::{Deserialize, Serialize};
use tracing::trace;

use super::graph::shortest_path;
use super::text::TextMeasure;
use crate::common::config::LayoutSettings;
use crate::model::{GallerySequence, Item, PhotoItem, Row, ideal_image_size};

/// Geometry every layout pass runs against.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub width: f64,
    pub target_row_height: f64,
    pub margin: f64,
}

impl LayoutConfig {
    pub fn new(width: f64, settings: &LayoutSettings) -> Self {
        Self {
            width,
            target_row_height: settings.target_row_height,
            margin: settings.margin,
        }
    }

    /// Problems that keep photos from fitting in a row at all.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(self.target_row_height.is_finite() && self.target_row_height > 0.0) {
            issues.push(format!("target row height must be positive, got {}", self.target_row_height));
        }

        if !(self.margin.is_finite() && self.margin >= 0.0) {
            issues.push(format!("margin must be non-negative, got {}", self.margin));
        }

        if !(self.width.is_finite() && self.width > self.margin * 2.0) {
            issues.push(format!(
                "width {} leaves no room inside margins of {}",
                self.width, self.margin
            ));
        }

        issues
    }
}

/// How many photos ahead a row break is searched for. Assumes an average
/// aspect ratio of 1.5 for the minimum row, plus some slack.
pub fn ideal_node_search(config: &LayoutConfig) -> usize {
    let row_aspect = config.width / config.target_row_height;
    ((row_aspect / 1.5).round().max(0.0) as usize).saturating_add(8)
}

/// Height at which `aspect_ratios` exactly fill the container width.
pub fn common_height(aspect_ratios: &[f64], width: f64, margin: f64) -> f64 {
    let row_width = width - aspect_ratios.len() as f64 * margin * 2.0;
    let total: f64 = aspect_ratios.iter().sum();
    if total > 0.0 { row_width / total } else { f64::INFINITY }
}

/// Break positions `0 = b0 < b1 < ... < bk = n` minimizing the summed squared
/// deviation of every row's height from the target.
pub fn row_breaks(aspect_ratios: &[f64], config: &LayoutConfig) -> Vec<usize> {
    let n = aspect_ratios.len();
    if n == 0 {
        return vec![0];
    }
    let lookahead = ideal_node_search(config).max(1);
    let neighbors = move |start: usize| {
        (start + 1..=n.min(start.saturating_add(lookahead))).map(move |end| {
            let height = common_height(&aspect_ratios[start..end], config.width, config.margin);
            (end, (height - config.target_row_height).powi(2))
        })
    };
    shortest_path(0, n, neighbors).unwrap_or_else(|| (0..=n).collect())
}

/// Lays out a run of consecutive photos as `Row, photos.., Row, photos..`.
pub fn compute_row_layout(photos: &[PhotoItem], config: &LayoutConfig) -> Vec<Item> {
    let aspect_ratios: Vec<f64> = photos.iter().map(PhotoItem::aspect_ratio).collect();
    let breaks = row_breaks(&aspect_ratios, config);

    let mut out = Vec::with_capacity(photos.len() + breaks.len());
    for pair in breaks.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let height = common_height(&aspect_ratios[start..end], config.width, config.margin)
            .min(config.target_row_height * 2.0);
        out.push(Row::new(height).into());

        for (photo, ratio) in photos[start..end].iter().zip(&aspect_ratios[start..end]) {
            let width = height * ratio;
            if let Some(image) = photo.cache().image(&photo.id) {
                image.at_size(ideal_image_size(width, height));
            }
            out.push(photo.with_display_width(width).into());
        }
    }
    trace!(photos = photos.len(), rows = breaks.len() - 1, "row layout");
    out
}

/// Re-lays-out a whole sequence.
///
/// Runs of photos are partitioned into justified rows; text blocks are
/// re-measured and placeholders pass through. Existing rows are discarded.
pub fn justified_layout(
    items: &GallerySequence,
    config: &LayoutConfig,
    text: &dyn TextMeasure,
) -> GallerySequence {
    let mut out: Vec<Item> = Vec::new();
    let mut pending: Vec<PhotoItem> = Vec::new();

    let flush = |pending: &mut Vec<PhotoItem>, out: &mut Vec<Item>| {
        if !pending.is_empty() {
            out.extend(compute_row_layout(pending, config));
            pending.clear();
        }
    };

    for item in items {
        match item {
            Item::Row(_) => {}
            Item::Photo(photo) => pending.push(photo.clone()),
            Item::Placeholder(_) => {
                flush(&mut pending, &mut out);
                out.push(item.clone());
            }
            Item::Text(block) => {
                flush(&mut pending, &mut out);
                let height = text.height(config.width, &block.text);
                out.push(block.with_height(height).into());
            }
        }
    }
    flush(&mut pending, &mut out);

    GallerySequence::from_items(out)
}
