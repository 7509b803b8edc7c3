pub mod graph;
mod justified;
mod text;

pub use justified::{
    LayoutConfig, common_height, compute_row_layout, ideal_node_search, justified_layout,
    row_breaks,
};
pub use text::{
    EstimatedTextMeasure, TEXT_BORDER, TEXT_HORIZONTAL_MARGIN, TEXT_PADDING, TEXT_VERTICAL_MARGIN,
    TextMeasure,
};
