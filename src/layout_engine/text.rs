/// Measures how tall a block of text renders at a given container width.
pub trait TextMeasure: Send + Sync {
    fn height(&self, width: f64, text: &str) -> f64;
}

impl<F> TextMeasure for F
where F: Fn(f64, &str) -> f64 + Send + Sync
{
    fn height(&self, width: f64, text: &str) -> f64 { self(width, text) }
}

pub const TEXT_BORDER: f64 = 1.0;
pub const TEXT_PADDING: f64 = 15.0 + TEXT_BORDER;
pub const TEXT_VERTICAL_MARGIN: f64 = 20.0 + TEXT_PADDING;
pub const TEXT_HORIZONTAL_MARGIN: f64 = 40.0 + TEXT_PADDING;

/// Fixed-pitch approximation: wraps each paragraph at the number of average
/// characters that fit between the horizontal margins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimatedTextMeasure {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for EstimatedTextMeasure {
    fn default() -> Self { Self { char_width: 8.0, line_height: 20.0 } }
}

impl TextMeasure for EstimatedTextMeasure {
    fn height(&self, width: f64, text: &str) -> f64 {
        let available = (width - 2.0 * TEXT_HORIZONTAL_MARGIN).max(self.char_width);
        let per_line = ((available / self.char_width).floor() as usize).max(1);
        let lines: usize = text
            .split('\n')
            .map(|para| para.chars().count().div_ceil(per_line).max(1))
            .sum();
        lines as f64 * self.line_height + 2.0 * TEXT_VERTICAL_MARGIN
    }
}
