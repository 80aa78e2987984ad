use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::primitives::TextStyle;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Compute margins from tick labels, axis labels, title and any space
    /// reserved below the x axis (bottom legend).
    pub fn auto(
        canvas: &Canvas,
        y_axis: &Axis,
        x_axis: &Axis,
        has_title: bool,
        reserve_bottom: f64,
        config: &VizConfig,
    ) -> Self {
        let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };
        let label_size = config.font.label_size;
        let outward_ticks = if config.axes.tick_direction == "in" { 0.0 } else { config.axes.tick_length };

        let max_tick_w = y_axis
            .tick_labels
            .iter()
            .map(|l| canvas.measure_text(l, &tick_style).width)
            .fold(0.0_f64, f64::max);
        let mut left = 12.0 + outward_ticks + max_tick_w + 6.0;
        if !y_axis.label.is_empty() {
            left += label_size + 8.0;
        }

        let mut bottom = 12.0 + outward_ticks + tick_style.size + 6.0 + reserve_bottom;
        if !x_axis.label.is_empty() {
            bottom += label_size + 8.0;
        }

        let top = if has_title { config.font.title_size + 22.0 } else { 14.0 };
        let right = 16.0;

        let width = canvas.width - left - right;
        let height = canvas.height - top - bottom;

        Self { left, top, width: width.max(50.0), height: height.max(50.0) }
    }
}
