use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::LegendPosition;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub kind: LegendKind,
}

pub enum LegendKind {
    /// Marker with a short error bar (estimate series).
    MarkerWithBar(MarkerShape),
    /// Line through a marker (truth series).
    LineMarker(MarkerShape),
}

const SWATCH_W: f64 = 16.0;
const GAP: f64 = 6.0;
const PADDING: f64 = 6.0;
const COLUMN_GAP: f64 = 14.0;

fn text_style(font_size: f64) -> TextStyle {
    TextStyle { size: font_size * 0.9, baseline: TextBaseline::Central, ..Default::default() }
}

fn row_height(font_size: f64) -> f64 {
    font_size + 5.0
}

fn entry_width(canvas: &Canvas, entry: &LegendEntry, font_size: f64) -> f64 {
    SWATCH_W + GAP + canvas.measure_text(&entry.label, &text_style(font_size)).width
}

/// Rows of entry indices for a horizontal legend `max_width` wide.
fn wrap_rows(
    canvas: &Canvas,
    entries: &[LegendEntry],
    font_size: f64,
    max_width: f64,
) -> Vec<Vec<usize>> {
    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut used = 0.0;
    for (i, e) in entries.iter().enumerate() {
        let w = entry_width(canvas, e, font_size) + COLUMN_GAP;
        match rows.last_mut() {
            Some(row) if used + w <= max_width => {
                row.push(i);
                used += w;
            }
            _ => {
                rows.push(vec![i]);
                used = w;
            }
        }
    }
    rows
}

/// Vertical space a bottom legend needs below the x-axis label.
pub fn bottom_legend_height(
    canvas: &Canvas,
    entries: &[LegendEntry],
    font_size: f64,
    max_width: f64,
) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let n_rows = wrap_rows(canvas, entries, font_size, max_width - 2.0 * PADDING).len();
    2.0 * PADDING + n_rows as f64 * row_height(font_size) + 4.0
}

fn draw_swatch(canvas: &mut Canvas, sx: f64, ey: f64, entry: &LegendEntry) {
    let cx = sx + SWATCH_W / 2.0;
    match entry.kind {
        LegendKind::MarkerWithBar(shape) => {
            canvas.error_bar(cx, ey - 5.0, ey + 5.0, 4.0, &LineStyle::solid(entry.color, 1.0));
            canvas.marker(cx, ey, &MarkerStyle::solid(shape, entry.color, 3.0));
        }
        LegendKind::LineMarker(shape) => {
            canvas.line(sx, ey, sx + SWATCH_W, ey, &LineStyle::solid(entry.color, 1.5));
            canvas.marker(cx, ey, &MarkerStyle::solid(shape, entry.color, 2.5));
        }
    }
}

/// Draw the legend. `area` is the plot area; a bottom legend goes under
/// `bottom_y` (the lowest drawn axis element).
pub fn draw_legend(
    canvas: &mut Canvas,
    area: &PlotArea,
    entries: &[LegendEntry],
    font_size: f64,
    position: LegendPosition,
    frame: bool,
    bottom_y: f64,
) {
    if entries.is_empty() {
        return;
    }

    let row_h = row_height(font_size);
    let style = text_style(font_size);
    let bg_style = Style {
        fill: Some(Color::rgba(255, 255, 255, 0.9)),
        stroke: frame.then_some(Color::rgb(200, 200, 200)),
        stroke_width: 0.5,
    };

    if position == LegendPosition::Bottom {
        let rows = wrap_rows(canvas, entries, font_size, area.width - 2.0 * PADDING);
        let widths: Vec<f64> =
            entries.iter().map(|e| entry_width(canvas, e, font_size)).collect();
        let legend_h = 2.0 * PADDING + rows.len() as f64 * row_h;
        let ly = bottom_y + 4.0;
        canvas.rect(area.left, ly, area.width, legend_h, &bg_style);

        for (r, row) in rows.iter().enumerate() {
            let total: f64 =
                row.iter().map(|&i| widths[i]).sum::<f64>() + COLUMN_GAP * (row.len() - 1) as f64;
            let mut sx = area.left + (area.width - total) / 2.0;
            let ey = ly + PADDING + r as f64 * row_h + row_h / 2.0;
            for &i in row {
                draw_swatch(canvas, sx, ey, &entries[i]);
                canvas.text(sx + SWATCH_W + GAP, ey, &entries[i].label, &style);
                sx += widths[i] + COLUMN_GAP;
            }
        }
        return;
    }

    let max_w = entries
        .iter()
        .map(|e| canvas.measure_text(&e.label, &style).width)
        .fold(0.0_f64, f64::max);
    let legend_w = PADDING + SWATCH_W + GAP + max_w + PADDING;
    let legend_h = PADDING + entries.len() as f64 * row_h + PADDING;

    let lx = match position {
        LegendPosition::TopRight => area.right() - legend_w - 5.0,
        _ => area.left + 5.0,
    };
    let ly = area.top + 5.0;
    canvas.rect(lx, ly, legend_w, legend_h, &bg_style);

    for (i, entry) in entries.iter().enumerate() {
        let ey = ly + PADDING + i as f64 * row_h + row_h / 2.0;
        let sx = lx + PADDING;
        draw_swatch(canvas, sx, ey, entry);
        canvas.text(sx + SWATCH_W + GAP, ey, &entry.label, &style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<LegendEntry> {
        (0..n)
            .map(|i| LegendEntry {
                label: format!("Estimator number {i}"),
                color: Color::BLACK,
                kind: LegendKind::MarkerWithBar(MarkerShape::Circle),
            })
            .collect()
    }

    #[test]
    fn bottom_legend_wraps() {
        let canvas = Canvas::new(300.0, 200.0).unwrap();
        let one = bottom_legend_height(&canvas, &entries(1), 10.0, 300.0);
        let six = bottom_legend_height(&canvas, &entries(6), 10.0, 300.0);
        assert!(one > 0.0);
        assert!(six > one);
        assert_eq!(bottom_legend_height(&canvas, &[], 10.0, 300.0), 0.0);
    }

    #[test]
    fn every_label_is_drawn() {
        let mut canvas = Canvas::new(400.0, 300.0).unwrap();
        let area = PlotArea { left: 40.0, top: 20.0, width: 340.0, height: 240.0 };
        draw_legend(&mut canvas, &area, &entries(3), 10.0, LegendPosition::TopLeft, true, 270.0);
        let svg = canvas.finish_svg();
        for i in 0..3 {
            assert!(svg.contains(&format!("Estimator number {i}")));
        }
    }
}
