use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Draw a box frame with ticks, grid and axis labels.
///
/// Returns the lowest y coordinate used (bottom of the x-axis label).
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) -> f64 {
    let frame_color = Color::BLACK;
    let frame_style = LineStyle::solid(frame_color, 0.8);
    let tick_style = LineStyle::solid(frame_color, 0.6);
    let minor_tick_style = LineStyle::solid(frame_color, 0.4);
    let grid_style = LineStyle::solid(config.grid.color.with_alpha(config.grid.alpha), 0.5)
        .with_dash(DashPattern::Short);

    // Ticks point into the frame (+1) or away from it (-1).
    let dir = if config.axes.tick_direction == "in" { 1.0 } else { -1.0 };
    let outward = if dir > 0.0 { 0.0 } else { config.axes.tick_length };
    let tl = config.axes.tick_length * dir;
    let mtl = config.axes.minor_tick_length * dir;

    canvas.line(area.left, area.top, area.right(), area.top, &frame_style);
    canvas.line(area.left, area.bottom(), area.right(), area.bottom(), &frame_style);
    canvas.line(area.left, area.top, area.left, area.bottom(), &frame_style);
    canvas.line(area.right(), area.top, area.right(), area.bottom(), &frame_style);

    // --- X axis ---
    let x_label_style = TextStyle {
        size: config.font.tick_size,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        if !x_axis.contains(val) {
            continue;
        }
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        if config.grid.show {
            canvas.line(px, area.top, px, area.bottom(), &grid_style);
        }
        canvas.line(px, area.bottom(), px, area.bottom() - tl, &tick_style);
        if config.axes.show_top_ticks {
            canvas.line(px, area.top, px, area.top + tl, &tick_style);
        }
        if let Some(label) = x_axis.tick_labels.get(i) {
            canvas.text(px, area.bottom() + outward + 3.0, label, &x_label_style);
        }
    }
    for &val in x_axis.minor_ticks.iter().filter(|v| x_axis.contains(**v)) {
        let px = x_axis.data_to_pixel(val, area.left, area.right());
        canvas.line(px, area.bottom(), px, area.bottom() - mtl, &minor_tick_style);
    }

    // --- Y axis ---
    let y_label_style = TextStyle {
        size: config.font.tick_size,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let mut max_tick_w: f64 = 0.0;
    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        if !y_axis.contains(val) {
            continue;
        }
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        if config.grid.show {
            canvas.line(area.left, py, area.right(), py, &grid_style);
        }
        canvas.line(area.left, py, area.left + tl, py, &tick_style);
        if config.axes.show_right_ticks {
            canvas.line(area.right(), py, area.right() - tl, py, &tick_style);
        }
        if let Some(label) = y_axis.tick_labels.get(i) {
            max_tick_w = max_tick_w.max(canvas.measure_text(label, &y_label_style).width);
            canvas.text(area.left - outward - 4.0, py, label, &y_label_style);
        }
    }
    for &val in y_axis.minor_ticks.iter().filter(|v| y_axis.contains(**v)) {
        let py = y_axis.data_to_pixel(val, area.bottom(), area.top);
        canvas.line(area.left, py, area.left + mtl, py, &minor_tick_style);
    }

    // --- Axis labels ---
    let label_style = TextStyle {
        size: config.font.label_size,
        anchor: TextAnchor::Middle,
        ..Default::default()
    };
    let mut lowest = area.bottom() + outward + 3.0 + config.font.tick_size;
    if !x_axis.label.is_empty() {
        let label_y = lowest + config.font.label_size + 4.0;
        canvas.text(area.left + area.width / 2.0, label_y, &x_axis.label, &label_style);
        lowest = label_y + 4.0;
    }
    if !y_axis.label.is_empty() {
        let label_x = area.left - outward - 4.0 - max_tick_w - 8.0 - config.font.label_size / 2.0;
        let label_y = area.top + area.height / 2.0;
        canvas.text_rotated(label_x, label_y, &y_axis.label, &label_style, -90.0);
    }

    lowest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_ticks_are_drawn() {
        let cfg = VizConfig::default();
        let mut canvas = Canvas::new(400.0, 300.0).unwrap();
        let area = PlotArea { left: 60.0, top: 20.0, width: 320.0, height: 220.0 };
        let x = Axis::periods(-2, 2, 0.5, 10).with_label("Periods since the event");
        let y = Axis::auto_linear(-1.0, 1.0, 5).with_label("Effect");

        let lowest = draw_axes(&mut canvas, &area, &x, &y, &cfg);
        assert!(lowest > area.bottom());

        let svg = canvas.finish_svg();
        assert!(svg.contains(">Periods since the event</text>"));
        assert!(svg.contains("rotate(-90.0"));
        assert!(svg.contains(">-2</text>"));
    }
}
