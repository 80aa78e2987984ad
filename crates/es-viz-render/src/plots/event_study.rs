use es_viz::{AlignedSeries, ComparisonArtifact};

use crate::canvas::Canvas;
use crate::config::{LegendPosition, VizConfig};
use crate::header::draw_title;
use crate::layout::axes::Axis;
use crate::layout::legend::{LegendEntry, LegendKind, bottom_legend_height, draw_legend};
use crate::layout::margins::PlotArea;
use crate::options::{MarkerPlacement, RenderOptions, place_markers};
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;

/// Treatment onset sits between the last lead and period 0.
const ONSET_X: f64 = -0.5;

/// Vertical confidence interval of one point, in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBarSpan {
    pub x: f64,
    pub lo: f64,
    pub hi: f64,
}

/// Error bars of one series: `estimate ± z·se` at the jittered x.
///
/// Normalization anchors and points without a variance get no bar.
pub fn error_bars(
    series: &AlignedSeries,
    placements: &[MarkerPlacement],
    z: f64,
) -> Vec<ErrorBarSpan> {
    if series.is_truth() {
        return Vec::new();
    }
    series
        .points
        .iter()
        .zip(placements)
        .filter(|(p, _)| !p.is_reference)
        .filter_map(|(p, m)| {
            let se = p.std_err()?;
            (se > 0.0).then(|| ErrorBarSpan { x: m.x, lo: p.estimate - z * se, hi: p.estimate + z * se })
        })
        .collect()
}

/// Data-space y extent covering every marker and error bar, plus zero.
fn y_extent(artifact: &ComparisonArtifact, z: f64) -> (f64, f64) {
    let mut lo = 0.0_f64;
    let mut hi = 0.0_f64;
    for p in artifact.series.iter().flat_map(|s| s.points.iter()) {
        let half = p.std_err().map(|se| z * se).unwrap_or(0.0);
        if (p.estimate - half).is_finite() {
            lo = lo.min(p.estimate - half);
        }
        if (p.estimate + half).is_finite() {
            hi = hi.max(p.estimate + half);
        }
    }
    let pad = (hi - lo).abs() * 0.05;
    (lo - pad, hi + pad)
}

fn legend_entries(artifact: &ComparisonArtifact, config: &VizConfig) -> Vec<LegendEntry> {
    let mut est_idx = 0;
    artifact
        .series
        .iter()
        .map(|s| {
            if s.is_truth() {
                LegendEntry {
                    label: s.name.clone(),
                    color: config.colors.truth,
                    kind: LegendKind::LineMarker(MarkerShape::Circle),
                }
            } else {
                let entry = LegendEntry {
                    label: s.name.clone(),
                    color: config.series_color(&s.name, est_idx),
                    kind: LegendKind::MarkerWithBar(config.series_marker(&s.name, est_idx)),
                };
                est_idx += 1;
                entry
            }
        })
        .collect()
}

/// Render the estimator comparison chart to an SVG string.
pub fn render(
    artifact: &ComparisonArtifact,
    options: &RenderOptions,
    config: &VizConfig,
) -> crate::Result<String> {
    artifact.validate()?;
    let Some((k_lo, k_hi)) = artifact.x_range() else {
        return Ok(empty_svg());
    };

    let z = options.resolve_z(artifact)?;
    let placements = place_markers(&artifact.series, options)?;
    let max_offset = options
        .series_offsets(artifact.series.len())?
        .iter()
        .fold(0.0_f64, |m, dx| m.max(dx.abs()));

    let mut canvas = Canvas::new(config.figure.width, config.figure.height)?;

    let x_axis = Axis::periods(k_lo, k_hi, config.axes.x_padding + max_offset, 20)
        .with_label(artifact.x_label.as_str());
    let (y_lo, y_hi) = y_extent(artifact, z);
    let y_axis = Axis::auto_linear(y_lo, y_hi, 6).with_label(artifact.y_label.as_str());

    let entries = legend_entries(artifact, config);
    let reserve = if config.legend.position == LegendPosition::Bottom {
        bottom_legend_height(&canvas, &entries, config.font.size, canvas.width - 40.0)
    } else {
        0.0
    };
    let area = PlotArea::auto(&canvas, &y_axis, &x_axis, !artifact.title.is_empty(), reserve, config);

    draw_title(&mut canvas, &area, &artifact.title, config);
    let lowest = draw_axes(&mut canvas, &area, &x_axis, &y_axis, config);

    let px = |x: f64| x_axis.data_to_pixel(x, area.left, area.right());
    let py = |y: f64| y_axis.data_to_pixel(y, area.bottom(), area.top);

    canvas.push_clip(area.left, area.top, area.width, area.height);

    if y_axis.contains(0.0) {
        let y0 = py(0.0);
        canvas.line(area.left, y0, area.right(), y0, &LineStyle::solid(config.colors.zero_line, 0.8));
    }
    if x_axis.contains(ONSET_X) {
        let x0 = px(ONSET_X);
        canvas.line(x0, area.top, x0, area.bottom(), &LineStyle::dashed(config.colors.onset_line, 0.8));
    }

    // Truth underneath the estimates.
    for (series, placed) in artifact.series.iter().zip(&placements).filter(|(s, _)| s.is_truth()) {
        let color = config.colors.truth;
        let pts: Vec<(f64, f64)> = placed.iter().map(|m| (px(m.x), py(m.y))).collect();
        canvas.polyline(&pts, &LineStyle::solid(color, config.markers.truth_line_width));
        for &(x, y) in &pts {
            canvas.marker(
                x,
                y,
                &MarkerStyle::solid(MarkerShape::Circle, color, config.markers.size * 0.8),
            );
        }
        log::debug!("drew truth series '{}' ({} points)", series.name, pts.len());
    }

    let mut est_idx = 0;
    for (series, placed) in artifact.series.iter().zip(&placements) {
        if series.is_truth() {
            continue;
        }
        let color = config.series_color(&series.name, est_idx);
        let shape = config.series_marker(&series.name, est_idx);
        est_idx += 1;

        let bar_style = LineStyle::solid(color, config.markers.error_bar_width);
        for bar in error_bars(series, placed, z) {
            canvas.error_bar(px(bar.x), py(bar.lo), py(bar.hi), config.markers.cap_width, &bar_style);
        }
        for (point, m) in series.points.iter().zip(placed) {
            canvas.marker(
                px(m.x),
                py(m.y),
                &MarkerStyle {
                    shape,
                    radius: config.markers.size,
                    color,
                    // Normalization anchor.
                    hollow: point.is_reference,
                },
            );
        }
    }

    canvas.pop_clip();

    draw_legend(
        &mut canvas,
        &area,
        &entries,
        config.font.size,
        config.legend.position,
        config.legend.frame,
        lowest,
    );

    Ok(canvas.finish_svg())
}

fn empty_svg() -> String {
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><text x="10" y="30">No event study series</text></svg>"#.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use es_viz::{AlignedPoint, SeriesKind};
    use std::collections::BTreeMap;

    fn estimate_series(name: &str) -> AlignedSeries {
        AlignedSeries {
            name: name.into(),
            kind: SeriesKind::Estimate,
            points: vec![
                AlignedPoint::estimate(-2, 0.1, 0.04),
                AlignedPoint::reference(-1),
                AlignedPoint::estimate(0, 1.0, 0.01),
                AlignedPoint::estimate(1, 2.0, 0.09),
            ],
        }
    }

    fn artifact() -> ComparisonArtifact {
        let truth: BTreeMap<i64, f64> = [(0, 1.0), (1, 2.0)].into_iter().collect();
        ComparisonArtifact::from_parts(
            Some(AlignedSeries::truth("True effect", &truth)),
            vec![estimate_series("TWFE OLS"), estimate_series("Stacked")],
            None,
        )
        .unwrap()
    }

    #[test]
    fn reference_point_has_no_bar() {
        let s = estimate_series("a");
        let opts = RenderOptions::default();
        let placed = place_markers(std::slice::from_ref(&s), &opts).unwrap();
        let bars = error_bars(&s, &placed[0], 2.0);
        assert_eq!(bars.len(), 3);
        assert!(bars.iter().all(|b| (b.x - -1.0).abs() > 1e-9));

        // K = 1: 2.0 ± 2 * 0.3
        assert_abs_diff_eq!(bars[2].lo, 1.4, epsilon = 1e-12);
        assert_abs_diff_eq!(bars[2].hi, 2.6, epsilon = 1e-12);
    }

    #[test]
    fn truth_series_has_no_bars() {
        let art = artifact();
        let placed = place_markers(&art.series, &RenderOptions::default()).unwrap();
        assert!(error_bars(&art.series[0], &placed[0], 1.96).is_empty());
        assert_eq!(error_bars(&art.series[1], &placed[1], 1.96).len(), 3);
    }

    #[test]
    fn bars_follow_jitter() {
        let s = estimate_series("a");
        let opts = RenderOptions::default().with_offsets(vec![0.1]);
        let placed = place_markers(std::slice::from_ref(&s), &opts).unwrap();
        let bars = error_bars(&s, &placed[0], 1.0);
        assert_abs_diff_eq!(bars[0].x, -1.9, epsilon = 1e-12);
    }

    #[test]
    fn svg_has_reference_lines_and_legend() {
        let svg = render(&artifact(), &RenderOptions::default(), &VizConfig::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("clip-path=\"url(#clip0)\""));
        for label in ["True effect", "TWFE OLS", "Stacked", "Periods since the event"] {
            assert!(svg.contains(label), "missing {label}");
        }
    }

    #[test]
    fn bottom_legend_renders() {
        let mut cfg = VizConfig::default();
        cfg.legend.position = LegendPosition::Bottom;
        let svg = render(&artifact(), &RenderOptions::default(), &cfg).unwrap();
        assert!(svg.contains("Stacked"));
    }

    #[test]
    fn empty_artifact_renders_placeholder() {
        let svg = render(&ComparisonArtifact::default(), &RenderOptions::default(), &VizConfig::default())
            .unwrap();
        assert!(svg.contains("No event study series"));
    }

    #[test]
    fn wrong_offset_count_is_rejected() {
        let opts = RenderOptions::default().with_offsets(vec![0.0]);
        assert!(render(&artifact(), &opts, &VizConfig::default()).is_err());
    }
}
