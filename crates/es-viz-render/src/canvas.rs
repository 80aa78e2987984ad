use std::fmt::Write as _;

use crate::color::Color;
use crate::primitives::*;
use crate::text::{TextMetrics, measure_text};

/// Font stack written into every `<text>`.
const FONT_FAMILY: &str = "DejaVu Sans, Helvetica, Arial, sans-serif";

/// SVG canvas in points (1pt = 1/72"), y growing downwards.
///
/// Every call serializes its element straight into the innermost open
/// buffer; [`Canvas::push_clip`] opens a nested buffer that becomes a
/// clipped `<g>` on [`Canvas::pop_clip`].
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    defs: String,
    /// Root buffer first, open clip groups after it.
    layers: Vec<(Option<String>, String)>,
    clip_count: usize,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> crate::Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(crate::RenderError::Layout(format!(
                "figure size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            defs: String::new(),
            layers: vec![(None, String::with_capacity(16 * 1024))],
            clip_count: 0,
        })
    }

    fn out(&mut self) -> &mut String {
        // `layers` always holds the root buffer.
        let last = self.layers.len() - 1;
        &mut self.layers[last].1
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        let out = self.out();
        let _ = write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#);
        fill_attrs(out, style);
        out.push_str("/>\n");
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        let out = self.out();
        let _ = write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#);
        fill_attrs(out, style);
        out.push_str("/>\n");
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], style: &Style) {
        let out = self.out();
        out.push_str(r#"<polygon points=""#);
        point_list(out, points);
        out.push('"');
        fill_attrs(out, style);
        out.push_str("/>\n");
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        let out = self.out();
        let _ = write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#);
        stroke_attrs(out, style);
        out.push_str("/>\n");
    }

    /// Open path through `points`; fewer than two points draw nothing.
    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        let out = self.out();
        out.push_str(r#"<polyline points=""#);
        point_list(out, points);
        out.push_str(r#"" fill="none""#);
        stroke_attrs(out, style);
        out.push_str("/>\n");
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.text_element(x, y, content, style, None);
    }

    /// Text rotated by `angle` degrees around its anchor.
    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.text_element(x, y, content, style, Some(angle));
    }

    fn text_element(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: Option<f64>) {
        let out = self.out();
        let _ = write!(
            out,
            r#"<text x="{x:.2}" y="{y:.2}" font-family="{FONT_FAMILY}" font-size="{:.1}" fill="{}" text-anchor="{}" dominant-baseline="{}""#,
            style.size,
            style.color.to_svg_fill(),
            style.anchor.svg_value(),
            style.baseline.svg_value(),
        );
        if style.bold {
            out.push_str(r#" font-weight="bold""#);
        }
        if let Some(angle) = angle {
            let _ = write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#);
        }
        out.push('>');
        escape_xml(out, content);
        out.push_str("</text>\n");
    }

    /// Vertical bar from `y_lo` to `y_hi` with caps `cap_width` wide.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, cap_width: f64, style: &LineStyle) {
        self.line(x, y_lo, x, y_hi, style);
        if cap_width > 0.0 {
            let half = cap_width / 2.0;
            for y in [y_lo, y_hi] {
                self.line(x - half, y, x + half, y, style);
            }
        }
    }

    pub fn marker(&mut self, x: f64, y: f64, marker: &MarkerStyle) {
        let style = if marker.hollow {
            Style::outlined(Color::WHITE, marker.color, 1.0)
        } else {
            Style::outlined(marker.color, marker.color, 0.5)
        };
        let r = marker.radius;
        match marker.shape {
            MarkerShape::Circle => self.circle(x, y, r, &style),
            MarkerShape::Square => self.rect(x - r, y - r, 2.0 * r, 2.0 * r, &style),
            MarkerShape::Triangle => {
                let h = r * 1.15;
                self.polygon(&[(x, y - h), (x + h, y + r * 0.85), (x - h, y + r * 0.85)], &style)
            }
            MarkerShape::Diamond => {
                let d = r * 1.3;
                self.polygon(&[(x, y - d), (x + d, y), (x, y + d), (x - d, y)], &style)
            }
        }
    }

    /// Clip everything drawn until the matching [`Canvas::pop_clip`] to the
    /// given rectangle. Returns the clip path id.
    pub fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> String {
        let id = format!("clip{}", self.clip_count);
        self.clip_count += 1;
        let _ = writeln!(
            self.defs,
            r#"<clipPath id="{id}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}"/></clipPath>"#
        );
        self.layers.push((Some(id.clone()), String::new()));
        id
    }

    pub fn pop_clip(&mut self) {
        if self.layers.len() < 2 {
            return;
        }
        if let Some((Some(id), body)) = self.layers.pop() {
            let out = self.out();
            let _ = writeln!(out, r#"<g clip-path="url(#{id})">"#);
            out.push_str(&body);
            out.push_str("</g>\n");
        }
    }

    pub fn measure_text(&self, content: &str, style: &TextStyle) -> TextMetrics {
        measure_text(content, style)
    }

    /// Serialize the document, closing any clip group left open.
    pub fn finish_svg(mut self) -> String {
        while self.layers.len() > 1 {
            self.pop_clip();
        }
        let body = std::mem::take(&mut self.layers[0].1);

        let mut svg = String::with_capacity(body.len() + self.defs.len() + 256);
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        );
        if !self.defs.is_empty() {
            svg.push_str("<defs>\n");
            svg.push_str(&self.defs);
            svg.push_str("</defs>\n");
        }
        let _ = writeln!(svg, r#"<rect width="{}" height="{}" fill="white"/>"#, self.width, self.height);
        svg.push_str(&body);
        svg.push_str("</svg>\n");
        svg
    }
}

fn point_list(out: &mut String, points: &[(f64, f64)]) {
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{x:.2},{y:.2}");
    }
}

fn escape_xml(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn fill_attrs(out: &mut String, style: &Style) {
    match style.fill {
        Some(fill) => {
            let _ = write!(out, r#" fill="{}""#, fill.to_svg_fill());
        }
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = style.stroke {
        let _ = write!(
            out,
            r#" stroke="{}" stroke-width="{:.2}""#,
            stroke.to_svg_fill(),
            style.stroke_width
        );
    }
}

fn stroke_attrs(out: &mut String, style: &LineStyle) {
    let _ = write!(out, r#" stroke="{}" stroke-width="{:.2}""#, style.color.to_svg_fill(), style.width);
    if let Some(dash) = style.dash {
        let _ = write!(out, r#" stroke-dasharray="{}""#, dash.dasharray());
    }
}
