use crate::primitives::TextStyle;

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Advance width of `ch` in ems for a generic sans-serif face.
fn advance_em(ch: char) -> f64 {
    match ch {
        'i' | 'l' | 'j' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | ' ' | '-' => 0.35,
        'm' | 'w' | 'M' | 'W' => 0.85,
        '0'..='9' => 0.56,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii() => 0.52,
        _ => 0.6,
    }
}

/// Approximate text extent in points.
///
/// The SVG names generic font families and the PNG rasterizer picks a system
/// face, so glyph metrics are not known here. Widths follow average
/// Helvetica/DejaVu advances, which is close enough for margin and legend
/// sizing.
pub fn measure_text(text: &str, style: &TextStyle) -> TextMetrics {
    let weight = if style.bold { 1.07 } else { 1.0 };
    let ems: f64 = text.chars().map(advance_em).sum();
    TextMetrics { width: ems * style.size * weight, height: style.size * 1.2, ascent: style.size * 0.8 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_hello() {
        let m = measure_text("Hello", &TextStyle { size: 12.0, ..Default::default() });
        assert!(m.width > 20.0 && m.width < 40.0, "width={}", m.width);
        assert!(m.height > 8.0);
        assert!(m.ascent > 0.0);
    }

    #[test]
    fn bold_is_wider() {
        let regular = TextStyle { size: 12.0, ..Default::default() };
        let bold = TextStyle { bold: true, ..regular.clone() };
        assert!(measure_text("Test", &bold).width > measure_text("Test", &regular).width);
    }

    #[test]
    fn empty_has_zero_width() {
        assert_eq!(measure_text("", &TextStyle::default()).width, 0.0);
    }
}
