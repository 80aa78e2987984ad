use crate::RenderError;

/// Rasterize an SVG document to PNG bytes at `dpi` (72 dpi = 1px per point).
///
/// Text is resolved against the system fonts; the SVG font stack falls back
/// to any installed sans-serif face.
pub fn svg_to_png(svg: &str, dpi: u32) -> crate::Result<Vec<u8>> {
    if dpi == 0 {
        return Err(RenderError::Config("dpi must be > 0".into()));
    }
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Png(e.to_string()))?;

    let scale = dpi as f32 / 72.0;
    let size = tree.size();
    let w = (size.width() * scale).ceil() as u32;
    let h = (size.height() * scale).ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| RenderError::Png(format!("failed to create {w}x{h} pixmap")))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| RenderError::Png(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_signature_and_size() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="72" height="36"><rect width="10" height="10" fill="red"/></svg>"#;
        let bytes = svg_to_png(svg, 144).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR width/height, big-endian.
        assert_eq!(u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 144);
        assert_eq!(u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), 72);
    }

    #[test]
    fn malformed_svg_is_an_error() {
        assert!(matches!(svg_to_png("<svg", 72), Err(RenderError::Png(_))));
    }
}
