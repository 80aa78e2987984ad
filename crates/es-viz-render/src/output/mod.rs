#[cfg(feature = "png")]
pub mod png;
pub mod svg;

/// Output formats the renderer can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    /// Parse a format name or file extension (case-insensitive).
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            other => Err(crate::RenderError::Config(format!("unsupported output format: {other}"))),
        }
    }

    /// Format implied by a path's extension; no extension means SVG.
    pub fn from_path(path: &std::path::Path) -> crate::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => Self::parse(ext),
            None => Ok(Self::Svg),
        }
    }
}
