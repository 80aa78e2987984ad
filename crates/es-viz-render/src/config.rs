use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::color::Color;
use crate::primitives::MarkerShape;
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub colors: ColorsConfig,
    pub palette: String,
    /// Per-series colour overrides, keyed by series name.
    pub series_colors: HashMap<String, Color>,
    /// Per-series marker overrides, keyed by series name.
    pub series_markers: HashMap<String, MarkerShape>,
    pub markers: MarkersConfig,
    pub legend: LegendConfig,
    pub output: OutputConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Classic.base_config()
    }
}

impl VizConfig {
    pub fn palette_colors(&self) -> Vec<Color> {
        crate::color::palette_colors(&self.palette)
    }

    /// Colour of the `idx`-th estimate series named `name`.
    pub fn series_color(&self, name: &str, idx: usize) -> Color {
        if let Some(c) = self.series_colors.get(name) {
            return *c;
        }
        let palette = self.palette_colors();
        palette.get(idx % palette.len().max(1)).copied().unwrap_or(Color::BLACK)
    }

    /// Marker shape of the `idx`-th estimate series named `name`.
    pub fn series_marker(&self, name: &str, idx: usize) -> MarkerShape {
        self.series_markers
            .get(name)
            .copied()
            .unwrap_or(MarkerShape::CYCLE[idx % MarkerShape::CYCLE.len()])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 576.0,  // 8" * 72
            height: 360.0, // 5" * 72
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub title_size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 10.0, title_size: 13.0, label_size: 11.0, tick_size: 9.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
    /// Padding added on both sides of the x range, in periods.
    pub x_padding: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
            x_padding: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: true, color: Color::hex("#cbd5e1"), alpha: 0.55 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Truth series line + markers.
    pub truth: Color,
    /// Horizontal `y = 0` line.
    pub zero_line: Color,
    /// Dashed treatment-onset line.
    pub onset_line: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            truth: Color::hex("#111827"),
            zero_line: Color::hex("#6b7280"),
            onset_line: Color::hex("#9ca3af"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkersConfig {
    pub size: f64,
    pub cap_width: f64,
    pub error_bar_width: f64,
    pub truth_line_width: f64,
}

impl Default for MarkersConfig {
    fn default() -> Self {
        Self { size: 3.0, cap_width: 4.0, error_bar_width: 1.0, truth_line_width: 1.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    TopLeft,
    TopRight,
    Bottom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub position: LegendPosition,
    pub frame: bool,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self { position: LegendPosition::TopLeft, frame: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dpi: 200 }
    }
}

/// Resolve a VizConfig from optional YAML string.
///
/// A `theme:` key selects the base preset; every other key overrides it.
pub fn resolve_config(user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let Some(yaml) = user_yaml else {
        return Ok(VizConfig::default());
    };

    #[derive(Deserialize)]
    struct ThemeOnly {
        #[serde(default)]
        theme: Option<String>,
    }
    let theme: ThemeOnly =
        serde_yaml_ng::from_str(yaml).map_err(|e| crate::RenderError::Config(e.to_string()))?;
    let base = theme.theme.as_deref().map(BuiltinTheme::parse).unwrap_or(BuiltinTheme::Classic);

    let base_value = serde_yaml_ng::to_value(base.base_config())
        .map_err(|e| crate::RenderError::Config(e.to_string()))?;
    let user_value: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(yaml).map_err(|e| crate::RenderError::Config(e.to_string()))?;
    let merged = merge_yaml(base_value, user_value);
    serde_yaml_ng::from_value(merged).map_err(|e| crate::RenderError::Config(e.to_string()))
}

/// Recursive mapping merge; `over` wins on conflicts.
fn merge_yaml(base: serde_yaml_ng::Value, over: serde_yaml_ng::Value) -> serde_yaml_ng::Value {
    use serde_yaml_ng::Value;
    match (base, over) {
        (Value::Mapping(mut b), Value::Mapping(o)) => {
            for (k, v) in o {
                let merged = match b.remove(&k) {
                    Some(bv) => merge_yaml(bv, v),
                    None => v,
                };
                b.insert(k, merged);
            }
            Value::Mapping(b)
        }
        (_, o) => o,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_classic() {
        let cfg = resolve_config(None).unwrap();
        assert_eq!(cfg.theme, "classic");
        assert_eq!(cfg.palette, "okabe_ito");
    }

    #[test]
    fn yaml_overrides_fields() {
        let yaml = "figure:\n  width: 400\nseries_colors:\n  TWFE OLS: \"#ff0000\"\n";
        let cfg = resolve_config(Some(yaml)).unwrap();
        assert_eq!(cfg.figure.width, 400.0);
        assert_eq!(cfg.figure.height, FigureConfig::default().height);
        assert_eq!(cfg.series_color("TWFE OLS", 3), Color::rgb(255, 0, 0));
    }

    #[test]
    fn theme_key_selects_preset() {
        let cfg = resolve_config(Some("theme: minimal\n")).unwrap();
        assert_eq!(cfg.theme, "minimal");
        assert!(!cfg.grid.show);

        let cfg = resolve_config(Some("theme: minimal\ngrid:\n  show: true\n")).unwrap();
        assert!(cfg.grid.show);
    }

    #[test]
    fn bad_yaml_is_a_config_error() {
        let err = resolve_config(Some("figure: [1, 2")).unwrap_err();
        assert!(matches!(err, crate::RenderError::Config(_)));
        let err = resolve_config(Some("colors:\n  truth: notacolor\n")).unwrap_err();
        assert!(matches!(err, crate::RenderError::Config(_)));
    }

    #[test]
    fn series_styles_cycle() {
        let cfg = VizConfig::default();
        let n = cfg.palette_colors().len();
        assert_eq!(cfg.series_color("a", 0), cfg.series_color("b", n));
        assert_eq!(cfg.series_marker("a", 1), MarkerShape::Square);
        assert_eq!(cfg.series_marker("a", 4), MarkerShape::Circle);
    }
}
