use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    /// Light grid, Okabe–Ito palette, legend top-left.
    Classic,
    /// No grid, smaller figure.
    Minimal,
    /// Boxed axes with inward ticks and the Stata palette.
    Stata,
}

impl BuiltinTheme {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "stata" => Self::Stata,
            "classic" => Self::Classic,
            other => {
                log::warn!("unknown theme '{other}', using classic");
                Self::Classic
            }
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Classic => classic(),
            Self::Minimal => minimal(),
            Self::Stata => stata(),
        }
    }
}

fn classic() -> VizConfig {
    VizConfig {
        theme: "classic".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        colors: ColorsConfig::default(),
        palette: "okabe_ito".into(),
        series_colors: Default::default(),
        series_markers: Default::default(),
        markers: MarkersConfig::default(),
        legend: LegendConfig::default(),
        output: OutputConfig::default(),
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        figure: FigureConfig { width: 468.0, height: 302.4 },
        font: FontConfig { size: 9.0, title_size: 11.0, label_size: 10.0, tick_size: 8.0 },
        grid: GridConfig { show: false, ..GridConfig::default() },
        legend: LegendConfig { frame: false, ..LegendConfig::default() },
        palette: "tableau10".into(),
        ..classic()
    }
}

fn stata() -> VizConfig {
    VizConfig {
        theme: "stata".into(),
        axes: AxesConfig {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            minor_tick_length: 3.0,
            ..AxesConfig::default()
        },
        grid: GridConfig { show: true, color: Color::hex("#eaf2f3"), alpha: 1.0 },
        legend: LegendConfig { position: LegendPosition::Bottom, frame: true },
        palette: "s2color".into(),
        ..classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!(BuiltinTheme::parse("Minimal"), BuiltinTheme::Minimal);
        assert_eq!(BuiltinTheme::parse("stata"), BuiltinTheme::Stata);
        assert_eq!(BuiltinTheme::parse("whatever"), BuiltinTheme::Classic);
    }

    #[test]
    fn presets_carry_their_name() {
        for theme in [BuiltinTheme::Classic, BuiltinTheme::Minimal, BuiltinTheme::Stata] {
            let cfg = theme.base_config();
            assert_eq!(BuiltinTheme::parse(&cfg.theme), theme);
        }
    }
}
