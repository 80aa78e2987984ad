//! Per-render options: CI critical value and marker jitter.

use es_viz::{AlignedSeries, ComparisonArtifact};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::RenderError;

/// Default horizontal distance between neighbouring series, in periods.
pub const DEFAULT_JITTER_STEP: f64 = 0.1;

/// Options that change what is drawn rather than how it looks.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Critical value for the error bars. Falls back to the artifact's `z`,
    /// then to the normal quantile of its `ci_level`.
    pub z: Option<f64>,
    /// Step between series offsets when `offsets` is not given.
    pub jitter_step: f64,
    /// Explicit per-series x offsets, one per artifact series.
    pub offsets: Option<Vec<f64>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { z: None, jitter_step: DEFAULT_JITTER_STEP, offsets: None }
    }
}

impl RenderOptions {
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_offsets(mut self, offsets: Vec<f64>) -> Self {
        self.offsets = Some(offsets);
        self
    }

    /// Critical value used for `artifact`.
    pub fn resolve_z(&self, artifact: &ComparisonArtifact) -> crate::Result<f64> {
        let z = match self.z.or(artifact.z) {
            Some(z) => z,
            None => z_for_level(artifact.ci_level)?,
        };
        if !(z.is_finite() && z > 0.0) {
            return Err(RenderError::Config(format!("z must be finite and > 0, got {z}")));
        }
        Ok(z)
    }

    /// X offset of each of `n` series, in series order.
    ///
    /// Without explicit offsets series `s` sits at `(s - (n-1)/2) * step`, so
    /// the group is centred on the integer period.
    pub fn series_offsets(&self, n: usize) -> crate::Result<Vec<f64>> {
        match &self.offsets {
            Some(offsets) if offsets.len() != n => Err(RenderError::Config(format!(
                "{} jitter offsets given for {n} series",
                offsets.len()
            ))),
            Some(offsets) => Ok(offsets.clone()),
            None => {
                let centre = (n as f64 - 1.0) / 2.0;
                Ok((0..n).map(|s| (s as f64 - centre) * self.jitter_step).collect())
            }
        }
    }
}

/// Two-sided normal critical value for confidence `level` (0.95 → 1.96).
pub fn z_for_level(level: f64) -> crate::Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(RenderError::Config(format!("confidence level must be in (0, 1), got {level}")));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| RenderError::Config(e.to_string()))?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}

/// Marker position in data space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPlacement {
    /// Unjittered relative time.
    pub relative_time: i64,
    /// Jittered x.
    pub x: f64,
    /// Estimate.
    pub y: f64,
}

/// Data-space marker positions, one vector per series.
pub fn place_markers(
    series: &[AlignedSeries],
    options: &RenderOptions,
) -> crate::Result<Vec<Vec<MarkerPlacement>>> {
    let offsets = options.series_offsets(series.len())?;
    Ok(series
        .iter()
        .zip(offsets)
        .map(|(s, dx)| {
            s.points
                .iter()
                .map(|p| MarkerPlacement {
                    relative_time: p.relative_time,
                    x: p.relative_time as f64 + dx,
                    y: p.estimate,
                })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use es_viz::{AlignedPoint, SeriesKind};

    fn series(name: &str, k: i64) -> AlignedSeries {
        AlignedSeries {
            name: name.into(),
            kind: SeriesKind::Estimate,
            points: vec![AlignedPoint::estimate(k, 0.5, 0.01)],
        }
    }

    #[test]
    fn explicit_offsets_shift_markers() {
        let opts = RenderOptions::default().with_offsets(vec![-0.1, 0.1]);
        let placed = place_markers(&[series("a", 2), series("b", 2)], &opts).unwrap();
        assert_abs_diff_eq!(placed[0][0].x, 1.9, epsilon = 1e-12);
        assert_abs_diff_eq!(placed[1][0].x, 2.1, epsilon = 1e-12);
        assert_eq!(placed[0][0].relative_time, 2);
    }

    #[test]
    fn default_offsets_are_centred() {
        let opts = RenderOptions::default();
        let two = opts.series_offsets(2).unwrap();
        assert_abs_diff_eq!(two[0], -0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(two[1], 0.05, epsilon = 1e-12);

        let three = opts.series_offsets(3).unwrap();
        assert_abs_diff_eq!(three[0], -0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(three[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(three[2], 0.1, epsilon = 1e-12);

        assert_eq!(opts.series_offsets(1).unwrap(), vec![0.0]);
    }

    #[test]
    fn offset_count_must_match() {
        let opts = RenderOptions::default().with_offsets(vec![0.1]);
        assert!(place_markers(&[series("a", 0), series("b", 0)], &opts).is_err());
    }

    #[test]
    fn z_from_level() {
        assert_abs_diff_eq!(z_for_level(0.95).unwrap(), 1.959964, epsilon = 1e-5);
        assert_abs_diff_eq!(z_for_level(0.90).unwrap(), 1.644854, epsilon = 1e-5);
        assert!(z_for_level(1.0).is_err());
    }

    #[test]
    fn z_precedence() {
        let art = ComparisonArtifact::default();
        assert_abs_diff_eq!(RenderOptions::default().resolve_z(&art).unwrap(), 1.959964, epsilon = 1e-5);

        let art = art.with_z(2.5);
        assert_eq!(RenderOptions::default().resolve_z(&art).unwrap(), 2.5);
        assert_eq!(RenderOptions::default().with_z(1.0).resolve_z(&art).unwrap(), 1.0);
        assert!(RenderOptions::default().with_z(-1.0).resolve_z(&art).is_err());
    }
}
