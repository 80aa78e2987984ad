//! Core traits for EventSim
//!
//! Estimators are independent of one another: each reads the shared input
//! and returns its own raw series. The trait is generic over the input so
//! this crate does not depend on the simulator.

use crate::Result;
use crate::types::RawSeries;

/// An event-study estimator.
///
/// Implemented by the in-house two-way fixed-effects regression and by the
/// adapters that hand over pre-computed output from external packages.
pub trait Estimator<D: ?Sized> {
    /// Estimator name (used as the series label downstream).
    fn name(&self) -> &str;

    /// Run the estimator over `data`.
    fn estimate(&self, data: &D) -> Result<RawSeries>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LabeledEstimate;

    struct ConstantEstimator;

    impl Estimator<[f64]> for ConstantEstimator {
        fn name(&self) -> &str {
            "constant"
        }

        fn estimate(&self, data: &[f64]) -> Result<RawSeries> {
            let mean = data.iter().sum::<f64>() / data.len() as f64;
            Ok(RawSeries::Signed {
                entries: vec![LabeledEstimate::new(0, mean, 0.0)],
                reference: None,
            })
        }
    }

    #[test]
    fn test_trait_object() {
        let est: Box<dyn Estimator<[f64]>> = Box::new(ConstantEstimator);
        assert_eq!(est.name(), "constant");
        let raw = est.estimate(&[1.0, 3.0]).unwrap();
        assert_eq!(raw.len(), 1);
    }
}
