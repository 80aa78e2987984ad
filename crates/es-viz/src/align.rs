//! Raw estimator output → signed relative time.
//!
//! Rules per labelling convention:
//!
//! - **Signed**: labels already are `K`. A declared `reference` missing from
//!   the entries is synthesized as a `(K, 0, 0)` anchor; if present, the
//!   entry is kept and flagged.
//! - **Split**: lag `l` is `K = l` (`l >= 0`), lead `l` is `K = -l`
//!   (`l >= 1`). Lead `reference_lead` is omitted by the estimator and
//!   synthesized as the anchor. Any other gap in `lags 0..=max` or
//!   `leads 1..=max` is an error.
//!
//! Labels beyond [`MAX_RELATIVE_TIME`] and non-finite or negative variances
//! are rejected before any decoding.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use es_core::{Error, EstimatorResult, LabeledEstimate, RawSeries, Result};

use crate::series::{AlignedPoint, AlignedSeries, SeriesKind, MAX_RELATIVE_TIME};

/// Align every estimator output, preserving input order.
///
/// Fails on the first malformed series and on duplicate estimator names.
pub fn align(outputs: &[EstimatorResult]) -> Result<Vec<AlignedSeries>> {
    check_unique_names(outputs.iter().map(|o| o.estimator.as_str()))?;
    outputs.iter().map(|o| align_series(&o.estimator, &o.series)).collect()
}

/// Align every estimator output, setting malformed ones aside.
///
/// Returns the aligned series in input order plus `(estimator, error)` for
/// each failure. A name already used by an earlier output counts as a
/// failure of the later one.
pub fn align_isolated(outputs: &[EstimatorResult]) -> (Vec<AlignedSeries>, Vec<(String, Error)>) {
    let mut aligned = Vec::with_capacity(outputs.len());
    let mut failures = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for out in outputs {
        if !seen.insert(out.estimator.as_str()) {
            let err = Error::Validation(format!("duplicate estimator name '{}'", out.estimator));
            log::warn!("skipping series: {err}");
            failures.push((out.estimator.clone(), err));
            continue;
        }
        match align_series(&out.estimator, &out.series) {
            Ok(series) => aligned.push(series),
            Err(err) => {
                log::warn!("skipping series '{}': {err}", out.estimator);
                failures.push((out.estimator.clone(), err));
            }
        }
    }

    (aligned, failures)
}

/// Align one raw series.
pub fn align_series(name: &str, raw: &RawSeries) -> Result<AlignedSeries> {
    check_labels(name, raw)?;
    let points = match raw {
        RawSeries::Signed { entries, reference } => align_signed(name, entries, *reference)?,
        RawSeries::Split { lags, leads, reference_lead } => {
            align_split(name, lags, leads, *reference_lead)?
        }
    };
    for p in &points {
        p.check(name)?;
    }
    log::debug!("aligned '{name}' ({}): {} points", raw.convention(), points.len());
    Ok(AlignedSeries { name: name.to_string(), kind: SeriesKind::Estimate, points })
}

fn check_labels(name: &str, raw: &RawSeries) -> Result<()> {
    let labels: Vec<i64> = match raw {
        RawSeries::Signed { entries, reference } => {
            entries.iter().map(|e| e.label).chain(*reference).collect()
        }
        RawSeries::Split { lags, leads, reference_lead } => lags
            .iter()
            .chain(leads)
            .map(|e| e.label)
            .chain(std::iter::once(*reference_lead))
            .collect(),
    };
    match labels.into_iter().find(|l| l.unsigned_abs() > MAX_RELATIVE_TIME.unsigned_abs()) {
        Some(l) => Err(Error::Validation(format!(
            "estimator '{name}': label {l} outside ±{MAX_RELATIVE_TIME}"
        ))),
        None => Ok(()),
    }
}

fn check_unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::Validation(format!("duplicate estimator name '{name}'")));
        }
    }
    Ok(())
}

fn insert_unique(
    name: &str,
    by_k: &mut BTreeMap<i64, AlignedPoint>,
    k: i64,
    e: &LabeledEstimate,
) -> Result<()> {
    if by_k.insert(k, AlignedPoint::estimate(k, e.estimate, e.variance)).is_some() {
        return Err(Error::DuplicateRelativeTime { estimator: name.to_string(), relative_time: k });
    }
    Ok(())
}

fn align_signed(
    name: &str,
    entries: &[LabeledEstimate],
    reference: Option<i64>,
) -> Result<Vec<AlignedPoint>> {
    let mut by_k = BTreeMap::new();
    for e in entries {
        insert_unique(name, &mut by_k, e.label, e)?;
    }
    if let Some(r) = reference {
        by_k.entry(r).and_modify(|p| p.is_reference = true).or_insert(AlignedPoint::reference(r));
    }
    Ok(by_k.into_values().collect())
}

fn align_split(
    name: &str,
    lags: &[LabeledEstimate],
    leads: &[LabeledEstimate],
    reference_lead: i64,
) -> Result<Vec<AlignedPoint>> {
    if reference_lead < 1 {
        return Err(Error::Validation(format!(
            "estimator '{name}': reference lead must be >= 1, got {reference_lead}"
        )));
    }
    if let Some(bad) = lags.iter().find(|e| e.label < 0) {
        return Err(Error::Validation(format!(
            "estimator '{name}': lag index {} is negative",
            bad.label
        )));
    }
    if let Some(bad) = leads.iter().find(|e| e.label < 1) {
        return Err(Error::Validation(format!(
            "estimator '{name}': lead index {} must be >= 1",
            bad.label
        )));
    }

    let mut by_k = BTreeMap::new();
    for e in lags {
        insert_unique(name, &mut by_k, e.label, e)?;
    }
    for e in leads {
        insert_unique(name, &mut by_k, -e.label, e)?;
    }

    let reference_k = -reference_lead;
    let mut expected: BTreeSet<i64> = BTreeSet::new();
    if let Some(max_lag) = lags.iter().map(|e| e.label).max() {
        expected.extend(0..=max_lag);
    }
    if let Some(max_lead) = leads.iter().map(|e| e.label).max() {
        expected.extend((1..=max_lead).map(|l| -l));
    }
    let missing: Vec<i64> =
        expected.into_iter().filter(|k| *k != reference_k && !by_k.contains_key(k)).collect();
    if !missing.is_empty() {
        return Err(Error::MissingReferencePeriod { estimator: name.to_string(), missing });
    }

    by_k.entry(reference_k)
        .and_modify(|p| p.is_reference = true)
        .or_insert(AlignedPoint::reference(reference_k));
    Ok(by_k.into_values().collect())
}
