// ============================================================
// Layer 4: Train/Validation Splitter
// ============================================================
// Stratified split: every class keeps (approximately) the same
// proportion in the training and validation sets.
//
// Per class:
//   1. Shuffle the class's samples with a seeded RNG
//   2. Move round(n · val_fraction) of them to validation,
//      clamped so each side keeps at least one sample
// Then both halves are shuffled so batches mix classes.
//
// The RNG is seeded (default 42), so the same bundle always
// splits the same way.
//
// A class with fewer than two samples cannot be represented
// on both sides and is reported as an error.

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeMap;

/// Split `samples` into (train, validation) by class label.
///
/// # Arguments
/// * `label_of`     - Extracts the class label of a sample
/// * `val_fraction` - Proportion held out for validation, e.g. 0.2
/// * `seed`         - RNG seed for reproducible splits
pub fn stratified_split<T, F>(
    samples:      Vec<T>,
    label_of:     F,
    val_fraction: f64,
    seed:         u64,
) -> Result<(Vec<T>, Vec<T>)>
where
    F: Fn(&T) -> usize,
{
    ensure!(
        val_fraction > 0.0 && val_fraction < 1.0,
        "Validation fraction must be in (0, 1), got {val_fraction}"
    );

    let total = samples.len();
    let mut rng = StdRng::seed_from_u64(seed);

    // BTreeMap keeps class iteration order stable for a given seed
    let mut by_class: BTreeMap<usize, Vec<T>> = BTreeMap::new();
    for sample in samples {
        by_class.entry(label_of(&sample)).or_default().push(sample);
    }

    let mut train = Vec::with_capacity(total);
    let mut val   = Vec::new();

    for (label, mut group) in by_class {
        ensure!(
            group.len() >= 2,
            "Class {label} has only {} sample(s); at least 2 are needed for a stratified split",
            group.len()
        );

        group.shuffle(&mut rng);

        let n_val = ((group.len() as f64) * val_fraction).round() as usize;
        let n_val = n_val.clamp(1, group.len() - 1);

        // split_off(n) keeps [0..n) in `group` and returns the rest
        let held_out = group.split_off(group.len() - n_val);
        train.extend(group);
        val.extend(held_out);
    }

    train.shuffle(&mut rng);
    val.shuffle(&mut rng);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        train.len(),
        val.len(),
        (train.len() * 100) / total.max(1),
        (val.len() * 100) / total.max(1),
    );

    Ok((train, val))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// (id, label) pairs: `a` samples of class 0, `b` of class 1
    fn items(a: usize, b: usize) -> Vec<(usize, usize)> {
        (0..a).map(|i| (i, 0)).chain((0..b).map(|i| (a + i, 1))).collect()
    }

    fn count(v: &[(usize, usize)], label: usize) -> usize {
        v.iter().filter(|(_, l)| *l == label).count()
    }

    #[test]
    fn test_correct_split_sizes() {
        let (train, val) = stratified_split(items(50, 50), |s| s.1, 0.2, 42).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);
    }

    #[test]
    fn test_class_proportions_preserved() {
        let (train, val) = stratified_split(items(80, 20), |s| s.1, 0.2, 42).unwrap();
        assert_eq!(count(&val, 0), 16);
        assert_eq!(count(&val, 1), 4);
        assert_eq!(count(&train, 0), 64);
        assert_eq!(count(&train, 1), 16);
    }

    #[test]
    fn test_all_items_preserved() {
        let (train, val) = stratified_split(items(13, 7), |s| s.1, 0.2, 1).unwrap();
        let mut ids: Vec<usize> = train.iter().chain(val.iter()).map(|s| s.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = stratified_split(items(30, 30), |s| s.1, 0.2, 42).unwrap();
        let b = stratified_split(items(30, 30), |s| s.1, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_small_classes_keep_one_on_each_side() {
        let (train, val) = stratified_split(items(2, 3), |s| s.1, 0.2, 42).unwrap();
        assert_eq!(count(&val, 0), 1);
        assert_eq!(count(&val, 1), 1);
        assert_eq!(train.len(), 3);
    }

    #[test]
    fn test_singleton_class_is_an_error() {
        assert!(stratified_split(items(10, 1), |s| s.1, 0.2, 42).is_err());
    }

    #[test]
    fn test_invalid_fraction() {
        assert!(stratified_split(items(10, 10), |s| s.1, 1.0, 42).is_err());
        assert!(stratified_split(items(10, 10), |s| s.1, 0.0, 42).is_err());
    }

    #[test]
    fn test_empty_dataset() {
        let (train, val) = stratified_split(Vec::<(usize, usize)>::new(), |s| s.1, 0.2, 42).unwrap();
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
