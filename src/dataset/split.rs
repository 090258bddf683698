//! Subject-grouped dataset splits.
//!
//! Every split keeps all rows of a child on the same side, so no subject
//! leaks between training and evaluation data.

use crate::core::OutputRow;
use crate::dataset::DatasetError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

/// Rows partitioned into train, optional validation, and test sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    pub train: Vec<OutputRow>,
    pub validation: Vec<OutputRow>,
    pub test: Vec<OutputRow>,
}

/// One fold of a grouped k-fold split.
#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<OutputRow>,
    pub validation: Vec<OutputRow>,
}

/// Distinct `child_id`s in order of first appearance.
fn subjects(rows: &[OutputRow]) -> Vec<&str> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|r| r.child_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect()
}

fn shuffled_subjects(rows: &[OutputRow], seed: u64) -> Vec<&str> {
    let mut ids = subjects(rows);
    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);
    ids
}

fn check_fraction(name: &str, fraction: f64) -> Result<(), DatasetError> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(DatasetError::Split(format!(
            "{name} fraction must lie strictly between 0 and 1, got {fraction}"
        )))
    }
}

/// Rows whose subject is in `held_out` versus the rest, both in table order.
fn partition(rows: &[OutputRow], held_out: &HashSet<&str>) -> (Vec<OutputRow>, Vec<OutputRow>) {
    rows.iter()
        .cloned()
        .partition(|r| !held_out.contains(r.child_id.as_str()))
}

/// Split rows into train and test sets by subject.
///
/// `ceil(subjects * test_fraction)` subjects go to the test set.
pub fn split_train_test(
    rows: &[OutputRow],
    test_fraction: f64,
    seed: u64,
) -> Result<Split, DatasetError> {
    check_fraction("test", test_fraction)?;
    let ids = shuffled_subjects(rows, seed);
    let n = ids.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;

    if n_test == 0 || n_test >= n {
        return Err(DatasetError::Split(format!(
            "cannot hold out {n_test} of {n} subjects"
        )));
    }

    let held_out: HashSet<&str> = ids[..n_test].iter().copied().collect();
    let (train, test) = partition(rows, &held_out);

    tracing::info!(
        subjects = n,
        test_subjects = n_test,
        train_rows = train.len(),
        test_rows = test.len(),
        "Split train/test"
    );

    Ok(Split {
        train,
        validation: Vec::new(),
        test,
    })
}

/// Split rows into train, validation and test sets by subject.
///
/// The test set is held out first; the validation fraction then applies to
/// the remaining subjects.
pub fn split_train_val_test(
    rows: &[OutputRow],
    test_fraction: f64,
    val_fraction: f64,
    seed: u64,
) -> Result<Split, DatasetError> {
    check_fraction("validation", val_fraction)?;
    let outer = split_train_test(rows, test_fraction, seed)?;
    let inner = split_train_test(&outer.train, val_fraction, seed)?;

    Ok(Split {
        train: inner.train,
        validation: inner.test,
        test: outer.test,
    })
}

/// Grouped k-fold split.
///
/// Subjects are shuffled and dealt into `k` contiguous folds; the first
/// `subjects % k` folds take one extra subject.
pub fn k_folds(rows: &[OutputRow], k: usize, seed: u64) -> Result<Vec<Fold>, DatasetError> {
    let ids = shuffled_subjects(rows, seed);
    let n = ids.len();
    if k < 2 || k > n {
        return Err(DatasetError::Split(format!(
            "k-fold needs 2 <= k <= {n} subjects, got k = {k}"
        )));
    }

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for index in 0..k {
        let size = base + usize::from(index < extra);
        let held_out: HashSet<&str> = ids[start..start + size].iter().copied().collect();
        let (train, validation) = partition(rows, &held_out);
        folds.push(Fold {
            index,
            train,
            validation,
        });
        start += size;
    }

    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Label;

    fn rows(subjects: usize, per_subject: usize) -> Vec<OutputRow> {
        (0..subjects)
            .flat_map(|s| {
                (0..per_subject).map(move |v| OutputRow {
                    video_key: format!("child-{s}/video-{v}"),
                    label: if s % 3 == 0 {
                        Label::Neurotypical
                    } else {
                        Label::Asd
                    },
                    child_id: format!("child-{s}"),
                    age: None,
                    gender: String::new(),
                    eye_directions: Vec::new(),
                    confidences: Vec::new(),
                    total_confidence: 0.5,
                    number_of_frames_with_face: v,
                })
            })
            .collect()
    }

    fn ids(rows: &[OutputRow]) -> HashSet<&str> {
        rows.iter().map(|r| r.child_id.as_str()).collect()
    }

    #[test]
    fn test_train_test_is_grouped() {
        let data = rows(10, 3);
        let split = split_train_test(&data, 0.2, 42).unwrap();

        assert_eq!(ids(&split.test).len(), 2);
        assert_eq!(ids(&split.train).len(), 8);
        assert!(ids(&split.train).is_disjoint(&ids(&split.test)));
        assert_eq!(split.train.len() + split.test.len(), data.len());
        assert!(split.validation.is_empty());
    }

    #[test]
    fn test_test_size_rounds_up() {
        let data = rows(7, 1);
        let split = split_train_test(&data, 0.2, 3).unwrap();
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_three_way_split_disjoint() {
        let data = rows(20, 2);
        let split = split_train_val_test(&data, 0.2, 0.25, 9).unwrap();

        let (train, val, test) = (ids(&split.train), ids(&split.validation), ids(&split.test));
        assert_eq!(test.len(), 4);
        assert_eq!(val.len(), 4);
        assert_eq!(train.len(), 12);
        assert!(train.is_disjoint(&val));
        assert!(train.is_disjoint(&test));
        assert!(val.is_disjoint(&test));
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let data = rows(15, 2);
        let a = split_train_test(&data, 0.3, 11).unwrap();
        let b = split_train_test(&data, 0.3, 11).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_degenerate_inputs() {
        assert!(split_train_test(&rows(1, 4), 0.2, 0).is_err());
        assert!(split_train_test(&rows(5, 1), 0.0, 0).is_err());
        assert!(split_train_test(&rows(5, 1), 1.0, 0).is_err());
        assert!(split_train_test(&[], 0.2, 0).is_err());
    }

    #[test]
    fn test_k_folds_cover_every_subject_once() {
        let data = rows(11, 2);
        let folds = k_folds(&data, 5, 42).unwrap();
        assert_eq!(folds.len(), 5);

        let sizes: Vec<usize> = folds.iter().map(|f| ids(&f.validation).len()).collect();
        assert_eq!(sizes, vec![3, 2, 2, 2, 2]);

        let mut seen = HashSet::new();
        for fold in &folds {
            assert!(ids(&fold.train).is_disjoint(&ids(&fold.validation)));
            assert_eq!(fold.train.len() + fold.validation.len(), data.len());
            for id in ids(&fold.validation) {
                assert!(seen.insert(id.to_string()));
            }
        }
        assert_eq!(seen.len(), 11);
    }

    #[test]
    fn test_k_folds_bounds() {
        assert!(k_folds(&rows(4, 1), 1, 0).is_err());
        assert!(k_folds(&rows(4, 1), 5, 0).is_err());
        assert_eq!(k_folds(&rows(4, 1), 4, 0).unwrap().len(), 4);
    }
}
