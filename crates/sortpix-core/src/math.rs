//! Shared math utilities.

/// Softmax over raw logits. Returns an empty vector for empty input.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > f32::EPSILON {
        exps.into_iter().map(|x| x / sum).collect()
    } else {
        exps
    }
}

/// Index and value of the largest element.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// F1 from confusion counts; a zero denominator scores 0.
pub fn f1_score(tp: usize, fp: usize, fn_: usize) -> f64 {
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        0.0
    } else {
        (2 * tp) as f64 / denom as f64
    }
}

/// Macro-averaged F1 over the columns of two parallel indicator matrices.
///
/// Rows are samples, columns are labels. Returns `None` when there are no
/// rows or no columns.
pub fn macro_f1(truth: &[Vec<bool>], predicted: &[Vec<bool>]) -> Option<f64> {
    let labels = truth.first()?.len();
    if labels == 0 || truth.len() != predicted.len() {
        return None;
    }

    let total: f64 = (0..labels)
        .map(|col| {
            let (mut tp, mut fp, mut fn_) = (0, 0, 0);
            for (t, p) in truth.iter().zip(predicted) {
                match (t[col], p[col]) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            f1_score(tp, fp, fn_)
        })
        .sum();

    Some(total / labels as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_f1_zero_division_is_zero() {
        assert_eq!(f1_score(0, 0, 0), 0.0);
        assert_eq!(f1_score(1, 0, 0), 1.0);
        assert_eq!(f1_score(0, 1, 0), 0.0);
    }

    #[test]
    fn test_macro_f1_single_sample() {
        // Vocabulary [a, b, c]; truth {a, b}; predicted {a, c}
        let truth = vec![vec![true, true, false]];
        let predicted = vec![vec![true, false, true]];
        let score = macro_f1(&truth, &predicted).unwrap();
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_macro_f1_empty() {
        assert_eq!(macro_f1(&[], &[]), None);
    }

    #[test]
    fn test_macro_f1_perfect() {
        let rows = vec![vec![true, false], vec![false, true]];
        assert_eq!(macro_f1(&rows, &rows), Some(1.0));
    }
}
