//! Softmax normalization.
//!
//! `softmax(x)_i = exp(x_i - max(x)) / sum_j exp(x_j - max(x))`
//!
//! Subtracting the maximum keeps `exp` from overflowing; the result is
//! unchanged mathematically.

/// Softmax of a vector. Empty input yields an empty vector.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|&v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Softmax applied independently down each column of a row-major matrix.
///
/// Each column is normalized across all rows, so an entry expresses how an
/// individual compares to the rest of the population on that feature.
pub fn column_softmax<const N: usize>(rows: &[[f64; N]]) -> Vec<[f64; N]> {
    let mut out = vec![[0.0; N]; rows.len()];
    if rows.is_empty() {
        return out;
    }

    for col in 0..N {
        let max = rows
            .iter()
            .map(|row| row[col])
            .fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for (dst, row) in out.iter_mut().zip(rows) {
            let e = (row[col] - max).exp();
            dst[col] = e;
            sum += e;
        }
        for dst in &mut out {
            dst[col] /= sum;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_softmax_uniform() {
        let p = softmax(&[3.0, 3.0, 3.0, 3.0]);
        for v in p {
            assert!((v - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_ordering() {
        let p = softmax(&[0.1, 0.5, 0.3]);
        assert!(p[1] > p[2] && p[2] > p[0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_large_values() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_empty() {
        assert!(softmax(&[]).is_empty());
        assert!(column_softmax::<3>(&[]).is_empty());
    }

    #[test]
    fn test_column_softmax_is_per_column() {
        let rows = [[0.0, 10.0], [0.0, 0.0]];
        let out = column_softmax(&rows);

        assert!((out[0][0] - 0.5).abs() < 1e-12);
        assert!((out[1][0] - 0.5).abs() < 1e-12);
        assert!(out[0][1] > 0.99);

        let col1: Vec<f64> = rows.iter().map(|r| r[1]).collect();
        let expected = softmax(&col1);
        assert!((out[0][1] - expected[0]).abs() < 1e-15);
    }

    fn matrix() -> impl Strategy<Value = Vec<[f64; 5]>> {
        prop::collection::vec(prop::array::uniform5(-10.0f64..10.0), 2..40)
    }

    proptest! {
        #[test]
        fn prop_columns_sum_to_one(rows in matrix()) {
            let out = column_softmax(&rows);
            prop_assert_eq!(out.len(), rows.len());
            for col in 0..5 {
                let sum: f64 = out.iter().map(|r| r[col]).sum();
                prop_assert!((sum - 1.0).abs() < 1e-9);
                for row in &out {
                    prop_assert!(row[col] > 0.0 && row[col] < 1.0);
                }
            }
        }

        #[test]
        fn prop_column_softmax_is_pure(rows in matrix()) {
            prop_assert_eq!(column_softmax(&rows), column_softmax(&rows));
        }
    }
}
