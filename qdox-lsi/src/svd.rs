//! Truncated singular value decomposition.
//!
//! The left singular vectors of `M` (terms × documents) are recovered from the
//! eigen-decomposition of whichever Gram matrix is smaller: `MᵀM` when there
//! are fewer documents than terms, `MMᵀ` otherwise. Eigenpairs come from the
//! cyclic Jacobi method, which is exact enough for the small Gram matrices a
//! folder of documents produces and has no external numeric dependencies.

use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Upper bound on Jacobi sweeps; convergence is quadratic so this is rarely reached
const MAX_SWEEPS: usize = 64;

/// Relative off-diagonal mass at which the Jacobi iteration stops
const CONVERGENCE: f64 = 1e-14;

/// Singular values at or below this are treated as zero
const SINGULAR_EPSILON: f64 = 1e-10;

/// Leading singular triplets of a matrix, minus the right singular vectors
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    /// Left singular vectors, one per column (rows × rank)
    pub basis: Array2<f64>,
    /// Singular values in descending order
    pub singular_values: Array1<f64>,
}

/// Decompose `matrix` and keep the `rank` largest singular directions.
///
/// The caller guarantees `rank <= min(rows, cols)`. Basis columns belonging to
/// zero singular values are zero vectors. Each non-zero column is
/// sign-normalised so that its largest-magnitude entry is positive.
pub fn truncated_svd(matrix: ArrayView2<'_, f64>, rank: usize) -> TruncatedSvd {
    let (rows, cols) = matrix.dim();
    debug_assert!(rank <= rows.min(cols));

    let mut basis = Array2::<f64>::zeros((rows, rank));
    let mut singular_values = Array1::<f64>::zeros(rank);

    if cols <= rows {
        let gram = matrix.t().dot(&matrix);
        let (eigenvalues, eigenvectors) = symmetric_eigen(gram);
        for (j, &idx) in descending_order(&eigenvalues).iter().take(rank).enumerate() {
            let sigma = eigenvalues[idx].max(0.0).sqrt();
            if sigma <= SINGULAR_EPSILON {
                continue;
            }
            let u = matrix.dot(&eigenvectors.column(idx)) / sigma;
            basis.column_mut(j).assign(&u);
            singular_values[j] = sigma;
        }
    } else {
        let gram = matrix.dot(&matrix.t());
        let (eigenvalues, eigenvectors) = symmetric_eigen(gram);
        for (j, &idx) in descending_order(&eigenvalues).iter().take(rank).enumerate() {
            let sigma = eigenvalues[idx].max(0.0).sqrt();
            if sigma <= SINGULAR_EPSILON {
                continue;
            }
            basis.column_mut(j).assign(&eigenvectors.column(idx));
            singular_values[j] = sigma;
        }
    }

    for mut column in basis.axis_iter_mut(Axis(1)) {
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
        if pivot < 0.0 {
            column.mapv_inplace(|x| -x);
        }
    }

    TruncatedSvd {
        basis,
        singular_values,
    }
}

/// Indices of `values` sorted by value, largest first; equal values keep index order
fn descending_order(values: &Array1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order
}

/// Eigen-decomposition of a real symmetric matrix by cyclic Jacobi rotations.
///
/// Returns the eigenvalues (unordered) and the matching unit eigenvectors as
/// the columns of the second matrix.
pub fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    if scale == 0.0 {
        return (Array1::zeros(n), v);
    }

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off.sqrt() <= CONVERGENCE * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn test_symmetric_eigen_of_known_matrix() {
        // Eigenvalues of [[2, 1], [1, 2]] are 3 and 1
        let (values, vectors) = symmetric_eigen(array![[2.0, 1.0], [1.0, 2.0]]);
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_close(sorted[0], 3.0);
        assert_close(sorted[1], 1.0);

        // A v = λ v for every column
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        for (i, column) in vectors.axis_iter(Axis(1)).enumerate() {
            let av = a.dot(&column);
            for k in 0..2 {
                assert_close(av[k], values[i] * column[k]);
            }
        }
    }

    #[test]
    fn test_singular_values_of_diagonal_matrix() {
        let m = array![[3.0, 0.0], [0.0, 5.0], [0.0, 0.0]];
        let svd = truncated_svd(m.view(), 2);
        assert_close(svd.singular_values[0], 5.0);
        assert_close(svd.singular_values[1], 3.0);
        // Leading direction is the second term axis
        assert_close(svd.basis[[1, 0]], 1.0);
        assert_close(svd.basis[[0, 1]], 1.0);
    }

    #[test]
    fn test_full_rank_projection_reconstructs_matrix() {
        let m = array![
            [1.0, 0.0, 2.0],
            [0.0, 3.0, 1.0],
            [4.0, 1.0, 0.0],
            [2.0, 2.0, 2.0]
        ];
        let svd = truncated_svd(m.view(), 3);
        let reduced = svd.basis.t().dot(&m);
        let rebuilt = svd.basis.dot(&reduced);
        for (x, y) in rebuilt.iter().zip(m.iter()) {
            assert_close(*x, *y);
        }

        // Basis columns are orthonormal
        let gram = svd.basis.t().dot(&svd.basis);
        for i in 0..3 {
            for j in 0..3 {
                assert_close(gram[[i, j]], if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_wide_matrix_uses_term_gram() {
        // More documents than terms
        let m = array![[1.0, 1.0, 0.0, 0.0], [0.0, 0.0, 2.0, 2.0]];
        let svd = truncated_svd(m.view(), 2);
        assert_close(svd.singular_values[0], 8.0_f64.sqrt());
        assert_close(svd.singular_values[1], 2.0_f64.sqrt());
        assert_close(svd.basis[[1, 0]], 1.0);
        assert_close(svd.basis[[0, 1]], 1.0);
    }

    #[test]
    fn test_zero_matrix_yields_zero_basis() {
        let m = Array2::<f64>::zeros((3, 2));
        let svd = truncated_svd(m.view(), 2);
        assert!(svd.basis.iter().all(|&x| x == 0.0));
        assert!(svd.singular_values.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_basis_signs_are_normalised() {
        let m = array![[-2.0, 0.0], [0.0, -1.0], [0.0, 0.0]];
        let svd = truncated_svd(m.view(), 2);
        for column in svd.basis.axis_iter(Axis(1)) {
            let pivot = column
                .iter()
                .copied()
                .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
            assert!(pivot > 0.0);
        }
    }
}
