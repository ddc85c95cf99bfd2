use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};

/// Per-dimension standard deviation of `x` (n, nx) used as a length scale guess.
/// Null deviations are replaced by one so that the guess stays a valid length scale.
pub fn input_scales<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<F> {
    let mut std = x.std_axis(Axis(0), F::zero());
    std.mapv_inplace(|v| if v == F::zero() { F::one() } else { v });
    std
}

/// A structure to retain differences computation used to compute covariance matrix
#[derive(Debug, Clone)]
pub struct DiffMatrix<F: Float> {
    /// Differences as (n_obs * (n_obs-1))/2, nx) array
    pub d: Array2<F>,
    /// Indices of the differences in the original data array
    pub d_indices: Array2<usize>,
    /// Number of observations
    pub n_obs: usize,
}

impl<F: Float> DiffMatrix<F> {
    /// Compute differences given points given as an array (n_obs, nx)
    pub fn new(x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> DiffMatrix<F> {
        let n_obs = x.nrows();
        let n_pairs = n_obs * n_obs.saturating_sub(1) / 2;
        let mut d = Array2::zeros((n_pairs, x.ncols()));
        let mut d_indices = Array2::<usize>::zeros((n_pairs, 2));
        let mut pair = 0;
        for i in 0..n_obs {
            for j in (i + 1)..n_obs {
                d.row_mut(pair).assign(&(&x.row(i) - &x.row(j)));
                d_indices[[pair, 0]] = i;
                d_indices[[pair, 1]] = j;
                pair += 1;
            }
        }
        DiffMatrix {
            d,
            d_indices,
            n_obs,
        }
    }

    /// Scatter pairwise values `rxx` (n_pairs,) into a symmetric (n_obs, n_obs) matrix
    /// with `diag` on the diagonal
    pub fn to_symmetric(&self, rxx: &ArrayBase<impl Data<Elem = F>, Ix1>, diag: F) -> Array2<F> {
        let mut mx = Array2::<F>::eye(self.n_obs).mapv(|v| v * diag);
        for (ij, &r) in self.d_indices.outer_iter().zip(rxx.iter()) {
            mx[[ij[0], ij[1]]] = r;
            mx[[ij[1], ij[0]]] = r;
        }
        mx
    }
}

/// Differences `x_i - y_j` for every row i of `x` and every row j of `y`, j varying fastest,
/// as a (nrows(x) * nrows(y), ncols(x)) array.
///
/// *Panics* if x and y have not the same column numbers
pub fn pairwise_differences<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    y: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    assert!(x.ncols() == y.ncols());
    let ny = y.nrows();
    let mut result = Array2::zeros((x.nrows() * ny, x.ncols()));
    for (mut block, x_row) in result
        .axis_chunks_iter_mut(Axis(0), ny.max(1))
        .zip(x.rows())
    {
        block.assign(&(&x_row - y));
    }
    result
}
