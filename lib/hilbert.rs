//! Real-valued representation of density matrices.
//!
//! An `n`-level density matrix is Hermitian with unit trace, which leaves
//! `n^2 - 1` independent real degrees of freedom. Solutions store these along
//! the last axis of an array, all other axes being scan (or time) dimensions.
//!
//! Matrix position `(i, j)` lives in slot `i * n + j - 1`; position `(0, 0)` is
//! dropped and recovered from the trace. The slot holds
//! - the population `rho_ii` if `i == j`,
//! - `Im rho_ji` (equal to `-Im rho_ij`) if `i < j`,
//! - `Re rho_ij` (equal to `Re rho_ji`) if `i > j`.
//!
//! Both parts of a coherence are therefore those of the lower-triangle element
//! `rho_ji`, `j > i`, and the label `"ij_imag"` names the pair rather than the
//! sign. A driven `0 -> 1` transition that absorbs has a positive `01_imag`
//! entry.
//! For three levels this gives the storage order
//! ```text
//! 01_imag, 02_imag, 10_real, 11_real, 12_imag, 20_real, 21_real, 22_real
//! ```

use itertools::Itertools;
use ndarray::{ self as nd, Axis };
use num_complex::Complex64 as C64;
use crate::error::{ SolutionError, SolutionResult };

/* Indexing *******************************************************************/

/// Part of a complex matrix element held by a storage slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Real,
    Imag,
}

impl Component {
    /// Suffix used in basis labels.
    pub fn label(self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Imag => "imag",
        }
    }

    /// Extract this part of a complex number.
    pub fn of(self, z: C64) -> f64 {
        match self {
            Self::Real => z.re,
            Self::Imag => z.im,
        }
    }
}

/// Return `n` if `len == n^2 - 1` for some `n >= 2`.
pub fn basis_size(len: usize) -> Option<usize> {
    let n = infer_basis_size(len);
    (n >= 2 && n * n - 1 == len).then_some(n)
}

/// Nearest basis size for a last-axis length of `len`, i.e.
/// `round(sqrt(len + 1))`.
///
/// Unlike [`basis_size`], this never fails and is meant for diagnostics.
pub fn infer_basis_size(len: usize) -> usize {
    ((len + 1) as f64).sqrt().round() as usize
}

/// Storage slot and stored component for matrix position `(i, j)` of an
/// `n`-level system.
///
/// Returns `None` for `(0, 0)`, which is not stored, and for positions outside
/// the matrix.
pub fn slot(i: usize, j: usize, n: usize) -> Option<(usize, Component)> {
    if i >= n || j >= n { return None; }
    let comp = if i < j { Component::Imag } else { Component::Real };
    (i * n + j).checked_sub(1).map(|k| (k, comp))
}

/// Names of the stored basis elements of an `n`-level system, in storage
/// order.
///
/// Indices are concatenated directly (`"12_imag"`) for up to ten levels and
/// comma-separated (`"1,12_imag"`) beyond that.
pub fn basis_labels(n: usize) -> Vec<String> {
    (0..n).cartesian_product(0..n)
        .filter_map(|(i, j)| slot(i, j, n).map(|(_, comp)| (i, j, comp)))
        .map(|(i, j, comp)| {
            if n <= 10 {
                format!("{}{}_{}", i, j, comp.label())
            } else {
                format!("{},{}_{}", i, j, comp.label())
            }
        })
        .collect()
}

/// Basis size of a flattened solution array, checking that its last axis has
/// a valid length.
pub fn rho_basis_size<S, D>(rho: &nd::ArrayBase<S, D>) -> SolutionResult<usize>
where
    S: nd::Data<Elem = f64>,
    D: nd::Dimension,
{
    let len = rho.shape().last().copied().unwrap_or(0);
    basis_size(len).ok_or(SolutionError::BasisLength(len))
}

fn slot_view<'a>(rho: &nd::ArrayViewD<'a, f64>, k: usize)
    -> nd::ArrayViewD<'a, f64>
{
    let last = Axis(rho.ndim() - 1);
    rho.clone().index_axis_move(last, k)
}

/* Element access *************************************************************/

/// Get the complex `(i, j)` density matrix element(s) from a flattened
/// solution array of shape `(..., n^2 - 1)`.
///
/// The returned array has the leading shape of `rho`. Conjugate symmetry is
/// applied, so the `(j, i)` element is the complex conjugate of the `(i, j)`
/// element, and diagonal elements are real. The ground population `(0, 0)` is
/// reconstructed as one minus the sum of all other populations.
pub fn get_rho_ij<S, D>(rho: &nd::ArrayBase<S, D>, i: usize, j: usize)
    -> SolutionResult<nd::ArrayD<C64>>
where
    S: nd::Data<Elem = f64>,
    D: nd::Dimension,
{
    let rho = rho.view().into_dyn();
    let n = rho_basis_size(&rho)?;
    if i >= n || j >= n {
        return Err(SolutionError::BasisIndex { i, j, basis_size: n });
    }
    let elem: nd::ArrayD<C64>
        = if i == 0 && j == 0 {
            let lead = &rho.shape()[..rho.ndim() - 1];
            let mut pop: nd::ArrayD<f64> = nd::ArrayD::ones(lead);
            for k in 1..n {
                pop -= &slot_view(&rho, k * n + k - 1);
            }
            pop.mapv(C64::from)
        } else if i == j {
            slot_view(&rho, i * n + i - 1).mapv(C64::from)
        } else {
            let (lo, hi) = (i.min(j), i.max(j));
            let re = slot_view(&rho, hi * n + lo - 1);
            let im = slot_view(&rho, lo * n + hi - 1);
            let sign = if i > j { 1.0 } else { -1.0 };
            nd::Zip::from(&re).and(&im)
                .map_collect(|&r, &m| C64::new(r, sign * m))
        };
    Ok(elem)
}

/// Get all populations (main-diagonal elements) from a flattened solution
/// array, as an array of shape `(..., n)`.
pub fn get_populations<S, D>(rho: &nd::ArrayBase<S, D>)
    -> SolutionResult<nd::ArrayD<f64>>
where
    S: nd::Data<Elem = f64>,
    D: nd::Dimension,
{
    let rho = rho.view().into_dyn();
    let n = rho_basis_size(&rho)?;
    let lead = rho.ndim() - 1;
    let mut shape = rho.shape()[..lead].to_vec();
    shape.push(n);
    let mut pops: nd::ArrayD<f64> = nd::ArrayD::zeros(shape);
    for k in 0..n {
        let rho_kk = get_rho_ij(&rho, k, k)?;
        pops.index_axis_mut(Axis(lead), k).assign(&rho_kk.mapv(|z| z.re));
    }
    Ok(pops)
}

/* Conversion *****************************************************************/

/// Expand a flattened solution array of shape `(..., n^2 - 1)` into full
/// complex density matrices of shape `(..., n, n)`.
pub fn to_full_density<S, D>(rho: &nd::ArrayBase<S, D>)
    -> SolutionResult<nd::ArrayD<C64>>
where
    S: nd::Data<Elem = f64>,
    D: nd::Dimension,
{
    let rho = rho.view().into_dyn();
    let n = rho_basis_size(&rho)?;
    let lead = rho.ndim() - 1;
    let mut shape = rho.shape()[..lead].to_vec();
    shape.extend([n, n]);
    let mut full: nd::ArrayD<C64> = nd::ArrayD::zeros(shape);
    for (i, j) in (0..n).cartesian_product(0..n) {
        let elem = get_rho_ij(&rho, i, j)?;
        full.index_axis_mut(Axis(lead + 1), j)
            .index_axis_move(Axis(lead), i)
            .assign(&elem);
    }
    Ok(full)
}

/// Flatten complex density matrices of shape `(..., n, n)` into the real
/// storage layout of shape `(..., n^2 - 1)`.
///
/// Only the components listed in the [module docs][self] are read; the input
/// is assumed to be Hermitian with unit trace.
pub fn from_full_density<S, D>(full: &nd::ArrayBase<S, D>)
    -> SolutionResult<nd::ArrayD<f64>>
where
    S: nd::Data<Elem = C64>,
    D: nd::Dimension,
{
    let full = full.view().into_dyn();
    let ndim = full.ndim();
    if ndim < 2
        || full.shape()[ndim - 1] != full.shape()[ndim - 2]
        || full.shape()[ndim - 1] < 2
    {
        return Err(SolutionError::NotSquare(full.shape().to_vec()));
    }
    let lead = ndim - 2;
    let n = full.shape()[lead];
    let mut shape = full.shape()[..lead].to_vec();
    shape.push(n * n - 1);
    let mut rho: nd::ArrayD<f64> = nd::ArrayD::zeros(shape);
    for (i, j) in (0..n).cartesian_product(0..n) {
        let Some((k, comp)) = slot(i, j, n) else { continue; };
        // both parts are read from the lower triangle
        let (row, col) = (i.max(j), i.min(j));
        let elem
            = full.clone()
            .index_axis_move(Axis(lead + 1), col)
            .index_axis_move(Axis(lead), row);
        rho.index_axis_mut(Axis(lead), k)
            .assign(&elem.mapv(|z| comp.of(z)));
    }
    Ok(rho)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_level() -> nd::Array2<C64> {
        nd::array![
            [C64::new(0.6, 0.0), C64::new(0.1, 0.2), C64::new(0.0, -0.05)],
            [C64::new(0.1, -0.2), C64::new(0.3, 0.0), C64::new(0.02, 0.01)],
            [C64::new(0.0, 0.05), C64::new(0.02, -0.01), C64::new(0.1, 0.0)],
        ]
    }

    fn scalar(a: &nd::ArrayD<C64>) -> C64 {
        assert_eq!(a.ndim(), 0);
        *a.iter().next().unwrap()
    }

    #[test]
    fn basis_sizes() {
        assert_eq!(basis_size(3), Some(2));
        assert_eq!(basis_size(8), Some(3));
        assert_eq!(basis_size(15), Some(4));
        assert_eq!(basis_size(4), None);
        assert_eq!(basis_size(0), None);
        assert_eq!(infer_basis_size(8), 3);
        assert_eq!(infer_basis_size(9), 3);
    }

    #[test]
    fn three_level_labels() {
        assert_eq!(
            basis_labels(3),
            vec![
                "01_imag", "02_imag", "10_real", "11_real",
                "12_imag", "20_real", "21_real", "22_real",
            ],
        );
        assert_eq!(basis_labels(11).len(), 120);
        assert_eq!(basis_labels(11)[0], "0,1_imag");
    }

    #[test]
    fn slots() {
        assert_eq!(slot(0, 0, 3), None);
        assert_eq!(slot(0, 1, 3), Some((0, Component::Imag)));
        assert_eq!(slot(1, 0, 3), Some((2, Component::Real)));
        assert_eq!(slot(2, 2, 3), Some((7, Component::Real)));
        assert_eq!(slot(3, 0, 3), None);
    }

    #[test]
    fn element_symmetry() {
        let rho = from_full_density(&three_level()).unwrap();
        assert_eq!(rho.shape(), &[8]);
        let r01 = get_rho_ij(&rho, 0, 1).unwrap();
        let r10 = get_rho_ij(&rho, 1, 0).unwrap();
        assert_eq!(scalar(&r01), C64::new(0.1, 0.2));
        assert_eq!(scalar(&r10), scalar(&r01).conj());
        let r00 = get_rho_ij(&rho, 0, 0).unwrap();
        assert!((scalar(&r00) - C64::new(0.6, 0.0)).norm() < 1e-15);
        assert_eq!(scalar(&get_rho_ij(&rho, 2, 2).unwrap()).im, 0.0);
    }

    #[test]
    fn coherence_stored_from_lower_triangle() {
        let rho: nd::Array1<f64>
            = from_full_density(&three_level()).unwrap()
            .into_dimensionality().unwrap();
        // Im rho_10, Im rho_20, Im rho_21
        assert_eq!(rho[0], -0.2);
        assert_eq!(rho[1], 0.05);
        assert_eq!(rho[4], -0.01);

        let rho: nd::Array1<f64>
            = nd::array![0.0013139903428765695, 2e-4, 0.01];
        let r10 = scalar(&get_rho_ij(&rho, 1, 0).unwrap());
        assert_eq!(r10, C64::new(2e-4, 0.0013139903428765695));
        let r01 = scalar(&get_rho_ij(&rho, 0, 1).unwrap());
        assert_eq!(r01, r10.conj());
    }

    #[test]
    fn full_density_restored() {
        let full = three_level();
        let rho = from_full_density(&full).unwrap();
        let back = to_full_density(&rho).unwrap();
        assert_eq!(back.shape(), &[3, 3]);
        for (a, b) in back.iter().zip(full.iter()) {
            assert!((a - b).norm() < 1e-15);
        }
    }

    #[test]
    fn leading_axes_preserved() {
        let stack: nd::Array3<C64>
            = nd::stack(Axis(0), &[three_level().view(), three_level().view()])
            .unwrap();
        let rho = from_full_density(&stack).unwrap();
        assert_eq!(rho.shape(), &[2, 8]);
        assert_eq!(get_rho_ij(&rho, 1, 2).unwrap().shape(), &[2]);
        let pops: nd::Array2<f64>
            = get_populations(&rho).unwrap()
            .into_dimensionality().unwrap();
        assert_eq!(pops.shape(), &[2, 3]);
        assert!((pops[[1, 0]] - 0.6).abs() < 1e-15);
        assert!((pops.sum() - 2.0).abs() < 1e-14);
    }

    #[test]
    fn bad_inputs() {
        let rho: nd::Array1<f64> = nd::Array1::zeros(8);
        assert!(matches!(
            get_rho_ij(&rho, 3, 0),
            Err(SolutionError::BasisIndex { basis_size: 3, .. }),
        ));
        let rho: nd::Array1<f64> = nd::Array1::zeros(7);
        assert!(matches!(
            get_rho_ij(&rho, 0, 1),
            Err(SolutionError::BasisLength(7)),
        ));
        let full: nd::Array2<C64> = nd::Array2::zeros((2, 3));
        assert!(matches!(
            from_full_density(&full),
            Err(SolutionError::NotSquare(_)),
        ));
    }
}
