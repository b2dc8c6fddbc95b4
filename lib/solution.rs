//! The [`Solution`] container and the optical quantities derived from it.

use std::f64::consts::TAU;
use ndarray::{ self as nd, Axis };
use num_complex::Complex64 as C64;
use tracing::{ debug, warn };
use crate::{
    constants::{ self, C_LIGHT, OD_THIN_LIMIT },
    error::{ SolutionError, SolutionResult, SolutionWarning },
    hilbert,
    params::{ self, Couplings, ExperimentParams, Param, ProbeRabi },
    shared::Shared,
};

/// Density-matrix solution(s) of a multilevel system together with the
/// metadata needed to interpret them.
///
/// Every field is public and may also be reached by name through
/// [`Self::get`] and [`Self::set`]; both routes read and write the same
/// storage. Arrays are held in [`Shared`] handles: [`Self::copy`] (and
/// [`Clone`]) produce a record whose arrays alias this one's, while
/// [`Self::deepcopy`] gives fully independent storage.
///
/// Optional fields left as `None` are "not defined". Derived quantities that
/// need them fail with [`SolutionError::Undefined`], naming every missing
/// field at once.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// Solutions returned by the solver, shape `(..., n^2 - 1)`.
    ///
    /// See [`hilbert`] for the layout of the last axis.
    pub rho: Shared<nd::ArrayD<f64>>,
    /// Eta constant of the cell.
    pub eta: Option<f64>,
    /// Kappa constant of the cell.
    pub kappa: Option<f64>,
    /// Coupling edge corresponding to the probing field, as `(row, col)`.
    pub probe_tuple: Option<(usize, usize)>,
    /// Probe transition frequency, in rad/s.
    pub probe_freq: Option<f64>,
    /// Probe Rabi frequency, in Mrad/s.
    pub probe_rabi: Option<ProbeRabi>,
    /// Optical path length of the medium, in meters.
    pub cell_length: Option<f64>,
    /// Cross-sectional area of the probing beam, in square meters.
    pub beam_area: Option<f64>,
    /// Field couplings used to build the model.
    pub couplings: Couplings,
    /// Labels for the scanned axes. If doppler averaging without summing,
    /// doppler dimensions are prepended.
    pub axis_labels: Vec<String>,
    /// Value arrays for each labeled axis.
    pub axis_values: Vec<Shared<nd::Array1<f64>>>,
    /// Version of the producer that created the solution.
    pub rq_version: String,
    /// Names of the stored density matrix elements, in storage order.
    pub basis: Vec<String>,
    /// Doppler classes used to perform the doppler average, if averaging
    /// without summing was performed.
    pub doppler_classes: Option<Shared<nd::ArrayD<f64>>>,
    /// Times the solution is sampled at; defined only for time-domain
    /// solutions.
    pub t: Option<Shared<nd::Array1<f64>>>,
    /// Initial conditions; defined only for time-domain solutions.
    pub init_cond: Option<Shared<nd::ArrayD<f64>>>,
}

impl Solution {
    /// Create a new solution from the fields every solver provides.
    ///
    /// All optional fields start as `None`. Fails if `rho` does not have a
    /// valid basis axis or its shape disagrees with `basis` or the axis
    /// metadata; see [`Self::validate`].
    pub fn new<D>(
        rho: nd::Array<f64, D>,
        basis: Vec<String>,
        axis_labels: Vec<String>,
        axis_values: Vec<nd::Array1<f64>>,
        couplings: Couplings,
        rq_version: &str,
    ) -> SolutionResult<Self>
    where D: nd::Dimension
    {
        let sol = Self {
            rho: Shared::new(rho.into_dyn()),
            eta: None,
            kappa: None,
            probe_tuple: None,
            probe_freq: None,
            probe_rabi: None,
            cell_length: None,
            beam_area: None,
            couplings,
            axis_labels,
            axis_values: axis_values.into_iter().map(Shared::new).collect(),
            rq_version: rq_version.to_string(),
            basis,
            doppler_classes: None,
            t: None,
            init_cond: None,
        };
        sol.validate()?;
        debug!(
            shape = ?sol.rho.borrow().shape(),
            basis_size = sol.basis_size(),
            "created solution",
        );
        Ok(sol)
    }

    /// Attach experimental parameters, overwriting all seven optional
    /// parameter fields.
    pub fn with_experiment(mut self, params: ExperimentParams) -> Self {
        self.set_experiment(params);
        self
    }

    /// Overwrite all seven optional parameter fields.
    pub fn set_experiment(&mut self, params: ExperimentParams) {
        let ExperimentParams {
            eta,
            kappa,
            probe_tuple,
            probe_freq,
            probe_rabi,
            cell_length,
            beam_area,
        } = params;
        self.eta = eta;
        self.kappa = kappa;
        self.probe_tuple = probe_tuple;
        self.probe_freq = probe_freq;
        self.probe_rabi = probe_rabi;
        self.cell_length = cell_length;
        self.beam_area = beam_area;
    }

    /// Collect the optional parameter fields.
    pub fn experiment(&self) -> ExperimentParams {
        ExperimentParams {
            eta: self.eta,
            kappa: self.kappa,
            probe_tuple: self.probe_tuple,
            probe_freq: self.probe_freq,
            probe_rabi: self.probe_rabi.clone(),
            cell_length: self.cell_length,
            beam_area: self.beam_area,
        }
    }

    /// Record the doppler classes used in an unsummed doppler average.
    pub fn with_doppler_classes<D>(mut self, classes: nd::Array<f64, D>)
        -> Self
    where D: nd::Dimension
    {
        self.doppler_classes = Some(Shared::new(classes.into_dyn()));
        self
    }

    /// Mark the solution as time-domain.
    ///
    /// The time axis is the one directly before the basis axis of `rho` and
    /// must have as many entries as `t`.
    pub fn with_time<D>(
        mut self,
        t: nd::Array1<f64>,
        init_cond: nd::Array<f64, D>,
    ) -> SolutionResult<Self>
    where D: nd::Dimension
    {
        self.t = Some(Shared::new(t));
        self.init_cond = Some(Shared::new(init_cond.into_dyn()));
        self.validate()?;
        Ok(self)
    }

    /// Check the structural invariants of the record:
    /// - the last axis of `rho` has length `n^2 - 1` for some `n >= 2`
    /// - `basis` names every element of that axis
    /// - `axis_labels` and `axis_values` have equal length
    /// - the leading axes of `rho` are exactly the labeled axes, followed by
    ///   the time axis for time-domain solutions, with matching lengths
    pub fn validate(&self) -> SolutionResult<()> {
        let rho = self.rho.borrow();
        hilbert::rho_basis_size(&*rho)?;
        let Some((&elements, lead)) = rho.shape().split_last() else {
            return Err(SolutionError::BasisLength(0));
        };
        if self.basis.len() != elements {
            return Err(SolutionError::BasisLabels {
                labels: self.basis.len(),
                elements,
            });
        }
        if self.axis_labels.len() != self.axis_values.len() {
            return Err(SolutionError::AxisCount {
                labels: self.axis_labels.len(),
                values: self.axis_values.len(),
            });
        }
        let expected = self.axis_labels.len() + usize::from(self.t.is_some());
        if lead.len() != expected {
            return Err(SolutionError::LeadingAxes {
                found: lead.len(),
                expected,
            });
        }
        let iter
            = self.axis_labels.iter().zip(&self.axis_values).zip(lead)
            .enumerate();
        for (axis, ((label, values), dim)) in iter {
            let len = values.borrow().len();
            if len != *dim {
                return Err(SolutionError::AxisLength {
                    axis,
                    label: label.clone(),
                    len,
                    dim: *dim,
                });
            }
        }
        if let (Some(t), Some(dim)) = (&self.t, lead.last()) {
            let len = t.borrow().len();
            if len != *dim {
                return Err(SolutionError::TimeLength { len, dim: *dim });
            }
        }
        Ok(())
    }

    /// Size `n` of the `n`-level system, inferred from the last axis of `rho`
    /// as `round(sqrt(len + 1))`.
    pub fn basis_size(&self) -> usize {
        let len = self.rho.borrow().shape().last().copied().unwrap_or(0);
        hilbert::infer_basis_size(len)
    }

    /// Shape of the leading (scan and time) axes of `rho`.
    pub fn scan_shape(&self) -> Vec<usize> {
        let rho = self.rho.borrow();
        let shape = rho.shape();
        shape[..shape.len().saturating_sub(1)].to_vec()
    }

    /// Get the `(i, j)` element(s) of the density matrix solutions.
    ///
    /// The returned array has the leading shape of `rho`. See
    /// [`hilbert::get_rho_ij`] for details.
    pub fn rho_ij(&self, i: usize, j: usize)
        -> SolutionResult<nd::ArrayD<C64>>
    {
        hilbert::get_rho_ij(&*self.rho.borrow(), i, j)
    }

    /// Get all populations of the density matrix solutions, as an array of
    /// shape `(..., n)`.
    pub fn populations(&self) -> SolutionResult<nd::ArrayD<f64>> {
        hilbert::get_populations(&*self.rho.borrow())
    }

    /// Expand the solutions into full complex density matrices of shape
    /// `(..., n, n)`.
    pub fn to_full_density(&self) -> SolutionResult<nd::ArrayD<C64>> {
        hilbert::to_full_density(&*self.rho.borrow())
    }

    /// Return the slice of `rho` at `idx` along its last axis.
    ///
    /// For an `n`-level system the valid indices are `0..n^2 - 1`. Negative
    /// indices count back from the end, so `-1` is the last element and
    /// `-(n^2 - 1)` the first. Any other index fails with
    /// [`SolutionError::ElementIndex`], reporting the inferred basis size.
    pub fn get_solution_element(&self, idx: isize)
        -> SolutionResult<nd::ArrayD<f64>>
    {
        let rho = self.rho.borrow();
        let len = rho.shape().last().copied().unwrap_or(0);
        let out_of_range = || SolutionError::ElementIndex {
            index: idx,
            basis_size: hilbert::infer_basis_size(len),
        };
        let len = isize::try_from(len).map_err(|_| out_of_range())?;
        let k = if idx < 0 { idx + len } else { idx };
        if !(0..len).contains(&k) { return Err(out_of_range()); }
        let last = Axis(rho.ndim() - 1);
        Ok(rho.index_axis(last, k as usize).to_owned())
    }

    /// Compute the atomic susceptibility on the probe transition.
    ///
    /// Requires `probe_rabi`, `kappa`, `probe_freq` and `probe_tuple`. The
    /// probe coherence is read with the probe tuple reversed to obtain the
    /// correct sign of the imaginary part, giving
    /// ```text
    /// chi = kappa * 2 c rho_probe / (probe_freq * probe_rabi / 2)
    /// ```
    /// with `probe_rabi` converted to rad/s. An array-valued `probe_rabi` is
    /// broadcast against the leading shape of `rho`.
    pub fn get_susceptibility(&self) -> SolutionResult<nd::ArrayD<C64>> {
        let required = [
            Param::ProbeRabi,
            Param::Kappa,
            Param::ProbeFreq,
            Param::ProbeTuple,
        ];
        let (
            Some(probe_rabi),
            Some(kappa),
            Some(probe_freq),
            Some((row, col)),
        ) = (&self.probe_rabi, self.kappa, self.probe_freq, self.probe_tuple)
        else {
            return Err(self.undefined(&required));
        };

        let rho_probe = self.rho_ij(col, row)?;
        let probe_rabi = probe_rabi.to_rad_per_s(rho_probe.shape())?;
        let chi
            = nd::Zip::from(&rho_probe).and(&probe_rabi)
            .map_collect(|&rho, &rabi| {
                kappa * (rho * 2.0 * C_LIGHT) / (probe_freq * (rabi / 2.0))
            });
        Ok(chi)
    }

    /// Compute the optical depth of the sample along with any warnings about
    /// its validity.
    ///
    /// Requires `probe_freq` and `cell_length` in addition to the parameters
    /// of [`Self::get_susceptibility`]. Assumes the optically-thin
    /// approximation; if any optical depth exceeds 1 this is likely invalid
    /// and [`SolutionWarning::OpticallyThick`] is returned alongside the
    /// (unaltered) values.
    pub fn get_od_with_warnings(&self)
        -> SolutionResult<(nd::ArrayD<f64>, Vec<SolutionWarning>)>
    {
        let required = [Param::ProbeFreq, Param::CellLength];
        let (Some(probe_freq), Some(cell_length))
            = (self.probe_freq, self.cell_length)
        else {
            return Err(self.undefined(&required));
        };

        let probe_wavelength = constants::wavelength(probe_freq);
        let probe_wavevector = constants::wavevector(probe_wavelength);
        let od: nd::ArrayD<f64>
            = self.get_susceptibility()?
            .mapv(|chi| chi.im * cell_length * probe_wavevector);
        let mut warnings: Vec<SolutionWarning> = Vec::new();
        if od.iter().any(|x| *x > OD_THIN_LIMIT) {
            let max_od = od.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            warnings.push(SolutionWarning::OpticallyThick { max_od });
        }
        Ok((od, warnings))
    }

    /// Compute the optical depth of the sample.
    ///
    /// Like [`Self::get_od_with_warnings`], but warnings are emitted through
    /// [`tracing`] instead of being returned.
    pub fn get_od(&self) -> SolutionResult<nd::ArrayD<f64>> {
        let (od, warnings) = self.get_od_with_warnings()?;
        emit(&warnings);
        Ok(od)
    }

    /// Compute the probe transmission coefficient `P_out / P_in = exp(-OD)`
    /// along with any warnings raised by the optical depth.
    pub fn get_transmission_coef_with_warnings(&self)
        -> SolutionResult<(nd::ArrayD<f64>, Vec<SolutionWarning>)>
    {
        let (od, warnings) = self.get_od_with_warnings()?;
        Ok((od.mapv(|x| (-x).exp()), warnings))
    }

    /// Compute the probe transmission coefficient `P_out / P_in = exp(-OD)`.
    ///
    /// Warnings from the optical depth are emitted through [`tracing`].
    pub fn get_transmission_coef(&self) -> SolutionResult<nd::ArrayD<f64>> {
        let (transmission, warnings)
            = self.get_transmission_coef_with_warnings()?;
        emit(&warnings);
        Ok(transmission)
    }

    /// Compute the phase shift of the probe in radians.
    ///
    /// Requires `probe_rabi`, `kappa`, `cell_length` and `probe_freq`. Uses the
    /// refractive index `n = 1 + Re(chi) / 2` and the probe wavevector
    /// `2 pi / lambda` with `lambda = 2 pi c / probe_freq`. Assumes the
    /// optically-thin approximation.
    pub fn get_phase_shift(&self) -> SolutionResult<nd::ArrayD<f64>> {
        self.variables_defined(&[
            Param::ProbeRabi,
            Param::Kappa,
            Param::CellLength,
            Param::ProbeFreq,
        ])?;
        let (Some(probe_freq), Some(cell_length))
            = (self.probe_freq, self.cell_length)
        else {
            return Err(self.undefined(&[Param::CellLength, Param::ProbeFreq]));
        };

        let wavelength = TAU * C_LIGHT / probe_freq;
        let wavevector = TAU / wavelength;
        let phase
            = self.get_susceptibility()?
            .mapv(|chi| (1.0 + chi.re / 2.0) * cell_length * wavevector);
        Ok(phase)
    }

    /// Return a copy whose arrays share storage with `self`.
    ///
    /// Replacing a field on the copy leaves `self` untouched, but editing an
    /// array in place is visible through both.
    pub fn copy(&self) -> Self { self.clone() }

    /// Return a copy with all arrays, including those inside `probe_rabi` and
    /// `couplings`, in new storage.
    pub fn deepcopy(&self) -> Self {
        Self {
            rho: self.rho.deep_clone(),
            probe_rabi: self.probe_rabi.as_ref().map(ProbeRabi::deep_clone),
            couplings: params::deep_clone_couplings(&self.couplings),
            axis_values:
                self.axis_values.iter().map(Shared::deep_clone).collect(),
            doppler_classes:
                self.doppler_classes.as_ref().map(Shared::deep_clone),
            t: self.t.as_ref().map(Shared::deep_clone),
            init_cond: self.init_cond.as_ref().map(Shared::deep_clone),
            ..self.clone()
        }
    }

    /// Return `true` if the optional parameter is not `None`.
    pub fn is_defined(&self, param: Param) -> bool {
        match param {
            Param::Eta => self.eta.is_some(),
            Param::Kappa => self.kappa.is_some(),
            Param::ProbeTuple => self.probe_tuple.is_some(),
            Param::ProbeFreq => self.probe_freq.is_some(),
            Param::ProbeRabi => self.probe_rabi.is_some(),
            Param::CellLength => self.cell_length.is_some(),
            Param::BeamArea => self.beam_area.is_some(),
        }
    }

    /// Check that every listed parameter is defined, failing with the names of
    /// all that are not, in the order given.
    pub fn variables_defined(&self, params: &[Param]) -> SolutionResult<()> {
        if params.iter().all(|p| self.is_defined(*p)) {
            Ok(())
        } else {
            Err(self.undefined(params))
        }
    }

    fn undefined(&self, params: &[Param]) -> SolutionError {
        let names: Vec<&'static str>
            = params.iter()
            .filter(|p| !self.is_defined(**p))
            .map(|p| p.name())
            .collect();
        SolutionError::Undefined(names)
    }
}

fn emit(warnings: &[SolutionWarning]) {
    for warning in warnings.iter() {
        match warning {
            SolutionWarning::OpticallyThick { max_od } => {
                warn!(max_od = *max_od, "{}", warning);
            },
        }
    }
}
