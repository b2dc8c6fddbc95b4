//! Optional experimental parameters and coupling descriptions attached to a
//! [`Solution`][crate::solution::Solution].
//!
//! Solutions produced from a model with explicit experimental geometry carry
//! these directly; for other models they may be filled in afterwards, e.g. from
//! a TOML file via [`ExperimentParams::from_file`].

use std::path::Path;
use indexmap::IndexMap;
use ndarray as nd;
use serde::Deserialize;
use crate::{
    error::{ SolutionError, SolutionResult },
    shared::Shared,
};

/* Probe Rabi frequency *******************************************************/

/// Probe Rabi frequency in units of Mrad/s.
///
/// An array value is broadcast against the leading (scan) shape of a solution
/// when it enters a derived quantity.
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeRabi {
    Scalar(f64),
    Array(Shared<nd::ArrayD<f64>>),
}

impl From<f64> for ProbeRabi {
    fn from(rabi: f64) -> Self { Self::Scalar(rabi) }
}

impl From<nd::ArrayD<f64>> for ProbeRabi {
    fn from(rabi: nd::ArrayD<f64>) -> Self { Self::Array(rabi.into()) }
}

impl From<nd::Array1<f64>> for ProbeRabi {
    fn from(rabi: nd::Array1<f64>) -> Self {
        Self::Array(rabi.into_dyn().into())
    }
}

impl ProbeRabi {
    /// Copy into new storage if array-valued.
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Scalar(r) => Self::Scalar(*r),
            Self::Array(a) => Self::Array(a.deep_clone()),
        }
    }

    /// Return the value as an array broadcast to `shape`, converted to rad/s.
    pub(crate) fn to_rad_per_s(&self, shape: &[usize])
        -> SolutionResult<nd::ArrayD<f64>>
    {
        let scale = crate::constants::MRAD_PER_S;
        match self {
            Self::Scalar(r) => Ok(nd::ArrayD::from_elem(shape, *r * scale)),
            Self::Array(a) => {
                let a = a.borrow();
                a.broadcast(shape)
                    .map(|b| b.mapv(|r| r * scale))
                    .ok_or_else(|| SolutionError::Broadcast {
                        from: a.shape().to_vec(),
                        to: shape.to_vec(),
                    })
            },
        }
    }
}

/* Couplings ******************************************************************/

/// A single named parameter of a field coupling.
#[derive(Clone, Debug, PartialEq)]
pub enum CouplingParam {
    Float(f64),
    Array(Shared<nd::ArrayD<f64>>),
    Text(String),
}

impl From<f64> for CouplingParam {
    fn from(x: f64) -> Self { Self::Float(x) }
}

impl From<nd::ArrayD<f64>> for CouplingParam {
    fn from(a: nd::ArrayD<f64>) -> Self { Self::Array(a.into()) }
}

impl From<nd::Array1<f64>> for CouplingParam {
    fn from(a: nd::Array1<f64>) -> Self { Self::Array(a.into_dyn().into()) }
}

impl From<&str> for CouplingParam {
    fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

impl From<String> for CouplingParam {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl CouplingParam {
    /// Copy into new storage if array-valued.
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Array(a) => Self::Array(a.deep_clone()),
            other => other.clone(),
        }
    }
}

/// Field couplings keyed by the pair of states they connect, each holding its
/// named parameters (e.g. `rabi_frequency`, `detuning`) in insertion order.
pub type Couplings = IndexMap<(usize, usize), IndexMap<String, CouplingParam>>;

/// Copy a set of couplings, giving every array-valued parameter new storage.
pub fn deep_clone_couplings(couplings: &Couplings) -> Couplings {
    couplings.iter()
        .map(|(edge, params)| {
            let params
                = params.iter()
                .map(|(name, p)| (name.clone(), p.deep_clone()))
                .collect();
            (*edge, params)
        })
        .collect()
}

/* Parameter names ************************************************************/

/// Names of the optional experimental parameters of a solution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Eta,
    Kappa,
    ProbeTuple,
    ProbeFreq,
    ProbeRabi,
    CellLength,
    BeamArea,
}

impl Param {
    /// Field name of the parameter.
    pub fn name(self) -> &'static str {
        match self {
            Self::Eta => "eta",
            Self::Kappa => "kappa",
            Self::ProbeTuple => "probe_tuple",
            Self::ProbeFreq => "probe_freq",
            Self::ProbeRabi => "probe_rabi",
            Self::CellLength => "cell_length",
            Self::BeamArea => "beam_area",
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/* Experimental parameters ****************************************************/

/// The optional experimental parameters of a solution, grouped.
///
/// All fields default to `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentParams {
    /// Eta constant of the cell.
    pub eta: Option<f64>,
    /// Kappa constant of the cell.
    pub kappa: Option<f64>,
    /// Coupling edge corresponding to the probing field.
    pub probe_tuple: Option<(usize, usize)>,
    /// Probe transition frequency, in rad/s.
    pub probe_freq: Option<f64>,
    /// Probe Rabi frequency, in Mrad/s.
    pub probe_rabi: Option<ProbeRabi>,
    /// Optical path length of the medium, in meters.
    pub cell_length: Option<f64>,
    /// Cross-sectional area of the probing beam, in square meters.
    pub beam_area: Option<f64>,
}

impl ExperimentParams {
    /// Create a new, empty set of parameters.
    pub fn new() -> Self { Self::default() }

    /// Parse parameters from a TOML document.
    ///
    /// Recognized top-level keys are the field names of this struct.
    /// `probe_tuple` must be a pair of non-negative integers and `probe_rabi`
    /// either a number or an array of numbers; all others are numbers. Missing
    /// keys are left `None`; unknown keys are an error.
    pub fn from_toml_str(src: &str) -> SolutionResult<Self> {
        let config: ExperimentConfig = toml::from_str(src)?;
        Ok(config.into())
    }

    /// Read parameters from a TOML file. See [`Self::from_toml_str`].
    pub fn from_file<P>(path: P) -> SolutionResult<Self>
    where P: AsRef<Path>
    {
        let src = std::fs::read_to_string(path)?;
        Self::from_toml_str(&src)
    }
}

/// On-disk form of [`ExperimentParams`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExperimentConfig {
    eta: Option<f64>,
    kappa: Option<f64>,
    probe_tuple: Option<(usize, usize)>,
    probe_freq: Option<f64>,
    probe_rabi: Option<RabiConfig>,
    cell_length: Option<f64>,
    beam_area: Option<f64>,
}

/// Probe Rabi frequency given as a single number or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RabiConfig {
    Scalar(f64),
    List(Vec<f64>),
}

impl From<ExperimentConfig> for ExperimentParams {
    fn from(config: ExperimentConfig) -> Self {
        let probe_rabi
            = config.probe_rabi
            .map(|rabi| match rabi {
                RabiConfig::Scalar(r) => ProbeRabi::Scalar(r),
                RabiConfig::List(rs) => nd::Array1::from(rs).into(),
            });
        Self {
            eta: config.eta,
            kappa: config.kappa,
            probe_tuple: config.probe_tuple,
            probe_freq: config.probe_freq,
            probe_rabi,
            cell_length: config.cell_length,
            beam_area: config.beam_area,
        }
    }
}
