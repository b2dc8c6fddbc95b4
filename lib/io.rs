//! Export of a [`Solution`] to disk.
//!
//! Arrays go into a single `.npz` archive (readable with `numpy.load`) and
//! everything else into a TOML metadata table.

use std::{ fs::File, io::{ BufWriter, Write }, path::Path };
use indexmap::IndexMap;
use ndarray_npy::NpzWriter;
use serde::Serialize;
use tracing::debug;
use crate::{
    error::SolutionResult,
    params::{ CouplingParam, ProbeRabi },
    solution::Solution,
};

/// Non-array metadata of a [`Solution`], as written by
/// [`Solution::write_metadata`].
///
/// Undefined optional parameters are omitted from the output. Couplings are
/// keyed `"i,j"`, and array-valued coupling parameters are flattened.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolutionMetadata {
    pub rq_version: String,
    pub basis: Vec<String>,
    pub axis_labels: Vec<String>,
    /// Shape of `rho`.
    pub shape: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kappa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_tuple: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_freq: Option<f64>,
    /// Scalar probe Rabi frequency only; arrays go to the `.npz` archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_rabi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beam_area: Option<f64>,
    pub couplings: IndexMap<String, IndexMap<String, CouplingValue>>,
}

/// Serialized form of a [`CouplingParam`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CouplingValue {
    Float(f64),
    Text(String),
    Array(Vec<f64>),
}

impl From<&CouplingParam> for CouplingValue {
    fn from(param: &CouplingParam) -> Self {
        match param {
            CouplingParam::Float(x) => Self::Float(*x),
            CouplingParam::Text(s) => Self::Text(s.clone()),
            CouplingParam::Array(a) => {
                Self::Array(a.borrow().iter().copied().collect())
            },
        }
    }
}

impl Solution {
    /// Write all array-valued fields to an `.npz` archive at `path`.
    ///
    /// The archive holds `rho`, one `axis_values_{k}` entry per scan axis, and
    /// `doppler_classes`, `t`, `init_cond` and `probe_rabi` when they are
    /// defined (the last only if array-valued).
    pub fn write_npz<P>(&self, path: P) -> SolutionResult<()>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        let mut npz = NpzWriter::new(BufWriter::new(File::create(path)?));
        npz.add_array("rho", &*self.rho.borrow())?;
        for (k, values) in self.axis_values.iter().enumerate() {
            npz.add_array(format!("axis_values_{}", k), &*values.borrow())?;
        }
        if let Some(doppler) = &self.doppler_classes {
            npz.add_array("doppler_classes", &*doppler.borrow())?;
        }
        if let Some(t) = &self.t {
            npz.add_array("t", &*t.borrow())?;
        }
        if let Some(init_cond) = &self.init_cond {
            npz.add_array("init_cond", &*init_cond.borrow())?;
        }
        if let Some(ProbeRabi::Array(rabi)) = &self.probe_rabi {
            npz.add_array("probe_rabi", &*rabi.borrow())?;
        }
        npz.finish()?.flush()?;
        debug!(path = %path.display(), "wrote solution arrays");
        Ok(())
    }

    /// Collect the non-array metadata of the solution.
    pub fn metadata(&self) -> SolutionMetadata {
        let probe_rabi
            = match self.probe_rabi {
                Some(ProbeRabi::Scalar(r)) => Some(r),
                _ => None,
            };
        let couplings
            = self.couplings.iter()
            .map(|((i, j), params)| {
                let params: IndexMap<String, CouplingValue>
                    = params.iter()
                    .map(|(name, p)| (name.clone(), p.into()))
                    .collect();
                (format!("{},{}", i, j), params)
            })
            .collect();
        SolutionMetadata {
            rq_version: self.rq_version.clone(),
            basis: self.basis.clone(),
            axis_labels: self.axis_labels.clone(),
            shape: self.rho.borrow().shape().to_vec(),
            eta: self.eta,
            kappa: self.kappa,
            probe_tuple: self.probe_tuple,
            probe_freq: self.probe_freq,
            probe_rabi,
            cell_length: self.cell_length,
            beam_area: self.beam_area,
            couplings,
        }
    }

    /// Write [`Self::metadata`] to a TOML file at `path`.
    pub fn write_metadata<P>(&self, path: P) -> SolutionResult<()>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        std::fs::write(path, toml::to_string(&self.metadata())?)?;
        debug!(path = %path.display(), "wrote solution metadata");
        Ok(())
    }
}
