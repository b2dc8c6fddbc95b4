//! Errors and non-fatal warnings produced while reading a [`Solution`].
//!
//! [`Solution`]: crate::solution::Solution

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SolutionResult<T> = Result<T, SolutionError>;

#[derive(Debug, Error)]
pub enum SolutionError {
    /// One or more optional parameters required by a derived quantity are
    /// `None`. Every missing name is listed.
    #[error(
        "Required parameters not defined: {0:?}\n\
        Please define them on the solution and redo the calculation."
    )]
    Undefined(Vec<&'static str>),

    #[error("No element with index {index} for {basis_size}-level system")]
    ElementIndex { index: isize, basis_size: usize },

    #[error(
        "density matrix element ({i}, {j}) does not exist for \
        {basis_size}-level system"
    )]
    BasisIndex { i: usize, j: usize, basis_size: usize },

    #[error(
        "last axis of rho has length {0}, which is not n^2 - 1 for any \
        n >= 2"
    )]
    BasisLength(usize),

    #[error(
        "expected stacks of n x n matrices with n >= 2, got shape {0:?}"
    )]
    NotSquare(Vec<usize>),

    #[error("basis has {labels} labels but rho stores {elements} elements")]
    BasisLabels { labels: usize, elements: usize },

    #[error("got {labels} axis labels but {values} axis value arrays")]
    AxisCount { labels: usize, values: usize },

    #[error(
        "axis {axis} ({label:?}) has {len} values but rho has {dim} \
        entries along it"
    )]
    AxisLength { axis: usize, label: String, len: usize, dim: usize },

    #[error("rho has {found} leading axes; expected {expected}")]
    LeadingAxes { found: usize, expected: usize },

    #[error("time array has {len} points but rho has {dim} time steps")]
    TimeLength { len: usize, dim: usize },

    #[error("array of shape {from:?} cannot be broadcast to shape {to:?}")]
    Broadcast { from: Vec<usize>, to: Vec<usize> },

    #[error("no field named {0:?}")]
    NoField(String),

    #[error("field {field:?} expects {expected}")]
    FieldType { field: &'static str, expected: &'static str },

    #[error("could not parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not write TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not write npz archive: {0}")]
    Npz(#[from] ndarray_npy::WriteNpzError),
}

/// Conditions that leave a computed quantity usable but suspect.
#[derive(Clone, Debug, PartialEq)]
pub enum SolutionWarning {
    /// At least one optical depth exceeds 1, so the optically-thin
    /// approximation used to derive it is likely invalid.
    OpticallyThick { max_od: f64 },
}

impl std::fmt::Display for SolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpticallyThick { max_od } => write!(
                f,
                "At least one solution has optical depth greater than 1 \
                (max {max_od}). Integrated results are likely invalid."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_lists_every_name() {
        let err = SolutionError::Undefined(vec!["probe_rabi", "kappa"]);
        let msg = err.to_string();
        assert!(msg.starts_with("Required parameters not defined"));
        assert!(msg.contains("\"probe_rabi\""));
        assert!(msg.contains("\"kappa\""));
    }

    #[test]
    fn element_index_reports_basis_size() {
        let err = SolutionError::ElementIndex { index: 8, basis_size: 3 };
        assert_eq!(
            err.to_string(),
            "No element with index 8 for 3-level system",
        );
    }
}
