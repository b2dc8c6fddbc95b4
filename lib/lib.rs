//! Container for density-matrix solutions of driven multilevel systems and
//! the optical quantities derived from them.
//!
//! A [`Solution`] is filled once by an external solver and read thereafter.
//! Besides plain field access it offers a key-based view over the same data
//! (see [`fields`]) and closed-form post-processing: susceptibility, optical
//! depth, transmission and phase shift on the probe transition.

pub mod constants;
pub mod error;
pub mod shared;
pub mod hilbert;
pub mod params;
pub mod solution;
pub mod fields;
pub mod io;

pub use error::{ SolutionError, SolutionResult, SolutionWarning };
pub use fields::{ FieldRef, FieldValue };
pub use io::{ CouplingValue, SolutionMetadata };
pub use params::{
    CouplingParam,
    Couplings,
    ExperimentParams,
    Param,
    ProbeRabi,
};
pub use shared::Shared;
pub use solution::Solution;
