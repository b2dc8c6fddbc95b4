//! Access to the fields of a [`Solution`] by name.
//!
//! [`Solution::get`] returns a [`FieldRef`] borrowing directly from the struct,
//! so array fields come back as the very same [`Shared`] handles the struct
//! holds and in-place edits through either route are visible through both.
//! [`Solution::set`] writes an owned [`FieldValue`] into the named field.
//!
//! The fields `t` and `init_cond` exist as keys only when they are defined;
//! every other field is always a key, possibly holding [`FieldRef::None`].

use ndarray as nd;
use crate::{
    error::{ SolutionError, SolutionResult },
    params::{ Couplings, Param, ProbeRabi },
    shared::Shared,
    solution::Solution,
};

/// Keys present on every solution, in declaration order.
pub const FIELD_NAMES: [&str; 14] = [
    "rho",
    "eta",
    "kappa",
    "probe_tuple",
    "probe_freq",
    "probe_rabi",
    "cell_length",
    "beam_area",
    "couplings",
    "axis_labels",
    "axis_values",
    "rq_version",
    "basis",
    "doppler_classes",
];

/// Keys present only on time-domain solutions.
pub const TIME_FIELD_NAMES: [&str; 2] = ["t", "init_cond"];

/// Borrowed view of a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldRef<'a> {
    /// An optional field that is not defined.
    None,
    Float(f64),
    Pair(usize, usize),
    Text(&'a str),
    Labels(&'a [String]),
    Array(&'a Shared<nd::ArrayD<f64>>),
    Vector(&'a Shared<nd::Array1<f64>>),
    Vectors(&'a [Shared<nd::Array1<f64>>]),
    Rabi(&'a ProbeRabi),
    Couplings(&'a Couplings),
}

impl FieldRef<'_> {
    /// Return `true` for [`FieldRef::None`].
    pub fn is_none(&self) -> bool { matches!(self, Self::None) }
}

/// Owned value to store in a field.
///
/// `None` clears an optional field; arrays are moved into fresh [`Shared`]
/// storage.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    None,
    Float(f64),
    Pair(usize, usize),
    Text(String),
    Labels(Vec<String>),
    Array(nd::ArrayD<f64>),
    Vector(nd::Array1<f64>),
    Vectors(Vec<nd::Array1<f64>>),
    Rabi(ProbeRabi),
    Couplings(Couplings),
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self { Self::Float(x) }
}

impl From<(usize, usize)> for FieldValue {
    fn from(ij: (usize, usize)) -> Self { Self::Pair(ij.0, ij.1) }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

impl From<nd::ArrayD<f64>> for FieldValue {
    fn from(a: nd::ArrayD<f64>) -> Self { Self::Array(a) }
}

impl From<nd::Array1<f64>> for FieldValue {
    fn from(a: nd::Array1<f64>) -> Self { Self::Vector(a) }
}

impl From<Vec<String>> for FieldValue {
    fn from(labels: Vec<String>) -> Self { Self::Labels(labels) }
}

impl From<Couplings> for FieldValue {
    fn from(couplings: Couplings) -> Self { Self::Couplings(couplings) }
}

impl From<ProbeRabi> for FieldValue {
    fn from(rabi: ProbeRabi) -> Self { Self::Rabi(rabi) }
}

impl<T> From<Option<T>> for FieldValue
where T: Into<FieldValue>
{
    fn from(maybe: Option<T>) -> Self {
        maybe.map(Into::into).unwrap_or(Self::None)
    }
}

fn opt_float(x: Option<f64>) -> FieldRef<'static> {
    x.map(FieldRef::Float).unwrap_or(FieldRef::None)
}

fn canonical(name: &str) -> Option<&'static str> {
    FIELD_NAMES.iter().chain(TIME_FIELD_NAMES.iter())
        .find(|n| **n == name)
        .copied()
}

fn mismatch(field: &'static str, expected: &'static str) -> SolutionError {
    SolutionError::FieldType { field, expected }
}

fn set_opt_float(
    slot: &mut Option<f64>,
    field: &'static str,
    value: FieldValue,
) -> SolutionResult<()>
{
    *slot = match value {
        FieldValue::None => None,
        FieldValue::Float(x) => Some(x),
        _ => return Err(mismatch(field, "a float or None")),
    };
    Ok(())
}

fn set_opt_array(
    slot: &mut Option<Shared<nd::ArrayD<f64>>>,
    field: &'static str,
    value: FieldValue,
) -> SolutionResult<()>
{
    *slot = match value {
        FieldValue::None => None,
        FieldValue::Array(a) => Some(a.into()),
        FieldValue::Vector(a) => Some(a.into_dyn().into()),
        _ => return Err(mismatch(field, "an array or None")),
    };
    Ok(())
}

impl Solution {
    /// Names of all keys currently present, in declaration order.
    pub fn keys(&self) -> Vec<&'static str> {
        let time_keys
            = TIME_FIELD_NAMES.iter()
            .filter(|name| self.contains_key(name));
        FIELD_NAMES.iter().chain(time_keys).copied().collect()
    }

    /// Return `true` if `name` is currently a key.
    pub fn contains_key(&self, name: &str) -> bool {
        match name {
            "t" => self.t.is_some(),
            "init_cond" => self.init_cond.is_some(),
            _ => FIELD_NAMES.iter().any(|n| *n == name),
        }
    }

    /// Look up a field by name.
    ///
    /// Fails with [`SolutionError::NoField`] if `name` is not a key; see the
    /// [module docs][crate::fields].
    pub fn get(&self, name: &str) -> SolutionResult<FieldRef<'_>> {
        let field = match name {
            "rho" => FieldRef::Array(&self.rho),
            "eta" => opt_float(self.eta),
            "kappa" => opt_float(self.kappa),
            "probe_tuple" => {
                self.probe_tuple
                    .map(|(i, j)| FieldRef::Pair(i, j))
                    .unwrap_or(FieldRef::None)
            },
            "probe_freq" => opt_float(self.probe_freq),
            "probe_rabi" => {
                self.probe_rabi.as_ref()
                    .map(FieldRef::Rabi)
                    .unwrap_or(FieldRef::None)
            },
            "cell_length" => opt_float(self.cell_length),
            "beam_area" => opt_float(self.beam_area),
            "couplings" => FieldRef::Couplings(&self.couplings),
            "axis_labels" => FieldRef::Labels(&self.axis_labels),
            "axis_values" => FieldRef::Vectors(&self.axis_values),
            "rq_version" => FieldRef::Text(&self.rq_version),
            "basis" => FieldRef::Labels(&self.basis),
            "doppler_classes" => {
                self.doppler_classes.as_ref()
                    .map(FieldRef::Array)
                    .unwrap_or(FieldRef::None)
            },
            "t" => {
                self.t.as_ref()
                    .map(FieldRef::Vector)
                    .ok_or_else(|| SolutionError::NoField(name.to_string()))?
            },
            "init_cond" => {
                self.init_cond.as_ref()
                    .map(FieldRef::Array)
                    .ok_or_else(|| SolutionError::NoField(name.to_string()))?
            },
            _ => return Err(SolutionError::NoField(name.to_string())),
        };
        Ok(field)
    }

    /// Look up an optional experimental parameter.
    pub fn get_param(&self, param: Param) -> FieldRef<'_> {
        // every parameter name is a permanent key
        self.get(param.name()).unwrap_or(FieldRef::None)
    }

    /// Store a value in a field by name.
    ///
    /// Required fields reject [`FieldValue::None`]. Setting `t` or
    /// `init_cond` to `None` removes the key. No shape validation is
    /// performed; call [`Solution::validate`] after editing shapes.
    pub fn set<V>(&mut self, name: &str, value: V) -> SolutionResult<()>
    where V: Into<FieldValue>
    {
        let field
            = canonical(name)
            .ok_or_else(|| SolutionError::NoField(name.to_string()))?;
        let value: FieldValue = value.into();
        match field {
            "rho" => match value {
                FieldValue::Array(a) => { self.rho = a.into(); },
                FieldValue::Vector(a) => { self.rho = a.into_dyn().into(); },
                _ => return Err(mismatch(field, "an array")),
            },
            "eta" => set_opt_float(&mut self.eta, field, value)?,
            "kappa" => set_opt_float(&mut self.kappa, field, value)?,
            "probe_tuple" => {
                self.probe_tuple = match value {
                    FieldValue::None => None,
                    FieldValue::Pair(i, j) => Some((i, j)),
                    _ => return Err(mismatch(field, "a pair or None")),
                };
            },
            "probe_freq" => set_opt_float(&mut self.probe_freq, field, value)?,
            "probe_rabi" => {
                self.probe_rabi = match value {
                    FieldValue::None => None,
                    FieldValue::Float(r) => Some(ProbeRabi::Scalar(r)),
                    FieldValue::Rabi(r) => Some(r),
                    FieldValue::Array(a) => Some(a.into()),
                    FieldValue::Vector(a) => Some(a.into()),
                    _ => {
                        return Err(mismatch(field, "a float, array or None"));
                    },
                };
            },
            "cell_length" => {
                set_opt_float(&mut self.cell_length, field, value)?
            },
            "beam_area" => set_opt_float(&mut self.beam_area, field, value)?,
            "couplings" => match value {
                FieldValue::Couplings(c) => { self.couplings = c; },
                _ => return Err(mismatch(field, "couplings")),
            },
            "axis_labels" | "basis" => {
                let FieldValue::Labels(labels) = value else {
                    return Err(mismatch(field, "a list of strings"));
                };
                if field == "basis" {
                    self.basis = labels;
                } else {
                    self.axis_labels = labels;
                }
            },
            "axis_values" => match value {
                FieldValue::Vectors(v) => {
                    self.axis_values = v.into_iter().map(Shared::new).collect();
                },
                _ => return Err(mismatch(field, "a list of 1D arrays")),
            },
            "rq_version" => match value {
                FieldValue::Text(s) => { self.rq_version = s; },
                _ => return Err(mismatch(field, "a string")),
            },
            "doppler_classes" => {
                set_opt_array(&mut self.doppler_classes, field, value)?
            },
            "t" => {
                self.t = match value {
                    FieldValue::None => None,
                    FieldValue::Vector(a) => Some(a.into()),
                    _ => return Err(mismatch(field, "a 1D array or None")),
                };
            },
            "init_cond" => set_opt_array(&mut self.init_cond, field, value)?,
            _ => return Err(SolutionError::NoField(name.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hilbert;

    fn solution() -> Solution {
        Solution::new(
            nd::Array1::<f64>::zeros(8),
            hilbert::basis_labels(3),
            vec![],
            vec![],
            Couplings::new(),
            "1.2.0",
        )
        .unwrap()
    }

    #[test]
    fn keys_follow_time_fields() {
        let sol = solution();
        assert_eq!(sol.keys(), FIELD_NAMES.to_vec());
        assert!(!sol.contains_key("t"));
        assert!(matches!(sol.get("t"), Err(SolutionError::NoField(_))));
        assert!(matches!(sol.get("foo"), Err(SolutionError::NoField(_))));
        assert!(sol.get("eta").unwrap().is_none());
    }

    #[test]
    fn set_then_read_attribute() {
        let mut sol = solution();
        sol.set("kappa", 3.5).unwrap();
        assert_eq!(sol.kappa, Some(3.5));
        sol.set("probe_tuple", (0_usize, 2_usize)).unwrap();
        assert_eq!(sol.probe_tuple, Some((0, 2)));
        sol.set("probe_rabi", nd::array![1.0, 2.0]).unwrap();
        assert_eq!(sol.probe_rabi, Some(ProbeRabi::from(nd::array![1.0, 2.0])));
        sol.set("kappa", FieldValue::None).unwrap();
        assert_eq!(sol.kappa, None);
        sol.set("rq_version", "2.0").unwrap();
        assert_eq!(sol.get("rq_version").unwrap(), FieldRef::Text("2.0"));
    }

    #[test]
    fn type_mismatch_rejected() {
        let mut sol = solution();
        assert!(matches!(
            sol.set("kappa", "large"),
            Err(SolutionError::FieldType { field: "kappa", .. }),
        ));
        assert!(matches!(
            sol.set("rho", FieldValue::None),
            Err(SolutionError::FieldType { field: "rho", .. }),
        ));
        assert!(matches!(
            sol.set("nope", 1.0),
            Err(SolutionError::NoField(_)),
        ));
    }

    #[test]
    fn time_keys_appear_when_set() {
        let mut sol = solution();
        sol.set("t", nd::Array1::linspace(0.0, 1.0, 3)).unwrap();
        assert!(sol.contains_key("t"));
        assert_eq!(sol.keys().last(), Some(&"t"));
        sol.set("t", FieldValue::None).unwrap();
        assert!(!sol.contains_key("t"));
    }
}
