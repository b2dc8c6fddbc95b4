//! Physical constants and unit conversions.

use std::f64::consts::TAU;

// speed of light in vacuum [m / s]
pub const C_LIGHT: f64 = 299792458.0;

// Rabi frequencies are stored in Mrad/s [rad / s / (Mrad / s)]
pub const MRAD_PER_S: f64 = 1e6;

// largest optical depth for which the optically-thin approximation is trusted
// [dimensionless]
pub const OD_THIN_LIMIT: f64 = 1.0;

/// Convert an angular frequency in rad/s to a vacuum wavelength in meters.
///
/// The sign of the frequency is discarded.
pub fn wavelength(angular_freq: f64) -> f64 {
    (C_LIGHT / (angular_freq / TAU)).abs()
}

/// Convert a vacuum wavelength in meters to a wavenumber in 1/m.
pub fn wavevector(wavelength: f64) -> f64 { TAU / wavelength }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rb_d2_wavelength() {
        // Rb D2 line at 384.230 THz sits at ~780.24 nm
        let omega = TAU * 384.230484468e12;
        let lambda = wavelength(omega);
        assert!((lambda - 780.241e-9).abs() < 1e-12);
        assert!((wavevector(lambda) - omega / C_LIGHT).abs() < 1e-3);
    }

    #[test]
    fn negative_frequency_gives_positive_wavelength() {
        assert_eq!(wavelength(-1e15), wavelength(1e15));
    }
}
