// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

//! Unit conversions.

use super::{BOLTZMANN, ELECTRONVOLT, MASS_ELECTRON, PI, PLANCK, SPEED_LIGHT};

/// One parsec, in meters.
pub const PARSEC: f64 = 3.0857e16;

/// Convert an energy in keV to a temperature in kelvin.
pub fn kev_to_kelvin(energy_kev: f64) -> f64 {
    energy_kev * 1e3 * ELECTRONVOLT / BOLTZMANN
}

/// Convert an energy in eV to a temperature in kelvin.
pub fn ev_to_kelvin(energy_ev: f64) -> f64 {
    energy_ev * ELECTRONVOLT / BOLTZMANN
}

/// The dimensionless temperature `k T / m_e c^2` of an electron gas at
/// temperature `t` in kelvin.
pub fn kelvin_to_theta(t: f64) -> f64 {
    BOLTZMANN * t / (MASS_ELECTRON * SPEED_LIGHT * SPEED_LIGHT)
}

/// Convert a velocity in m/s to a dimensionless speed.
pub fn velocity_to_beta(velocity: f64) -> f64 {
    velocity / SPEED_LIGHT
}

/// The Lorentz factor for a dimensionless speed.
#[inline]
pub fn beta_to_gamma(beta: f64) -> f64 {
    1. / (1. - beta * beta).sqrt()
}

/// The Lorentz factor for a velocity in m/s.
pub fn velocity_to_gamma(velocity: f64) -> f64 {
    beta_to_gamma(velocity_to_beta(velocity))
}

/// The dimensionless speed for a Lorentz factor.
pub fn gamma_to_beta(gamma: f64) -> f64 {
    (1. - 1. / (gamma * gamma)).sqrt()
}

/// Convert parsecs to meters.
pub fn pc_to_m(l_pc: f64) -> f64 {
    l_pc * PARSEC
}

/// Convert megaparsecs to meters.
pub fn mpc_to_m(l_mpc: f64) -> f64 {
    l_mpc * 1e6 * PARSEC
}

/// Convert arcseconds to radians.
pub fn arcsec_to_rad(angle: f64) -> f64 {
    angle / 3600. * PI / 180.
}

/// The dimensionless frequency `h nu / k T` for a radiation temperature `t`.
pub fn dimensionless_frequency(nu: f64, t: f64) -> f64 {
    PLANCK * nu / (BOLTZMANN * t)
}

/// Convert a specific intensity in W / m^2 / Hz / sr to Jy / sr.
pub fn si_to_jy_per_sr(intensity: f64) -> f64 {
    intensity / 1e-26
}

/// Convert a specific intensity in W / m^2 / Hz / sr at frequency `nu` to a
/// brightness temperature in kelvin, inverting the Planck law.
pub fn si_to_brightness_temperature(intensity: f64, nu: f64) -> f64 {
    PLANCK * nu / BOLTZMANN
        / (1. + 2. * PLANCK * nu.powi(3) / (intensity * SPEED_LIGHT * SPEED_LIGHT)).ln()
}
