// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Compute synthetic Sunyaev-Zel'dovich spectra.

Free electrons along a line of sight Compton-scatter the photons of a
background radiation field (usually the CMB) and shift them in frequency.
This crate computes the resulting spectral distortion for relativistic
thermal (Maxwell-Jüttner) and power-law electron populations, along with
the kinematic distortion caused by bulk motion of the gas. The approach is
the one described by [Birkinshaw (1999;
DOI:10.1016/S0370-1573(98)00080-5)](https://dx.doi.org/10.1016/S0370-1573(98)00080-5),
building on the scattering kernel of [Wright
(1979)](https://dx.doi.org/10.1086/157161).

The basic structure of the problem is a nested integral. For a single
electron of speed *beta*, the probability that a scattered photon has its
frequency changed by a logarithmic shift *s* is an integral over the
direction cosine *mu* of the incoming photon. Averaging that over the
electron speed distribution gives the multi-electron kernel *P(s)*, and
convolving *P(s)* with the background spectrum gives the scattered
intensity. The kernel is expensive and does not depend on the observing
frequency, so we evaluate it once and reuse it across frequencies, either
on a fixed grid or through a two-pass Romberg scheme (see the [`romberg`]
module).

All quantities are in SI units unless noted otherwise. Electron
temperatures are given in keV and peculiar velocities in km/s, as is
conventional.

*/

#![deny(missing_docs)]

#[cfg(test)] #[macro_use] extern crate assert_approx_eq;
#[macro_use] extern crate slog;
extern crate special_fun;
#[cfg(test)] extern crate szkernel_test_support;

use std::error;
use std::f64;
use std::fmt;

pub mod analytic;
pub mod background;
pub mod conversions;
pub mod isobeta;
pub mod kernel;
pub mod power_law;
pub mod quadrature;
pub mod romberg;
pub mod scattering;
pub mod signal;
pub mod thermal_juettner;

pub use background::{BackgroundSpectrum, Blackbody};
pub use isobeta::{IsoBetaModel, ProfileMode};
pub use kernel::KernelCalculator;
pub use power_law::PowerLawDistribution;
pub use romberg::EvaluationLedger;
pub use signal::{KernelMethod, KinematicSignal, SzSignal};
pub use thermal_juettner::ThermalJuettnerDistribution;

pub use f64::consts::PI;

/// The Planck constant, in J s.
pub const PLANCK: f64 = 6.62607015e-34;

/// The Boltzmann constant, in J / K.
pub const BOLTZMANN: f64 = 1.380649e-23;

/// The speed of light, in m / s.
pub const SPEED_LIGHT: f64 = 2.99792458e8;

/// The mass of the electron, in kg.
pub const MASS_ELECTRON: f64 = 9.1093837e-31;

/// One electronvolt, in J.
pub const ELECTRONVOLT: f64 = 1.602176634e-19;

/// The Thomson scattering cross section, in m^2.
pub const SIGMA_THOMSON: f64 = 6.65245e-29;

/// The temperature of the CMB, in K.
pub const T_CMB: f64 = 2.726;

/// The largest electron speed we ever integrate up to. Keeping this a hair
/// below unity keeps `gamma` finite everywhere.
pub const BETA_MAX: f64 = 0.99999999999;


/// An isotropic electron distribution, expressed as a probability density
/// in the dimensionless speed *beta*.
///
/// Implementations must be `Sync` since kernel evaluations are spread
/// across worker threads that all read the same distribution.
pub trait ElectronDistribution: fmt::Debug + Sync {
    /// The probability density `dP / d(beta)`.
    fn density(&self, beta: f64) -> f64;

    /// The range of speeds over which the density can be nonzero.
    fn speed_limits(&self) -> (f64, f64) {
        (0., BETA_MAX)
    }

    /// Evaluate the density at every speed in `betas`, writing the results
    /// into `output`. The two slices must have the same length.
    fn fill_density(&self, betas: &[f64], output: &mut [f64]) {
        for (o, &beta) in output.iter_mut().zip(betas) {
            *o = self.density(beta);
        }
    }
}


/// The electron populations that we know how to compute signals for.
#[derive(Copy,Clone,Debug,PartialEq)]
pub enum Population {
    /// A relativistic thermal population.
    Thermal(ThermalJuettnerDistribution),

    /// A relativistic power-law population.
    PowerLaw(PowerLawDistribution),
}

impl Population {
    /// A thermal population with the given electron temperature in keV.
    pub fn thermal(te_kev: f64) -> Self {
        Population::Thermal(ThermalJuettnerDistribution::new(te_kev))
    }

    /// A power-law population with the given slope and the default speed
    /// limits.
    pub fn power_law(alpha: f64) -> Self {
        Population::PowerLaw(PowerLawDistribution::new(alpha))
    }

    /// The range of shifts that captures essentially all of the scattered
    /// photons for this kind of population.
    pub fn default_shift_range(&self) -> (f64, f64) {
        match *self {
            Population::Thermal(_) => (-1.2, 2.),
            Population::PowerLaw(_) => (-1.2, 10.),
        }
    }
}

impl ElectronDistribution for Population {
    fn density(&self, beta: f64) -> f64 {
        match *self {
            Population::Thermal(ref d) => d.density(beta),
            Population::PowerLaw(ref d) => d.density(beta),
        }
    }

    fn speed_limits(&self) -> (f64, f64) {
        match *self {
            Population::Thermal(ref d) => d.speed_limits(),
            Population::PowerLaw(ref d) => d.speed_limits(),
        }
    }
}


/// Errors raised at the array-oriented boundary of the crate. The numerical
/// core itself never fails; it returns its best estimate instead.
#[derive(Clone,Debug,PartialEq)]
pub enum SzError {
    /// Two arrays that must have matching sizes do not.
    LengthMismatch {
        /// What was being computed.
        context: &'static str,
        /// The required length.
        expected: usize,
        /// The length that was supplied.
        found: usize,
    },

    /// A Romberg ledger does not contain the number of samples implied by
    /// its row count, so it cannot be replayed.
    LedgerMismatch {
        /// The number of refinement rows claimed.
        rows: usize,
        /// The number of recorded samples.
        samples: usize,
    },
}

impl fmt::Display for SzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SzError::LengthMismatch { context, expected, found } => {
                write!(f, "{}: expected {} elements, got {}", context, expected, found)
            },
            SzError::LedgerMismatch { rows, samples } => {
                write!(f, "Romberg ledger with {} rows cannot hold {} samples", rows, samples)
            },
        }
    }
}

impl error::Error for SzError {}

/// A `Result` whose error type is `SzError`.
pub type SzResult<T> = Result<T, SzError>;


/// Check that an output slice matches the size of its input.
pub(crate) fn check_len(context: &'static str, expected: usize, found: usize) -> SzResult<()> {
    if expected != found {
        return Err(SzError::LengthMismatch { context, expected, found });
    }

    Ok(())
}


/// A logger that throws everything away. Calculators use this unless they
/// are handed a real one.
pub(crate) fn discard_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, o!())
}
