// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! A thermal Maxwell-Jüttner distribution.

The electrons are isotropic. The temperature is specified in keV and
converted to the dimensionless *theta*, the ratio of the particles’ thermal
energy to their rest-mass energy. The density is normalized analytically
through the modified Bessel function `K_2(1/theta)`. Nothing stops *theta*
from approaching zero, where that normalization underflows; SZ work cares
about temperatures of a few keV and up, where it is perfectly well behaved.

*/

use special_fun::FloatSpecial;
use std::f64;

use conversions::{beta_to_gamma, kelvin_to_theta, kev_to_kelvin};
use super::ElectronDistribution;


/// Parameters for a thermal Jüttner electron distribution. See the module-level
/// documentation for details.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct ThermalJuettnerDistribution {
    te_kev: f64,
    theta: f64,
    norm: f64,
}


impl ElectronDistribution for ThermalJuettnerDistribution {
    fn density(&self, beta: f64) -> f64 {
        let gamma = beta_to_gamma(beta);
        self.norm * gamma.powi(5) * beta * beta * (-gamma / self.theta).exp()
    }
}


impl ThermalJuettnerDistribution {
    /// Create a new thermal Jüttner distribution with the specified
    /// electron temperature in keV.
    pub fn new(te_kev: f64) -> Self {
        let theta = kelvin_to_theta(kev_to_kelvin(te_kev));

        ThermalJuettnerDistribution {
            te_kev: te_kev,
            theta: theta,
            norm: 1. / (theta * (1. / theta).besselk(2)),
        }
    }

    /// The electron temperature, in keV.
    pub fn temperature_kev(&self) -> f64 {
        self.te_kev
    }

    /// The dimensionless temperature `k T / m_e c^2`.
    pub fn theta(&self) -> f64 {
        self.theta
    }
}
