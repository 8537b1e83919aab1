// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The relativistic power-law distribution function.

The electrons are isotropic. The distribution is zero outside of the speed
bounds `beta_min` and `beta_max`. The power-law index is `alpha`, such that
`dN/dgamma ~ gamma^(-alpha)`; in terms of *beta* that becomes

```text
dN/dbeta = A gamma^(-alpha) beta (1 - beta^2)^(-3/2)
```

The normalization `A` depends on `alpha` and both bounds, so every method
that changes one of those recomputes it.

A slope of exactly one, or a negative slope, selects the special case
`alpha = 1`. There the normalization is taken to be `log10(gamma2 /
gamma1)`. Note that this is *not* the reciprocal of the natural-log integral
of `1/gamma`, so the `alpha = 1` density does not integrate to unity.

*/

use std::f64;

use conversions::{beta_to_gamma, gamma_to_beta};
use super::{BETA_MAX, ElectronDistribution};


/// Parameters for a power-law electron distribution. See the module-level
/// documentation for details.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct PowerLawDistribution {
    alpha: f64,
    beta_min: f64,
    beta_max: f64,
    norm: f64,
}


impl ElectronDistribution for PowerLawDistribution {
    fn density(&self, beta: f64) -> f64 {
        if beta < self.beta_min || beta > self.beta_max {
            0.
        } else {
            let gamma = beta_to_gamma(beta);
            self.norm * gamma.powf(-self.alpha) * beta * (1. - beta * beta).powf(-1.5)
        }
    }

    fn speed_limits(&self) -> (f64, f64) {
        (self.beta_min, self.beta_max)
    }
}


impl PowerLawDistribution {
    /// Create a new set of power-law parameters with the specified power-law
    /// index. Pass a negative index to request the `alpha = 1` special case.
    ///
    /// The default speed limits are zero and `BETA_MAX`.
    pub fn new(alpha: f64) -> Self {
        let mut d = PowerLawDistribution {
            alpha: alpha,
            beta_min: 0.,
            beta_max: BETA_MAX,
            norm: f64::NAN,
        };
        d.normalize();
        d
    }

    /// Alter the speed limits of this distribution.
    pub fn beta_limits(mut self, beta_min: f64, beta_max: f64) -> Self {
        self.beta_min = beta_min;
        self.beta_max = beta_max;
        self.normalize();
        self
    }

    /// Alter the limits of this distribution in terms of Lorentz factors.
    pub fn gamma_limits(self, gamma_min: f64, gamma_max: f64) -> Self {
        self.beta_limits(gamma_to_beta(gamma_min), gamma_to_beta(gamma_max))
    }

    /// Alter the power-law index.
    pub fn slope(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self.normalize();
        self
    }

    /// The power-law index in effect. This is 1 if a negative index was
    /// requested.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The normalization constant `A`.
    pub fn normalization(&self) -> f64 {
        self.norm
    }

    fn normalize(&mut self) {
        let gamma1 = beta_to_gamma(self.beta_min);
        let gamma2 = beta_to_gamma(self.beta_max);

        if self.alpha < 0. || self.alpha == 1. {
            self.alpha = 1.;
            self.norm = (gamma2 / gamma1).log10();
        } else {
            let e = 1. - self.alpha;
            self.norm = e / (gamma2.powf(e) - gamma1.powf(e));
        }
    }
}
