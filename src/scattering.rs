// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The single-electron scattering probability.

For a photon scattering off an electron of speed *beta*, this gives the
probability density that the photon's frequency is changed by the
logarithmic shift `s = ln(nu'/nu)`. The scattering is Thomson in the
electron rest frame, so the result follows from integrating the angular
cross section over the direction cosine *mu* of the incoming photon; see
Wright (1979) and Birkinshaw (1999), section 2.2.

For a given *s* only part of the *mu* range can contribute:

- for `s < 0`, `mu` runs from -1 up to `(1 - e^-s (1 - beta)) / beta`;
- for `s >= 0`, `mu` runs from `(1 - e^-s (1 + beta)) / beta` up to 1.

Both branches give the full range `[-1, 1]` at `s = 0`. If *beta* is too
small to produce the requested shift at all, the range is empty and the
probability is zero.

*/

use std::f64;

use conversions::beta_to_gamma;
use quadrature::IntegrationWorkspace;

/// The default number of direction cosines used by the fixed-grid
/// evaluation.
pub const DEFAULT_MU_POINTS: usize = 100;


/// The parameters of a single-electron scattering evaluation. The relevant
/// exponentials and prefactors are computed once up front since the
/// integrand gets evaluated a lot.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct SingleScattering {
    s: f64,
    beta: f64,
    exp_s: f64,
    prefactor: f64,
    mu_lo: f64,
    mu_hi: f64,
}

impl SingleScattering {
    /// Set up the calculation for shift `s` and electron speed `beta`.
    pub fn new(s: f64, beta: f64) -> Self {
        let gamma = beta_to_gamma(beta);
        let exp_minus_s = (-s).exp();

        let (mu_lo, mu_hi) = if s < 0. {
            (-1., (1. - exp_minus_s * (1. - beta)) / beta)
        } else {
            ((1. - exp_minus_s * (1. + beta)) / beta, 1.)
        };

        SingleScattering {
            s: s,
            beta: beta,
            exp_s: s.exp(),
            prefactor: 3. / (16. * gamma.powi(4) * beta),
            mu_lo: mu_lo,
            mu_hi: mu_hi,
        }
    }

    /// The range of incoming direction cosines that can produce this shift.
    pub fn mu_limits(&self) -> (f64, f64) {
        (self.mu_lo, self.mu_hi)
    }

    /// The integrand in *mu*, without the overall prefactor.
    #[inline]
    pub fn integrand(&self, mu: f64) -> f64 {
        let beta = self.beta;
        let one_minus_beta_mu = 1. - beta * mu;
        let mu_prime = (self.exp_s * one_minus_beta_mu - 1.) / beta;
        let mu2 = mu * mu;
        let mu_prime2 = mu_prime * mu_prime;

        (1. + beta * mu_prime)
            * (1. + mu2 * mu_prime2 + 0.5 * (1. - mu2) * (1. - mu_prime2))
            / one_minus_beta_mu.powi(3)
    }

    fn finish(&self, integral: f64) -> f64 {
        // Near the edges of the allowed region the integral is a small
        // difference of large terms and can come out slightly negative.
        if integral < 0. {
            0.
        } else {
            self.prefactor * integral
        }
    }

    /// Integrate over *mu* with the adaptive integrator.
    pub fn integrate(&self, workspace: &mut IntegrationWorkspace, epsrel: f64) -> f64 {
        if !(self.mu_hi > self.mu_lo) {
            return 0.;
        }

        let integral = workspace.qag(|mu| self.integrand(mu), self.mu_lo, self.mu_hi)
            .tolerance(0., epsrel)
            .compute()
            .value;
        self.finish(integral)
    }

    /// Integrate over *mu* with a midpoint sum over `num_mu` cells.
    pub fn integrate_midpoint(&self, num_mu: usize) -> f64 {
        if !(self.mu_hi > self.mu_lo) || num_mu == 0 {
            return 0.;
        }

        let dmu = (self.mu_hi - self.mu_lo) / num_mu as f64;
        let mut integral = 0.;

        for j in 0..num_mu {
            integral += self.integrand(self.mu_lo + (j as f64 + 0.5) * dmu);
        }

        self.finish(integral * dmu)
    }

    /// The shift this calculation is for.
    pub fn shift(&self) -> f64 {
        self.s
    }
}


/// The probability that an electron of speed `beta` scatters a photon by the
/// logarithmic shift `s`, integrated adaptively.
pub fn probability(s: f64, beta: f64) -> f64 {
    let mut ws = IntegrationWorkspace::new(1000);
    SingleScattering::new(s, beta).integrate(&mut ws, 1e-8)
}

/// The same probability, computed with a midpoint sum over `num_mu`
/// direction cosines.
pub fn probability_midpoint(s: f64, beta: f64, num_mu: usize) -> f64 {
    SingleScattering::new(s, beta).integrate_midpoint(num_mu)
}

/// Evaluate the midpoint probability at every shift in `shifts` for a
/// single electron speed.
pub fn fill_probability(shifts: &[f64], beta: f64, num_mu: usize, output: &mut [f64]) {
    for (o, &s) in output.iter_mut().zip(shifts) {
        *o = probability_midpoint(s, beta, num_mu);
    }
}
