// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Assembling SZ spectra from kernels.

For the thermal and non-thermal effects, the scattered intensity at
frequency *nu* is the background spectrum convolved with the
multi-electron kernel:

```text
I_scat(nu) = ∫ I0(nu e^-s) P(s) ds
```

In the single-scattering limit a fraction *tau* of the photons along the
line of sight gets scattered, so the change in intensity is `tau (I_scat -
I0)`. The kernel doesn't depend on *nu*, so it is evaluated once per
[`SzSignal::compute`] call and reused for every frequency, either on a fixed
grid of shifts or through a Romberg [`EvaluationLedger`].

The kinematic effect from bulk motion of the gas is handled separately by
[`KinematicSignal`], which integrates the Doppler-boosted background over
the scattering angle directly.

*/

use slog::Logger;

use background::{BackgroundSpectrum, Blackbody};
use conversions::{beta_to_gamma, dimensionless_frequency, velocity_to_beta};
use kernel::{DEFAULT_BETA_POINTS, KernelCalculator, KernelTable};
use romberg::{self, EvaluationLedger};
use scattering::DEFAULT_MU_POINTS;
use super::{Population, SzResult, check_len, discard_logger};

/// The default number of shift cells used by the grid method.
pub const DEFAULT_SHIFT_POINTS: usize = 500;

/// The default number of direction cosines for the kinematic integral.
pub const DEFAULT_KINEMATIC_MU_POINTS: usize = 500;


/// How the multi-electron kernel is evaluated and integrated.
#[derive(Copy,Clone,Debug,PartialEq)]
pub enum KernelMethod {
    /// Tabulate the grid kernel at the centers of uniform shift cells and
    /// sum.
    Grid,

    /// Sample the adaptive kernel with a Romberg write pass and replay it
    /// for each frequency.
    Romberg {
        /// Stop refining once the extrapolated integral of the kernel changes
        /// by less than this.
        accuracy: f64,

        /// The largest number of rows in the extrapolation table.
        max_steps: usize,
    },
}

impl KernelMethod {
    /// The Romberg method with its default settings.
    pub fn romberg() -> Self {
        KernelMethod::Romberg { accuracy: 1e-6, max_steps: 12 }
    }
}

impl Default for KernelMethod {
    fn default() -> Self {
        KernelMethod::Grid
    }
}


/// Computes the thermal or non-thermal SZ spectrum of an electron population.
#[derive(Clone,Debug)]
pub struct SzSignal {
    population: Population,
    tau: f64,
    s0: f64,
    s1: f64,
    n_s: usize,
    n_beta: usize,
    n_mu: usize,
    workers: usize,
    method: KernelMethod,
    subtract_background: bool,
    background: Blackbody,
    logger: Logger,
}

impl SzSignal {
    /// Set up a calculation for `population`.
    ///
    /// The defaults are: unit optical depth; the population's default range
    /// of shifts; 500 shift cells, 500 speed cells and 100 direction
    /// cosines on the grid; one worker; the grid method; the CMB as the
    /// background, which is included in the output.
    pub fn new(population: Population) -> Self {
        let (s0, s1) = population.default_shift_range();

        SzSignal {
            population: population,
            tau: 1.,
            s0: s0,
            s1: s1,
            n_s: DEFAULT_SHIFT_POINTS,
            n_beta: DEFAULT_BETA_POINTS,
            n_mu: DEFAULT_MU_POINTS,
            workers: 1,
            method: KernelMethod::Grid,
            subtract_background: false,
            background: Blackbody::cmb(),
            logger: discard_logger(),
        }
    }

    /// Set the optical depth of the scattering medium.
    pub fn optical_depth(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Set the range of shifts the kernel is integrated over.
    pub fn shift_range(mut self, s0: f64, s1: f64) -> Self {
        self.s0 = s0;
        self.s1 = s1;
        self
    }

    /// Set the number of shift cells and speed cells used by the grid method.
    pub fn grid(mut self, n_s: usize, n_beta: usize) -> Self {
        self.n_s = n_s;
        self.n_beta = n_beta;
        self
    }

    /// Set the number of direction cosines used by the grid method.
    pub fn mu_points(mut self, n_mu: usize) -> Self {
        self.n_mu = n_mu;
        self
    }

    /// Set the number of threads that tabulate the grid kernel.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Choose how the kernel is evaluated.
    pub fn method(mut self, method: KernelMethod) -> Self {
        self.method = method;
        self
    }

    /// If true, report only the change in intensity; otherwise report the
    /// background plus the change.
    pub fn subtract_background(mut self, subtract: bool) -> Self {
        self.subtract_background = subtract;
        self
    }

    /// Use a different background spectrum.
    pub fn background(mut self, background: Blackbody) -> Self {
        self.background = background;
        self
    }

    /// Log through `logger`.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    fn calculator(&self) -> KernelCalculator<Population> {
        KernelCalculator::new(&self.population)
            .beta_points(self.n_beta)
            .mu_points(self.n_mu)
            .workers(self.workers)
            .logger(self.logger.clone())
    }

    /// Tabulate the grid kernel over the configured shift range.
    pub fn kernel_table(&self) -> KernelTable {
        self.calculator().grid_table(self.s0, self.s1, self.n_s)
    }

    /// Run a Romberg write pass of the adaptive kernel over the configured
    /// shift range, with the given settings.
    pub fn kernel_ledger(&self, accuracy: f64, max_steps: usize) -> EvaluationLedger {
        let calc = self.calculator();
        let ledger = romberg::write(|s| calc.adaptive(s), self.s0, self.s1, max_steps, accuracy);

        debug!(self.logger, "recorded kernel ledger";
               "rows" => ledger.rows(),
               "samples" => ledger.samples().len(),
               "area" => ledger.estimate());

        if !ledger.converged() {
            warn!(self.logger, "Romberg integration of the kernel did not converge";
                  "max_steps" => max_steps, "accuracy" => accuracy);
        }

        ledger
    }

    fn finish(&self, nu: f64, scattered: f64) -> f64 {
        let i0 = self.background.intensity(nu);
        let delta = self.tau * (scattered - i0);

        if self.subtract_background {
            delta
        } else {
            i0 + delta
        }
    }

    fn fill(&self, freqs: &[f64], output: &mut [f64]) {
        debug!(self.logger, "computing SZ spectrum";
               "population" => ?self.population,
               "method" => ?self.method,
               "n_nu" => freqs.len(),
               "tau" => self.tau);

        match self.method {
            KernelMethod::Grid => {
                let table = self.kernel_table();

                for (o, &nu) in output.iter_mut().zip(freqs) {
                    *o = self.finish(nu, table.convolve(&self.background, nu));
                }
            },

            KernelMethod::Romberg { accuracy, max_steps } => {
                let ledger = self.kernel_ledger(accuracy, max_steps);
                let bg = &self.background;

                for (o, &nu) in output.iter_mut().zip(freqs) {
                    let scattered = ledger.read(|s| bg.intensity(nu * (-s).exp()));
                    *o = self.finish(nu, scattered);
                }
            },
        }
    }

    /// Compute the spectrum at each frequency in `freqs` (Hz), in W / m^2 /
    /// Hz / sr.
    pub fn compute(&self, freqs: &[f64]) -> Vec<f64> {
        let mut output = vec![0.; freqs.len()];
        self.fill(freqs, &mut output);
        output
    }

    /// Like `compute`, but write into a preallocated slice of the same
    /// length as `freqs`.
    pub fn compute_into(&self, freqs: &[f64], output: &mut [f64]) -> SzResult<()> {
        check_len("SZ spectrum", freqs.len(), output.len())?;
        self.fill(freqs, output);
        Ok(())
    }
}


/// Computes the kinematic SZ spectrum of gas moving along the line of sight.
///
/// Positive velocities are away from the observer.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct KinematicSignal {
    beta: f64,
    gamma: f64,
    tau: f64,
    n_mu: usize,
    background: Blackbody,
}

impl KinematicSignal {
    /// Set up a calculation for a peculiar velocity `v_pec` in km/s, with unit
    /// optical depth.
    pub fn new(v_pec: f64) -> Self {
        let beta = velocity_to_beta(v_pec * 1e3);

        KinematicSignal {
            beta: beta,
            gamma: beta_to_gamma(beta),
            tau: 1.,
            n_mu: DEFAULT_KINEMATIC_MU_POINTS,
            background: Blackbody::cmb(),
        }
    }

    /// Set the optical depth of the moving gas.
    pub fn optical_depth(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Set the number of direction cosines in the angular integral.
    pub fn mu_points(mut self, n_mu: usize) -> Self {
        self.n_mu = n_mu;
        self
    }

    /// Use a different background blackbody.
    pub fn background(mut self, background: Blackbody) -> Self {
        self.background = background;
        self
    }

    /// The bulk speed in units of *c*.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// The change in intensity at frequency `nu`.
    pub fn at(&self, nu: f64) -> f64 {
        if self.n_mu == 0 {
            return 0.;
        }

        let i0 = self.background.intensity(nu);
        let x1 = dimensionless_frequency(nu, self.background.temperature());
        let boost = self.gamma * self.gamma * (1. + self.beta);
        let dmu = 2. / self.n_mu as f64;
        let mut total = 0.;

        for j in 0..self.n_mu {
            let mu = -1. + (j as f64 + 0.5) * dmu;
            let x2 = x1 * boost * (1. - self.beta * mu);
            total += 3. / 8. * (1. + mu * mu) * (x1.exp_m1() / x2.exp_m1() - 1.);
        }

        self.tau * i0 * total * dmu
    }

    /// Compute the spectrum at each frequency in `freqs` (Hz).
    pub fn compute(&self, freqs: &[f64]) -> Vec<f64> {
        freqs.iter().map(|&nu| self.at(nu)).collect()
    }

    /// Like `compute`, but write into a preallocated slice.
    pub fn compute_into(&self, freqs: &[f64], output: &mut [f64]) -> SzResult<()> {
        check_len("kinematic SZ spectrum", freqs.len(), output.len())?;

        for (o, &nu) in output.iter_mut().zip(freqs) {
            *o = self.at(nu);
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ::{Population, SzError, ThermalJuettnerDistribution};
    use ::analytic;
    use ::background::{BackgroundSpectrum, Blackbody};

    const FREQS: [f64; 3] = [30e9, 150e9, 350e9];

    #[test]
    fn tsz_matches_analytic() {
        let theta = ThermalJuettnerDistribution::new(5.).theta();
        let out = SzSignal::new(Population::thermal(5.))
            .optical_depth(0.01)
            .subtract_background(true)
            .workers(4)
            .compute(&FREQS);

        assert!(out[1] < 0.);
        assert!(out[2] > 0.);

        for (&v, &nu) in out.iter().zip(&FREQS) {
            let expected = analytic::tsz(nu, theta, 0.01);
            assert_approx_eq!(v, expected, 0.05 * expected.abs());
        }
    }

    #[test]
    fn romberg_agrees_with_grid() {
        let base = SzSignal::new(Population::thermal(5.)).optical_depth(0.01).subtract_background(true);
        let grid = base.clone().compute(&FREQS);
        let romberg = base.method(KernelMethod::romberg()).compute(&FREQS);

        for (&g, &r) in grid.iter().zip(&romberg) {
            assert_approx_eq!(g, r, 0.03 * r.abs());
        }
    }

    #[test]
    fn romberg_ledger_captures_the_kernel() {
        let ledger = SzSignal::new(Population::thermal(5.)).kernel_ledger(1e-6, 12);
        assert!(ledger.converged());
        assert!(ledger.rows() < 11);
        assert_approx_eq!(ledger.estimate(), 1., 1e-4);
        assert_eq!(ledger.range(), (-1.2, 2.));
    }

    #[test]
    fn romberg_tolerates_a_generous_budget() {
        let freqs = [150e9];
        let base = SzSignal::new(Population::thermal(5.)).subtract_background(true);
        let capped = base.clone().method(KernelMethod::romberg()).compute(&freqs);
        let generous = base.method(KernelMethod::Romberg { accuracy: 1e-6, max_steps: 40 }).compute(&freqs);
        assert_eq!(capped, generous);
    }

    #[test]
    fn background_bookkeeping() {
        let base = SzSignal::new(Population::thermal(8.)).optical_depth(0.02).grid(200, 200).mu_points(60);
        let total = base.clone().compute(&FREQS);
        let delta = base.subtract_background(true).compute(&FREQS);
        let cmb = Blackbody::cmb();

        for ((&t, &d), &nu) in total.iter().zip(&delta).zip(&FREQS) {
            assert_approx_eq!(t - d, cmb.intensity(nu), 1e-12 * cmb.intensity(nu));
        }
    }

    #[test]
    fn distortion_is_linear_in_tau() {
        let base = SzSignal::new(Population::thermal(5.)).subtract_background(true).grid(200, 200).mu_points(60);
        let a = base.clone().optical_depth(0.01).compute(&[150e9])[0];
        let b = base.optical_depth(0.03).compute(&[150e9])[0];
        assert_approx_eq!(b, 3. * a, 1e-9 * a.abs());
    }

    #[test]
    fn power_law_signal_is_finite() {
        let out = SzSignal::new(Population::power_law(2.5))
            .optical_depth(1e-4)
            .subtract_background(true)
            .grid(300, 200)
            .mu_points(60)
            .workers(2)
            .compute(&FREQS);

        for v in &out {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn compute_into_checks_length() {
        let sig = SzSignal::new(Population::thermal(5.));
        let mut out = [0.; 2];

        match sig.compute_into(&FREQS, &mut out) {
            Err(SzError::LengthMismatch { expected: 3, found: 2, .. }) => {},
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(KinematicSignal::new(300.).compute_into(&FREQS, &mut out).is_err());
    }

    #[test]
    fn ksz_sign_and_linearity() {
        let nu = 150e9;
        let plus = KinematicSignal::new(300.).optical_depth(0.01).at(nu);
        let minus = KinematicSignal::new(-300.).optical_depth(0.01).at(nu);
        let double = KinematicSignal::new(600.).optical_depth(0.01).at(nu);

        assert!(plus < 0.);
        assert!(minus > 0.);
        assert_approx_eq!(plus, -minus, 0.01 * minus);
        assert_approx_eq!(double, 2. * plus, 0.01 * plus.abs());

        let sig = KinematicSignal::new(300.);
        assert_approx_eq!(plus, analytic::ksz(nu, sig.beta(), 0.01), 0.01 * plus.abs());
    }

    #[test]
    fn ksz_vanishes_at_rest() {
        assert_eq!(KinematicSignal::new(0.).at(150e9), 0.);
    }
}
