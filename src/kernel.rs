// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The multi-electron scattering kernel.

Averaging the single-electron probability over an electron speed
distribution gives the kernel *P(s)*: the probability that a photon
scattered once by the population has its frequency shifted by *s*. Only
electrons faster than

```text
beta0(s) = (e^|s| - 1) / (e^|s| + 1)
```

can produce the shift *s*, so the speed integral runs from just above
`beta0(s)` up to `BETA_MAX`, clipped to the speed limits of the
distribution.

Two evaluation strategies are offered. The adaptive one does a nested pair
of adaptive integrals per shift and is the accurate choice. The grid one
uses fixed midpoint sums in both *beta* and *mu* and is what you want for
large shift grids. Either way, a grid of shifts can be split over a fixed
number of worker threads. Each worker gets a contiguous block of output
slots that nobody else touches, so the results don't depend on the number
of workers.

*/

use slog::Logger;
use std::f64;
use std::mem;
use std::ops::Range;
use std::thread;

use background::BackgroundSpectrum;
use quadrature::IntegrationWorkspace;
use scattering::{DEFAULT_MU_POINTS, SingleScattering};
use super::{BETA_MAX, ElectronDistribution, SzResult, check_len, discard_logger};

/// The default number of speeds in the grid evaluation.
pub const DEFAULT_BETA_POINTS: usize = 500;


/// The slowest electron speed that can produce the shift `s`, nudged up by
/// one machine epsilon so that the speed integral never touches the
/// singular boundary.
pub fn shift_speed_limit(s: f64) -> f64 {
    let e = s.abs().exp();
    (e - 1.) / (e + 1.) + f64::EPSILON
}


/// Split `n` items into at most `workers` contiguous, disjoint ranges that
/// together cover `0..n`. Sizes differ by at most one; the first `n %
/// workers` ranges get the extra item. Empty ranges are never returned.
pub fn partition(n: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1).min(n.max(1));
    let base = n / workers;
    let extra = n % workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;

    for i in 0..workers {
        let len = base + if i < extra { 1 } else { 0 };

        if len == 0 {
            continue;
        }

        ranges.push(start..start + len);
        start += len;
    }

    ranges
}


/// A scattering kernel tabulated on a uniform grid of shifts.
#[derive(Clone,Debug,PartialEq)]
pub struct KernelTable {
    shifts: Vec<f64>,
    probabilities: Vec<f64>,
    step: f64,
}

impl KernelTable {
    /// The cell-center shifts of a uniform grid of `n` cells spanning `[s0,
    /// s1]`, along with the cell width.
    pub fn uniform_shifts(s0: f64, s1: f64, n: usize) -> (Vec<f64>, f64) {
        let ds = (s1 - s0) / n as f64;
        ((0..n).map(|i| s0 + (i as f64 + 0.5) * ds).collect(), ds)
    }

    /// The shifts at which the kernel is tabulated.
    pub fn shifts(&self) -> &[f64] {
        &self.shifts[..]
    }

    /// The kernel values, one per shift.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities[..]
    }

    /// The grid spacing.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Iterate over `(shift, probability)` pairs.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.shifts.iter().cloned().zip(self.probabilities.iter().cloned())
    }

    /// The total probability captured by the grid. This should be close to
    /// one if the grid covers the kernel.
    pub fn area(&self) -> f64 {
        self.probabilities.iter().sum::<f64>() * self.step
    }

    /// The intensity at frequency `nu` after scattering the background once:
    /// the sum over the grid of `I0(nu e^-s) P(s) ds`.
    pub fn convolve<B: BackgroundSpectrum>(&self, background: &B, nu: f64) -> f64 {
        self.iter()
            .map(|(s, p)| background.intensity(nu * (-s).exp()) * self.step * p)
            .sum()
    }
}


/// Computes multi-electron kernels for one electron distribution.
#[derive(Clone,Debug)]
pub struct KernelCalculator<'a, D: 'a> {
    distrib: &'a D,
    beta_points: usize,
    mu_points: usize,
    workers: usize,
    epsrel: f64,
    logger: Logger,
}

impl<'a, D: 'a + ElectronDistribution> KernelCalculator<'a, D> {
    /// Create a calculator with default settings: 500 speeds and 100
    /// direction cosines in grid mode, a relative tolerance of 1e-6 in
    /// adaptive mode, and a single worker.
    pub fn new(distrib: &'a D) -> Self {
        KernelCalculator {
            distrib: distrib,
            beta_points: DEFAULT_BETA_POINTS,
            mu_points: DEFAULT_MU_POINTS,
            workers: 1,
            epsrel: 1e-6,
            logger: discard_logger(),
        }
    }

    /// Set the number of speed cells used by the grid evaluation.
    pub fn beta_points(mut self, n: usize) -> Self {
        self.beta_points = n;
        self
    }

    /// Set the number of direction-cosine cells used by the grid evaluation.
    pub fn mu_points(mut self, n: usize) -> Self {
        self.mu_points = n;
        self
    }

    /// Set the number of worker threads used to fill arrays of shifts.
    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n.max(1);
        self
    }

    /// Set the relative tolerance of the adaptive evaluation.
    pub fn tolerance(mut self, epsrel: f64) -> Self {
        self.epsrel = epsrel;
        self
    }

    /// Log through `logger`.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// The range of speeds that contributes to shift `s`, if any.
    fn speed_range(&self, s: f64) -> Option<(f64, f64)> {
        let (dlo, dhi) = self.distrib.speed_limits();
        let lo = shift_speed_limit(s).max(dlo);
        let hi = BETA_MAX.min(dhi);

        if hi > lo {
            Some((lo, hi))
        } else {
            None
        }
    }

    /// Evaluate the kernel at `s` with nested adaptive integrals.
    pub fn adaptive(&self, s: f64) -> f64 {
        let mut beta_ws = IntegrationWorkspace::new(1000);
        let mut mu_ws = IntegrationWorkspace::new(1000);
        self.adaptive_with(s, &mut beta_ws, &mut mu_ws)
    }

    fn adaptive_with(&self, s: f64, beta_ws: &mut IntegrationWorkspace,
                     mu_ws: &mut IntegrationWorkspace) -> f64 {
        let (lo, hi) = match self.speed_range(s) {
            Some(r) => r,
            None => return 0.,
        };

        let epsrel = self.epsrel;
        let distrib = self.distrib;

        let r = beta_ws.qag(|beta| {
            SingleScattering::new(s, beta).integrate(mu_ws, epsrel) * distrib.density(beta)
        }, lo, hi)
            .tolerance(0., epsrel)
            .compute();

        if !r.converged {
            trace!(self.logger, "kernel speed integral hit its budget";
                   "s" => s, "value" => r.value, "abserr" => r.abserr);
        }

        r.value
    }

    /// Evaluate the kernel at `s` with midpoint sums in both speed and
    /// direction cosine.
    pub fn grid(&self, s: f64) -> f64 {
        let (lo, hi) = match self.speed_range(s) {
            Some(r) => r,
            None => return 0.,
        };

        if self.beta_points == 0 {
            return 0.;
        }

        let dbeta = (hi - lo) / self.beta_points as f64;
        let mut total = 0.;

        for j in 0..self.beta_points {
            let beta = lo + (j as f64 + 0.5) * dbeta;
            let p = SingleScattering::new(s, beta).integrate_midpoint(self.mu_points);
            total += p * self.distrib.density(beta) * dbeta;
        }

        total
    }

    /// Fill `output` with adaptive kernel values for every shift in `shifts`.
    pub fn fill_adaptive(&self, shifts: &[f64], output: &mut [f64]) -> SzResult<()> {
        check_len("adaptive kernel", shifts.len(), output.len())?;

        self.run_partitioned(shifts, output, |inputs, outputs| {
            let mut beta_ws = IntegrationWorkspace::new(1000);
            let mut mu_ws = IntegrationWorkspace::new(1000);

            for (o, &s) in outputs.iter_mut().zip(inputs) {
                *o = self.adaptive_with(s, &mut beta_ws, &mut mu_ws);
            }
        });

        Ok(())
    }

    /// Fill `output` with grid kernel values for every shift in `shifts`.
    pub fn fill_grid(&self, shifts: &[f64], output: &mut [f64]) -> SzResult<()> {
        check_len("grid kernel", shifts.len(), output.len())?;

        self.run_partitioned(shifts, output, |inputs, outputs| {
            for (o, &s) in outputs.iter_mut().zip(inputs) {
                *o = self.grid(s);
            }
        });

        Ok(())
    }

    /// Tabulate the grid kernel on `n` uniform cells spanning `[s0, s1]`.
    pub fn grid_table(&self, s0: f64, s1: f64, n: usize) -> KernelTable {
        let (shifts, step) = KernelTable::uniform_shifts(s0, s1, n);
        let mut probabilities = vec![0.; n];

        debug!(self.logger, "tabulating scattering kernel";
               "distrib" => ?self.distrib,
               "s0" => s0, "s1" => s1, "n_s" => n,
               "n_beta" => self.beta_points, "n_mu" => self.mu_points,
               "workers" => self.workers);

        self.run_partitioned(&shifts, &mut probabilities, |inputs, outputs| {
            for (o, &s) in outputs.iter_mut().zip(inputs) {
                *o = self.grid(s);
            }
        });

        let table = KernelTable { shifts, probabilities, step };
        debug!(self.logger, "kernel tabulated"; "area" => table.area());
        table
    }

    /// Hand each worker its own contiguous block of `output`. The scope
    /// doesn't end until every worker has finished, so when this returns
    /// every slot has been written exactly once.
    fn run_partitioned<F>(&self, shifts: &[f64], output: &mut [f64], eval: F)
        where F: Fn(&[f64], &mut [f64]) + Sync
    {
        let ranges = partition(shifts.len(), self.workers);

        if ranges.len() < 2 {
            eval(shifts, output);
            return;
        }

        let eval = &eval;

        thread::scope(|scope| {
            let mut rest = output;

            for range in ranges {
                let (chunk, tail) = mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                let inputs = &shifts[range.clone()];
                let logger = &self.logger;

                scope.spawn(move || {
                    eval(inputs, chunk);
                    trace!(logger, "kernel worker finished"; "start" => range.start, "end" => range.end);
                });
            }
        });
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ::{Population, PowerLawDistribution, ThermalJuettnerDistribution};
    use ::quadrature::IntegrationWorkspace;

    #[test]
    fn partition_covers_everything() {
        for n in 0..40 {
            for workers in 1..12 {
                let ranges = partition(n, workers);
                assert!(ranges.len() <= workers);

                let mut next = 0;
                for r in &ranges {
                    assert_eq!(r.start, next);
                    assert!(r.end > r.start);
                    next = r.end;
                }
                assert_eq!(next, n);

                if let (Some(min), Some(max)) = (ranges.iter().map(|r| r.len()).min(),
                                                 ranges.iter().map(|r| r.len()).max()) {
                    assert!(max - min <= 1);
                }
            }
        }
    }

    #[test]
    fn partition_does_not_starve_the_last_worker() {
        // ceil(10 / 4) = 3 would give 3, 3, 3, 1; we want 3, 3, 2, 2.
        let lens: Vec<usize> = partition(10, 4).iter().map(|r| r.len()).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
    }

    #[test]
    fn speed_limit_is_inside_unit_interval() {
        assert!(shift_speed_limit(0.) > 0.);
        assert_eq!(shift_speed_limit(0.7), shift_speed_limit(-0.7));

        for &s in &[-1.2, -0.1, 0.1, 2., 10.] {
            let b = shift_speed_limit(s);
            assert!(b > 0. && b < 1.);
            // An electron just at the limit can only barely reach the shift.
            assert_approx_eq!(((1. + b) / (1. - b)).ln(), s.abs(), 1e-6);
        }
    }

    /// Splitting the work must not change any kernel value.
    #[test]
    fn parallel_matches_serial() {
        let d = ThermalJuettnerDistribution::new(10.);
        let (shifts, _) = KernelTable::uniform_shifts(-1.2, 2., 100);
        let base = KernelCalculator::new(&d).beta_points(60).mu_points(40);

        let mut serial = vec![0.; 100];
        base.clone().fill_grid(&shifts, &mut serial).unwrap();

        for &workers in &[2, 4, 8] {
            let mut parallel = vec![0.; 100];
            base.clone().workers(workers).fill_grid(&shifts, &mut parallel).unwrap();
            assert_eq!(serial, parallel);
        }
    }

    #[test]
    fn adaptive_parallel_matches_serial() {
        let d = Population::thermal(5.);
        let shifts = [-0.5, -0.2, -0.05, 0., 0.05, 0.2, 0.5];
        let mut serial = [0.; 7];
        let mut parallel = [0.; 7];
        KernelCalculator::new(&d).fill_adaptive(&shifts, &mut serial).unwrap();
        KernelCalculator::new(&d).workers(3).fill_adaptive(&shifts, &mut parallel).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let d = ThermalJuettnerDistribution::new(5.);
        let mut out = [0.; 3];
        assert!(KernelCalculator::new(&d).fill_grid(&[0., 0.1], &mut out).is_err());
    }

    /// A thermal kernel is a probability distribution in *s*.
    #[test]
    fn thermal_kernel_has_unit_area() {
        let d = ThermalJuettnerDistribution::new(5.);
        let calc = KernelCalculator::new(&d);
        let mut ws = IntegrationWorkspace::new(1000);
        let lo = ws.qag(|s| calc.adaptive(s), -1.2, 0.).tolerance(0., 1e-6).compute().value;
        let hi = ws.qag(|s| calc.adaptive(s), 0., 2.).tolerance(0., 1e-6).compute().value;
        assert_approx_eq!(lo + hi, 1., 1e-4);

        let table = KernelCalculator::new(&d).workers(4).grid_table(-1.2, 2., 400);
        assert_approx_eq!(table.area(), 1., 5e-3);
    }

    #[test]
    fn thermal_kernel_is_skewed_upward() {
        // Scattering by hot electrons boosts photons on average.
        let d = ThermalJuettnerDistribution::new(10.);
        let table = KernelCalculator::new(&d).grid_table(-1.2, 2., 400);
        let mean: f64 = table.iter().map(|(s, p)| s * p).sum::<f64>() * table.step();
        assert!(mean > 0.);
    }

    #[test]
    fn grid_tracks_adaptive() {
        let d = ThermalJuettnerDistribution::new(5.);
        let calc = KernelCalculator::new(&d);

        for &s in &[-0.2, -0.05, 0.05, 0.2] {
            let exact = calc.adaptive(s);
            assert_approx_eq!(calc.grid(s), exact, 1e-2 * exact);
        }
    }

    #[test]
    fn power_law_respects_speed_limits() {
        // No electron faster than beta = 0.5 can shift a photon by more than
        // ln(3) either way.
        let d = PowerLawDistribution::new(2.5).beta_limits(0.1, 0.5);
        let calc = KernelCalculator::new(&d);
        let limit = (3_f64).ln(); // the largest shift for beta = 0.5
        assert!(calc.adaptive(0.5 * limit) > 0.);
        assert_eq!(calc.adaptive(1.1 * limit), 0.);
        assert_eq!(calc.grid(-1.1 * limit), 0.);
    }
}
