// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/// Time the pieces of an SZ spectrum calculation.
///
/// The benchmarker runs each "iteration" many times, so the grid sizes here
/// are well below what a production spectrum would use.

#[macro_use] extern crate bencher;
extern crate szkernel;

use bencher::Bencher;
use szkernel::{KernelCalculator, KernelMethod, Population, SzSignal, ThermalJuettnerDistribution};
use szkernel::kernel::KernelTable;
use szkernel::romberg;
use szkernel::scattering;

const TE_KEV: f64 = 5.;
const FREQS: &[f64] = &[30e9, 90e9, 150e9, 220e9, 350e9];


fn single_adaptive(b: &mut Bencher) {
    b.iter(|| scattering::probability(0.1, 0.2));
}

fn single_midpoint(b: &mut Bencher) {
    b.iter(|| scattering::probability_midpoint(0.1, 0.2, 100));
}

fn kernel_adaptive(b: &mut Bencher) {
    let d = ThermalJuettnerDistribution::new(TE_KEV);
    let calc = KernelCalculator::new(&d);
    b.iter(|| calc.adaptive(0.1));
}

fn kernel_grid_serial(b: &mut Bencher) {
    let d = ThermalJuettnerDistribution::new(TE_KEV);
    let calc = KernelCalculator::new(&d).beta_points(100).mu_points(50);
    let (shifts, _) = KernelTable::uniform_shifts(-1.2, 2., 64);
    let mut out = vec![0.; shifts.len()];
    b.iter(|| calc.fill_grid(&shifts, &mut out));
}

fn kernel_grid_parallel(b: &mut Bencher) {
    let d = ThermalJuettnerDistribution::new(TE_KEV);
    let calc = KernelCalculator::new(&d).beta_points(100).mu_points(50).workers(4);
    let (shifts, _) = KernelTable::uniform_shifts(-1.2, 2., 64);
    let mut out = vec![0.; shifts.len()];
    b.iter(|| calc.fill_grid(&shifts, &mut out));
}

fn romberg_read(b: &mut Bencher) {
    let ledger = romberg::write(|s: f64| (-s * s).exp(), -1.2, 2., 12, 1e-10);
    b.iter(|| ledger.read(|s| 1. + 0.5 * s));
}

fn spectrum_grid(b: &mut Bencher) {
    let sig = SzSignal::new(Population::thermal(TE_KEV))
        .optical_depth(0.01)
        .subtract_background(true)
        .grid(64, 64)
        .mu_points(32);
    b.iter(|| sig.compute(FREQS));
}

fn spectrum_romberg(b: &mut Bencher) {
    let sig = SzSignal::new(Population::thermal(TE_KEV))
        .optical_depth(0.01)
        .subtract_background(true)
        .method(KernelMethod::Romberg { accuracy: 1e-4, max_steps: 8 });
    b.iter(|| sig.compute(FREQS));
}


benchmark_group!(pieces,
                 single_adaptive, single_midpoint,
                 kernel_adaptive, kernel_grid_serial, kernel_grid_parallel,
                 romberg_read);
benchmark_group!(spectra, spectrum_grid, spectrum_romberg);
benchmark_main!(pieces, spectra);
