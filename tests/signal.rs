// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/// Check our spectra against the closed-form expansions.
///
/// The expansions are only asymptotically right, so we compare against a
/// fraction of the peak of each spectrum rather than point by point: near
/// the null of the thermal effect the relative error is meaningless.

extern crate szkernel;
extern crate szkernel_test_support;

use szkernel::{IsoBetaModel, KinematicSignal, Population, ProfileMode, SzSignal,
               ThermalJuettnerDistribution, analytic};
use szkernel_test_support::{Sampler, default_log, frequencies_ghz};


fn peak(values: &[f64]) -> f64 {
    values.iter().fold(0., |m: f64, v| m.max(v.abs()))
}


fn compare_spectra(what: &str, param: f64, freqs: &[f64], ours: &[f64], theirs: &[f64], tol: f64) {
    let scale = peak(theirs);

    for ((&nu, &a), &b) in freqs.iter().zip(ours).zip(theirs) {
        if (a - b).abs() > tol * scale {
            panic!("{} disagrees with the expansion at parameter {:.6e}; expansion has {:.6e}, we have {:.6e}; at
nu: {:.6e} Hz
peak: {:.6e}", what, param, b, a, nu, scale);
        }
    }
}


#[test]
fn thermal_matches_expansion() {
    let temps = Sampler::new(true, 5., 12.);
    let freqs = frequencies_ghz(20., 400., 20);
    let tau = 0.01;

    for _ in 0..2 {
        let te = temps.get();
        let theta = ThermalJuettnerDistribution::new(te).theta();

        let ours = SzSignal::new(Population::thermal(te))
            .optical_depth(tau)
            .subtract_background(true)
            .workers(4)
            .compute(&freqs);
        let theirs: Vec<f64> = freqs.iter().map(|&nu| analytic::tsz(nu, theta, tau)).collect();

        compare_spectra("tSZ", te, &freqs, &ours, &theirs, 0.08);
    }
}


/// The decrement at 150 GHz from 5 keV gas. Per unit optical depth it is
/// about -9.8e-20 W / m^2 / Hz / sr; everything scales linearly with tau.
#[test]
fn reference_decrement_at_150ghz() {
    let base = SzSignal::new(Population::thermal(5.)).subtract_background(true).workers(2);
    let unit = base.clone().compute(&[150e9])[0];
    let thin = base.optical_depth(0.01).compute(&[150e9])[0];

    assert!((unit / -9.8e-20 - 1.).abs() < 0.03, "unit-depth decrement {:.6e}", unit);
    assert!((thin / (0.01 * unit) - 1.).abs() < 1e-9);
}


#[test]
fn kinematic_matches_expansion() {
    let speeds = Sampler::new(false, -1000., 1000.);
    let freqs = frequencies_ghz(20., 400., 20);

    for v_pec in speeds.draw(5) {
        let sig = KinematicSignal::new(v_pec).optical_depth(0.01);
        let ours = sig.compute(&freqs);
        let theirs: Vec<f64> = freqs.iter().map(|&nu| analytic::ksz(nu, sig.beta(), 0.01)).collect();
        compare_spectra("kSZ", v_pec, &freqs, &ours, &theirs, 0.01);
    }
}


/// Every pixel of a cluster map is the unit-optical-depth spectrum scaled by
/// that pixel's optical depth.
#[test]
fn cluster_map() {
    let freqs = frequencies_ghz(90., 270., 3);
    let spectrum = SzSignal::new(Population::thermal(7.))
        .subtract_background(true)
        .grid(200, 200)
        .mu_points(60)
        .logger(default_log())
        .compute(&freqs);

    let model = IsoBetaModel::new(0.7, 5e-3, 40., 800.);
    let az = [-60., -20., 0., 20., 60.];
    let el = [-30., 0., 30.];
    let map = model.map(&az, &el, ProfileMode::Grid, &spectrum).unwrap();
    assert_eq!(map.len(), az.len() * el.len() * freqs.len());

    // (az, el) = (0, 0) is position 2 * 3 + 1.
    let center = &map[7 * freqs.len()..8 * freqs.len()];

    for (&m, &s) in center.iter().zip(&spectrum) {
        assert_eq!(m, model.central_optical_depth() * s);
    }

    // The thermal decrement is deepest at the center.
    for pixel in map.chunks(freqs.len()) {
        assert!(pixel[0] < 0.);
        assert!(pixel[0] >= center[0]);
    }
}
