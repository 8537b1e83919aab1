// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The isothermal-beta cluster model.

The gas density falls off with radius as `n_e(r) = n_e0 (1 + (r / r_c)^2)^(-3
beta / 2)`. Integrating along a line of sight at angle *theta* from the
cluster center gives the optical depth

```text
tau(theta) = tau0 (1 + (theta / theta_c)^2)^(1/2 - 3 beta / 2)
tau0 = n_e0 sigma_T r_c sqrt(pi) Gamma(3 beta / 2 - 1/2) / Gamma(3 beta / 2)
```

with `r_c = theta_c D_A`. Because the model is isothermal, every line of
sight sees the same spectrum up to its optical depth, so an SZ map is just
a screen of optical depths times a unit-optical-depth spectrum.

Sky positions are azimuth and elevation offsets from the cluster center, in
arcseconds.

*/

use special_fun::FloatSpecial;

use conversions::{arcsec_to_rad, mpc_to_m};
use super::{PI, SIGMA_THOMSON, SzResult, check_len};


/// How a pair of coordinate arrays describes the sky positions.
#[derive(Copy,Clone,Debug,Eq,PartialEq)]
pub enum ProfileMode {
    /// Every combination of azimuth and elevation, with azimuth varying
    /// slowest.
    Grid,

    /// The positions `(az[i], el[i])`, as along a scan.
    Trace,
}


/// An isothermal-beta cluster.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct IsoBetaModel {
    beta: f64,
    ne0: f64,
    thetac: f64,
    da: f64,
    tau0: f64,
}

impl IsoBetaModel {
    /// Create a model with structural parameter `beta`, central electron
    /// density `ne0` in cm^-3, core radius `thetac` in arcseconds, and
    /// angular diameter distance `da` in Mpc.
    ///
    /// The central optical depth is finite only for `beta > 1/3`.
    pub fn new(beta: f64, ne0: f64, thetac: f64, da: f64) -> Self {
        let rc = arcsec_to_rad(thetac) * mpc_to_m(da);
        let a = 1.5 * beta;
        let shape = PI.sqrt() * FloatSpecial::gamma(a - 0.5) / FloatSpecial::gamma(a);

        IsoBetaModel {
            beta: beta,
            ne0: ne0,
            thetac: thetac,
            da: da,
            tau0: ne0 * 1e6 * SIGMA_THOMSON * rc * shape,
        }
    }

    /// The optical depth through the cluster center.
    pub fn central_optical_depth(&self) -> f64 {
        self.tau0
    }

    /// The core radius, in meters.
    pub fn core_radius(&self) -> f64 {
        arcsec_to_rad(self.thetac) * mpc_to_m(self.da)
    }

    /// The optical depth at `theta` arcseconds from the center.
    pub fn optical_depth(&self, theta: f64) -> f64 {
        let r = theta / self.thetac;
        self.tau0 * (1. + r * r).powf(0.5 - 1.5 * self.beta)
    }

    /// The number of sky positions described by `az` and `el` in `mode`.
    pub fn num_positions(az: &[f64], el: &[f64], mode: ProfileMode) -> SzResult<usize> {
        match mode {
            ProfileMode::Grid => Ok(az.len() * el.len()),
            ProfileMode::Trace => {
                check_len("trace coordinates", az.len(), el.len())?;
                Ok(az.len())
            },
        }
    }

    /// Compute the optical depth at each sky position. In grid mode the
    /// output is row-major with one row per azimuth.
    pub fn optical_depths(&self, az: &[f64], el: &[f64], mode: ProfileMode,
                          output: &mut [f64]) -> SzResult<()> {
        let n = Self::num_positions(az, el, mode)?;
        check_len("optical depths", n, output.len())?;

        match mode {
            ProfileMode::Grid => {
                for (row, &a) in output.chunks_mut(el.len().max(1)).zip(az) {
                    for (o, &e) in row.iter_mut().zip(el) {
                        *o = self.optical_depth(a.hypot(e));
                    }
                }
            },

            ProfileMode::Trace => {
                for (o, (&a, &e)) in output.iter_mut().zip(az.iter().zip(el)) {
                    *o = self.optical_depth(a.hypot(e));
                }
            },
        }

        Ok(())
    }

    /// Compute an SZ map: the optical depth at each sky position times
    /// `spectrum`, which should be computed for unit optical depth. The
    /// result is row-major with one row of `spectrum.len()` values per
    /// position.
    pub fn map(&self, az: &[f64], el: &[f64], mode: ProfileMode,
               spectrum: &[f64]) -> SzResult<Vec<f64>> {
        let mut taus = vec![0.; Self::num_positions(az, el, mode)?];
        self.optical_depths(az, el, mode, &mut taus)?;
        Ok(sz_map(&taus, spectrum))
    }
}


/// The outer product of an optical depth screen with a unit-optical-depth
/// spectrum, row-major with one row per optical depth.
pub fn sz_map(taus: &[f64], spectrum: &[f64]) -> Vec<f64> {
    let mut output = Vec::with_capacity(taus.len() * spectrum.len());

    for &tau in taus {
        output.extend(spectrum.iter().map(|&v| tau * v));
    }

    output
}
