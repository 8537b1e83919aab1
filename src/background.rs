// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Background radiation laws.

The SZ distortion is always measured against an unscattered reference
spectrum. In practice that is the CMB, a blackbody at `T_CMB`, but nothing
in the signal calculation depends on that.

*/

use super::{BOLTZMANN, PLANCK, SPEED_LIGHT, T_CMB};


/// A background spectrum that photons are scattered out of.
pub trait BackgroundSpectrum: Sync {
    /// The specific intensity at frequency `nu` (Hz), in W / m^2 / Hz / sr.
    fn intensity(&self, nu: f64) -> f64;

    /// Evaluate the intensity at every frequency in `nus`.
    fn fill_intensity(&self, nus: &[f64], output: &mut [f64]) {
        for (o, &nu) in output.iter_mut().zip(nus) {
            *o = self.intensity(nu);
        }
    }
}


/// A Planck blackbody.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Blackbody {
    temperature: f64,
}

impl Blackbody {
    /// A blackbody at temperature `t` in kelvin.
    pub fn new(t: f64) -> Self {
        Blackbody { temperature: t }
    }

    /// The cosmic microwave background.
    pub fn cmb() -> Self {
        Blackbody::new(T_CMB)
    }

    /// The temperature of this blackbody, in kelvin.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl Default for Blackbody {
    fn default() -> Self {
        Blackbody::cmb()
    }
}

impl BackgroundSpectrum for Blackbody {
    fn intensity(&self, nu: f64) -> f64 {
        let prefactor = 2. * PLANCK * nu.powi(3) / (SPEED_LIGHT * SPEED_LIGHT);
        prefactor / (PLANCK * nu / (BOLTZMANN * self.temperature)).exp_m1()
    }
}
