// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Closed-form approximations to the SZ distortions.

These are the low-order terms of the expansions in the electron temperature
*theta* and the cluster speed *beta* given by Sazonov & Sunyaev (1998;
DOI:10.1086/306151) and Nozawa, Itoh & Kohyama (1998;
DOI:10.1086/306213). They are cheap, and at the temperatures and speeds of
real clusters they are accurate to a percent or so, which makes them a
useful check on the numerical machinery.

Every term is written in terms of the dimensionless frequency `x = h nu / k
T_CMB` and the auxiliary quantities

```text
X = x coth(x/2)
S = x / sinh(x/2)
```

and carries the common factor `tau I0(nu) x e^x / (e^x - 1)`, where `I0` is
the CMB intensity. All functions return intensities in W / m^2 / Hz / sr.

*/

use background::{BackgroundSpectrum, Blackbody};
use conversions::dimensionless_frequency;
use super::T_CMB;


/// The frequency-dependent pieces shared by all of the terms.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct SpectralFactors {
    x: f64,
    big_x: f64,
    big_s: f64,
    scale: f64,
}

impl SpectralFactors {
    /// Compute the factors at frequency `nu` in Hz against the CMB.
    pub fn new(nu: f64) -> Self {
        let x = dimensionless_frequency(nu, T_CMB);
        let i0 = Blackbody::cmb().intensity(nu);

        SpectralFactors {
            x: x,
            big_x: x / (0.5 * x).tanh(),
            big_s: x / (0.5 * x).sinh(),
            scale: i0 * x * x.exp() / x.exp_m1(),
        }
    }

    /// The dimensionless frequency `x`.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// The common factor `I0 x e^x / (e^x - 1)`, without the optical depth.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The Kompaneets term `Y0`.
    pub fn y0(&self) -> f64 {
        self.big_x - 4.
    }

    /// The first relativistic correction `Y1`.
    pub fn y1(&self) -> f64 {
        let x = self.big_x;
        let s2 = self.big_s * self.big_s;
        -10. + 47. / 2. * x - 42. / 5. * x * x + 7. / 10. * x.powi(3) + s2 * (-21. / 5. + 7. / 5. * x)
    }

    /// The first thermal correction to the kinematic term, `C1`.
    pub fn c1(&self) -> f64 {
        let x = self.big_x;
        10. - 47. / 5. * x + 7. / 5. * x * x + 7. / 10. * self.big_s * self.big_s
    }

    /// The second thermal correction to the kinematic term, `C2`.
    pub fn c2(&self) -> f64 {
        let x = self.big_x;
        let s2 = self.big_s * self.big_s;
        -25. + 1117. / 40. * x - 847. / 80. * x * x + 183. / 80. * x.powi(3)
            + s2 * (-847. / 160. + 183. / 40. * x)
    }

    /// The leading quadrupolar kinematic term, `D0`.
    pub fn d0(&self) -> f64 {
        -2. / 3. + 11. / 30. * self.big_x
    }

    /// The thermal correction to the quadrupolar kinematic term, `D1`.
    pub fn d1(&self) -> f64 {
        let x = self.big_x;
        let s2 = self.big_s * self.big_s;
        -4. + 12. * x - 6. * x * x + 19. / 30. * x.powi(3) + s2 * (-3. + 19. / 15. * x)
    }
}


/// The thermal distortion to second order in *theta*:
/// `tau I0 x e^x/(e^x-1) (theta Y0 + theta^2 Y1)`.
pub fn tsz(nu: f64, theta: f64, tau: f64) -> f64 {
    let f = SpectralFactors::new(nu);
    tau * f.scale() * (theta * f.y0() + theta * theta * f.y1())
}

/// The correction to the thermal distortion from the cluster's bulk motion,
/// second order in *beta*.
pub fn tsz_beta2(nu: f64, theta: f64, beta: f64, tau: f64) -> f64 {
    let f = SpectralFactors::new(nu);
    let y0 = f.y0();
    tau * f.scale() * beta * beta * (y0 / 3. + theta * (5. / 6. * y0 + 2. / 3. * f.y1()))
}

/// The leading kinematic distortion, `-beta` times the common factor. A
/// cluster receding from us (positive *beta*) produces a decrement.
pub fn ksz(nu: f64, beta: f64, tau: f64) -> f64 {
    -tau * SpectralFactors::new(nu).scale() * beta
}

/// The first-order thermal correction to the kinematic distortion.
pub fn ksz_beta_theta(nu: f64, theta: f64, beta: f64, tau: f64) -> f64 {
    let f = SpectralFactors::new(nu);
    tau * f.scale() * beta * theta * f.c1()
}

/// The second-order thermal correction to the kinematic distortion.
pub fn ksz_beta_theta2(nu: f64, theta: f64, beta: f64, tau: f64) -> f64 {
    let f = SpectralFactors::new(nu);
    tau * f.scale() * beta * theta * theta * f.c2()
}

/// The quadrupolar kinematic term for motion along the line of sight, where
/// `P2(1) = 1`.
pub fn ksz_beta2_p2(nu: f64, theta: f64, beta: f64, tau: f64) -> f64 {
    let f = SpectralFactors::new(nu);
    tau * f.scale() * beta * beta * (f.d0() + theta * f.d1())
}
