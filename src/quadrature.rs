// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Adaptive one-dimensional quadrature.

This is a QAG-style integrator: the interval is evaluated with the 15-point
Gauss-Kronrod rule, and the subinterval with the largest error estimate is
bisected until the total error drops below the requested tolerance or the
workspace runs out of room. Running out of room is not an error. The best
available estimate is returned and flagged as unconverged, and callers in
this crate use it as-is.

The interface mirrors GSL's: a reusable workspace that bounds the number of
subintervals, and a builder that takes any `FnMut(f64) -> f64`. Side
parameters of an integrand are simply captured by the closure.

*/

use std::f64;


/// Scratch space for adaptive integration. The capacity is the maximum
/// number of subintervals an integration may use.
#[derive(Clone,Debug)]
pub struct IntegrationWorkspace {
    limit: usize,
    intervals: Vec<Interval>,
}

#[derive(Copy,Clone,Debug,PartialEq)]
struct Interval {
    a: f64,
    b: f64,
    value: f64,
    abserr: f64,
}

impl IntegrationWorkspace {
    /// Create a workspace allowing up to `limit` subintervals.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);

        IntegrationWorkspace {
            limit: limit,
            intervals: Vec::with_capacity(limit),
        }
    }

    /// Set up an integration of `f` between `lower_bound` and `upper_bound`.
    pub fn qag<'a, F>(&'a mut self, f: F, lower_bound: f64, upper_bound: f64) -> IntegrationBuilder<'a, F>
        where F: FnMut(f64) -> f64
    {
        IntegrationBuilder::new(self, f, lower_bound, upper_bound)
    }
}


/// The outcome of an integration.
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct IntegrationResult {
    /// The estimated integral.
    pub value: f64,

    /// The estimated absolute error.
    pub abserr: f64,

    /// Whether the tolerance was reached within the subinterval budget.
    pub converged: bool,
}


/// A pending integration. Create one with `IntegrationWorkspace::qag`.
pub struct IntegrationBuilder<'a, F: 'a> where F: FnMut(f64) -> f64 {
    workspace: &'a mut IntegrationWorkspace,
    function: F,
    lower_bound: f64,
    upper_bound: f64,
    epsabs: f64,
    epsrel: f64,
}

impl<'a, F: 'a> IntegrationBuilder<'a, F> where F: FnMut(f64) -> f64 {
    fn new(ws: &'a mut IntegrationWorkspace, f: F, lower: f64, upper: f64) -> Self {
        IntegrationBuilder {
            workspace: ws,
            function: f,
            lower_bound: lower,
            upper_bound: upper,
            epsabs: 0.,
            epsrel: 1e-8,
        }
    }

    /// Set the absolute and relative tolerances. The integration stops once
    /// the error estimate is below the larger of `epsabs` and `epsrel` times
    /// the magnitude of the integral.
    pub fn tolerance(mut self, epsabs: f64, epsrel: f64) -> Self {
        self.epsabs = epsabs;
        self.epsrel = epsrel;
        self
    }

    /// Run the integration.
    pub fn compute(mut self) -> IntegrationResult {
        let (a, b) = (self.lower_bound, self.upper_bound);

        if a == b {
            return IntegrationResult { value: 0., abserr: 0., converged: true };
        }

        let ws = self.workspace;
        ws.intervals.clear();

        let (value, abserr) = gauss_kronrod_15(&mut self.function, a, b);
        ws.intervals.push(Interval { a, b, value, abserr });

        let mut total = value;
        let mut total_err = abserr;

        loop {
            if total_err <= self.epsabs.max(self.epsrel * total.abs()) {
                return IntegrationResult { value: total, abserr: total_err, converged: true };
            }

            if ws.intervals.len() >= ws.limit {
                break;
            }

            let worst = ws.intervals
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |(imax, emax), (i, iv)| {
                    if iv.abserr > emax { (i, iv.abserr) } else { (imax, emax) }
                }).0;

            let iv = ws.intervals.swap_remove(worst);
            let mid = 0.5 * (iv.a + iv.b);

            if !(mid > iv.a.min(iv.b) && mid < iv.a.max(iv.b)) {
                // The interval can't be bisected any further in floating
                // point, so there's no improving on what we have.
                ws.intervals.push(iv);
                break;
            }

            let (v1, e1) = gauss_kronrod_15(&mut self.function, iv.a, mid);
            let (v2, e2) = gauss_kronrod_15(&mut self.function, mid, iv.b);

            total += v1 + v2 - iv.value;
            total_err += e1 + e2 - iv.abserr;

            ws.intervals.push(Interval { a: iv.a, b: mid, value: v1, abserr: e1 });
            ws.intervals.push(Interval { a: mid, b: iv.b, value: v2, abserr: e2 });
        }

        // Resum to shed the roundoff accumulated by the running updates.
        let value = ws.intervals.iter().map(|iv| iv.value).sum();
        let abserr = ws.intervals.iter().map(|iv| iv.abserr).sum();
        IntegrationResult { value, abserr, converged: false }
    }
}


/// Kronrod abscissae on [0, 1]; the odd entries are the 7-point Gauss nodes.
const XGK: [f64; 8] = [
    0.9914553711208126,
    0.9491079123427585,
    0.8648644233597691,
    0.7415311855993944,
    0.5860872354676911,
    0.4058451513773972,
    0.2077849550078985,
    0.0,
];

const WGK: [f64; 8] = [
    0.022935322010529224,
    0.063_092_092_629_978_56,
    0.10479001032225018,
    0.14065325971552592,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.20443294007529889,
    0.20948214108472782,
];

const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.27970539148927664,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// Apply the G7-K15 rule to `[a, b]`, returning the Kronrod estimate and the
/// Gauss-Kronrod difference as the error estimate.
fn gauss_kronrod_15<F>(f: &mut F, a: f64, b: f64) -> (f64, f64) where F: FnMut(f64) -> f64 {
    let center = 0.5 * (a + b);
    let half_width = 0.5 * (b - a);

    let fc = f(center);
    let mut kronrod = WGK[7] * fc;
    let mut gauss = WG[3] * fc;

    for i in 0..7 {
        let dx = half_width * XGK[i];
        let pair = f(center - dx) + f(center + dx);
        kronrod += WGK[i] * pair;

        if i % 2 == 1 {
            gauss += WG[i / 2] * pair;
        }
    }

    let kronrod = kronrod * half_width;
    let gauss = gauss * half_width;
    (kronrod, (kronrod - gauss).abs())
}
