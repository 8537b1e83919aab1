// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Two-pass Romberg integration.

The scattered intensity at frequency *nu* is an integral over the shift *s*
of the kernel *P(s)* times a background term that depends on *nu*. The
kernel is expensive and the background term is cheap, and we want the
integral at many frequencies. So we split Romberg integration into two
passes:

1. The *write* pass runs an ordinary Romberg integration of the kernel
   alone, recording every kernel sample in the order it is taken. The
   recording, together with the integration range and the number of
   refinement rows that were needed, is an [`EvaluationLedger`].
2. A *read* pass replays exactly the same sampling schedule and
   extrapolation, but uses `ledger[k] * g(s_k)` as the samples. Each
   frequency costs only cheap evaluations of `g`.

The schedule is: the two endpoints first, then for refinement row *i* the
`2^(i-1)` new midpoints in ascending order. Row *i* of the Richardson table
is built from row *i - 1* only, so we keep just two rows around (see
[`RowPair`]).

*/

use std::f64;
use std::mem;

use super::{SzError, SzResult};


/// The two live rows of a Richardson extrapolation table.
#[derive(Clone,Debug,PartialEq)]
pub struct RowPair {
    current: Vec<f64>,
    previous: Vec<f64>,
}

impl RowPair {
    /// Allocate two rows that can each hold `len` extrapolation levels.
    pub fn new(len: usize) -> Self {
        RowPair {
            current: vec![0.; len],
            previous: vec![0.; len],
        }
    }

    /// The row being filled in.
    pub fn current(&self) -> &[f64] {
        &self.current[..]
    }

    /// The last completed row.
    pub fn previous(&self) -> &[f64] {
        &self.previous[..]
    }

    /// The row being filled in, mutably, along with the last completed row.
    pub fn split(&mut self) -> (&mut [f64], &[f64]) {
        (&mut self.current[..], &self.previous[..])
    }

    /// Make the current row the previous one. The old previous row becomes
    /// scratch space for the next refinement.
    pub fn rotate(&mut self) {
        mem::swap(&mut self.current, &mut self.previous);
    }

    /// Fill in row `i` of the table given the new trapezoid step `h` and the
    /// sum `c` of the new midpoint samples.
    fn extrapolate(&mut self, i: usize, h: f64, c: f64) {
        let (cur, prev) = self.split();
        cur[0] = h * c + 0.5 * prev[0];

        let mut factor = 1.;

        for j in 1..(i + 1) {
            factor *= 4.;
            cur[j] = (factor * cur[j - 1] - prev[j - 1]) / (factor - 1.);
        }
    }
}


/// The most refinement rows whose sample count fits in a `usize`.
fn max_rows() -> usize {
    8 * mem::size_of::<usize>() - 2
}


/// The number of samples taken by a Romberg integration with `rows`
/// refinement rows, if it is representable.
fn samples_for_rows(rows: usize) -> Option<usize> {
    if rows > max_rows() {
        None
    } else {
        Some((1usize << rows) + 1)
    }
}


/// The function samples recorded by a Romberg write pass.
#[derive(Clone,Debug,PartialEq)]
pub struct EvaluationLedger {
    a: f64,
    b: f64,
    rows: usize,
    samples: Vec<f64>,
    estimate: f64,
    converged: bool,
}

impl EvaluationLedger {
    /// Reassemble a ledger from its pieces, for instance after storing the
    /// samples somewhere else. The number of samples must be exactly what
    /// `rows` refinement rows would have produced. `converged` says whether
    /// the recording met its accuracy target.
    pub fn from_parts(a: f64, b: f64, rows: usize, samples: Vec<f64>,
                      converged: bool) -> SzResult<Self> {
        if samples_for_rows(rows) != Some(samples.len()) {
            return Err(SzError::LedgerMismatch { rows: rows, samples: samples.len() });
        }

        let mut ledger = EvaluationLedger {
            a: a,
            b: b,
            rows: rows,
            samples: samples,
            estimate: f64::NAN,
            converged: converged,
        };
        ledger.estimate = ledger.read(|_| 1.);
        Ok(ledger)
    }

    /// The integration range.
    pub fn range(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// The number of refinement rows beyond the initial trapezoid.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The recorded samples, in evaluation order.
    pub fn samples(&self) -> &[f64] {
        &self.samples[..]
    }

    /// The integral of the recorded function itself.
    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Whether the write pass met its accuracy target before running out of
    /// rows.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// The abscissae of the recorded samples, in evaluation order.
    pub fn nodes(&self) -> Vec<f64> {
        let mut nodes = Vec::with_capacity(self.samples.len());
        nodes.push(self.a);
        nodes.push(self.b);

        let mut h = self.b - self.a;

        for i in 1..(self.rows + 1) {
            h *= 0.5;

            for j in 1..((1usize << (i - 1)) + 1) {
                nodes.push(self.a + (2 * j - 1) as f64 * h);
            }
        }

        nodes
    }

    /// Replay the write pass with `ledger[k] * g(s_k)` as the samples and
    /// return the extrapolated integral.
    pub fn read<G: FnMut(f64) -> f64>(&self, mut g: G) -> f64 {
        let (a, b) = (self.a, self.b);
        let mut h = b - a;
        let mut rows = RowPair::new(self.rows + 1);

        {
            let (cur, _) = rows.split();
            cur[0] = (self.samples[0] * g(a) + self.samples[1] * g(b)) * h * 0.5;
        }

        if self.rows == 0 {
            return rows.current()[0];
        }

        rows.rotate();
        let mut k = 2;

        for i in 1..(self.rows + 1) {
            h *= 0.5;
            let mut c = 0.;

            for j in 1..((1usize << (i - 1)) + 1) {
                c += self.samples[k] * g(a + (2 * j - 1) as f64 * h);
                k += 1;
            }

            rows.extrapolate(i, h, c);

            if i < self.rows {
                rows.rotate();
            }
        }

        rows.current()[self.rows]
    }
}


/// Integrate `f` over `[a, b]` by Romberg's method, recording every sample.
///
/// Refinement stops once the diagonal of the extrapolation table changes by
/// less than `acc` (in absolute terms) between rows, but never before the
/// second refinement. If that doesn't happen within `max_steps` rows of
/// the table (counting the initial trapezoid), the ledger holds the last
/// completed row and its estimate is the best available, not a converged
/// one; [`EvaluationLedger::converged`] tells the two apart.
///
/// The samples are stored as they are taken, so a generous `max_steps`
/// costs nothing if the integral converges early. It is capped at the
/// number of rows whose sample count is representable.
pub fn write<F: FnMut(f64) -> f64>(mut f: F, a: f64, b: f64, max_steps: usize, acc: f64) -> EvaluationLedger {
    let max_steps = max_steps.max(1).min(max_rows() + 1);
    let mut h = b - a;
    let mut rows = RowPair::new(max_steps);
    let mut samples = Vec::with_capacity(2);

    samples.push(f(a));
    samples.push(f(b));

    {
        let (cur, _) = rows.split();
        cur[0] = (samples[0] + samples[1]) * h * 0.5;
    }

    rows.rotate();

    for i in 1..max_steps {
        h *= 0.5;
        let mut c = 0.;
        let n_new = 1usize << (i - 1);
        samples.reserve(n_new);

        for j in 1..(n_new + 1) {
            let v = f(a + (2 * j - 1) as f64 * h);
            samples.push(v);
            c += v;
        }

        rows.extrapolate(i, h, c);

        if i > 1 && (rows.previous()[i - 1] - rows.current()[i]).abs() < acc {
            return EvaluationLedger {
                a: a,
                b: b,
                rows: i,
                samples: samples,
                estimate: rows.current()[i],
                converged: true,
            };
        }

        rows.rotate();
    }

    // Out of budget: the last completed row is now `previous`.
    let last = max_steps - 1;

    EvaluationLedger {
        a: a,
        b: b,
        rows: last,
        samples: samples,
        estimate: rows.previous()[last],
        converged: false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ::SzError;

    #[test]
    fn row_pair_rotates() {
        let mut rows = RowPair::new(3);
        {
            let (cur, _) = rows.split();
            cur[0] = 1.;
        }
        rows.rotate();
        assert_eq!(rows.previous()[0], 1.);
        assert_eq!(rows.current()[0], 0.);
    }

    #[test]
    fn smooth_integrals() {
        let ledger = write(|x| x.exp(), 0., 1., 20, 1e-12);
        assert_approx_eq!(ledger.estimate(), f64::consts::E - 1., 1e-10);
        assert!(ledger.rows() < 19);

        let ledger = write(|x| x.sin(), 0., f64::consts::PI, 20, 1e-12);
        assert_approx_eq!(ledger.estimate(), 2., 1e-10);
    }

    /// Replaying with `g = 1` must redo exactly the same arithmetic.
    #[test]
    fn identity_read_reproduces_write() {
        let f = |s: f64| (-s * s).exp() * (1. + 0.3 * s);

        for &(max_steps, acc) in &[(20, 1e-10), (6, 1e-14), (2, 1e-3), (1, 1e-3)] {
            let ledger = write(f, -1.2, 2., max_steps, acc);
            assert_eq!(ledger.read(|_| 1.), ledger.estimate());
        }
    }

    #[test]
    fn read_weights_samples() {
        let ledger = write(|x| x, 0., 1., 20, 1e-12);
        assert_approx_eq!(ledger.read(|x| x), 1. / 3., 1e-10);
        assert_approx_eq!(ledger.read(|x| x * x), 0.25, 1e-10);
    }

    #[test]
    fn schedule_order() {
        let ledger = write(|x| x.sqrt(), 0., 1., 4, 0.);
        assert_eq!(ledger.rows(), 3);
        assert_eq!(ledger.nodes(), vec![0., 1., 0.5, 0.25, 0.75, 0.125, 0.375, 0.625, 0.875]);

        for (&s, &x) in ledger.samples().iter().zip(&ledger.nodes()) {
            assert_eq!(s, x.sqrt());
        }
    }

    /// When the budget runs out, the ledger must describe exactly the
    /// samples that were taken, so that replaying it doesn't read past the
    /// end.
    #[test]
    fn budget_exhaustion_is_consistent() {
        let ledger = write(|x| x.sqrt(), 0., 1., 5, 1e-15);
        assert_eq!(ledger.rows(), 4);
        assert_eq!(ledger.samples().len(), 17);
        assert!(!ledger.converged());
        assert_eq!(ledger.read(|_| 1.), ledger.estimate());
        assert_approx_eq!(ledger.estimate(), 2. / 3., 1e-2);
    }

    #[test]
    fn from_parts_validates() {
        let ledger = write(|x| x.cos(), 0., 2., 10, 1e-9);
        let rebuilt = EvaluationLedger::from_parts(0., 2., ledger.rows(), ledger.samples().to_vec(),
                                                   ledger.converged()).unwrap();
        assert_eq!(rebuilt, ledger);

        match EvaluationLedger::from_parts(0., 2., 3, vec![0.; 8], true) {
            Err(SzError::LedgerMismatch { rows: 3, samples: 8 }) => {},
            other => panic!("unexpected result: {:?}", other),
        }
    }

    /// A huge row budget is only a cap: nothing is allocated for rows that
    /// are never reached.
    #[test]
    fn generous_budget_converges_early() {
        let ledger = write(|x| x.exp(), 0., 1., 40, 1e-10);
        assert!(ledger.converged());
        assert!(ledger.rows() < 8);
        assert_eq!(ledger.samples().len(), (1usize << ledger.rows()) + 1);
        assert_approx_eq!(ledger.estimate(), f64::consts::E - 1., 1e-10);

        let ledger = write(|x| x.exp(), 0., 1., usize::max_value(), 1e-10);
        assert_eq!(ledger.rows(), write(|x| x.exp(), 0., 1., 40, 1e-10).rows());
    }

    /// Meeting the target on the last allowed row still counts.
    #[test]
    fn convergence_on_the_last_row() {
        let ledger = write(|x| x, 0., 1., 3, 1e-12);
        assert_eq!(ledger.rows(), 2);
        assert!(ledger.converged());

        let ledger = write(|x| x, 0., 1., 3, 0.);
        assert_eq!(ledger.rows(), 2);
        assert!(!ledger.converged());
    }

    #[test]
    fn sample_counts_are_bounded() {
        assert_eq!(samples_for_rows(0), Some(2));
        assert_eq!(samples_for_rows(3), Some(9));
        assert!(samples_for_rows(max_rows()).is_some());
        assert_eq!(samples_for_rows(max_rows() + 1), None);
    }
}
