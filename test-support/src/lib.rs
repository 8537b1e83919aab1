// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

//! Shared helpers for the tests, benchmarks, and demo programs.

extern crate rand;
#[macro_use] extern crate slog;
extern crate slog_async;
extern crate slog_term;

use rand::Rng;
use slog::Drain;

/// Create a terminal `slog` logger for test and demo programs.
///
/// Messages go through an async drain that blocks rather than dropping
/// records when it falls behind, so a chatty kernel run doesn't lose any.
pub fn default_log() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .overflow_strategy(slog_async::OverflowStrategy::Block)
        .build().fuse();
    slog::Logger::root(drain, o!("program" => "szkernel"))
}


/// `n` frequencies in Hz, evenly spaced in GHz between `lo_ghz` and
/// `hi_ghz` inclusive.
pub fn frequencies_ghz(lo_ghz: f64, hi_ghz: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo_ghz * 1e9],
        _ => {
            let step = (hi_ghz - lo_ghz) / (n - 1) as f64;
            (0..n).map(|i| (lo_ghz + i as f64 * step) * 1e9).collect()
        },
    }
}


/// Draws random parameter values, uniformly or log-uniformly between two
/// bounds.
#[derive(Clone,Debug)]
pub struct Sampler {
    is_log: bool,
    low: f64,
    range: f64,
}

impl Sampler {
    /// Create a new Sampler. The bounds may be given in either order; for a
    /// log-uniform sampler they must both be positive.
    pub fn new(is_log: bool, low: f64, high: f64) -> Self {
        let (mut low, mut high) = if low > high { (high, low) } else { (low, high) };

        if is_log {
            low = low.ln();
            high = high.ln();
        }

        Sampler { is_log: is_log, low: low, range: high - low }
    }

    /// Draw one value.
    pub fn get(&self) -> f64 {
        let n = self.low + rand::thread_rng().gen::<f64>() * self.range;

        if self.is_log {
            n.exp()
        } else {
            n
        }
    }

    /// Draw `n` values.
    pub fn draw(&self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.get()).collect()
    }
}
