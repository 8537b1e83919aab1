// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/// Crank out thermal scattering kernels for random temperatures, recording
/// how long each one takes and how much probability it captures.

extern crate clap;
extern crate szkernel;
extern crate szkernel_test_support;

use clap::{Arg, Command, value_parser};
use std::fs::OpenOptions;
use std::io::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use szkernel::{KernelCalculator, ThermalJuettnerDistribution};
use szkernel_test_support::Sampler;


fn main() {
    let matches = Command::new("crank-out-kernel")
        .version(clap::crate_version!())
        .about("Crank out scattering kernels for random thermal parameters")
        .arg(Arg::new("OUTFILE")
             .help("The path of the output file to append to")
             .required(true)
             .index(1)
             .value_parser(value_parser!(PathBuf)))
        .arg(Arg::new("TE_MIN")
             .help("The minimum electron temperature to generate (keV)")
             .required(true)
             .index(2)
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("TE_MAX")
             .help("The maximum electron temperature to generate (keV)")
             .required(true)
             .index(3)
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("COUNT")
             .help("The number of kernels to compute")
             .required(true)
             .index(4)
             .value_parser(value_parser!(usize)))
        .arg(Arg::new("workers")
             .long("workers")
             .help("The number of threads tabulating each kernel")
             .default_value("4")
             .value_parser(value_parser!(usize)))
        .get_matches();

    let outfile = matches.get_one::<PathBuf>("OUTFILE").unwrap();
    let workers = *matches.get_one::<usize>("workers").unwrap();
    let count = *matches.get_one::<usize>("COUNT").unwrap();

    let log = szkernel_test_support::default_log();

    let te_sampler = Sampler::new(
        true,
        *matches.get_one::<f64>("TE_MIN").unwrap(),
        *matches.get_one::<f64>("TE_MAX").unwrap());

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(true)
        .open(outfile)
        .unwrap();

    writeln!(file, "te_kev(log)\t\
                    time_ms(meta)\t\
                    area(res)\t\
                    mean_shift(res)\t\
                    peak(res)").expect("write error");

    for _ in 0..count {
        let te = te_sampler.get();

        // Log the parameters so we can reconstruct cases that fail.
        write!(file, "{:.16e}", te).expect("write error");
        file.flush().expect("flush error");

        let t0 = Instant::now();
        let d = ThermalJuettnerDistribution::new(te);
        let table = KernelCalculator::new(&d)
            .workers(workers)
            .logger(log.clone())
            .grid_table(-1.2, 2., 500);
        let ms = t0.elapsed().as_secs_f64() * 1000.;

        let mean: f64 = table.iter().map(|(s, p)| s * p).sum::<f64>() * table.step();
        let peak = table.probabilities().iter().fold(0., |m: f64, &p| m.max(p));

        writeln!(file, "\t{:.16e}\t{:.16e}\t{:.16e}\t{:.16e}",
                 ms, table.area(), mean, peak).expect("write error");
    }
}
