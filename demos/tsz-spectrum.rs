// Copyright 2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/// Print the thermal SZ spectrum of a hot gas next to the closed-form
/// expansion, optionally adding the kinematic effect.

extern crate clap;
extern crate szkernel;
extern crate szkernel_test_support;

use clap::{Arg, ArgAction, Command, value_parser};
use szkernel::{KernelMethod, KinematicSignal, Population, SzSignal, ThermalJuettnerDistribution, analytic};
use szkernel::conversions::si_to_jy_per_sr;
use szkernel_test_support::frequencies_ghz;

fn main() {
    let matches = Command::new("tsz-spectrum")
        .version(clap::crate_version!())
        .about("Compute the SZ spectrum of a thermal electron population.")
        .arg(Arg::new("TE_KEV")
             .help("The electron temperature (keV)")
             .required(true)
             .index(1)
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("TAU")
             .help("The optical depth")
             .required(true)
             .index(2)
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("v_pec")
             .long("v-pec")
             .help("Add the kinematic effect of this peculiar velocity (km/s)")
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("nu_min")
             .long("nu-min")
             .help("The lowest frequency (GHz)")
             .default_value("20")
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("nu_max")
             .long("nu-max")
             .help("The highest frequency (GHz)")
             .default_value("800")
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("n_nu")
             .long("n-nu")
             .help("The number of frequencies")
             .default_value("40")
             .value_parser(value_parser!(usize)))
        .arg(Arg::new("workers")
             .long("workers")
             .help("The number of threads tabulating the kernel")
             .default_value("4")
             .value_parser(value_parser!(usize)))
        .arg(Arg::new("romberg")
             .long("romberg")
             .help("Integrate the adaptive kernel with the Romberg method")
             .action(ArgAction::SetTrue))
        .get_matches();

    let te = *matches.get_one::<f64>("TE_KEV").unwrap();
    let tau = *matches.get_one::<f64>("TAU").unwrap();
    let freqs = frequencies_ghz(*matches.get_one::<f64>("nu_min").unwrap(),
                                *matches.get_one::<f64>("nu_max").unwrap(),
                                *matches.get_one::<usize>("n_nu").unwrap());

    let method = if matches.get_flag("romberg") {
        KernelMethod::romberg()
    } else {
        KernelMethod::Grid
    };

    let mut delta = SzSignal::new(Population::thermal(te))
        .optical_depth(tau)
        .subtract_background(true)
        .workers(*matches.get_one::<usize>("workers").unwrap())
        .method(method)
        .logger(szkernel_test_support::default_log())
        .compute(&freqs);

    if let Some(&v_pec) = matches.get_one::<f64>("v_pec") {
        let ksz = KinematicSignal::new(v_pec).optical_depth(tau);

        for (d, &nu) in delta.iter_mut().zip(&freqs) {
            *d += ksz.at(nu);
        }
    }

    let theta = ThermalJuettnerDistribution::new(te).theta();

    println!("nu_ghz\tdelta_si\tdelta_jy_sr\texpansion_jy_sr");

    for (&nu, &d) in freqs.iter().zip(&delta) {
        println!("{:.3}\t{:.8e}\t{:.8e}\t{:.8e}", nu * 1e-9, d, si_to_jy_per_sr(d),
                 si_to_jy_per_sr(analytic::tsz(nu, theta, tau)));
    }
}
