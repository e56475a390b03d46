// SPDX-License-Identifier: AGPL-3.0-only

//! Fifth-dimension kernel benchmark.
//!
//! Times the band apply, the adjoint and the exact inverses on random
//! spinor fields, then reports the accumulated [`KernelStats`].
//!
//! Usage: `bench_m5d [params.json]`. Without an argument the default
//! Möbius parameters (Ls=8, 16 sites) are scaled up through a sweep of
//! lattice sizes.

use std::path::Path;
use std::time::Instant;

use hotspring_eofa::lattice::field::{FiveDimField, Parity};
use hotspring_eofa::params::EofaParams;
use hotspring_eofa::{EofaOperator, KernelError, KernelStats, Spinor};

const N_REPS: usize = 50;

fn bench_operator(
    label: &str,
    op: &EofaOperator,
    sites: usize,
    seed: u64,
    stats: &mut KernelStats,
) -> Result<(), KernelError> {
    let ls = op.ls();
    let psi: FiveDimField<Spinor> = FiveDimField::random(sites, ls, Parity::Even, seed)?;
    let mut chi = FiveDimField::zeros(sites, ls, Parity::Even)?;

    type Entry = fn(
        &EofaOperator,
        &FiveDimField<Spinor>,
        &mut FiveDimField<Spinor>,
        &mut KernelStats,
    ) -> Result<(), KernelError>;
    let entries: [(&str, Entry); 4] = [
        ("M5D", EofaOperator::mooee),
        ("M5Ddag", EofaOperator::mooee_dag),
        ("MooeeInv", EofaOperator::mooee_inv),
        ("MooeeInvDag", EofaOperator::mooee_inv_dag),
    ];
    for (name, entry) in entries {
        let t0 = Instant::now();
        for _ in 0..N_REPS {
            entry(op, &psi, &mut chi, stats)?;
        }
        let dt = t0.elapsed();
        let per_call_us = dt.as_secs_f64() * 1e6 / N_REPS as f64;
        let per_site_ns = per_call_us * 1e3 / sites as f64;
        println!(
            "  {label:<10} {name:<12} V={sites:<6} Ls={ls:<3} {per_call_us:>10.2} us/call  {per_site_ns:>8.2} ns/site"
        );
    }
    Ok(())
}

fn run(params: &EofaParams, sweep: bool) -> Result<(), KernelError> {
    let op = params.build_operator()?;
    let label = if op.is_shifted() { "EOFA" } else { "plain" };
    let mut stats = KernelStats::new();

    let sizes: Vec<usize> = if sweep {
        [1, 4, 16, 64].iter().map(|k| params.sites * k).collect()
    } else {
        vec![params.sites]
    };
    for sites in sizes {
        bench_operator(label, &op, sites, params.seed, &mut stats)?;
    }

    if !op.is_shifted() && sweep {
        let shifted = EofaParams {
            shift: -0.3,
            shift_coeffs: (0..params.ls).map(|s| 0.01 * s as f64).collect(),
            ..params.clone()
        }
        .build_operator()?;
        bench_operator("EOFA", &shifted, params.sites * 16, params.seed, &mut stats)?;
    }

    println!();
    stats.log_summary();
    println!(
        "  M5D:      {} calls, {:.3} ms, {:.2} us/call",
        stats.m5d.calls,
        stats.m5d.elapsed.as_secs_f64() * 1e3,
        stats.m5d.mean_us()
    );
    println!(
        "  MooeeInv: {} calls, {:.3} ms, {:.2} us/call",
        stats.mooee_inv.calls,
        stats.mooee_inv.elapsed.as_secs_f64() * 1e3,
        stats.mooee_inv.mean_us()
    );
    Ok(())
}

fn main() {
    env_logger::init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Fifth-Dimension Kernel Benchmark                          ║");
    println!("║  M5D / M5Ddag / MooeeInv / MooeeInvDag (rayon over sites)  ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let arg = std::env::args().nth(1);
    let params = match arg.as_deref() {
        Some(path) => EofaParams::load(Path::new(path)),
        None => Ok(EofaParams::default()),
    };
    let result = params.and_then(|p| {
        println!(
            "  Ls={} b={} c={} M5={} mass={} pm={:+} shift={}",
            p.ls, p.b, p.c, p.m5, p.mass, p.pm, p.shift
        );
        println!();
        run(&p, arg.is_none())
    });
    if let Err(e) = result {
        eprintln!("bench_m5d: {e}");
        std::process::exit(1);
    }
}
