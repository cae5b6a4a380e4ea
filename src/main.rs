//! Crossbar Simulator CLI.
//!
//! Thin front end for the simulator library: loads a configuration
//! profile (TOML or JSON), maps a deterministic demo matrix, runs a
//! batch of matrix-vector multiplications, and prints the resulting
//! conductance state and operation statistics.

use clap::Parser;
use std::path::PathBuf;
use std::process;

use xbar_sim::{CrossbarConfig, CrossbarEngine};

/// Command-line arguments for the crossbar simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Analog crossbar MVM simulator")]
struct Args {
    /// Configuration profile (.toml or .json).
    #[arg(short, long, default_value = "configs/default.toml")]
    config: PathBuf,

    /// Logical rows of the demo matrix.
    #[arg(short = 'm', long, default_value_t = 3)]
    rows: usize,

    /// Logical columns of the demo matrix.
    #[arg(short = 'n', long, default_value_t = 4)]
    cols: usize,

    /// Number of MVM calls to execute.
    #[arg(short, long, default_value_t = 10)]
    iterations: u32,
}

/// Deterministic demo weights covering the configured signed range.
fn demo_matrix(cfg: &CrossbarConfig, m: usize, n: usize) -> Vec<i32> {
    if cfg.mode.is_binary() {
        (0..m * n).map(|i| if i % 2 == 0 { 1 } else { -1 }).collect()
    } else {
        let hi = (1i32 << (cfg.w_bit - 1)) - 1;
        let lo = -(1i32 << (cfg.w_bit - 1));
        (0..m * n)
            .map(|i| lo + (i as i32 * 37) % (hi - lo + 1))
            .collect()
    }
}

/// Deterministic demo activations within the configured input range.
fn demo_vector(cfg: &CrossbarConfig, n: usize) -> Vec<i32> {
    if cfg.mode.is_binary() {
        (0..n).map(|i| if i % 3 == 0 { -1 } else { 1 }).collect()
    } else if cfg.mode == xbar_sim::MappingMode::IUintWDiff
        || cfg.mode == xbar_sim::MappingMode::IUintWOffs
    {
        let hi = (1i32 << cfg.i_bit) - 1;
        (0..n).map(|i| (i as i32 * 29) % (hi + 1)).collect()
    } else {
        let hi = (1i32 << (cfg.i_bit - 1)) - 1;
        let lo = -(1i32 << (cfg.i_bit - 1));
        (0..n).map(|i| lo + (i as i32 * 29) % (hi - lo + 1)).collect()
    }
}

fn main() {
    let args = Args::parse();

    let config = match CrossbarConfig::from_file(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load {}: {e}", args.config.display());
            process::exit(1);
        }
    };

    println!("Global Configuration");
    println!("--------------------");
    println!("  Mapping Mode:     {}", config.mode.as_str());
    println!("  Weight Bits:      {}", config.w_bit);
    println!("  Input Bits:       {}", config.i_bit);
    println!("  Bit Slices:       {:?}", config.split);
    println!("  HRS / LRS:        {} / {} uA", config.hrs, config.lrs);
    println!("  ADC Resolution:   {} bit", config.resolution);
    println!("  Tile:             {}x{}", config.tile_rows, config.tile_cols);
    println!("  Digital Only:     {}", config.digital_only);
    println!("  Mitigation:       {}", config.read_disturb_mitigation);

    let mut engine = match CrossbarEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to build engine: {e}");
            process::exit(1);
        }
    };

    let (m, n) = (args.rows, args.cols);
    let mat = demo_matrix(engine.config(), m, n);
    let vec = demo_vector(engine.config(), n);

    if let Err(e) = engine.cpy(&mat, m, n) {
        eprintln!("cpy failed: {e}");
        process::exit(1);
    }

    let mut res = vec![0i32; m];
    for _ in 0..args.iterations {
        res.iter_mut().for_each(|r| *r = 0);
        if let Err(e) = engine.mvm(&mut res, &vec, &mat, m, n) {
            eprintln!("mvm failed: {e}");
            process::exit(1);
        }
    }

    let exact: Vec<i64> = (0..m)
        .map(|row| {
            (0..n)
                .map(|col| i64::from(mat[n * row + col]) * i64::from(vec[col]))
                .sum()
        })
        .collect();

    println!("\nResults after {} MVM calls", args.iterations);
    println!("  simulated: {res:?}");
    println!("  exact:     {exact:?}");

    engine.print_stats();
}
