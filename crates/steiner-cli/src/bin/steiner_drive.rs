//! `steiner-drive`: the thin `BatteryEvolutionDriver` outer loop (§4.9). Does
//! not touch LP internals; each iteration rewrites the FST file's battery
//! column, shells out to `steiner-solve`, and folds the selected FSTs back
//! into a battery update.

use clap::Parser;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use steiner_algo::io_format;
use steiner_core::{Fst, Terminal};
use steiner_solver_common::ExitCode;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

/// CLI surface for the outer battery-evolution driver (§6, §4.9).
#[derive(Parser, Debug)]
#[command(author, version, about = "Outer battery-evolution loop around steiner-solve")]
struct Args {
    /// Number of terminals; must match the terminal count in FST_FILE.
    #[arg(short = 'n', long = "terminals")]
    n: usize,

    /// Per-period normalized tree-length budget, forwarded to steiner-solve.
    #[arg(short = 'b', long = "budget")]
    b: f64,

    /// Number of time periods, forwarded to steiner-solve.
    #[arg(short = 't', long = "time-periods")]
    t: usize,

    /// Maximum number of outer iterations.
    #[arg(short = 'i', long = "max-iters")]
    max_iters: usize,

    /// Path to the FST input file; rewritten in place with the updated
    /// battery vector after every iteration.
    #[arg(short = 'f', long = "fst-file")]
    fst_file: PathBuf,

    /// Battery gained per unit of coverage.
    #[arg(long, default_value_t = 15.0)]
    charge: f64,

    /// Battery lost per outer iteration regardless of coverage.
    #[arg(long, default_value_t = 5.0)]
    demand: f64,

    /// Convergence threshold on the max per-terminal |Δbattery|.
    #[arg(long = "converge-threshold", default_value_t = 1e-3)]
    converge_threshold: f64,

    /// Set the logging level.
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn steiner_solve_path() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("steiner-drive binary has no parent directory"))?;
    let mut candidate = dir.join("steiner-solve");
    if cfg!(windows) {
        candidate.set_extension("exe");
    }
    Ok(candidate)
}

/// Serializes terminals/FSTs back into the §6 input stream format, writing
/// `fst.length` (not the normalized `cost`) as the final per-FST field.
fn write_fst_file(path: &Path, terminals: &[Terminal], fsts: &[Fst]) -> anyhow::Result<()> {
    let mut out = String::new();
    out.push_str(&format!("{}\n", terminals.len()));
    for terminal in terminals {
        out.push_str(&format!("{} {} {}\n", terminal.x, terminal.y, terminal.battery));
    }
    out.push_str(&format!("{}\n", fsts.len()));
    for fst in fsts {
        out.push_str(&format!("{}\n", fst.terminals.len()));
        let ids: Vec<String> = fst.terminals.iter().map(|id| id.value().to_string()).collect();
        out.push_str(&format!("{}\n", ids.join(" ")));
        out.push_str(&format!("{}\n", fst.edges.len()));
        for edge in &fst.edges {
            out.push_str(&format!("{} {} {}\n", edge.a.value(), edge.b.value(), edge.length));
        }
        out.push_str(&format!("{}\n", fst.length));
    }
    fs::write(path, out)?;
    Ok(())
}

/// One outer iteration: rewrite the file, invoke `steiner-solve`, read back
/// selected FSTs at period 0, update every terminal's battery. Returns the
/// max per-terminal |Δbattery| observed (excluding terminal 0, always pinned).
fn run_iteration(args: &Args, terminals: &mut [Terminal], fsts: &[Fst]) -> anyhow::Result<f64> {
    write_fst_file(&args.fst_file, terminals, fsts)?;

    let solve_path = steiner_solve_path()?;
    let input = fs::File::open(&args.fst_file)?;
    let output = Command::new(&solve_path)
        .env("BUDGET", args.b.to_string())
        .env("TIME_PERIODS", args.t.to_string())
        .stdin(Stdio::from(input))
        .stdout(Stdio::piped())
        .output()?;

    let exit_code = ExitCode::from_raw(output.status.code().unwrap_or(3));
    if exit_code == ExitCode::Fatal {
        return Err(anyhow::anyhow!(
            "steiner-solve exited fatally: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    let selected = io_format::read_selected_fsts_period0(BufReader::new(output.stdout.as_slice()))?;

    let mut covered = vec![false; terminals.len()];
    for &fst_idx in &selected {
        if let Some(fst) = fsts.get(fst_idx) {
            for terminal_id in &fst.terminals {
                covered[terminal_id.value()] = true;
            }
        }
    }

    let mut max_delta = 0.0f64;
    for (j, terminal) in terminals.iter_mut().enumerate() {
        if j == 0 {
            terminal.battery = 100.0;
            continue;
        }
        let delta = if covered[j] { args.charge } else { 0.0 } - args.demand;
        let updated = (terminal.battery + delta).clamp(0.0, 100.0);
        max_delta = max_delta.max((updated - terminal.battery).abs());
        terminal.battery = updated;
    }

    info!(
        "iteration done: covered={}/{}, max_delta={:.4}",
        covered.iter().filter(|&&c| c).count(),
        terminals.len(),
        max_delta
    );

    Ok(max_delta)
}

fn drive(args: &Args) -> anyhow::Result<bool> {
    let contents = fs::read_to_string(&args.fst_file)?;
    let (mut terminals, fsts) =
        io_format::parse_fst_stream(BufReader::new(contents.as_bytes()))?;

    if terminals.len() != args.n {
        return Err(anyhow::anyhow!(
            "-n {} does not match {} terminals found in {}",
            args.n,
            terminals.len(),
            args.fst_file.display()
        ));
    }

    for iteration in 0..args.max_iters {
        let max_delta = run_iteration(args, &mut terminals, &fsts)?;
        info!("outer iteration {iteration}: max_delta={max_delta:.4}");
        if max_delta < args.converge_threshold {
            return Ok(true);
        }
    }

    Ok(false)
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(args.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match drive(&args) {
        Ok(true) => {
            info!("battery evolution converged");
            std::process::ExitCode::from(ExitCode::Optimal as u8)
        }
        Ok(false) => {
            info!("reached max iterations without converging");
            std::process::ExitCode::from(ExitCode::Preempted as u8)
        }
        Err(err) => {
            error!("steiner-drive failed: {err:?}");
            std::process::ExitCode::from(ExitCode::Fatal as u8)
        }
    }
}
