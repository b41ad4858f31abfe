//! `steiner-solve`: the core branch-and-cut binary (§6). Reads an FST stream
//! on stdin, writes the solution stream on stdout, and exits with the
//! [`ExitCode`] that matches what happened.

use clap::Parser;
use std::io::{self, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use steiner_algo::{io_format, ClarabelLpSolver, SolverConfig, SolverContext};
use steiner_core::Hypergraph;
use steiner_solver_common::{ExitCode, LpSolver, SolverError, SolverResult};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

/// CLI surface for the core solver (§6). Every flag has a matching
/// environment variable, so `steiner-drive` can configure a child
/// `steiner-solve` invocation purely through its environment.
#[derive(Parser, Debug)]
#[command(author, version, about = "Battery-aware Steiner tree branch-and-cut solver")]
struct Args {
    /// Per-period normalized tree-length budget. Omit to disable
    /// budget-constrained, battery-aware mode entirely.
    #[arg(long, env = "BUDGET")]
    budget: Option<f64>,

    /// Number of discrete time periods, 1..=100.
    #[arg(long, env = "TIME_PERIODS", default_value_t = 1)]
    time_periods: usize,

    /// Inter-period topology-change weight.
    #[arg(long, env = "GRAPH_DISTANCE_WEIGHT", default_value_t = 0.0)]
    graph_distance_weight: f64,

    /// Opt in to MST-correction cost adjustment (§9).
    #[arg(long, env = "ENABLE_MST_CORRECTION")]
    enable_mst_correction: bool,

    /// MIP gap termination ratio.
    #[arg(long, env = "GAP_TARGET", default_value_t = 1.0)]
    gap_target: f64,

    /// Battery-reward weight.
    #[arg(long, env = "BATTERY_WEIGHT", default_value_t = 50.0)]
    battery_weight: f64,

    /// Uncovered-terminal slack weight.
    #[arg(long, env = "UNCOV_WEIGHT", default_value_t = 0.0)]
    uncov_weight: f64,

    /// Seed 2-vertex subtour-elimination constraints at construction time.
    #[arg(long, env = "SEED_2VERTEX_SEC")]
    seed_2vertex_sec: bool,

    /// Set the logging level.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: tracing::Level,
}

impl Args {
    fn to_solver_config(&self) -> SolverConfig {
        let mut config = SolverConfig::default();
        config.budget = self.budget;
        config.time_periods = self.time_periods;
        config.graph_distance_weight = self.graph_distance_weight;
        config.enable_mst_correction = self.enable_mst_correction;
        config.gap_target = self.gap_target;
        config.battery_weight = self.battery_weight;
        config.uncov_weight = self.uncov_weight;
        config.seed_2vertex_sec = self.seed_2vertex_sec;
        config
    }
}

/// Set by `install_sigint_handler`'s C signal handler; `main` polls it
/// through the `Arc<AtomicBool>` it's paired with via `PREEMPT_SLOT`.
static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_signum: libc::c_int) {
    SIGINT_RECEIVED.store(true, Ordering::SeqCst);
}

/// Installs a SIGINT handler that flips `SIGINT_RECEIVED`, then spawns a
/// polling thread that mirrors it into `preempt` (§5: cooperative, checked
/// after every LP solve rather than delivered asynchronously into the solve
/// loop itself).
fn install_sigint_handler(preempt: Arc<AtomicBool>) {
    unsafe {
        libc::signal(libc::SIGINT, handle_sigint as usize);
    }
    std::thread::spawn(move || loop {
        if SIGINT_RECEIVED.load(Ordering::SeqCst) {
            preempt.store(true, Ordering::SeqCst);
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    });
}

fn run(args: &Args, preempt: Arc<AtomicBool>) -> SolverResult<io_format::SolveReport> {
    let stdin = io::stdin();
    let (terminals, fsts) = io_format::parse_fst_stream(BufReader::new(stdin.lock()))
        .map_err(|e| SolverError::InputMalformed(e.to_string()))?;
    let hypergraph = Hypergraph::new(terminals, fsts);

    let config = args.to_solver_config();
    let config_for_output = config.clone();

    let lp: Box<dyn LpSolver> = Box::new(ClarabelLpSolver::new());
    let ctx = SolverContext::new(&hypergraph, config, lp, preempt)?;
    let layout = *ctx.layout();
    let report = ctx.solve()?;

    io_format::write_solution(io::stdout().lock(), &report, &config_for_output, &layout, hypergraph.fsts())
        .map_err(|e| SolverError::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?;

    Ok(report)
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(args.log_level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let preempt = Arc::new(AtomicBool::new(false));
    install_sigint_handler(Arc::clone(&preempt));

    info!("steiner-solve starting, budget={:?}, time_periods={}", args.budget, args.time_periods);

    let exit_code = match run(&args, preempt) {
        Ok(report) => {
            info!(
                "solve finished: exit_code={:?}, objective={:?}, nodes={}",
                report.exit_code, report.objective, report.nodes_explored
            );
            report.exit_code
        }
        Err(err) => {
            error!("steiner-solve failed: {err}");
            err.exit_code()
        }
    };

    std::process::ExitCode::from(exit_code as u8)
}
