//! FST input stream parsing and solution output stream writing (§6).
//!
//! The input format is whitespace-token based rather than line-based, the
//! way the teacher's own text-format readers treat their streams as a flat
//! token sequence: an optional version marker, `N` terminals as `x y
//! battery` triples, then `M` FSTs, each `size`, that many terminal ids, an
//! edge count followed by that many `a b length` triples, then the FST's
//! total tree length.

use crate::config::SolverConfig;
use crate::layout::Layout;
use std::io::{BufRead, Write};
use steiner_core::{Fst, GeometricEdge, PointId, SteinerError, SteinerResult, Terminal, TerminalId};
use steiner_solver_common::ExitCode;

const FORMAT_MARKER: &str = "FST1";

struct Tokenizer<I> {
    tokens: I,
}

impl<'a, I: Iterator<Item = &'a str>> Tokenizer<I> {
    fn next_str(&mut self) -> SteinerResult<&'a str> {
        self.tokens
            .next()
            .ok_or_else(|| SteinerError::Parse("unexpected end of input".to_string()))
    }

    fn next_usize(&mut self) -> SteinerResult<usize> {
        self.next_str()?
            .parse()
            .map_err(|e| SteinerError::Parse(format!("expected integer: {e}")))
    }

    fn next_f64(&mut self) -> SteinerResult<f64> {
        self.next_str()?
            .parse()
            .map_err(|e| SteinerError::Parse(format!("expected number: {e}")))
    }
}

/// Parses an FST stream into raw terminals and FSTs, ready for
/// `Hypergraph::new`. Does not normalize costs; that is the caller's job.
pub fn parse_fst_stream(reader: impl BufRead) -> SteinerResult<(Vec<Terminal>, Vec<Fst>)> {
    let mut contents = String::new();
    let mut reader = reader;
    std::io::Read::read_to_string(&mut reader, &mut contents)?;

    let mut tok = Tokenizer { tokens: contents.split_whitespace() };

    // Optional version marker.
    if contents.split_whitespace().next() == Some(FORMAT_MARKER) {
        tok.next_str()?;
    }

    let n = tok.next_usize()?;
    let mut terminals = Vec::with_capacity(n);
    for i in 0..n {
        let x = tok.next_f64()?;
        let y = tok.next_f64()?;
        let battery = tok.next_f64()?;
        terminals.push(Terminal::new(TerminalId::new(i), x, y, battery));
    }

    let m = tok.next_usize()?;
    let mut fsts = Vec::with_capacity(m);
    for fst_idx in 0..m {
        let k = tok.next_usize()?;
        if k < 2 {
            return Err(SteinerError::Validation(format!(
                "FST {fst_idx} has size {k} < 2"
            )));
        }
        let mut fst_terminals = Vec::with_capacity(k);
        for _ in 0..k {
            let id = tok.next_usize()?;
            if id >= n {
                return Err(SteinerError::Validation(format!(
                    "FST {fst_idx} references unknown terminal {id}"
                )));
            }
            fst_terminals.push(TerminalId::new(id));
        }
        let num_edges = tok.next_usize()?;
        if num_edges < k - 1 {
            return Err(SteinerError::Validation(format!(
                "FST {fst_idx} has {num_edges} edges, need at least {}",
                k - 1
            )));
        }
        let mut edges = Vec::with_capacity(num_edges);
        for _ in 0..num_edges {
            let a = tok.next_usize()?;
            let b = tok.next_usize()?;
            let length = tok.next_f64()?;
            edges.push(GeometricEdge::new(PointId::new(a), PointId::new(b), length));
        }
        let length = tok.next_f64()?;
        fsts.push(Fst::new(steiner_core::FstId::new(fst_idx), fst_terminals, edges, length));
    }

    Ok((terminals, fsts))
}

/// Everything the output writer needs that isn't already on `BranchNode` or
/// `SolverConfig`; produced by `SolverContext::solve` (§9 `SolveReport`).
pub struct SolveReport {
    pub exit_code: ExitCode,
    pub objective: Option<f64>,
    pub best_lp_bound: f64,
    pub gap: Option<f64>,
    pub nodes_explored: u64,
    pub cpu_time: std::time::Duration,
    pub assignment: Vec<f64>,
}

/// Writes the solution stream (§6): header block, per-period variable
/// lines, then the summary trailer.
pub fn write_solution(
    mut writer: impl Write,
    report: &SolveReport,
    config: &SolverConfig,
    layout: &Layout,
    fsts: &[Fst],
) -> SteinerResult<()> {
    let tree_cost: f64 = (0..layout.periods())
        .flat_map(|t| (0..layout.num_fsts()).map(move |i| (t, i)))
        .filter(|&(t, i)| report.assignment.get(layout.x_index(t, i)).copied().unwrap_or(0.0) >= 0.5)
        .map(|(_, i)| fsts[i].cost)
        .sum();

    writeln!(writer, "TREE_COST {tree_cost}")?;
    writeln!(writer, "BATTERY_WEIGHT {}", config.battery_weight)?;
    writeln!(writer, "UNCOV_WEIGHT {}", config.uncov_weight)?;
    writeln!(writer, "GAMMA {}", config.graph_distance_weight)?;
    writeln!(writer, "BUDGET {}", config.budget.unwrap_or(f64::INFINITY))?;
    writeln!(writer, "TIME_PERIODS {}", config.time_periods)?;

    for t in 0..layout.periods() {
        for i in 0..layout.num_fsts() {
            let v = report.assignment.get(layout.x_index(t, i)).copied().unwrap_or(0.0);
            if v >= 0.5 {
                writeln!(writer, "x[{i},{t}] = {v}")?;
            }
        }
        for j in 0..layout.num_terminals() {
            let v = report.assignment.get(layout.uncov_index(t, j)).copied().unwrap_or(0.0);
            if v > config.fuzz {
                writeln!(writer, "uncov[{j},{t}] = {v}")?;
            }
        }
        for e in 0..layout.num_edges() {
            let v = report.assignment.get(layout.z_index(t, e)).copied().unwrap_or(0.0);
            if v > config.fuzz {
                writeln!(writer, "z[{e},{t}] = {v}")?;
            }
        }
    }

    writeln!(writer, "OBJECTIVE {}", report.objective.map_or("none".to_string(), |v| v.to_string()))?;
    writeln!(writer, "BEST_LP_BOUND {}", report.best_lp_bound)?;
    writeln!(writer, "GAP {}", report.gap.map_or("none".to_string(), |v| v.to_string()))?;
    writeln!(writer, "NODES_EXPLORED {}", report.nodes_explored)?;
    writeln!(writer, "CPU_TIME_SECONDS {}", report.cpu_time.as_secs_f64())?;
    Ok(())
}

/// Reads back a solution stream's selected FSTs at period 0, for the
/// battery evolution driver (§4.9). Returns the set of FST indices with
/// `x[i,0] >= 0.5`.
pub fn read_selected_fsts_period0(reader: impl BufRead) -> SteinerResult<std::collections::HashSet<usize>> {
    let mut selected = std::collections::HashSet::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(rest) = line.strip_prefix("x[") {
            if let Some((idx_part, tail)) = rest.split_once(',') {
                if tail.contains(",0]") || tail.starts_with("0]") {
                    if let Ok(idx) = idx_part.parse::<usize>() {
                        selected.insert(idx);
                    }
                }
            }
        }
    }
    Ok(selected)
}
