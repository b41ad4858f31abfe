//! ObjectiveBuilder (§4.4): per-period LP coefficients from tree cost,
//! per-terminal battery reward, per-edge-change weight, and uncovered-slack
//! weight.

use crate::config::SolverConfig;
use crate::layout::Layout;
use crate::mst_correction::mst_correction_deltas;
use steiner_core::Hypergraph;

/// Builds the full `V`-length objective coefficient vector for one solve.
/// All `T` periods share the same per-FST coefficient: batteries are only
/// ever updated by the outer battery evolution driver between solves, never
/// by the LP itself.
pub struct ObjectiveBuilder<'a> {
    hypergraph: &'a Hypergraph,
    layout: &'a Layout,
    config: &'a SolverConfig,
}

impl<'a> ObjectiveBuilder<'a> {
    pub fn new(hypergraph: &'a Hypergraph, layout: &'a Layout, config: &'a SolverConfig) -> Self {
        Self {
            hypergraph,
            layout,
            config,
        }
    }

    pub fn build(&self) -> Vec<f64> {
        let mut obj = vec![0.0; self.layout.num_vars()];
        let fst_coeffs = self.fst_coefficients();

        for t in 0..self.layout.periods() {
            for (i, &c) in fst_coeffs.iter().enumerate() {
                obj[self.layout.x_index(t, i)] = c;
            }
            for j in 0..self.layout.num_terminals() {
                obj[self.layout.uncov_index(t, j)] = self.config.uncov_weight;
            }
            // z[e,t] and b[j,t] coefficients are 0 (§4.4); already zeroed.
        }
        for tau in 0..self.layout.periods().saturating_sub(1) {
            for e in 0..self.layout.num_edges() {
                obj[self.layout.d_index(tau, e)] = self.config.graph_distance_weight;
            }
        }
        obj
    }

    /// `cost[i] + sum_{j in FST i} alpha*(-1 + battery[j]/100)`, optionally
    /// adjusted by the MST correction pre-computation (§9).
    fn fst_coefficients(&self) -> Vec<f64> {
        let fsts = self.hypergraph.fsts();
        let mst_deltas = if self.config.enable_mst_correction {
            Some(mst_correction_deltas(self.hypergraph))
        } else {
            None
        };

        fsts.iter()
            .map(|fst| {
                let battery_term: f64 = fst
                    .terminals
                    .iter()
                    .map(|&t| {
                        let battery = self.hypergraph.terminal(t).battery;
                        self.config.battery_weight * (-1.0 + battery / 100.0)
                    })
                    .sum();
                let mut c = fst.cost + battery_term;
                if let Some(deltas) = &mst_deltas {
                    c += deltas[fst.id.value()];
                }
                c
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steiner_core::{Fst, FstId, GeometricEdge, PointId, Terminal, TerminalId};

    fn instance() -> Hypergraph {
        let terminals = vec![
            Terminal::new(TerminalId::new(0), 0.0, 0.0, 100.0),
            Terminal::new(TerminalId::new(1), 1.0, 0.0, 5.0),
        ];
        let fst = Fst::new(
            FstId::new(0),
            vec![TerminalId::new(0), TerminalId::new(1)],
            vec![GeometricEdge::new(PointId::new(0), PointId::new(1), 1.0)],
            1.0,
        );
        Hypergraph::new(terminals, vec![fst])
    }

    #[test]
    fn low_battery_terminal_makes_coefficient_more_negative() {
        let hg = instance();
        let config = SolverConfig::default();
        let layout = Layout::new(&hg, 1);
        let builder = ObjectiveBuilder::new(&hg, &layout, &config);
        let obj = builder.build();
        // terminal 0 at 100 contributes 0; terminal 1 at 5 contributes 50*(-0.95).
        let expected = hg.fsts()[0].cost + 50.0 * (-1.0 + 5.0 / 100.0);
        assert!((obj[layout.x_index(0, 0)] - expected).abs() < 1e-9);
    }

    #[test]
    fn all_periods_share_the_same_fst_coefficient() {
        let hg = instance();
        let config = SolverConfig::default();
        let layout = Layout::new(&hg, 3);
        let builder = ObjectiveBuilder::new(&hg, &layout, &config);
        let obj = builder.build();
        let c0 = obj[layout.x_index(0, 0)];
        let c1 = obj[layout.x_index(1, 0)];
        let c2 = obj[layout.x_index(2, 0)];
        assert_eq!(c0, c1);
        assert_eq!(c1, c2);
    }

    #[test]
    fn uncov_weight_defaults_to_zero() {
        let hg = instance();
        let config = SolverConfig::default();
        let layout = Layout::new(&hg, 1);
        let builder = ObjectiveBuilder::new(&hg, &layout, &config);
        let obj = builder.build();
        assert_eq!(obj[layout.uncov_index(0, 0)], 0.0);
    }
}
