//! `SolverConfig`: the per-solve tunables (§6 environment variables, §9
//! Open Question resolutions), grounded on `TepProblem`'s builder-settable
//! fields style.

/// Configuration for one core-solver invocation. Every field here has a
/// corresponding environment variable and CLI flag (`steiner-cli`); this
/// struct is the single source of truth both surfaces populate.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Per-period normalized tree-length budget `B`. `None` disables the
    /// budget-constrained, battery-aware mode entirely (no budget row is
    /// seeded, and the spanning constraint defaults to `=`).
    pub budget: Option<f64>,
    /// Number of discrete time periods `T`, 1..=100.
    pub time_periods: usize,
    /// Battery-reward weight `α`. Default 50.0 per §4.4.
    pub battery_weight: f64,
    /// Uncovered-terminal slack weight `β`. Default 0.0 (§9 Open Question).
    pub uncov_weight: f64,
    /// Inter-period topology-change weight `γ`. 0.0 disables topology smoothing.
    pub graph_distance_weight: f64,
    /// Opt-in MST correction pre-computation (§9).
    pub enable_mst_correction: bool,
    /// Seed 2-vertex subtour-elimination constraints at construction time (§4.5).
    pub seed_2vertex_sec: bool,
    /// Gap termination ratio; stop when `|UB-LB|/|LB| <= gap_target - 1`.
    pub gap_target: f64,
    /// Fixed integer scale `S` used to convert the budget row to integers (§4.5).
    pub budget_scale: i64,
    /// Numerical fuzz tolerance used throughout the relaxation loop and GC.
    pub fuzz: f64,
    /// Force the spanning constraint to equality regardless of budget mode
    /// (§9 Open Question override; `None` means "use the default for the
    /// current mode").
    pub spanning_equality: Option<bool>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            budget: None,
            time_periods: 1,
            battery_weight: 50.0,
            uncov_weight: 0.0,
            graph_distance_weight: 0.0,
            enable_mst_correction: false,
            seed_2vertex_sec: false,
            gap_target: 1.0,
            budget_scale: 1_000_000,
            fuzz: 1e-6,
            spanning_equality: None,
        }
    }
}

impl SolverConfig {
    /// §9 Open Question resolution: `≥` by default in battery-aware
    /// (budget-constrained) mode, `=` otherwise, unless explicitly
    /// overridden.
    pub fn spanning_is_equality(&self) -> bool {
        if let Some(forced) = self.spanning_equality {
            return forced;
        }
        self.budget.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.time_periods == 0 || self.time_periods > 100 {
            return Err(format!(
                "TIME_PERIODS must be in 1..=100, got {}",
                self.time_periods
            ));
        }
        if self.graph_distance_weight < 0.0 {
            return Err("GRAPH_DISTANCE_WEIGHT must be >= 0".to_string());
        }
        if self.gap_target < 1.0 {
            return Err("GAP_TARGET must be >= 1.0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanning_defaults_to_ge_when_budget_set() {
        let mut cfg = SolverConfig::default();
        cfg.budget = Some(1.5);
        assert!(!cfg.spanning_is_equality());
    }

    #[test]
    fn spanning_defaults_to_eq_without_budget() {
        let cfg = SolverConfig::default();
        assert!(cfg.spanning_is_equality());
    }

    #[test]
    fn override_wins_over_default() {
        let mut cfg = SolverConfig::default();
        cfg.budget = Some(1.5);
        cfg.spanning_equality = Some(true);
        assert!(cfg.spanning_is_equality());
    }

    #[test]
    fn validate_rejects_bad_time_periods() {
        let mut cfg = SolverConfig::default();
        cfg.time_periods = 0;
        assert!(cfg.validate().is_err());
        cfg.time_periods = 101;
        assert!(cfg.validate().is_err());
    }
}
