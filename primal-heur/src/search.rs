//! Parallel heuristic search orchestration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;

use primal_core::{
    check_feasibility, compute_activities, compute_sol_activities, get_fractional,
    has_zero_lock_rounding, min_lock_round, round_feas_integers, zero_lock_round, Algorithm,
    LpError, LpSolver, LpStatus, MicrolpSolver, Mip, TimeLimit,
};

use crate::bounds::BoundSolution;
use crate::diving::{CoefDiving, FracDiving};
use crate::heuristic::{
    Config, ConfigError, FeasibilityHeuristic, HeurContext, ImprovementHeuristic,
};
use crate::pool::SolutionPool;
use crate::rounding::MinLockRounding;
use crate::shifting::Shifting;

/// Solutions kept per pool.
const POOL_CAPACITY: usize = 10;

/// Errors that abort a whole search run.
#[derive(Error, Debug)]
pub enum SearchError {
    /// A configuration value had the wrong type.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The LP solver failed hard during the root solve.
    #[error("root LP failure: {0}")]
    Solver(#[from] LpError),
}

/// Coordinates the heuristic portfolio: root LP, parallel feasibility
/// stage, incumbent selection, parallel improvement stage, reporting.
pub struct Search {
    feas_heuristics: Vec<Box<dyn FeasibilityHeuristic>>,
    impr_heuristics: Vec<Box<dyn ImprovementHeuristic>>,
}

impl Search {
    /// Build a search over explicit heuristic lists, routing `config`
    /// triples to the named heuristics.
    ///
    /// Values for unknown heuristic names are warned about and dropped;
    /// a type mismatch aborts construction.
    pub fn new(
        feas_heuristics: Vec<Box<dyn FeasibilityHeuristic>>,
        impr_heuristics: Vec<Box<dyn ImprovementHeuristic>>,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let mut search = Self {
            feas_heuristics,
            impr_heuristics,
        };

        let feas_ids: HashMap<String, usize> = search
            .feas_heuristics
            .iter()
            .enumerate()
            .map(|(i, h)| (h.name().to_string(), i))
            .collect();
        let impr_ids: HashMap<String, usize> = search
            .impr_heuristics
            .iter()
            .enumerate()
            .map(|(i, h)| (h.name().to_string(), i))
            .collect();

        for (heur_name, param_name, value) in config {
            if let Some(&id) = feas_ids.get(heur_name) {
                search.feas_heuristics[id].set_param(param_name, value)?;
            } else if let Some(&id) = impr_ids.get(heur_name) {
                search.impr_heuristics[id].set_param(param_name, value)?;
            } else {
                log::warn!("parameter {param_name:?} for unknown heuristic {heur_name:?} ignored");
            }
        }

        Ok(search)
    }

    /// The default portfolio: lock rounding, bound trials and both diving
    /// variants, with shifting as the improvement stage.
    pub fn with_default_portfolio(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            vec![
                Box::new(MinLockRounding::new()),
                Box::new(BoundSolution::new()),
                Box::new(CoefDiving::new()),
                Box::new(FracDiving::new()),
            ],
            vec![Box::new(Shifting::new())],
            config,
        )
    }

    /// Run the search with the in-tree LP backend.
    pub fn run(
        &mut self,
        mip: &Arc<Mip>,
        seconds: Option<f64>,
    ) -> Result<Option<Vec<f64>>, SearchError> {
        let solver = Box::new(MicrolpSolver::new(mip.clone()));
        self.run_with_solver(mip, solver, seconds)
    }

    /// Run the search against a caller-provided LP backend.
    pub fn run_with_solver(
        &mut self,
        mip: &Arc<Mip>,
        mut solver: Box<dyn LpSolver>,
        seconds: Option<f64>,
    ) -> Result<Option<Vec<f64>>, SearchError> {
        let tlimit = TimeLimit::new(seconds);
        let start = Instant::now();
        let st = mip.stats();

        log::info!(
            "problem has {} columns, {} rows, {} non-zeros",
            st.ncols,
            st.nrows,
            st.nnz
        );

        log::info!("solving root LP");
        let mut root = solver.solve_with(Algorithm::Dual)?;
        if root.status != LpStatus::Optimal {
            log::info!("root LP returned status {}", root.status.as_str());
            return Ok(None);
        }

        debug_assert!(primal_core::check_lp_feasibility(mip, &root.primal, 1e-9, 1e-6));
        round_feas_integers(&mut root.primal, mip.ninteger());
        let sol_activity = compute_sol_activities(mip, &root.primal);
        let fractional = get_fractional(&root.primal, mip.ninteger());
        let activities = compute_activities(mip);

        let perc_frac = if mip.ninteger() > 0 {
            100.0 * fractional.len() as f64 / mip.ninteger() as f64
        } else {
            0.0
        };
        log::info!(
            "root objective {:.6e}, {} fractional ({:.1}%), {:.2}s",
            root.obj,
            fractional.len(),
            perc_frac,
            start.elapsed().as_secs_f64()
        );

        // Root LP already integral: it is the optimum.
        if fractional.is_empty() {
            debug_assert!(check_feasibility(mip, &root.primal, 1e-9, 1e-6));
            log::info!("root LP is integer feasible");
            return Ok(Some(root.primal));
        }

        let nfeas = self.feas_heuristics.len();
        let mut feas_pools: Vec<SolutionPool> =
            (0..nfeas + 1).map(|_| SolutionPool::new(POOL_CAPACITY)).collect();

        // Cheap root roundings go into the extra pool.
        let (heur_pools, root_pool) = feas_pools.split_at_mut(nfeas);
        if has_zero_lock_rounding(mip.down_locks(), mip.up_locks(), &fractional) {
            let mut sol = root.primal.clone();
            let delta = zero_lock_round(&mut sol, mip.down_locks(), &fractional, mip.obj());
            if check_feasibility(mip, &sol, 1e-9, 1e-6) {
                log::debug!("root LP zero-lock rounds with delta {delta}");
                root_pool[0].add(sol, root.obj + delta);
            }
        } else if let Some((sol, cost)) = min_lock_round(mip, &root.primal, root.obj, &fractional)
        {
            log::debug!("root LP rounds trivially to cost {cost}");
            root_pool[0].add(sol, cost);
        }

        let ctx = HeurContext {
            mip,
            lb: mip.lb(),
            ub: mip.ub(),
            activities: &activities,
            root: &root,
            sol_activity: &sol_activity,
            fractional: &fractional,
            solver: solver.as_ref(),
            tlimit,
        };

        log::info!("running feasibility heuristics");
        self.feas_heuristics
            .par_iter_mut()
            .zip(heur_pools.par_iter_mut())
            .for_each(|(heur, pool)| heur.execute(&ctx, pool));

        debug_assert!(feas_pools
            .iter()
            .all(|pool| (0..pool.len()).all(|i| check_feasibility(mip, pool.get(i).0, 1e-9, 1e-6))));

        let (best_feas, nsols) = best_of(&feas_pools);
        let (best_heur, best_idx, best_cost) = match best_feas {
            Some(best) => best,
            None => {
                log::info!(
                    "no solution found after {:.2}s",
                    start.elapsed().as_secs_f64()
                );
                return Ok(None);
            }
        };

        log::info!(
            "found {} solutions with gap {} after {:.2}s",
            nsols,
            gap_str(best_cost, root.obj),
            start.elapsed().as_secs_f64()
        );
        self.report_feas(&feas_pools, best_heur);

        let incumbent = feas_pools[best_heur].get(best_idx).0.to_vec();
        let incumbent_cost = best_cost;

        log::info!("running improvement heuristics");
        let nimpr = self.impr_heuristics.len();
        let mut impr_pools: Vec<SolutionPool> =
            (0..nimpr).map(|_| SolutionPool::new(POOL_CAPACITY)).collect();

        self.impr_heuristics
            .par_iter_mut()
            .zip(impr_pools.par_iter_mut())
            .for_each(|(heur, pool)| heur.execute(&ctx, &incumbent, incumbent_cost, pool));

        let (best_impr, impr_nsols) = best_of(&impr_pools);
        if let Some((heur, idx, cost)) = best_impr {
            if cost < incumbent_cost - 1e-9 {
                log::info!(
                    "found {} improved solutions with gap {} after {:.2}s",
                    impr_nsols,
                    gap_str(cost, root.obj),
                    start.elapsed().as_secs_f64()
                );
                self.report_impr(&impr_pools, heur);
                return Ok(Some(impr_pools[heur].get(idx).0.to_vec()));
            }
        }
        log::info!("no improved solution found");

        Ok(Some(incumbent))
    }

    fn report_feas(&self, pools: &[SolutionPool], best: usize) {
        log::info!(
            "  {:<15} {:<15} {:<10} {:<15}",
            "heuristic",
            "runtime (sec.)",
            "found",
            "objective"
        );
        for (i, heur) in self.feas_heuristics.iter().enumerate() {
            log::info!(
                "  {:<15} {:<15.1} {:<10} {:<15}{}",
                heur.name(),
                heur.run_time(),
                pools[i].len(),
                pools[i]
                    .best()
                    .map_or_else(|| "--".to_string(), |(_, c)| format!("{c:0.2}")),
                if i == best { "*" } else { "" }
            );
        }
    }

    fn report_impr(&self, pools: &[SolutionPool], best: usize) {
        log::info!(
            "  {:<15} {:<15} {:<10} {:<15}",
            "heuristic",
            "runtime (sec.)",
            "found",
            "objective"
        );
        for (i, heur) in self.impr_heuristics.iter().enumerate() {
            log::info!(
                "  {:<15} {:<15.1} {:<10} {:<15}{}",
                heur.name(),
                heur.run_time(),
                pools[i].len(),
                pools[i]
                    .best()
                    .map_or_else(|| "--".to_string(), |(_, c)| format!("{c:0.2}")),
                if i == best { "*" } else { "" }
            );
        }
    }
}

/// Locate the cheapest solution across pools.
///
/// Returns `(pool, index, cost)` of the winner plus the total number of
/// pooled solutions.
fn best_of(pools: &[SolutionPool]) -> (Option<(usize, usize, f64)>, usize) {
    let mut best: Option<(usize, usize, f64)> = None;
    let mut nsols = 0;
    for (p, pool) in pools.iter().enumerate() {
        nsols += pool.len();
        for i in 0..pool.len() {
            let cost = pool.get(i).1;
            if best.is_none() || cost < best.unwrap().2 {
                best = Some((p, i, cost));
            }
        }
    }
    (best, nsols)
}

fn gap_str(cost: f64, root_obj: f64) -> String {
    let gap = 100.0 * (cost - root_obj).abs() / (root_obj.abs() + 1e-6);
    if gap < 10000.0 {
        format!("{gap:0.2}%")
    } else {
        "---".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_of_prefers_cheapest() {
        let mut a = SolutionPool::new(5);
        a.add(vec![0.0], 4.0);
        let mut b = SolutionPool::new(5);
        b.add(vec![1.0], 2.0);
        b.add(vec![2.0], 3.0);

        let (best, nsols) = best_of(&[a, b]);
        assert_eq!(nsols, 3);
        assert_eq!(best, Some((1, 0, 2.0)));
    }

    #[test]
    fn test_best_of_empty() {
        let pools = [SolutionPool::new(5), SolutionPool::new(5)];
        let (best, nsols) = best_of(&pools);
        assert!(best.is_none());
        assert_eq!(nsols, 0);
    }
}
