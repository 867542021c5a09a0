//! End-to-end runs of the search over small hand-built models.

use std::sync::Arc;

use primal_core::{check_feasibility, Mip, MipBuilder, VarType};
use primal_heur::{Config, ParamValue, Search};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn run_default(mip: &Arc<Mip>, seconds: Option<f64>) -> Option<Vec<f64>> {
    let mut search = Search::with_default_portfolio(&Config::new()).unwrap();
    search.run(mip, seconds).unwrap()
}

#[test]
fn test_trivial_covering() {
    init_logging();

    // min x + y  s.t.  x + y >= 1: the LP sits fractional somewhere on the
    // facet and every rounding lands on a cost-1 vertex.
    let mut b = MipBuilder::new();
    let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
    let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
    b.add_row("cover", 1.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
    let mip = Arc::new(b.build().unwrap());

    let sol = run_default(&mip, None).expect("a solution must be found");
    assert!(check_feasibility(&mip, &sol, 1e-9, 1e-6));
    assert!((mip.objective_value(&sol) - 1.0).abs() < 1e-6);
}

#[test]
fn test_zero_lock_rounding_of_root() {
    init_logging();

    // Knapsack with profit: the LP relaxation is fractional, and the single
    // <=-row means every column can round down lock-free.
    let mut b = MipBuilder::new();
    let x1 = b.add_var("x1", VarType::Binary, 0.0, 1.0, -1.0);
    let x2 = b.add_var("x2", VarType::Binary, 0.0, 1.0, -1.0);
    let x3 = b.add_var("x3", VarType::Binary, 0.0, 1.0, -1.0);
    b.add_row(
        "cap",
        f64::NEG_INFINITY,
        5.0,
        &[(x1, 2.0), (x2, 2.0), (x3, 3.0)],
    );
    let mip = Arc::new(b.build().unwrap());

    let sol = run_default(&mip, None).expect("a solution must be found");
    assert!(check_feasibility(&mip, &sol, 1e-9, 1e-6));
    // Best integer point packs two items.
    assert!(mip.objective_value(&sol) <= -2.0 + 1e-6);
}

#[test]
fn test_repair_recovers_continuous() {
    init_logging();

    // x1 + x2 + c = 1.5 with c in [0, 1]: the LP leaves the binaries
    // fractional and the repair loop moves c to absorb the rounding.
    let mut b = MipBuilder::new();
    let x1 = b.add_var("x1", VarType::Binary, 0.0, 1.0, 1.0);
    let x2 = b.add_var("x2", VarType::Binary, 0.0, 1.0, 1.0);
    let c = b.add_var("c", VarType::Continuous, 0.0, 1.0, 0.0);
    b.add_row("mix", 1.5, 1.5, &[(x1, 1.0), (x2, 1.0), (c, 1.0)]);
    let mip = Arc::new(b.build().unwrap());

    let sol = run_default(&mip, None).expect("a solution must be found");
    assert!(check_feasibility(&mip, &sol, 1e-9, 1e-6));
    assert!((mip.objective_value(&sol) - 1.0).abs() < 1e-6);
}

#[test]
fn test_integral_root_returned_directly() {
    init_logging();

    // The LP optimum is integral, so the search returns it without running
    // any heuristic.
    let mut b = MipBuilder::new();
    let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
    let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
    b.add_row("cap", f64::NEG_INFINITY, 2.0, &[(x, 1.0), (y, 1.0)]);
    let mip = Arc::new(b.build().unwrap());

    let sol = run_default(&mip, None).expect("the root solution is feasible");
    assert!((mip.objective_value(&sol)).abs() < 1e-6);
}

#[test]
fn test_infeasible_root_lp_aborts() {
    init_logging();

    // x + y >= 3 over binaries has an infeasible relaxation: the run ends
    // with no solution and no error.
    let mut b = MipBuilder::new();
    let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 1.0);
    let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
    b.add_row("cover3", 3.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
    let mip = Arc::new(b.build().unwrap());

    assert!(run_default(&mip, None).is_none());
}

/// A model whose unique LP optimum is fractional and whose trivial rounding
/// fails, so any solution must come from a real heuristic.
///
/// `2x + y + z = 2` with costs picked so the vertex `(0.5, 1, 0)` wins the
/// relaxation; the only escape routes are diving or propagation.
fn awkward_equality() -> Arc<Mip> {
    let mut b = MipBuilder::new();
    let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 2.0);
    let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 0.5);
    let z = b.add_var("z", VarType::Binary, 0.0, 1.0, 1.5);
    b.add_row("eq", 2.0, 2.0, &[(x, 2.0), (y, 1.0), (z, 1.0)]);
    Arc::new(b.build().unwrap())
}

#[test]
fn test_expired_deadline_reports_no_solution() {
    init_logging();

    // With a spent budget every heuristic must come back promptly and
    // empty, and the equality row defeats the trivial root rounding.
    assert!(run_default(&awkward_equality(), Some(0.0)).is_none());
}

#[test]
fn test_diving_rescues_unroundable_model() {
    init_logging();

    // Same model, no deadline: lock rounding cannot repair the equality,
    // but diving or the bound trials reach (0, 1, 1).
    let mip = awkward_equality();
    let sol = run_default(&mip, None).expect("a solution must be found");
    assert!(check_feasibility(&mip, &sol, 1e-9, 1e-6));
    assert!((mip.objective_value(&sol) - 2.0).abs() < 1e-6);
}

#[test]
fn test_improvement_stage_runs_on_incumbent() {
    init_logging();

    // A loose cardinality floor: feasibility heuristics may land above the
    // floor and shifting walks the incumbent down to it.
    let mut b = MipBuilder::new();
    let x = b.add_var("x", VarType::Integer, 0.0, 4.0, 1.0);
    let y = b.add_var("y", VarType::Integer, 0.0, 4.0, 1.0);
    b.add_row("floor", 1.0, f64::INFINITY, &[(x, 1.0), (y, 1.0)]);
    b.add_row("link", 0.0, f64::INFINITY, &[(x, 1.0), (y, -1.0)]);
    let mip = Arc::new(b.build().unwrap());

    let sol = run_default(&mip, None).expect("a solution must be found");
    assert!(check_feasibility(&mip, &sol, 1e-9, 1e-6));
    assert!(mip.objective_value(&sol) <= 2.0 + 1e-6);
}

#[test]
fn test_config_routes_and_rejects() {
    init_logging();

    // A well-typed parameter is accepted, an unknown heuristic is ignored.
    let config: Config = vec![
        (
            "lockrounding".into(),
            "max_orderings".into(),
            ParamValue::Int(2),
        ),
        ("nosuchheur".into(), "x".into(), ParamValue::Bool(true)),
    ];
    assert!(Search::with_default_portfolio(&config).is_ok());

    // A type mismatch is a hard configuration error.
    let config: Config = vec![(
        "lockrounding".into(),
        "max_orderings".into(),
        ParamValue::Str("four".into()),
    )];
    assert!(Search::with_default_portfolio(&config).is_err());
}
