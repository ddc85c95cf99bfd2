//! Gradient-based minimization of the GP negative log-likelihood with argmin L-BFGS.
use crate::errors::{GpError, Result};

use argmin::core::{
    CostFunction, Error, Executor, Gradient, State, TerminationReason, TerminationStatus,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use log::{debug, warn};
use ndarray::Array1;
use std::cell::RefCell;

/// Parameter vector handled by the optimizer (log hyperparameters)
pub(crate) type Param = Array1<f64>;

type LbfgsMoreThuente = LBFGS<MoreThuenteLineSearch<Param, Param, f64>, Param, Param, f64>;

pub(crate) struct LbfgsParams {
    pub memory: usize,
    pub max_iters: u64,
    pub tol_grad: f64,
    pub tol_cost: f64,
}

impl Default for LbfgsParams {
    fn default() -> Self {
        LbfgsParams {
            memory: crate::GP_LBFGS_MEMORY,
            max_iters: crate::GP_DEFAULT_MAX_ITERS,
            tol_grad: 1e-6,
            tol_cost: 1e-10,
        }
    }
}

/// Result of an hyperparameters optimization
#[derive(Debug, Clone)]
pub(crate) struct OptimResult {
    /// Parameters committed as optimum
    pub params: Param,
    /// Objective value at `params`
    pub cost: f64,
    /// Whether the solver reported convergence
    pub converged: bool,
    /// Whether at least one evaluation was below the penalty value
    pub feasible: bool,
}

/// Keeps track of the best evaluation, independently of solver state
/// which is lost when the solver errors out.
#[derive(Default)]
struct BestEval {
    best: Option<(f64, Param)>,
}

impl BestEval {
    fn record(&mut self, cost: f64, param: &Param, penalty: f64) {
        if !cost.is_finite() || cost >= penalty {
            return;
        }
        match &self.best {
            Some((c, _)) if *c <= cost => (),
            _ => self.best = Some((cost, param.to_owned())),
        }
    }
}

struct NllProblem<'a, ObjF, GradF> {
    objfn: ObjF,
    gradfn: GradF,
    penalty: f64,
    best: &'a RefCell<BestEval>,
}

impl<ObjF, GradF> CostFunction for NllProblem<'_, ObjF, GradF>
where
    ObjF: Fn(&Param) -> f64,
{
    type Param = Param;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, Error> {
        let cost = (self.objfn)(param);
        self.best.borrow_mut().record(cost, param, self.penalty);
        Ok(cost)
    }
}

impl<ObjF, GradF> Gradient for NllProblem<'_, ObjF, GradF>
where
    GradF: Fn(&Param) -> Param,
{
    type Param = Param;
    type Gradient = Param;

    fn gradient(&self, param: &Self::Param) -> std::result::Result<Self::Gradient, Error> {
        Ok((self.gradfn)(param))
    }
}

/// Minimize `objfn` with L-BFGS starting from `param0` using `gradfn` as gradient.
///
/// `objfn` is expected to return `penalty` where the objective cannot be evaluated.
/// When the solver does not converge (iteration budget exhausted or line search failure)
/// a warning is emitted and the best evaluated parameters are returned anyway.
pub(crate) fn optimize_params<ObjF, GradF>(
    objfn: ObjF,
    gradfn: GradF,
    param0: &Param,
    penalty: f64,
    lbfgs: LbfgsParams,
) -> Result<OptimResult>
where
    ObjF: Fn(&Param) -> f64,
    GradF: Fn(&Param) -> Param,
{
    let best = RefCell::new(BestEval::default());
    let problem = NllProblem {
        objfn,
        gradfn,
        penalty,
        best: &best,
    };

    let linesearch = MoreThuenteLineSearch::new();
    let solver: LbfgsMoreThuente = LBFGS::new(linesearch, lbfgs.memory)
        .with_tolerance_grad(lbfgs.tol_grad)
        .and_then(|s| s.with_tolerance_cost(lbfgs.tol_cost))
        .map_err(|e| GpError::OptimizationError(e.to_string()))?;

    let res = Executor::new(problem, solver)
        .configure(|state| state.param(param0.to_owned()).max_iters(lbfgs.max_iters))
        .run();

    let outcome = match res {
        Ok(res) => {
            let state = res.state();
            let converged = matches!(
                state.get_termination_status(),
                TerminationStatus::Terminated(
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                )
            );
            if !converged {
                warn!(
                    "GP hyperparameters optimizer did not converge after {} iterations ({:?})",
                    state.get_iter(),
                    state.get_termination_status()
                );
            }
            debug!(
                "L-BFGS ended after {} iterations, best cost = {}",
                state.get_iter(),
                state.get_best_cost()
            );
            state
                .get_best_param()
                .map(|p| (state.get_best_cost(), p.to_owned(), converged))
        }
        Err(err) => {
            warn!("GP hyperparameters optimizer stopped on error: {err}");
            None
        }
    };

    let best = best.into_inner().best;
    let feasible = best.is_some();
    let (cost, params, converged) = match (outcome, best) {
        (Some((cost, params, converged)), _) if cost.is_finite() && cost < penalty => {
            (cost, params, converged)
        }
        (outcome, Some((cost, params))) => (cost, params, outcome.is_some_and(|o| o.2)),
        (_, None) => (penalty, param0.to_owned(), false),
    };
    Ok(OptimResult {
        params,
        cost,
        converged,
        feasible,
    })
}
