// SAT oracle seam. The constraint store hands over a CNF and a time budget and
// gets back SAT / UNSAT / UNKNOWN; nothing else about the solver leaks out.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use rustsat::instances::Cnf;
use rustsat::solvers::{Interrupt, InterruptSolver, Solve, SolverResult};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    Sat,
    Unsat,
    /// The time budget ran out before the solver reached a verdict
    Unknown,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to load clauses into the solver: {0}")]
    Load(String),

    #[error("solver failed: {0}")]
    Solve(String),
}

pub trait Oracle {
    fn solve(&self, cnf: Cnf, time_limit: Duration) -> Result<SolveOutcome, OracleError>;
}

/// MiniSat, with the time budget enforced by a watchdog thread that
/// interrupts the search when the budget runs out.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinisatOracle;

impl Oracle for MinisatOracle {
    fn solve(&self, cnf: Cnf, time_limit: Duration) -> Result<SolveOutcome, OracleError> {
        let mut solver = rustsat_minisat::core::Minisat::default();
        solver
            .add_cnf(cnf)
            .map_err(|e| OracleError::Load(e.to_string()))?;

        let mut interrupter = solver.interrupter();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let watchdog = thread::spawn(move || {
            // Disconnected means the solve finished first
            if let Err(mpsc::RecvTimeoutError::Timeout) = done_rx.recv_timeout(time_limit) {
                interrupter.interrupt();
            }
        });

        let solve_start = Instant::now();
        let result = solver.solve();
        drop(done_tx);
        let _ = watchdog.join();

        let outcome = match result.map_err(|e| OracleError::Solve(e.to_string()))? {
            SolverResult::Sat => SolveOutcome::Sat,
            SolverResult::Unsat => SolveOutcome::Unsat,
            SolverResult::Interrupted => SolveOutcome::Unknown,
        };

        debug!(
            ?outcome,
            elapsed_ms = solve_start.elapsed().as_secs_f64() * 1000.0,
            "oracle call"
        );
        Ok(outcome)
    }
}
