// One puzzle session: the accumulated clues plus the facts already reported.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::clue::{self, Clue};
use crate::config::{Settings, TimeoutPolicy};
use crate::deduce::{self, Fact, Status};
use crate::oracle::{MinisatOracle, Oracle, OracleError, SolveOutcome};
use crate::store::ConstraintStore;

pub const CONTRADICTION: &str = "No solution. Contradiction found.";

pub const TIMEOUT_WARNING: &str = "Warning: the current set of rules is too complex!
Try restarting with new rules referencing only the unknown people.";

/// Result of processing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Clue kept. `facts` holds only what was not reported before.
    Accepted {
        facts: Vec<Fact>,
        warning: Option<String>,
    },
    /// Bad input; nothing changed, ask again
    Rejected(String),
    /// The session is over
    Finished(String),
}

pub struct Session<O: Oracle = MinisatOracle> {
    settings: Settings,
    oracle: O,
    store: ConstraintStore,
    known: BTreeMap<char, Status>,
    finished: Option<String>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Session::with_oracle(settings, MinisatOracle)
    }
}

impl<O: Oracle> Session<O> {
    pub fn with_oracle(settings: Settings, oracle: O) -> Self {
        Session {
            settings,
            oracle,
            store: ConstraintStore::new(),
            known: BTreeMap::new(),
            finished: None,
        }
    }

    pub fn process(&mut self, line: &str) -> Step {
        if let Some(message) = &self.finished {
            return Step::Finished(message.clone());
        }

        let text = line.trim().to_lowercase();
        let clue = match clue::parse_clue(&text) {
            Ok(clue) => clue,
            Err(e) => {
                info!(input = %text, error = %e, "clue rejected");
                return Step::Rejected(e.to_string());
            }
        };

        match self.accept(clue) {
            Ok(step) => step,
            Err(e) => {
                error!(error = %e, "oracle failure");
                self.finish(format!("Solver error: {}", e))
            }
        }
    }

    fn accept(&mut self, clue: Clue) -> Result<Step, OracleError> {
        let time_limit = self.settings.time_limit();

        let mut staged = self.store.clone();
        staged.add(clue.clone());

        let mut warning = match staged.solve(&self.oracle, time_limit)? {
            SolveOutcome::Sat => None,
            SolveOutcome::Unsat => {
                info!(clue = %clue, "contradiction");
                return Ok(self.finish(CONTRADICTION.to_string()));
            }
            SolveOutcome::Unknown => {
                warn!(clue = %clue, "solver timed out");
                match self.settings.on_timeout {
                    TimeoutPolicy::Warn => Some(TIMEOUT_WARNING.to_string()),
                    TimeoutPolicy::Abort => return Ok(self.finish(TIMEOUT_WARNING.to_string())),
                }
            }
        };

        // A timed-out solve can hide UNSAT; the probes on the staged store
        // expose it before anything is committed or reported.
        let deduction = deduce::find_known_facts(&staged, &self.oracle, time_limit)?;
        let flips = deduction
            .facts
            .iter()
            .any(|(person, status)| self.known.get(person).is_some_and(|k| k != status));
        if deduction.contradictory || flips {
            info!(clue = %clue, "contradiction found while deducing");
            return Ok(self.finish(CONTRADICTION.to_string()));
        }

        self.store = staged;
        info!(clue = %clue, total = self.store.clues().len(), "clue accepted");

        if !deduction.inconclusive.is_empty() {
            let people: String = deduction.inconclusive.iter().collect();
            warn!(%people, "some probes timed out");
            warning.get_or_insert_with(|| TIMEOUT_WARNING.to_string());
        }

        let facts = deduction.new_facts(&self.known);
        for fact in &facts {
            info!(%fact, "new fact");
            self.known.insert(fact.person, fact.status);
        }

        Ok(Step::Accepted { facts, warning })
    }

    fn finish(&mut self, message: String) -> Step {
        self.finished = Some(message.clone());
        Step::Finished(message)
    }

    /// Everything reported so far, in alphabetical order
    pub fn known_facts(&self) -> impl Iterator<Item = Fact> + '_ {
        self.known
            .iter()
            .map(|(&person, &status)| Fact { person, status })
    }

    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }
}
