// Forced-fact scan: a person is forced when one of their two values makes the
// store unsatisfiable.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::oracle::{Oracle, OracleError, SolveOutcome};
use crate::store::ConstraintStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Criminal,
    Innocent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fact {
    pub person: char,
    pub status: Status,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.person.to_ascii_uppercase();
        match self.status {
            Status::Criminal => write!(f, "{} is a criminal.", name),
            Status::Innocent => write!(f, "{} is innocent.", name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduction {
    /// Every person whose status is the same in all models of the store
    pub facts: BTreeMap<char, Status>,
    /// People for whom a probe ran out of time without certifying anything
    pub inconclusive: Vec<char>,
    /// Some person has no admissible value at all: the store is UNSAT
    pub contradictory: bool,
}

impl Deduction {
    /// Facts not already present in `known`, in alphabetical order
    pub fn new_facts(&self, known: &BTreeMap<char, Status>) -> Vec<Fact> {
        self.facts
            .iter()
            .filter(|(person, status)| known.get(*person) != Some(*status))
            .map(|(&person, &status)| Fact { person, status })
            .collect()
    }
}

/// Probe every person in the store.
///
/// `store AND innocent` UNSAT means criminal; otherwise `store AND criminal`
/// UNSAT means innocent. UNKNOWN never certifies anything. Both probes UNSAT
/// for the same person means the store itself is unsatisfiable; the scan
/// stops there with `contradictory` set.
pub fn find_known_facts<O: Oracle>(
    store: &ConstraintStore,
    oracle: &O,
    time_limit: Duration,
) -> Result<Deduction, OracleError> {
    let mut deduction = Deduction::default();

    for person in store.people() {
        let if_innocent = store.probe(oracle, person, true, time_limit)?;
        let if_criminal = store.probe(oracle, person, false, time_limit)?;

        if if_innocent == SolveOutcome::Unsat && if_criminal == SolveOutcome::Unsat {
            warn!(%person, "no admissible value");
            deduction.contradictory = true;
            return Ok(deduction);
        }

        if if_innocent == SolveOutcome::Unsat {
            debug!(%person, "forced criminal");
            deduction.facts.insert(person, Status::Criminal);
            continue;
        }

        if if_criminal == SolveOutcome::Unsat {
            debug!(%person, "forced innocent");
            deduction.facts.insert(person, Status::Innocent);
            continue;
        }

        if if_innocent == SolveOutcome::Unknown || if_criminal == SolveOutcome::Unknown {
            warn!(%person, "probe timed out");
            deduction.inconclusive.push(person);
        }
    }

    Ok(deduction)
}
