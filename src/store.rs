// Constraint store: the conjunction of every accepted clue.

use std::time::Duration;

use tracing::debug;

use crate::clue::Clue;
use crate::encode::{self, Instance, PersonVars};
use crate::oracle::{Oracle, OracleError, SolveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub people: usize,
    pub clues: usize,
    pub variables: usize,
    pub clauses: usize,
}

#[derive(Debug, Clone)]
pub struct ConstraintStore {
    instance: Instance,
    vars: PersonVars,
    clues: Vec<Clue>,
}

impl Default for ConstraintStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintStore {
    pub fn new() -> Self {
        ConstraintStore {
            instance: Instance::new(),
            vars: PersonVars::default(),
            clues: Vec::new(),
        }
    }

    /// Conjoin a clue. Satisfiability is not checked here; callers stage the
    /// clue on a clone and keep the clone only if `solve` says it is not UNSAT.
    pub fn add(&mut self, clue: Clue) {
        let clauses_before = self.instance.n_clauses();
        encode::encode_clue(&mut self.instance, &mut self.vars, &clue);
        debug!(
            clue = %clue,
            new_clauses = self.instance.n_clauses() - clauses_before,
            total_vars = self.instance.n_vars(),
            "encoded clue"
        );
        self.clues.push(clue);
    }

    pub fn solve<O: Oracle>(
        &self,
        oracle: &O,
        time_limit: Duration,
    ) -> Result<SolveOutcome, OracleError> {
        oracle.solve(self.instance.clone().into_cnf().0, time_limit)
    }

    /// Solve `store AND person = innocent` on a throwaway copy.
    /// A person the store has never seen is unconstrained.
    pub fn probe<O: Oracle>(
        &self,
        oracle: &O,
        person: char,
        innocent: bool,
        time_limit: Duration,
    ) -> Result<SolveOutcome, OracleError> {
        let mut instance = self.instance.clone();
        let mut vars = self.vars.clone();
        let lit = vars.literal(&mut instance, person);
        instance.add_unit(if innocent { lit } else { !lit });
        oracle.solve(instance.into_cnf().0, time_limit)
    }

    /// Every person mentioned so far, in alphabetical order
    pub fn people(&self) -> impl Iterator<Item = char> + '_ {
        self.vars.people()
    }

    pub fn clues(&self) -> &[Clue] {
        &self.clues
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            people: self.vars.len(),
            clues: self.clues.len(),
            variables: self.instance.n_vars() as usize,
            clauses: self.instance.n_clauses(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clue::parse_clue;
    use crate::oracle::MinisatOracle;

    const LIMIT: Duration = Duration::from_secs(30);

    fn store_with(clues: &[&str]) -> ConstraintStore {
        let mut store = ConstraintStore::new();
        for text in clues {
            store.add(parse_clue(text).unwrap());
        }
        store
    }

    #[test]
    fn test_empty_store_is_satisfiable() {
        let store = ConstraintStore::new();
        assert_eq!(store.solve(&MinisatOracle, LIMIT).unwrap(), SolveOutcome::Sat);
        assert_eq!(store.people().count(), 0);
    }

    #[test]
    fn test_people_registered_from_both_sides() {
        let store = store_with(&["ab>cd", "e is odd"]);
        let people: String = store.people().collect();
        assert_eq!(people, "abcde");
        assert_eq!(store.clues().len(), 2);
    }

    #[test]
    fn test_contradiction() {
        let store = store_with(&["a=1", "a=0"]);
        assert_eq!(store.solve(&MinisatOracle, LIMIT).unwrap(), SolveOutcome::Unsat);
    }

    #[test]
    fn test_probe_does_not_mutate_store() {
        let store = store_with(&["ab=1"]);
        let before = store.stats();

        assert_eq!(
            store.probe(&MinisatOracle, 'a', true, LIMIT).unwrap(),
            SolveOutcome::Sat
        );
        assert_eq!(
            store.probe(&MinisatOracle, 'a', false, LIMIT).unwrap(),
            SolveOutcome::Sat
        );
        // Probing an unseen person must not register it either
        assert_eq!(
            store.probe(&MinisatOracle, 'z', true, LIMIT).unwrap(),
            SolveOutcome::Sat
        );

        assert_eq!(store.stats(), before);
        assert_eq!(store.solve(&MinisatOracle, LIMIT).unwrap(), SolveOutcome::Sat);
    }

    #[test]
    fn test_probe_detects_forced_value() {
        let store = store_with(&["a=1"]);
        assert_eq!(
            store.probe(&MinisatOracle, 'a', false, LIMIT).unwrap(),
            SolveOutcome::Unsat
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let store = store_with(&["a=1"]);
        let mut staged = store.clone();
        staged.add(parse_clue("a=0").unwrap());

        assert_eq!(staged.solve(&MinisatOracle, LIMIT).unwrap(), SolveOutcome::Unsat);
        assert_eq!(store.solve(&MinisatOracle, LIMIT).unwrap(), SolveOutcome::Sat);
        assert_eq!(store.clues().len(), 1);
    }
}
