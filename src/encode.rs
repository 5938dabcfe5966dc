// CNF lowering of clues onto a rustsat instance.
//
// Intermediate results are `Bound`s: either a literal or a constant that was
// folded away. Constants never reach the instance, so e.g. `ab <= 7` adds no
// clauses and `a > 5` adds a contradiction.

use std::collections::BTreeMap;

use rustsat::instances::{BasicVarManager, SatInstance};
use rustsat::types::Lit;

use crate::clue::{Clue, CompareOp, Group, Operand};
use crate::lexer::Polarity;

pub type Instance = SatInstance<BasicVarManager>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Const(bool),
    Lit(Lit),
}

impl std::ops::Not for Bound {
    type Output = Bound;

    fn not(self) -> Bound {
        match self {
            Bound::Const(b) => Bound::Const(!b),
            Bound::Lit(lit) => Bound::Lit(!lit),
        }
    }
}

/// Person -> literal map; literals are created on first mention
#[derive(Debug, Clone, Default)]
pub struct PersonVars {
    lits: BTreeMap<char, Lit>,
}

impl PersonVars {
    pub fn literal(&mut self, instance: &mut Instance, person: char) -> Lit {
        *self
            .lits
            .entry(person)
            .or_insert_with(|| instance.new_lit())
    }

    #[cfg(test)]
    pub fn get(&self, person: char) -> Option<Lit> {
        self.lits.get(&person).copied()
    }

    pub fn people(&self) -> impl Iterator<Item = char> + '_ {
        self.lits.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }
}

fn add_contradiction(instance: &mut Instance) {
    let false_lit = instance.new_lit();
    instance.add_unit(false_lit);
    instance.add_unit(!false_lit);
}

/// Assert the disjunction of `bounds`
pub fn assert_clause(instance: &mut Instance, bounds: &[Bound]) {
    let mut lits = Vec::with_capacity(bounds.len());
    for bound in bounds {
        match bound {
            Bound::Const(true) => return,
            Bound::Const(false) => {}
            Bound::Lit(lit) => lits.push(*lit),
        }
    }

    if lits.is_empty() {
        add_contradiction(instance);
    } else {
        instance.add_clause(lits.into_iter().collect());
    }
}

pub fn assert_bound(instance: &mut Instance, bound: Bound) {
    assert_clause(instance, &[bound]);
}

// z <=> a AND b
pub fn encode_and(instance: &mut Instance, a: Bound, b: Bound) -> Bound {
    match (a, b) {
        (Bound::Const(false), _) | (_, Bound::Const(false)) => Bound::Const(false),
        (Bound::Const(true), other) | (other, Bound::Const(true)) => other,
        (Bound::Lit(x), Bound::Lit(y)) => {
            if x == y {
                return Bound::Lit(x);
            }
            if x == !y {
                return Bound::Const(false);
            }
            let z = instance.new_lit();
            instance.add_binary(!z, x);
            instance.add_binary(!z, y);
            instance.add_clause(vec![z, !x, !y].into_iter().collect());
            Bound::Lit(z)
        }
    }
}

// z <=> a OR b
pub fn encode_or(instance: &mut Instance, a: Bound, b: Bound) -> Bound {
    !encode_and(instance, !a, !b)
}

// z <=> a XOR b
pub fn encode_xor(instance: &mut Instance, a: Bound, b: Bound) -> Bound {
    match (a, b) {
        (Bound::Const(c), other) | (other, Bound::Const(c)) => {
            if c {
                !other
            } else {
                other
            }
        }
        (Bound::Lit(x), Bound::Lit(y)) => {
            if x == y {
                return Bound::Const(false);
            }
            if x == !y {
                return Bound::Const(true);
            }
            let z = instance.new_lit();
            instance.add_clause(vec![!z, x, y].into_iter().collect());
            instance.add_clause(vec![!z, !x, !y].into_iter().collect());
            instance.add_clause(vec![z, !x, y].into_iter().collect());
            instance.add_clause(vec![z, x, !y].into_iter().collect());
            Bound::Lit(z)
        }
    }
}

/// Sequential unary counter over `inputs`.
///
/// Output `k` is equivalent to "at least k+1 inputs are true". Inputs may
/// repeat; each occurrence counts separately.
pub fn encode_unary_counter(instance: &mut Instance, inputs: &[Bound]) -> Vec<Bound> {
    let mut counts: Vec<Bound> = Vec::with_capacity(inputs.len());

    for &input in inputs {
        let mut next = Vec::with_capacity(counts.len() + 1);
        for k in 0..=counts.len() {
            // at least k+1 after this input:
            //   already k+1 before it, or exactly k before it and this one is true
            let already = counts.get(k).copied().unwrap_or(Bound::Const(false));
            let below = if k == 0 {
                Bound::Const(true)
            } else {
                counts[k - 1]
            };
            let stepped = encode_and(instance, below, input);
            next.push(encode_or(instance, already, stepped));
        }
        counts = next;
    }

    counts
}

/// "At least k inputs are true", read off a unary counter
pub fn at_least(counts: &[Bound], k: i64) -> Bound {
    if k <= 0 {
        return Bound::Const(true);
    }
    usize::try_from(k - 1)
        .ok()
        .and_then(|index| counts.get(index).copied())
        .unwrap_or(Bound::Const(false))
}

/// Assert `count(inputs) OP k`
pub fn encode_count_comparison(instance: &mut Instance, inputs: &[Bound], op: CompareOp, k: i64) {
    let n = inputs.len() as i64;
    let folded = |t: i64| {
        if t <= 0 {
            Some(Bound::Const(true))
        } else if t > n {
            Some(Bound::Const(false))
        } else {
            None
        }
    };

    // Thresholds outside 0..=n need no counter
    let (ge, gt) = match (folded(k), folded(k + 1)) {
        (Some(ge), Some(gt)) => (ge, gt),
        _ => {
            let counts = encode_unary_counter(instance, inputs);
            (at_least(&counts, k), at_least(&counts, k + 1))
        }
    };

    match op {
        CompareOp::Ge => assert_bound(instance, ge),
        CompareOp::Gt => assert_bound(instance, gt),
        CompareOp::Le => assert_bound(instance, !gt),
        CompareOp::Lt => assert_bound(instance, !ge),
        CompareOp::Eq => {
            assert_bound(instance, ge);
            assert_bound(instance, !gt);
        }
        CompareOp::Ne => assert_clause(instance, &[!ge, gt]),
    }
}

/// Polarity-adjusted literal for each person of the group, in order
fn group_bounds(instance: &mut Instance, vars: &mut PersonVars, group: &Group) -> Vec<Bound> {
    group
        .people
        .iter()
        .map(|&person| {
            let lit = vars.literal(instance, person);
            match group.polarity {
                Polarity::Innocent => Bound::Lit(lit),
                Polarity::Criminal => Bound::Lit(!lit),
            }
        })
        .collect()
}

// No interior position may be off while something on both sides is on
fn encode_connected(instance: &mut Instance, members: &[Bound]) {
    let n = members.len();
    if n < 3 {
        return;
    }

    let mut prefix = Vec::with_capacity(n);
    let mut acc = Bound::Const(false);
    for &m in members {
        acc = encode_or(instance, acc, m);
        prefix.push(acc);
    }

    let mut suffix = vec![Bound::Const(false); n];
    let mut acc = Bound::Const(false);
    for i in (0..n).rev() {
        acc = encode_or(instance, acc, members[i]);
        suffix[i] = acc;
    }

    for i in 1..n - 1 {
        assert_clause(instance, &[!prefix[i - 1], members[i], !suffix[i + 1]]);
    }
}

fn encode_parity(instance: &mut Instance, members: &[Bound], odd: bool) {
    let mut acc = Bound::Const(false);
    for &m in members {
        acc = encode_xor(instance, acc, m);
    }
    assert_bound(instance, if odd { acc } else { !acc });
}

/// Lower one clue, registering any people it mentions
pub fn encode_clue(instance: &mut Instance, vars: &mut PersonVars, clue: &Clue) {
    match clue {
        Clue::Compare { left, op, right } => {
            let mut inputs = group_bounds(instance, vars, left);
            let threshold = match right {
                Operand::Count(n) => i64::from(*n),
                Operand::Group(group) => {
                    // sum(L) OP sum(R)  <=>  sum(L) + sum(!R) OP |R|
                    let rhs = group_bounds(instance, vars, group);
                    let size = rhs.len() as i64;
                    inputs.extend(rhs.into_iter().map(|b| !b));
                    size
                }
            };
            encode_count_comparison(instance, &inputs, *op, threshold);
        }
        Clue::Connected { group } => {
            let members = group_bounds(instance, vars, group);
            encode_connected(instance, &members);
        }
        Clue::Parity { group, odd } => {
            let members = group_bounds(instance, vars, group);
            encode_parity(instance, &members, *odd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clue::parse_clue;
    use rustsat::solvers::{Solve, SolverResult};
    use std::collections::HashMap;

    fn solve(instance: Instance) -> SolverResult {
        let mut solver = rustsat_minisat::core::Minisat::default();
        solver.add_cnf(instance.into_cnf().0).unwrap();
        solver.solve().unwrap()
    }

    // For every assignment of the clue's people, the encoding must be
    // satisfiable exactly when the clue holds.
    fn check_against_truth_table(text: &str) {
        let clue = parse_clue(text).unwrap();
        let people: Vec<char> = clue.people().into_iter().collect();

        let mut instance = Instance::new();
        let mut vars = PersonVars::default();
        encode_clue(&mut instance, &mut vars, &clue);

        for mask in 0u32..(1 << people.len()) {
            let assignment: HashMap<char, bool> = people
                .iter()
                .enumerate()
                .map(|(i, &p)| (p, mask & (1 << i) != 0))
                .collect();

            let mut fixed = instance.clone();
            for (&person, &innocent) in &assignment {
                let lit = vars.get(person).unwrap();
                fixed.add_unit(if innocent { lit } else { !lit });
            }

            let expected = if clue.holds(&assignment) {
                SolverResult::Sat
            } else {
                SolverResult::Unsat
            };
            assert_eq!(
                solve(fixed),
                expected,
                "clue '{}' under {:?}",
                text,
                assignment
            );
        }
    }

    #[test]
    fn test_constant_comparisons() {
        for text in [
            "a=1", "b=0", "cd=1", "abc>=2", "abc>1", "abcd<=1", "abcd<3", "abc!=1", "abc!=0",
        ] {
            check_against_truth_table(text);
        }
    }

    #[test]
    fn test_criminal_polarity() {
        for text in ["~ab=1", "~abc<2", "~abc!=3"] {
            check_against_truth_table(text);
        }
    }

    #[test]
    fn test_group_comparisons() {
        for text in ["ijk>lm", "pq<=rs", "tuv>w", "ab=~cd", "~ab>=c", "ab!=cd"] {
            check_against_truth_table(text);
        }
    }

    #[test]
    fn test_repeated_letters() {
        // Overlapping and repeated letters count with multiplicity
        for text in ["aab=2", "ab>bc", "ab>ba", "ab=ba"] {
            check_against_truth_table(text);
        }
    }

    #[test]
    fn test_thresholds_out_of_range() {
        for text in ["a>5", "ab<=7", "ab<0", "ab>=0", "ab=3"] {
            check_against_truth_table(text);
        }
    }

    #[test]
    fn test_connected() {
        for text in [
            "ab is connected",
            "abc is connected",
            "abcde is connected",
            "~abcd is connected",
        ] {
            check_against_truth_table(text);
        }
    }

    #[test]
    fn test_parity() {
        for text in ["a is odd", "abcd is odd", "abc is even", "~abcd is odd", "aab is even"] {
            check_against_truth_table(text);
        }
    }

    #[test]
    fn test_trivially_true_comparison_adds_no_clauses() {
        let mut instance = Instance::new();
        let mut vars = PersonVars::default();
        encode_clue(&mut instance, &mut vars, &parse_clue("ab<=7").unwrap());
        assert_eq!(instance.n_clauses(), 0);
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_unary_counter_outputs() {
        let mut instance = Instance::new();
        let a = instance.new_lit();
        let counts = encode_unary_counter(
            &mut instance,
            &[Bound::Lit(a), Bound::Const(true), Bound::Const(false)],
        );
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0], Bound::Const(true));
        assert_eq!(counts[1], Bound::Lit(a));
        assert_eq!(counts[2], Bound::Const(false));
        assert_eq!(at_least(&counts, 0), Bound::Const(true));
        assert_eq!(at_least(&counts, 4), Bound::Const(false));
    }
}
