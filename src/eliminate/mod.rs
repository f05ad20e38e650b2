//! The equation-system solver.
//!
//! Every state of a [`Dfa`] becomes one unknown in a system of linear
//! language equations: the equation of state `q` says that the language
//! accepted from `q` is the union over all transitions `q --c--> p` of
//! `c · L(p)`, plus the empty word if `q` is accepting. Each such
//! contribution is a term: a literal prefix, optionally followed by a
//! reference to an unknown.
//!
//! The system is solved by eliminating unknowns in descending id order.
//! Self-references are removed with Arden's Lemma
//! (`X = AX + B  implies  X = A*B`), after which the eliminated equation is
//! substituted into all lower equations. Once every unknown except 0 is
//! eliminated, equation 0 collapses to a single closed regex fragment.

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use smallvec::SmallVec;

use crate::automata::{Dfa, StateId};
use crate::syntax::is_atomic;

/// One contribution to an equation: a regex prefix, optionally followed by
/// a reference to an unknown. A term without a reference marks a path that
/// accepts; the empty, reference-free term is "accept here, consume
/// nothing".
#[derive(Debug, Clone, Eq, PartialEq)]
struct Term {
    prefix: String,
    reference: Option<StateId>,
}

type Terms = SmallVec<[Term; 4]>;

/// The defining equation of one unknown, as a disjunction of terms.
///
/// Stable equations satisfy the *single-term invariant*: at most one term
/// per distinct reference value (including the reference-free acceptance
/// term). [`Equation::substitute`] deliberately violates the invariant and
/// flags the equation as pending; [`Equation::merge_terms`] restores it.
/// Every operation that relies on the invariant asserts the flag is clear.
#[derive(Debug, Clone)]
pub struct Equation {
    id: StateId,
    terms: Terms,
    pending_merge: bool,
}

impl Equation {
    /// Creates the equation of a state from its outgoing transitions.
    /// Multiple symbols leading to the same successor are combined into a
    /// single term by the initial merge.
    pub fn from_state(id: StateId, dfa: &Dfa) -> Self {
        let mut terms = Terms::new();
        for (symbol, &c) in dfa.alphabet().iter().enumerate() {
            if let Some(target) = dfa.transition(id, symbol) {
                terms.push(Term {
                    prefix: c.to_string(),
                    reference: Some(target),
                });
            }
        }
        if dfa.is_final(id) {
            terms.push(Term {
                prefix: String::new(),
                reference: None,
            });
        }

        let mut eq = Self {
            id,
            terms,
            pending_merge: true,
        };
        eq.merge_terms();
        eq
    }

    /// Applies Arden's Lemma to this equation.
    ///
    /// Arden's Lemma states that for regular languages A, B with B not
    /// containing the empty word: `X = AX + B  implies  X = A*B`. If the
    /// equation holds no term referencing its own unknown, the precondition
    /// is unmet and this is a no-op.
    ///
    /// The single-term invariant is preserved: no two terms change which
    /// unknown they reference.
    pub fn apply_ardens_lemma(&mut self) {
        debug_assert!(!self.pending_merge, "equation {} is pending a merge", self.id);

        let recursive = match self.terms.iter().position(|t| t.reference == Some(self.id)) {
            Some(pos) => self.terms.remove(pos),
            None => return,
        };

        // Transform the recursive prefix A into A* (grouping if necessary)
        // and distribute it over the remaining terms.
        let mut star = if is_atomic(&recursive.prefix) {
            recursive.prefix
        } else {
            format!("({})", recursive.prefix)
        };
        star.push('*');

        for t in self.terms.iter_mut() {
            t.prefix = format!("{}{}", star, t.prefix);
        }
    }

    /// Substitutes the right-hand side of `other` for the reference to
    /// `other`'s unknown in this equation, distributing the referencing
    /// term's prefix over all of `other`'s terms. A no-op if this equation
    /// does not reference `other`.
    ///
    /// This WILL violate the single-term invariant whenever this equation
    /// already holds a term for a reference that also occurs in `other`;
    /// the caller must restore it with [`Equation::merge_terms`] before the
    /// invariant is relied upon again.
    pub fn substitute(&mut self, other: &Equation) {
        debug_assert!(!self.pending_merge, "equation {} is pending a merge", self.id);
        debug_assert!(
            !other.pending_merge,
            "substituted equation {} is pending a merge",
            other.id
        );

        let target = match self.terms.iter().position(|t| t.reference == Some(other.id)) {
            Some(pos) => self.terms.remove(pos),
            None => return,
        };

        // The prefix is already grouped where the expression requires it.
        for t in &other.terms {
            self.terms.push(Term {
                prefix: format!("{}{}", target.prefix, t.prefix),
                reference: t.reference,
            });
        }
        self.pending_merge = true;
    }

    /// Merges all terms with the same reference value, restoring the
    /// single-term invariant.
    ///
    /// A group of single-character prefixes becomes a character class
    /// `[abc]`; any other group becomes a parenthesized disjunction
    /// `(a|b|c)`. Duplicate prefixes within a group collapse.
    pub fn merge_terms(&mut self) {
        let mut groups: IndexMap<Option<StateId>, IndexSet<String>> = IndexMap::new();
        for t in self.terms.drain(..) {
            groups.entry(t.reference).or_default().insert(t.prefix);
        }

        for (reference, prefixes) in groups {
            let prefix = if prefixes.len() == 1 {
                prefixes.into_iter().next().unwrap()
            } else if prefixes.iter().all(|p| p.chars().count() == 1) {
                format!("[{}]", prefixes.iter().join(""))
            } else {
                format!("({})", prefixes.iter().join("|"))
            };
            self.terms.push(Term { prefix, reference });
        }
        self.pending_merge = false;
    }

    /// Converts a fully solved equation into its regular expression.
    ///
    /// Panics if any unknown remains; that indicates a bug in the
    /// elimination order, never a property of the input.
    pub fn to_expression(self) -> String {
        debug_assert!(!self.pending_merge, "equation {} is pending a merge", self.id);
        assert!(
            self.terms.len() == 1 && self.terms[0].reference.is_none(),
            "unknowns left in equation {} after elimination",
            self.id
        );
        self.terms.into_iter().next().unwrap().prefix
    }

    /// The unknown this equation defines.
    pub fn id(&self) -> StateId {
        self.id
    }
}

/// A system of language equations, one per automaton state.
///
/// Created once from a [`Dfa`] snapshot and consumed by [`solve`]; the
/// elimination is destructive, so a system is not reusable.
///
/// [`solve`]: EquationSystem::solve
#[derive(Debug)]
pub struct EquationSystem {
    equations: Vec<Equation>,
}

impl EquationSystem {
    /// Builds the equation system of the automaton, one equation per state.
    pub fn new(dfa: &Dfa) -> Self {
        let equations = (0..dfa.num_states())
            .map(|id| Equation::from_state(id, dfa))
            .collect();
        Self { equations }
    }

    /// Solves the system for unknown 0, the initial state of the automaton.
    ///
    /// Unknowns are eliminated in descending id order. In every round,
    /// Arden's Lemma first clears self-references from all equations that
    /// are still relevant (including the one being eliminated, which may
    /// have become self-referencing through earlier substitutions); the
    /// eliminated equation is then substituted into all lower equations and
    /// their invariants restored. No equation with a higher id can
    /// reference the eliminated unknown at that point, because higher ids
    /// were fully eliminated in earlier rounds.
    ///
    /// Panics if the automaton accepts the empty language; callers must
    /// supply a non-degenerate automaton.
    pub fn solve(mut self) -> String {
        for eliminate in (0..self.equations.len()).rev() {
            for eq in &mut self.equations[..=eliminate] {
                eq.apply_ardens_lemma();
            }

            let (lower, rest) = self.equations.split_at_mut(eliminate);
            let value = &rest[0];
            // Substitution targets by id; the vector must still be in
            // construction order for the index to name the right unknown.
            debug_assert_eq!(value.id(), eliminate);
            for eq in lower.iter_mut() {
                eq.substitute(value);
            }
            for eq in lower.iter_mut() {
                eq.merge_terms();
            }
        }

        // Equation 0 was never a substitution target in its own round.
        let mut result = self
            .equations
            .into_iter()
            .next()
            .expect("equation system without equations");
        result.merge_terms();
        result.to_expression()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even_ones() -> Dfa {
        let mut dfa = Dfa::new("01");
        let q0 = dfa.new_state();
        let q1 = dfa.new_state();
        dfa.set_final(q0).unwrap();
        dfa.add_transition(q0, 0, q0).unwrap();
        dfa.add_transition(q0, 1, q1).unwrap();
        dfa.add_transition(q1, 1, q1).unwrap();
        dfa.add_transition(q1, 0, q0).unwrap();
        dfa
    }

    fn references(eq: &Equation) -> Vec<Option<StateId>> {
        eq.terms.iter().map(|t| t.reference).collect()
    }

    #[test]
    fn test_construction_merges_parallel_transitions() {
        // Both symbols lead to the same state; construction must combine
        // them into a character class.
        let mut dfa = Dfa::new("ab");
        let q0 = dfa.new_state();
        dfa.set_final(q0).unwrap();
        dfa.add_transition(q0, 0, q0).unwrap();
        dfa.add_transition(q0, 1, q0).unwrap();

        let eq = Equation::from_state(q0, &dfa);
        assert_eq!(eq.id(), q0);
        assert_eq!(eq.terms.len(), 2);
        assert_eq!(eq.terms[0].prefix, "[ab]");
        assert_eq!(eq.terms[0].reference, Some(q0));
        assert_eq!(eq.terms[1].prefix, "");
        assert_eq!(eq.terms[1].reference, None);
    }

    #[test]
    fn test_merge_restores_single_term_invariant() {
        let dfa = even_ones();
        let mut eq0 = Equation::from_state(0, &dfa);
        let eq1 = Equation::from_state(1, &dfa);

        // Substituting equation 1 into equation 0 introduces a second term
        // referencing state 0; the merge has to fold it away.
        eq0.substitute(&eq1);
        assert!(eq0.pending_merge);
        eq0.merge_terms();

        let refs = references(&eq0);
        let distinct: IndexSet<_> = refs.iter().copied().collect();
        assert_eq!(refs.len(), distinct.len());
    }

    #[test]
    fn test_arden_removes_self_reference() {
        let dfa = even_ones();
        let mut eq = Equation::from_state(0, &dfa);
        assert!(references(&eq).contains(&Some(0)));

        eq.apply_ardens_lemma();
        assert!(!references(&eq).contains(&Some(0)));
        // 0X0 + 1X1 + e  becomes  0*1X1 + 0*
        assert_eq!(eq.terms[0].prefix, "0*1");
        assert_eq!(eq.terms[0].reference, Some(1));
        assert_eq!(eq.terms[1].prefix, "0*");
        assert_eq!(eq.terms[1].reference, None);
    }

    #[test]
    fn test_arden_is_noop_without_self_reference() {
        let dfa = even_ones();
        let mut eq = Equation::from_state(0, &dfa);
        eq.apply_ardens_lemma();
        let before = eq.terms.clone();
        eq.apply_ardens_lemma();
        assert_eq!(before, eq.terms);
    }

    #[test]
    fn test_arden_groups_non_atomic_prefixes() {
        let mut eq = Equation {
            id: 3,
            terms: Terms::new(),
            pending_merge: false,
        };
        eq.terms.push(Term {
            prefix: "ab".to_string(),
            reference: Some(3),
        });
        eq.terms.push(Term {
            prefix: "c".to_string(),
            reference: None,
        });

        eq.apply_ardens_lemma();
        assert_eq!(eq.terms[0].prefix, "(ab)*c");
    }

    #[test]
    fn test_substitute_distributes_prefix() {
        let dfa = even_ones();
        let mut eq0 = Equation::from_state(0, &dfa);
        let mut eq1 = Equation::from_state(1, &dfa);
        eq1.apply_ardens_lemma(); // X1 = 1*0X0
        eq0.apply_ardens_lemma(); // X0 = 0*1X1 + 0*

        eq0.substitute(&eq1);
        eq0.merge_terms();

        assert_eq!(eq0.terms.len(), 2);
        assert_eq!(eq0.terms[0].prefix, "0*");
        assert_eq!(eq0.terms[0].reference, None);
        assert_eq!(eq0.terms[1].prefix, "0*11*0");
        assert_eq!(eq0.terms[1].reference, Some(0));
    }

    #[test]
    fn test_substitute_without_reference_is_noop() {
        let dfa = even_ones();
        let mut eq1 = Equation::from_state(1, &dfa);
        eq1.apply_ardens_lemma();
        // eq1 references only state 0 now; substituting an equation for an
        // unrelated unknown changes nothing.
        let unrelated = Equation {
            id: 7,
            terms: Terms::new(),
            pending_merge: false,
        };
        let before = eq1.terms.clone();
        eq1.substitute(&unrelated);
        assert_eq!(before, eq1.terms);
        assert!(!eq1.pending_merge);
    }

    #[test]
    fn test_solve_even_ones() {
        let system = EquationSystem::new(&even_ones());
        assert_eq!(system.solve(), "(0*11*0)*0*");
    }

    #[test]
    fn test_solve_single_state() {
        let mut dfa = Dfa::new("ab");
        let q0 = dfa.new_state();
        dfa.set_final(q0).unwrap();
        dfa.add_transition(q0, 0, q0).unwrap();
        dfa.add_transition(q0, 1, q0).unwrap();

        assert_eq!(EquationSystem::new(&dfa).solve(), "[ab]*");
    }

    #[test]
    fn test_solve_dead_state_contributes_nothing() {
        // State 1 can never reach acceptance; its paths must vanish from
        // the solution instead of polluting it.
        let mut dfa = Dfa::new("ab");
        let q0 = dfa.new_state();
        let q1 = dfa.new_state();
        dfa.set_final(q0).unwrap();
        dfa.add_transition(q0, 0, q0).unwrap();
        dfa.add_transition(q0, 1, q1).unwrap();
        dfa.add_transition(q1, 0, q1).unwrap();
        dfa.add_transition(q1, 1, q1).unwrap();

        assert_eq!(EquationSystem::new(&dfa).solve(), "a*");
    }

    #[test]
    #[should_panic(expected = "unknowns left")]
    fn test_to_expression_rejects_leftover_unknowns() {
        let dfa = even_ones();
        let eq = Equation::from_state(0, &dfa);
        eq.to_expression();
    }
}
