//! Convert deterministic finite automata into regular expressions.
//!
//! The conversion is the classical algebraic method: every state of the
//! automaton becomes an unknown in a system of linear language equations,
//! which is solved by repeated application of Arden's Lemma and substitution
//! (see [`eliminate`]). The solved expression is syntactically valid but
//! redundant, so it is passed through a text-level optimizer (see
//! [`optimize`]) that extracts common prefixes and suffixes from
//! disjunctions and merges quantified repetitions.
//!
//! # Examples
//! ```
//! use dfa2regex::{dfa_to_regex, Dfa};
//!
//! // Binary strings in which every run of 1s is terminated by a 0.
//! let mut dfa = Dfa::new("01");
//! let q0 = dfa.new_state();
//! let q1 = dfa.new_state();
//! dfa.set_final(q0).unwrap();
//! dfa.add_transition(q0, 0, q0).unwrap();
//! dfa.add_transition(q0, 1, q1).unwrap();
//! dfa.add_transition(q1, 1, q1).unwrap();
//! dfa.add_transition(q1, 0, q0).unwrap();
//!
//! assert_eq!(dfa_to_regex(&dfa), "(0*1+0)*0*");
//! ```

pub mod automata;
pub mod eliminate;
pub mod optimize;
mod syntax;

pub use automata::{Dfa, DfaError, StateId};
pub use eliminate::EquationSystem;

/// Runs the full conversion pipeline: builds the equation system for `dfa`,
/// solves it, and optimizes the resulting expression.
///
/// The returned expression uses only literals, character classes `[...]`,
/// groups `(...)`, disjunction `|`, and the postfix quantifiers `*`, `+`,
/// and `?`. It matches exactly the words accepted by `dfa` when anchored at
/// both ends.
///
/// The automaton must accept a non-empty language; see
/// [`EquationSystem::solve`].
pub fn dfa_to_regex(dfa: &Dfa) -> String {
    let solved = EquationSystem::new(dfa).solve();
    optimize::optimize(&solved)
}
