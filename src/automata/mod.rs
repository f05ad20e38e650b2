//! Deterministic finite automata.
//!
//! The automaton model here is deliberately minimal: the solver in
//! [`crate::eliminate`] only needs to *read* transitions, so a [`Dfa`] is a
//! fixed-alphabet container of states, each with one successor slot per
//! alphabet symbol and an accepting flag. State 0 is always the initial
//! state and is the solve target of the equation system.

#[cfg(feature = "dot")]
mod dot;

use std::error::Error;
use std::fmt::Display;

use quickcheck::Arbitrary;

/// Every state in an automaton is identified by a unique index.
pub type StateId = usize;

/// The digit alphabet used by [`Dfa::divisibility`], covering bases up to 36.
pub const DIGITS: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors raised when an automaton is referenced with invalid indices.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DfaError {
    /// The given state index does not exist in the automaton.
    StateNotFound(StateId),
    /// The given symbol index is outside the automaton's alphabet.
    SymbolOutOfRange(usize),
}

impl Display for DfaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DfaError::StateNotFound(q) => write!(f, "State not found: {}", q),
            DfaError::SymbolOutOfRange(s) => write!(f, "Symbol index out of range: {}", s),
        }
    }
}

impl Error for DfaError {}

/// A state of a deterministic finite automaton.
/// The successor table is indexed by symbol position in the automaton's
/// alphabet; an empty slot means the state has no transition for that symbol.
#[derive(Debug, Clone)]
struct State {
    successors: Vec<Option<StateId>>,
    accepting: bool,
}

impl State {
    fn new(num_symbols: usize) -> Self {
        Self {
            successors: vec![None; num_symbols],
            accepting: false,
        }
    }

    fn is_complete(&self) -> bool {
        self.successors.iter().all(Option::is_some)
    }
}

/// A deterministic finite automaton over a fixed alphabet.
///
/// The alphabet is supplied at construction time and determines the width of
/// every state's transition table: symbol `i` of the alphabet labels column
/// `i` of the table. State 0 is the initial state.
#[derive(Debug, Clone)]
pub struct Dfa {
    alphabet: Vec<char>,
    states: Vec<State>,
}

impl Dfa {
    /// Create a new automaton without states over the given alphabet.
    pub fn new(alphabet: &str) -> Self {
        Self {
            alphabet: alphabet.chars().collect(),
            states: Vec::new(),
        }
    }

    /// Builds the remainder automaton recognizing the `base`-ary
    /// representations of the natural numbers divisible by `divisor`.
    ///
    /// State `r` encodes "the digits read so far leave remainder `r`", so
    /// the automaton has `divisor` states and state 0 is accepting. The
    /// alphabet is [`DIGITS`] truncated to `base` symbols.
    ///
    /// Panics if `base` is not in `2..=36` or `divisor` is zero.
    pub fn divisibility(base: u32, divisor: u32) -> Self {
        assert!((2..=36).contains(&base), "base must be in 2..=36: {}", base);
        assert!(divisor >= 1, "divisor must be positive");

        let alphabet: String = DIGITS.chars().take(base as usize).collect();
        let mut dfa = Dfa::new(&alphabet);
        for _ in 0..divisor {
            dfa.new_state();
        }
        dfa.set_final(0).unwrap();
        for r in 0..divisor {
            for d in 0..base {
                let to = ((r * base + d) % divisor) as usize;
                dfa.add_transition(r as usize, d as usize, to).unwrap();
            }
        }
        dfa
    }

    /// Add a new state to the automaton and return its index.
    pub fn new_state(&mut self) -> StateId {
        let id = self.states.len();
        self.states.push(State::new(self.alphabet.len()));
        id
    }

    /// Mark a state as accepting.
    /// The index must be a valid state index, otherwise an error is returned.
    pub fn set_final(&mut self, state: StateId) -> Result<(), DfaError> {
        match self.states.get_mut(state) {
            Some(s) => {
                s.accepting = true;
                Ok(())
            }
            None => Err(DfaError::StateNotFound(state)),
        }
    }

    /// Returns if a state is accepting.
    /// Invalid indices are not considered accepting.
    pub fn is_final(&self, state: StateId) -> bool {
        self.states.get(state).is_some_and(|s| s.accepting)
    }

    /// Add a transition from one state to another for the symbol at the
    /// given alphabet position.
    ///
    /// The state and symbol indices must be valid, otherwise an error is
    /// returned. Panics if the state already has a transition for the
    /// symbol; overriding a transition would leave the automaton with an
    /// ambiguous successor table.
    pub fn add_transition(
        &mut self,
        from: StateId,
        symbol: usize,
        to: StateId,
    ) -> Result<(), DfaError> {
        if to >= self.states.len() {
            return Err(DfaError::StateNotFound(to));
        }
        if symbol >= self.alphabet.len() {
            return Err(DfaError::SymbolOutOfRange(symbol));
        }
        match self.states.get_mut(from) {
            Some(s) => {
                assert!(
                    s.successors[symbol].is_none(),
                    "cannot override transition from {} for symbol {}",
                    from,
                    symbol
                );
                s.successors[symbol] = Some(to);
                Ok(())
            }
            None => Err(DfaError::StateNotFound(from)),
        }
    }

    /// Returns the successor of a state for the symbol at the given
    /// alphabet position, if the transition exists.
    pub fn transition(&self, state: StateId, symbol: usize) -> Option<StateId> {
        self.states.get(state)?.successors.get(symbol).copied()?
    }

    /// Returns the number of states in the automaton.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Returns the number of symbols in the alphabet.
    pub fn num_symbols(&self) -> usize {
        self.alphabet.len()
    }

    /// Returns the alphabet of the automaton.
    /// Symbol `i` labels column `i` of every transition table.
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Returns the position of a character in the alphabet, if present.
    pub fn symbol_index(&self, c: char) -> Option<usize> {
        self.alphabet.iter().position(|&s| s == c)
    }

    /// Checks whether the automaton is complete, i.e. every state has a
    /// transition for every symbol of the alphabet.
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(State::is_complete)
    }

    /// Runs the automaton on the given word, starting from state 0.
    /// Returns the state the run ends in, or `None` if the run gets stuck
    /// on a missing transition or a character outside the alphabet.
    pub fn run(&self, word: &str) -> Option<StateId> {
        let mut current = 0;
        if self.states.is_empty() {
            return None;
        }
        for c in word.chars() {
            let symbol = self.symbol_index(c)?;
            current = self.transition(current, symbol)?;
        }
        Some(current)
    }

    /// Returns if the automaton accepts the given word.
    pub fn accepts(&self, word: &str) -> bool {
        self.run(word).is_some_and(|q| self.is_final(q))
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DFA {{")?;
        writeln!(f, "\tAlphabet: {:?}", self.alphabet.iter().collect::<String>())?;
        writeln!(f, "\tStates:")?;
        for (i, state) in self.states.iter().enumerate() {
            write!(f, "\t\t{}{}: ", i, if state.accepting { " (F)" } else { "" })?;
            for (s, succ) in state.successors.iter().enumerate() {
                if let Some(succ) = succ {
                    write!(f, "{} -> {}, ", self.alphabet[s], succ)?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "}}")
    }
}

/// Random complete automata over the alphabet `ab` with 1 to 4 states.
/// State 0 is always accepting, so the accepted language is never empty and
/// the automaton satisfies the preconditions of the equation solver.
impl Arbitrary for Dfa {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let n = usize::arbitrary(g) % 4 + 1;
        let mut dfa = Dfa::new("ab");
        for _ in 0..n {
            dfa.new_state();
        }
        dfa.set_final(0).unwrap();
        for q in 1..n {
            if bool::arbitrary(g) {
                dfa.set_final(q).unwrap();
            }
        }
        for q in 0..n {
            for symbol in 0..2 {
                let to = usize::arbitrary(g) % n;
                dfa.add_transition(q, symbol, to).unwrap();
            }
        }
        dfa
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

    #[test]
    fn test_invalid_final_state() {
        let mut dfa = Dfa::new("ab");
        let result = dfa.set_final(0);
        assert_eq!(result, Err(DfaError::StateNotFound(0)));
    }

    #[test]
    fn test_invalid_transition_from() {
        let mut dfa = Dfa::new("ab");
        let q = dfa.new_state();
        let unknown = dfa.num_states() + 1;
        let result = dfa.add_transition(unknown, 0, q);
        assert_eq!(result, Err(DfaError::StateNotFound(unknown)));
    }

    #[test]
    fn test_invalid_transition_to() {
        let mut dfa = Dfa::new("ab");
        let q = dfa.new_state();
        let result = dfa.add_transition(q, 0, 1);
        assert_eq!(result, Err(DfaError::StateNotFound(1)));
    }

    #[test]
    fn test_invalid_transition_symbol() {
        let mut dfa = Dfa::new("ab");
        let q = dfa.new_state();
        let result = dfa.add_transition(q, 2, q);
        assert_eq!(result, Err(DfaError::SymbolOutOfRange(2)));
    }

    #[test]
    #[should_panic(expected = "cannot override transition")]
    fn test_override_transition_panics() {
        let mut dfa = Dfa::new("ab");
        let q = dfa.new_state();
        dfa.add_transition(q, 0, q).unwrap();
        dfa.add_transition(q, 0, q).unwrap();
    }

    #[test]
    fn test_completeness() {
        let dfa = even_ones();
        assert!(dfa.is_complete());

        let mut partial = Dfa::new("ab");
        let q = partial.new_state();
        partial.add_transition(q, 0, q).unwrap();
        assert!(!partial.is_complete());
    }

    #[test]
    fn test_run_and_accepts() {
        let dfa = even_ones();
        assert_eq!(dfa.run("1010"), Some(0));
        assert_eq!(dfa.run("101"), Some(1));
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("1010"));
        assert!(!dfa.accepts("1"));
        // Characters outside the alphabet get the run stuck.
        assert!(!dfa.accepts("2"));
    }

    #[test]
    fn test_divisibility_automata_end_in_remainder_state() {
        for base in 2..=36 {
            for divisor in 2..8 {
                let dfa = Dfa::divisibility(base, divisor);
                assert!(dfa.is_complete(), "({}, {}): not complete", base, divisor);
                for n in 0..base * divisor {
                    let repr = to_radix(n, base);
                    assert_eq!(
                        dfa.run(&repr),
                        Some((n % divisor) as StateId),
                        "({}, {}): wrong end state for {}",
                        base,
                        divisor,
                        repr
                    );
                    assert_eq!(n % divisor == 0, dfa.accepts(&repr));
                }
            }
        }
    }

    fn to_radix(mut n: u32, base: u32) -> String {
        let digits: Vec<char> = DIGITS.chars().collect();
        if n == 0 {
            return "0".to_string();
        }
        let mut out = Vec::new();
        while n > 0 {
            out.push(digits[(n % base) as usize]);
            n /= base;
        }
        out.iter().rev().collect()
    }
}
