//! Pure helpers over the restricted expression syntax shared by the solver
//! and the optimizer.
//!
//! The only syntax ever produced is: literal characters, character classes
//! `[...]`, groups `(...)`, top-level disjunction `|`, and the postfix
//! quantifiers `*`, `+` and `?`.

/// Checks whether the given character is a quantifier.
pub(crate) fn is_quantifier(c: char) -> bool {
    matches!(c, '*' | '+' | '?')
}

/// Checks whether the given expression `R` is atomic, i.e. whether `(R)Q`
/// is equivalent to `RQ` for a quantifier `Q`.
///
/// An expression is atomic if it is a single non-operator character, or if
/// it is entirely enclosed by one top-level `(...)` or `[...]` pair that
/// closes exactly at the final character.
pub(crate) fn is_atomic(expr: &str) -> bool {
    let chars: Vec<char> = expr.chars().collect();
    if chars.len() == 1 && !"()[]|*+?".contains(chars[0]) {
        return true;
    }

    let mut depth = 0i32;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ => {}
        }
        // The top-level pair ended before the end of the string.
        if depth == 0 && i != chars.len() - 1 {
            return false;
        }
    }

    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantifiers() {
        assert!(is_quantifier('*'));
        assert!(is_quantifier('+'));
        assert!(is_quantifier('?'));
        assert!(!is_quantifier('a'));
        assert!(!is_quantifier('('));
    }

    #[test]
    fn test_atomic_single_characters() {
        assert!(is_atomic("a"));
        assert!(is_atomic("0"));
    }

    #[test]
    fn test_atomic_enclosed() {
        assert!(is_atomic("(ab)"));
        assert!(is_atomic("[abc]"));
        assert!(is_atomic("(a(b)c)"));
        assert!(is_atomic("(a|b)"));
    }

    #[test]
    fn test_not_atomic() {
        assert!(!is_atomic("ab"));
        assert!(!is_atomic("(a)(b)"));
        assert!(!is_atomic("(ab)*"));
        assert!(!is_atomic("[ab]c"));
        assert!(!is_atomic("a|b"));
        assert!(!is_atomic("(ab"));
    }
}
