//! The expression optimizer.
//!
//! A pure string-to-string rewrite stage over the restricted syntax produced
//! by the solver in [`crate::eliminate`]: literals, character classes
//! `[...]`, groups `(...)`, disjunction `|`, implicit concatenation, and the
//! postfix quantifiers `*`, `+`, `?`. Expressions with anchors,
//! backreferences or other regex features are outside the supported grammar.
//!
//! Every sub-expression is classified as a disjunction (it contains a
//! top-level `|`) or a concatenation, split into terms, and each term is
//! optimized recursively. On the optimized term list, disjunctions get a
//! common prefix and suffix extracted (`abcd|aefd|aghd` becomes
//! `a(bc|ef|gh)d`), and concatenations get adjacent repetitions of the same
//! base merged by quantifier algebra (`RR*` becomes `R+`).

use crate::syntax::{is_atomic, is_quantifier};

/// Optimizes an expression produced by the equation solver.
///
/// The rewrite is purely algebraic: the optimized expression denotes
/// exactly the same language as the input. Applying the optimizer to its
/// own output yields the same string again.
pub fn optimize(expr: &str) -> String {
    optimize_inner(expr).text
}

/// The result of optimizing one sub-expression. Group terms need to know
/// whether the optimized interior is a multi-term disjunction, which would
/// create an operator-precedence ambiguity when concatenated bare.
struct Optimized {
    text: String,
    multi_disjunction: bool,
}

fn optimize_inner(expr: &str) -> Optimized {
    if expr.is_empty() {
        return Optimized {
            text: String::new(),
            multi_disjunction: false,
        };
    }

    // Classify, then split according to the rules of the classification:
    // disjunction terms are full sub-expressions, concatenation terms are
    // single (quantified) atomic units.
    let disjunction = is_disjunction(expr);
    let mut terms = if disjunction {
        split_disjunction(expr)
    } else {
        split_concatenation(expr)
    };

    optimize_terms(&mut terms, disjunction);

    if disjunction {
        extract_prefix_suffix(&mut terms);
    } else if terms.len() > 1 {
        reduce_quantified(&mut terms);
    }

    let multi_disjunction = disjunction && terms.len() > 1;
    let text = if disjunction {
        terms.join("|")
    } else {
        terms.concat()
    };
    Optimized {
        text,
        multi_disjunction,
    }
}

/// An expression is a disjunction iff it contains a `|` at parenthesis
/// depth 0. Character classes need no depth tracking here: alphabets never
/// contain `|`, so a class can never hide one.
fn is_disjunction(expr: &str) -> bool {
    let mut depth = 0i32;
    for c in expr.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '|' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Splits a disjunction at every depth-0 `|`.
fn split_disjunction(expr: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut part = String::new();
    let mut depth = 0i32;
    for c in expr.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth == 0 && c == '|' {
            terms.push(std::mem::take(&mut part));
        } else {
            part.push(c);
        }
    }
    terms.push(part);
    terms
}

/// Splits a concatenation into single units: a character, a whole class
/// `[...]`, or a whole balanced group `(...)`, each together with an
/// immediately following quantifier.
fn split_concatenation(expr: &str) -> Vec<String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut terms = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let start = i;
        match chars[i] {
            '[' => {
                // Alphabets never contain ']', so the next ']' closes the class.
                while chars[i] != ']' {
                    i += 1;
                }
                i += 1;
            }
            '(' => {
                i += 1;
                let mut depth = 1;
                while depth != 0 {
                    match chars[i] {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    i += 1;
                }
            }
            _ => i += 1,
        }
        if i < chars.len() && is_quantifier(chars[i]) {
            i += 1;
        }
        terms.push(chars[start..i].iter().collect());
    }
    terms
}

/// Optimizes the individual terms of the expression in place.
fn optimize_terms(terms: &mut Vec<String>, disjunction: bool) {
    let mut optimized = Vec::with_capacity(terms.len());
    for term in terms.drain(..) {
        if disjunction {
            // A disjunction term is a full sub-expression; recurse on the
            // whole of it.
            optimized.push(optimize_inner(&term).text);
        } else if term.starts_with('(') {
            // Dropping the group's parentheses can expose several units
            // (`(b|aa*b)` becomes `a*b`); reduction compares single units,
            // so the result is split again before it rejoins the list.
            optimized.extend(split_concatenation(&optimize_group(&term)));
        } else {
            // A (quantified) character or class is already minimal.
            optimized.push(term);
        }
    }
    *terms = optimized;
}

/// Recursively optimizes the interior of a group term, then decides whether
/// the surrounding parentheses are still needed. They are kept only if the
/// optimized interior is non-atomic and either carries a quantifier or is a
/// multi-term disjunction.
fn optimize_group(term: &str) -> String {
    let chars: Vec<char> = term.chars().collect();
    let quantifier = chars.last().copied().filter(|&c| is_quantifier(c));
    let end = chars.len() - if quantifier.is_some() { 2 } else { 1 };
    let interior: String = chars[1..end].iter().collect();

    let sub = optimize_inner(&interior);
    let mut optimized = sub.text;
    if !is_atomic(&optimized) {
        if quantifier.is_some() || sub.multi_disjunction {
            optimized = format!("({})", optimized);
            if let Some(q) = quantifier {
                optimized.push(q);
            }
        }
        // Otherwise the parentheses can be dropped inside a concatenation.
    } else if let Some(q) = quantifier {
        optimized.push(q);
    }
    optimized
}

/// Extracts a common prefix and suffix from all disjunction terms and
/// rewrites the term list as the single term `prefix(centers)suffix`.
///
/// Prefix and suffix grow one whole syntactic unit at a time, bounded by the
/// shortest term, and never overlap. A term that consists of only prefix and
/// suffix contributes an empty center; in that case the centers as a whole
/// must accept the empty word, which is ensured by modifying the shortest
/// center unless some center already provably accepts it. The emptiness
/// check is a conservative heuristic: only an atomic center quantified by
/// `*` or `?` counts as proof.
fn extract_prefix_suffix(terms: &mut Vec<String>) {
    let minimal: Vec<char> = match terms.iter().min_by_key(|t| t.chars().count()) {
        Some(t) => t.chars().collect(),
        None => return,
    };

    let prefix_len = find_prefix_len(terms, &minimal);
    let suffix_len = find_suffix_len(terms, &minimal, prefix_len);
    debug_assert!(prefix_len + suffix_len <= minimal.len());

    if prefix_len == 0 && suffix_len == 0 {
        return;
    }

    let prefix: String = minimal[..prefix_len].iter().collect();
    let suffix: String = minimal[minimal.len() - suffix_len..].iter().collect();

    let mut centers = Vec::new();
    let mut saw_empty_center = false;
    for term in terms.iter() {
        let chars: Vec<char> = term.chars().collect();
        if chars.len() == prefix_len + suffix_len {
            // The term is exactly prefix + suffix; the center disjunction
            // must accept the empty word on its behalf.
            saw_empty_center = true;
            continue;
        }
        centers.push(chars[prefix_len..chars.len() - suffix_len].iter().collect::<String>());
    }

    if centers.is_empty() {
        // Every term was prefix + suffix; the whole disjunction is too.
        terms.clear();
        terms.push(format!("{}{}", prefix, suffix));
        return;
    }

    let provably_empty = centers.iter().any(|c| {
        (c.ends_with('*') || c.ends_with('?')) && is_atomic(&c[..c.len() - 1])
    });
    if saw_empty_center && !provably_empty {
        // Modify exactly one center, the shortest, to admit emptiness.
        centers.sort_by_key(|c| c.chars().count());
        let modify = centers.remove(0);
        if is_atomic(&modify) {
            centers.push(format!("{}?", modify));
        } else if modify.ends_with('+') && is_atomic(&modify[..modify.len() - 1]) {
            let mut weakened = modify;
            weakened.pop();
            weakened.push('*');
            centers.push(weakened);
        } else {
            centers.push(format!("({})?", modify));
        }
    }

    let mut center_part = centers.join("|");
    if centers.len() > 1 {
        // More than one center remains; the concatenation with the prefix
        // and suffix needs the grouping.
        center_part = format!("({})", center_part);
    }
    terms.clear();
    terms.push(format!("{}{}{}", prefix, center_part, suffix));
}

/// Finds the length (in characters) of the longest prefix of `minimal` that
/// is a prefix of all terms, growing by whole syntactic units.
fn find_prefix_len(terms: &[String], minimal: &[char]) -> usize {
    let mut prefix_len = 0;
    while prefix_len < minimal.len() {
        let mut tmp = prefix_len;
        match minimal[tmp] {
            '[' => {
                while minimal[tmp] != ']' {
                    tmp += 1;
                }
                tmp += 1;
            }
            '(' => {
                tmp += 1;
                let mut depth = 1;
                while depth != 0 {
                    match minimal[tmp] {
                        '(' => depth += 1,
                        ')' => depth -= 1,
                        _ => {}
                    }
                    tmp += 1;
                }
            }
            _ => tmp += 1,
        }
        // Never separate a unit from its quantifier.
        if tmp < minimal.len() && is_quantifier(minimal[tmp]) {
            tmp += 1;
        }

        // A plain prefix match is not enough: in a longer term the boundary
        // may fall between a unit and its quantifier (`aa` vs `a?b`), and
        // cutting there would leave a center starting with the quantifier.
        let candidate: String = minimal[..tmp].iter().collect();
        let aligned = terms
            .iter()
            .all(|t| t.starts_with(&candidate) && !t[candidate.len()..].starts_with(is_quantifier));
        if aligned {
            prefix_len = tmp;
        } else {
            break;
        }
    }
    prefix_len
}

/// Finds the length (in characters) of the longest suffix of `minimal` that
/// is a suffix of all terms and does not overlap the prefix, growing by
/// whole syntactic units from the back.
fn find_suffix_len(terms: &[String], minimal: &[char], prefix_len: usize) -> usize {
    let mut suffix_len = 0;
    while prefix_len + suffix_len < minimal.len() {
        let mut tmp = suffix_len;
        let mut idx = minimal.len() - tmp - 1;

        // A quantifier here quantifies the unit in front of it.
        if is_quantifier(minimal[idx]) {
            tmp += 1;
            idx -= 1;
        }

        match minimal[idx] {
            ']' => {
                // Alphabets never contain '[', so the previous '[' opens the class.
                let open = (0..idx).rev().find(|&j| minimal[j] == '[').unwrap();
                tmp += idx - open + 1;
            }
            ')' => {
                tmp += 1;
                let mut depth = 1;
                let mut j = idx;
                while depth != 0 {
                    j -= 1;
                    match minimal[j] {
                        '(' => depth -= 1,
                        ')' => depth += 1,
                        _ => {}
                    }
                    tmp += 1;
                }
            }
            _ => tmp += 1,
        }

        let candidate: String = minimal[minimal.len() - tmp..].iter().collect();
        // The grown suffix may have run into the prefix.
        if tmp + prefix_len <= minimal.len() && terms.iter().all(|t| t.ends_with(&candidate)) {
            suffix_len = tmp;
        } else {
            break;
        }
    }
    suffix_len
}

/// Merges adjacent concatenation terms by quantifier algebra, left to
/// right: `RR*` and `R*R` become `R+`, `R*R*` collapses to `R*`, and mixed
/// quantifiers on the same base keep the dominant one per the ordering
/// `? < *` and `? < +`.
fn reduce_quantified(terms: &mut Vec<String>) {
    let mut reduced: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms.drain(..) {
        let last = match reduced.last() {
            Some(last) => last,
            None => {
                reduced.push(term);
                continue;
            }
        };

        let term_len = term.chars().count();
        let last_len = last.chars().count();

        if term_len == last_len && strip_last(&term) == strip_last(last) {
            if term == *last {
                if term.ends_with('*') {
                    // R* R* -> R*; drop the new term.
                } else {
                    reduced.push(term);
                }
            } else {
                let term_q = term.chars().last().unwrap();
                let last_q = last.chars().last().unwrap();
                match (last_q, term_q) {
                    // R+ R* -> R+ / R* R? -> R* / R+ R? -> R+
                    ('+', '*') | ('*', '?') | ('+', '?') => {}
                    // R* R+ -> R+ / R? R* -> R* / R? R+ -> R+
                    ('*', '+') | ('?', '*') | ('?', '+') => {
                        reduced.pop();
                        reduced.push(term);
                    }
                    _ => reduced.push(term),
                }
            }
        } else if term_len == last_len + 1 && term.ends_with('*') && term.starts_with(last.as_str())
        {
            // R R* -> R+
            let mut base = reduced.pop().unwrap();
            base.push('+');
            reduced.push(base);
        } else if term_len + 1 == last_len && last.ends_with('*') && last.starts_with(term.as_str())
        {
            // R* R -> R+
            reduced.pop();
            reduced.push(format!("{}+", term));
        } else {
            reduced.push(term);
        }
    }
    *terms = reduced;
}

/// The term without its final character.
fn strip_last(s: &str) -> &str {
    match s.chars().last() {
        Some(c) => &s[..s.len() - c.len_utf8()],
        None => s,
    }
}
