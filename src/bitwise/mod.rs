//! Reduction of bitwise expressions such as `1&(0|~0)` to a single boolean.
//!
//! The textual form is what the validator produces after substituting every
//! rule statement with its outcome bit. Text is checked for well-formedness,
//! parsed into a [`BitExpr`] and evaluated directly.
//!
//! `~` binds to the operand that follows it. Among the binary connectives `&`
//! binds tightest, then `^`, then `|`, so `1&1|1&0` reads as `(1&1)|(1&0)`.

mod grammar;

use std::fmt;

use crate::cache::ContentCache;
use crate::Error;

/// Deepest parenthesis/negation nesting accepted before reduction is refused.
pub const MAX_NESTING: usize = 64;

const ALPHABET: &[char] = &['0', '1', '~', '&', '|', '^', '(', ')'];

/// Parsed bitwise expression.
///
/// Chains of one connective are stored flat, so the tree is only as deep as the
/// grouping and negation nesting, which [`MAX_NESTING`] bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitExpr {
    Literal(bool),
    Not(Box<BitExpr>),
    And(Vec<BitExpr>),
    Xor(Vec<BitExpr>),
    Or(Vec<BitExpr>),
}

impl BitExpr {
    #[must_use]
    pub fn eval(&self) -> bool {
        match self {
            BitExpr::Literal(b) => *b,
            BitExpr::Not(inner) => !inner.eval(),
            BitExpr::And(operands) => operands.iter().all(BitExpr::eval),
            BitExpr::Xor(operands) => operands.iter().fold(false, |acc, e| acc ^ e.eval()),
            BitExpr::Or(operands) => operands.iter().any(BitExpr::eval),
        }
    }
}

fn write_chain(f: &mut fmt::Formatter<'_>, operands: &[BitExpr], op: char) -> fmt::Result {
    f.write_str("(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, "{op}")?;
        }
        write!(f, "{operand}")?;
    }
    f.write_str(")")
}

impl fmt::Display for BitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitExpr::Literal(b) => write!(f, "{}", u8::from(*b)),
            BitExpr::Not(inner) => write!(f, "~{inner}"),
            BitExpr::And(operands) => write_chain(f, operands, '&'),
            BitExpr::Xor(operands) => write_chain(f, operands, '^'),
            BitExpr::Or(operands) => write_chain(f, operands, '|'),
        }
    }
}

/// Strip whitespace; the result is the memoization key.
pub(crate) fn normalize(expression: &str) -> String {
    expression.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_binary(c: char) -> bool {
    matches!(c, '&' | '|' | '^')
}

fn check_well_formed(expr: &str) -> Result<(), Error> {
    if expr.is_empty() {
        return Err(Error::malformed(expr, "expression is empty"));
    }
    if let Some(bad) = expr.chars().find(|c| !ALPHABET.contains(c)) {
        return Err(Error::malformed(
            expr,
            format!("unexpected character '{bad}'"),
        ));
    }
    if expr.starts_with(is_binary) {
        return Err(Error::malformed(expr, "starts with a binary connective"));
    }
    if expr.ends_with(|c: char| c == '~' || is_binary(c)) {
        return Err(Error::malformed(expr, "ends with a dangling connective"));
    }
    let bytes = expr.as_bytes();
    if bytes
        .windows(2)
        .any(|w| is_binary(char::from(w[0])) && is_binary(char::from(w[1])))
    {
        return Err(Error::malformed(expr, "consecutive binary connectives"));
    }
    let opening = expr.matches('(').count();
    let closing = expr.matches(')').count();
    if opening != closing {
        return Err(Error::malformed(
            expr,
            format!("unbalanced parentheses ({opening} opening, {closing} closing)"),
        ));
    }
    Ok(())
}

/// Deepest recursion the parser would need: open groups plus pending negations.
fn nesting_depth(expr: &str) -> usize {
    let mut pending: Vec<usize> = vec![0];
    let mut depth = 0usize;
    let mut deepest = 0usize;
    for c in expr.chars() {
        match c {
            '~' => {
                if let Some(top) = pending.last_mut() {
                    *top += 1;
                }
                depth += 1;
            }
            '(' => {
                pending.push(0);
                depth += 1;
            }
            ')' => {
                let inner = pending.pop().unwrap_or(0);
                depth = depth.saturating_sub(inner + 1);
                if pending.is_empty() {
                    pending.push(0);
                }
                settle(&mut pending, &mut depth);
            }
            '0' | '1' => settle(&mut pending, &mut depth),
            _ => {}
        }
        deepest = deepest.max(depth);
    }
    deepest
}

fn settle(pending: &mut [usize], depth: &mut usize) {
    if let Some(top) = pending.last_mut() {
        *depth = depth.saturating_sub(*top);
        *top = 0;
    }
}

/// Parse a bitwise expression into its AST without evaluating it.
///
/// # Errors
///
/// [`Error::MalformedExpression`] for text that violates the alphabet or the
/// connective/parenthesis rules, [`Error::NonTerminatingExpression`] for
/// well-formed text that cannot reduce to a single bit or nests deeper than
/// [`MAX_NESTING`].
pub fn parse(expression: &str) -> Result<BitExpr, Error> {
    use winnow::Parser;

    let expr = normalize(expression);
    check_well_formed(&expr)?;
    let depth = nesting_depth(&expr);
    if depth > MAX_NESTING {
        return Err(Error::non_terminating(
            &expr,
            format!("nesting depth {depth} exceeds the reduction bound of {MAX_NESTING}"),
        ));
    }
    grammar::or_expr.parse(expr.as_str()).map_err(|e| {
        Error::non_terminating(&expr, format!("irreducible at offset {}", e.offset()))
    })
}

/// Reduce a bitwise expression to a boolean, memoizing successful results.
///
/// # Errors
///
/// See [`parse`].
pub fn evaluate(expression: &str, cache: &ContentCache<String, bool>) -> Result<bool, Error> {
    let key = normalize(expression);
    cache.get_or_try_insert(key.clone(), || parse(&key).map(|ast| ast.eval()))
}
