use winnow::combinator::{alt, delimited, preceded, repeat};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::take_while;

use super::BitExpr;

// -- Operands ---------------------------------------------------------------

fn bit(input: &mut &str) -> ModalResult<BitExpr> {
    alt((
        '0'.value(BitExpr::Literal(false)),
        '1'.value(BitExpr::Literal(true)),
    ))
    .parse_next(input)
}

fn primary(input: &mut &str) -> ModalResult<BitExpr> {
    alt((bit, delimited('(', or_expr, ')'))).parse_next(input)
}

/// `~*` applied to a primary. Negations are counted rather than recursed.
fn unary(input: &mut &str) -> ModalResult<BitExpr> {
    let negations = take_while(0.., '~').parse_next(input)?.len();
    let mut expr = primary(input)?;
    for _ in 0..negations {
        expr = BitExpr::Not(Box::new(expr));
    }
    Ok(expr)
}

// -- Connectives: `&` binds tighter than `^`, which binds tighter than `|` ---

/// A single operand stays as is; two or more become one n-ary node.
fn chain(first: BitExpr, rest: Vec<BitExpr>, node: fn(Vec<BitExpr>) -> BitExpr) -> BitExpr {
    if rest.is_empty() {
        return first;
    }
    let mut operands = Vec::with_capacity(rest.len() + 1);
    operands.push(first);
    operands.extend(rest);
    node(operands)
}

fn and_expr(input: &mut &str) -> ModalResult<BitExpr> {
    let first = unary(input)?;
    let rest: Vec<BitExpr> = repeat(0.., preceded('&', unary)).parse_next(input)?;
    Ok(chain(first, rest, BitExpr::And))
}

fn xor_expr(input: &mut &str) -> ModalResult<BitExpr> {
    let first = and_expr(input)?;
    let rest: Vec<BitExpr> = repeat(0.., preceded('^', and_expr)).parse_next(input)?;
    Ok(chain(first, rest, BitExpr::Xor))
}

pub(super) fn or_expr(input: &mut &str) -> ModalResult<BitExpr> {
    let first = xor_expr(input)?;
    let rest: Vec<BitExpr> = repeat(0.., preceded('|', xor_expr)).parse_next(input)?;
    Ok(chain(first, rest, BitExpr::Or))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Option<BitExpr> {
        or_expr.parse(input).ok()
    }

    fn lit(b: bool) -> BitExpr {
        BitExpr::Literal(b)
    }

    #[test]
    fn parse_single_bit() {
        assert_eq!(parse("1"), Some(lit(true)));
        assert_eq!(parse("0"), Some(lit(false)));
    }

    #[test]
    fn parse_negation_binds_to_next_operand() {
        assert_eq!(
            parse("~1&0"),
            Some(BitExpr::And(vec![BitExpr::Not(Box::new(lit(true))), lit(false)]))
        );
        assert_eq!(
            parse("~~0"),
            Some(BitExpr::Not(Box::new(BitExpr::Not(Box::new(lit(false))))))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("1|0&0"),
            Some(BitExpr::Or(vec![
                lit(true),
                BitExpr::And(vec![lit(false), lit(false)])
            ]))
        );
    }

    #[test]
    fn xor_sits_between_and_and_or() {
        assert_eq!(
            parse("1|0^1&0"),
            Some(BitExpr::Or(vec![
                lit(true),
                BitExpr::Xor(vec![lit(false), BitExpr::And(vec![lit(true), lit(false)])])
            ]))
        );
    }

    #[test]
    fn chains_are_flat() {
        assert_eq!(
            parse("1&1&0"),
            Some(BitExpr::And(vec![lit(true), lit(true), lit(false)]))
        );
    }

    #[test]
    fn parse_grouping() {
        assert_eq!(
            parse("(1|0)&0"),
            Some(BitExpr::And(vec![
                BitExpr::Or(vec![lit(true), lit(false)]),
                lit(false)
            ]))
        );
    }

    #[test]
    fn irreducible_inputs_fail() {
        assert_eq!(parse("()"), None);
        assert_eq!(parse("10"), None);
        assert_eq!(parse(")1("), None);
        assert_eq!(parse("(&1)"), None);
    }
}
