use nom::branch::alt;
use nom::character::complete::{alpha1, alphanumeric0, char, digit1, multispace0};
use nom::combinator::{all_consuming, map, opt, recognize, verify};
use nom::error::VerboseError;
use nom::multi::fold_many0;
use nom::sequence::{delimited, pair, preceded};
use nom::IResult;
use num_bigint::BigInt;
use num_traits::Num;

use crate::error::{CasError, Result};
use crate::expr::{Expr, Func, Rational};

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub fn parse_expr(input: &str) -> Result<Expr> {
    match all_consuming(ws(parse_add_sub))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(e) => Err(CasError::Parse(format!("{e:?}"))),
    }
}

fn parse_add_sub(input: &str) -> ParseResult<'_, Expr> {
    let (rest, init) = parse_mul_div(input)?;
    fold_many0(
        pair(ws(alt((char('+'), char('-')))), parse_mul_div),
        move || init.clone(),
        |acc, (op, rhs)| match op {
            '+' => Expr::Add(acc.boxed(), rhs.boxed()),
            '-' => Expr::Sub(acc.boxed(), rhs.boxed()),
            _ => unreachable!(),
        },
    )(rest)
}

fn parse_mul_div(input: &str) -> ParseResult<'_, Expr> {
    let (rest, init) = parse_pow(input)?;
    fold_many0(
        pair(ws(alt((char('*'), char('/')))), parse_pow),
        move || init.clone(),
        |acc, (op, rhs)| match op {
            '*' => Expr::Mul(acc.boxed(), rhs.boxed()),
            '/' => Expr::Div(acc.boxed(), rhs.boxed()),
            _ => unreachable!(),
        },
    )(rest)
}

fn parse_pow(input: &str) -> ParseResult<'_, Expr> {
    let (rest, base) = parse_unary(input)?;
    if let Ok((next, exp)) = preceded(ws(char('^')), parse_pow)(rest) {
        Ok((next, Expr::Pow(base.boxed(), exp.boxed())))
    } else {
        Ok((rest, base))
    }
}

fn parse_unary(input: &str) -> ParseResult<'_, Expr> {
    if let Ok((rest, expr)) = preceded(ws(char('-')), parse_unary)(input) {
        Ok((rest, Expr::Neg(expr.boxed())))
    } else {
        parse_primary(input)
    }
}

fn parse_primary(input: &str) -> ParseResult<'_, Expr> {
    alt((parse_parens, parse_function, parse_number, parse_identifier))(input)
}

fn parse_parens(input: &str) -> ParseResult<'_, Expr> {
    delimited(ws(char('(')), parse_add_sub, ws(char(')')))(input)
}

fn parse_number(input: &str) -> ParseResult<'_, Expr> {
    map(parse_int, |n| Expr::Constant(Rational::from_integer(n)))(input)
}

fn parse_identifier(input: &str) -> ParseResult<'_, Expr> {
    map(
        verify(identifier, |name: &str| Func::from_name(name).is_none()),
        |name: &str| Expr::Variable(name.to_string()),
    )(input)
}

fn parse_function(input: &str) -> ParseResult<'_, Expr> {
    let (rest, name) = identifier(input)?;
    let (rest, arg) = delimited(ws(char('(')), parse_add_sub, ws(char(')')))(rest)?;
    if let Some(func) = Func::from_name(name) {
        return Ok((rest, Expr::Apply(func, arg.boxed())));
    }
    // sqrt and lg are spelled with power and log forms rather than tags.
    match name {
        "sqrt" => Ok((rest, Expr::Pow(arg.boxed(), Expr::constant(1, 2).boxed()))),
        "lg" => Ok((
            rest,
            Expr::Div(
                Expr::Apply(Func::Log, arg.boxed()).boxed(),
                Expr::Apply(Func::Log, Expr::integer(10).boxed()).boxed(),
            ),
        )),
        _ => Err(nom::Err::Error(nom::error::VerboseError {
            errors: vec![(
                input,
                nom::error::VerboseErrorKind::Context("unknown function"),
            )],
        })),
    }
}

fn identifier(input: &str) -> ParseResult<'_, &str> {
    ws(recognize(pair(alpha1, alphanumeric0)))(input)
}

fn parse_int(input: &str) -> ParseResult<'_, BigInt> {
    map(ws(recognize(pair(opt(char('-')), digit1))), |s: &str| {
        BigInt::from_str_radix(s, 10).unwrap()
    })(input)
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> ParseResult<'a, O>
where
    F: FnMut(&'a str) -> ParseResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_precedence_chain() {
        let expr = parse_expr("2*x + x^2").unwrap();
        assert_eq!(
            expr,
            Expr::Add(
                Expr::Mul(Expr::integer(2).boxed(), Expr::var("x").boxed()).boxed(),
                Expr::Pow(Expr::var("x").boxed(), Expr::integer(2).boxed()).boxed(),
            )
        );
    }

    #[test]
    fn parses_known_functions() {
        assert_eq!(
            parse_expr("sin(x)").unwrap(),
            Expr::apply(Func::Sin, Expr::var("x"))
        );
        assert_eq!(
            parse_expr("sqrt(x)").unwrap(),
            Expr::Pow(Expr::var("x").boxed(), Expr::constant(1, 2).boxed())
        );
    }

    #[test]
    fn bare_names_become_variables() {
        assert_eq!(parse_expr("y2").unwrap(), Expr::var("y2"));
    }

    #[test]
    fn rejects_unknown_function_calls() {
        assert!(parse_expr("frobnicate(x)").is_err());
    }
}
