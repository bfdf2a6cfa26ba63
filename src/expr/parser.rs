//! A `nom`-based parser for path and predicate expressions.

use super::ast::{BinaryOperator, Expression, UnaryOperator};
use super::error::ExprError;
use super::value::Value;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{map, map_res, not, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};

/// Deepest `(`, unary operator or `? :` nesting the parser descends into.
const MAX_NESTING: usize = 32;
/// Longest run of operators at one precedence level (`a or b or c ...`).
const MAX_CHAIN: usize = 32;
/// Deepest syntax tree handed to the evaluator.
const MAX_DEPTH: usize = 64;

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, ExprError> {
    match expression(input.trim(), 0) {
        Ok(("", expr)) if expr.depth() > MAX_DEPTH => Err(ExprError::invalid(
            input,
            format!("expression is nested more than {MAX_DEPTH} levels deep"),
        )),
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(ExprError::invalid(
            input,
            format!("unexpected input at `{rem}`"),
        )),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(ExprError::invalid(
            input,
            format!("expression is nested too deeply near `{}`", truncate(e.input)),
        )),
        Err(e) => Err(ExprError::invalid(input, e.to_string())),
    }
}

fn truncate(input: &str) -> &str {
    input.char_indices().nth(20).map_or(input, |(end, _)| &input[..end])
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// A word that must not run into an identifier character (`or` but not `order`).
fn keyword<'a>(
    word: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(
        tag(word),
        not(satisfy(|c: char| c.is_ascii_alphanumeric() || c == '_')),
    )
}

/// Stop descending once `depth` is past the nesting limit.
fn too_deep(input: &str, depth: usize) -> Result<(), nom::Err<nom::error::Error<&str>>> {
    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    Ok(())
}

fn build_binary_expr_parser<'a, F, G>(
    sub_expr_parser: F,
    op_parser: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = sub_expr_parser.clone().parse(input)?;
        let (rest, remainder) =
            many0(pair(ws(op_parser.clone()), sub_expr_parser.clone())).parse(input)?;
        if remainder.len() > MAX_CHAIN {
            return Err(nom::Err::Failure(nom::error::Error::new(
                input,
                ErrorKind::TooLarge,
            )));
        }

        for (op, right) in remainder {
            left = Expression::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((rest, left))
    }
}

// --- Expression Parsers (in order of precedence) ---

fn expression(input: &str, depth: usize) -> IResult<&str, Expression> {
    too_deep(input, depth)?;
    let (i, condition) = or_expr(input, depth)?;
    let (i, branches) = opt(pair(
        preceded(ws(char('?')), |i| expression(i, depth + 1)),
        preceded(ws(char(':')), |i| expression(i, depth + 1)),
    ))
    .parse(i)?;

    match branches {
        Some((then, otherwise)) => Ok((
            i,
            Expression::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
        )),
        None => Ok((i, condition)),
    }
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(keyword("or"), |_| BinaryOperator::Or),
        map(tag("||"), |_| BinaryOperator::Or),
    ))
    .parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(keyword("and"), |_| BinaryOperator::And),
        map(tag("&&"), |_| BinaryOperator::And),
    ))
    .parse(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("=="), |_| BinaryOperator::Equals),
        map(tag("!="), |_| BinaryOperator::NotEquals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
        map(keyword("in"), |_| BinaryOperator::In),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn or_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| and_expr(i, depth), or_op)(input)
}

fn and_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| equality_expr(i, depth), and_op)(input)
}

fn equality_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| relational_expr(i, depth), equality_op)(input)
}

fn relational_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| additive_expr(i, depth), relational_op)(input)
}

fn additive_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    build_binary_expr_parser(move |i| unary_expr(i, depth), additive_op)(input)
}

fn unary_op(input: &str) -> IResult<&str, UnaryOperator> {
    alt((
        map(keyword("not"), |_| UnaryOperator::Not),
        map(terminated(char('!'), not(char('='))), |_| UnaryOperator::Not),
        map(char('-'), |_| UnaryOperator::Minus),
    ))
    .parse(input)
}

fn unary_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (i, op) = opt(ws(unary_op)).parse(input)?;

    match op {
        Some(op) => {
            too_deep(i, depth + 1)?;
            let (i, expr) = unary_expr(i, depth + 1)?;
            Ok((
                i,
                Expression::Unary {
                    op,
                    expr: Box::new(expr),
                },
            ))
        }
        None => postfix_expr(i, depth),
    }
}

/// A primary expression followed by any number of `.field` accesses.
fn postfix_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    let (i, base) = primary_expr(input, depth)?;
    let (i, fields) = many0(preceded(ws(char('.')), identifier)).parse(i)?;

    let expr = fields.into_iter().fold(base, |target, field| Expression::Member {
        target: Box::new(target),
        field: field.to_owned(),
    });
    Ok((i, expr))
}

fn primary_expr(input: &str, depth: usize) -> IResult<&str, Expression> {
    ws(alt((
        map(string_literal, |s| Expression::Literal(Value::String(s))),
        map(number, |n| Expression::Literal(Value::Number(n))),
        map(identifier, name_or_constant),
        delimited(char('('), |i| expression(i, depth + 1), ws(char(')'))),
    )))
    .parse(input)
}

// --- Literal Parsers ---

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        )),
        |s: &str| s.to_owned(),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn name_or_constant(name: &str) -> Expression {
    match name {
        "true" => Expression::Literal(Value::Bool(true)),
        "false" => Expression::Literal(Value::Bool(false)),
        "nil" | "null" => Expression::Literal(Value::Nil),
        _ => Expression::Variable(name.to_owned()),
    }
}
