//! Syntax tree for path and predicate expressions.

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal string, number, boolean or nil.
    Literal(Value),
    /// A name looked up in the evaluation context.
    Variable(String),
    /// Field access on a record (`work.created`).
    Member {
        target: Box<Expression>,
        field: String,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    /// `condition ? then : otherwise`
    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
}

impl Expression {
    /// Height of the tree, computed without recursion.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((expr, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match expr {
                Self::Literal(_) | Self::Variable(_) => {}
                Self::Member { target, .. } => stack.push((target, depth + 1)),
                Self::Unary { expr, .. } => stack.push((expr, depth + 1)),
                Self::Binary { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                Self::Conditional {
                    condition,
                    then,
                    otherwise,
                } => {
                    stack.push((condition, depth + 1));
                    stack.push((then, depth + 1));
                    stack.push((otherwise, depth + 1));
                }
            }
        }
        deepest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    Plus,
    Minus,
}

impl BinaryOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::In => "in",
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}
