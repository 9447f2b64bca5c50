use std::{cmp::Ordering, fmt, vec::IntoIter};

use crate::{
    planner::{
        error::PlannerError,
        tokenizer::{Spanned, Token, tokenize},
    },
    storage::schema::Columns,
    types::{
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Or,
    And,
    Equals,
    Less,
    Greater,
}

impl Operator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "or" => Some(Operator::Or),
            "and" => Some(Operator::And),
            "equals" => Some(Operator::Equals),
            "less" => Some(Operator::Less),
            "greater" => Some(Operator::Greater),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Or => "or",
            Operator::And => "and",
            Operator::Equals => "equals",
            Operator::Less => "less",
            Operator::Greater => "greater",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::Or | Operator::And)
    }
}

/// Predicate syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Binary {
        op: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Column(String),
    Literal(Value),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Binary { op, left, right } => write!(f, "{}({}, {})", op.name(), left, right),
            Node::Column(name) => f.write_str(name),
            Node::Literal(value) => write!(f, "{}", value),
        }
    }
}

impl Node {
    pub fn binary(op: Operator, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Parses a prefix predicate such as `and(greater(age, 18), less(age, 65))`.
    pub fn parse(input: &str) -> std::result::Result<Node, PlannerError> {
        let mut tokens = tokenize(input)?.into_iter();
        let node = parse_node(&mut tokens)?;
        if !matches!(node, Node::Binary { .. }) {
            return Err(PlannerError::ExpectedPredicate {
                found: node.to_string(),
            });
        }
        match tokens.next() {
            Some(extra) => Err(PlannerError::TrailingTokens {
                found: extra.token.to_string(),
            }),
            None => Ok(node),
        }
    }

    /// Fails with [`DatabaseError::UnknownColumn`] on the first reference to a missing column.
    pub fn validate(&self, columns: &Columns) -> Result<()> {
        match self {
            Node::Binary { left, right, .. } => {
                left.validate(columns)?;
                right.validate(columns)
            }
            Node::Column(name) => columns.column(name).map(|_| ()),
            Node::Literal(_) => Ok(()),
        }
    }

    pub fn evaluate(&self, row: &Row, columns: &Columns) -> Result<Value> {
        match self {
            Node::Column(name) => columns.get_value(row, name).cloned(),
            Node::Literal(value) => Ok(value.clone()),
            Node::Binary { op, left, right } => {
                let result = match op {
                    Operator::And => left.test(row, columns)? && right.test(row, columns)?,
                    Operator::Or => left.test(row, columns)? || right.test(row, columns)?,
                    Operator::Equals => {
                        let l = left.evaluate(row, columns)?;
                        let r = right.evaluate(row, columns)?;
                        l.loose_eq(&r)
                    }
                    Operator::Less => ordering(left, right, row, columns)? == Ordering::Less,
                    Operator::Greater => ordering(left, right, row, columns)? == Ordering::Greater,
                };
                Ok(Value::Bool(result))
            }
        }
    }

    /// Evaluates the node as a condition; non-boolean results are a type error.
    pub fn test(&self, row: &Row, columns: &Columns) -> Result<bool> {
        let value = self.evaluate(row, columns)?;
        value.as_bool().ok_or_else(|| DatabaseError::TypeMismatch {
            expected: "bool".to_string(),
            actual: value.value_type().to_string(),
        })
    }
}

fn ordering(left: &Node, right: &Node, row: &Row, columns: &Columns) -> Result<Ordering> {
    let l = left.evaluate(row, columns)?;
    let r = right.evaluate(row, columns)?;
    l.compare(&r).ok_or_else(|| DatabaseError::TypeMismatch {
        expected: l.value_type().to_string(),
        actual: r.value_type().to_string(),
    })
}

fn parse_node(tokens: &mut IntoIter<Spanned>) -> std::result::Result<Node, PlannerError> {
    let Some(Spanned { token, .. }) = tokens.next() else {
        return Err(PlannerError::UnexpectedEnd);
    };

    match token {
        Token::Int(i) => Ok(Node::Literal(Value::Int(i))),
        Token::Float(x) => Ok(Node::Literal(Value::Float(x))),
        Token::Text(s) => Ok(Node::Literal(Value::Text(s))),
        Token::Ident(name) => match name.as_str() {
            "true" => Ok(Node::Literal(Value::Bool(true))),
            "false" => Ok(Node::Literal(Value::Bool(false))),
            _ => match Operator::from_name(&name) {
                Some(op) => {
                    let left = parse_operand(tokens, op)?;
                    let right = parse_operand(tokens, op)?;
                    Ok(Node::binary(op, left, right))
                }
                None => Ok(Node::Column(name)),
            },
        },
    }
}

fn parse_operand(
    tokens: &mut IntoIter<Spanned>,
    op: Operator,
) -> std::result::Result<Node, PlannerError> {
    let node = parse_node(tokens)?;
    if op.is_logical() && !matches!(node, Node::Binary { .. }) {
        return Err(PlannerError::ExpectedPredicate {
            found: node.to_string(),
        });
    }
    Ok(node)
}
