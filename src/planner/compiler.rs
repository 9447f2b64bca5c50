use tracing::debug;

use crate::{
    planner::{
        expression::{Node, Operator},
        frame::Frame,
    },
    storage::schema::Columns,
    types::{error::Result, value::Value},
};

/// Compiles a predicate into a disjunction of frames.
///
/// `or` concatenates the frames of both sides and `and` merges every pair.
/// `equals` between a unique column and a literal becomes a pin; every other
/// comparison becomes a condition evaluated per row. Frames that can never
/// match are dropped, so an empty result selects nothing.
pub fn compile_predicate(predicate: &str, columns: &Columns) -> Result<Vec<Frame>> {
    let node = Node::parse(predicate)?;
    node.validate(columns)?;

    let frames: Vec<Frame> = compile(&node, columns)
        .into_iter()
        .filter(|f| !f.is_always_false())
        .collect();

    let pinned = frames.iter().filter(|f| f.is_unique(columns)).count();
    debug!(
        predicate,
        frames = frames.len(),
        pinned,
        scanned = frames.len() - pinned,
        "compiled predicate"
    );
    Ok(frames)
}

fn compile(node: &Node, columns: &Columns) -> Vec<Frame> {
    let Node::Binary { op, left, right } = node else {
        return vec![Frame::condition(node.clone())];
    };

    match op {
        Operator::Or => {
            let mut frames = compile(left, columns);
            frames.extend(compile(right, columns));
            frames
        }
        Operator::And => {
            let lefts = compile(left, columns);
            let rights = compile(right, columns);
            lefts
                .iter()
                .flat_map(|l| rights.iter().map(move |r| l.merge(r)))
                .collect()
        }
        Operator::Equals => match (left.as_ref(), right.as_ref()) {
            (Node::Column(name), Node::Literal(value))
            | (Node::Literal(value), Node::Column(name)) => vec![pin(node, name, value, columns)],
            _ => vec![Frame::condition(node.clone())],
        },
        Operator::Less | Operator::Greater => vec![Frame::condition(node.clone())],
    }
}

/// Pins a unique column. Equality on other columns stays a row condition.
fn pin(node: &Node, name: &str, value: &Value, columns: &Columns) -> Frame {
    let Some(index) = columns.column_index(name) else {
        return Frame::condition(node.clone());
    };
    let column = &columns.columns()[index];
    if !column.is_unique {
        return Frame::condition(node.clone());
    }
    match value.clone().key_literal(column.value_type) {
        Some(value) => Frame::pinned(index, value),
        None => Frame::always_false(),
    }
}
