use lumbung::{
    Column, Columns, DatabaseError, Value, ValueType,
    planner::{compiler::compile_predicate, error::PlannerError, frame::Frame},
    row,
};

fn accounts() -> Columns {
    Columns::new(vec![
        Column::new("id", ValueType::Int).unique(),
        Column::new("owner", ValueType::Text),
        Column::new("balance", ValueType::Float).unique(),
        Column::new("open", ValueType::Bool),
    ])
    .unwrap()
}

fn users() -> Columns {
    Columns::new(vec![
        Column::new("id", ValueType::Int).unique(),
        Column::new("age", ValueType::Int),
    ])
    .unwrap()
}

#[test]
fn test_unique_equality_pins() {
    let frames = compile_predicate("equals(id, 3)", &users()).unwrap();
    assert_eq!(frames, vec![Frame::pinned(0, Value::Int(3))]);
    assert_eq!(frames[0].key(&users()), Some(vec![Value::Int(3)]));
    assert!(frames[0].is_unique(&users()));
}

#[test]
fn test_literal_may_come_first() {
    let frames = compile_predicate("equals(3, id)", &users()).unwrap();
    assert_eq!(frames, vec![Frame::pinned(0, Value::Int(3))]);
}

#[test]
fn test_or_concatenates_frames() {
    let frames =
        compile_predicate("or(equals(id, 1), or(equals(id, 2), greater(age, 5)))", &users())
            .unwrap();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].is_unique(&users()));
    assert!(frames[1].is_unique(&users()));
    assert!(!frames[2].is_unique(&users()));
    assert_eq!(frames[2].conditions().len(), 1);
}

#[test]
fn test_and_merges_every_pair() {
    let frames = compile_predicate(
        "and(or(equals(id, 1), equals(id, 2)), or(greater(age, 5), less(age, 2)))",
        &users(),
    )
    .unwrap();
    assert_eq!(frames.len(), 4);
    for frame in &frames {
        assert_eq!(frame.pins().len(), 1);
        assert_eq!(frame.conditions().len(), 1);
    }
}

#[test]
fn test_conflicting_pins_are_dropped() {
    let frames = compile_predicate("and(equals(id, 1), equals(id, 2))", &users()).unwrap();
    assert!(frames.is_empty());

    let frames = compile_predicate(
        "or(and(equals(id, 1), equals(id, 2)), equals(id, 3))",
        &users(),
    )
    .unwrap();
    assert_eq!(frames, vec![Frame::pinned(0, Value::Int(3))]);

    let frames = compile_predicate("and(equals(id, 1), equals(id, 1))", &users()).unwrap();
    assert_eq!(frames, vec![Frame::pinned(0, Value::Int(1))]);
}

#[test]
fn test_composite_key_needs_every_unique_column() {
    let columns = accounts();
    let partial = compile_predicate("equals(id, 1)", &columns).unwrap();
    assert_eq!(partial.len(), 1);
    assert!(!partial[0].is_unique(&columns));
    assert_eq!(partial[0].key(&columns), None);

    let full = compile_predicate("and(equals(balance, 2.5), equals(id, 1))", &columns).unwrap();
    assert!(full[0].is_unique(&columns));
    assert_eq!(
        full[0].key(&columns),
        Some(vec![Value::Int(1), Value::Float(2.5)])
    );
}

#[test]
fn test_pins_coerce_to_column_type() {
    let columns = accounts();
    let frames = compile_predicate("and(equals(balance, 10), equals(id, 4))", &columns).unwrap();
    assert_eq!(
        frames[0].key(&columns),
        Some(vec![Value::Int(4), Value::Float(10.0)])
    );

    // a text literal can never equal an int key
    let frames = compile_predicate("equals(id, 'four')", &columns).unwrap();
    assert!(frames.is_empty());
}

#[test]
fn test_integral_float_pins_int_key() {
    let frames = compile_predicate("equals(id, 3.0)", &users()).unwrap();
    assert_eq!(frames, vec![Frame::pinned(0, Value::Int(3))]);

    let frames = compile_predicate("and(equals(id, 3), equals(id, 3.0))", &users()).unwrap();
    assert_eq!(frames, vec![Frame::pinned(0, Value::Int(3))]);

    // no int equals 3.5
    let frames = compile_predicate("equals(id, 3.5)", &users()).unwrap();
    assert!(frames.is_empty());
}

#[test]
fn test_non_unique_equality_is_a_condition() {
    let columns = accounts();
    let frames = compile_predicate("equals(owner, 'ann')", &columns).unwrap();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].pins().is_empty());
    assert_eq!(frames[0].conditions().len(), 1);

    let row = row![1, "ann", 0.0f32, true];
    assert!(frames[0].check(&row, &columns).unwrap());
    let row = row![1, "bob", 0.0f32, true];
    assert!(!frames[0].check(&row, &columns).unwrap());
}

#[test]
fn test_column_to_column_equality_is_evaluated() {
    let columns = users();
    let frames = compile_predicate("equals(id, age)", &columns).unwrap();
    assert!(frames[0].pins().is_empty());
    assert!(frames[0].check(&row![4, 4], &columns).unwrap());
    assert!(!frames[0].check(&row![4, 5], &columns).unwrap());
}

#[test]
fn test_nested_equality_evaluates_to_bool() {
    let columns = accounts();
    let frames = compile_predicate("equals(open, equals(owner, 'ann'))", &columns).unwrap();
    assert!(frames[0].check(&row![1, "ann", 0.0f32, true], &columns).unwrap());
    assert!(frames[0].check(&row![2, "bob", 0.0f32, false], &columns).unwrap());
    assert!(!frames[0].check(&row![3, "bob", 0.0f32, true], &columns).unwrap());
}

#[test]
fn test_incomparable_values_fail_at_check() {
    let columns = accounts();
    let frames = compile_predicate("greater(owner, 3)", &columns).unwrap();
    assert!(matches!(
        frames[0].check(&row![1, "ann", 0.0f32, true], &columns),
        Err(DatabaseError::TypeMismatch { .. })
    ));
}

#[test]
fn test_unknown_column() {
    assert!(matches!(
        compile_predicate("greater(height, 3)", &users()),
        Err(DatabaseError::UnknownColumn { name }) if name == "height"
    ));
}

#[test]
fn test_malformed_predicates() {
    let cases = [
        ("", PlannerError::UnexpectedEnd),
        ("equals(id,", PlannerError::UnexpectedEnd),
        (
            "equals(id, 1.2.3)",
            PlannerError::InvalidNumber {
                literal: "1.2.3".to_string(),
            },
        ),
        (
            "equals(id, 'open",
            PlannerError::UnterminatedText { position: 11 },
        ),
        (
            "equals(id, #)",
            PlannerError::UnexpectedCharacter {
                position: 11,
                found: '#',
            },
        ),
        (
            "and(id, equals(id, 1))",
            PlannerError::ExpectedPredicate {
                found: "id".to_string(),
            },
        ),
        (
            "equals(id, 1) equals(id, 2)",
            PlannerError::TrailingTokens {
                found: "identifier 'equals'".to_string(),
            },
        ),
    ];

    for (predicate, expected) in cases {
        match compile_predicate(predicate, &users()) {
            Err(DatabaseError::MalformedPredicate(err)) => assert_eq!(err, expected, "{}", predicate),
            other => panic!("{}: expected a malformed predicate, got {:?}", predicate, other),
        }
    }
}
