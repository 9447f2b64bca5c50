use std::cmp::Ordering;

use lumbung::{
    row,
    types::{
        error::DatabaseError,
        row::Row,
        value::{Value, ValueType},
    },
};

#[test]
fn test_value_type_tags() {
    for (tag, value_type) in [
        (0, ValueType::Text),
        (1, ValueType::Float),
        (2, ValueType::Int),
        (3, ValueType::Bool),
    ] {
        assert_eq!(value_type.as_tag(), tag);
        assert_eq!(ValueType::from_tag(tag).unwrap(), value_type);
    }
    assert!(matches!(
        ValueType::from_tag(4),
        Err(DatabaseError::UnsupportedValueType(4))
    ));
}

#[test]
fn test_value_type_from_str() {
    assert_eq!("INT".parse::<ValueType>().unwrap(), ValueType::Int);
    assert_eq!("text".parse::<ValueType>().unwrap(), ValueType::Text);
    assert_eq!("Boolean".parse::<ValueType>().unwrap(), ValueType::Bool);
    assert!("blob".parse::<ValueType>().is_err());
}

#[test]
fn test_key_ordering_is_total() {
    let mut values = vec![
        Value::Text("b".into()),
        Value::Int(3),
        Value::Float(-1.5),
        Value::Bool(true),
        Value::Int(-7),
        Value::Text("a".into()),
        Value::Bool(false),
    ];
    values.sort();
    assert_eq!(
        values,
        vec![
            Value::Bool(false),
            Value::Bool(true),
            Value::Int(-7),
            Value::Int(3),
            Value::Float(-1.5),
            Value::Text("a".into()),
            Value::Text("b".into()),
        ]
    );
}

#[test]
fn test_key_tuples_compare_lexicographically() {
    let a = vec![Value::Int(1), Value::Text("z".into())];
    let b = vec![Value::Int(2), Value::Text("a".into())];
    let c = vec![Value::Int(2), Value::Text("b".into())];
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn test_predicate_comparison_mixes_numbers() {
    assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
    assert_eq!(Value::Float(3.0).compare(&Value::Int(3)), Some(Ordering::Equal));
    assert!(Value::Int(3).loose_eq(&Value::Float(3.0)));
    assert_eq!(Value::Int(1).compare(&Value::Text("1".into())), None);
    assert!(!Value::Bool(true).loose_eq(&Value::Int(1)));
}

#[test]
fn test_coercion() {
    assert_eq!(Value::Int(4).coerce_to(ValueType::Float), Some(Value::Float(4.0)));
    assert_eq!(Value::Int(4).coerce_to(ValueType::Int), Some(Value::Int(4)));
    assert_eq!(Value::Float(4.0).coerce_to(ValueType::Int), None);
    assert_eq!(Value::Text("x".into()).coerce_to(ValueType::Bool), None);
}

#[test]
fn test_key_literal() {
    assert_eq!(Value::Float(4.0).key_literal(ValueType::Int), Some(Value::Int(4)));
    assert_eq!(Value::Float(-2.0).key_literal(ValueType::Int), Some(Value::Int(-2)));
    assert_eq!(Value::Float(4.5).key_literal(ValueType::Int), None);
    assert_eq!(Value::Float(3e9).key_literal(ValueType::Int), None);
    assert_eq!(Value::Float(f32::INFINITY).key_literal(ValueType::Int), None);
    assert_eq!(Value::Int(4).key_literal(ValueType::Float), Some(Value::Float(4.0)));
    assert_eq!(Value::Bool(true).key_literal(ValueType::Int), None);
}

#[test]
fn test_signed_zero_is_one_key() {
    assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    assert_eq!(Value::Float(-0.0).cmp(&Value::Float(0.0)), Ordering::Equal);
    assert!(Value::Float(-0.5) < Value::Float(-0.0));
    assert!(Value::Float(0.0) < Value::Float(f32::MIN_POSITIVE));
}

#[test]
fn test_serialized_size() {
    assert_eq!(Value::Int(1).serialized_size(), 4);
    assert_eq!(Value::Float(1.0).serialized_size(), 4);
    assert_eq!(Value::Bool(true).serialized_size(), 1);
    assert_eq!(Value::Text("four".into()).serialized_size(), 8);
    assert_eq!(row![1, "four", true].size(), 13);
}

#[test]
fn test_row_macro() {
    let row = row![7, 1.5f32, "x", false];
    assert_eq!(
        row,
        Row::new(vec![
            Value::Int(7),
            Value::Float(1.5),
            Value::Text("x".into()),
            Value::Bool(false)
        ])
    );
    assert_eq!(row.get_value(2), Some(&Value::Text("x".into())));
    assert_eq!(row.get_value(4), None);
}
