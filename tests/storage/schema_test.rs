use lumbung::{
    row,
    storage::schema::{Column, Columns},
    types::{
        error::DatabaseError,
        value::{Value, ValueType},
    },
};

fn employees() -> Columns {
    Columns::new(vec![
        Column::new("name", ValueType::Text),
        Column::new("id", ValueType::Int).unique(),
        Column::new("salary", ValueType::Float),
        Column::new("badge", ValueType::Text).unique(),
        Column::new("active", ValueType::Bool),
    ])
    .unwrap()
}

#[test]
fn test_rejects_schema_without_unique_column() {
    let err = Columns::new(vec![
        Column::new("a", ValueType::Int),
        Column::new("b", ValueType::Text),
    ])
    .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidSchema { .. }));
}

#[test]
fn test_rejects_empty_and_duplicate_schemas() {
    assert!(matches!(
        Columns::new(vec![]),
        Err(DatabaseError::InvalidSchema { .. })
    ));
    assert!(matches!(
        Columns::new(vec![
            Column::new("id", ValueType::Int).unique(),
            Column::new("id", ValueType::Text),
        ]),
        Err(DatabaseError::InvalidSchema { .. })
    ));
}

#[test]
fn test_make_values_inverts_make_key_value_pair() {
    let columns = employees();
    let rows = [
        row!["ann", 1, 10.5f32, "A-1", true],
        row!["bob", -4, 0.0f32, "", false],
        row!["", 0, -3.25f32, "Z", true],
    ];
    for row in rows {
        let (key, record) = columns.make_key_value_pair(row.clone()).unwrap();
        assert_eq!(key.len(), 2);
        assert_eq!(record.len(), 3);
        assert_eq!(columns.make_row(key, record).unwrap(), row);
    }
}

#[test]
fn test_make_values_projects_in_schema_order() {
    let columns = employees();
    let (key, record) = columns
        .make_key_value_pair(row!["ann", 1, 10.5f32, "A-1", true])
        .unwrap();
    let row = columns
        .make_values(key, record, &["active", "name", "id"])
        .unwrap();
    assert_eq!(
        row.values,
        vec![Value::from("ann"), Value::Int(1), Value::Bool(true)]
    );
}

#[test]
fn test_make_values_rejects_unknown_projection() {
    let columns = employees();
    let (key, record) = columns
        .make_key_value_pair(row!["ann", 1, 10.5f32, "A-1", true])
        .unwrap();
    let err = columns.make_values(key, record, &["nope"]).unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn { name } if name == "nope"));
}

#[test]
fn test_get_value() {
    let columns = employees();
    let row = row!["ann", 1, 10.5f32, "A-1", true];
    assert_eq!(columns.get_value(&row, "badge").unwrap(), &Value::from("A-1"));
    assert!(matches!(
        columns.get_value(&row, "age"),
        Err(DatabaseError::UnknownColumn { .. })
    ));
}

#[test]
fn test_unique_columns_report_positions() {
    let columns = employees();
    let unique: Vec<(usize, &str)> = columns
        .unique_columns()
        .map(|(i, c)| (i, c.name.as_str()))
        .collect();
    assert_eq!(unique, vec![(1, "id"), (3, "badge")]);
}

#[test]
fn test_validate_row() {
    let columns = employees();
    assert!(matches!(
        columns.make_key_value_pair(row!["ann", 1]),
        Err(DatabaseError::ArityMismatch {
            expected: 5,
            actual: 2
        })
    ));
    assert!(matches!(
        columns.make_key_value_pair(row!["ann", "1", 10.5f32, "A-1", true]),
        Err(DatabaseError::TypeMismatch { .. })
    ));
}
