use std::fs;

use lumbung::{
    Column, Columns, Database, DatabaseError, Row, Value, ValueType,
    config::StoreConfig,
    row,
    types::{DATABASE_DESCRIPTOR_SIZE, MAX_TABLE_COUNT},
    utils::mock::TempDatabase,
};

fn people() -> Columns {
    Columns::new(vec![
        Column::new("id", ValueType::Int).unique(),
        Column::new("name", ValueType::Text),
        Column::new("age", ValueType::Int),
    ])
    .unwrap()
}

fn ids(rows: &[Row]) -> Vec<i32> {
    rows.iter()
        .map(|r| match r.values[0] {
            Value::Int(id) => id,
            ref other => panic!("unexpected id {:?}", other),
        })
        .collect()
}

#[test]
fn test_new_file_gets_descriptor_region() {
    let temp = TempDatabase::new();
    let db = temp.open().unwrap();
    assert_eq!(db.table_count().unwrap(), 0);
    assert!(db.table_names().unwrap().is_empty());
    drop(db);
    assert_eq!(
        fs::metadata(&temp.path).unwrap().len(),
        DATABASE_DESCRIPTOR_SIZE as u64
    );
}

#[test]
fn test_make_and_get_table() {
    let temp = TempDatabase::new();
    let db = temp.open().unwrap();

    let mut table = db.make_table("people", people()).unwrap();
    table.insert(row![2, "bob", 40]).unwrap();
    table.insert(row![1, "ann", 30]).unwrap();

    let table = db.get_table("people").unwrap();
    let rows: Vec<Row> = table.select(&[]).unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(rows, vec![row![1, "ann", 30], row![2, "bob", 40]]);
    assert_eq!(table.get(&vec![Value::Int(2)]).unwrap(), row![2, "bob", 40]);
}

#[test]
fn test_duplicate_and_missing_tables() {
    let temp = TempDatabase::new();
    let db = temp.open().unwrap();
    db.make_table("people", people()).unwrap();

    assert!(matches!(
        db.make_table("people", people()),
        Err(DatabaseError::TableExists { name }) if name == "people"
    ));
    assert!(matches!(
        db.get_table("ghosts"),
        Err(DatabaseError::TableNotFound { .. })
    ));
}

#[test]
fn test_descriptor_limits() {
    let temp = TempDatabase::new();
    let db = temp.open().unwrap();

    assert!(matches!(
        db.make_table("a_table_name_that_is_too_long", people()),
        Err(DatabaseError::TableNameTooLong { max: 20, .. })
    ));
    assert!(matches!(
        db.make_table("", people()),
        Err(DatabaseError::InvalidSchema { .. })
    ));

    let wide: Vec<Column> = (0..21)
        .map(|i| {
            let column = Column::new(format!("c{}", i), ValueType::Int);
            if i == 0 { column.unique() } else { column }
        })
        .collect();
    assert!(matches!(
        db.make_table("wide", Columns::new(wide).unwrap()),
        Err(DatabaseError::TooManyColumns { count: 21, max: 20 })
    ));

    let long_column = Columns::new(vec![
        Column::new("a_column_name_too_long", ValueType::Int).unique(),
    ])
    .unwrap();
    assert!(matches!(
        db.make_table("t", long_column),
        Err(DatabaseError::ColumnNameTooLong { .. })
    ));

    assert_eq!(db.table_count().unwrap(), 0);
}

#[test]
fn test_table_capacity() {
    let temp = TempDatabase::new();
    let db = temp.open().unwrap();
    for i in 0..MAX_TABLE_COUNT {
        db.make_table(&format!("t{}", i), people()).unwrap();
    }
    assert!(matches!(
        db.make_table("one_more", people()),
        Err(DatabaseError::TableCapacityExceeded { max }) if max == MAX_TABLE_COUNT
    ));
    assert_eq!(db.table_count().unwrap(), MAX_TABLE_COUNT);
}

#[test]
fn test_tables_survive_reopen() {
    let temp = TempDatabase::new();
    {
        let db = temp.open().unwrap();
        let mut people_table = db.make_table("people", people()).unwrap();
        for id in (0..200).rev() {
            people_table
                .insert(row![id, format!("p{}", id), id % 90])
                .unwrap();
        }
        let mut pets = db
            .make_table(
                "pets",
                Columns::new(vec![
                    Column::new("name", ValueType::Text).unique(),
                    Column::new("weight", ValueType::Float),
                ])
                .unwrap(),
            )
            .unwrap();
        pets.insert(row!["rex", 12.5f32]).unwrap();
        drop((people_table, pets));
        db.close().unwrap();
    }

    let db = temp.open().unwrap();
    assert_eq!(db.table_names().unwrap(), vec!["people", "pets"]);

    let people_table = db.get_table("people").unwrap();
    let rows: Vec<Row> = people_table
        .select(&[])
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ids(&rows), (0..200).collect::<Vec<_>>());
    assert_eq!(rows[42], row![42, "p42", 42]);
    people_table.index().verify().unwrap();

    let pets = db.get_table("pets").unwrap();
    assert_eq!(
        pets.get(&vec![Value::from("rex")]).unwrap(),
        row!["rex", 12.5f32]
    );
}

#[test]
fn test_tables_share_the_node_region() {
    let temp = TempDatabase::new();
    let db = temp.open().unwrap();
    let mut a = db.make_table("a", people()).unwrap();
    let mut b = db.make_table("b", people()).unwrap();

    for id in 0..100 {
        a.insert(row![id, "a", 1]).unwrap();
        b.insert(row![-id, "b", 2]).unwrap();
    }

    let a_rows: Vec<Row> = a.select(&[]).unwrap().map(|r| r.unwrap()).collect();
    let b_rows: Vec<Row> = b.select(&[]).unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(ids(&a_rows), (0..100).collect::<Vec<_>>());
    assert_eq!(ids(&b_rows), (-99..=0).collect::<Vec<_>>());
}

#[test]
fn test_drop_table_compacts_slots() {
    let temp = TempDatabase::new();
    let mut db = temp.open().unwrap();
    for name in ["first", "second", "third"] {
        let mut table = db.make_table(name, people()).unwrap();
        table.insert(row![1, name, 1]).unwrap();
    }

    db.drop_table("first").unwrap();
    assert_eq!(db.table_names().unwrap(), vec!["third", "second"]);
    assert!(matches!(
        db.drop_table("first"),
        Err(DatabaseError::TableNotFound { .. })
    ));

    // the moved descriptor still finds its rows
    let third = db.get_table("third").unwrap();
    assert_eq!(third.get(&vec![Value::Int(1)]).unwrap(), row![1, "third", 1]);
    drop(third);

    db.make_table("fourth", people()).unwrap();
    drop(db);

    let db = temp.open().unwrap();
    assert_eq!(db.table_names().unwrap(), vec!["third", "second", "fourth"]);
    assert!(db.get_table("fourth").unwrap().is_empty().unwrap());
}

#[test]
fn test_rejects_truncated_file() {
    let temp = TempDatabase::new();
    fs::write(&temp.path, [0u8; 100]).unwrap();
    assert!(matches!(
        temp.open(),
        Err(DatabaseError::CorruptedDatabase { .. })
    ));
}

#[test]
fn test_rejects_invalid_table_count() {
    let temp = TempDatabase::new();
    let mut bytes = vec![0u8; DATABASE_DESCRIPTOR_SIZE];
    bytes[..4].copy_from_slice(&1000u32.to_be_bytes());
    fs::write(&temp.path, bytes).unwrap();
    assert!(matches!(
        temp.open(),
        Err(DatabaseError::CorruptedDatabase { .. })
    ));
}

#[test]
fn test_small_pages_split_often() {
    let temp = TempDatabase::new();
    let config = StoreConfig::default()
        .with_page_size(64)
        .with_minimum_order(3);
    let db = temp.open_with_config(config).unwrap();
    let mut table = db.make_table("people", people()).unwrap();
    assert_eq!(table.index().order(), 3);

    for id in 0..150 {
        table.insert(row![(id * 37) % 150, "x", id]).unwrap();
    }
    table.index().verify().unwrap();
    assert_eq!(table.len().unwrap(), 150);
}
