use std::io::Write;

use lumbung::{
    Column, Columns, Database, MemoryDatabase, Row, Value,
    art::welcome_message,
    planner::tokenizer::{Token, tokenize},
    types::error::{DatabaseError, Result},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing_subscriber::EnvFilter;

const HISTORY_FILE: &str = ".lumbung_history";
const DEFAULT_PATH: &str = "lumbung.db";

enum Backend {
    File(Database),
    Memory(MemoryDatabase),
}

impl Backend {
    fn table_names(&self) -> Result<Vec<String>> {
        match self {
            Backend::File(db) => db.table_names(),
            Backend::Memory(db) => Ok(db.table_names()),
        }
    }

    fn columns(&self, table: &str) -> Result<Columns> {
        match self {
            Backend::File(db) => Ok(db.get_table(table)?.columns().clone()),
            Backend::Memory(db) => Ok(db.get_table(table)?.columns().clone()),
        }
    }

    fn make_table(&mut self, table: &str, columns: Columns) -> Result<()> {
        match self {
            Backend::File(db) => db.make_table(table, columns).map(|_| ()),
            Backend::Memory(db) => db.make_table(table, columns).map(|_| ()),
        }
    }

    fn insert(&mut self, table: &str, row: Row) -> Result<()> {
        match self {
            Backend::File(db) => db.get_table(table)?.insert(row),
            Backend::Memory(db) => db.get_table_mut(table)?.insert(row),
        }
    }

    fn select(&self, table: &str, projection: &[&str]) -> Result<Vec<Row>> {
        match self {
            Backend::File(db) => db.get_table(table)?.select(projection)?.collect(),
            Backend::Memory(db) => db.get_table(table)?.select(projection)?.collect(),
        }
    }

    fn select_where(&self, table: &str, predicate: &str, projection: &[&str]) -> Result<Vec<Row>> {
        match self {
            Backend::File(db) => db
                .get_table(table)?
                .select_where(predicate, projection)?
                .collect(),
            Backend::Memory(db) => db
                .get_table(table)?
                .select_where(predicate, projection)?
                .collect(),
        }
    }

    fn delete(&mut self, table: &str, predicate: &str) -> Result<usize> {
        match self {
            Backend::File(db) => db.get_table(table)?.delete(predicate),
            Backend::Memory(db) => db.get_table_mut(table)?.delete(predicate),
        }
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        match self {
            Backend::File(db) => db.drop_table(table),
            Backend::Memory(db) => db.drop_table(table),
        }
    }

    fn close(self) -> Result<()> {
        match self {
            Backend::File(db) => db.close(),
            Backend::Memory(db) => db.close(),
        }
    }
}

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "lumbung> ".to_string();

    loop {
        let line = rl.readline(&prompt)?;
        let trimmed_line = line.trim_end();

        // A trailing backslash continues the command on the next line
        if let Some(continued) = trimmed_line.strip_suffix('\\') {
            input.push_str(continued);
            input.push(' ');
            prompt = "      -> ".to_string();
        } else {
            input.push_str(trimmed_line);
            break;
        }
    }

    Ok(input)
}

/// Splits off the first whitespace-delimited word.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(i) => (&input[..i], input[i..].trim_start()),
        None => (input, ""),
    }
}

/// Parses `name:type` with a trailing `!` marking a unique column.
fn parse_column(spec: &str) -> Result<Column> {
    let (name, value_type) = spec
        .split_once(':')
        .ok_or_else(|| DatabaseError::InvalidSchema {
            reason: format!("expected <name>:<type>, got '{}'", spec),
        })?;
    let (value_type, unique) = match value_type.strip_suffix('!') {
        Some(value_type) => (value_type, true),
        None => (value_type, false),
    };
    let column = Column::new(name, value_type.parse()?);
    Ok(if unique { column.unique() } else { column })
}

fn parse_row(columns: &Columns, input: &str) -> Result<Row> {
    let tokens = tokenize(input)?;
    if tokens.len() != columns.len() {
        return Err(DatabaseError::ArityMismatch {
            expected: columns.len(),
            actual: tokens.len(),
        });
    }

    let mut values = Vec::with_capacity(tokens.len());
    for (spanned, column) in tokens.into_iter().zip(columns.columns()) {
        let value = match spanned.token {
            Token::Int(i) => Value::Int(i),
            Token::Float(x) => Value::Float(x),
            Token::Text(s) => Value::Text(s),
            Token::Ident(word) if word == "true" => Value::Bool(true),
            Token::Ident(word) if word == "false" => Value::Bool(false),
            Token::Ident(word) => Value::Text(word),
        };
        let actual = value.value_type();
        let value = value
            .coerce_to(column.value_type)
            .ok_or_else(|| DatabaseError::TypeMismatch {
                expected: format!("{} for column '{}'", column.value_type, column.name),
                actual: actual.to_string(),
            })?;
        values.push(value);
    }
    Ok(Row::new(values))
}

fn print_rows(rows: &[Row]) {
    for row in rows {
        let line: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
        println!("{}", line.join(" | "));
    }
    println!("({} rows)", rows.len());
}

fn print_help() {
    println!(
        r#"
Available commands:
  help, h                               - Show this help message
  tables                                - List tables
  create <table> <col>:<type>[!] ...    - Create a table (! marks a unique column)
                                          types: int, float, bool, text
  insert <table> <value> ...            - Insert a row, values in column order
  select <table> [col ...]              - Show all rows
  where <table> <predicate> [| col ...] - Show rows matching a predicate
  delete <table> <predicate>            - Delete matching rows (memory backend)
  drop <table>                          - Drop a table
  clear, ctrl + l                       - Clear the screen
  exit, quit, q                         - Exit the database

Predicates: or(P, P), and(P, P), equals(V, V), less(V, V), greater(V, V)
  e.g. and(greater(age, 18), equals(name, 'ann'))

Use '\' at the end of a line for multiline input.
Use Up/Down arrows to navigate command history.
"#
    );
}

/// Runs one command. Returns `false` when the REPL should stop.
fn process_command(backend: &mut Backend, command: &str) -> Result<bool> {
    let (word, rest) = split_word(command);

    match word.to_lowercase().as_str() {
        "exit" | "quit" | "q" => {
            println!("Goodbye!");
            return Ok(false);
        }
        "help" | "h" => print_help(),
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            std::io::stdout().flush()?;
        }
        "tables" => {
            for name in backend.table_names()? {
                println!("{}", name);
            }
        }
        "create" => {
            let (table, specs) = split_word(rest);
            let columns = specs
                .split_whitespace()
                .map(parse_column)
                .collect::<Result<Vec<_>>>()?;
            backend.make_table(table, Columns::new(columns)?)?;
            println!("Created table '{}'", table);
        }
        "insert" => {
            let (table, values) = split_word(rest);
            let row = parse_row(&backend.columns(table)?, values)?;
            backend.insert(table, row)?;
            println!("Inserted 1 row");
        }
        "select" => {
            let (table, projection) = split_word(rest);
            let projection: Vec<&str> = projection.split_whitespace().collect();
            print_rows(&backend.select(table, &projection)?);
        }
        "where" => {
            let (table, rest) = split_word(rest);
            let (predicate, projection) = rest.rsplit_once('|').unwrap_or((rest, ""));
            let projection: Vec<&str> = projection.split_whitespace().collect();
            print_rows(&backend.select_where(table, predicate, &projection)?);
        }
        "delete" => {
            let (table, predicate) = split_word(rest);
            let count = backend.delete(table, predicate)?;
            println!("Deleted {} rows", count);
        }
        "drop" => {
            let (table, _) = split_word(rest);
            backend.drop_table(table)?;
            println!("Dropped table '{}'", table);
        }
        "" => {}
        other => println!("Unknown command '{}', type 'help' for commands", other),
    }

    Ok(true)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lumbung=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn open_backend() -> Result<Backend> {
    let mut path = None;
    let mut memory = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--memory" => memory = true,
            _ => path = Some(arg),
        }
    }

    if memory {
        match path {
            Some(path) => Ok(Backend::Memory(MemoryDatabase::open(path)?)),
            None => Ok(Backend::Memory(MemoryDatabase::new())),
        }
    } else {
        let path = path.unwrap_or_else(|| DEFAULT_PATH.to_string());
        Ok(Backend::File(Database::open(path)?))
    }
}

fn main() -> rustyline::Result<()> {
    init_logging();
    println!("{}", welcome_message("LUMBUNG DB"));

    let mut backend = match open_backend() {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(HISTORY_FILE);

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim().to_string();
                if command.is_empty() {
                    continue;
                }
                rl.add_history_entry(&command)?;
                match process_command(&mut backend, &command) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("EOF");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    if let Err(e) = backend.close() {
        eprintln!("Failed to close database: {}", e);
    }
    Ok(())
}
