//! Shell command parsing and execution.
//!
//! Commands:
//! - `get <path>` / `set <path> <json>` / `delete <path>` - key paths
//! - `all`, `keys` - the whole root, or its top-level keys
//! - `insert <collection> <json>` - insert a document or an array of them
//! - `find`, `findone`, `count <collection> [query]` - equality queries
//! - `update <collection> <query> <json> [--multi] [--upsert]`
//! - `remove <collection> <query> [--multi]`, `clear <collection>`
//! - `collections`, `drop <collection>`
//! - `help`, `exit`
//!
//! Queries and documents are JSON written inline, e.g.
//! `update users {"name": "Bob"} {"age": 25} --upsert`.

use dotstore::{Database, Document, Query, RemoveOptions, UpdateOptions, Value};
use nu_ansi_term::{Color, Style};
use serde_json::json;

/// Name, argument synopsis and description of a shell command.
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

const fn info(name: &'static str, args: &'static str, description: &'static str) -> CommandInfo {
    CommandInfo {
        name,
        args,
        description,
    }
}

pub const COMMANDS: &[CommandInfo] = &[
    info("get", "<path>", "Show the value at a key path"),
    info("set", "<path> <json>", "Store a JSON value at a key path"),
    info("delete", "<path>", "Remove the value at a key path"),
    info("all", "", "Show the whole store"),
    info("keys", "", "List top-level keys"),
    info("insert", "<coll> <json>", "Insert a document or an array of documents"),
    info("find", "<coll> [query]", "List matching documents"),
    info("findone", "<coll> [query]", "Show the first matching document"),
    info("count", "<coll> [query]", "Count matching documents"),
    info(
        "update",
        "<coll> <query> <json> [--multi] [--upsert]",
        "Merge fields into matching documents",
    ),
    info("remove", "<coll> <query> [--multi]", "Remove matching documents"),
    info("clear", "<coll>", "Remove every document in a collection"),
    info("collections", "", "List collections"),
    info("drop", "<coll>", "Delete a collection"),
    info("help", "", "Show this help message"),
    info("exit", "", "Leave the shell (alias: quit)"),
];

/// Look up a command by name or alias.
pub fn lookup(name: &str) -> Option<&'static CommandInfo> {
    let name = match name.to_lowercase().as_str() {
        "quit" => "exit".to_string(),
        "?" => "help".to_string(),
        other => other.to_string(),
    };
    COMMANDS.iter().find(|c| c.name == name)
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Success, with an optional message and an optional JSON value to show.
    Ok {
        message: Option<String>,
        value: Option<Value>,
    },
    Error(String),
    Exit,
    Help,
}

impl CommandResult {
    fn ok_none() -> Self {
        CommandResult::Ok {
            message: None,
            value: None,
        }
    }

    fn ok_message(message: impl Into<String>) -> Self {
        CommandResult::Ok {
            message: Some(message.into()),
            value: None,
        }
    }

    fn ok_value(value: Value) -> Self {
        CommandResult::Ok {
            message: None,
            value: Some(value),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{what} must be a JSON object")]
    NotAnObject { what: &'static str },
    #[error("unknown flag '{0}'")]
    UnknownFlag(String),
    #[error(transparent)]
    Store(#[from] dotstore::Error),
}

fn usage(name: &str) -> CommandError {
    match lookup(name) {
        Some(cmd) => CommandError::Usage(format!("{} {}", cmd.name, cmd.args)),
        None => CommandError::Usage(name.to_string()),
    }
}

/// Parse and execute one command line.
pub fn execute(input: &str, db: &mut Database) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::ok_none();
    }

    let (command, args) = split_word(input);
    let result = match command.to_lowercase().as_str() {
        "help" | "?" => Ok(CommandResult::Help),
        "exit" | "quit" => Ok(CommandResult::Exit),
        "get" => cmd_get(args, db),
        "set" => cmd_set(args, db),
        "delete" => cmd_delete(args, db),
        "all" => Ok(CommandResult::ok_value(db.store_ref().all())),
        "keys" => Ok(CommandResult::ok_value(Value::from(db.store_ref().keys()))),
        "insert" => cmd_insert(args, db),
        "find" => cmd_find(args, db),
        "findone" => cmd_find_one(args, db),
        "count" => cmd_count(args, db),
        "update" => cmd_update(args, db),
        "remove" => cmd_remove(args, db),
        "clear" => cmd_clear(args, db),
        "collections" => Ok(CommandResult::ok_value(Value::from(db.collection_names()))),
        "drop" => cmd_drop(args, db),
        _ => {
            return CommandResult::Error(format!(
                "Unknown command: '{}'. Type 'help' for available commands.",
                command
            ))
        }
    };

    result.unwrap_or_else(|error| CommandResult::Error(error.to_string()))
}

/// Run one command non-interactively and return its plain-text output.
///
/// Values are printed as pretty JSON without colour so the output can be
/// piped.
pub fn execute_once(input: &str, db: &mut Database) -> Result<String, String> {
    match execute(input, db) {
        CommandResult::Ok { message, value } => {
            let mut out = Vec::new();
            if let Some(value) = value {
                out.push(serde_json::to_string_pretty(&value).map_err(|e| e.to_string())?);
            }
            out.extend(message);
            Ok(out.join("\n"))
        }
        CommandResult::Error(error) => Err(error),
        CommandResult::Help => Ok(help_text(false)),
        CommandResult::Exit => Ok(String::new()),
    }
}

fn cmd_get(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let path = required_word(args, "get")?;
    Ok(match db.store_ref().get(path)? {
        Some(value) => CommandResult::ok_value(value),
        None => CommandResult::ok_message(format!("nothing at '{}'", path)),
    })
}

fn cmd_set(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let (path, json) = split_word(args);
    if path.is_empty() || json.is_empty() {
        return Err(usage("set"));
    }
    let value: Value = serde_json::from_str(json)?;
    db.store().set(path, value)?;
    Ok(CommandResult::ok_message(format!("set '{}'", path)))
}

fn cmd_delete(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let path = required_word(args, "delete")?;
    Ok(if db.store().delete(path)? {
        CommandResult::ok_message(format!("deleted '{}'", path))
    } else {
        CommandResult::ok_message(format!("nothing at '{}'", path))
    })
}

fn cmd_insert(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let (name, json) = split_word(args);
    if name.is_empty() || json.is_empty() {
        return Err(usage("insert"));
    }
    let input: Value = serde_json::from_str(json)?;
    if !input.is_object() && !input.is_array() {
        return Err(CommandError::NotAnObject { what: "document" });
    }
    let inserted = db.collection(name)?.insert(input)?;
    Ok(CommandResult::ok_value(inserted))
}

fn cmd_find(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let (name, query) = collection_and_query(args, "find")?;
    let docs = db.collection(name)?.find(&query);
    Ok(CommandResult::ok_value(documents(docs)))
}

fn cmd_find_one(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let (name, query) = collection_and_query(args, "findone")?;
    Ok(match db.collection(name)?.find_one(&query) {
        Some(doc) => CommandResult::ok_value(Value::Object(doc)),
        None => CommandResult::ok_message("no match"),
    })
}

fn cmd_count(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let (name, query) = collection_and_query(args, "count")?;
    let count = db.collection(name)?.count(&query);
    Ok(CommandResult::ok_value(Value::from(count)))
}

fn cmd_update(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let (name, rest) = split_word(args);
    let (values, flags) = json_values(rest, 2)?;
    let [query, fields] = <[Value; 2]>::try_from(values).map_err(|_| usage("update"))?;
    if name.is_empty() {
        return Err(usage("update"));
    }
    let query = object(query, "query")?;
    let fields = object(fields, "update")?;

    let mut options = UpdateOptions::default();
    for flag in parse_flags(flags, &["--multi", "--upsert"])? {
        match flag {
            "--multi" => options = options.multi(),
            _ => options = options.upsert(),
        }
    }

    let result = db.collection(name)?.update(&query, fields, options)?;
    Ok(CommandResult::ok_value(json!({
        "count": result.count,
        "upserted": result.upserted,
        "documents": documents(result.documents),
    })))
}

fn cmd_remove(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let (name, rest) = split_word(args);
    let (values, flags) = json_values(rest, 1)?;
    let [query] = <[Value; 1]>::try_from(values).map_err(|_| usage("remove"))?;
    if name.is_empty() {
        return Err(usage("remove"));
    }
    let query = object(query, "query")?;

    let mut options = RemoveOptions::default();
    if !parse_flags(flags, &["--multi"])?.is_empty() {
        options = options.multi();
    }

    let removed = db.collection(name)?.remove(&query, options)?;
    Ok(CommandResult::ok_message(format!(
        "removed {} document(s)",
        removed
    )))
}

fn cmd_clear(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let name = required_word(args, "clear")?;
    let removed = db.collection(name)?.clear()?;
    Ok(CommandResult::ok_message(format!(
        "removed {} document(s)",
        removed
    )))
}

fn cmd_drop(args: &str, db: &mut Database) -> Result<CommandResult, CommandError> {
    let name = required_word(args, "drop")?;
    Ok(if db.drop_collection(name)? {
        CommandResult::ok_message(format!("dropped '{}'", name.trim().to_lowercase()))
    } else {
        CommandResult::ok_message(format!("no collection '{}'", name))
    })
}

/// First whitespace-separated word and the trimmed remainder.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.find(char::is_whitespace) {
        Some(pos) => (&input[..pos], input[pos..].trim_start()),
        None => (input, ""),
    }
}

/// Exactly one word, or a usage error for `command`.
fn required_word<'a>(args: &'a str, command: &str) -> Result<&'a str, CommandError> {
    match split_word(args) {
        (word, "") if !word.is_empty() => Ok(word),
        _ => Err(usage(command)),
    }
}

fn collection_and_query<'a>(
    args: &'a str,
    command: &str,
) -> Result<(&'a str, Query), CommandError> {
    let (name, rest) = split_word(args);
    if name.is_empty() {
        return Err(usage(command));
    }
    let (values, trailing) = json_values(rest, 1)?;
    if !trailing.trim().is_empty() {
        return Err(usage(command));
    }
    let query = match values.into_iter().next() {
        Some(value) => object(value, "query")?,
        None => Query::new(),
    };
    Ok((name, query))
}

/// Parse up to `max` JSON values from the front of `input`.
///
/// Stops early at the end of input or at a `--flag`. Returns the values
/// and whatever text follows them.
fn json_values(input: &str, max: usize) -> Result<(Vec<Value>, &str), CommandError> {
    let mut stream = serde_json::Deserializer::from_str(input).into_iter::<Value>();
    let mut values = Vec::new();

    while values.len() < max {
        let rest = input[stream.byte_offset()..].trim_start();
        if rest.is_empty() || rest.starts_with("--") {
            break;
        }
        match stream.next() {
            Some(value) => values.push(value?),
            None => break,
        }
    }

    Ok((values, &input[stream.byte_offset()..]))
}

fn parse_flags<'a>(input: &'a str, allowed: &[&str]) -> Result<Vec<&'a str>, CommandError> {
    input
        .split_whitespace()
        .map(|flag| {
            if allowed.contains(&flag) {
                Ok(flag)
            } else {
                Err(CommandError::UnknownFlag(flag.to_string()))
            }
        })
        .collect()
}

fn object(value: Value, what: &'static str) -> Result<Document, CommandError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CommandError::NotAnObject { what }),
    }
}

fn documents(docs: Vec<Document>) -> Value {
    Value::Array(docs.into_iter().map(Value::Object).collect())
}

/// Help text, optionally with ANSI colours.
pub fn help_text(color: bool) -> String {
    let paint = |style: Style, text: &str| {
        if color {
            style.paint(text).to_string()
        } else {
            text.to_string()
        }
    };
    let cmd_style = Style::new().bold().fg(Color::Cyan);
    let arg_style = Style::new().fg(Color::Yellow);

    let mut help = format!("{}\n\n", paint(Style::new().bold(), "dotstore commands"));
    for cmd in COMMANDS {
        help.push_str(&format!(
            "  {}  {}  {}\n",
            paint(cmd_style, &format!("{:<12}", cmd.name)),
            paint(arg_style, &format!("{:<42}", cmd.args)),
            cmd.description
        ));
    }
    help.push_str(&format!(
        "\n{}",
        paint(
            Style::new().italic(),
            "Paths: a.b[0].c  Queries: {\"field\": value} (equality on every field)"
        )
    ));
    help
}

/// Format help text for the terminal.
pub fn format_help() -> String {
    help_text(true)
}

/// Pretty-print JSON with syntax highlighting.
pub fn format_json(value: &Value) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let mut out = String::with_capacity(pretty.len() * 2);
    let mut chars = pretty.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let mut text = String::from('"');
                let mut escaped = false;
                for c in chars.by_ref() {
                    text.push(c);
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        break;
                    }
                }
                // Object keys are followed directly by ':'.
                let style = if chars.peek() == Some(&':') {
                    Color::Blue.bold()
                } else {
                    Color::Green.normal()
                };
                out.push_str(&style.paint(text).to_string());
            }
            '{' | '}' | '[' | ']' => {
                out.push_str(&Color::White.bold().paint(c.to_string()).to_string());
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() || matches!(next, '.' | 'e' | 'E' | '+' | '-') {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&Color::Cyan.paint(number).to_string());
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphabetic() {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&Color::Yellow.paint(word).to_string());
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_of(result: CommandResult) -> Value {
        match result {
            CommandResult::Ok {
                value: Some(value), ..
            } => value,
            other => panic!("expected a value, got {:?}", other),
        }
    }

    fn error_of(result: CommandResult) -> String {
        match result {
            CommandResult::Error(error) => error,
            other => panic!("expected an error, got {:?}", other),
        }
    }

    #[test]
    fn test_split_word() {
        assert_eq!(split_word("  get a.b "), ("get", "a.b"));
        assert_eq!(split_word("set a {\"x\": 1}"), ("set", "a {\"x\": 1}"));
        assert_eq!(split_word("all"), ("all", ""));
        assert_eq!(split_word(""), ("", ""));
    }

    #[test]
    fn test_json_values_stop_at_flags() {
        let (values, rest) = json_values("{\"a\": 1} {\"b\": [1, 2]} --multi", 2).unwrap();
        assert_eq!(values, vec![json!({ "a": 1 }), json!({ "b": [1, 2] })]);
        assert_eq!(rest.trim(), "--multi");

        let (values, rest) = json_values("{\"a\":1}--upsert", 2).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(rest, "--upsert");

        let (values, _) = json_values("   ", 2).unwrap();
        assert!(values.is_empty());

        assert!(matches!(json_values("{oops", 1), Err(CommandError::Json(_))));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags(" --multi ", &["--multi"]).unwrap(), vec!["--multi"]);
        assert!(matches!(
            parse_flags("--force", &["--multi"]),
            Err(CommandError::UnknownFlag(_))
        ));
    }

    #[test]
    fn test_set_get_delete() {
        let mut db = Database::in_memory();

        execute("set user.name \"Alice\"", &mut db);
        execute("set user.tags [\"a\", \"b\"]", &mut db);
        assert_eq!(value_of(execute("get user.tags[1]", &mut db)), json!("b"));
        assert_eq!(
            value_of(execute("get user", &mut db)),
            json!({ "name": "Alice", "tags": ["a", "b"] })
        );
        assert_eq!(value_of(execute("keys", &mut db)), json!(["user"]));

        assert_eq!(
            execute("delete user.name", &mut db),
            CommandResult::ok_message("deleted 'user.name'")
        );
        assert_eq!(
            execute("get user.name", &mut db),
            CommandResult::ok_message("nothing at 'user.name'")
        );
        assert_eq!(value_of(execute("all", &mut db)), json!({ "user": { "tags": ["a", "b"] } }));
    }

    #[test]
    fn test_set_errors() {
        let mut db = Database::in_memory();
        execute("set a.b 1", &mut db);

        let conflict = error_of(execute("set a.b.c 2", &mut db));
        assert!(conflict.contains("a.b"), "{}", conflict);
        assert!(error_of(execute("set a.b {bad", &mut db)).starts_with("invalid JSON"));
        assert!(error_of(execute("set a.b", &mut db)).starts_with("usage: set"));
        assert!(error_of(execute("get a..b", &mut db)).contains("empty"));
    }

    #[test]
    fn test_collection_commands() {
        let mut db = Database::in_memory();

        let inserted = value_of(execute(
            "insert users [{\"name\": \"A\", \"role\": \"admin\"}, {\"name\": \"B\"}]",
            &mut db,
        ));
        assert_eq!(inserted.as_array().map(Vec::len), Some(2));

        assert_eq!(value_of(execute("count users", &mut db)), json!(2));
        assert_eq!(
            value_of(execute("count users {\"role\": \"admin\"}", &mut db)),
            json!(1)
        );

        let found = value_of(execute("findone Users {\"name\": \"B\"}", &mut db));
        assert_eq!(found["name"], json!("B"));
        assert!(found["_id"].is_string());

        assert_eq!(
            execute("findone users {\"name\": \"Z\"}", &mut db),
            CommandResult::ok_message("no match")
        );

        let found = value_of(execute("find users", &mut db));
        assert_eq!(found.as_array().map(Vec::len), Some(2));

        assert_eq!(value_of(execute("collections", &mut db)), json!(["users"]));
    }

    #[test]
    fn test_update_flags() {
        let mut db = Database::in_memory();
        execute("insert t [{\"g\": 1}, {\"g\": 1}]", &mut db);

        let single = value_of(execute("update t {\"g\": 1} {\"seen\": true}", &mut db));
        assert_eq!(single["count"], json!(1));

        let multi = value_of(execute("update t {\"g\": 1} {\"seen\": 2} --multi", &mut db));
        assert_eq!(multi["count"], json!(2));

        let upsert = value_of(execute(
            "update t {\"g\": 9} {\"new\": true} --upsert",
            &mut db,
        ));
        assert_eq!(upsert["upserted"], json!(true));
        assert_eq!(upsert["documents"][0]["g"], json!(9));
        assert_eq!(value_of(execute("count t", &mut db)), json!(3));

        assert!(error_of(execute("update t {\"g\": 1}", &mut db)).starts_with("usage: update"));
        assert!(error_of(execute("update t {\"g\": 1} {} --all", &mut db)).contains("--all"));
        assert!(error_of(execute("update t [1] {}", &mut db)).contains("query"));
    }

    #[test]
    fn test_remove_clear_drop() {
        let mut db = Database::in_memory();
        execute("insert t [{\"k\": 1}, {\"k\": 1}, {\"k\": 1}, {\"k\": 2}]", &mut db);

        assert_eq!(
            execute("remove t {\"k\": 1}", &mut db),
            CommandResult::ok_message("removed 1 document(s)")
        );
        assert_eq!(
            execute("remove t {\"k\": 1} --multi", &mut db),
            CommandResult::ok_message("removed 2 document(s)")
        );
        assert_eq!(
            execute("clear t", &mut db),
            CommandResult::ok_message("removed 1 document(s)")
        );
        assert_eq!(execute("drop T", &mut db), CommandResult::ok_message("dropped 't'"));
        assert_eq!(value_of(execute("collections", &mut db)), json!([]));
    }

    #[test]
    fn test_insert_rejects_scalars() {
        let mut db = Database::in_memory();
        assert_eq!(
            error_of(execute("insert t 5", &mut db)),
            "document must be a JSON object"
        );
        assert!(error_of(execute("insert t", &mut db)).starts_with("usage: insert"));
    }

    #[test]
    fn test_control_commands() {
        let mut db = Database::in_memory();
        assert_eq!(execute("   ", &mut db), CommandResult::ok_none());
        assert_eq!(execute("HELP", &mut db), CommandResult::Help);
        assert_eq!(execute("quit", &mut db), CommandResult::Exit);
        assert!(error_of(execute("frobnicate", &mut db)).contains("Unknown command"));
    }

    #[test]
    fn test_execute_once_is_plain() {
        let mut db = Database::in_memory();
        execute_once("set a {\"b\": 1}", &mut db).unwrap();
        assert_eq!(
            execute_once("get a", &mut db).unwrap(),
            "{\n  \"b\": 1\n}"
        );
        assert!(execute_once("get", &mut db).is_err());
        assert!(!execute_once("help", &mut db).unwrap().contains('\x1b'));
    }

    #[test]
    fn test_format_json_keeps_text() {
        let value = json!({ "k": "a \"null\" string", "n": -1.5, "b": [true, null] });
        let formatted = format_json(&value);
        assert!(formatted.contains("a \\\"null\\\" string"));
        assert!(formatted.contains("-1.5"));
        assert!(formatted.contains('\x1b'));
    }

    #[test]
    fn test_lookup_aliases() {
        assert_eq!(lookup("quit").map(|c| c.name), Some("exit"));
        assert_eq!(lookup("FIND").map(|c| c.name), Some("find"));
        assert!(lookup("read").is_none());
    }
}
