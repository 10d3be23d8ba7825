//! Interactive collection browser
//!
//! Lines are split shell-style (quotes group words), parsed into a `Command`
//! and run against a `Session`. A failed command prints its error and leaves
//! the session as it was.

use std::io::Write;

use docpanel_core::browser::{
    columns, expand, parse_input, render_cell, SearchScope, Session, ViewState, LONG_VALUE_CHARS,
    PER_PAGE_CHOICES,
};
use docpanel_core::gateway::Gateway;
use docpanel_core::{Document, Result, ID_FIELD};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Widest cell printed in the table view
const CELL_WIDTH: usize = 24;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Databases,
    Use { database: String, collection: String },
    Close,
    List,
    Search(String),
    Column(SearchScope),
    Page(usize),
    PerPage(usize),
    Show(usize),
    Edit { row: usize, field: String, value: String },
    Pending,
    Save,
    Discard,
    Update { row: usize, patch: String },
    New,
    Field { key: String, value: String },
    Insert,
    Cancel,
    Select(Vec<usize>),
    Delete,
    SetAll { key: String, value: Option<String> },
    Help,
    Quit,
}

/// Whether the loop keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

fn parse_row(word: &str) -> std::result::Result<usize, String> {
    match word.parse::<usize>() {
        Ok(row) if row > 0 => Ok(row),
        _ => Err(format!("'{}' is not a row number", word)),
    }
}

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let words = shlex::split(line).ok_or_else(|| "unbalanced quotes".to_string())?;
    let Some((head, args)) = words.split_first() else {
        return Ok(None);
    };
    let arity = |n: usize, usage: &str| {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!("usage: {}", usage))
        }
    };

    let command = match head.as_str() {
        "dbs" | "databases" => Command::Databases,
        "use" => {
            arity(2, "use <database> <collection>")?;
            Command::Use {
                database: args[0].clone(),
                collection: args[1].clone(),
            }
        }
        "close" => Command::Close,
        "ls" | "list" => Command::List,
        "search" => Command::Search(args.join(" ")),
        "column" => {
            arity(1, "column <name|*>")?;
            if args[0] == "*" {
                Command::Column(SearchScope::All)
            } else {
                Command::Column(SearchScope::Column(args[0].clone()))
            }
        }
        "page" => {
            arity(1, "page <n>")?;
            Command::Page(parse_row(&args[0])?)
        }
        "per-page" => {
            arity(1, "per-page <n>")?;
            let n = args[0]
                .parse()
                .map_err(|_| format!("'{}' is not a number", args[0]))?;
            Command::PerPage(n)
        }
        "show" => {
            arity(1, "show <row>")?;
            Command::Show(parse_row(&args[0])?)
        }
        "edit" => {
            arity(3, "edit <row> <field> <value>")?;
            Command::Edit {
                row: parse_row(&args[0])?,
                field: args[1].clone(),
                value: args[2].clone(),
            }
        }
        "pending" => Command::Pending,
        "save" => Command::Save,
        "discard" => Command::Discard,
        "update" => {
            arity(2, "update <row> <json>")?;
            Command::Update {
                row: parse_row(&args[0])?,
                patch: args[1].clone(),
            }
        }
        "new" => Command::New,
        "field" => {
            arity(2, "field <key> <value>")?;
            Command::Field {
                key: args[0].clone(),
                value: args[1].clone(),
            }
        }
        "insert" => Command::Insert,
        "cancel" => Command::Cancel,
        "select" => {
            if args.is_empty() {
                return Err("usage: select <row>...".to_string());
            }
            Command::Select(args.iter().map(|a| parse_row(a)).collect::<std::result::Result<_, _>>()?)
        }
        "delete" => Command::Delete,
        "set-all" => match args {
            [key] => Command::SetAll {
                key: key.clone(),
                value: None,
            },
            [key, value] => Command::SetAll {
                key: key.clone(),
                value: Some(value.clone()),
            },
            _ => return Err("usage: set-all <key> [value]".to_string()),
        },
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

pub const HELP: &str = "\
Navigation
  dbs                         list databases and collections
  use <db> <collection>       open a collection
  close                       leave the collection (drops staged edits)
  ls                          show the current page
  search <text>               filter rows (empty text clears)
  column <name|*>             search one column, or every column
  page <n>                    go to page n
  per-page <n>                rows per page (10, 15, 20, 25, 30)
  show <row>                  every field of one row
Editing
  edit <row> <field> <value>  stage a cell edit
  pending                     list staged edits
  save                        send staged edits
  discard                     drop staged edits
  update <row> <json>         update one document right away
  new                         open the new-document form
  field <key> <value>         fill a form field
  insert                      insert the form's document
  cancel                      close the form
  select <row>...             toggle rows for deletion
  delete                      delete selected rows
  set-all <key> [value]       set a field on every document
  help, quit";

/// Cut `text` to `width` characters on one line
fn clip(text: &str, width: usize) -> String {
    let flat: String = text.chars().map(|c| if c == '\n' { ' ' } else { c }).collect();
    if flat.chars().count() <= width {
        flat
    } else {
        let mut out: String = flat.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

fn cell_text(doc: &Document, column: &str) -> String {
    let value = if column == ID_FIELD {
        Some(doc.id.to_value())
    } else {
        doc.fields.get(column).cloned()
    };
    value.map(|v| render_cell(&v).text).unwrap_or_default()
}

pub fn print_table<G: Gateway>(session: &Session<G>, out: &mut impl Write) -> Result<()> {
    let Some(view) = session.view() else {
        writeln!(out, "no collection selected, try 'use <db> <collection>'")?;
        return Ok(());
    };
    let cols = columns(session.documents());
    if cols.is_empty() {
        writeln!(out, "{} is empty", view)?;
        return Ok(());
    }

    let header: Vec<String> = cols.iter().map(|c| clip(c, CELL_WIDTH)).collect();
    writeln!(out, "{:>4}    {}", "#", header.join(" | "))?;
    for (index, doc) in session.visible().iter().enumerate() {
        let selected = if session.selection().contains(&doc.id) { '*' } else { ' ' };
        let edited = if session.edits().pending_for(&doc.id).is_some() { '~' } else { ' ' };
        let cells: Vec<String> = cols.iter().map(|c| clip(&cell_text(doc, c), CELL_WIDTH)).collect();
        writeln!(out, "{:>4} {}{} {}", index + 1, selected, edited, cells.join(" | "))?;
    }

    let total = session.filtered().len();
    let pager = session.pager();
    write!(
        out,
        "page {}/{} ({} per page), {} document(s)",
        pager.page(),
        pager.page_count(total),
        pager.per_page(),
        total
    )?;
    if session.filter().is_active() {
        write!(out, " matching '{}' of {}", session.filter().query(), session.documents().len())?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_document(doc: &Document, out: &mut impl Write) -> Result<()> {
    for (field, cell) in expand(doc) {
        if cell.multiline {
            writeln!(out, "{}:", field)?;
            let chars: Vec<char> = cell.text.chars().collect();
            for line in chars.chunks(LONG_VALUE_CHARS) {
                writeln!(out, "    {}", line.iter().collect::<String>())?;
            }
        } else {
            writeln!(out, "{}: {}", field, cell.text)?;
        }
    }
    Ok(())
}

/// Run one command and print its outcome
pub fn execute<G: Gateway>(
    session: &mut Session<G>,
    command: Command,
    out: &mut impl Write,
) -> Result<Flow> {
    match command {
        Command::Databases => {
            let catalog = session.refresh_catalog()?;
            if catalog.is_empty() {
                writeln!(out, "no databases")?;
            }
            for entry in catalog {
                writeln!(out, "{} ({})", entry.name, entry.kind)?;
                for collection in &entry.collections {
                    writeln!(out, "  {}", collection)?;
                }
            }
        }
        Command::Use {
            database,
            collection,
        } => {
            session.select(ViewState::new(database, collection))?;
            print_table(session, out)?;
        }
        Command::Close => {
            let dropped = session.edits().len();
            session.close();
            if dropped > 0 {
                writeln!(out, "{} unsaved edit(s) discarded", dropped)?;
            }
        }
        Command::List => {
            session.reload()?;
            print_table(session, out)?;
        }
        Command::Search(query) => {
            session.set_search(&query);
            print_table(session, out)?;
        }
        Command::Column(scope) => {
            session.set_search_scope(scope);
            print_table(session, out)?;
        }
        Command::Page(page) => {
            session.go_to_page(page);
            print_table(session, out)?;
        }
        Command::PerPage(per_page) => {
            session.set_per_page(per_page)?;
            print_table(session, out)?;
        }
        Command::Show(row) => print_document(session.row(row)?, out)?,
        Command::Edit { row, field, value } => {
            session.stage_edit(row, &field, parse_input(&value))?;
            writeln!(out, "staged; {} document(s) pending, 'save' to send", session.edits().len())?;
        }
        Command::Pending => {
            let payloads = session.edits().payloads();
            if payloads.is_empty() {
                writeln!(out, "no pending edits")?;
            }
            for payload in payloads {
                writeln!(out, "{}", payload)?;
            }
        }
        Command::Save => {
            if session.edits().is_empty() {
                writeln!(out, "nothing to save")?;
            } else {
                let outcome = session.save_edits()?;
                writeln!(out, "updated {} document(s)", outcome.updated.len())?;
                for id in &outcome.missing {
                    writeln!(out, "  no longer exists: {}", id)?;
                }
                print_table(session, out)?;
            }
        }
        Command::Discard => {
            session.discard_edits();
            writeln!(out, "pending edits dropped")?;
        }
        Command::Update { row, patch } => {
            let patch = serde_json::from_str(&patch)?;
            let doc = session.update_row(row, patch)?;
            print_document(&doc, out)?;
        }
        Command::New => {
            let form = session.open_form()?;
            for row in form.rows() {
                let key = if row.key.is_empty() { "<new field>" } else { row.key.as_str() };
                writeln!(out, "  {}", key)?;
            }
            writeln!(out, "fill with 'field <key> <value>', then 'insert'")?;
        }
        Command::Field { key, value } => session.form_mut()?.set(&key, &value)?,
        Command::Insert => {
            let doc = session.submit_form()?;
            writeln!(out, "inserted {}", doc.id)?;
            print_table(session, out)?;
        }
        Command::Cancel => session.cancel_form(),
        Command::Select(rows) => {
            for row in rows {
                let selected = session.toggle_row(row)?;
                writeln!(out, "row {} {}", row, if selected { "selected" } else { "unselected" })?;
            }
            writeln!(out, "{} selected", session.selection().len())?;
        }
        Command::Delete => {
            let deleted = session.delete_selected()?;
            writeln!(out, "deleted {} document(s)", deleted)?;
            print_table(session, out)?;
        }
        Command::SetAll { key, value } => {
            let matched = session.set_field_all(&key, value.as_deref().map(parse_input))?;
            writeln!(out, "set '{}' on {} document(s)", key, matched)?;
        }
        Command::Help => {
            writeln!(out, "{}", HELP)?;
            writeln!(
                out,
                "page sizes: {}",
                PER_PAGE_CHOICES.map(|n| n.to_string()).join(", ")
            )?;
        }
        Command::Quit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

fn prompt<G: Gateway>(session: &Session<G>) -> String {
    match session.view() {
        Some(view) if !session.edits().is_empty() => format!("{}*> ", view),
        Some(view) => format!("{}> ", view),
        None => "docpanel> ".to_string(),
    }
}

/// Read commands until `quit` or end of input
pub fn run_repl<G: Gateway>(session: &mut Session<G>) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut stdout = std::io::stdout();
    println!("Type 'help' for commands.");

    loop {
        let line = match editor.readline(&prompt(session)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("(error) {}", e);
                continue;
            }
        };
        match execute(session, command, &mut stdout) {
            Ok(Flow::Exit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("(error) {}", e),
        }
    }

    if !session.edits().is_empty() {
        eprintln!("{} unsaved edit(s) discarded", session.edits().len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpanel_core::gateway::LocalGateway;
    use docpanel_core::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn session() -> Session<LocalGateway> {
        let gateway = LocalGateway::new(Arc::new(MemoryStore::new()));
        for i in 1..=3 {
            let doc = json!({"_id": i, "name": format!("user {}", i), "bio": "x".repeat(60)});
            gateway
                .insert("test", "users", doc.as_object().cloned().unwrap())
                .unwrap();
        }
        Session::new(gateway)
    }

    fn run(session: &mut Session<LocalGateway>, line: &str) -> Result<String> {
        let command = parse_command(line).unwrap().unwrap();
        let mut out = Vec::new();
        execute(session, command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(
            parse_command("use shop orders").unwrap(),
            Some(Command::Use {
                database: "shop".into(),
                collection: "orders".into()
            })
        );
        assert_eq!(
            parse_command(r#"edit 2 name "Ada Lovelace""#).unwrap(),
            Some(Command::Edit {
                row: 2,
                field: "name".into(),
                value: "Ada Lovelace".into()
            })
        );
        assert_eq!(
            parse_command("column *").unwrap(),
            Some(Command::Column(SearchScope::All))
        );
        assert_eq!(
            parse_command("set-all status").unwrap(),
            Some(Command::SetAll {
                key: "status".into(),
                value: None
            })
        );
        assert_eq!(
            parse_command("select 1 3").unwrap(),
            Some(Command::Select(vec![1, 3]))
        );
        assert_eq!(parse_command("search").unwrap(), Some(Command::Search(String::new())));
    }

    #[test]
    fn test_close_leaves_collection() {
        let mut session = session();
        run(&mut session, "use test users").unwrap();
        run(&mut session, "edit 1 name renamed").unwrap();
        assert_eq!(prompt(&session), "test.users*> ");

        let out = run(&mut session, "close").unwrap();
        assert!(out.contains("1 unsaved edit(s) discarded"));
        assert!(session.view().is_none());
        assert!(session.documents().is_empty());
        assert_eq!(prompt(&session), "docpanel> ");
        assert!(run(&mut session, "ls").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("use onlydb").is_err());
        assert!(parse_command("show 0").is_err());
        assert!(parse_command("page x").is_err());
        assert!(parse_command("select").is_err());
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command("edit 1 \"open").is_err());
    }

    #[test]
    fn test_browse_and_search() {
        let mut session = session();
        let out = run(&mut session, "use test users").unwrap();
        assert!(out.contains("_id | name | bio"));
        assert!(out.contains("user 3"));
        assert!(out.contains("page 1/1"));

        run(&mut session, "column name").unwrap();
        let out = run(&mut session, "search USER 2").unwrap();
        assert!(out.contains("1 document(s) matching 'USER 2' of 3"));
    }

    #[test]
    fn test_show_wraps_long_values() {
        let mut session = session();
        run(&mut session, "use test users").unwrap();
        let out = run(&mut session, "show 1").unwrap();
        assert!(out.contains("_id: 1"));
        assert!(out.contains("bio:\n    "));
    }

    #[test]
    fn test_edit_and_save() {
        let mut session = session();
        run(&mut session, "use test users").unwrap();
        run(&mut session, "edit 1 age 41").unwrap();
        assert_eq!(prompt(&session), "test.users*> ");
        let out = run(&mut session, "pending").unwrap();
        assert!(out.contains(r#"{"_id":1,"age":41}"#));

        run(&mut session, "save").unwrap();
        assert_eq!(session.documents()[0].get("age"), Some(&json!(41)));
        assert_eq!(prompt(&session), "test.users> ");
    }

    #[test]
    fn test_form_insert_and_delete() {
        let mut session = session();
        run(&mut session, "use test users").unwrap();
        run(&mut session, "new").unwrap();
        run(&mut session, "field name carol").unwrap();
        let out = run(&mut session, "insert").unwrap();
        assert!(out.contains("inserted "));
        assert_eq!(session.documents().len(), 4);

        run(&mut session, "select 1 2").unwrap();
        let out = run(&mut session, "delete").unwrap();
        assert!(out.contains("deleted 2 document(s)"));
        assert_eq!(session.documents().len(), 2);
    }

    #[test]
    fn test_errors_leave_state_alone() {
        let mut session = session();
        assert!(run(&mut session, "ls").is_err());
        run(&mut session, "use test users").unwrap();
        assert!(run(&mut session, "edit 9 name x").is_err());
        assert!(run(&mut session, "per-page 7").is_err());
        assert!(run(&mut session, "delete").is_err());
        assert!(session.edits().is_empty());
        assert_eq!(session.pager().per_page(), 10);
    }

    #[test]
    fn test_set_all() {
        let mut session = session();
        run(&mut session, "use test users").unwrap();
        let out = run(&mut session, "set-all active true").unwrap();
        assert!(out.contains("on 3 document(s)"));
        assert!(session
            .documents()
            .iter()
            .all(|d| d.get("active") == Some(&json!(true))));
    }
}
