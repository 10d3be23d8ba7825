mod http;
mod repl;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docpanel_core::browser::{parse_input, Session};
use docpanel_core::gateway::{self, Gateway, ListOptions, LocalGateway};
use docpanel_core::{open_store, CollectionStore, DocumentId};
use serde_json::{Map, Value};

use http::HttpGateway;

#[derive(Parser)]
#[command(name = "docpanel")]
#[command(about = "docpanel - browse and edit document collections")]
#[command(version)]
struct Cli {
    /// Gateway URL
    #[arg(long, global = true, env = "DOCPANEL_SERVER", default_value = "http://localhost:5000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

/// Database and collection addressed by a one-shot command
#[derive(Args)]
struct Target {
    /// Collection name
    collection: String,
    /// Database name; the gateway's default database when omitted
    #[arg(long)]
    database: Option<String>,
}

impl Target {
    /// Empty when unset, which leaves the database out of the request
    fn database(&self) -> &str {
        self.database.as_deref().unwrap_or("")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Browse collections interactively
    Browse {
        /// Work on a store directly instead of through the gateway
        /// (memory://, file://<dir> or a directory path)
        #[arg(long)]
        store: Option<String>,
    },
    /// List databases and their collections
    Databases,
    /// Print the documents of a collection as JSON
    List {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        skip: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
        /// Leave out the _id field
        #[arg(long)]
        hide_id: bool,
    },
    /// Insert one document given as a JSON object
    Insert {
        #[command(flatten)]
        target: Target,
        document: String,
    },
    /// Update one document with a JSON patch
    Update {
        #[command(flatten)]
        target: Target,
        id: String,
        patch: String,
    },
    /// Delete documents by id
    Delete {
        #[command(flatten)]
        target: Target,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Set a field on every document of a collection
    SetAll {
        #[command(flatten)]
        target: Target,
        key: String,
        /// JSON or plain text; empty string when omitted
        value: Option<String>,
    },
    /// Import documents from a JSON file into a store
    Import {
        /// JSON file: { "collection": [documents...], ... }
        file: std::path::PathBuf,
        /// Store to import into
        #[arg(long)]
        store: String,
        #[arg(long, default_value = "test")]
        database: String,
    },
    /// Export a store database to a JSON file
    Export {
        /// Output JSON file
        file: std::path::PathBuf,
        /// Store to export from
        #[arg(long)]
        store: String,
        #[arg(long, default_value = "test")]
        database: String,
        /// Export only this collection
        #[arg(long)]
        collection: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Browse { store: Some(uri) } => {
            let store = open(&uri)?;
            let mut session = Session::new(LocalGateway::new(store));
            repl::run_repl(&mut session)
        }
        Commands::Browse { store: None } => {
            let gateway = connect(&cli.server)?;
            println!("Connected to {}", gateway.base_url());
            let mut session = Session::new(gateway);
            repl::run_repl(&mut session)
        }
        Commands::Databases => {
            let gateway = HttpGateway::new(&cli.server)?;
            print_json(&gateway.databases()?)
        }
        Commands::List {
            target,
            skip,
            limit,
            hide_id,
        } => {
            let gateway = HttpGateway::new(&cli.server)?;
            let options = ListOptions {
                skip,
                limit,
                hide_id,
            };
            print_json(&gateway.list(target.database(), &target.collection, options)?)
        }
        Commands::Insert { target, document } => {
            let gateway = HttpGateway::new(&cli.server)?;
            let document = match parse_json(&document)? {
                Value::Object(map) => map,
                _ => bail!("document must be a JSON object"),
            };
            print_json(&gateway.insert(target.database(), &target.collection, document)?)
        }
        Commands::Update { target, id, patch } => {
            let gateway = HttpGateway::new(&cli.server)?;
            let patch = parse_json(&patch)?;
            let id = DocumentId::String(id);
            print_json(&gateway.update(target.database(), &target.collection, &id, patch)?)
        }
        Commands::Delete { target, ids } => {
            let gateway = HttpGateway::new(&cli.server)?;
            let ids: Vec<DocumentId> = ids.iter().map(|raw| parse_id(raw)).collect();
            let deleted = gateway.delete(target.database(), &target.collection, &ids)?;
            println!("Deleted {} document(s)", deleted);
            Ok(())
        }
        Commands::SetAll { target, key, value } => {
            let gateway = HttpGateway::new(&cli.server)?;
            let value = value.as_deref().map(parse_input);
            let matched = gateway.set_field_all(target.database(), &target.collection, &key, value)?;
            println!("Set '{}' on {} document(s)", key, matched);
            Ok(())
        }
        Commands::Import {
            file,
            store,
            database,
        } => import_data(&file, &store, &database),
        Commands::Export {
            file,
            store,
            database,
            collection,
        } => export_data(&file, &store, &database, collection.as_deref()),
    }
}

fn open(uri: &str) -> Result<Arc<dyn CollectionStore>> {
    open_store(uri).with_context(|| format!("Failed to open store: {}", uri))
}

/// Gateway client that has answered a health check
fn connect(server: &str) -> Result<HttpGateway> {
    let gateway = HttpGateway::new(server)?;
    gateway
        .health()
        .with_context(|| format!("Failed to connect to gateway at {}", server))?;
    Ok(gateway)
}

fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON: {}", text))
}

/// Ids typed on the command line: integers stay integers, anything else is a string
fn parse_id(raw: &str) -> DocumentId {
    DocumentId::from_value(&parse_input(raw)).unwrap_or_else(|| DocumentId::String(raw.to_string()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Import data from JSON file
/// Format: { "collection_name": [documents...], ... }
fn import_data(file: &Path, uri: &str, database: &str) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let data: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in file: {}", file.display()))?;

    let store = open(uri)?;
    let mut total_docs = 0;

    for (collection_name, documents) in data {
        let docs = documents
            .as_array()
            .with_context(|| format!("Collection '{}' must be an array", collection_name))?;

        for doc in docs {
            gateway::insert_document(store.as_ref(), database, &collection_name, doc.clone())
                .with_context(|| format!("Failed to insert document into {}", collection_name))?;
            total_docs += 1;
        }

        println!(
            "Imported {} documents into '{}.{}'",
            docs.len(),
            database,
            collection_name
        );
    }

    println!("Total: {} documents imported to {}", total_docs, uri);
    Ok(())
}

/// Export a database to JSON file, in the format `import_data` reads
fn export_data(file: &Path, uri: &str, database: &str, collection_filter: Option<&str>) -> Result<()> {
    let store = open(uri)?;

    let collections = store
        .list_collections(database)
        .with_context(|| format!("Failed to list collections of {}", database))?;

    let mut output: Map<String, Value> = Map::new();
    let mut total_docs = 0;

    for coll_name in collections {
        if let Some(filter) = collection_filter {
            if coll_name != filter {
                continue;
            }
        }

        let docs = gateway::list_documents(store.as_ref(), database, &coll_name, ListOptions::default())
            .with_context(|| format!("Failed to read collection: {}", coll_name))?;

        println!("Exporting {} documents from '{}'", docs.len(), coll_name);
        total_docs += docs.len();
        output.insert(coll_name, Value::Array(docs));
    }

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize to JSON")?;

    fs::write(file, json)
        .with_context(|| format!("Failed to write to file: {}", file.display()))?;

    println!("Total: {} documents exported to {}", total_docs, file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_database_is_optional() {
        let cli = Cli::try_parse_from(["docpanel", "list", "orders"]).unwrap();
        let Commands::List { target, .. } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(target.database(), "");

        let cli = Cli::try_parse_from(["docpanel", "list", "orders", "--database", "shop"]).unwrap();
        let Commands::List { target, .. } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(target.database(), "shop");
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), DocumentId::Int(42));
        assert_eq!(parse_id("abc"), DocumentId::String("abc".into()));
        assert_eq!(parse_id("\"42\""), DocumentId::String("42".into()));
    }

    #[test]
    fn test_import_then_export() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        let store = format!("file://{}", dir.path().join("store").display());

        fs::write(
            &input,
            json!({
                "users": [{"_id": 1, "name": "ada"}, {"_id": 2, "name": "bob"}],
                "tags": [{"_id": "t", "label": "x"}]
            })
            .to_string(),
        )
        .unwrap();

        import_data(&input, &store, "shop").unwrap();
        export_data(&output, &store, "shop", Some("users")).unwrap();

        let exported: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            exported,
            json!({"users": [{"_id": 1, "name": "ada"}, {"_id": 2, "name": "bob"}]})
        );
    }

    #[test]
    fn test_import_rejects_non_arrays() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.json");
        fs::write(&input, r#"{"users": {"name": "ada"}}"#).unwrap();
        assert!(import_data(&input, "memory://", "test").is_err());
    }
}
