//! urifind CLI - Find document URIs for matching content nodes.

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use std::process;
use urifind::{ContentStore, FindOptions, find_uris_by_filter, find_uris_by_node_type};

#[derive(Parser)]
#[command(name = "urifind")]
#[command(about = "Find document URIs for matching content nodes in a content tree")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find URIs of documents containing nodes of the given node type
    NodeType {
        /// The searched node type (like Acme.Site:Content.Code)
        node_type: String,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Find URIs of documents containing nodes matching a filter expression
    Filter {
        /// Filter expression, e.g. "[instanceof Acme.Site:Text][someProp = 1]"
        filter: String,

        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Path to the content tree snapshot
    #[arg(short, long, default_value = "content.yaml")]
    store: PathBuf,

    /// Tree path to search under
    #[arg(long, default_value = "/sites")]
    site_node_path: String,

    /// Domain prefix for composed URIs
    #[arg(short, long, default_value = "")]
    domain: String,

    /// Also match nodes that are hidden or access-restricted
    #[arg(long)]
    include_hidden: bool,

    /// Language dimension to resolve nodes in
    #[arg(short, long)]
    language: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

fn is_json(format: &str) -> bool {
    format == "json"
}

fn emit_error(format: &str, code: &str, detail: &str) -> ! {
    if is_json(format) {
        eprintln!("{}", json!({"error": code, "detail": detail}));
    } else {
        eprintln!("{}", format!("Error: {}", detail).red());
    }
    process::exit(1);
}

fn emit_uris(format: &str, uris: &[String]) {
    if is_json(format) {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({"uris": uris}))
                .unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        for uri in uris {
            println!("{}", uri);
        }
    }
}

fn load_store(format: &str, path: &PathBuf) -> ContentStore {
    match ContentStore::load(path) {
        Ok(store) => store,
        Err(e) => emit_error(
            format,
            "store_error",
            &format!("{}: {}", path.display(), e),
        ),
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::NodeType { node_type, query } => {
            let store = load_store(&query.format, &query.store);
            let options = FindOptions {
                site_node_path: query.site_node_path,
                domain: query.domain,
                include_hidden: query.include_hidden,
                language: query.language,
            };
            match find_uris_by_node_type(&store, &node_type, &options) {
                Ok(uris) => emit_uris(&query.format, &uris),
                Err(e) => emit_error(&query.format, "find_error", &e.to_string()),
            }
        }

        Commands::Filter { filter, query } => {
            let store = load_store(&query.format, &query.store);
            let options = FindOptions {
                site_node_path: query.site_node_path,
                domain: query.domain,
                include_hidden: query.include_hidden,
                language: query.language,
            };
            match find_uris_by_filter(&store, &filter, &options) {
                Ok(uris) => emit_uris(&query.format, &uris),
                Err(e) => emit_error(&query.format, "find_error", &e.to_string()),
            }
        }
    }
}
