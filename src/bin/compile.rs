//! Schema Compile CLI
//!
//! Compiles a root schema document (and everything it references) and prints
//! the resulting representations as JSON for downstream model emitters.
//! Optionally parses a JSON instance against a compiled class.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use schema_bind::model::{ModelSet, ModelValue};
use schema_bind::{CompilationContext, FileSystemLoader, SchemaRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-compile")]
#[command(about = "Compile JSON Schema documents into typed model representations")]
struct Cli {
    /// Root schema document to compile
    schema: PathBuf,

    /// Directory the schema URLs are relative to (defaults to the root
    /// schema's parent)
    #[arg(short, long)]
    schemas_dir: Option<PathBuf>,

    /// JSON instance file to parse against the compiled model
    #[arg(short, long)]
    instance: Option<PathBuf>,

    /// Class to parse the instance against (defaults to the root schema's)
    #[arg(short, long)]
    class: Option<String>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let schemas_dir = match &cli.schemas_dir {
        Some(dir) => dir.clone(),
        None => cli
            .schema
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let loader = FileSystemLoader::new(&schemas_dir);
    let mut registry = SchemaRegistry::new();

    // Register the whole directory so relative $refs resolve, then compile
    // from the requested root.
    let bundle = loader
        .load_directory(&mut registry)
        .with_context(|| format!("loading schemas from {}", schemas_dir.display()))?;
    tracing::info!(
        schemas = bundle.handles.len(),
        bundle_hash = %bundle.bundle_hash,
        "loaded schema bundle"
    );

    let root = loader
        .load_document(&mut registry, &cli.schema)
        .with_context(|| format!("loading {}", cli.schema.display()))?;

    let mut context = CompilationContext::new();
    registry.compile(root, &mut context)?;

    let root_class = registry.get_schema_by_handle(root)?.class_name().to_string();
    let representations: Vec<_> = context.representations().collect();
    print_json(&representations, cli.pretty)?;

    if let Some(instance_path) = &cli.instance {
        let class = cli.class.as_deref().unwrap_or(&root_class);
        let raw = std::fs::read_to_string(instance_path)
            .with_context(|| format!("reading {}", instance_path.display()))?;

        let model = ModelSet::from_context(&context);
        let value = model.parse(class, &raw)?;
        println!("parsed {class}: {}", describe(&value));
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

fn describe(value: &ModelValue) -> String {
    match value {
        ModelValue::Bool(b) => b.to_string(),
        ModelValue::Int(i) => i.to_string(),
        ModelValue::Number(n) => n.to_string(),
        ModelValue::Str(s) => format!("{s:?}"),
        ModelValue::Null => "null".to_string(),
        ModelValue::Array(items) => {
            let inner: Vec<String> = items.iter().map(describe).collect();
            format!("[{}]", inner.join(", "))
        }
        ModelValue::Instance(instance) => {
            let fields: Vec<String> = instance
                .fields()
                .map(|(name, value)| format!("{name}: {}", describe(value)))
                .collect();
            format!("{} {{ {} }}", instance.class_name(), fields.join(", "))
        }
    }
}
