use anyhow::{bail, Context};
use colored::Colorize;
use mindly_store::{NodeOptions, Store};
use mindly_types::ROOT_ID;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::cli::*;
use crate::config;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let data_dir = config::resolve_data_dir(cli.data_dir)?;
    let mut store = Store::open(&data_dir)
        .with_context(|| format!("loading mindly data from {}", data_dir.display()))?;

    match cli.command {
        Command::Ls(args) => {
            print!("{}", render_listing(&store, args.what, cli.format)?);
            Ok(())
        }
        Command::Add(args) => cmd_add(&mut store, args, cli.format),
        Command::Check => cmd_check(&store, cli.format),
    }
}

#[derive(Serialize)]
struct PathEntry<'a> {
    id: &'a str,
    path: &'a [String],
}

/// Render one `ls` listing. Nodes appear in depth-first order.
pub fn render_listing(store: &Store, what: Listing, format: OutputFormat) -> anyhow::Result<String> {
    let tree = store.tree();
    let mut out = String::new();
    match (what, format) {
        (Listing::Paths, OutputFormat::Text) => {
            for id in tree.walk() {
                let path = tree.ancestry_by_name(id.as_str()).unwrap_or_default();
                out.push_str(&format!("'{}': {}\n", id.to_string().cyan(), serde_json::to_string(path)?));
            }
        }
        (Listing::Paths, OutputFormat::Json) => {
            let walk = tree.walk();
            let entries: Vec<PathEntry> = walk
                .iter()
                .map(|id| PathEntry {
                    id: id.as_str(),
                    path: tree.ancestry_by_name(id.as_str()).unwrap_or_default(),
                })
                .collect();
            out = serde_json::to_string_pretty(&entries)? + "\n";
        }
        (Listing::Nodes, OutputFormat::Text) => {
            for id in tree.walk() {
                let node = store.node(id.as_str())?;
                out.push_str(&format!("'{}': {}\n", id.to_string().cyan(), serde_json::to_string(&node)?));
            }
        }
        (Listing::Nodes, OutputFormat::Json) => {
            let mut nodes = Vec::new();
            for id in tree.walk() {
                nodes.push(json!({ "id": id, "record": store.node(id.as_str())? }));
            }
            out = serde_json::to_string_pretty(&nodes)? + "\n";
        }
        (Listing::Files, format) => {
            let mut files = Map::new();
            files.insert(
                mindly_store::INDEX_FILENAME.to_string(),
                serde_json::to_value(store.index_payload())?,
            );
            for (filename, doc) in store.documents() {
                files.insert(filename.to_string(), serde_json::to_value(doc)?);
            }
            out = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&Value::Object(files))?,
                OutputFormat::Text => files
                    .iter()
                    .map(|(name, payload)| format!("{}\n{payload:#}", name.bold()))
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            } + "\n";
        }
    }
    Ok(out)
}

fn cmd_add(store: &mut Store, args: AddArgs, format: OutputFormat) -> anyhow::Result<()> {
    let parent = if args.parent.is_empty() {
        mindly_store::NodeId::root()
    } else {
        store
            .lookup_by_name_path(&args.parent)
            .with_context(|| format!("resolving parent {:?}", args.parent))?
    };
    let options = NodeOptions {
        note: args.note,
        idea_type: args.idea_type,
        color: args.color,
        color_theme_type: args.color_theme_type,
    };

    let created = store.create_node(parent.as_str(), &args.text, &options)?;
    let written = store.write()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&created)?),
        OutputFormat::Text => {
            let under = if parent.as_str() == ROOT_ID {
                "the root".to_string()
            } else {
                args.parent.join(" / ")
            };
            println!(
                "{} Created {} {} under {}",
                "✓".green().bold(),
                created.kind(),
                created.identifier().to_string().yellow(),
                under.bold()
            );
            println!("  Wrote {written} file(s)");
        }
    }
    Ok(())
}

fn cmd_check(store: &Store, format: OutputFormat) -> anyhow::Result<()> {
    let findings = store.consistency_findings();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&findings)?),
        OutputFormat::Text if findings.is_empty() => {
            println!(
                "{} {} nodes, {} documents consistent",
                "✓".green().bold(),
                store.tree().len(),
                store.tree().proxy_filenames().len()
            );
        }
        OutputFormat::Text => {
            for finding in &findings {
                println!("  {} {finding}", "✗".red());
            }
        }
    }
    if !findings.is_empty() {
        bail!("{} consistency issue(s) found", findings.len());
    }
    Ok(())
}
