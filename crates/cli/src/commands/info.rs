//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{ContractGroup, ContractNode, DataContract, DataStreamCollection};
use serde::Serialize;
use tracing::info;

use super::{branch, build_contract, load_manifest};
use crate::cli::InfoArgs;

/// Contract info for JSON output
#[derive(Serialize)]
struct ContractInfo {
    name: String,
    stream_count: usize,
    groups: Vec<GroupInfo>,
}

#[derive(Serialize)]
struct GroupInfo {
    label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<GroupInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    collections: Vec<CollectionInfo>,
}

#[derive(Serialize)]
struct CollectionInfo {
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    stream_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    streams: Vec<StreamInfo>,
}

#[derive(Serialize)]
struct StreamInfo {
    name: String,
    kind: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let path = &args.manifest.manifest;
    info!(manifest = %path.display(), "Loading contract info");

    let manifest = load_manifest(path)?;
    let contract = build_contract(&manifest)?;

    if args.json {
        let info = build_contract_info(&contract, args.streams);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize contract info")?;
        println!("{}", json);
    } else {
        print_contract_info(&contract, args.streams);
    }

    Ok(())
}

fn build_contract_info(contract: &DataContract, with_streams: bool) -> ContractInfo {
    ContractInfo {
        name: contract.name().to_string(),
        stream_count: contract.walk_streams().len(),
        groups: contract
            .root()
            .children()
            .filter_map(|(label, node)| node.as_group().map(|g| group_info(label, g, with_streams)))
            .collect(),
    }
}

fn group_info(label: &str, group: &ContractGroup, with_streams: bool) -> GroupInfo {
    let mut info = GroupInfo {
        label: label.to_string(),
        groups: Vec::new(),
        collections: Vec::new(),
    };
    for (child, node) in group.children() {
        match node {
            ContractNode::Group(g) => info.groups.push(group_info(child, g, with_streams)),
            ContractNode::Collection(c) => {
                info.collections
                    .push(collection_info(child, c, with_streams))
            }
        }
    }
    info
}

fn collection_info(label: &str, collection: &DataStreamCollection, with_streams: bool) -> CollectionInfo {
    let streams = if with_streams {
        collection
            .iter()
            .map(|s| StreamInfo {
                name: s.name().to_string(),
                kind: s.kind().to_string(),
                path: s.path().display().to_string(),
                description: s.description().map(str::to_string),
            })
            .collect()
    } else {
        Vec::new()
    };

    CollectionInfo {
        label: label.to_string(),
        source: collection.source().map(|p| p.display().to_string()),
        stream_count: collection.len(),
        streams,
    }
}

fn print_contract_info(contract: &DataContract, with_streams: bool) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Data Contract                             ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    if with_streams {
        print!("{}", contract.tree());
        println!();
        return;
    }

    println!("📂 {} ({} streams)", contract.name(), contract.walk_streams().len());
    print_group(contract.root(), "");
    println!();
}

/// Groups and collections only; stream counts instead of stream names
fn print_group(group: &ContractGroup, indent: &str) {
    let len = group.len();
    for (i, (label, node)) in group.children().enumerate() {
        let prefix = branch(i, len);
        let child_indent = if i + 1 == len {
            format!("{indent}   ")
        } else {
            format!("{indent}│  ")
        };
        match node {
            ContractNode::Group(g) => {
                println!("   {indent}{prefix} 📁 {label}");
                print_group(g, &child_indent);
            }
            ContractNode::Collection(c) => {
                println!("   {indent}{prefix} 🗂  {label} ({} streams)", c.len());
            }
        }
    }
}
