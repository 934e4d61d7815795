//! `sheetrun capabilities` command.

use clap::Args;

use sheetrun_sandbox::{CapabilityEntry, CapabilityRegistry};

/// List every name reachable from scripts.
#[derive(Debug, Args)]
pub struct CapabilitiesArgs {
    /// Print the manifest as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the capabilities command.
pub fn execute(args: &CapabilitiesArgs) -> anyhow::Result<()> {
    let set = CapabilityRegistry::build();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(set.entries()))?);
    } else {
        for line in table(set.entries()) {
            println!("{line}");
        }
    }
    Ok(())
}

fn table(entries: &[CapabilityEntry]) -> Vec<String> {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    entries
        .iter()
        .map(|e| {
            format!(
                "{:<width$}  {:<9}  {}",
                e.name,
                e.kind.to_string(),
                e.description
            )
        })
        .collect()
}

fn to_json(entries: &[CapabilityEntry]) -> serde_json::Value {
    entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "name": e.name,
                "kind": e.kind.to_string(),
                "description": e.description,
            })
        })
        .collect()
}
