use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use hugo_formats::ActionTable;

/// Inspect the action lists stored in a Hugo script resource.
#[derive(Parser)]
struct Args {
    /// Path to the action list section
    path: PathBuf,

    /// Number of game variants stored back to back in the section
    #[arg(long, default_value_t = 1)]
    variants: usize,

    /// Variant to decode
    #[arg(long, default_value_t = 0)]
    variant: usize,

    /// Print the decoded table as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let table = ActionTable::open(&args.path, args.variants, args.variant)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    println!(
        "{} action lists in variant {} of {}",
        table.len(),
        args.variant,
        args.path.display()
    );
    for (id, list) in table.lists().iter().enumerate() {
        println!("list {id:>4}  {} actions", list.len());
        for action in list.body() {
            println!(
                "  {tag:>10}  t+{timer:<5} {opcode:?}",
                tag = action.tag.to_string(),
                timer = action.timer,
                opcode = action.opcode()
            );
        }
    }
    Ok(())
}
