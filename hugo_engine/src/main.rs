use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use hugo_engine::{
    ActionTable, Clock, HostEvent, SandboxHost, Scheduler, SchedulerConfig, TickReport,
};
use serde::Serialize;

mod cli;

#[derive(Serialize)]
struct TraceManifest<'a> {
    release: String,
    ticks: &'a [TickReport],
    host_events: &'a [HostEvent],
}

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::parse()?;

    let mut config = SchedulerConfig::from_json_file(args.config.as_deref())?;
    if let Some(release) = args.release {
        config.release = release;
    }
    if let Some(variants) = args.variants {
        config.variant_count = variants;
    }
    if args.variant.is_some() {
        config.variant = args.variant;
    }

    let table = ActionTable::open(&args.script, config.variant_count, config.variant())
        .with_context(|| format!("loading action script {}", args.script.display()))?;
    eprintln!(
        "[hugo_engine] {} action lists loaded for {} (section {})",
        table.len(),
        config.release,
        config.variant()
    );

    let mut scheduler = Scheduler::new(&config, table)
        .context("building scheduler")?
        .with_clock(Clock::manual(args.start_tick));
    if let Some(list) = args.maze_list {
        scheduler = scheduler.with_maze_list(list);
    }
    let mut host = SandboxHost::new();

    if let Some(path) = &args.restore {
        let file = File::open(path)
            .with_context(|| format!("opening save file {}", path.display()))?;
        scheduler
            .restore(&mut BufReader::new(file))
            .with_context(|| format!("restoring {}", path.display()))?;
        eprintln!(
            "[hugo_engine] restored {} pending events from {}",
            scheduler.queue().len(),
            path.display()
        );
    }
    if let Some(screen) = args.start_screen {
        scheduler
            .new_screen(&mut host, screen)
            .with_context(|| format!("entering screen {screen}"))?;
    }
    if let Some(list) = args.start_list {
        scheduler
            .insert_action_list(list)
            .with_context(|| format!("scheduling start list {list}"))?;
    }

    let mut reports = Vec::with_capacity(args.ticks as usize);
    for _ in 0..args.ticks {
        let seen = host.events().len();
        let report = scheduler.run(&mut host)?;
        for dispatched in &report.dispatched {
            println!(
                "tick {:>6}  {:<10} {:?}",
                report.tick,
                dispatched.action.to_string(),
                dispatched.opcode
            );
        }
        if args.verbose {
            for event in &host.events()[seen..] {
                println!("             -> {event:?}");
            }
        }
        reports.push(report);
        scheduler.clock_mut().advance(1);
    }

    let dispatched: usize = reports.iter().map(|report| report.dispatched.len()).sum();
    eprintln!(
        "[hugo_engine] {} ticks run, {} actions dispatched, {} events pending",
        args.ticks,
        dispatched,
        scheduler.queue().len()
    );

    if let Some(path) = &args.save {
        let file = File::create(path)
            .with_context(|| format!("creating save file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        scheduler
            .save(&mut writer)
            .with_context(|| format!("writing save file {}", path.display()))?;
        writer.flush()?;
        eprintln!("[hugo_engine] saved game to {}", path.display());
    }

    if let Some(path) = &args.trace_json {
        let manifest = TraceManifest {
            release: config.release.to_string(),
            ticks: &reports,
            host_events: host.events(),
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(path, json)
            .with_context(|| format!("writing trace json {}", path.display()))?;
        eprintln!("[hugo_engine] trace written to {}", path.display());
    }

    Ok(())
}
