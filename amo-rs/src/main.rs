//! Main entry point for the amo-rs CLI

use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use clap_complete::{Generator, generate};
use std::io;

use amo_rs::cli::{Cli, Commands};
use amo_rs::commands;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set verbosity
    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    // Execute command
    match cli.command {
        Commands::Info {
            file,
            detailed,
            json,
        } => commands::model::handle_info(&file, detailed, json),
        Commands::Tree {
            file,
            depth,
            no_color,
        } => commands::model::handle_tree(&file, depth, no_color),
        Commands::Validate {
            file,
            strict,
            warnings,
        } => commands::model::handle_validate(&file, strict, warnings),
        Commands::Sample {
            file,
            animation,
            time,
            object,
        } => commands::model::handle_sample(&file, &animation, time, object.as_deref()),
        Commands::Completions { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}
