use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tf_cli::commands::{intervals, project, report, status, task, track};
use tf_cli::{Cli, Commands, Config, IntervalsAction, ProjectAction, TaskAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(tf_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = tf_db::Database::open(&config.database_path).with_context(|| {
        format!("failed to open {}", config.database_path.display())
    })?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init: tests may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let today = Local::now().date_naive();

    match cli.command {
        Some(Commands::Project(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                ProjectAction::Add { name, color } => {
                    project::add(&mut out, &mut db, &name, color)?;
                }
                ProjectAction::List { json } => project::list(&mut out, &db, json)?,
                ProjectAction::Edit {
                    id,
                    name,
                    color,
                    clear_color,
                } => {
                    let color = if clear_color { Some(None) } else { color.map(Some) };
                    project::edit(&mut out, &mut db, &id, name, color)?;
                }
                ProjectAction::Delete { id } => project::delete(&mut out, &mut db, &id)?,
            }
        }
        Some(Commands::Task(action)) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            match action {
                TaskAction::Add(args) => {
                    task::add(&mut out, &mut db, args, today)?;
                }
                TaskAction::List { filter, json } => {
                    let filter = filter.to_filter(config.default_range);
                    task::list(&mut out, &db, &filter, today, json)?;
                }
                TaskAction::Show { id, json } => task::show(&mut out, &db, &id, json)?,
                TaskAction::Edit(args) => {
                    task::edit(&mut out, &mut db, &args.id, args.to_update(), today)?;
                }
                TaskAction::Status { id, status } => {
                    task::set_status(&mut out, &mut db, &id, status)?;
                }
                TaskAction::Delete { id } => task::delete(&mut out, &mut db, &id)?,
            }
        }
        Some(Commands::Track(args)) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            // Ticks are printed by the tracker itself.
            drop(out);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let session = runtime.block_on(track::run(
                std::io::stdout(),
                db,
                &args.task,
                config.tick_period(),
                track::wait_for(args.duration.map(Duration::from_secs)),
            ))?;
            let mut out = std::io::stdout().lock();
            writeln!(out, "Total time: {}", tf_core::format_elapsed(session.elapsed_ms))?;
        }
        Some(Commands::Intervals(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                IntervalsAction::List { task, json } => {
                    intervals::list(&mut out, &db, task.as_ref(), json)?;
                }
                IntervalsAction::Close { id } => intervals::close(&mut out, &mut db, &id)?,
            }
        }
        Some(Commands::Report { filter, json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let filter = filter.to_filter(config.default_range);
            report::run(&mut out, &db, &filter, today, json)?;
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut out, &db, &config.database_path, Utc::now())?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
