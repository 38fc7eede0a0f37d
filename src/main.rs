mod cli;

use userstore::{
    config::{self, Config},
    runner::{self, RunOptions},
    script::{self, Script},
};
use userstore_db::{queries::users, Session};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, SessionArgs};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag.
    // Logs go to stderr so stdout carries only query results.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "userstore=debug,userstore_db=debug,userstore_common=debug".to_string()
        } else {
            "userstore=info,userstore_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db.as_deref() {
        config.store.path = config::expand_path(db);
    }

    match cli.command {
        None => {
            let script = Script::from_names(&config.script.steps)?;
            run_script(&config, script, &SessionArgs::default())
        }
        Some(Commands::Run {
            steps,
            file,
            walkthrough,
            session,
        }) => {
            let script = if let Some(file) = file {
                load_sql_file(&file)?
            } else if walkthrough {
                Script::full_walkthrough()
            } else if !steps.is_empty() {
                Script::from_names(&steps)?
            } else {
                Script::from_names(&config.script.steps)?
            };
            run_script(&config, script, &session)
        }
        Some(Commands::Exec { sql, session }) => {
            let script = Script::from_sql(&sql)?;
            run_script(&config, script, &session)
        }
        Some(Commands::List { json }) => list_users(&config, json),
        Some(Commands::Steps) => {
            for entry in script::CATALOG {
                println!("{:<20} {}", entry.name, entry.description);
            }
            Ok(())
        }
        Some(Commands::Version) => {
            println!("userstore {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_sql_file(path: &Path) -> Result<Script> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read SQL file: {:?}", path))?;
    let script = Script::from_sql(&text)
        .with_context(|| format!("Failed to parse SQL file: {:?}", path))?;
    Ok(script)
}

fn run_script(config: &Config, script: Script, args: &SessionArgs) -> Result<()> {
    let policy = args.on_uncommitted.unwrap_or(config.session.on_uncommitted);
    let options = RunOptions {
        commit_after_mutations: args.autocommit || config.session.commit_after_mutations,
        format: args.format.unwrap_or(config.script.format),
    };

    tracing::info!("Opening store {:?}", config.store.path);
    tracing::debug!("Script: {}", script);

    let session = Session::open(&config.store.path, policy)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    runner::run_script(session, &script, &options, &mut out)
        .with_context(|| format!("Run against {:?} failed", config.store.path))?;

    Ok(())
}

fn list_users(config: &Config, json: bool) -> Result<()> {
    let session = Session::open(&config.store.path, config.session.on_uncommitted)?;
    let users = users::list_users(&session)?;
    session.close()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<32} {:<12} {}",
        "ID", "NAME", "EMAIL", "SIGNUP", "PHONE"
    );
    for user in &users {
        println!(
            "{:<6} {:<24} {:<32} {:<12} {}",
            user.id,
            user.name,
            user.email,
            user.signup_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            user.phone_number.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}
