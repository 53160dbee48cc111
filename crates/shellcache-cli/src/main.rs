//! shellcache - keep the library app shell available offline.
//!
//! Maps the worker lifecycle onto commands: `install` runs the install and
//! activate events, `fetch` dispatches one request through the active
//! worker, `status` shows the cache generations on disk.

mod args;

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shellcache_core::utils::{format_bytes, truncate};
use shellcache_core::{
    CacheStorage, Config, HttpNetwork, Registry, Request, RequestKey, ResponseSource, ShellWorker,
    WorkerHost, WorkerState,
};

use args::{Command, FetchArgs};

/// Widest URL shown in the status listing
const MAX_URL_DISPLAY: usize = 60;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let command = match args::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprintln!("{}", args::USAGE);
            std::process::exit(2);
        }
    };
    if let Command::Help = command {
        println!("{}", args::USAGE);
        return Ok(());
    }

    init_tracing();

    let config = Config::load()?;
    let cache_dir = config.cache_dir()?;
    let storage = Arc::new(
        CacheStorage::new(cache_dir.clone())
            .with_context(|| format!("Failed to open cache storage at {}", cache_dir.display()))?,
    );
    let network = Arc::new(HttpNetwork::with_timeout(config.request_timeout())?);
    let worker = ShellWorker::new(storage, network, config.shell()?);
    let registry = Registry::new(cache_dir);

    match command {
        Command::Install { force } => install(worker, registry, force).await,
        Command::Fetch(fetch_args) => fetch(worker, registry, fetch_args).await,
        Command::Status => status(worker, registry).await,
        Command::Help => Ok(()),
    }
}

async fn install(worker: ShellWorker, registry: Registry, force: bool) -> Result<()> {
    let host = if force {
        WorkerHost::new(worker, registry)
    } else {
        let host = WorkerHost::restore(worker, registry)?;
        if host.state().await == WorkerState::Activated {
            eprintln!(
                "{} is already installed; use --force to fetch the shell again",
                host.worker().shell().cache_name
            );
            return Ok(());
        }
        host
    };

    let shell = host.worker().shell();
    info!(origin = %shell.origin, cache = %shell.cache_name, "Installing shell");
    let report = host
        .install()
        .await
        .with_context(|| format!("Install of {} failed", shell.cache_name))?;

    eprintln!(
        "Installed {}: {} resources cached from {}",
        report.cache_name, report.stored, shell.origin
    );
    Ok(())
}

async fn fetch(worker: ShellWorker, registry: Registry, args: FetchArgs) -> Result<()> {
    let host = WorkerHost::restore(worker, registry)?;
    let url = host
        .worker()
        .shell()
        .origin
        .join(&args.target)
        .with_context(|| format!("Invalid request target: {}", args.target))?;

    let request = Request::new(args.method, url);
    let resolved = host.dispatch_fetch(&request).await?;

    let source = match resolved.source {
        ResponseSource::Cache => "cache",
        ResponseSource::Network => "network",
    };
    eprintln!(
        "{} {} -> {} {} ({}, {})",
        request.method,
        request.url,
        resolved.response.status,
        resolved.response.status_text,
        source,
        format_bytes(resolved.response.body.len() as u64)
    );

    match args.output {
        Some(path) => std::fs::write(&path, &resolved.response.body)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&resolved.response.body)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn status(worker: ShellWorker, registry: Registry) -> Result<()> {
    let host = WorkerHost::restore(worker, registry)?;
    let shell = host.worker().shell();
    let storage = host.worker().storage();

    println!("Origin:   {}", shell.origin);
    println!("Storage:  {}", storage.root().display());
    println!("Worker:   {} ({})", shell.cache_name, host.state().await);
    match host.registration()? {
        Some(registration) => println!(
            "Active:   {} (activated {})",
            registration.cache_name,
            registration.age_display()
        ),
        None => println!("Active:   none"),
    }

    let generations = storage.keys()?;
    println!();
    println!("Cache generations:");
    if generations.is_empty() {
        println!("  (none)");
    }
    for name in &generations {
        let cache = storage.open(name).await?;
        let marker = if *name == shell.cache_name { "*" } else { " " };
        let note = if *name == shell.cache_name {
            ""
        } else {
            "  (stale, not removed)"
        };
        println!("{} {} - {} entries{}", marker, name, cache.len().await, note);
    }

    if let Some(cache) = storage.get(&shell.cache_name).await? {
        println!();
        println!("Entries in {}:", shell.cache_name);
        for entry in cache.entries().await {
            println!(
                "  {:<width$} {:>3} {:>10}  {}",
                truncate(entry.key.as_str(), MAX_URL_DISPLAY),
                entry.status,
                format_bytes(entry.body_len),
                entry.age_display(),
                width = MAX_URL_DISPLAY
            );
        }

        let stored: HashSet<RequestKey> = cache.keys().await.into_iter().collect();
        let missing: Vec<String> = shell
            .resources
            .resolve(&shell.origin)?
            .into_iter()
            .filter(|(_, url)| !stored.contains(&RequestKey::from_url(url)))
            .map(|(path, _)| path)
            .collect();
        if !missing.is_empty() {
            println!();
            println!("Shell resources not cached: {}", missing.join(", "));
        }
    }

    Ok(())
}
