use axum::{
    routing::{get, post},
    Extension, Router,
};
use calc_cluster::config::{self, Config, Mode, StrategyKind};
use calc_cluster::dispatch::dispatcher::{Dispatcher, RegistryWorkerSource, WORKER_NAME_PREFIX};
use calc_cluster::dispatch::trusting::TrustingStrategy;
use calc_cluster::dispatch::verifying::VerifyingStrategy;
use calc_cluster::registry::client::{RegisterError, RegistryClient};
use calc_cluster::registry::handlers::{
    handle_list, handle_lookup, handle_register, handle_unregister,
};
use calc_cluster::registry::protocol::{
    ENDPOINT_LIST, ENDPOINT_LOOKUP, ENDPOINT_REGISTER, ENDPOINT_UNREGISTER,
};
use calc_cluster::registry::service::{NameRegistry, CALCULATOR_KIND};
use calc_cluster::worker::calculator::Calculator;
use calc_cluster::worker::handlers::{handle_capacity, handle_execute};
use calc_cluster::worker::protocol::{ENDPOINT_CAPACITY, ENDPOINT_EXECUTE};

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use uuid::Uuid;

const REGISTER_NAME_ATTEMPTS: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = match Config::parse(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", config::usage(&args[0]));
            std::process::exit(1);
        }
    };

    match config.mode {
        Mode::Dispatcher => run_dispatcher(config).await,
        Mode::Worker => run_worker(config).await,
    }
}

/// Hosts the name registry and reads task file paths on stdin, running one
/// whole calculation per file.
async fn run_dispatcher(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(NameRegistry::new());

    let app = Router::new()
        .route(ENDPOINT_REGISTER, post(handle_register))
        .route(ENDPOINT_UNREGISTER, post(handle_unregister))
        .route(ENDPOINT_LIST, get(handle_list))
        .route(&format!("{}/:name", ENDPOINT_LOOKUP), get(handle_lookup))
        .layer(Extension(registry.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("Registry listening on {}", config.bind);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Registry server failed: {}", e);
        }
    });

    tracing::info!("Dispatching with the {:?} strategy", config.strategy);

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("Operations file: ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let path = line.trim();
        if path.is_empty() {
            continue;
        }

        let reader = match File::open(path) {
            Ok(file) => BufReader::new(file),
            Err(e) => {
                eprintln!("Cannot open {}: {}", path, e);
                continue;
            }
        };

        // A fresh dispatcher per file: a fatally failed calculation may leave
        // batches in flight that must not leak into the next one.
        let result = match config.strategy {
            StrategyKind::Trusting => {
                let source = RegistryWorkerSource::new(registry.clone());
                Dispatcher::new(source, TrustingStrategy::new())
                    .calculate_operations(reader)
                    .await
            }
            StrategyKind::Verifying => {
                let source = RegistryWorkerSource::new(registry.clone());
                Dispatcher::new(source, VerifyingStrategy::new())
                    .calculate_operations(reader)
                    .await
            }
        };

        match result {
            Ok(value) => println!("Result: {}", value),
            Err(e) => eprintln!("Calculation failed: {}", e),
        }
    }

    Ok(())
}

/// Serves batch executions and binds this worker in the dispatcher's registry
/// under a fresh random name, unbinding it again on Ctrl+C.
async fn run_worker(config: Config) -> anyhow::Result<()> {
    let registry_addr = config
        .registry
        .ok_or_else(|| anyhow::anyhow!("worker mode needs a registry address"))?;

    let calculator = Arc::new(Calculator::new(
        config.capacity,
        config.dishonest_percent as f32,
    ));

    let app = Router::new()
        .route(ENDPOINT_EXECUTE, post(handle_execute))
        .route(ENDPOINT_CAPACITY, get(handle_capacity))
        .layer(Extension(calculator));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    let local_addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Worker server failed: {}", e);
        }
    });

    let client = RegistryClient::new(registry_addr);
    let mut bound_name: Option<String> = None;
    for _ in 0..REGISTER_NAME_ATTEMPTS {
        let name = format!("{}{}", WORKER_NAME_PREFIX, Uuid::new_v4());
        match client.register(&name, local_addr, CALCULATOR_KIND).await {
            Ok(()) => {
                bound_name = Some(name);
                break;
            }
            Err(RegisterError::AlreadyBound) => {
                tracing::warn!("Name {} was taken; drawing another", name);
            }
            Err(RegisterError::Unreachable(reason)) => {
                anyhow::bail!("could not reach the registry at {}: {}", registry_addr, reason);
            }
        }
    }
    let name = bound_name
        .ok_or_else(|| anyhow::anyhow!("no free name after {} draws", REGISTER_NAME_ATTEMPTS))?;

    tracing::info!(
        "Worker {} serving on {} (capacity {}, dishonest {}%)",
        name,
        local_addr,
        config.capacity,
        config.dishonest_percent
    );
    tracing::info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down; unbinding {}", name);
    if let Err(e) = client.unregister(&name).await {
        tracing::warn!("Could not unbind {}: {}", name, e);
    }

    Ok(())
}
