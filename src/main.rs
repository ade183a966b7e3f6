use std::{env, sync::Arc};

use colored::Colorize;
use log::{error, info, warn};
use thiserror::Error;
use tokio::runtime::{self, Runtime};
use wayfarer_collab::{DatabaseError, MemoryDatabase, PgDatabase, Planner, PlannerOptions};
use wayfarer_core::ArcedCache;
use wayfarer_impls::{FileCache, MemoryCache};
use wayfarer_server::{run_server, DEFAULT_PORT};

mod logging;

const PORT_VAR: &str = "WAYFARER_SERVER_PORT";
const DATABASE_URL_VAR: &str = "WAYFARER_DATABASE_URL";
const CACHE_DIR_VAR: &str = "WAYFARER_CACHE_DIR";

pub struct Wayfarer {
    planner: Planner,
    port: u16,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum WayfarerError {
    #[error("Could not initialize database: {0}")]
    Database(#[from] DatabaseError),

    #[error("Could not open the cache directory: {0}")]
    Cache(std::io::Error),

    #[error("WAYFARER_SERVER_PORT is not a valid port: {0}")]
    InvalidPort(String),

    #[error("Server stopped: {0}")]
    Server(std::io::Error),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Wayfarer {
    fn new() -> Result<Self, WayfarerError> {
        info!("Building async runtime...");
        let main_runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("wayfarer-async")
            .build()
            .map_err(|e| WayfarerError::Fatal(e.to_string()))?;

        let port = match env::var(PORT_VAR) {
            Ok(value) => value
                .parse()
                .map_err(|_| WayfarerError::InvalidPort(value))?,
            Err(_) => DEFAULT_PORT,
        };

        let options = PlannerOptions {
            cache: open_cache()?,
            ..Default::default()
        };

        let planner = match env::var(DATABASE_URL_VAR) {
            Ok(url) => {
                info!("Connecting to database...");

                let database = main_runtime.block_on(async {
                    let database = PgDatabase::new(&url).await?;
                    database.migrate().await?;

                    Ok::<_, DatabaseError>(database)
                })?;

                Planner::new(database, options)
            }
            Err(_) => {
                warn!(
                    "{} is not set, plans will only be kept in memory",
                    DATABASE_URL_VAR
                );
                Planner::new(MemoryDatabase::new(), options)
            }
        };

        Ok(Self {
            planner,
            port,
            runtime: main_runtime,
        })
    }

    fn run(self) -> Result<(), WayfarerError> {
        let Self {
            planner,
            port,
            runtime,
        } = self;

        runtime
            .block_on(run_server(planner, port))
            .map_err(WayfarerError::Server)
    }
}

fn open_cache() -> Result<ArcedCache, WayfarerError> {
    match env::var(CACHE_DIR_VAR) {
        Ok(directory) => {
            let cache = FileCache::open(&directory).map_err(WayfarerError::Cache)?;
            info!("Caching to {}", cache.directory().display());

            Ok(Arc::new(cache))
        }
        Err(_) => Ok(Arc::new(MemoryCache::new())),
    }
}

impl WayfarerError {
    fn hint(&self) -> String {
        match self {
            WayfarerError::Database(_) => format!("This is a database error. Make sure {DATABASE_URL_VAR} points to a running PostgreSQL instance, or unset it to keep plans in memory."),
            WayfarerError::Cache(_) => format!("Make sure {CACHE_DIR_VAR} is a directory wayfarer can write to."),
            WayfarerError::InvalidPort(_) => format!("Set {PORT_VAR} to a number between 1 and 65535, or unset it to use {DEFAULT_PORT}."),
            WayfarerError::Server(_) => "The port might already be in use by another program.".to_string(),
            WayfarerError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn main() {
    logging::init_logger();

    let result = Wayfarer::new().and_then(|wayfarer| {
        info!("Initialized successfully.");
        wayfarer.run()
    });

    if let Err(error) = result {
        error!("{} Read the error below to troubleshoot the issue. If you think this might be a bug, please report it by making a GitHub issue.", "Wayfarer failed to start!".bold().red());
        error!("{}", error);
        error!(
            "{}",
            format!("Hint: {}", error.hint()).dimmed().italic()
        );
    }
}
