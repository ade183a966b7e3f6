use std::{env, fmt::Display, str::FromStr};

use colored::Colorize;
use log::{Level, LevelFilter};

/// Overrides how verbose wayfarer's own crates are, e.g. `debug`
const LEVEL_VAR: &str = "WAYFARER_LOG_LEVEL";

const LOCAL_CRATES: [&str; 5] = [
    "wayfarer",
    "wayfarer_core",
    "wayfarer_collab",
    "wayfarer_impls",
    "wayfarer_server",
];

pub fn init_logger() {
    let local_level = env::var(LEVEL_VAR)
        .ok()
        .and_then(|value| LevelFilter::from_str(&value).ok())
        .unwrap_or(LevelFilter::Info);

    // External crates only need to log warnings and errors
    let dispatch = LOCAL_CRATES.into_iter().fold(
        fern::Dispatch::new().level(LevelFilter::Warn),
        |dispatch, name| dispatch.level_for(name, local_level),
    );

    let result = dispatch
        .format(|out, message, record| {
            out.finish(format_args!(
                "{:^5} {} {:^8} {}",
                badge(record.level()),
                chrono::Local::now().format("%H:%M:%S").to_string().bright_black(),
                Target::from_module(record.target()),
                message
            ))
        })
        .chain(std::io::stdout())
        .apply();

    // Only fails if a logger is already installed, which then stays in use
    if let Err(e) = result {
        eprintln!("Could not initialize logging: {}", e);
    }
}

#[derive(Debug, PartialEq)]
enum Target {
    External(String),
    Main,
    Server,
    Collab,
    Impls,
    Core,
}

impl Target {
    fn from_module(path: &str) -> Self {
        match path.split("::").next().unwrap_or_default() {
            "wayfarer" => Self::Main,
            "wayfarer_core" => Self::Core,
            "wayfarer_server" => Self::Server,
            "wayfarer_collab" => Self::Collab,
            "wayfarer_impls" => Self::Impls,
            other => Self::External(other.to_string()),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Target::External(name) => name.as_str().clear(),
            Target::Main => "MAIN".bright_white(),
            Target::Server => "SERVER".bright_green(),
            Target::Collab => "COLLAB".bright_purple(),
            Target::Impls => "IMPLS".cyan(),
            Target::Core => "CORE".blue(),
        };

        Display::fmt(&label, f)
    }
}

fn badge(level: Level) -> String {
    match level {
        Level::Error => " ERR ".black().on_red().bold().to_string(),
        Level::Warn => " WRN ".black().on_yellow().bold().to_string(),
        Level::Info => " INF ".black().on_blue().bold().to_string(),
        Level::Debug => " DBG ".white().on_black().to_string(),
        Level::Trace => " TRC ".to_string(),
    }
}
