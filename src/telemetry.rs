use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// HTTP internals that drown out the search flow at `debug`.
const QUIET_TARGETS: &[&str] = &["hyper", "reqwest", "h2", "rustls"];

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("HOME_SCOUT_LOG_LEVEL '{value}' is not a usable tracing filter")]
    Filter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("could not install the log subscriber: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Turns the configured log setting into filter directives.
///
/// A bare level such as `debug` applies to everything except the HTTP
/// stack, which stays at `warn`. Anything else is taken as a full
/// `EnvFilter` directive string.
fn directives(log_level: &str) -> String {
    let log_level = log_level.trim();
    match log_level.parse::<LevelFilter>() {
        Ok(level) => {
            let level = level.to_string().to_ascii_lowercase();
            let mut parts = vec![level];
            parts.extend(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)));
            parts.join(",")
        }
        Err(_) => log_level.to_string(),
    }
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(directives(&config.log_level)).map_err(|source| TelemetryError::Filter {
        value: config.log_level.clone(),
        source,
    })
}

/// Installs the global subscriber on stderr so stdout stays free for
/// results. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)?;

    debug!("Logging at '{}'", config.log_level);
    Ok(())
}
