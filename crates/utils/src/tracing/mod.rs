use tether_core::TETHER_LOG_VAR;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Default directive when neither `TETHER_LOG` nor `RUST_LOG` is set
const DEFAULT_FILTER: &str = "info";

/// Initialize the tracing system
///
/// Reads the filter from `TETHER_LOG`, then `RUST_LOG`, falling back to
/// `info`, and writes compact lines to stderr. Fails if a global subscriber
/// is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let directives = std::env::var(TETHER_LOG_VAR)
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    init_with_filter(&directives)
}

/// Initialize the tracing system with explicit filter directives
pub fn init_with_filter(
    directives: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_new(directives)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}
