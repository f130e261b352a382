use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "BINDER_LOG";
const DEFAULT_FILTER: &str = "binderapp=warn,binder=warn";
const VERBOSE_FILTER: &str = "binderapp=debug,binder=debug";

/// Picks the filter directive: `-v` wins, then `BINDER_LOG`, then the config
/// file's `log` key, then warnings only.
pub fn filter_directive(verbose: bool, env: Option<&str>, configured: Option<&str>) -> String {
    if verbose {
        return VERBOSE_FILTER.to_string();
    }
    env.or(configured)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Installs a compact stderr subscriber. Stdout stays reserved for results.
pub fn init(verbose: bool, configured: Option<&str>) {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(verbose, env.as_deref(), configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
    // A second init (tests, embedding) keeps the first subscriber
    if let Err(e) = installed {
        debug!(error = %e, "tracing subscriber already installed");
    }
}
