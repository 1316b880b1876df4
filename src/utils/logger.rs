use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "client_registry=debug,info"
    } else {
        "client_registry=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Everything goes to stderr; stdout is reserved for JSON reports.
pub fn init_logger(verbose: bool, json: bool) {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(env_filter(verbose));

    if json {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer.compact()).init();
    }
}
