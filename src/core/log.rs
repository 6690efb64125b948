use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// `RUST_LOG` wins when set; otherwise the crate logs at `info` (or `debug`
/// with `verbose`) and everything else at `warn`.
pub fn init_logging(verbose: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(build_filter(env_directives.as_deref(), verbose))
        .init();
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,cotacao=debug"
    } else {
        "warn,cotacao=info"
    }
}

fn build_filter(env_directives: Option<&str>, verbose: bool) -> EnvFilter {
    env_directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)))
}
