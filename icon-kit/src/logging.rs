use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber shared by the command line tools.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or progress
/// messages as well with `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
