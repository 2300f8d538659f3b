use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a stderr subscriber. `directive` (from `--log`) wins over
/// `RUST_LOG`; with neither set only warnings are shown.
pub fn init_tracing(directive: Option<&str>) {
    INIT.call_once(|| {
        let filter = match directive {
            Some(d) => EnvFilter::new(d),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_env_filter(filter)
            .init();
    });
}
