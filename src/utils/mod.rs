use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber once and emits a startup info
/// log. Logs go to stderr so report output on stdout stays clean.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "raccoon=info".parse() {
            filter = filter.add_directive(directive);
        }

        // An embedding application may have installed its own subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        tracing::info!("Raccoon tracing initialized.");
    });
}
