use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test logging in a thread-safe way.
/// Safe to call from every test; the subscriber is installed only once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "debug".into()),
            )
            .with_test_writer()
            .finish();

        // Another harness may already have installed one.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
