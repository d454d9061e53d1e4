use tracing_subscriber::EnvFilter;

/// Route the crate's tracing output through the test harness. Filtered by
/// `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
