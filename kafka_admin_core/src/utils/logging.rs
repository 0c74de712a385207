use log::LevelFilter;

/// Initialize logging using env_logger.
/// Defaults to `info`; the RUST_LOG environment variable overrides it,
/// e.g. `RUST_LOG=kafka_admin_core=debug kafka-admin list`.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
