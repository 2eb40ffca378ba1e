pub mod api;
pub mod core;

/// Installs the process logger. `RUST_LOG` overrides the default level;
/// calling it twice is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .try_init();
}
