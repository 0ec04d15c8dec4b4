/// Tracing subscriber setup.
pub mod telemetry;
/// TOML and environment configuration.
pub mod toml_config;
