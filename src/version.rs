// Centralized version information

// Cargo package version from Cargo.toml
pub const CARGO_VERSION: &str = env!("CARGO_PKG_VERSION");

// Version string for logging
pub fn full_version() -> String {
    format!("v{} ({})", CARGO_VERSION, env!("CARGO_PKG_NAME"))
}
