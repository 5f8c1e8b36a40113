/// Re-export `Config` from `footfall-core` for use within this crate.
///
/// All environment-variable parsing lives in `footfall-core` so it can be
/// shared with integration tests and future crates without depending on the
/// full server.
pub use footfall_core::config::Config;
