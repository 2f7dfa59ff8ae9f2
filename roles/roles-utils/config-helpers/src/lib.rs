mod toml;
pub use toml::duration_from_toml;

pub mod logging;
