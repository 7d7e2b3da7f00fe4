//! Configuration for the georama pipeline.
//!
//! Configuration is environment-driven: every recognized option is read from
//! a `GEORAMA_*` variable at program start and threaded through constructors
//! as a [`Settings`] value. There are no mutable globals; components receive
//! the sections they need (paths, index, GDAL tuning, URL templates) and keep
//! their own copy.
//!
//! # Example
//!
//! ```
//! use georama::config::Settings;
//!
//! let settings = Settings::from_env();
//! assert!(!settings.index.index_name.is_empty());
//! ```

mod defaults;
mod parser;
mod settings;

pub use parser::from_map;
pub use settings::{
    DatabaseSettings, GdalSettings, IndexSettings, PathSettings, Settings, TemplateSettings,
};

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// Unset variables fall back to the documented defaults; no value is
    /// required for the pipeline to start, though the defaults only make
    /// sense for local development.
    pub fn from_env() -> Self {
        let vars = std::env::vars().collect();
        from_map(&vars)
    }
}
