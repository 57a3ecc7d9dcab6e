//! Config module.
//! Provides configuration types, default paths and XML loading for the binary.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor, CONFIG_ENV};
pub use types::{parse_octal_mode, Config, LogLevel};
pub use xml::{create_template_config, load_config, load_config_from_xml_path, parse_config_xml, LoadResult};
