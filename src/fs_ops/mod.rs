//! Filesystem primitives behind the replacer: staging names, exclusive
//! creation, the rename step, and orphan sweeping.

mod atomic;
pub mod helpers;
mod staging;
mod sweep;
mod util;

pub(crate) use atomic::replace_file;
pub use helpers::{hint, io_error_with_help, io_error_with_help_io};
pub(crate) use staging::create_exclusive;
pub use staging::{is_staging_name, parse_staging_name, staging_path_for, STAGING_SUFFIX_LEN};
pub use sweep::{sweep_orphans, SweepOptions, SweepReport, DEFAULT_MIN_AGE};
pub(crate) use util::{is_cross_device, parent_or_cwd};
