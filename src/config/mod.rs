//! Layered configuration resolution.
//!
//! A [`Schema`] declares every key with its default (and therefore its type).
//! [`ConfigLoader`] resolves a [`Settings`] from these tiers, lowest priority
//! first:
//! 1. **Defaults** - the schema itself
//! 2. **Environment** - `<SOFTWARE>_<KEY>` variables bound in [`Bindings`]
//! 3. **Dotenv** - unprefixed `<KEY>` variables, from a `.env` file in
//!    development and container modes
//! 4. **System** - the system configuration file, or the file given with `--conf`
//! 5. **User** - the per-user configuration file
//! 6. **Command line** - flags actually supplied by the user
//!
//! ## Merge Strategy
//! - Each tier overrides only the leaves it provides; silence keeps lower tiers
//! - Every accepted value is coerced to the type of its schema default
//! - Template sections accept members named by any tier

mod bindings;
mod coerce;
mod loader;
mod merge;
mod persist;
mod schema;
mod settings;
mod sources;

pub use bindings::{Bindings, CliBinding, SourceBinding};
pub use coerce::coerce;
pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{ConfigTree, merge};
pub use persist::{filter_internal, render, write_file};
pub use schema::{INTERNAL_SECTION, Schema, SchemaNode, split_key};
pub use settings::Settings;
pub use sources::{CliOverrides, CliSource, EnvSnapshot, EnvSource, FileSource, Source};
