//! Command handlers behind the CLI: assemble the configuration, run a use case,
//! print plans and results, and ask for confirmation where a change is destructive.

mod add;
pub mod config;
mod list;
mod remove;
mod upgrade;

pub use add::{AddOptions, add};
pub use config::{Config, Settings};
pub use list::list;
pub use remove::remove;
pub use upgrade::upgrade;
