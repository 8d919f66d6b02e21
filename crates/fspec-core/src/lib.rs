pub mod collection;
pub mod context;
pub mod epic;
pub mod error;
pub mod event_storm;
pub mod feature_file;
pub mod foundation;
pub mod graph;
pub mod io;
pub mod migrations;
pub mod paths;
pub mod prefix;
pub mod status;
pub mod tags;
pub mod types;
pub mod workunit;

pub use context::ProjectContext;
pub use error::{FspecError, Result};
