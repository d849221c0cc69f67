pub mod error;
pub mod types;
pub mod version;

pub use error::{ClusterError, Result};
pub use types::*;
pub use version::*;
