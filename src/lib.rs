pub mod config;
pub mod dual;
pub mod engine;
pub mod error;
pub mod fs;
pub mod options;

pub use config::BenchConfig;
pub use dual::{DualCall, DualFn, Impls, Mode};
pub use error::{DualError, Result};
