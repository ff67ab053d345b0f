pub mod config;
pub mod logging;
pub mod process;
pub mod remote;

pub use config::*;
pub use logging::*;
pub use process::*;
pub use remote::*;
