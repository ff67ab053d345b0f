pub mod constants;
pub mod coordinate;
pub mod orchestrator;
pub mod report;
pub mod request;

pub use coordinate::*;
pub use orchestrator::*;
pub use report::*;
pub use request::*;
