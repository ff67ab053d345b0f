pub mod backup;
pub mod locator;
pub mod replacer;

pub use backup::*;
pub use locator::*;
pub use replacer::*;
