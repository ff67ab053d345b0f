pub mod in_use;

pub use in_use::*;
