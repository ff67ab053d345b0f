pub mod download;
pub mod http_client;
#[cfg(test)]
pub mod memory;

pub use download::*;
pub use http_client::*;
