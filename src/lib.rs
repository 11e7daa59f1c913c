pub mod config;
pub mod scanner;
pub mod transport;
pub mod remote;
pub mod error;
pub mod engine;
pub mod server;

pub use error::DeployError;
pub type Result<T> = std::result::Result<T, DeployError>;
