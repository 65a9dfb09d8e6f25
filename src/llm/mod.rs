pub mod backend;
pub mod client;
pub mod config;
pub mod gateway;
pub mod http;
pub mod openai;
pub mod oracle;
pub mod prompts;
#[cfg(test)]
pub(crate) mod testing;

pub use backend::*;
pub use client::*;
pub use config::*;
pub use gateway::*;
pub use openai::*;
pub use oracle::*;
pub use prompts::*;
