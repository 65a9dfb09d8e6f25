pub mod input;
pub mod output;
pub mod transcriber;

pub use input::*;
pub use output::*;
pub use transcriber::*;
