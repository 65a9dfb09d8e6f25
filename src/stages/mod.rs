pub mod categorize;
pub mod consultant;
pub mod evidence;
pub mod pipeline;
pub mod voting;

pub use categorize::*;
pub use consultant::*;
pub use evidence::*;
pub use pipeline::*;
pub use voting::*;
