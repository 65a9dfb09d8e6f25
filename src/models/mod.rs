pub mod checklist;
pub mod report;
pub mod transcript;
pub mod verdict;

pub use checklist::*;
pub use report::*;
pub use transcript::*;
pub use verdict::*;
