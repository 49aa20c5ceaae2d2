pub mod filter;
pub mod page;
pub mod paper;
pub mod recommendation;

pub use filter::*;
pub use page::*;
pub use paper::*;
pub use recommendation::*;
