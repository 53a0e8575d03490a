// Functions are organized by categories
pub mod calculus;
pub mod math;

pub use calculus::*;
pub use math::*;
