//! LaRank solver: working set, per-class dual state and the step logic

pub mod larank;
pub mod output;
pub mod patterns;

pub use self::larank::*;
pub use self::output::*;
pub use self::patterns::*;
