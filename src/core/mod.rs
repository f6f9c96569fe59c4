//! Core types and traits shared by the solver, the kernels and the driver

pub mod error;
pub mod traits;
pub mod types;

pub use self::error::*;
pub use self::traits::*;
pub use self::types::*;
