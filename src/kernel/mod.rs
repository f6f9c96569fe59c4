//! Kernel functions and the kernel evaluators handed to the solver

pub mod linear;
pub mod rbf;
pub mod sample;
pub mod traits;

pub use self::linear::*;
pub use self::rbf::*;
pub use self::sample::*;
pub use self::traits::*;
