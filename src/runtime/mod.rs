//! Bytecode virtual machine and its heap allocator.

pub mod heap;
pub mod runtime_error;
pub mod vm;

pub use runtime_error::{Fault, RuntimeError};
pub use vm::{Exit, Vm, VmConfig};
