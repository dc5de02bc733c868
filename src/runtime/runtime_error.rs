use thiserror::Error;

use crate::bytecode::op::Address;

/// What went wrong while executing one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("memory access out of bounds at {0}")]
    OutOfBounds(i64),

    #[error("stack underflow")]
    StackUnderflow,

    #[error("stack grew into the heap (top {0})")]
    StackOverflow(i64),

    #[error("heap exhausted allocating {0} cells")]
    HeapExhausted(i64),

    #[error("invalid block size {0}")]
    InvalidSize(i64),

    #[error("execution step limit exceeded ({0})")]
    StepLimit(u64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot write debug output: {0}")]
    Output(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("runtime error at {pc}: {fault}")]
pub struct RuntimeError {
    /// Address of the faulting instruction.
    pub pc: Address,
    pub fault: Fault,
}

impl RuntimeError {
    pub fn new(pc: Address, fault: Fault) -> Self {
        RuntimeError { pc, fault }
    }
}

impl From<std::io::Error> for Fault {
    fn from(e: std::io::Error) -> Self {
        Fault::Output(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_pc() {
        let err = RuntimeError::new(7, Fault::OutOfBounds(-1));
        assert_eq!(
            err.to_string(),
            "runtime error at 7: memory access out of bounds at -1"
        );
    }

    #[test]
    fn test_heap_exhausted_display() {
        let err = RuntimeError::new(3, Fault::HeapExhausted(100));
        assert!(err.to_string().contains("heap exhausted allocating 100 cells"));
    }
}
