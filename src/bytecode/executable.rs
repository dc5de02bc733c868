use serde::{Deserialize, Serialize};

use crate::bytecode::op::{Address, Op};

/// An assembled program: resolved instructions plus the generator
/// annotations, each attached to the address of the instruction it precedes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Executable {
    pub ops: Vec<Op>,
    pub notes: Vec<(Address, String)>,
}

impl Executable {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            notes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::op::DebugMode;

    #[test]
    fn test_binary_encoding_keeps_notes() {
        let exe = Executable {
            ops: vec![
                Op::Call(2),
                Op::Halt,
                Op::Const(-7),
                Op::Debug(DebugMode::Num),
                Op::Return,
            ],
            notes: vec![(2, "rout main".into())],
        };
        let bytes = exe.to_bytes().unwrap();
        assert_eq!(Executable::from_bytes(&bytes).unwrap(), exe);
    }

    #[test]
    fn test_truncated_bytes_fail() {
        let exe = Executable::new(vec![Op::Const(1_000_000), Op::Halt]);
        let bytes = exe.to_bytes().unwrap();
        assert!(Executable::from_bytes(&bytes[..bytes.len() - 2]).is_err());
    }
}
