use serde::{Deserialize, Serialize};

/// Index of an instruction in an assembled executable.
pub type Address = usize;

/// Output mode of the `debug` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugMode {
    /// Accumulator as a decimal integer.
    Num,
    /// Accumulator as a character, followed by a newline.
    Char,
    /// Accumulator as a character.
    Raw,
    /// Null-terminated block starting at the accumulator.
    Str,
}

impl DebugMode {
    pub fn name(self) -> &'static str {
        match self {
            DebugMode::Num => "num",
            DebugMode::Char => "char",
            DebugMode::Raw => "raw",
            DebugMode::Str => "str",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "num" => DebugMode::Num,
            "char" => DebugMode::Char,
            "raw" => DebugMode::Raw,
            "str" => DebugMode::Str,
            _ => return None,
        })
    }
}

/// Symbolic jump/call target, resolved during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A label, scoped to the routine that defines it.
    Label { routine: String, name: String },
    Routine(String),
}

impl Target {
    pub fn label(routine: &str, name: &str) -> Self {
        Target::Label {
            routine: routine.to_string(),
            name: name.to_string(),
        }
    }

    pub fn routine(name: &str) -> Self {
        Target::Routine(name.to_string())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Label { routine, name } => write!(f, "{}:{}", routine, name),
            Target::Routine(name) => write!(f, "{}", name),
        }
    }
}

// =============================================================================
// OP - Bytecode instructions
// =============================================================================

/// One VM instruction. `T` is the operand type of control transfers:
/// `Target` while generating, `Address` once assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op<T = Address> {
    // accumulator
    Const(i64),
    Add,
    Sub,
    Mul,

    // comparison, 0/1 result
    Greater,
    Lesser,
    GreaterEq,
    LesserEq,
    Equal,
    NotEqual,

    // bitwise logic
    BitAnd,
    BitOr,
    Truth,
    Inc,
    Dec,

    // stack and frame
    Push,
    Pull,
    Peek(i64),
    Load(i64),
    Store(i64),

    // control flow
    Jump(T),
    /// Jump when the accumulator is nonzero.
    Branch(T),
    Call(T),
    Return,

    // memory
    Alloc(i64),
    Free(i64),
    Trans,
    Pers,
    Void,
    Deref,
    Ref,

    Debug(DebugMode),
    Halt,
}

impl<T> Op<T> {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Const(_) => "const",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Greater => "greater",
            Op::Lesser => "lesser",
            Op::GreaterEq => "gequal",
            Op::LesserEq => "lequal",
            Op::Equal => "equal",
            Op::NotEqual => "nequal",
            Op::BitAnd => "and",
            Op::BitOr => "or",
            Op::Truth => "truth",
            Op::Inc => "inc",
            Op::Dec => "dec",
            Op::Push => "push",
            Op::Pull => "pull",
            Op::Peek(_) => "peek",
            Op::Load(_) => "load",
            Op::Store(_) => "store",
            Op::Jump(_) => "jump",
            Op::Branch(_) => "branch",
            Op::Call(_) => "call",
            Op::Return => "return",
            Op::Alloc(_) => "alloc",
            Op::Free(_) => "free",
            Op::Trans => "trans",
            Op::Pers => "pers",
            Op::Void => "void",
            Op::Deref => "deref",
            Op::Ref => "ref",
            Op::Debug(_) => "debug",
            Op::Halt => "halt",
        }
    }

    /// Rewrites the control-transfer operand, leaving every other op as is.
    pub fn map_target<U, E>(self, resolve: impl FnOnce(T) -> Result<U, E>) -> Result<Op<U>, E> {
        Ok(match self {
            Op::Jump(t) => Op::Jump(resolve(t)?),
            Op::Branch(t) => Op::Branch(resolve(t)?),
            Op::Call(t) => Op::Call(resolve(t)?),
            Op::Const(k) => Op::Const(k),
            Op::Add => Op::Add,
            Op::Sub => Op::Sub,
            Op::Mul => Op::Mul,
            Op::Greater => Op::Greater,
            Op::Lesser => Op::Lesser,
            Op::GreaterEq => Op::GreaterEq,
            Op::LesserEq => Op::LesserEq,
            Op::Equal => Op::Equal,
            Op::NotEqual => Op::NotEqual,
            Op::BitAnd => Op::BitAnd,
            Op::BitOr => Op::BitOr,
            Op::Truth => Op::Truth,
            Op::Inc => Op::Inc,
            Op::Dec => Op::Dec,
            Op::Push => Op::Push,
            Op::Pull => Op::Pull,
            Op::Peek(k) => Op::Peek(k),
            Op::Load(k) => Op::Load(k),
            Op::Store(k) => Op::Store(k),
            Op::Return => Op::Return,
            Op::Alloc(n) => Op::Alloc(n),
            Op::Free(n) => Op::Free(n),
            Op::Trans => Op::Trans,
            Op::Pers => Op::Pers,
            Op::Void => Op::Void,
            Op::Deref => Op::Deref,
            Op::Ref => Op::Ref,
            Op::Debug(mode) => Op::Debug(mode),
            Op::Halt => Op::Halt,
        })
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Op<T> {
    /// Formats as one line of the text format: `mnemonic [argument]`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.mnemonic();
        match self {
            Op::Const(k) | Op::Peek(k) | Op::Load(k) | Op::Store(k) | Op::Alloc(k)
            | Op::Free(k) => write!(f, "{} {}", name, k),
            Op::Jump(t) | Op::Branch(t) | Op::Call(t) => write!(f, "{} {}", name, t),
            Op::Debug(mode) => write!(f, "{} {}", name, mode.name()),
            _ => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_arguments() {
        assert_eq!(Op::<Address>::Const(-3).to_string(), "const -3");
        assert_eq!(Op::<Address>::Jump(12).to_string(), "jump 12");
        assert_eq!(Op::<Address>::Debug(DebugMode::Str).to_string(), "debug str");
        assert_eq!(Op::<Address>::GreaterEq.to_string(), "gequal");
        assert_eq!(Op::<Address>::BitAnd.to_string(), "and");
    }

    #[test]
    fn test_symbolic_display() {
        let op: Op<Target> = Op::Branch(Target::label("main", "done"));
        assert_eq!(op.to_string(), "branch main:done");
    }

    #[test]
    fn test_map_target_only_touches_transfers() {
        let resolve = |t: Target| -> Result<Address, ()> {
            match t {
                Target::Routine(name) if name == "f" => Ok(7),
                _ => Err(()),
            }
        };
        assert_eq!(Op::Call(Target::routine("f")).map_target(resolve), Ok(Op::Call(7)));
        assert_eq!(Op::<Target>::Load(-3).map_target(resolve), Ok(Op::Load(-3)));
        assert_eq!(Op::Jump(Target::routine("g")).map_target(resolve), Err(()));
    }

    #[test]
    fn test_debug_mode_names() {
        for mode in [DebugMode::Num, DebugMode::Char, DebugMode::Raw, DebugMode::Str] {
            assert_eq!(DebugMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(DebugMode::from_name("hex"), None);
    }
}
