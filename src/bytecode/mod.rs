pub mod compile;
pub mod compile_error;
pub mod executable;
pub mod op;
pub mod program;
pub mod text;

pub use compile::{Compiler, ENTRY_ROUTINE, compile};
pub use compile_error::CompileError;
pub use executable::Executable;
pub use op::{Address, DebugMode, Op, Target};
pub use program::Program;
pub use text::LoadError;
