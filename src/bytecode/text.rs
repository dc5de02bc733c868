//! Line-oriented text form of an `Executable`.
//!
//! One instruction per line, `mnemonic [argument]`. Lines starting with `"`
//! carry generator annotations and are skipped by the loader, as are blank
//! lines. Targets are plain addresses; nothing is resolved while loading.

use thiserror::Error;

use crate::bytecode::executable::Executable;
use crate::bytecode::op::{Address, DebugMode, Op};

const NOTE_PREFIX: char = '"';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct LoadError {
    pub line: usize,
    pub message: String,
}

impl LoadError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        LoadError {
            line,
            message: message.into(),
        }
    }
}

impl Executable {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut notes = self.notes.iter().peekable();
        for (addr, op) in self.ops.iter().enumerate() {
            while let Some((_, note)) = notes.next_if(|(at, _)| *at <= addr) {
                push_note(&mut out, note);
            }
            out.push_str(&op.to_string());
            out.push('\n');
        }
        for (_, note) in notes {
            push_note(&mut out, note);
        }
        out
    }

    pub fn from_text(text: &str) -> Result<Self, LoadError> {
        let mut ops = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(NOTE_PREFIX) {
                continue;
            }
            ops.push(parse_line(index + 1, line)?);
        }
        Ok(Executable::new(ops))
    }
}

fn push_note(out: &mut String, note: &str) {
    out.push(NOTE_PREFIX);
    out.push_str(note);
    out.push('\n');
}

fn parse_line(line_no: usize, line: &str) -> Result<Op, LoadError> {
    let mut words = line.split_whitespace();
    let mnemonic = words.next().unwrap_or_default();
    let arg = words.next();
    if let Some(extra) = words.next() {
        return Err(LoadError::new(line_no, format!("unexpected '{}'", extra)));
    }

    let int = || -> Result<i64, LoadError> {
        let word = arg.ok_or_else(|| {
            LoadError::new(line_no, format!("'{}' expects an integer argument", mnemonic))
        })?;
        parse_int(word)
            .ok_or_else(|| LoadError::new(line_no, format!("invalid integer '{}'", word)))
    };
    let addr = || -> Result<Address, LoadError> {
        let value = int()?;
        Address::try_from(value)
            .map_err(|_| LoadError::new(line_no, format!("invalid address {}", value)))
    };

    let op = match mnemonic {
        "const" => Op::Const(int()?),
        "peek" => Op::Peek(int()?),
        "load" => Op::Load(int()?),
        "store" => Op::Store(int()?),
        "alloc" => Op::Alloc(int()?),
        "free" => Op::Free(int()?),
        "jump" => Op::Jump(addr()?),
        "branch" => Op::Branch(addr()?),
        "call" => Op::Call(addr()?),
        "debug" => {
            let word = arg.ok_or_else(|| LoadError::new(line_no, "'debug' expects a mode"))?;
            Op::Debug(
                DebugMode::from_name(word)
                    .ok_or_else(|| LoadError::new(line_no, format!("unknown debug mode '{}'", word)))?,
            )
        }
        _ => {
            let op = match mnemonic {
                "add" => Op::Add,
                "sub" => Op::Sub,
                "mul" => Op::Mul,
                "greater" => Op::Greater,
                "lesser" => Op::Lesser,
                "gequal" => Op::GreaterEq,
                "lequal" => Op::LesserEq,
                "equal" => Op::Equal,
                "nequal" => Op::NotEqual,
                "and" => Op::BitAnd,
                "or" => Op::BitOr,
                "truth" => Op::Truth,
                "inc" => Op::Inc,
                "dec" => Op::Dec,
                "push" => Op::Push,
                "pull" => Op::Pull,
                "return" => Op::Return,
                "trans" => Op::Trans,
                "pers" => Op::Pers,
                "void" => Op::Void,
                "deref" => Op::Deref,
                "ref" => Op::Ref,
                "halt" => Op::Halt,
                _ => {
                    return Err(LoadError::new(
                        line_no,
                        format!("unknown instruction '{}'", mnemonic),
                    ));
                }
            };
            if let Some(word) = arg {
                return Err(LoadError::new(
                    line_no,
                    format!("'{}' takes no argument, found '{}'", mnemonic, word),
                ));
            }
            op
        }
    };
    Ok(op)
}

/// Digits with an optional leading minus.
fn parse_int(word: &str) -> Option<i64> {
    let digits = word.strip_prefix('-').unwrap_or(word);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    word.parse().ok()
}
