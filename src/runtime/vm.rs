use std::io::Write;

use tracing::{debug, trace};

use crate::bytecode::executable::Executable;
use crate::bytecode::op::{Address, DebugMode, Op};
use crate::runtime::heap;
use crate::runtime::runtime_error::{Fault, RuntimeError};

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Total memory cells.
    pub memory_size: usize,
    /// First heap cell. The stack occupies `[0, heap_base)`.
    pub heap_base: usize,
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            memory_size: 1 << 16,
            heap_base: 1 << 15,
            max_steps: None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// A `halt` instruction executed.
    Halted,
    /// The program counter moved past the last instruction.
    RanOff,
}

/// Accumulator machine with one memory array holding the stack (growing up
/// from 0) and the persistent heap (from `heap_base`). `debug` output goes
/// to `out`.
pub struct Vm<W: Write> {
    memory: Vec<i64>,
    acc: i64,
    pc: Address,
    base: i64,
    /// Next free stack cell.
    top: i64,
    config: VmConfig,
    steps: u64,
    out: W,
}

impl<W: Write> Vm<W> {
    pub fn new(out: W) -> Self {
        Self::with_config(VmConfig::default(), out)
    }

    pub fn with_config(config: VmConfig, out: W) -> Self {
        Self {
            memory: Vec::new(),
            acc: 0,
            pc: 0,
            base: 0,
            top: 0,
            config,
            steps: 0,
            out,
        }
    }

    pub fn acc(&self) -> i64 {
        self.acc
    }

    pub fn top(&self) -> i64 {
        self.top
    }

    pub fn base(&self) -> i64 {
        self.base
    }

    pub fn memory(&self) -> &[i64] {
        &self.memory
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn reset(&mut self) -> Result<(), Fault> {
        if self.config.heap_base > self.config.memory_size {
            return Err(Fault::InvalidConfig(format!(
                "heap base {} lies beyond memory size {}",
                self.config.heap_base, self.config.memory_size
            )));
        }
        self.memory = vec![0; self.config.memory_size];
        self.acc = 0;
        self.pc = 0;
        self.base = 0;
        self.top = 0;
        self.steps = 0;
        Ok(())
    }

    /// Runs `exe` from address 0 on zeroed memory.
    pub fn run(&mut self, exe: &Executable) -> Result<Exit, RuntimeError> {
        self.reset().map_err(|fault| RuntimeError::new(0, fault))?;
        debug!(
            ops = exe.len(),
            memory = self.config.memory_size,
            heap_base = self.config.heap_base,
            "vm start"
        );

        let exit = loop {
            let Some(op) = exe.ops.get(self.pc) else {
                break Exit::RanOff;
            };
            let at = self.pc;
            self.pc += 1;
            trace!(pc = at, op = %op, acc = self.acc, top = self.top, base = self.base);

            match self.step(op) {
                Ok(true) => {}
                Ok(false) => break Exit::Halted,
                Err(fault) => return Err(RuntimeError::new(at, fault)),
            }
        };

        self.out
            .flush()
            .map_err(|e| RuntimeError::new(self.pc, e.into()))?;
        debug!(steps = self.steps, ?exit, "vm stop");
        Ok(exit)
    }

    /// Executes one instruction; `Ok(false)` means halt.
    fn step(&mut self, op: &Op) -> Result<bool, Fault> {
        self.steps += 1;
        if let Some(max) = self.config.max_steps {
            if self.steps > max {
                return Err(Fault::StepLimit(max));
            }
        }

        match *op {
            Op::Const(k) => self.acc = k,
            Op::Add => self.acc = self.acc.wrapping_add(self.pull()?),
            Op::Sub => self.acc = self.acc.wrapping_sub(self.pull()?),
            Op::Mul => self.acc = self.acc.wrapping_mul(self.pull()?),
            Op::Greater => self.compare(|a, b| a > b)?,
            Op::Lesser => self.compare(|a, b| a < b)?,
            Op::GreaterEq => self.compare(|a, b| a >= b)?,
            Op::LesserEq => self.compare(|a, b| a <= b)?,
            Op::Equal => self.compare(|a, b| a == b)?,
            Op::NotEqual => self.compare(|a, b| a != b)?,
            Op::BitAnd => {
                let rhs = self.pull()?;
                self.acc &= rhs;
            }
            Op::BitOr => {
                let rhs = self.pull()?;
                self.acc |= rhs;
            }
            Op::Truth => self.acc = (self.acc != 0) as i64,
            Op::Inc => self.acc = self.acc.wrapping_add(1),
            Op::Dec => self.acc = self.acc.wrapping_sub(1),

            Op::Push => self.push(self.acc)?,
            Op::Pull => self.acc = self.pull()?,
            Op::Peek(k) => {
                let addr = self
                    .top
                    .checked_sub(1)
                    .and_then(|below| below.checked_sub(k))
                    .ok_or(Fault::OutOfBounds(k))?;
                self.acc = self.read(addr)?;
            }
            Op::Load(k) => self.acc = self.read(frame_addr(self.base, k)?)?,
            Op::Store(k) => self.write(frame_addr(self.base, k)?, self.acc)?,

            Op::Jump(addr) => self.pc = addr,
            Op::Branch(addr) => {
                if self.acc != 0 {
                    self.pc = addr;
                }
            }
            Op::Call(addr) => {
                self.push(self.pc as i64)?;
                self.push(self.base)?;
                self.pc = addr;
                self.base = self.top;
            }
            Op::Return => {
                self.top = self.base;
                self.base = self.pull()?;
                let ret = self.pull()?;
                self.pc = usize::try_from(ret).map_err(|_| Fault::OutOfBounds(ret))?;
            }

            Op::Alloc(n) => {
                if n < 0 {
                    return Err(Fault::InvalidSize(n));
                }
                let top = self.top.checked_add(n).ok_or(Fault::InvalidSize(n))?;
                self.set_top(top)?;
            }
            Op::Free(n) => {
                if n < 0 {
                    return Err(Fault::InvalidSize(n));
                }
                let top = self.top.checked_sub(n).ok_or(Fault::InvalidSize(n))?;
                self.set_top(top)?;
            }
            Op::Trans => {
                let size = self.acc;
                if size < 0 {
                    return Err(Fault::InvalidSize(size));
                }
                let header = self.top;
                let span = size.checked_add(1).ok_or(Fault::InvalidSize(size))?;
                let top = header.checked_add(span).ok_or(Fault::InvalidSize(size))?;
                self.set_top(top)?;
                self.write(header, span)?;
                self.acc = header + 1;
            }
            Op::Pers => {
                let block = heap::pers(&mut self.memory, self.config.heap_base, self.acc)?;
                self.acc = block as i64;
            }
            Op::Void => heap::void(&mut self.memory, self.acc)?,
            Op::Deref => self.acc = self.read(self.acc)?,
            Op::Ref => {
                let value = self.pull()?;
                self.write(self.acc, value)?;
            }

            Op::Debug(mode) => self.debug(mode)?,
            Op::Halt => return Ok(false),
        }
        Ok(true)
    }

    fn compare(&mut self, f: impl Fn(i64, i64) -> bool) -> Result<(), Fault> {
        let rhs = self.pull()?;
        self.acc = f(self.acc, rhs) as i64;
        Ok(())
    }

    fn debug(&mut self, mode: DebugMode) -> Result<(), Fault> {
        match mode {
            DebugMode::Num => write!(self.out, "{}", self.acc)?,
            DebugMode::Char => writeln!(self.out, "{}", to_char(self.acc))?,
            DebugMode::Raw => write!(self.out, "{}", to_char(self.acc))?,
            DebugMode::Str => {
                let mut bytes = Vec::new();
                let mut addr = self.acc;
                loop {
                    let cell = self.read(addr)?;
                    if cell == 0 {
                        break;
                    }
                    match u8::try_from(cell) {
                        Ok(b) => bytes.push(b),
                        Err(_) => {
                            let mut buf = [0; 4];
                            bytes.extend_from_slice(to_char(cell).encode_utf8(&mut buf).as_bytes());
                        }
                    }
                    addr += 1;
                }
                self.out.write_all(&bytes)?;
            }
        }
        Ok(())
    }

    // Memory

    fn index(&self, addr: i64) -> Result<usize, Fault> {
        usize::try_from(addr)
            .ok()
            .filter(|&i| i < self.memory.len())
            .ok_or(Fault::OutOfBounds(addr))
    }

    fn read(&self, addr: i64) -> Result<i64, Fault> {
        Ok(self.memory[self.index(addr)?])
    }

    fn write(&mut self, addr: i64, value: i64) -> Result<(), Fault> {
        let i = self.index(addr)?;
        self.memory[i] = value;
        Ok(())
    }

    // Stack

    fn set_top(&mut self, top: i64) -> Result<(), Fault> {
        if top < 0 {
            return Err(Fault::StackUnderflow);
        }
        if top > self.config.heap_base as i64 {
            return Err(Fault::StackOverflow(top));
        }
        self.top = top;
        Ok(())
    }

    fn push(&mut self, value: i64) -> Result<(), Fault> {
        let at = self.top;
        self.set_top(at + 1)?;
        self.write(at, value)
    }

    fn pull(&mut self) -> Result<i64, Fault> {
        self.set_top(self.top - 1)?;
        self.read(self.top)
    }
}

/// `base + offset` for frame-relative access.
fn frame_addr(base: i64, offset: i64) -> Result<i64, Fault> {
    base.checked_add(offset).ok_or(Fault::OutOfBounds(offset))
}

fn to_char(value: i64) -> char {
    u32::try_from(value)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}
