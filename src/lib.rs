//! Sapling: a compiler for a small imperative language and the stack VM that
//! runs its bytecode.
//!
//! ```text
//! source --lexer/parser--> AST --loader--> SourceTree --compile--> Executable --Vm--> output
//! ```

pub mod bytecode;
pub mod error;
pub mod frontend;
pub mod lang;
pub mod runtime;

use std::io::Write;
use std::path::Path;

pub use bytecode::{Executable, Op};
pub use error::{Error, Result};
pub use runtime::{Exit, Vm, VmConfig};

use frontend::loader::Loader;

/// Loads `path` with its imports and compiles it from `main`.
pub fn compile_file(path: &Path) -> Result<Executable> {
    let tree = Loader::new().load_file(path)?;
    Ok(bytecode::compile(&tree)?)
}

/// Compiles in-memory source. `use` paths resolve against the working
/// directory.
pub fn compile_source(source: &str) -> Result<Executable> {
    let tree = Loader::new().load_source(source, None)?;
    Ok(bytecode::compile(&tree)?)
}

/// Runs `exe` on a fresh machine, writing `debug` output to `out`.
pub fn execute<W: Write>(exe: &Executable, config: VmConfig, out: W) -> Result<Exit> {
    let mut vm = Vm::with_config(config, out);
    Ok(vm.run(exe)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Fault, RuntimeError};

    fn run(source: &str) -> String {
        let exe = compile_source(source).unwrap();
        let mut out = Vec::new();
        let exit = execute(&exe, VmConfig::default(), &mut out).unwrap();
        assert_eq!(exit, Exit::Halted);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_count_is_inclusive() {
        assert_eq!(run("rout main { count i ~ 0..3 { debug i; } }"), "0\n1\n2\n3\n");
    }

    #[test]
    fn test_empty_count_range() {
        assert_eq!(run("rout main { count i ~ 3..2 { debug i; } debug 9; }"), "9\n");
    }

    #[test]
    fn test_parameters_bind_by_name_not_position() {
        let source = "
            rout diff(in a; in b; out r;) { put r = a - b; }
            rout main { sub diff(b ~ 3, r ~ x, a ~ 10); debug x; }
        ";
        assert_eq!(run(source), "7\n");
    }

    #[test]
    fn test_multiple_outs() {
        let source = "
            rout divmod(in n; in d; out q; out m;) {
                put q = 0;
                lab again;
                jump done ~ n < d;
                put n -= d;
                put q += 1;
                jump again;
                lab done;
                put m = n;
            }
            rout main { sub divmod(m ~ rest, q ~ whole, d ~ 4, n ~ 14); debug whole; debug rest; }
        ";
        assert_eq!(run(source), "3\n2\n");
    }

    #[test]
    fn test_recursion_uses_independent_frames() {
        let source = "
            rout fact(in n; out r;) {
                jump base ~ n < 2;
                sub fact(n ~ n - 1, r ~ t);
                put r = n * t;
                jump done;
                lab base;
                put r = 1;
                lab done;
            }
            rout main { sub fact(n ~ 5, r); debug r; }
        ";
        assert_eq!(run(source), "120\n");
    }

    #[test]
    fn test_string_iter_visits_each_byte() {
        let source = "rout main { put s = 'hey'; iter c ~ s { debug c; } debug '{`s}'; }";
        assert_eq!(run(source), "104\n101\n121\nhey\n");
    }

    #[test]
    fn test_string_header_counts_bytes_and_zero_follows() {
        let source = "
            rout main {
                put s = 'hey';
                put h = s - 1;
                debug h.0;
                debug s.3;
                iter c ~ s { put n += 1; }
                debug n;
            }
        ";
        assert_eq!(run(source), "4\n0\n3\n");
    }

    #[test]
    fn test_enum_visits_in_address_order() {
        let source = "
            rout main {
                pers 3 ~ b;
                put b.0 = 5; put b.1 = 6; put b.2 = 7;
                enum e @ i ~ b { debug '{i}:{e}'; }
            }
        ";
        assert_eq!(run(source), "0:5\n1:6\n2:7\n");
    }

    #[test]
    fn test_iter_over_transient_block() {
        let source = "
            rout main {
                trans 2 ~ t;
                put t.0 = 4; put t.1 = 8;
                iter x ~ t { put sum += x; }
                debug sum;
            }
        ";
        assert_eq!(run(source), "12\n");
    }

    #[test]
    fn test_seq_members() {
        let source = "
            seq point { x y }
            rout main {
                pers point ~ p;
                put p.point::x = 3;
                put p.point::y = 4;
                debug p.point::x * p.point::y;
                debug '{p.point::y}';
                void p;
            }
        ";
        assert_eq!(run(source), "12\n4\n");
    }

    #[test]
    fn test_defer_runs_in_order_of_appearance_at_the_end() {
        let source = "rout main { defer debug 3; debug 1; defer debug 4; debug 2; }";
        assert_eq!(run(source), "1\n2\n3\n4\n");
    }

    #[test]
    fn test_increment_operators() {
        let source = "
            rout main {
                put i = 5;
                put j = i =+ 1;
                put k = i -= 2;
                debug j; debug k; debug i;
            }
        ";
        assert_eq!(run(source), "5\n4\n4\n");
    }

    #[test]
    fn test_boolean_operators() {
        assert_eq!(
            run("rout main { debug 2 && 0; debug 2 || 0; debug 3 >= 3 && 1 != 2; }"),
            "0\n1\n1\n"
        );
    }

    #[test]
    fn test_subtraction_groups_to_the_right() {
        assert_eq!(run("rout main { debug 10 - 3 - 2; }"), "9\n");
    }

    #[test]
    fn test_push_and_pull_statements() {
        assert_eq!(
            run("rout main { push 4; push 5; pull a; pull b; debug a - b; }"),
            "1\n"
        );
    }

    #[test]
    fn test_debug_char_and_template_text() {
        assert_eq!(run("rout main { debug `x; put n = 2; debug 'n={n}'; }"), "x\nn=2\n");
    }

    #[test]
    fn test_text_format_round_trip_runs_the_same() {
        let source = "rout main { count i ~ 1..2 { debug i * 10; } }";
        let exe = compile_source(source).unwrap();
        let reloaded = Executable::from_text(&exe.to_text()).unwrap();
        let mut out = Vec::new();
        execute(&reloaded, VmConfig::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "10\n20\n");
    }

    #[test]
    fn test_runtime_fault_surfaces_as_error() {
        let exe = compile_source("rout main { put p = 0; debug p.100000; }").unwrap();
        let err = execute(&exe, VmConfig::default(), Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime(RuntimeError { fault: Fault::OutOfBounds(100000), .. })
        ));
    }

    #[test]
    fn test_compile_file_with_import() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.sap"), "rout twice(in x; out r;) { put r = x * 2; }")
            .unwrap();
        let main = dir.path().join("main.sap");
        std::fs::write(&main, "use 'lib'; rout main { sub twice(x ~ 21, r); debug r; }").unwrap();

        let exe = compile_file(&main).unwrap();
        let mut out = Vec::new();
        execute(&exe, VmConfig::default(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "42\n");
    }
}
