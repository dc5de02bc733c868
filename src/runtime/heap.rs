//! Persistent block allocator over the heap region of VM memory.
//!
//! A block is `[header, header + span)` with `span = content + 1` stored in
//! the header cell. A zero cell is free. The scan is first fit: runs of zero
//! cells are counted from the heap base, and any nonzero cell is a header
//! whose span is skipped.

use crate::runtime::runtime_error::Fault;

/// Allocates a block with `size` content cells and returns its content base.
pub fn pers(memory: &mut [i64], heap_base: usize, size: i64) -> Result<usize, Fault> {
    if size < 0 {
        return Err(Fault::InvalidSize(size));
    }
    let span = usize::try_from(size)
        .ok()
        .and_then(|size| size.checked_add(1))
        .ok_or(Fault::HeapExhausted(size))?;

    let mut start = heap_base;
    let mut run = 0;
    let mut addr = heap_base;
    while addr < memory.len() {
        match memory[addr] {
            0 => {
                if run == 0 {
                    start = addr;
                }
                run += 1;
                addr += 1;
                if run == span {
                    memory[start] = span as i64;
                    return Ok(start + 1);
                }
            }
            header => {
                run = 0;
                // a corrupted non-positive header still moves the scan on
                addr += header.max(1) as usize;
            }
        }
    }
    Err(Fault::HeapExhausted(size))
}

/// Zeroes the block whose content starts at `block`, header included.
/// Voiding a block twice is not detected: the second call sees a zero
/// header and clears nothing.
pub fn void(memory: &mut [i64], block: i64) -> Result<(), Fault> {
    let header = block.checked_sub(1).ok_or(Fault::OutOfBounds(block))?;
    let header_index = index(memory, header)?;
    let span = memory[header_index].max(0);
    let end = header
        .checked_add(span)
        .ok_or(Fault::OutOfBounds(header))?;
    if span > 0 {
        index(memory, end - 1)?;
    }
    for cell in &mut memory[header_index..end as usize] {
        *cell = 0;
    }
    Ok(())
}

fn index(memory: &[i64], addr: i64) -> Result<usize, Fault> {
    usize::try_from(addr)
        .ok()
        .filter(|&i| i < memory.len())
        .ok_or(Fault::OutOfBounds(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: usize = 4;

    fn memory() -> Vec<i64> {
        vec![0; 32]
    }

    #[test]
    fn test_first_block_starts_at_heap_base() {
        let mut mem = memory();
        let block = pers(&mut mem, BASE, 3).unwrap();
        assert_eq!(block, BASE + 1);
        assert_eq!(mem[BASE], 4);
    }

    #[test]
    fn test_pers_then_void_restores_heap() {
        for n in 1..=16 {
            let mut mem = memory();
            let block = pers(&mut mem, BASE, n).unwrap();
            for i in 0..n as usize {
                mem[block + i] = 100 + i as i64;
            }
            void(&mut mem, block as i64).unwrap();
            assert_eq!(mem, memory(), "size {}", n);
        }
    }

    #[test]
    fn test_sequential_blocks_do_not_overlap() {
        let mut mem = memory();
        let a = pers(&mut mem, BASE, 2).unwrap();
        let b = pers(&mut mem, BASE, 3).unwrap();
        let c = pers(&mut mem, BASE, 1).unwrap();
        assert_eq!(b, a + 2 + 1);
        assert_eq!(c, b + 3 + 1);
    }

    #[test]
    fn test_blocks_skip_nonzero_content() {
        let mut mem = memory();
        let a = pers(&mut mem, BASE, 2).unwrap();
        mem[a] = 0;
        mem[a + 1] = 0;
        let b = pers(&mut mem, BASE, 1).unwrap();
        assert!(b > a + 1);
    }

    #[test]
    fn test_first_fit_reuses_freed_block() {
        let mut mem = memory();
        let a = pers(&mut mem, BASE, 3).unwrap();
        let _b = pers(&mut mem, BASE, 3).unwrap();
        void(&mut mem, a as i64).unwrap();
        let c = pers(&mut mem, BASE, 2).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn test_gap_too_small_is_skipped() {
        let mut mem = memory();
        let a = pers(&mut mem, BASE, 1).unwrap();
        let b = pers(&mut mem, BASE, 1).unwrap();
        void(&mut mem, a as i64).unwrap();
        let c = pers(&mut mem, BASE, 3).unwrap();
        assert!(c > b);
    }

    #[test]
    fn test_zero_size_block() {
        let mut mem = memory();
        let a = pers(&mut mem, BASE, 0).unwrap();
        let b = pers(&mut mem, BASE, 0).unwrap();
        assert_eq!(mem[a - 1], 1);
        assert_eq!(b, a + 1);
    }

    #[test]
    fn test_exhaustion() {
        let mut mem = memory();
        let err = pers(&mut mem, BASE, 28).unwrap_err();
        assert_eq!(err, Fault::HeapExhausted(28));
        assert!(pers(&mut mem, BASE, 27).is_ok());
    }

    #[test]
    fn test_negative_size() {
        let mut mem = memory();
        assert_eq!(pers(&mut mem, BASE, -1), Err(Fault::InvalidSize(-1)));
    }

    #[test]
    fn test_double_void_is_silent() {
        let mut mem = memory();
        let a = pers(&mut mem, BASE, 2).unwrap();
        void(&mut mem, a as i64).unwrap();
        void(&mut mem, a as i64).unwrap();
        assert_eq!(mem, memory());
    }

    #[test]
    fn test_void_out_of_bounds() {
        let mut mem = memory();
        assert_eq!(void(&mut mem, 0), Err(Fault::OutOfBounds(-1)));
        assert_eq!(void(&mut mem, i64::MIN), Err(Fault::OutOfBounds(i64::MIN)));
        mem[30] = 5;
        assert!(matches!(void(&mut mem, 31), Err(Fault::OutOfBounds(_))));
    }
}
