use crate::lang::stmt::Stmt;

/// Size of the control header (saved return address, saved base) sitting
/// between a frame's parameters and its locals.
pub const CONTROL_WORDS: i64 = 2;

/// Declared in/out parameters of a routine.
///
/// Order is fixed by declaration. The parameter block sits directly below the
/// control header: in-parameters first (deepest), then out-parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamInterface {
    pub ins: Vec<String>,
    pub outs: Vec<String>,
}

impl ParamInterface {
    pub fn len(&self) -> usize {
        self.ins.len() + self.outs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn declares(&self, name: &str) -> bool {
        self.ins.iter().chain(&self.outs).any(|p| p == name)
    }

    /// Frame offset of the parameter at `position` in the concatenated in+out list.
    pub fn offset(&self, position: usize) -> i64 {
        -(CONTROL_WORDS + self.len() as i64) + position as i64
    }

    pub fn in_offset(&self, index: usize) -> i64 {
        self.offset(index)
    }

    pub fn out_offset(&self, index: usize) -> i64 {
        self.offset(self.ins.len() + index)
    }

    /// Every parameter name with its frame offset, ins first.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.ins
            .iter()
            .chain(&self.outs)
            .enumerate()
            .map(|(position, name)| (name.as_str(), self.offset(position)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    pub params: ParamInterface,
    pub body: Vec<Stmt>,
}

/// Compile-time record layout. Contributes `name` (length) and
/// `name::field` (offset) constants; no runtime representation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqType {
    pub name: String,
    pub fields: Vec<String>,
}

impl SeqType {
    pub fn constants(&self) -> Vec<(String, i64)> {
        let mut consts = vec![(self.name.clone(), self.fields.len() as i64)];
        for (offset, field) in self.fields.iter().enumerate() {
            consts.push((format!("{}::{}", self.name, field), offset as i64));
        }
        consts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(ins: &[&str], outs: &[&str]) -> ParamInterface {
        ParamInterface {
            ins: ins.iter().map(|s| s.to_string()).collect(),
            outs: outs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_offsets_follow_declaration_order() {
        let p = iface(&["a", "b"], &["r"]);
        assert_eq!(p.in_offset(0), -5);
        assert_eq!(p.in_offset(1), -4);
        assert_eq!(p.out_offset(0), -3);
    }

    #[test]
    fn test_offset_formula_for_all_shapes() {
        for n_in in 0..4 {
            for n_out in 0..4 {
                let ins: Vec<String> = (0..n_in).map(|i| format!("i{}", i)).collect();
                let outs: Vec<String> = (0..n_out).map(|j| format!("o{}", j)).collect();
                let p = ParamInterface { ins, outs };
                let total = (n_in + n_out) as i64;
                for i in 0..n_in {
                    assert_eq!(p.in_offset(i), -(2 + total) + i as i64);
                }
                for j in 0..n_out {
                    assert_eq!(p.out_offset(j), -(2 + total) + n_in as i64 + j as i64);
                }
            }
        }
    }

    #[test]
    fn test_last_out_sits_below_control_header() {
        let p = iface(&["x"], &["y", "z"]);
        assert_eq!(p.out_offset(1), -3);
    }

    #[test]
    fn test_bindings() {
        let p = iface(&["a"], &["r"]);
        assert!(!p.is_empty());
        assert!(ParamInterface::default().is_empty());
        let b: Vec<_> = p.bindings().collect();
        assert_eq!(b, vec![("a", -4), ("r", -3)]);
    }

    #[test]
    fn test_seq_constants() {
        let seq = SeqType {
            name: "point".into(),
            fields: vec!["x".into(), "y".into()],
        };
        assert_eq!(
            seq.constants(),
            vec![
                ("point".to_string(), 2),
                ("point::x".to_string(), 0),
                ("point::y".to_string(), 1),
            ]
        );
    }
}
