use std::collections::BTreeMap;
use std::fmt::{self, Display};

use indexmap::IndexMap;

use brammap_netlist::{SigBit, SigSpec};

/// Description of one block-RAM primitive from the rules file.
///
/// Ports are organized in groups; all ports of a group share direction,
/// enable granularity, transparency, and clock configuration.  For `transp`
/// and `clkpol` a value above one names a configuration cohort shared by all
/// groups carrying the same value; for `clocks` any nonzero value names a
/// shared clock cohort, zero meaning unclocked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BramType {
    pub name: String,
    pub init: bool,
    pub abits: usize,
    pub dbits: usize,
    pub groups: usize,
    pub ports: Vec<usize>,
    pub wrmode: Vec<bool>,
    pub enable: Vec<usize>,
    pub transp: Vec<usize>,
    pub clocks: Vec<usize>,
    pub clkpol: Vec<usize>,
}

impl BramType {
    /// Expands the per-group description into one entry per physical port.
    pub fn make_portinfos(&self) -> Vec<PortInfo> {
        let mut portinfos = vec![];
        for group in 0..self.groups.min(self.ports.len()) {
            for index in 0..self.ports[group] {
                portinfos.push(PortInfo {
                    group,
                    index,
                    dupidx: 0,
                    wrmode: self.wrmode.get(group).copied().unwrap_or(false),
                    enable: self.enable.get(group).copied().unwrap_or(0),
                    transp: self.transp.get(group).copied().unwrap_or(0),
                    clocks: self.clocks.get(group).copied().unwrap_or(0),
                    clkpol: self.clkpol.get(group).copied().unwrap_or(0),
                    mapped_port: None,
                    sig_clock: SigBit::ZERO,
                    effective_clkpol: false,
                    sig_addr: SigSpec::EMPTY,
                    sig_data: SigSpec::EMPTY,
                    sig_en: SigSpec::EMPTY,
                });
            }
        }
        portinfos
    }
}

/// One physical BRAM port, together with its binding state during port
/// assignment.  `dupidx` is the grid replica the port belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub group: usize,
    pub index: usize,
    pub dupidx: usize,

    pub wrmode: bool,
    pub enable: usize,
    pub transp: usize,
    pub clocks: usize,
    pub clkpol: usize,

    pub mapped_port: Option<usize>,
    pub sig_clock: SigBit,
    pub effective_clkpol: bool,
    pub sig_addr: SigSpec,
    pub sig_data: SigSpec,
    pub sig_en: SigSpec,
}

impl PortInfo {
    /// Port label, `<group letter><index>`: the first port of the first
    /// group is `A1`.
    pub fn label(&self) -> String {
        format!("{}{}", (b'A' + self.group as u8) as char, self.index + 1)
    }

    pub fn clear_binding(&mut self) {
        self.mapped_port = None;
        self.sig_clock = SigBit::ZERO;
        self.sig_addr = SigSpec::EMPTY;
        self.sig_data = SigSpec::EMPTY;
        self.sig_en = SigSpec::EMPTY;
    }
}

/// A match rule: accept the named BRAM when every listed property of the
/// memory lies within the given bounds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchRule {
    pub name: String,
    pub min_limits: BTreeMap<String, i64>,
    pub max_limits: BTreeMap<String, i64>,
}

/// A parsed rules document: BRAM descriptions by name, and match rules in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rules {
    pub brams: IndexMap<String, BramType>,
    pub matches: Vec<MatchRule>,
}

fn write_int_vect(f: &mut fmt::Formatter, keyword: &str, values: impl Iterator<Item = usize>) -> fmt::Result {
    let mut any = false;
    for (index, value) in values.enumerate() {
        if index == 0 {
            write!(f, "  {}", keyword)?;
            any = true;
        }
        write!(f, " {}", value)?;
    }
    if any {
        writeln!(f)?;
    }
    Ok(())
}

impl Display for BramType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "bram {}", self.name)?;
        writeln!(f, "  init {}", self.init as usize)?;
        writeln!(f, "  abits {}", self.abits)?;
        writeln!(f, "  dbits {}", self.dbits)?;
        writeln!(f, "  groups {}", self.groups)?;
        write_int_vect(f, "ports", self.ports.iter().copied())?;
        write_int_vect(f, "wrmode", self.wrmode.iter().map(|&mode| mode as usize))?;
        write_int_vect(f, "enable", self.enable.iter().copied())?;
        write_int_vect(f, "transp", self.transp.iter().copied())?;
        write_int_vect(f, "clocks", self.clocks.iter().copied())?;
        write_int_vect(f, "clkpol", self.clkpol.iter().copied())?;
        writeln!(f, "endbram")
    }
}

impl Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "match {}", self.name)?;
        for (key, value) in &self.min_limits {
            writeln!(f, "  min {} {}", key, value)?;
        }
        for (key, value) in &self.max_limits {
            writeln!(f, "  max {} {}", key, value)?;
        }
        writeln!(f, "endmatch")
    }
}

/// The canonical form of a rules document: reparsing the output yields the
/// same in-memory representation.
impl Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, bram) in self.brams.values().enumerate() {
            if index != 0 {
                writeln!(f)?;
            }
            write!(f, "{}", bram)?;
        }
        for rule in &self.matches {
            writeln!(f)?;
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::rules::BramType;

    #[test]
    fn test_make_portinfos() {
        let bram = BramType {
            name: "R".into(),
            groups: 2,
            ports: vec![1, 2],
            wrmode: vec![true, false],
            enable: vec![4],
            transp: vec![0, 1],
            clocks: vec![1, 2],
            clkpol: vec![1, 1],
            ..Default::default()
        };
        let portinfos = bram.make_portinfos();
        assert_eq!(portinfos.len(), 3);
        assert_eq!(portinfos[0].label(), "A1");
        assert!(portinfos[0].wrmode);
        assert_eq!(portinfos[0].enable, 4);
        assert_eq!(portinfos[1].label(), "B1");
        assert_eq!(portinfos[2].label(), "B2");
        // the enable vector is shorter than the group count
        assert_eq!(portinfos[2].enable, 0);
        assert_eq!(portinfos[2].clocks, 2);
        assert!(portinfos.iter().all(|pi| pi.dupidx == 0 && pi.mapped_port.is_none()));
    }
}
