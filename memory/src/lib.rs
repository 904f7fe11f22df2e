//! Mapping of behavioral `$mem` cells onto grids of block-RAM instances.
//!
//! The available BRAM resources and the policy for choosing between them are
//! read from a rules file ([`Rules`]).  For each memory cell, the match
//! rules are screened in declaration order against a set of derived
//! properties of the memory; the first rule that passes has its BRAM tried:
//! the logical ports are bound to physical BRAM ports ([`assign_ports`]),
//! the grid of BRAM instances is emitted ([`stitch_grid`]), and the original
//! cell is removed.  A BRAM whose port assignment fails is remembered and
//! not retried for the same cell; a cell no rule can map is left in place.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use log::{debug, info};

use brammap_netlist::{Design, MemoryCell, MemoryCellError, Module};

pub mod assign;
pub mod parse;
pub mod rules;
pub mod stitch;

pub use assign::{assign_ports, Assignment};
pub use parse::ParseError;
pub use rules::{BramType, MatchRule, PortInfo, Rules};
pub use stitch::stitch_grid;

/// Fatal configuration errors.  Port-assignment failures are not errors;
/// they only make the driver move on to the next match rule.
#[derive(Debug)]
pub enum Error {
    UnknownBram { name: String },
    UnknownProperty { bram: String, key: String },
    Memory { cell: String, source: MemoryCellError },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownBram { name } => {
                write!(f, "no bram description for resource {} found", name)
            }
            Error::UnknownProperty { bram, key } => {
                write!(f, "unknown property '{}' in match rule for bram type {}", key, bram)
            }
            Error::Memory { cell, source } => write!(f, "memory cell {}: {}", cell, source),
        }
    }
}

impl std::error::Error for Error {}

/// Runs the pass over every `$mem` cell of every module.
pub fn memory_bram(design: &mut Design, rules: &Rules) -> Result<(), Error> {
    for module in design.modules_mut() {
        let memory_cells: Vec<String> = module
            .cells()
            .filter(|(_, cell)| cell.kind == MemoryCell::KIND)
            .map(|(name, _)| name.clone())
            .collect();
        for cell_name in memory_cells {
            handle_cell(module, &cell_name, rules)?;
        }
    }
    Ok(())
}

/// Tries to replace one memory cell.  Returns whether a replacement was
/// made; leaves the cell untouched when every rule is rejected or fails.
pub fn handle_cell(module: &mut Module, cell_name: &str, rules: &Rules) -> Result<bool, Error> {
    let Some(cell) = module.cell(cell_name) else {
        return Ok(false);
    };
    let memory =
        MemoryCell::from_cell(cell).map_err(|source| Error::Memory { cell: cell_name.to_string(), source })?;

    info!("processing {}.{}", module.name, cell_name);

    let mut properties = BTreeMap::from([
        ("words", memory.size as i64),
        ("abits", memory.abits as i64),
        ("dbits", memory.width as i64),
        ("wports", memory.wr_ports as i64),
        ("rports", memory.rd_ports as i64),
        ("bits", (memory.size * memory.width) as i64),
        ("ports", (memory.wr_ports + memory.rd_ports) as i64),
    ]);
    debug!(
        "properties: {}",
        properties.iter().map(|(key, value)| format!("{}={}", key, value)).collect::<Vec<_>>().join(" ")
    );

    let mut failed_brams: HashSet<&str> = HashSet::new();

    'rules: for (rule_index, rule) in rules.matches.iter().enumerate() {
        let Some(bram) = rules.brams.get(&rule.name) else {
            return Err(Error::UnknownBram { name: rule.name.clone() });
        };
        if failed_brams.contains(rule.name.as_str()) {
            continue;
        }

        let bram_words = 1i64 << bram.abits;
        let aover = properties["words"] % bram_words;
        let awaste = if aover != 0 { bram_words - aover } else { 0 };
        properties.insert("awaste", awaste);

        let dover = properties["dbits"] % bram.dbits as i64;
        let dwaste = if dover != 0 { bram.dbits as i64 - dover } else { 0 };
        properties.insert("dwaste", dwaste);

        let waste = awaste * bram.dbits as i64 + dwaste * bram_words - awaste * dwaste;
        properties.insert("waste", waste);

        debug!("wasted bits for bram type {}: awaste={} dwaste={} waste={}", rule.name, awaste, dwaste, waste);

        for (key, &limit) in &rule.min_limits {
            let Some(&value) = properties.get(key.as_str()) else {
                return Err(Error::UnknownProperty { bram: rule.name.clone(), key: key.clone() });
            };
            if value < limit {
                info!("rule #{} for bram type {} rejected: requirement 'min {} {}' not met", rule_index, rule.name, key, limit);
                continue 'rules;
            }
        }
        for (key, &limit) in &rule.max_limits {
            let Some(&value) = properties.get(key.as_str()) else {
                return Err(Error::UnknownProperty { bram: rule.name.clone(), key: key.clone() });
            };
            if value > limit {
                info!("rule #{} for bram type {} rejected: requirement 'max {} {}' not met", rule_index, rule.name, key, limit);
                continue 'rules;
            }
        }

        info!("rule #{} for bram type {} accepted", rule_index, rule.name);

        match assign_ports(&memory, bram) {
            Some(assignment) => {
                stitch_grid(module, cell_name, &memory, bram, &assignment);
                module.remove_cell(cell_name);
                return Ok(true);
            }
            None => {
                info!("mapping to bram type {} failed", rule.name);
                failed_brams.insert(rule.name.as_str());
            }
        }
    }

    info!("no acceptable bram resources found for {}", cell_name);
    Ok(false)
}
