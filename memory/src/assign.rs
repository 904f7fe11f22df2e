use std::collections::{BTreeMap, HashSet};

use log::debug;

use brammap_netlist::{MemoryCell, SigBit, SigSpec};

use crate::rules::{BramType, PortInfo};

/// A clock domain: the clock signal and its effective polarity.  Logical
/// ports without a clock enable share the pseudo-domain `(1, false)`.
pub type ClockDomain = (SigBit, bool);

const ASYNC_DOMAIN: ClockDomain = (SigBit::ONE, false);

/// A complete binding of the logical ports of a memory to physical BRAM
/// ports, possibly across several grid replicas.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub portinfos: Vec<PortInfo>,
    /// Number of grid replicas; replicas beyond the first exist to supply
    /// additional read ports and share all write ports.
    pub dup_count: usize,
    /// Clock cohort id to bound clock domain.
    pub clock_domains: BTreeMap<usize, ClockDomain>,
    /// Polarity cohort id to bound polarity.  Ids 0 and 1 are preset to
    /// false and true.
    pub clock_polarities: BTreeMap<usize, bool>,
    /// Highest clock cohort id of the undeduplicated port list; the emitted
    /// `CLK<n>` namespace is this id space.
    pub clocks_max: usize,
    /// Highest polarity cohort id of the undeduplicated port list.
    pub clkpol_max: usize,
}

fn domain_name(clken: bool, clkdom: ClockDomain) -> String {
    let polarity = if clkdom.1 { "" } else { "!" };
    if clken {
        format!("{}{}", polarity, clkdom.0)
    } else {
        format!("{}~async~", polarity)
    }
}

/// Checks a physical port against the clock requirements of a logical port.
/// Returns the reason the port cannot be used, if any.
fn clock_conflict(
    pi: &PortInfo,
    clken: bool,
    clkdom: ClockDomain,
    clock_domains: &BTreeMap<usize, ClockDomain>,
    clock_polarities: &BTreeMap<usize, bool>,
) -> Option<&'static str> {
    if clken {
        if pi.clocks == 0 {
            return Some("has incompatible clock type");
        }
        if clock_domains.get(&pi.clocks).is_some_and(|&domain| domain != clkdom) {
            return Some("is in a different clock domain");
        }
        if clock_polarities.get(&pi.clkpol).is_some_and(|&polarity| polarity != clkdom.1) {
            return Some("has incompatible clock polarity");
        }
    } else if pi.clocks != 0 {
        return Some("has incompatible clock type");
    }
    None
}

/// Collects one enable bit per byte lane of a write port, checking that all
/// enable bits within each lane agree.  A port without byte enables accepts
/// only a constant-one enable.  Returns `None` on a lane disagreement.
fn collect_write_enable(memory: &MemoryCell, port: usize, enable: usize, bram_dbits: usize) -> Option<SigSpec> {
    let wr_en = memory.write_en(port);
    let mut sig_en = SigSpec::new();
    let mut last_en_bit = SigBit::ONE;
    for bit in 0..memory.width {
        if enable != 0 && bit % (bram_dbits / enable) == 0 {
            last_en_bit = wr_en[bit];
            sig_en.push(last_en_bit);
        }
        if last_en_bit != wr_en[bit] {
            return None;
        }
    }
    Some(sig_en)
}

fn bind_clock(
    pi: &mut PortInfo,
    clken: bool,
    clkdom: ClockDomain,
    clock_domains: &mut BTreeMap<usize, ClockDomain>,
    clock_polarities: &mut BTreeMap<usize, bool>,
) {
    if clken {
        clock_domains.insert(pi.clocks, clkdom);
        clock_polarities.insert(pi.clkpol, clkdom.1);
        pi.sig_clock = clkdom.0;
        pi.effective_clkpol = clkdom.1;
    }
}

/// Appends one grid replica to the port list.  Write ports keep their cohort
/// ids and their binding, sharing the logical write ports across replicas;
/// read ports of the new replica get their cohort ids shifted into a fresh
/// range unless the cohort is pinned by a write port.  The binding state of
/// every read port is cleared.
fn grow_read_ports(
    portinfos: &mut Vec<PortInfo>,
    dup_count: usize,
    clocks_max: usize,
    clkpol_max: usize,
    clocks_wr_ports: &HashSet<usize>,
    clkpol_wr_ports: &HashSet<usize>,
) {
    let mut new_portinfos = Vec::with_capacity(portinfos.len() * 2);
    for mut pi in portinfos.drain(..) {
        if !pi.wrmode {
            pi.clear_binding();
        }
        let last_replica = pi.dupidx == dup_count - 1;
        new_portinfos.push(pi.clone());
        if last_replica {
            if pi.clocks != 0 && !clocks_wr_ports.contains(&pi.clocks) {
                pi.clocks += clocks_max;
            }
            if pi.clkpol > 1 && !clkpol_wr_ports.contains(&pi.clkpol) {
                pi.clkpol += clkpol_max;
            }
            pi.dupidx += 1;
            new_portinfos.push(pi);
        }
    }
    *portinfos = new_portinfos;
}

/// Binds every logical port of `memory` to a physical port of `bram`,
/// duplicating the grid as needed to cover the read ports.  Returns `None`
/// when no legal binding exists.
pub fn assign_ports(memory: &MemoryCell, bram: &BramType) -> Option<Assignment> {
    let mut portinfos = bram.make_portinfos();

    let mut clock_domains = BTreeMap::new();
    let mut clock_polarities = BTreeMap::from([(0, false), (1, true)]);
    let mut clocks_wr_ports = HashSet::new();
    let mut clkpol_wr_ports = HashSet::new();
    let mut clocks_max = 0;
    let mut clkpol_max = 0;

    for pi in &portinfos {
        if pi.wrmode {
            clocks_wr_ports.insert(pi.clocks);
            if pi.clkpol > 1 {
                clkpol_wr_ports.insert(pi.clkpol);
            }
        }
        clocks_max = clocks_max.max(pi.clocks);
        clkpol_max = clkpol_max.max(pi.clkpol);
    }

    // Write ports bind in index order, advancing a cursor over the port list
    // that never backs up: a physical port skipped for one write port is not
    // reconsidered for a later one.
    let mut cursor = 0;
    'write_ports: for port in 0..memory.wr_ports {
        let clken = memory.wr_clken(port);
        let clkdom = if clken { (memory.wr_clk_bit(port), memory.wr_clkpol(port)) } else { ASYNC_DOMAIN };
        debug!("write port #{} is in clock domain {}", port, domain_name(clken, clkdom));

        while cursor < portinfos.len() {
            let index = cursor;
            cursor += 1;
            let pi = &portinfos[index];
            if !pi.wrmode {
                continue;
            }
            if let Some(reason) = clock_conflict(pi, clken, clkdom, &clock_domains, &clock_polarities) {
                debug!("bram port {} {}", pi.label(), reason);
                continue;
            }
            let Some(sig_en) = collect_write_enable(memory, port, pi.enable, bram.dbits) else {
                debug!("bram port {} has incompatible enable structure", pi.label());
                continue;
            };
            let pi = &mut portinfos[index];
            debug!("mapped to bram port {}", pi.label());
            pi.mapped_port = Some(port);
            bind_clock(pi, clken, clkdom, &mut clock_domains, &mut clock_polarities);
            pi.sig_en = sig_en;
            pi.sig_addr = memory.write_addr(port);
            pi.sig_data = memory.write_data(port);
            continue 'write_ports;
        }

        debug!("failed to map write port #{}", port);
        return None;
    }

    // Read ports scan the whole port list each time.  When a read port
    // cannot be placed and some later read port has been placed since the
    // last growth, the grid is duplicated, read bindings are dropped, the
    // cohort maps roll back to their post-write state, and the read phase
    // starts over.
    let mut dup_count = 1;
    let backup_clock_domains = clock_domains.clone();
    let backup_clock_polarities = clock_polarities.clone();
    let mut grow_cursor: Option<usize> = None;
    let mut try_growing = false;

    let mut port = 0;
    while port < memory.rd_ports {
        let clken = memory.rd_clken(port);
        let clkdom = if clken { (memory.rd_clk_bit(port), memory.rd_clkpol(port)) } else { ASYNC_DOMAIN };
        debug!("read port #{} is in clock domain {}", port, domain_name(clken, clkdom));

        let mut mapped = false;
        for index in 0..portinfos.len() {
            let pi = &portinfos[index];
            if pi.wrmode || pi.mapped_port.is_some() {
                continue;
            }
            if let Some(reason) = clock_conflict(pi, clken, clkdom, &clock_domains, &clock_polarities) {
                debug!("bram port {}.{} {}", pi.label(), pi.dupidx + 1, reason);
                continue;
            }
            let pi = &mut portinfos[index];
            debug!("mapped to bram port {}.{}", pi.label(), pi.dupidx + 1);
            pi.mapped_port = Some(port);
            bind_clock(pi, clken, clkdom, &mut clock_domains, &mut clock_polarities);
            pi.sig_addr = memory.read_addr(port);
            pi.sig_data = memory.read_data(port);
            if grow_cursor.map_or(true, |highest| highest < port) {
                grow_cursor = Some(port);
                try_growing = true;
            }
            mapped = true;
            break;
        }

        if mapped {
            port += 1;
            continue;
        }
        debug!("failed to map read port #{}", port);
        if !try_growing {
            return None;
        }
        debug!("growing more read ports by duplicating bram cells");
        grow_read_ports(&mut portinfos, dup_count, clocks_max, clkpol_max, &clocks_wr_ports, &clkpol_wr_ports);
        try_growing = false;
        clock_domains = backup_clock_domains.clone();
        clock_polarities = backup_clock_polarities.clone();
        dup_count += 1;
        port = 0;
    }

    Some(Assignment { portinfos, dup_count, clock_domains, clock_polarities, clocks_max, clkpol_max })
}
