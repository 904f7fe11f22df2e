use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::debug;

use brammap_netlist::{Cell, MemoryCell, Module, SigBit, SigSpec};

use crate::assign::Assignment;
use crate::rules::BramType;

/// Read-data aggregation across grid tiles: for each logical read slice, the
/// registered tile-select bits and the tile data outputs collected so far.
type DoutCache = IndexMap<SigSpec, (SigSpec, SigSpec)>;

/// Emits the grid of BRAM instances implementing a successfully assigned
/// memory, and wires the read data back together.  The original memory cell
/// is left in place; the caller removes it once this returns.
pub fn stitch_grid(
    module: &mut Module,
    cell_name: &str,
    memory: &MemoryCell,
    bram: &BramType,
    assignment: &Assignment,
) {
    let mut dout_cache = DoutCache::new();

    let mut grid_d = 0;
    while grid_d * bram.dbits < memory.width {
        let mut grid_a = 0;
        while grid_a * (1 << bram.abits) < memory.size {
            for dupidx in 0..assignment.dup_count {
                emit_tile(module, cell_name, bram, assignment, grid_d, grid_a, dupidx, &mut dout_cache);
            }
            grid_a += 1;
        }
        grid_d += 1;
    }

    for (sig_data, (sel, dout)) in dout_cache {
        if sel.is_empty() {
            // a single address tile: the tile output is the read data
            assert_eq!(sig_data.len(), dout.len());
            module.connect(sig_data, dout);
        } else {
            // exactly one registered tile select is active per access
            assert_eq!(sig_data.len() * sel.len(), dout.len());
            module.add_pmux(SigSpec::undef(sig_data.len()), dout, sel, sig_data);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_tile(
    module: &mut Module,
    cell_name: &str,
    bram: &BramType,
    assignment: &Assignment,
    grid_d: usize,
    grid_a: usize,
    dupidx: usize,
    dout_cache: &mut DoutCache,
) {
    let name = module.uniquify(format!("{}.{}.{}.{}", cell_name, grid_d, grid_a, dupidx));
    debug!("creating {} cell at grid position <{} {} {}>: {}", bram.name, grid_d, grid_a, dupidx, name);
    let mut cell = Cell::new(bram.name.clone());

    let mut clocks: BTreeMap<usize, SigBit> = BTreeMap::new();

    for pi in &assignment.portinfos {
        if pi.dupidx != dupidx {
            continue;
        }
        let prefix = pi.label();

        if pi.clocks != 0 && (!clocks.contains_key(&pi.clocks) || pi.sig_clock.is_wire()) {
            clocks.insert(pi.clocks, pi.sig_clock);
        }

        // high address bits select the tile along the a axis
        let mut addr_ok = SigSpec::EMPTY;
        if pi.sig_addr.len() > bram.abits {
            let extra_addr = pi.sig_addr.extract(bram.abits, pi.sig_addr.len() - bram.abits);
            let extra_addr_sel = SigSpec::from_uint(grid_a as u64, extra_addr.len());
            addr_ok = module.add_eq(extra_addr, extra_addr_sel);
        }

        if pi.enable != 0 {
            let mut sig_en = pi.sig_en.clone();
            sig_en.extend_u0((grid_d + 1) * pi.enable);
            let mut sig_en = sig_en.extract(grid_d * pi.enable, pi.enable);
            if !addr_ok.is_empty() {
                sig_en = module.add_mux(addr_ok.clone(), sig_en, SigSpec::zero(pi.enable));
            }
            cell.set_port(format!("{}EN", prefix), sig_en);
        }

        let mut sig_data = pi.sig_data.clone();
        sig_data.extend_u0((grid_d + 1) * bram.dbits);
        let mut sig_data = sig_data.extract(grid_d * bram.dbits, bram.dbits);

        if pi.wrmode {
            cell.set_port(format!("{}DATA", prefix), sig_data);
        } else {
            let mut bram_dout = module.add_auto_wire("dout", bram.dbits);
            cell.set_port(format!("{}DATA", prefix), bram_dout.clone());

            // lanes whose logical slice has no driver are dropped from the
            // aggregation entirely
            for bit in (0..bram.dbits).rev() {
                if !sig_data[bit].is_wire() {
                    sig_data.remove(bit);
                    bram_dout.remove(bit);
                }
            }

            // align the tile select with the one-cycle read latency
            let mut addr_ok_q = addr_ok.clone();
            if pi.clocks != 0 && !addr_ok.is_empty() {
                addr_ok_q = module.add_dff(pi.sig_clock, addr_ok.clone(), pi.effective_clkpol);
            }

            let entry = dout_cache.entry(sig_data).or_default();
            entry.0.append(&addr_ok_q);
            entry.1.append(&bram_dout);
        }

        let mut sig_addr = pi.sig_addr.clone();
        sig_addr.extend_u0(bram.abits);
        cell.set_port(format!("{}ADDR", prefix), sig_addr);
    }

    for (&cohort, &sig) in &clocks {
        cell.set_port(format!("CLK{}", (cohort - 1) % assignment.clocks_max + 1), sig);
    }

    for (&cohort, &polarity) in &assignment.clock_polarities {
        if cohort > 1 {
            cell.set_param(format!("CLKPOL{}", (cohort - 1) % assignment.clkpol_max + 1), polarity);
        }
    }

    module.add_cell(name, cell);
}
