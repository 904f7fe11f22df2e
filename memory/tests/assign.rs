use brammap_memory::{assign_ports, BramType};
use brammap_netlist::{Const, MemoryCell, Module, SigBit, SigSpec};

/// A memory with clocked (positive edge) write ports whose enable is one
/// shared bit per port, and asynchronous read ports.
fn simple_memory(
    module: &mut Module,
    size: usize,
    abits: usize,
    width: usize,
    wr_ports: usize,
    rd_ports: usize,
) -> MemoryCell {
    let wr_clk = module.add_wire("wr_clk", wr_ports);
    let wr_addr = module.add_wire("wr_addr", wr_ports * abits);
    let wr_data = module.add_wire("wr_data", wr_ports * width);
    let rd_addr = module.add_wire("rd_addr", rd_ports * abits);
    let rd_data = module.add_wire("rd_data", rd_ports * width);
    let wr_en_bits = module.add_wire("wr_en", wr_ports);
    let mut wr_en = SigSpec::new();
    for port in 0..wr_ports {
        for _ in 0..width {
            wr_en.push(wr_en_bits[port]);
        }
    }
    MemoryCell {
        size,
        abits,
        width,
        wr_ports,
        rd_ports,
        wr_clk_enable: Const::ones(wr_ports),
        wr_clk_polarity: Const::ones(wr_ports),
        rd_clk_enable: Const::zero(rd_ports),
        rd_clk_polarity: Const::zero(rd_ports),
        rd_transparent: Const::zero(rd_ports),
        wr_clk,
        wr_en,
        wr_addr,
        wr_data,
        rd_clk: SigSpec::undef(rd_ports),
        rd_addr,
        rd_data,
    }
}

/// Makes every read port clocked by the given wire, positive edge.
fn clock_reads(memory: &mut MemoryCell, rd_clk: SigSpec) {
    memory.rd_clk_enable = Const::ones(memory.rd_ports);
    memory.rd_clk_polarity = Const::ones(memory.rd_ports);
    memory.rd_clk = rd_clk;
}

/// One write group and one read group of one port each, sharing a clock
/// cohort, per-bit write enables.
fn dual_port_bram(abits: usize, dbits: usize) -> BramType {
    BramType {
        name: "R2".into(),
        abits,
        dbits,
        groups: 2,
        ports: vec![1, 1],
        wrmode: vec![true, false],
        enable: vec![dbits, 0],
        transp: vec![0, 0],
        clocks: vec![1, 1],
        clkpol: vec![1, 1],
        ..Default::default()
    }
}

#[test]
fn test_single_port() {
    let mut module = Module::new("top");
    let memory = simple_memory(&mut module, 4, 2, 4, 1, 0);
    let bram = BramType {
        name: "R".into(),
        abits: 2,
        dbits: 4,
        groups: 1,
        ports: vec![1],
        wrmode: vec![true],
        enable: vec![4],
        clocks: vec![1],
        clkpol: vec![1],
        ..Default::default()
    };
    let assignment = assign_ports(&memory, &bram).unwrap();
    assert_eq!(assignment.dup_count, 1);
    assert_eq!(assignment.portinfos.len(), 1);
    let pi = &assignment.portinfos[0];
    assert_eq!(pi.mapped_port, Some(0));
    assert_eq!(pi.sig_clock, memory.wr_clk[0]);
    assert!(pi.effective_clkpol);
    assert_eq!(pi.sig_addr, memory.write_addr(0));
    assert_eq!(pi.sig_data, memory.write_data(0));
    // one enable lane per data bit, all fed by the shared enable bit
    assert_eq!(pi.sig_en.len(), 4);
    assert!(pi.sig_en.iter().all(|bit| bit == memory.wr_en[0]));
    assert_eq!(assignment.clock_domains[&1], (memory.wr_clk[0], true));
}

#[test]
fn test_write_read_same_clock() {
    let mut module = Module::new("top");
    let clk = module.add_wire("clk", 1);
    let mut memory = simple_memory(&mut module, 4, 2, 4, 1, 1);
    memory.wr_clk = clk.clone();
    clock_reads(&mut memory, clk.clone());
    let assignment = assign_ports(&memory, &dual_port_bram(2, 4)).unwrap();
    assert_eq!(assignment.dup_count, 1);
    // both logical ports bound, to distinct physical ports
    let write = assignment.portinfos.iter().find(|pi| pi.wrmode).unwrap();
    let read = assignment.portinfos.iter().find(|pi| !pi.wrmode).unwrap();
    assert_eq!(write.mapped_port, Some(0));
    assert_eq!(read.mapped_port, Some(0));
    assert_eq!(read.sig_addr, memory.read_addr(0));
    assert_eq!(read.sig_data, memory.read_data(0));
    assert_eq!(assignment.clock_domains[&1], (clk[0], true));
}

#[test]
fn test_clock_domain_conflict() {
    let mut module = Module::new("top");
    let wr_clk = module.add_wire("wck", 1);
    let rd_clk = module.add_wire("rck", 1);
    let mut memory = simple_memory(&mut module, 4, 2, 4, 1, 1);
    memory.wr_clk = wr_clk;
    clock_reads(&mut memory, rd_clk);
    // both groups share clock cohort 1, but the ports use different clocks
    assert!(assign_ports(&memory, &dual_port_bram(2, 4)).is_none());

    // separate cohorts accept the two clocks
    let mut bram = dual_port_bram(2, 4);
    bram.clocks = vec![1, 2];
    let assignment = assign_ports(&memory, &bram).unwrap();
    assert_eq!(assignment.clock_domains.len(), 2);
}

#[test]
fn test_polarity_conflict() {
    let mut module = Module::new("top");
    let clk = module.add_wire("clk", 1);
    let mut memory = simple_memory(&mut module, 4, 2, 4, 1, 1);
    memory.wr_clk = clk.clone();
    clock_reads(&mut memory, clk.clone());
    // negative-edge read against a positive-edge write
    memory.rd_clk_polarity = Const::zero(1);

    // same clock cohort: the read port no longer fits
    assert!(assign_ports(&memory, &dual_port_bram(2, 4)).is_none());

    // distinct clock cohorts but one shared configurable polarity cohort:
    // still rejected
    let mut bram = dual_port_bram(2, 4);
    bram.clocks = vec![1, 2];
    bram.clkpol = vec![3, 3];
    assert!(assign_ports(&memory, &bram).is_none());

    // distinct polarity cohorts bind to opposite polarities
    bram.clkpol = vec![3, 4];
    let assignment = assign_ports(&memory, &bram).unwrap();
    assert_eq!(assignment.clock_polarities[&3], true);
    assert_eq!(assignment.clock_polarities[&4], false);
}

#[test]
fn test_async_read_rejects_clocked_only_bram() {
    let mut module = Module::new("top");
    let memory = simple_memory(&mut module, 4, 2, 4, 1, 1);
    // reads stay asynchronous; the bram read group is clocked
    assert!(assign_ports(&memory, &dual_port_bram(2, 4)).is_none());

    // an unclocked read group accepts it
    let mut bram = dual_port_bram(2, 4);
    bram.clocks = vec![1, 0];
    let assignment = assign_ports(&memory, &bram).unwrap();
    let read = assignment.portinfos.iter().find(|pi| !pi.wrmode).unwrap();
    assert_eq!(read.mapped_port, Some(0));
    // no clock was bound for the read port
    assert_eq!(assignment.clock_domains.len(), 1);
}

#[test]
fn test_enable_lane_disagreement() {
    let mut module = Module::new("top");
    let mut memory = simple_memory(&mut module, 4, 2, 4, 1, 0);
    // distinct enable bits per data bit
    memory.wr_en = module.add_wire("en", 4);

    // per-bit enables: fine
    let mut bram = dual_port_bram(2, 4);
    assert!(assign_ports(&memory, &bram).is_some());

    // one enable lane covering all four bits: lanes disagree
    bram.enable = vec![1, 0];
    assert!(assign_ports(&memory, &bram).is_none());

    // two lanes of two bits: still disagreeing within a lane
    bram.enable = vec![2, 0];
    assert!(assign_ports(&memory, &bram).is_none());
}

#[test]
fn test_no_enable_bits_requires_constant_one() {
    let mut module = Module::new("top");
    let mut memory = simple_memory(&mut module, 4, 2, 4, 1, 0);
    let mut bram = dual_port_bram(2, 4);
    bram.enable = vec![0, 0];

    // a wire enable cannot be expressed without enable inputs
    assert!(assign_ports(&memory, &bram).is_none());

    // an always-on enable can
    memory.wr_en = SigSpec::from_iter(std::iter::repeat(SigBit::ONE).take(4));
    let assignment = assign_ports(&memory, &bram).unwrap();
    assert!(assignment.portinfos[0].sig_en.is_empty());
}

#[test]
fn test_duplication_two_reads() {
    let mut module = Module::new("top");
    let clk = module.add_wire("clk", 1);
    let mut memory = simple_memory(&mut module, 4, 2, 4, 1, 2);
    memory.wr_clk = clk.clone();
    let mut rd_clk = clk.clone();
    rd_clk.append(&clk);
    clock_reads(&mut memory, rd_clk);

    let assignment = assign_ports(&memory, &dual_port_bram(2, 4)).unwrap();
    assert_eq!(assignment.dup_count, 2);
    assert_eq!(assignment.portinfos.len(), 4);

    // the write port is fanned out to both replicas
    let writes: Vec<_> = assignment.portinfos.iter().filter(|pi| pi.wrmode).collect();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].dupidx, 0);
    assert_eq!(writes[1].dupidx, 1);
    assert!(writes.iter().all(|pi| pi.mapped_port == Some(0) && pi.sig_data == memory.write_data(0)));

    // read port 0 lands on replica 0, read port 1 on replica 1
    let reads: Vec<_> = assignment.portinfos.iter().filter(|pi| !pi.wrmode).collect();
    assert_eq!(reads.len(), 2);
    assert_eq!((reads[0].dupidx, reads[0].mapped_port), (0, Some(0)));
    assert_eq!((reads[1].dupidx, reads[1].mapped_port), (1, Some(1)));
    assert_eq!(reads[1].sig_addr, memory.read_addr(1));

    // the read clock cohort is shared with the write ports, so the replica
    // keeps the unshifted id
    assert!(reads.iter().all(|pi| pi.clocks == 1));
}

#[test]
fn test_duplication_shifts_free_read_cohorts() {
    let mut module = Module::new("top");
    let wr_clk = module.add_wire("wck", 1);
    let rd_clk0 = module.add_wire("rck0", 1);
    let rd_clk1 = module.add_wire("rck1", 1);
    let mut memory = simple_memory(&mut module, 4, 2, 4, 1, 2);
    memory.wr_clk = wr_clk;
    let mut rd_clk = rd_clk0.clone();
    rd_clk.append(&rd_clk1);
    clock_reads(&mut memory, rd_clk);

    // the read group has its own clock cohort, so each replica's read clock
    // is independent: two read ports with different clocks map across two
    // replicas
    let mut bram = dual_port_bram(2, 4);
    bram.clocks = vec![1, 2];
    let assignment = assign_ports(&memory, &bram).unwrap();
    assert_eq!(assignment.dup_count, 2);
    let reads: Vec<_> = assignment.portinfos.iter().filter(|pi| !pi.wrmode).collect();
    assert_eq!(reads[0].clocks, 2);
    // the replica's cohort id is shifted past clocks_max
    assert_eq!(reads[1].clocks, 2 + assignment.clocks_max);
    assert_eq!(assignment.clock_domains[&2], (rd_clk0[0], true));
    assert_eq!(assignment.clock_domains[&(2 + assignment.clocks_max)], (rd_clk1[0], true));
}

#[test]
fn test_no_growth_without_progress() {
    let mut module = Module::new("top");
    let memory = simple_memory(&mut module, 4, 2, 4, 1, 1);
    // a write-only bram cannot supply any read port, and must not loop
    let bram = BramType {
        name: "W".into(),
        abits: 2,
        dbits: 4,
        groups: 1,
        ports: vec![1],
        wrmode: vec![true],
        enable: vec![4],
        clocks: vec![1],
        clkpol: vec![1],
        ..Default::default()
    };
    assert!(assign_ports(&memory, &bram).is_none());
}

#[test]
fn test_write_port_exhaustion() {
    let mut module = Module::new("top");
    let memory = simple_memory(&mut module, 4, 2, 4, 2, 0);
    // only one write port available for two logical write ports
    let bram = dual_port_bram(2, 4);
    assert!(assign_ports(&memory, &bram).is_none());
}
