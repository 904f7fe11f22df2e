use indexmap::IndexMap;

use crate::{Cell, SigBit, SigSpec, WireId};

#[derive(Debug, Clone)]
pub struct Wire {
    pub name: String,
    pub width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDir {
    Input,
    Output,
    Inout,
}

/// A module: named wires, named cells, and a list of connections.
///
/// Cells added through the primitive constructors (`add_eq` and friends) get
/// deterministic `$`-prefixed names from a per-module counter, so rebuilding
/// the same module from the same inputs yields an identical result.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    wires: Vec<Wire>,
    wire_names: IndexMap<String, WireId>,
    cells: IndexMap<String, Cell>,
    ports: IndexMap<String, (PortDir, SigSpec)>,
    connections: Vec<(SigSpec, SigSpec)>,
    next_auto: u32,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            wires: vec![],
            wire_names: IndexMap::new(),
            cells: IndexMap::new(),
            ports: IndexMap::new(),
            connections: vec![],
            next_auto: 0,
        }
    }

    /// Adds a wire and returns the signal covering all of its bits.
    pub fn add_wire(&mut self, name: impl Into<String>, width: usize) -> SigSpec {
        let name = name.into();
        assert!(!self.wire_names.contains_key(&name), "duplicate wire {}", name);
        let id = WireId(self.wires.len() as u32);
        self.wires.push(Wire { name: name.clone(), width });
        self.wire_names.insert(name, id);
        SigSpec::from_iter((0..width).map(|offset| SigBit::Wire(id, offset as u32)))
    }

    pub fn wire(&self, id: WireId) -> &Wire {
        &self.wires[id.index()]
    }

    pub fn wire_sig(&self, id: WireId) -> SigSpec {
        let width = self.wires[id.index()].width;
        SigSpec::from_iter((0..width).map(|offset| SigBit::Wire(id, offset as u32)))
    }

    pub fn find_wire(&self, name: &str) -> Option<WireId> {
        self.wire_names.get(name).copied()
    }

    pub fn wires(&self) -> impl Iterator<Item = (WireId, &Wire)> {
        self.wires.iter().enumerate().map(|(index, wire)| (WireId(index as u32), wire))
    }

    /// Returns `name` if it is free, or `name` with a `$<n>` suffix otherwise.
    pub fn uniquify(&self, name: String) -> String {
        if !self.wire_names.contains_key(&name) && !self.cells.contains_key(&name) {
            return name;
        }
        for index in 1.. {
            let candidate = format!("{}${}", name, index);
            if !self.wire_names.contains_key(&candidate) && !self.cells.contains_key(&candidate) {
                return candidate;
            }
        }
        unreachable!()
    }

    pub fn add_cell(&mut self, name: impl Into<String>, cell: Cell) {
        let name = name.into();
        assert!(!self.cells.contains_key(&name), "duplicate cell {}", name);
        self.cells.insert(name, cell);
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&String, &Cell)> {
        self.cells.iter()
    }

    pub fn remove_cell(&mut self, name: &str) -> Option<Cell> {
        self.cells.shift_remove(name)
    }

    pub fn add_port(&mut self, name: impl Into<String>, dir: PortDir, sig: SigSpec) {
        self.ports.insert(name.into(), (dir, sig));
    }

    pub fn ports(&self) -> impl Iterator<Item = (&String, PortDir, &SigSpec)> {
        self.ports.iter().map(|(name, (dir, sig))| (name, *dir, sig))
    }

    pub fn connect(&mut self, lhs: impl Into<SigSpec>, rhs: impl Into<SigSpec>) {
        let (lhs, rhs) = (lhs.into(), rhs.into());
        assert_eq!(lhs.len(), rhs.len(), "connection width mismatch");
        self.connections.push((lhs, rhs));
    }

    pub fn connections(&self) -> &[(SigSpec, SigSpec)] {
        &self.connections
    }

    fn auto_index(&mut self) -> u32 {
        self.next_auto += 1;
        self.next_auto
    }

    /// Allocates a fresh deterministically named wire.
    pub fn add_auto_wire(&mut self, hint: &str, width: usize) -> SigSpec {
        let index = self.auto_index();
        self.add_wire(format!("${}${}", hint, index), width)
    }

    /// `Y = (A == B)`, one bit.
    pub fn add_eq(&mut self, a: impl Into<SigSpec>, b: impl Into<SigSpec>) -> SigSpec {
        let (a, b) = (a.into(), b.into());
        assert_eq!(a.len(), b.len());
        let index = self.auto_index();
        let y = self.add_wire(format!("$eq${}.y", index), 1);
        let mut cell = Cell::new("$eq");
        cell.set_port("A", a);
        cell.set_port("B", b);
        cell.set_port("Y", y.clone());
        self.add_cell(format!("$eq${}", index), cell);
        y
    }

    /// `Y = S ? B : A`.
    pub fn add_mux(&mut self, sel: impl Into<SigSpec>, when1: impl Into<SigSpec>, when0: impl Into<SigSpec>) -> SigSpec {
        let (sel, b, a) = (sel.into(), when1.into(), when0.into());
        assert_eq!(sel.len(), 1);
        assert_eq!(a.len(), b.len());
        let index = self.auto_index();
        let y = self.add_wire(format!("$mux${}.y", index), a.len());
        let mut cell = Cell::new("$mux");
        cell.set_port("A", a);
        cell.set_port("B", b);
        cell.set_port("S", sel);
        cell.set_port("Y", y.clone());
        self.add_cell(format!("$mux${}", index), cell);
        y
    }

    /// One-hot priority multiplexer driving the existing signal `out`: for the
    /// set bit `i` of `S`, `Y` takes the `i`-th chunk of `B`; `A` when no bit
    /// is set.
    pub fn add_pmux(&mut self, default: SigSpec, data: SigSpec, sel: SigSpec, out: SigSpec) {
        assert_eq!(default.len(), out.len());
        assert_eq!(data.len(), sel.len() * out.len());
        let index = self.auto_index();
        let mut cell = Cell::new("$pmux");
        cell.set_port("A", default);
        cell.set_port("B", data);
        cell.set_port("S", sel);
        cell.set_port("Y", out);
        self.add_cell(format!("$pmux${}", index), cell);
    }

    /// D flip-flop; returns the freshly allocated `Q` signal.
    pub fn add_dff(&mut self, clock: SigBit, data: impl Into<SigSpec>, polarity: bool) -> SigSpec {
        let data = data.into();
        let index = self.auto_index();
        let q = self.add_wire(format!("$dff${}.q", index), data.len());
        let mut cell = Cell::new("$dff");
        cell.set_param("CLK_POLARITY", polarity);
        cell.set_port("CLK", clock);
        cell.set_port("D", data);
        cell.set_port("Q", q.clone());
        self.add_cell(format!("$dff${}", index), cell);
        q
    }
}

/// An ordered collection of modules.
#[derive(Debug, Default)]
pub struct Design {
    modules: IndexMap<String, Module>,
}

impl Design {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_module(&mut self, module: Module) {
        assert!(!self.modules.contains_key(&module.name), "duplicate module {}", module.name);
        self.modules.insert(module.name.clone(), module);
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.get_mut(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> {
        self.modules.values_mut()
    }
}
