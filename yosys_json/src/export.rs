use std::collections::HashMap;
use std::io::Write;

use json::{object, JsonValue};

use brammap_netlist::{Design, Module, ParamValue, PortDir, SigBit, SigSpec, Trit};

use crate::Error;

/// Writes a design in the Yosys JSON netlist format.
pub fn export(writer: &mut impl Write, design: &Design) -> Result<(), Error> {
    let mut modules = JsonValue::new_object();
    for module in design.modules() {
        modules[module.name.as_str()] = export_module(module);
    }
    let root = object! {
        creator: "brammap",
        modules: modules,
    };
    writer.write_all(json::stringify_pretty(root, 2).as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

struct ModuleExporter {
    alias: HashMap<SigBit, SigBit>,
    ids: HashMap<SigBit, u64>,
    next_id: u64,
}

impl ModuleExporter {
    /// Follows module connections from a bit to its driver.
    fn resolve(&self, mut bit: SigBit) -> SigBit {
        let mut hops = 0;
        while let Some(&next) = self.alias.get(&bit) {
            bit = next;
            hops += 1;
            assert!(hops <= self.alias.len(), "connection cycle");
        }
        bit
    }

    fn bit_value(&mut self, bit: SigBit) -> JsonValue {
        match self.resolve(bit) {
            SigBit::Const(Trit::Zero) => "0".into(),
            SigBit::Const(Trit::One) => "1".into(),
            SigBit::Const(Trit::Undef) => "x".into(),
            wire_bit => {
                let next_id = &mut self.next_id;
                let id = *self.ids.entry(wire_bit).or_insert_with(|| {
                    let id = *next_id;
                    *next_id += 1;
                    id
                });
                id.into()
            }
        }
    }

    fn sig_value(&mut self, sig: &SigSpec) -> JsonValue {
        JsonValue::Array(sig.iter().map(|bit| self.bit_value(bit)).collect())
    }
}

fn param_value(value: &ParamValue) -> JsonValue {
    match value {
        ParamValue::Const(value) => value.to_string().into(),
        ParamValue::Int(value) => (*value).into(),
        ParamValue::String(value) => value.as_str().into(),
    }
}

fn export_module(module: &Module) -> JsonValue {
    let mut alias = HashMap::new();
    for (lhs, rhs) in module.connections() {
        for (l, r) in lhs.iter().zip(rhs.iter()) {
            alias.entry(l).or_insert(r);
        }
    }
    let mut exporter = ModuleExporter { alias, ids: HashMap::new(), next_id: 2 };

    // number net bits in wire declaration order, for a stable output
    for (id, wire) in module.wires() {
        for offset in 0..wire.width {
            exporter.bit_value(SigBit::Wire(id, offset as u32));
        }
    }

    let mut ports = JsonValue::new_object();
    for (name, dir, sig) in module.ports() {
        let direction = match dir {
            PortDir::Input => "input",
            PortDir::Output => "output",
            PortDir::Inout => "inout",
        };
        ports[name.as_str()] = object! {
            direction: direction,
            bits: exporter.sig_value(sig),
        };
    }

    let mut cells = JsonValue::new_object();
    for (name, cell) in module.cells() {
        let mut parameters = JsonValue::new_object();
        for (param_name, value) in &cell.params {
            parameters[param_name.as_str()] = param_value(value);
        }
        let mut connections = JsonValue::new_object();
        for (port_name, sig) in &cell.ports {
            connections[port_name.as_str()] = exporter.sig_value(sig);
        }
        cells[name.as_str()] = object! {
            "type": cell.kind.as_str(),
            parameters: parameters,
            connections: connections,
        };
    }

    let mut netnames = JsonValue::new_object();
    for (id, wire) in module.wires() {
        let sig = module.wire_sig(id);
        let bits = exporter.sig_value(&sig);
        netnames[wire.name.as_str()] = object! {
            hide_name: if wire.name.starts_with('$') { 1 } else { 0 },
            bits: bits,
        };
    }

    object! {
        ports: ports,
        cells: cells,
        netnames: netnames,
    }
}
