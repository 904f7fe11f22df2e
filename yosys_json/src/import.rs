use std::collections::HashMap;
use std::io::Read;

use json::JsonValue;

use brammap_netlist::{Cell, Const, Design, Module, ParamValue, PortDir, SigBit, SigSpec, Trit};

use crate::{syntax_error, Error};

/// Reads a design in the Yosys JSON netlist format.
pub fn import(reader: &mut impl Read) -> Result<Design, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let root = json::parse(&text)?;
    let modules = &root["modules"];
    if !modules.is_object() {
        return syntax_error(&root);
    }
    let mut design = Design::new();
    for (name, value) in modules.entries() {
        let importer = ModuleImporter { module: Module::new(name), bit_map: HashMap::new() };
        design.add_module(importer.import(value)?);
    }
    Ok(design)
}

struct ModuleImporter {
    module: Module,
    bit_map: HashMap<u64, SigBit>,
}

fn const_bit(value: &JsonValue) -> Result<Trit, Error> {
    match value.as_str() {
        Some("0") => Ok(Trit::Zero),
        Some("1") => Ok(Trit::One),
        Some("x") | Some("z") => Ok(Trit::Undef),
        _ => syntax_error(value),
    }
}

fn import_param(value: &JsonValue) -> Result<ParamValue, Error> {
    if let Some(int) = value.as_i64() {
        return Ok(ParamValue::Int(int));
    }
    let Some(text) = value.as_str() else {
        return syntax_error(value);
    };
    let mut trits = vec![];
    for chr in text.chars().rev() {
        match chr {
            '0' => trits.push(Trit::Zero),
            '1' => trits.push(Trit::One),
            'x' | 'z' => trits.push(Trit::Undef),
            _ => return Ok(ParamValue::String(text.to_string())),
        }
    }
    if trits.is_empty() {
        return Ok(ParamValue::String(String::new()));
    }
    Ok(ParamValue::Const(Const::from(trits)))
}

impl ModuleImporter {
    fn import(mut self, value: &JsonValue) -> Result<Module, Error> {
        // netnames first, so that cell connections resolve to named wires
        for (net_name, details) in value["netnames"].entries() {
            self.import_netname(net_name, details)?;
        }
        for (port_name, details) in value["ports"].entries() {
            let dir = match details["direction"].as_str() {
                Some("input") => PortDir::Input,
                Some("output") => PortDir::Output,
                Some("inout") => PortDir::Inout,
                _ => return syntax_error(details),
            };
            let sig = self.sig(&details["bits"])?;
            self.module.add_port(port_name, dir, sig);
        }
        for (cell_name, details) in value["cells"].entries() {
            let Some(kind) = details["type"].as_str() else {
                return syntax_error(details);
            };
            let mut cell = Cell::new(kind);
            for (param_name, param_value) in details["parameters"].entries() {
                cell.set_param(param_name, import_param(param_value)?);
            }
            for (port_name, bits) in details["connections"].entries() {
                let sig = self.sig(bits)?;
                cell.set_port(port_name, sig);
            }
            self.module.add_cell(cell_name, cell);
        }
        Ok(self.module)
    }

    /// Creates the wire for a netname entry.  Bits already claimed by an
    /// earlier netname, and constant bits, become connections aliasing this
    /// wire to the existing signal.
    fn import_netname(&mut self, net_name: &str, details: &JsonValue) -> Result<(), Error> {
        let bits = &details["bits"];
        if !bits.is_array() {
            return syntax_error(details);
        }
        let sig = self.module.add_wire(net_name, bits.len());
        let mut alias_lhs = SigSpec::new();
        let mut alias_rhs = SigSpec::new();
        for (offset, bit) in bits.members().enumerate() {
            match bit.as_u64() {
                Some(id) => {
                    if let Some(&mapped) = self.bit_map.get(&id) {
                        alias_lhs.push(sig[offset]);
                        alias_rhs.push(mapped);
                    } else {
                        self.bit_map.insert(id, sig[offset]);
                    }
                }
                None => {
                    alias_lhs.push(sig[offset]);
                    alias_rhs.push(SigBit::Const(const_bit(bit)?));
                }
            }
        }
        if !alias_lhs.is_empty() {
            self.module.connect(alias_lhs, alias_rhs);
        }
        Ok(())
    }

    fn sig(&mut self, bits: &JsonValue) -> Result<SigSpec, Error> {
        if !bits.is_array() {
            return syntax_error(bits);
        }
        let mut sig = SigSpec::new();
        for bit in bits.members() {
            match bit.as_u64() {
                Some(id) => {
                    let bit = match self.bit_map.get(&id) {
                        Some(&bit) => bit,
                        None => {
                            // a net that appears on no netname
                            let wire = self.module.add_wire(format!("$net${}", id), 1);
                            self.bit_map.insert(id, wire[0]);
                            wire[0]
                        }
                    };
                    sig.push(bit);
                }
                None => sig.push(SigBit::Const(const_bit(bit)?)),
            }
        }
        Ok(sig)
    }
}
