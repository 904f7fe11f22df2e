use crate::{Cell, Const, SigBit, SigSpec, Trit};

/// Typed view of a behavioral `$mem` cell.
///
/// Per-port attribute constants are kept zero-extended to the port count, and
/// the signal vectors are the concatenation of the per-port slices, exactly
/// as they appear on the cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCell {
    pub size: usize,
    pub abits: usize,
    pub width: usize,
    pub wr_ports: usize,
    pub rd_ports: usize,

    pub wr_clk_enable: Const,
    pub wr_clk_polarity: Const,
    pub rd_clk_enable: Const,
    pub rd_clk_polarity: Const,
    pub rd_transparent: Const,

    pub wr_clk: SigSpec,
    pub wr_en: SigSpec,
    pub wr_addr: SigSpec,
    pub wr_data: SigSpec,
    pub rd_clk: SigSpec,
    pub rd_addr: SigSpec,
    pub rd_data: SigSpec,
}

#[derive(Debug)]
pub enum MemoryCellError {
    NotMemory { kind: String },
    MissingParam { name: &'static str },
    BadParam { name: &'static str },
    MissingPort { name: &'static str },
    PortWidth { name: &'static str, expected: usize, found: usize },
}

impl std::fmt::Display for MemoryCellError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryCellError::NotMemory { kind } => write!(f, "cell of type {} is not a memory", kind),
            MemoryCellError::MissingParam { name } => write!(f, "missing parameter {}", name),
            MemoryCellError::BadParam { name } => write!(f, "parameter {} is not a valid integer", name),
            MemoryCellError::MissingPort { name } => write!(f, "missing port {}", name),
            MemoryCellError::PortWidth { name, expected, found } => {
                write!(f, "port {} has width {}, expected {}", name, found, expected)
            }
        }
    }
}

impl std::error::Error for MemoryCellError {}

fn param_uint(cell: &Cell, name: &'static str) -> Result<usize, MemoryCellError> {
    let value = cell.get_param(name).ok_or(MemoryCellError::MissingParam { name })?;
    let value = value.as_u64().ok_or(MemoryCellError::BadParam { name })?;
    Ok(value as usize)
}

fn param_const(cell: &Cell, name: &'static str, width: usize) -> Result<Const, MemoryCellError> {
    let value = cell.get_param(name).ok_or(MemoryCellError::MissingParam { name })?;
    let mut value = value.as_const().ok_or(MemoryCellError::BadParam { name })?;
    value.extend_u0(width);
    Ok(value)
}

fn port(cell: &Cell, name: &'static str, width: usize) -> Result<SigSpec, MemoryCellError> {
    let sig = cell.get_port(name).ok_or(MemoryCellError::MissingPort { name })?;
    if sig.len() != width {
        return Err(MemoryCellError::PortWidth { name, expected: width, found: sig.len() });
    }
    Ok(sig.clone())
}

impl MemoryCell {
    pub const KIND: &'static str = "$mem";

    pub fn from_cell(cell: &Cell) -> Result<MemoryCell, MemoryCellError> {
        if cell.kind != Self::KIND {
            return Err(MemoryCellError::NotMemory { kind: cell.kind.clone() });
        }
        let size = param_uint(cell, "SIZE")?;
        let abits = param_uint(cell, "ABITS")?;
        let width = param_uint(cell, "WIDTH")?;
        let wr_ports = param_uint(cell, "WR_PORTS")?;
        let rd_ports = param_uint(cell, "RD_PORTS")?;
        Ok(MemoryCell {
            size,
            abits,
            width,
            wr_ports,
            rd_ports,
            wr_clk_enable: param_const(cell, "WR_CLK_ENABLE", wr_ports)?,
            wr_clk_polarity: param_const(cell, "WR_CLK_POLARITY", wr_ports)?,
            rd_clk_enable: param_const(cell, "RD_CLK_ENABLE", rd_ports)?,
            rd_clk_polarity: param_const(cell, "RD_CLK_POLARITY", rd_ports)?,
            rd_transparent: param_const(cell, "RD_TRANSPARENT", rd_ports)?,
            wr_clk: port(cell, "WR_CLK", wr_ports)?,
            wr_en: port(cell, "WR_EN", wr_ports * width)?,
            wr_addr: port(cell, "WR_ADDR", wr_ports * abits)?,
            wr_data: port(cell, "WR_DATA", wr_ports * width)?,
            rd_clk: port(cell, "RD_CLK", rd_ports)?,
            rd_addr: port(cell, "RD_ADDR", rd_ports * abits)?,
            rd_data: port(cell, "RD_DATA", rd_ports * width)?,
        })
    }

    pub fn to_cell(&self) -> Cell {
        let mut cell = Cell::new(Self::KIND);
        cell.set_param("SIZE", self.size);
        cell.set_param("ABITS", self.abits);
        cell.set_param("WIDTH", self.width);
        cell.set_param("WR_PORTS", self.wr_ports);
        cell.set_param("RD_PORTS", self.rd_ports);
        cell.set_param("WR_CLK_ENABLE", &self.wr_clk_enable);
        cell.set_param("WR_CLK_POLARITY", &self.wr_clk_polarity);
        cell.set_param("RD_CLK_ENABLE", &self.rd_clk_enable);
        cell.set_param("RD_CLK_POLARITY", &self.rd_clk_polarity);
        cell.set_param("RD_TRANSPARENT", &self.rd_transparent);
        cell.set_port("WR_CLK", self.wr_clk.clone());
        cell.set_port("WR_EN", self.wr_en.clone());
        cell.set_port("WR_ADDR", self.wr_addr.clone());
        cell.set_port("WR_DATA", self.wr_data.clone());
        cell.set_port("RD_CLK", self.rd_clk.clone());
        cell.set_port("RD_ADDR", self.rd_addr.clone());
        cell.set_port("RD_DATA", self.rd_data.clone());
        cell
    }

    pub fn wr_clken(&self, port: usize) -> bool {
        self.wr_clk_enable.get(port) == Some(Trit::One)
    }

    pub fn wr_clkpol(&self, port: usize) -> bool {
        self.wr_clk_polarity.get(port) == Some(Trit::One)
    }

    pub fn rd_clken(&self, port: usize) -> bool {
        self.rd_clk_enable.get(port) == Some(Trit::One)
    }

    pub fn rd_clkpol(&self, port: usize) -> bool {
        self.rd_clk_polarity.get(port) == Some(Trit::One)
    }

    pub fn rd_transp(&self, port: usize) -> bool {
        self.rd_transparent.get(port) == Some(Trit::One)
    }

    pub fn wr_clk_bit(&self, port: usize) -> SigBit {
        self.wr_clk[port]
    }

    pub fn rd_clk_bit(&self, port: usize) -> SigBit {
        self.rd_clk[port]
    }

    pub fn write_addr(&self, port: usize) -> SigSpec {
        self.wr_addr.extract(port * self.abits, self.abits)
    }

    pub fn write_data(&self, port: usize) -> SigSpec {
        self.wr_data.extract(port * self.width, self.width)
    }

    pub fn write_en(&self, port: usize) -> SigSpec {
        self.wr_en.extract(port * self.width, self.width)
    }

    pub fn read_addr(&self, port: usize) -> SigSpec {
        self.rd_addr.extract(port * self.abits, self.abits)
    }

    pub fn read_data(&self, port: usize) -> SigSpec {
        self.rd_data.extract(port * self.width, self.width)
    }
}
