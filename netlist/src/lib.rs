mod logic;
mod sig;
mod cell;
mod module;
mod memory;

pub use logic::{Const, Trit};
pub use sig::{SigBit, SigSpec, WireId};
pub use cell::{Cell, ParamValue};
pub use module::{Design, Module, PortDir, Wire};
pub use memory::{MemoryCell, MemoryCellError};
