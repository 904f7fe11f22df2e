use std::collections::BTreeMap;

use crate::{Const, SigSpec, Trit};

/// Value of a cell parameter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamValue {
    Const(Const),
    Int(i64),
    String(String),
}

impl ParamValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::Const(value) => value.as_uint(),
            ParamValue::Int(value) => u64::try_from(*value).ok(),
            ParamValue::String(_) => None,
        }
    }

    pub fn as_const(&self) -> Option<Const> {
        match self {
            ParamValue::Const(value) => Some(value.clone()),
            ParamValue::Int(value) => u64::try_from(*value).ok().map(|value| {
                let width = 64 - value.leading_zeros() as usize;
                Const::from_uint(value, width.max(1))
            }),
            ParamValue::String(_) => None,
        }
    }
}

impl From<Const> for ParamValue {
    fn from(value: Const) -> Self {
        Self::Const(value)
    }
}

impl From<&Const> for ParamValue {
    fn from(value: &Const) -> Self {
        Self::Const(value.clone())
    }
}

impl From<Trit> for ParamValue {
    fn from(value: Trit) -> Self {
        Self::Const(value.into())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Const(Trit::from(value).into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

/// A cell: an instance of a primitive or of a target cell type, with named
/// parameters and named port connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: String,
    pub params: BTreeMap<String, ParamValue>,
    pub ports: BTreeMap<String, SigSpec>,
}

impl Cell {
    pub fn new(kind: impl Into<String>) -> Self {
        Cell { kind: kind.into(), params: Default::default(), ports: Default::default() }
    }

    pub fn get_param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn get_port(&self, name: &str) -> Option<&SigSpec> {
        self.ports.get(name)
    }

    pub fn set_port(&mut self, name: impl Into<String>, sig: impl Into<SigSpec>) {
        self.ports.insert(name.into(), sig.into());
    }
}
