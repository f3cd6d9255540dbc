//! WebAssembly tables
//!
//! A table is a typed vector of references. Function tables back
//! `call_indirect`; their slots are filled by active element segments at
//! instantiation.

use super::{RuntimeError, Trap, Value};
use crate::ast::{Limits, RefType, TableType, ValueType};

#[derive(Debug)]
pub struct Table {
    ref_type: RefType,
    elements: Vec<Value>,
    limits: Limits,
}

impl Table {
    /// A table of `limits.min` null references
    pub fn new(table_type: TableType) -> Self {
        let null = null_of(table_type.ref_type);
        Table {
            ref_type: table_type.ref_type,
            elements: vec![null; table_type.limits.min as usize],
            limits: table_type.limits,
        }
    }

    pub fn ref_type(&self) -> RefType {
        self.ref_type
    }

    /// Current size and declared maximum, as checked against table imports
    pub fn limits(&self) -> Limits {
        Limits {
            min: self.size(),
            max: self.limits.max,
        }
    }

    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    pub fn get(&self, index: u32) -> Result<Value, RuntimeError> {
        self.elements
            .get(index as usize)
            .copied()
            .ok_or(Trap::TableOutOfBounds.into())
    }

    /// Copy `values` into consecutive slots starting at `offset`. Nothing is
    /// written if the range does not fit.
    pub fn init(&mut self, offset: u32, values: &[Value]) -> Result<(), RuntimeError> {
        let start = offset as usize;
        let end = start.checked_add(values.len()).ok_or(Trap::TableOutOfBounds)?;
        if end > self.elements.len() {
            return Err(Trap::TableOutOfBounds.into());
        }
        for value in values {
            self.validate_element(value)?;
        }
        self.elements[start..end].copy_from_slice(values);
        Ok(())
    }

    fn validate_element(&self, value: &Value) -> Result<(), RuntimeError> {
        match (&self.ref_type, value) {
            (RefType::FuncRef, Value::FuncRef(_)) => Ok(()),
            (RefType::ExternRef, Value::ExternRef(_)) => Ok(()),
            _ => Err(RuntimeError::TypeMismatch {
                expected: ValueType::from(self.ref_type).to_string(),
                actual: value.typ().to_string(),
            }),
        }
    }
}

fn null_of(ref_type: RefType) -> Value {
    match ref_type {
        RefType::FuncRef => Value::FuncRef(None),
        RefType::ExternRef => Value::ExternRef(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::FuncAddr;

    fn funcref_table(min: u32, max: Option<u32>) -> Table {
        Table::new(TableType {
            ref_type: RefType::FuncRef,
            limits: Limits { min, max },
        })
    }

    #[test]
    fn test_table_creation() {
        let table = funcref_table(10, Some(20));
        assert_eq!(table.size(), 10);
        assert_eq!(table.limits(), Limits { min: 10, max: Some(20) });
        assert_eq!(table.get(9).unwrap(), Value::FuncRef(None));

        let table = Table::new(TableType {
            ref_type: RefType::ExternRef,
            limits: Limits { min: 2, max: None },
        });
        assert_eq!(table.get(0).unwrap(), Value::ExternRef(None));
    }

    #[test]
    fn test_table_get() {
        let mut table = funcref_table(4, None);
        table.init(1, &[Value::FuncRef(Some(FuncAddr(42)))]).unwrap();
        assert_eq!(table.get(1).unwrap(), Value::FuncRef(Some(FuncAddr(42))));

        assert!(matches!(table.get(4), Err(RuntimeError::Trap(Trap::TableOutOfBounds))));
        assert!(matches!(
            table.init(0, &[Value::I32(1)]),
            Err(RuntimeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_table_init() {
        let mut table = funcref_table(4, None);
        let refs = [Value::FuncRef(Some(FuncAddr(1))), Value::FuncRef(Some(FuncAddr(2)))];
        table.init(2, &refs).unwrap();
        assert_eq!(table.get(3).unwrap(), Value::FuncRef(Some(FuncAddr(2))));

        // does not fit: nothing written
        let mut table = funcref_table(4, None);
        assert!(matches!(
            table.init(3, &refs),
            Err(RuntimeError::Trap(Trap::TableOutOfBounds))
        ));
        assert_eq!(table.get(3).unwrap(), Value::FuncRef(None));
    }
}
