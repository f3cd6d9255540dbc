//! Activation frame of a running function

use super::{RuntimeError, Value};

/// Locals of one function invocation and the instance it runs in
#[derive(Debug)]
pub struct Frame {
    /// Index of the owning module instance
    pub instance: usize,
    /// Parameters followed by declared locals
    pub locals: Vec<Value>,
}

impl Frame {
    pub fn new(instance: usize, locals: Vec<Value>) -> Self {
        Frame { instance, locals }
    }

    pub fn local(&self, index: u32) -> Result<Value, RuntimeError> {
        self.locals
            .get(index as usize)
            .copied()
            .ok_or(RuntimeError::UnknownLocal(index))
    }

    pub fn set_local(&mut self, index: u32, value: Value) -> Result<(), RuntimeError> {
        let slot = self
            .locals
            .get_mut(index as usize)
            .ok_or(RuntimeError::UnknownLocal(index))?;
        *slot = value;
        Ok(())
    }
}
