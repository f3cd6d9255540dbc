//! Standard spectest host module for conformance scripts
//!
//! The spectest module provides the host imports that conformance scripts
//! expect: print functions that log their arguments, immutable globals
//! initialised to 666, a memory (1 page min, 2 max), and a funcref table
//! (10 min, 20 max).

use crate::ast::{FunctionType, GlobalType, Limits, RefType, TableType, ValueType};
use crate::runtime::{
    ExternVal, FunctionInstance, GlobalInstance, HostFunc, Interpreter, Memory, ModuleInstance, RuntimeError, Table,
    Value,
};
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

/// Name the module is registered under
pub const SPECTEST: &str = "spectest";

/// Add the spectest instance to `interpreter` and register it as
/// `"spectest"`, returning its instance index
pub fn install(interpreter: &mut Interpreter) -> Result<usize, RuntimeError> {
    let mut instance = ModuleInstance::new(Some(SPECTEST.to_string()));

    add_print(interpreter, &mut instance, "print", vec![]);
    add_print(interpreter, &mut instance, "print_i32", vec![ValueType::I32]);
    add_print(interpreter, &mut instance, "print_i64", vec![ValueType::I64]);
    add_print(interpreter, &mut instance, "print_f32", vec![ValueType::F32]);
    add_print(interpreter, &mut instance, "print_f64", vec![ValueType::F64]);
    add_print(interpreter, &mut instance, "print_i32_f32", vec![ValueType::I32, ValueType::F32]);
    add_print(interpreter, &mut instance, "print_f64_f64", vec![ValueType::F64, ValueType::F64]);

    add_global(&mut instance, "global_i32", Value::I32(666));
    add_global(&mut instance, "global_i64", Value::I64(666));
    add_global(&mut instance, "global_f32", Value::parse(ValueType::F32, "666.6")?);
    add_global(&mut instance, "global_f64", Value::parse(ValueType::F64, "666.6")?);

    let table = Rc::new(RefCell::new(Table::new(TableType {
        ref_type: RefType::FuncRef,
        limits: Limits { min: 10, max: Some(20) },
    })));
    instance.tables.push(table.clone());
    instance.exports.insert("table".to_string(), ExternVal::Table(table));

    let memory = Rc::new(RefCell::new(Memory::from_limits(1, Some(2))?));
    instance.memory = Some(memory.clone());
    instance.exports.insert("memory".to_string(), ExternVal::Memory(memory));

    let index = interpreter.add_instance(instance);
    interpreter.register_instance(index, SPECTEST)?;
    Ok(index)
}

fn add_print(interpreter: &mut Interpreter, instance: &mut ModuleInstance, name: &str, params: Vec<ValueType>) {
    let label = name.to_string();
    let handler: HostFunc = Rc::new(move |args: &[Value]| {
        let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
        info!("{SPECTEST}.{label}({})", rendered.join(", "));
        Ok(Vec::new())
    });
    let addr = interpreter.allocate_function(FunctionInstance::Host {
        name: name.to_string(),
        func_type: FunctionType::new(params, vec![]),
        handler,
    });
    instance.functions.push(addr);
    instance.exports.insert(name.to_string(), ExternVal::Func(addr));
}

fn add_global(instance: &mut ModuleInstance, name: &str, value: Value) {
    let global = GlobalInstance::new(
        GlobalType {
            value_type: value.typ(),
            mutable: false,
        },
        value,
    );
    instance.globals.push(global.clone());
    instance.exports.insert(name.to_string(), ExternVal::Global(global));
}
