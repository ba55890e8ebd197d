use std::collections::BTreeMap;

use anyhow::{Result, ensure};
use symbind_core::code::{CodeFlags, CodeRecord, MAX_OPERAND, Opcode, assemble};
use symbind_core::val::Val;

use crate::fixture::Fixture;

/// Fixture for `return v0 + v1 + ... + v{n-1}`, with the variables held as
/// globals or, with `closure`, as free variables. Every variable is also
/// present in `locals` so captured binding inlines all of them.
pub fn sum_fixture(vars: usize, closure: bool) -> Result<Fixture> {
    // One constant per variable is appended after the `nil` at index 0.
    ensure!(
        (1..=MAX_OPERAND).contains(&vars),
        "--vars must be between 1 and {}, got {}",
        MAX_OPERAND,
        vars
    );
    let names: Vec<String> = (0..vars).map(|i| format!("v{}", i)).collect();
    let values: BTreeMap<String, Val> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), Val::Int(i as i64)))
        .collect();

    let load = if closure { Opcode::LoadDeref } else { Opcode::LoadGlobal };
    let mut ops = vec![(load, 0u8)];
    for i in 1..vars {
        ops.push((load, i as u8));
        ops.push((Opcode::BinaryAdd, 0));
    }
    ops.push((Opcode::ReturnValue, 0));

    let mut flags = CodeFlags::OPTIMIZED;
    let mut code = CodeRecord {
        code: Some(assemble(&ops)),
        consts: Some(vec![Val::Nil]),
        name: Some("bench".to_string()),
        filename: Some("<generated>".to_string()),
        stacksize: Some(2),
        ..CodeRecord::default()
    };
    let mut fixture = Fixture {
        name: Some("bench".to_string()),
        locals: values.clone(),
        ..Fixture::default()
    };
    if closure {
        flags.insert(CodeFlags::NESTED);
        fixture.closure = names.iter().map(|name| values[name].clone()).collect();
        code.freevars = Some(names);
    } else {
        flags.insert(CodeFlags::NOFREE);
        fixture.globals = values;
        code.names = Some(names);
    }
    code.flags = Some(flags);
    fixture.code = code;
    Ok(fixture)
}
