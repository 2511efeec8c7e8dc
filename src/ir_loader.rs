//! Reads a module from `delinear`'s own TOML-based IR interchange format.
//!
//! §6 describes the input as "an IR module in a well-known SSA bitcode
//! format (read by an external loader, handed to the core as an in-memory
//! module)" -- the bitcode format and its loader are explicitly someone
//! else's concern. This is that someone else, standing in with a concrete,
//! round-trippable textual format rather than a stub: a TOML document
//! listing functions, blocks, instructions and terminators, each value
//! named by a string id that later operands refer back to by name (SSA's
//! single-assignment property means a name is never redefined).
//!
//! Failures here become [`IrError::LoadError`] (§7 error kind 1): fatal,
//! the whole run aborts.

use std::collections::HashMap;
use std::path::Path;

use delinear_ir::{BinaryOp, Block, Function, IntCC, IrError, Module, Signature, SwitchCase, Terminator, Type, UnaryOp, Value};
use rustc_hash::FxHashMap;
use serde::Deserialize;

#[derive(Deserialize)]
struct ModuleFile {
    #[serde(default)]
    functions: Vec<FunctionFile>,
}

#[derive(Deserialize)]
struct FunctionFile {
    name: String,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    returns: Vec<String>,
    blocks: Vec<BlockFile>,
}

#[derive(Deserialize)]
struct BlockFile {
    id: u32,
    #[serde(default)]
    params: Vec<ParamFile>,
    #[serde(default)]
    insts: Vec<InstFile>,
    terminator: TerminatorFile,
}

#[derive(Deserialize)]
struct ParamFile {
    id: String,
    ty: String,
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InstFile {
    Iconst { id: String, ty: String, value: i64 },
    Fconst { id: String, ty: String, value: f64 },
    Binary { id: String, op: String, ty: String, lhs: String, rhs: String },
    Unary { id: String, op: String, ty: String, arg: String },
    Icmp { id: String, cc: String, lhs: String, rhs: String },
    Cast { id: String, to: String, from: String, arg: String },
    Call { id: Option<String>, callee: String, ty: String, #[serde(default)] args: Vec<String> },
    Load { id: String, ty: String, addr: String },
    Store { addr: String, value: String },
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TerminatorFile {
    Jump {
        target: u32,
        #[serde(default)]
        args: Vec<String>,
    },
    Branch {
        guard: String,
        then_block: u32,
        #[serde(default)]
        then_args: Vec<String>,
        else_block: u32,
        #[serde(default)]
        else_args: Vec<String>,
    },
    Switch {
        scrutinee: String,
        cases: Vec<CaseFile>,
        default: u32,
    },
    Return {
        #[serde(default)]
        values: Vec<String>,
    },
    Unreachable,
}

#[derive(Deserialize)]
struct CaseFile {
    value: i64,
    target: u32,
}

pub fn load_module(path: &Path) -> Result<Module, IrError> {
    let text = std::fs::read_to_string(path).map_err(|e| IrError::LoadError(format!("reading {}: {e}", path.display())))?;
    let file: ModuleFile = toml::from_str(&text).map_err(|e| IrError::LoadError(format!("parsing {}: {e}", path.display())))?;

    let mut module = Module::new();
    for f in file.functions {
        module.functions.push(build_function(f)?);
    }
    Ok(module)
}

fn build_function(f: FunctionFile) -> Result<Function, IrError> {
    let params = f.params.iter().map(|s| parse_type(s)).collect::<Result<Vec<_>, _>>()?;
    let returns = f.returns.iter().map(|s| parse_type(s)).collect::<Result<Vec<_>, _>>()?;
    let mut func = Function::new(f.name.clone(), Signature { params: params.clone(), returns });

    let mut symbols: FxHashMap<String, Value> = FxHashMap::default();
    for (index, ty) in params.iter().enumerate() {
        symbols.insert(format!("arg{index}"), func.dfg.make_argument(index as u32, *ty));
    }

    let block_ids: HashMap<u32, Block> = f.blocks.iter().map(|b| (b.id, Block::new(b.id))).collect();
    for b in &f.blocks {
        func.layout.append_block(block_ids[&b.id]);
    }

    for b in &f.blocks {
        let block = block_ids[&b.id];
        for p in &b.params {
            let ty = parse_type(&p.ty)?;
            let value = func.dfg.make_block_param(block, ty);
            symbols.insert(p.id.clone(), value);
        }
    }

    for b in &f.blocks {
        let block = block_ids[&b.id];
        for inst in &b.insts {
            build_inst(&mut func, block, inst, &mut symbols, &f.name)?;
        }
        let term = build_terminator(&b.terminator, &block_ids, &symbols, &f.name)?;
        func.dfg.set_terminator(block, term);
    }

    Ok(func)
}

fn build_inst(
    func: &mut Function,
    block: Block,
    inst: &InstFile,
    symbols: &mut FxHashMap<String, Value>,
    function_name: &str,
) -> Result<(), IrError> {
    use delinear_ir::InstructionData as I;
    let lookup = |name: &str, symbols: &FxHashMap<String, Value>| -> Result<Value, IrError> {
        symbols.get(name).copied().ok_or_else(|| {
            IrError::LoadError(format!("function `{function_name}`: undefined value `{name}`"))
        })
    };

    match inst {
        InstFile::Iconst { id, ty, value } => {
            let ty = parse_type(ty)?;
            let data = I::IConst { ty, value: *value };
            let i = func.dfg.make_inst(data);
            let v = func.dfg.make_inst_result(i, ty);
            func.layout.append_inst(block, i);
            symbols.insert(id.clone(), v);
        }
        InstFile::Fconst { id, ty, value } => {
            let ty = parse_type(ty)?;
            let data = I::FConst { ty, bits: value.to_bits() };
            let i = func.dfg.make_inst(data);
            let v = func.dfg.make_inst_result(i, ty);
            func.layout.append_inst(block, i);
            symbols.insert(id.clone(), v);
        }
        InstFile::Binary { id, op, ty, lhs, rhs } => {
            let ty = parse_type(ty)?;
            let op = parse_binop(op, function_name)?;
            let data = I::Binary { op, ty, lhs: lookup(lhs, symbols)?, rhs: lookup(rhs, symbols)? };
            let i = func.dfg.make_inst(data);
            let v = func.dfg.make_inst_result(i, ty);
            func.layout.append_inst(block, i);
            symbols.insert(id.clone(), v);
        }
        InstFile::Unary { id, op, ty, arg } => {
            let ty = parse_type(ty)?;
            let op = parse_unop(op, function_name)?;
            let data = I::Unary { op, ty, arg: lookup(arg, symbols)? };
            let i = func.dfg.make_inst(data);
            let v = func.dfg.make_inst_result(i, ty);
            func.layout.append_inst(block, i);
            symbols.insert(id.clone(), v);
        }
        InstFile::Icmp { id, cc, lhs, rhs } => {
            let cc = parse_cc(cc, function_name)?;
            let data = I::ICmp { cc, lhs: lookup(lhs, symbols)?, rhs: lookup(rhs, symbols)? };
            let i = func.dfg.make_inst(data);
            let v = func.dfg.make_inst_result(i, Type::Bool);
            func.layout.append_inst(block, i);
            symbols.insert(id.clone(), v);
        }
        InstFile::Cast { id, to, from, arg } => {
            let to = parse_type(to)?;
            let from = parse_type(from)?;
            let data = I::Cast { to, from, arg: lookup(arg, symbols)? };
            let i = func.dfg.make_inst(data);
            let v = func.dfg.make_inst_result(i, to);
            func.layout.append_inst(block, i);
            symbols.insert(id.clone(), v);
        }
        InstFile::Call { id, callee, ty, args } => {
            let ty = parse_type(ty)?;
            let arg_values = args.iter().map(|a| lookup(a, symbols)).collect::<Result<Vec<_>, _>>()?;
            let data = I::Call { callee: callee.clone(), ty, args: arg_values };
            let i = func.dfg.make_inst(data);
            func.layout.append_inst(block, i);
            if let Some(id) = id {
                let v = func.dfg.make_inst_result(i, ty);
                symbols.insert(id.clone(), v);
            }
        }
        InstFile::Load { id, ty, addr } => {
            let ty = parse_type(ty)?;
            let data = I::Load { ty, addr: lookup(addr, symbols)? };
            let i = func.dfg.make_inst(data);
            let v = func.dfg.make_inst_result(i, ty);
            func.layout.append_inst(block, i);
            symbols.insert(id.clone(), v);
        }
        InstFile::Store { addr, value } => {
            let data = I::Store { addr: lookup(addr, symbols)?, value: lookup(value, symbols)? };
            let i = func.dfg.make_inst(data);
            func.layout.append_inst(block, i);
        }
    }
    Ok(())
}

fn build_terminator(
    term: &TerminatorFile,
    block_ids: &HashMap<u32, Block>,
    symbols: &FxHashMap<String, Value>,
    function_name: &str,
) -> Result<Terminator, IrError> {
    let block = |id: u32| -> Result<Block, IrError> {
        block_ids.get(&id).copied().ok_or_else(|| IrError::LoadError(format!("function `{function_name}`: undefined block {id}")))
    };
    let value = |name: &str| -> Result<Value, IrError> {
        symbols.get(name).copied().ok_or_else(|| IrError::LoadError(format!("function `{function_name}`: undefined value `{name}`")))
    };
    let values = |names: &[String]| -> Result<Vec<Value>, IrError> { names.iter().map(|n| value(n)).collect() };

    Ok(match term {
        TerminatorFile::Jump { target, args } => Terminator::Jump { target: block(*target)?, args: values(args)? },
        TerminatorFile::Branch { guard, then_block, then_args, else_block, else_args } => Terminator::Branch {
            guard: value(guard)?,
            then_block: block(*then_block)?,
            then_args: values(then_args)?,
            else_block: block(*else_block)?,
            else_args: values(else_args)?,
        },
        TerminatorFile::Switch { scrutinee, cases, default } => Terminator::Switch {
            scrutinee: value(scrutinee)?,
            cases: cases.iter().map(|c| Ok(SwitchCase { value: c.value, target: block(c.target)? })).collect::<Result<Vec<_>, IrError>>()?,
            default: block(*default)?,
        },
        TerminatorFile::Return { values: vs } => Terminator::Return(values(vs)?),
        TerminatorFile::Unreachable => Terminator::Unreachable,
    })
}

fn parse_type(s: &str) -> Result<Type, IrError> {
    Ok(match s {
        "bool" => Type::Bool,
        "i8" => Type::I8,
        "i16" => Type::I16,
        "i32" => Type::I32,
        "i64" => Type::I64,
        "f32" => Type::F32,
        "f64" => Type::F64,
        "ptr" => Type::Ptr,
        "void" => Type::Void,
        other => return Err(IrError::LoadError(format!("unknown type `{other}`"))),
    })
}

fn parse_binop(s: &str, function_name: &str) -> Result<BinaryOp, IrError> {
    Ok(match s {
        "add" => BinaryOp::Add,
        "sub" => BinaryOp::Sub,
        "mul" => BinaryOp::Mul,
        "sdiv" => BinaryOp::SDiv,
        "udiv" => BinaryOp::UDiv,
        "srem" => BinaryOp::SRem,
        "urem" => BinaryOp::URem,
        "and" => BinaryOp::And,
        "or" => BinaryOp::Or,
        "xor" => BinaryOp::Xor,
        "shl" => BinaryOp::Shl,
        "shrs" => BinaryOp::ShrS,
        "shru" => BinaryOp::ShrU,
        other => return Err(IrError::LoadError(format!("function `{function_name}`: unknown binary op `{other}`"))),
    })
}

fn parse_unop(s: &str, function_name: &str) -> Result<UnaryOp, IrError> {
    Ok(match s {
        "neg" => UnaryOp::Neg,
        "not" => UnaryOp::Not,
        "boolnot" => UnaryOp::BoolNot,
        other => return Err(IrError::LoadError(format!("function `{function_name}`: unknown unary op `{other}`"))),
    })
}

fn parse_cc(s: &str, function_name: &str) -> Result<IntCC, IrError> {
    Ok(match s {
        "eq" => IntCC::Equal,
        "ne" => IntCC::NotEqual,
        "slt" => IntCC::SignedLessThan,
        "sge" => IntCC::SignedGreaterThanOrEqual,
        "sgt" => IntCC::SignedGreaterThan,
        "sle" => IntCC::SignedLessThanOrEqual,
        "ult" => IntCC::UnsignedLessThan,
        "uge" => IntCC::UnsignedGreaterThanOrEqual,
        "ugt" => IntCC::UnsignedGreaterThan,
        "ule" => IntCC::UnsignedLessThanOrEqual,
        other => return Err(IrError::LoadError(format!("function `{function_name}`: unknown condition code `{other}`"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_single_block_function() {
        let toml_text = r#"
            [[functions]]
            name = "clamp_zero"
            params = ["i32"]
            returns = ["i32"]

            [[functions.blocks]]
            id = 0

            [[functions.blocks.insts]]
            kind = "iconst"
            id = "zero"
            ty = "i32"
            value = 0

            [[functions.blocks.insts]]
            kind = "icmp"
            id = "is_neg"
            cc = "slt"
            lhs = "arg0"
            rhs = "zero"

            [functions.blocks.terminator]
            kind = "return"
            values = ["zero"]
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("module.toml");
        std::fs::write(&path, toml_text).expect("write fixture");

        let module = load_module(&path).expect("loads cleanly");
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "clamp_zero");
    }

    #[test]
    fn undefined_value_reference_is_a_load_error() {
        let toml_text = r#"
            [[functions]]
            name = "bad"
            params = []
            returns = []

            [[functions.blocks]]
            id = 0

            [functions.blocks.terminator]
            kind = "return"
            values = ["nonexistent"]
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("module.toml");
        std::fs::write(&path, toml_text).expect("write fixture");

        assert!(load_module(&path).is_err());
    }
}
