//! Value semantics for expression evaluation.
//!
//! Values are plain `serde_json::Value`s. Booleans take part in arithmetic and
//! ordering as the integers 0 and 1; integers stay integral until an operation
//! needs a float.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use super::ast::{BinaryOp, CompareOp};
use super::errors::{ExprError, ExprResult, RuntimeCategory};

/// Upper bound on the length of a repeated string or list.
const MAX_REPEAT_LEN: usize = 1 << 24;

/// Numeric view of a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }
}

/// Type name used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Truthiness: null, false, zero, and empty containers are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(*b as i64)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Num::Int(i)),
            None => n.as_f64().map(Num::Float),
        },
        _ => None,
    }
}

/// Integer view for indices and counts; floats are rejected.
pub fn as_int(value: &Value) -> Option<i64> {
    match as_num(value)? {
        Num::Int(n) => Some(n),
        Num::Float(_) => None,
    }
}

pub fn num_to_value(num: Num) -> ExprResult<Value> {
    match num {
        Num::Int(n) => Ok(Value::from(n)),
        Num::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| ExprError::value_error("result is not a finite number")),
    }
}

/// Equality with numeric coercion (`1 == 1.0`, `True == 1`).
pub fn py_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return match (x, y) {
            (Num::Int(x), Num::Int(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        };
    }
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| py_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| py_eq(v, w)))
        }
        _ => false,
    }
}

/// Ordering between two values. Only numbers, strings and lists are ordered.
pub fn compare(a: &Value, b: &Value) -> ExprResult<Ordering> {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return Ok(match (x, y) {
            (Num::Int(x), Num::Int(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        });
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                if !py_eq(l, r) {
                    return compare(l, r);
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        _ => Err(ExprError::type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            type_name(a),
            type_name(b)
        ))),
    }
}

/// Evaluates one link of a comparison chain.
pub fn compare_op(op: CompareOp, a: &Value, b: &Value) -> ExprResult<bool> {
    let ordered = |want: fn(Ordering) -> bool| -> ExprResult<bool> {
        compare(a, b).map(want).map_err(|_| {
            ExprError::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op.symbol(),
                type_name(a),
                type_name(b)
            ))
        })
    };
    match op {
        CompareOp::Eq => Ok(py_eq(a, b)),
        CompareOp::NotEq => Ok(!py_eq(a, b)),
        CompareOp::Lt => ordered(|o| o == Ordering::Less),
        CompareOp::LtEq => ordered(|o| o != Ordering::Greater),
        CompareOp::Gt => ordered(|o| o == Ordering::Greater),
        CompareOp::GtEq => ordered(|o| o != Ordering::Less),
        CompareOp::In => contains(b, a),
        CompareOp::NotIn => contains(b, a).map(|found| !found),
        CompareOp::Is => Ok(identical(a, b)),
        CompareOp::IsNot => Ok(!identical(a, b)),
    }
}

/// `is` holds for singletons of the same kind; JSON values have no identity otherwise.
fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => false,
    }
}

/// Membership test `item in container`.
pub fn contains(container: &Value, item: &Value) -> ExprResult<bool> {
    match container {
        Value::Array(items) => Ok(items.iter().any(|v| py_eq(v, item))),
        Value::Object(map) => match item {
            Value::String(key) => Ok(map.contains_key(key)),
            _ => Ok(false),
        },
        Value::String(haystack) => match item {
            Value::String(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(ExprError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                type_name(other)
            ))),
        },
        other => Err(ExprError::type_error(format!(
            "argument of type '{}' is not iterable",
            type_name(other)
        ))),
    }
}

pub fn negate(value: &Value) -> ExprResult<Value> {
    match as_num(value) {
        Some(Num::Int(n)) => n.checked_neg().map(Value::from).ok_or_else(ExprError::overflow),
        Some(Num::Float(f)) => num_to_value(Num::Float(-f)),
        None => Err(ExprError::type_error(format!(
            "bad operand type for unary -: '{}'",
            type_name(value)
        ))),
    }
}

pub fn positive(value: &Value) -> ExprResult<Value> {
    match as_num(value) {
        Some(n) => num_to_value(n),
        None => Err(ExprError::type_error(format!(
            "bad operand type for unary +: '{}'",
            type_name(value)
        ))),
    }
}

/// Applies an arithmetic operator.
pub fn binary(op: BinaryOp, a: &Value, b: &Value) -> ExprResult<Value> {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return arithmetic(op, x, y).and_then(num_to_value);
    }
    match (op, a, b) {
        (BinaryOp::Add, Value::String(x), Value::String(y)) => {
            Ok(Value::String(format!("{}{}", x, y)))
        }
        (BinaryOp::Add, Value::Array(x), Value::Array(y)) => {
            Ok(Value::Array(x.iter().chain(y).cloned().collect()))
        }
        (BinaryOp::Mul, Value::String(_) | Value::Array(_), _) => repeat(a, b),
        (BinaryOp::Mul, _, Value::String(_) | Value::Array(_)) => repeat(b, a),
        _ => Err(unsupported(op, a, b)),
    }
}

fn unsupported(op: BinaryOp, a: &Value, b: &Value) -> ExprError {
    ExprError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        type_name(a),
        type_name(b)
    ))
}

fn repeat(seq: &Value, count: &Value) -> ExprResult<Value> {
    let times = as_int(count).ok_or_else(|| {
        ExprError::type_error(format!(
            "can't multiply sequence by non-int of type '{}'",
            type_name(count)
        ))
    })?;
    let times = usize::try_from(times.max(0)).map_err(|_| ExprError::overflow())?;
    match seq {
        Value::String(s) => {
            if s.len().saturating_mul(times) > MAX_REPEAT_LEN {
                return Err(ExprError::runtime(
                    RuntimeCategory::OverflowError,
                    "repeated string is too long",
                ));
            }
            Ok(Value::String(s.repeat(times)))
        }
        Value::Array(items) => {
            if items.len().saturating_mul(times) > MAX_REPEAT_LEN {
                return Err(ExprError::runtime(
                    RuntimeCategory::OverflowError,
                    "repeated list is too long",
                ));
            }
            let mut out = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                out.extend(items.iter().cloned());
            }
            Ok(Value::Array(out))
        }
        _ => Err(ExprError::type_error("can't multiply non-sequence")),
    }
}

fn arithmetic(op: BinaryOp, x: Num, y: Num) -> ExprResult<Num> {
    if let (Num::Int(a), Num::Int(b)) = (x, y) {
        return int_arithmetic(op, a, b);
    }
    let (a, b) = (x.as_f64(), y.as_f64());
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::zero_division("float division by zero"));
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(ExprError::zero_division("float floor division by zero"));
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(ExprError::zero_division("float modulo"));
            }
            let r = a % b;
            if r != 0.0 && (r < 0.0) != (b < 0.0) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(ExprError::zero_division(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            let r = a.powf(b);
            if r.is_nan() {
                return Err(ExprError::value_error("math domain error"));
            }
            r
        }
    };
    Ok(Num::Float(result))
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> ExprResult<Num> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Err(ExprError::zero_division("division by zero"));
            }
            return Ok(Num::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(ExprError::zero_division("integer division or modulo by zero"));
            }
            a.checked_div(b).map(|q| {
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(ExprError::zero_division("integer division or modulo by zero"));
            }
            a.checked_rem(b).map(|r| {
                if r != 0 && ((r < 0) != (b < 0)) {
                    r + b
                } else {
                    r
                }
            })
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(ExprError::zero_division(
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                return Ok(Num::Float((a as f64).powf(b as f64)));
            }
            u32::try_from(b).ok().and_then(|e| a.checked_pow(e))
        }
    };
    result.map(Num::Int).ok_or_else(ExprError::overflow)
}

/// Subscript `target[index]`. Lists and objects hand out borrowed elements.
pub fn index<'a>(target: &'a Value, index: &Value) -> ExprResult<Cow<'a, Value>> {
    match target {
        Value::Array(items) => {
            let i = sequence_index(index, "list")?;
            resolve_index(items.len(), i)
                .map(|i| Cow::Borrowed(&items[i]))
                .ok_or_else(|| ExprError::index_error("list"))
        }
        Value::String(s) => {
            let i = sequence_index(index, "string")?;
            let chars: Vec<char> = s.chars().collect();
            resolve_index(chars.len(), i)
                .map(|i| Cow::Owned(Value::String(chars[i].to_string())))
                .ok_or_else(|| ExprError::index_error("string"))
        }
        Value::Object(map) => match index {
            Value::String(key) => map
                .get(key)
                .map(Cow::Borrowed)
                .ok_or_else(|| ExprError::key_error(key)),
            other => Err(ExprError::key_error(&display(other))),
        },
        other => Err(ExprError::type_error(format!(
            "'{}' object is not subscriptable",
            type_name(other)
        ))),
    }
}

fn sequence_index(index: &Value, what: &str) -> ExprResult<i64> {
    as_int(index).ok_or_else(|| {
        ExprError::type_error(format!(
            "{} indices must be integers or slices, not {}",
            what,
            type_name(index)
        ))
    })
}

/// Resolves a possibly negative index against a length.
pub fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { index + len } else { index };
    if (0..len).contains(&i) {
        Some(i as usize)
    } else {
        None
    }
}

/// Positions selected by `[start:stop:step]` over a sequence of `len` items.
///
/// Bounds clamp to the sequence. Returns `None` only for a zero step.
pub fn slice_positions(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Option<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return None;
    }
    let len = len as i64;
    let clamp = |bound: i64, lower: i64, upper: i64| -> i64 {
        let b = if bound < 0 { bound + len } else { bound };
        b.clamp(lower, upper)
    };

    let mut positions = Vec::new();
    if step > 0 {
        let from = start.map_or(0, |s| clamp(s, 0, len));
        let to = stop.map_or(len, |s| clamp(s, 0, len));
        let mut i = from;
        while i < to {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else {
        let from = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let to = stop.map_or(-1, |s| clamp(s, -1, len - 1));
        let mut i = from;
        while i > to {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    Some(positions)
}

/// Slice `target[start:stop:step]` over lists and strings.
pub fn slice(
    target: &Value,
    start: &Value,
    stop: &Value,
    step: &Value,
) -> ExprResult<Value> {
    let bound = |v: &Value| -> ExprResult<Option<i64>> {
        match v {
            Value::Null => Ok(None),
            other => as_int(other).map(Some).ok_or_else(|| {
                ExprError::type_error(
                    "slice indices must be integers or None",
                )
            }),
        }
    };
    let (start, stop, step) = (bound(start)?, bound(stop)?, bound(step)?);
    let zero_step = || ExprError::value_error("slice step cannot be zero");

    match target {
        Value::Array(items) => {
            let positions = slice_positions(items.len(), start, stop, step).ok_or_else(zero_step)?;
            Ok(Value::Array(
                positions.into_iter().map(|i| items[i].clone()).collect(),
            ))
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let positions = slice_positions(chars.len(), start, stop, step).ok_or_else(zero_step)?;
            Ok(Value::String(positions.into_iter().map(|i| chars[i]).collect()))
        }
        other => Err(ExprError::type_error(format!(
            "'{}' object is not subscriptable",
            type_name(other)
        ))),
    }
}

/// Member access `target.name`.
pub fn member<'a>(target: &'a Value, name: &str) -> ExprResult<&'a Value> {
    match target {
        Value::Object(map) => map.get(name).ok_or_else(|| {
            ExprError::runtime(
                RuntimeCategory::AttributeError,
                format!("'dict' object has no attribute '{}'", name),
            )
        }),
        other => Err(ExprError::runtime(
            RuntimeCategory::AttributeError,
            format!("'{}' object has no attribute '{}'", type_name(other), name),
        )),
    }
}

/// Builds a dict display; keys must be strings.
pub fn dict(entries: Vec<(Value, Value)>) -> ExprResult<Value> {
    let mut map = Map::new();
    for (key, value) in entries {
        match key {
            Value::String(k) => {
                map.insert(k, value);
            }
            other => {
                return Err(ExprError::type_error(format!(
                    "dict keys must be str, not {}",
                    type_name(&other)
                )))
            }
        }
    }
    Ok(Value::Object(map))
}

/// Human-readable rendering used by `str()`.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr(other),
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(repr).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("'{}': {}", k, repr(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}
