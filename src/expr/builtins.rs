//! Builtin functions available to expressions.
//!
//! The set is closed: the parser rejects any other callee.

use std::cmp::Ordering;

use serde_json::Value;

use super::ast::{BinaryOp, Builtin};
use super::errors::{ExprError, ExprResult};
use super::ops::{self, Num};

/// Invokes a builtin on already-evaluated arguments.
pub fn call(builtin: Builtin, args: Vec<Value>) -> ExprResult<Value> {
    match builtin {
        Builtin::Len => {
            let [value] = exact::<1>(builtin, args)?;
            len(&value)
        }
        Builtin::Str => match optional(builtin, args)? {
            Some(value) => Ok(Value::String(ops::display(&value))),
            None => Ok(Value::String(String::new())),
        },
        Builtin::Int => {
            let [value] = exact::<1>(builtin, args)?;
            to_int(&value)
        }
        Builtin::Float => {
            let [value] = exact::<1>(builtin, args)?;
            to_float(&value)
        }
        Builtin::Bool => Ok(Value::Bool(
            optional(builtin, args)?.is_some_and(|v| ops::truthy(&v)),
        )),
        Builtin::Abs => {
            let [value] = exact::<1>(builtin, args)?;
            match ops::as_num(&value) {
                Some(Num::Int(n)) => n.checked_abs().map(Value::from).ok_or_else(ExprError::overflow),
                Some(Num::Float(f)) => ops::num_to_value(Num::Float(f.abs())),
                None => Err(ExprError::type_error(format!(
                    "bad operand type for abs(): '{}'",
                    ops::type_name(&value)
                ))),
            }
        }
        Builtin::Min => extreme(builtin, args, Ordering::Less),
        Builtin::Max => extreme(builtin, args, Ordering::Greater),
        Builtin::Sum => sum(builtin, args),
        Builtin::Round => round(builtin, args),
        Builtin::Sorted => {
            let [value] = exact::<1>(builtin, args)?;
            let mut items = iterate(&value)?;
            sort_values(&mut items)?;
            Ok(Value::Array(items))
        }
        Builtin::List => match optional(builtin, args)? {
            Some(value) => iterate(&value).map(Value::Array),
            None => Ok(Value::Array(Vec::new())),
        },
    }
}

/// Stable ascending sort; fails on the first pair of unorderable values.
pub fn sort_values(items: &mut [Value]) -> ExprResult<()> {
    let mut failure = None;
    items.sort_by(|a, b| match ops::compare(a, b) {
        Ok(ordering) => ordering,
        Err(e) => {
            failure.get_or_insert(e);
            Ordering::Equal
        }
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn exact<const N: usize>(builtin: Builtin, args: Vec<Value>) -> ExprResult<[Value; N]> {
    let given = args.len();
    args.try_into().map_err(|_| {
        ExprError::type_error(format!(
            "{}() takes exactly {} argument{} ({} given)",
            builtin.name(),
            N,
            if N == 1 { "" } else { "s" },
            given
        ))
    })
}

fn optional(builtin: Builtin, args: Vec<Value>) -> ExprResult<Option<Value>> {
    if args.len() > 1 {
        return Err(ExprError::type_error(format!(
            "{}() takes at most 1 argument ({} given)",
            builtin.name(),
            args.len()
        )));
    }
    Ok(args.into_iter().next())
}

fn len(value: &Value) -> ExprResult<Value> {
    let n = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(ExprError::type_error(format!(
                "object of type '{}' has no len()",
                ops::type_name(other)
            )))
        }
    };
    Ok(Value::from(n as u64))
}

fn to_int(value: &Value) -> ExprResult<Value> {
    match value {
        Value::String(s) => {
            let text = s.trim().replace('_', "");
            text.parse::<i64>().map(Value::from).map_err(|_| {
                ExprError::value_error(format!("invalid literal for int() with base 10: '{}'", s))
            })
        }
        other => match ops::as_num(other) {
            Some(Num::Int(n)) => Ok(Value::from(n)),
            Some(Num::Float(f)) => {
                let t = f.trunc();
                if t < i64::MIN as f64 || t >= i64::MAX as f64 {
                    return Err(ExprError::overflow());
                }
                Ok(Value::from(t as i64))
            }
            None => Err(ExprError::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                ops::type_name(other)
            ))),
        },
    }
}

fn to_float(value: &Value) -> ExprResult<Value> {
    let f = match value {
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            ExprError::value_error(format!("could not convert string to float: '{}'", s))
        })?,
        other => ops::as_num(other)
            .map(Num::as_f64)
            .ok_or_else(|| {
                ExprError::type_error(format!(
                    "float() argument must be a string or a number, not '{}'",
                    ops::type_name(other)
                ))
            })?,
    };
    ops::num_to_value(Num::Float(f))
}

/// Elements of an iterable: list items, string characters, or object keys.
fn iterate(value: &Value) -> ExprResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        Value::Object(map) => Ok(map.keys().map(|k| Value::String(k.clone())).collect()),
        other => Err(ExprError::type_error(format!(
            "'{}' object is not iterable",
            ops::type_name(other)
        ))),
    }
}

fn extreme(builtin: Builtin, args: Vec<Value>, keep: Ordering) -> ExprResult<Value> {
    let candidates = match args.len() {
        0 => {
            return Err(ExprError::type_error(format!(
                "{} expected at least 1 argument, got 0",
                builtin.name()
            )))
        }
        1 => iterate(&args[0])?,
        _ => args,
    };
    let mut best: Option<Value> = None;
    for candidate in candidates {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                if ops::compare(&candidate, &current)? == keep {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.ok_or_else(|| {
        ExprError::value_error(format!("{}() arg is an empty sequence", builtin.name()))
    })
}

fn sum(builtin: Builtin, args: Vec<Value>) -> ExprResult<Value> {
    let (items, start) = match args.len() {
        1 => (iterate(&args[0])?, Value::from(0)),
        2 => (iterate(&args[0])?, args[1].clone()),
        n => {
            return Err(ExprError::type_error(format!(
                "{}() takes 1 or 2 arguments ({} given)",
                builtin.name(),
                n
            )))
        }
    };
    if matches!(start, Value::String(_)) {
        return Err(ExprError::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    items
        .iter()
        .try_fold(start, |acc, item| ops::binary(BinaryOp::Add, &acc, item))
}

fn round(builtin: Builtin, args: Vec<Value>) -> ExprResult<Value> {
    let (value, digits) = match args.len() {
        1 => (&args[0], None),
        2 => (&args[0], Some(&args[1])),
        n => {
            return Err(ExprError::type_error(format!(
                "{}() takes 1 or 2 arguments ({} given)",
                builtin.name(),
                n
            )))
        }
    };
    let num = ops::as_num(value).ok_or_else(|| {
        ExprError::type_error(format!(
            "type {} doesn't define __round__ method",
            ops::type_name(value)
        ))
    })?;
    let digits = match digits {
        None | Some(Value::Null) => None,
        Some(d) => Some(ops::as_int(d).ok_or_else(|| {
            ExprError::type_error("ndigits must be an integer")
        })?),
    };

    match (num, digits) {
        (Num::Int(n), _) => Ok(Value::from(n)),
        (Num::Float(f), None) => {
            let r = round_half_even(f);
            if r < i64::MIN as f64 || r >= i64::MAX as f64 {
                return Err(ExprError::overflow());
            }
            Ok(Value::from(r as i64))
        }
        (Num::Float(f), Some(d)) => {
            let scale = 10f64.powi(d.clamp(-308, 308) as i32);
            ops::num_to_value(Num::Float(round_half_even(f * scale) / scale))
        }
    }
}

fn round_half_even(f: f64) -> f64 {
    let r = f.round();
    if (f - f.trunc()).abs() == 0.5 {
        2.0 * (f / 2.0).round()
    } else {
        r
    }
}
