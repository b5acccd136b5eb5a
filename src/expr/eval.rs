//! Tree-walking evaluation of a parsed expression.

use std::borrow::Cow;

use serde_json::Value;

use super::ast::{Expr, UnaryOp};
use super::builtins;
use super::errors::{ExprError, ExprResult};
use super::ops;
use super::Scope;

/// Evaluates expressions against one scope.
///
/// Results borrow from the scope where possible so that chains such as
/// `it['all'][0]['name']` do not copy the whole row.
pub struct Evaluator<'s, S: Scope + ?Sized> {
    scope: &'s S,
}

impl<'s, S: Scope + ?Sized> Evaluator<'s, S> {
    pub fn new(scope: &'s S) -> Self {
        Self { scope }
    }

    pub fn eval(&self, expr: &Expr) -> ExprResult<Cow<'s, Value>> {
        match expr {
            Expr::Literal(value) => Ok(Cow::Owned(value.clone())),
            Expr::Name(name) => self
                .scope
                .lookup(name)
                .map(Cow::Borrowed)
                .ok_or_else(|| ExprError::name_error(name)),
            Expr::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item).map(Cow::into_owned))
                    .collect::<ExprResult<Vec<_>>>()?;
                Ok(Cow::Owned(Value::Array(values)))
            }
            Expr::Dict(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    pairs.push((self.eval(key)?.into_owned(), self.eval(value)?.into_owned()));
                }
                ops::dict(pairs).map(Cow::Owned)
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                let result = match op {
                    UnaryOp::Not => Value::Bool(!ops::truthy(&value)),
                    UnaryOp::Neg => ops::negate(&value)?,
                    UnaryOp::Pos => ops::positive(&value)?,
                };
                Ok(Cow::Owned(result))
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, &left, &right).map(Cow::Owned)
            }
            Expr::And(left, right) => {
                let left = self.eval(left)?;
                if ops::truthy(&left) {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval(left)?;
                if ops::truthy(&left) {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Compare(first, rest) => {
                let mut left = self.eval(first)?;
                for (op, operand) in rest {
                    let right = self.eval(operand)?;
                    if !ops::compare_op(*op, &left, &right)? {
                        return Ok(Cow::Owned(Value::Bool(false)));
                    }
                    left = right;
                }
                Ok(Cow::Owned(Value::Bool(true)))
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.eval(cond)?;
                if ops::truthy(&cond) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                match target {
                    Cow::Borrowed(t) => ops::index(t, &index),
                    Cow::Owned(t) => ops::index(&t, &index).map(|v| Cow::Owned(v.into_owned())),
                }
            }
            Expr::Slice {
                target,
                start,
                stop,
                step,
            } => {
                let target = self.eval(target)?;
                let start = self.eval_bound(start.as_deref())?;
                let stop = self.eval_bound(stop.as_deref())?;
                let step = self.eval_bound(step.as_deref())?;
                ops::slice(&target, &start, &stop, &step).map(Cow::Owned)
            }
            Expr::Member(target, name) => match self.eval(target)? {
                Cow::Borrowed(t) => ops::member(t, name).map(Cow::Borrowed),
                Cow::Owned(t) => ops::member(&t, name).map(|v| Cow::Owned(v.clone())),
            },
            Expr::Call(builtin, args) => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg).map(Cow::into_owned))
                    .collect::<ExprResult<Vec<_>>>()?;
                builtins::call(*builtin, values).map(Cow::Owned)
            }
        }
    }

    fn eval_bound(&self, bound: Option<&Expr>) -> ExprResult<Cow<'s, Value>> {
        match bound {
            Some(expr) => self.eval(expr),
            None => Ok(Cow::Owned(Value::Null)),
        }
    }
}
