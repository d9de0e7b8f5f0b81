// パス: src/script/interp.rs
// 役割: Tree-walking evaluator that runs one statement against a live namespace
// 意図: Read and write the shared namespace directly, with no sandbox or copy
// 関連ファイル: src/script/ast.rs, src/script/builtins.rs, src/namespace.rs
//! 評価器（interp）
//!
//! 目的:
//! - 1 文を名前空間に対して評価し、結果値か例外を返す。
//! - 識別子の参照・代入はすべて `Namespace` ハンドル越しに行う（複製しない）。
//!
//! 仕様要点:
//! - 未定義の識別子の参照は `ReferenceError`、非関数の呼び出しは `TypeError`。
//! - 未宣言の識別子への単純代入はグローバル束縛を新規作成する。
//! - 失敗した文の途中までの書き込みは巻き戻さない。

use std::cmp::Ordering;

use crate::errors::EvalError;
use crate::namespace::Namespace;
use crate::script::ast::{BinOp, Expr, Stmt, UnaryOp};
use crate::value::{lookup, to_display_string, Object, Value};

/// 文を評価する。宣言文の結果は `undefined`。
pub fn exec_statement(stmt: &Stmt, ns: &Namespace) -> Result<Value, EvalError> {
    match stmt {
        Stmt::Expr(e) => eval_expr(e, ns),
        Stmt::Declare { name, init, .. } => {
            let value = match init {
                Some(e) => eval_expr(e, ns)?,
                None => Value::Undefined,
            };
            ns.set(name, value);
            Ok(Value::Undefined)
        }
        Stmt::Throw(e) => Err(EvalError::Thrown(eval_expr(e, ns)?)),
    }
}

pub fn eval_expr(e: &Expr, ns: &Namespace) -> Result<Value, EvalError> {
    match e {
        Expr::Ident { name } => lookup_identifier(name, ns),
        Expr::Number { value } => Ok(Value::Number(*value)),
        Expr::Str { value } => Ok(Value::Str(value.clone())),
        Expr::Bool { value } => Ok(Value::Bool(*value)),
        Expr::Null => Ok(Value::Null),
        Expr::Undefined => Ok(Value::Undefined),
        Expr::ObjectLit { entries } => {
            let mut obj = Object::new(Some(ns.realm().object_proto.clone()));
            for (key, value) in entries {
                obj.set(key, eval_expr(value, ns)?);
            }
            Ok(Value::Object(obj.into_ref()))
        }
        Expr::Member {
            object, property, ..
        } => {
            let target = eval_expr(object, ns)?;
            let key = to_property_key(&eval_expr(property, ns)?);
            read_member(&target, &key, ns)
        }
        Expr::Call { callee, args } => {
            let (func, this) = match callee.as_ref() {
                Expr::Member {
                    object, property, ..
                } => {
                    let this = eval_expr(object, ns)?;
                    let key = to_property_key(&eval_expr(property, ns)?);
                    (read_member(&this, &key, ns)?, this)
                }
                other => (eval_expr(other, ns)?, Value::Undefined),
            };
            let args = eval_args(args, ns)?;
            match func {
                Value::Function(f) => (f.call)(ns, &this, &args),
                _ => Err(EvalError::raise(
                    ns,
                    "TypeError",
                    format!("{} is not a function", describe_callee(callee)),
                )),
            }
        }
        Expr::New { callee, args } => {
            let func = eval_expr(callee, ns)?;
            let args = eval_args(args, ns)?;
            match func {
                Value::Function(f) => (f.call)(ns, &Value::Undefined, &args),
                _ => Err(EvalError::raise(
                    ns,
                    "TypeError",
                    format!("{} is not a constructor", describe_callee(callee)),
                )),
            }
        }
        Expr::Unary { op, operand } => {
            if let (UnaryOp::TypeOf, Expr::Ident { name }) = (op, operand.as_ref()) {
                // 未定義の識別子に対する typeof は例外にならない。
                if lookup(ns.global(), name).is_none() {
                    return Ok(Value::str("undefined"));
                }
            }
            let v = eval_expr(operand, ns)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!v.truthy()),
                UnaryOp::Neg => Value::Number(-to_number(&v)),
                UnaryOp::Plus => Value::Number(to_number(&v)),
                UnaryOp::TypeOf => Value::str(v.type_of()),
            })
        }
        Expr::Binary { op, left, right } => {
            let l = eval_expr(left, ns)?;
            let r = eval_expr(right, ns)?;
            Ok(binary(*op, &l, &r))
        }
        Expr::Logical { and, left, right } => {
            let l = eval_expr(left, ns)?;
            if l.truthy() == *and {
                eval_expr(right, ns)
            } else {
                Ok(l)
            }
        }
        Expr::Assign { op, target, value } => assign(*op, target, value, ns),
    }
}

fn lookup_identifier(name: &str, ns: &Namespace) -> Result<Value, EvalError> {
    lookup(ns.global(), name)
        .ok_or_else(|| EvalError::raise(ns, "ReferenceError", format!("{} is not defined", name)))
}

fn read_member(target: &Value, key: &str, ns: &Namespace) -> Result<Value, EvalError> {
    if target.is_nullish() {
        return Err(EvalError::raise(
            ns,
            "TypeError",
            format!(
                "Cannot read properties of {} (reading '{}')",
                to_display_string(target),
                key
            ),
        ));
    }
    Ok(ns.get_property(target, key).unwrap_or(Value::Undefined))
}

fn eval_args(args: &[Expr], ns: &Namespace) -> Result<Vec<Value>, EvalError> {
    args.iter().map(|a| eval_expr(a, ns)).collect()
}

fn assign(op: Option<BinOp>, target: &Expr, value: &Expr, ns: &Namespace) -> Result<Value, EvalError> {
    match target {
        Expr::Ident { name } => {
            let rhs = eval_expr(value, ns)?;
            let result = match op {
                Some(op) => binary(op, &lookup_identifier(name, ns)?, &rhs),
                None => rhs,
            };
            ns.set(name, result.clone());
            Ok(result)
        }
        Expr::Member {
            object, property, ..
        } => {
            let obj = eval_expr(object, ns)?;
            let key = to_property_key(&eval_expr(property, ns)?);
            if obj.is_nullish() {
                return Err(EvalError::raise(
                    ns,
                    "TypeError",
                    format!(
                        "Cannot set properties of {} (setting '{}')",
                        to_display_string(&obj),
                        key
                    ),
                ));
            }
            let rhs = eval_expr(value, ns)?;
            let result = match op {
                Some(op) => binary(op, &read_member(&obj, &key, ns)?, &rhs),
                None => rhs,
            };
            // プリミティブや関数への書き込みは黙って捨てる。
            if let Value::Object(o) = &obj {
                o.borrow_mut().set(&key, result.clone());
            }
            Ok(result)
        }
        _ => Err(EvalError::raise(
            ns,
            "SyntaxError",
            "Invalid left-hand side in assignment",
        )),
    }
}

fn describe_callee(callee: &Expr) -> String {
    match callee {
        Expr::Ident { name } => name.clone(),
        Expr::Member {
            object,
            property,
            computed: false,
        } => match property.as_ref() {
            Expr::Str { value } => format!("{}.{}", describe_callee(object), value),
            _ => "expression".into(),
        },
        _ => "expression".into(),
    }
}

/// 数値への変換（`Number(v)` 相当）。
pub(crate) fn to_number(v: &Value) -> f64 {
    match v {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::Str(s) => {
            let t = s.trim();
            if t.is_empty() {
                return 0.0;
            }
            if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
                return i64::from_str_radix(hex, 16)
                    .map(|n| n as f64)
                    .unwrap_or(f64::NAN);
            }
            match t {
                "Infinity" | "+Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                _ if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
                    f64::NAN
                }
                _ => t.parse::<f64>().unwrap_or(f64::NAN),
            }
        }
        Value::Object(_) | Value::Function(_) => f64::NAN,
    }
}

/// プロパティキーへの変換。
pub(crate) fn to_property_key(v: &Value) -> String {
    to_display_string(v)
}

fn is_stringish(v: &Value) -> bool {
    matches!(v, Value::Str(_) | Value::Object(_) | Value::Function(_))
}

fn binary(op: BinOp, l: &Value, r: &Value) -> Value {
    match op {
        BinOp::Add => {
            if is_stringish(l) || is_stringish(r) {
                Value::Str(to_display_string(l) + &to_display_string(r))
            } else {
                Value::Number(to_number(l) + to_number(r))
            }
        }
        BinOp::Sub => Value::Number(to_number(l) - to_number(r)),
        BinOp::Mul => Value::Number(to_number(l) * to_number(r)),
        BinOp::Div => Value::Number(to_number(l) / to_number(r)),
        BinOp::Rem => Value::Number(to_number(l) % to_number(r)),
        BinOp::Pow => Value::Number(to_number(l).powf(to_number(r))),
        BinOp::StrictEq => Value::Bool(l.strict_equals(r)),
        BinOp::StrictNe => Value::Bool(!l.strict_equals(r)),
        BinOp::Eq => Value::Bool(loose_equals(l, r)),
        BinOp::Ne => Value::Bool(!loose_equals(l, r)),
        BinOp::Lt => Value::Bool(compare(l, r) == Some(Ordering::Less)),
        BinOp::Gt => Value::Bool(compare(l, r) == Some(Ordering::Greater)),
        BinOp::Le => Value::Bool(matches!(
            compare(l, r),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinOp::Ge => Value::Bool(matches!(
            compare(l, r),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

fn loose_equals(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Object(_) | Value::Function(_), Value::Object(_) | Value::Function(_)) => {
            l.strict_equals(r)
        }
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Object(_) | Value::Function(_), _) | (_, Value::Object(_) | Value::Function(_)) => {
            to_display_string(l) == to_display_string(r)
        }
        _ => to_number(l) == to_number(r),
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => to_number(l).partial_cmp(&to_number(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::to_number;
    use crate::value::Value;

    #[test]
    /// 文字列から数値への変換規則を確認する。
    fn to_number_from_strings() {
        assert_eq!(to_number(&Value::str(" 42 ")), 42.0);
        assert_eq!(to_number(&Value::str("")), 0.0);
        assert_eq!(to_number(&Value::str("0x10")), 16.0);
        assert_eq!(to_number(&Value::str("1e3")), 1000.0);
        assert!(to_number(&Value::str("abc")).is_nan());
        assert!(to_number(&Value::str("inf")).is_nan());
        assert_eq!(to_number(&Value::Null), 0.0);
        assert!(to_number(&Value::Undefined).is_nan());
    }
}
