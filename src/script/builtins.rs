// パス: src/script/builtins.rs
// 役割: Built-in globals and prototype methods installed into a namespace
// 意図: Give the console a familiar standard library to inspect and complete against
// 関連ファイル: src/namespace.rs, src/script/interp.rs, src/value.rs
//! 組み込みオブジェクトの登録。
//!
//! すべて列挙不可として定義する（補完には出るが、オブジェクト表示には出ない）。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::EvalError;
use crate::namespace::Namespace;
use crate::script::interp::to_number;
use crate::value::{
    format_number, to_display_string, NativeFn, Object, ObjectKind, ObjectRef, Value,
};

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(Infinity|\d+\.?\d*(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?)")
        .expect("float prefix pattern")
});

/// 名前空間のグローバルと組み込みプロトタイプへ標準ライブラリを登録する。
pub fn install(ns: &Namespace) {
    let realm = ns.realm();
    define_methods(
        &realm.object_proto,
        &[
            ("hasOwnProperty", object_has_own_property),
            ("toString", object_to_string),
            ("valueOf", object_value_of),
        ],
    );
    define_methods(&realm.function_proto, &[("toString", object_to_string)]);
    define_methods(
        &realm.string_proto,
        &[
            ("toUpperCase", string_to_upper),
            ("toLowerCase", string_to_lower),
            ("trim", string_trim),
            ("includes", string_includes),
            ("startsWith", string_starts_with),
            ("endsWith", string_ends_with),
            ("indexOf", string_index_of),
            ("slice", string_slice),
            ("charAt", string_char_at),
            ("concat", string_concat),
            ("toString", object_to_string),
        ],
    );
    define_methods(
        &realm.number_proto,
        &[("toFixed", number_to_fixed), ("toString", number_to_string)],
    );
    define_methods(&realm.boolean_proto, &[("toString", object_to_string)]);
    define_methods(&realm.error_proto, &[("toString", object_to_string)]);

    let math = Object::new(Some(realm.object_proto.clone())).into_ref();
    {
        let mut m = math.borrow_mut();
        m.define("PI", Value::Number(std::f64::consts::PI), false);
        m.define("E", Value::Number(std::f64::consts::E), false);
    }
    define_methods(
        &math,
        &[
            ("abs", math_abs),
            ("ceil", math_ceil),
            ("floor", math_floor),
            ("round", math_round),
            ("sqrt", math_sqrt),
            ("sign", math_sign),
            ("trunc", math_trunc),
            ("pow", math_pow),
            ("max", math_max),
            ("min", math_min),
        ],
    );
    ns.define_builtin("Math", Value::Object(math));

    let json = Object::new(Some(realm.object_proto.clone())).into_ref();
    define_methods(&json, &[("stringify", json_stringify)]);
    ns.define_builtin("JSON", Value::Object(json));

    let globals: &[(&str, NativeFn)] = &[
        ("Error", error_ctor),
        ("TypeError", type_error_ctor),
        ("ReferenceError", reference_error_ctor),
        ("RangeError", range_error_ctor),
        ("String", string_ctor),
        ("Number", number_ctor),
        ("Boolean", boolean_ctor),
        ("parseInt", parse_int),
        ("parseFloat", parse_float),
        ("isNaN", is_nan),
    ];
    for (name, f) in globals {
        ns.define_builtin(name, Value::function(name, *f));
    }
    ns.define_builtin("NaN", Value::Number(f64::NAN));
    ns.define_builtin("Infinity", Value::Number(f64::INFINITY));
}

fn define_methods(target: &ObjectRef, methods: &[(&str, NativeFn)]) {
    let mut obj = target.borrow_mut();
    for (name, f) in methods {
        obj.define(name, Value::function(name, *f), false);
    }
}

fn arg(args: &[Value], idx: usize) -> Value {
    args.get(idx).cloned().unwrap_or(Value::Undefined)
}

fn this_string(this: &Value) -> String {
    to_display_string(this)
}

fn arg_string(args: &[Value], idx: usize) -> String {
    to_display_string(&arg(args, idx))
}

/// 負数は末尾からの位置として扱い、`0..=len` に収める。
fn relative_index(v: &Value, len: usize, default: usize) -> usize {
    if matches!(v, Value::Undefined) {
        return default;
    }
    let n = to_number(v);
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        (n as usize).min(len)
    }
}

// --- Object.prototype ---

fn object_has_own_property(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let key = arg_string(args, 0);
    Ok(Value::Bool(match this {
        Value::Object(o) => o.borrow().has_own(&key),
        _ => false,
    }))
}

fn object_to_string(_: &Namespace, this: &Value, _: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Str(this_string(this)))
}

fn object_value_of(_: &Namespace, this: &Value, _: &[Value]) -> Result<Value, EvalError> {
    Ok(this.clone())
}

// --- String.prototype ---

fn string_to_upper(_: &Namespace, this: &Value, _: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Str(this_string(this).to_uppercase()))
}

fn string_to_lower(_: &Namespace, this: &Value, _: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Str(this_string(this).to_lowercase()))
}

fn string_trim(_: &Namespace, this: &Value, _: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::str(this_string(this).trim()))
}

fn string_includes(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Bool(this_string(this).contains(&arg_string(args, 0))))
}

fn string_starts_with(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Bool(this_string(this).starts_with(&arg_string(args, 0))))
}

fn string_ends_with(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Bool(this_string(this).ends_with(&arg_string(args, 0))))
}

fn string_index_of(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let s = this_string(this);
    let needle = arg_string(args, 0);
    let idx = s
        .find(&needle)
        .map(|byte| s[..byte].chars().count() as f64)
        .unwrap_or(-1.0);
    Ok(Value::Number(idx))
}

fn string_slice(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let chars: Vec<char> = this_string(this).chars().collect();
    let len = chars.len();
    let start = relative_index(&arg(args, 0), len, 0);
    let end = relative_index(&arg(args, 1), len, len);
    if start >= end {
        return Ok(Value::str(""));
    }
    Ok(Value::Str(chars[start..end].iter().collect()))
}

fn string_char_at(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let idx = to_number(&arg(args, 0));
    let idx = if idx.is_nan() { 0.0 } else { idx.trunc() };
    let s = this_string(this);
    let ch = if idx < 0.0 {
        None
    } else {
        s.chars().nth(idx as usize)
    };
    Ok(Value::Str(ch.map(String::from).unwrap_or_default()))
}

fn string_concat(_: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let mut s = this_string(this);
    for a in args {
        s.push_str(&to_display_string(a));
    }
    Ok(Value::Str(s))
}

// --- Number.prototype ---

fn number_to_fixed(ns: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    // NaN は 0 桁、小数部は切り捨て。
    let digits = match to_number(&arg(args, 0)) {
        d if d.is_nan() => 0.0,
        d => d.trunc(),
    };
    if !(0.0..=100.0).contains(&digits) {
        return Err(EvalError::raise(
            ns,
            "RangeError",
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    let n = to_number(this);
    if !n.is_finite() || n.abs() >= 1e21 {
        return Ok(Value::Str(format_number(n)));
    }
    Ok(Value::Str(format!("{:.*}", digits as usize, n)))
}

fn number_to_string(ns: &Namespace, this: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let n = to_number(this);
    let radix = match arg(args, 0) {
        Value::Undefined => 10,
        v => to_number(&v) as u32,
    };
    if !(2..=36).contains(&radix) {
        return Err(EvalError::raise(
            ns,
            "RangeError",
            "toString() radix must be between 2 and 36",
        ));
    }
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
        return Ok(Value::Str(format_number(n)));
    }
    let digits = integer_digits(n.abs(), radix);
    if n < 0.0 {
        return Ok(Value::Str(format!("-{}", digits)));
    }
    Ok(Value::Str(digits))
}

/// 整数値の非負の f64 を基数 `radix` で正確に書き出す。
///
/// 仮数と指数から 32 ビット単位の多倍長整数を組み、基数で割り続ける。
fn integer_digits(n: f64, radix: u32) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let bits = n.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i64;
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    let shift = exponent - 1075;
    // 下位が先頭。
    let mut limbs: Vec<u32> = if shift < 0 {
        let m = mantissa >> (-shift) as u32;
        vec![m as u32, (m >> 32) as u32]
    } else {
        let shift = shift as usize;
        let wide = (mantissa as u128) << (shift % 32);
        let mut limbs = vec![0u32; shift / 32];
        limbs.extend([wide as u32, (wide >> 32) as u32, (wide >> 64) as u32]);
        limbs
    };
    let mut digits = Vec::new();
    while limbs.iter().any(|&limb| limb != 0) {
        let mut rem = 0u64;
        for limb in limbs.iter_mut().rev() {
            let cur = (rem << 32) | u64::from(*limb);
            *limb = (cur / u64::from(radix)) as u32;
            rem = cur % u64::from(radix);
        }
        digits.push(std::char::from_digit(rem as u32, radix).unwrap_or('0'));
    }
    digits.into_iter().rev().collect()
}

// --- Math ---

fn unary_math(args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    Ok(Value::Number(f(to_number(&arg(args, 0)))))
}

fn math_abs(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::abs)
}

fn math_ceil(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::ceil)
}

fn math_floor(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::floor)
}

fn math_round(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    // 0.5 は正の無限大方向へ丸める。
    unary_math(args, |x| (x + 0.5).floor())
}

fn math_sqrt(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::sqrt)
}

fn math_sign(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, |x| if x == 0.0 || x.is_nan() { x } else { x.signum() })
}

fn math_trunc(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    unary_math(args, f64::trunc)
}

fn math_pow(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let base = to_number(&arg(args, 0));
    let exp = to_number(&arg(args, 1));
    Ok(Value::Number(base.powf(exp)))
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> Value {
    let mut acc = init;
    for a in args {
        let n = to_number(a);
        if n.is_nan() {
            return Value::Number(f64::NAN);
        }
        acc = pick(acc, n);
    }
    Value::Number(acc)
}

fn math_max(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(fold_numbers(args, f64::NEG_INFINITY, f64::max))
}

fn math_min(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(fold_numbers(args, f64::INFINITY, f64::min))
}

// --- JSON ---

fn json_stringify(ns: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let Some(json) = to_json(&arg(args, 0), 0) else {
        return Ok(Value::Undefined);
    };
    serde_json::to_string(&json)
        .map(Value::Str)
        .map_err(|e| EvalError::raise(ns, "TypeError", e.to_string()))
}

/// JSON に写像できない値（`undefined` と関数）は `None`。
fn to_json(v: &Value, depth: usize) -> Option<serde_json::Value> {
    use serde_json::Value as J;
    Some(match v {
        Value::Undefined | Value::Function(_) => return None,
        Value::Null => J::Null,
        Value::Bool(b) => J::Bool(*b),
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 => {
            J::from(*n as i64)
        }
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(J::Number)
            .unwrap_or(J::Null),
        Value::Str(s) => J::String(s.clone()),
        Value::Object(o) => {
            if depth > 32 {
                return Some(J::Null);
            }
            let obj = o.borrow();
            if obj.kind == ObjectKind::Error {
                return Some(J::Object(serde_json::Map::new()));
            }
            let mut map = serde_json::Map::new();
            for (key, prop) in obj.own_entries().filter(|(_, p)| p.enumerable) {
                if let Some(j) = to_json(&prop.value, depth + 1) {
                    map.insert(key.to_string(), j);
                }
            }
            J::Object(map)
        }
    })
}

// --- global functions ---

fn make_error(ns: &Namespace, kind: &str, args: &[Value]) -> Result<Value, EvalError> {
    let message = match arg(args, 0) {
        Value::Undefined => String::new(),
        v => to_display_string(&v),
    };
    Ok(ns.realm().make_error(kind, &message))
}

fn error_ctor(ns: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    make_error(ns, "Error", args)
}

fn type_error_ctor(ns: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    make_error(ns, "TypeError", args)
}

fn reference_error_ctor(ns: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    make_error(ns, "ReferenceError", args)
}

fn range_error_ctor(ns: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    make_error(ns, "RangeError", args)
}

fn string_ctor(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(match args.first() {
        None => Value::str(""),
        Some(v) => Value::Str(to_display_string(v)),
    })
}

fn number_ctor(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(args.first().map(to_number).unwrap_or(0.0)))
}

fn boolean_ctor(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Bool(arg(args, 0).truthy()))
}

fn parse_int(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let text = arg_string(args, 0);
    let mut s = text.trim_start();
    let negative = s.starts_with('-');
    if let Some(rest) = s.strip_prefix('-').or_else(|| s.strip_prefix('+')) {
        s = rest;
    }
    let mut radix = match arg(args, 1) {
        Value::Undefined => 0,
        v => to_number(&v) as u32,
    };
    if (radix == 0 || radix == 16) && (s.starts_with("0x") || s.starts_with("0X")) {
        s = &s[2..];
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::Number(f64::NAN));
    }
    let digits: String = s.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Number(f64::NAN));
    }
    let mut acc = 0f64;
    for c in digits.chars() {
        acc = acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64;
    }
    Ok(Value::Number(if negative { -acc } else { acc }))
}

fn parse_float(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let text = arg_string(args, 0);
    let trimmed = text.trim_start();
    let n = match FLOAT_PREFIX.find(trimmed) {
        Some(m) => {
            let s = m.as_str();
            match s.trim_start_matches(['+', '-']) {
                "Infinity" if s.starts_with('-') => f64::NEG_INFINITY,
                "Infinity" => f64::INFINITY,
                _ => s.parse::<f64>().unwrap_or(f64::NAN),
            }
        }
        None => f64::NAN,
    };
    Ok(Value::Number(n))
}

fn is_nan(_: &Namespace, _: &Value, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Bool(to_number(&arg(args, 0)).is_nan()))
}
