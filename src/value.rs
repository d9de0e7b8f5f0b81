// パス: src/value.rs
// 役割: Runtime value model shared by the namespace, the script engine and the console
// 意図: Represent a live, mutable object graph that host and console share by reference
// 関連ファイル: src/namespace.rs, src/script/interp.rs, src/script/builtins.rs
//! 名前空間が保持する値の表現。
//!
//! - オブジェクトは `Rc<RefCell<_>>` で共有し、ホストとコンソールが同じ実体を参照する。
//! - プロパティは挿入順を保ち、列挙可能フラグを持つ（組み込みは列挙不可）。
//! - 表示用の整形（`format_value`）と文字列化（`to_display_string`）もここで扱う。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::errors::EvalError;
use crate::namespace::Namespace;

pub type ObjectRef = Rc<RefCell<Object>>;

/// ネイティブ関数のシグネチャ。`this` と引数列を受け取る。
pub type NativeFn = fn(&Namespace, &Value, &[Value]) -> Result<Value, EvalError>;

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Object(ObjectRef),
    Function(Rc<NativeFunction>),
}

/// 名前付きのネイティブ関数。
pub struct NativeFunction {
    pub name: String,
    pub call: NativeFn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Plain,
    Error,
}

#[derive(Clone, Debug)]
pub struct Property {
    pub value: Value,
    pub enumerable: bool,
}

/// 挿入順を保つプロパティ表と、任意のプロトタイプを持つオブジェクト。
#[derive(Debug)]
pub struct Object {
    pub kind: ObjectKind,
    props: Vec<(String, Property)>,
    proto: Option<ObjectRef>,
}

impl Object {
    pub fn new(proto: Option<ObjectRef>) -> Self {
        Self {
            kind: ObjectKind::Plain,
            props: Vec::new(),
            proto,
        }
    }

    pub fn with_kind(kind: ObjectKind, proto: Option<ObjectRef>) -> Self {
        Self {
            kind,
            props: Vec::new(),
            proto,
        }
    }

    pub fn into_ref(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }

    pub fn proto(&self) -> Option<ObjectRef> {
        self.proto.clone()
    }

    pub fn get_own(&self, key: &str) -> Option<&Property> {
        self.props.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.get_own(key).is_some()
    }

    /// 既存プロパティは値のみ更新し、新規なら列挙可能として追加する。
    pub fn set(&mut self, key: &str, value: Value) {
        if let Some((_, prop)) = self.props.iter_mut().find(|(k, _)| k == key) {
            prop.value = value;
        } else {
            self.props.push((
                key.to_string(),
                Property {
                    value,
                    enumerable: true,
                },
            ));
        }
    }

    /// 列挙可否を明示してプロパティを定義（上書き）する。
    pub fn define(&mut self, key: &str, value: Value, enumerable: bool) {
        let prop = Property { value, enumerable };
        if let Some(slot) = self.props.iter_mut().find(|(k, _)| k == key) {
            slot.1 = prop;
        } else {
            self.props.push((key.to_string(), prop));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Property> {
        let idx = self.props.iter().position(|(k, _)| k == key)?;
        Some(self.props.remove(idx).1)
    }

    /// 列挙可否を問わない自身のプロパティ名（挿入順）。
    pub fn own_keys(&self) -> Vec<String> {
        self.props.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn own_enumerable_keys(&self) -> Vec<String> {
        self.props
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn own_entries(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.props.iter().map(|(k, p)| (k.as_str(), p))
    }
}

/// プロトタイプ連鎖をたどってプロパティを探す。
pub fn lookup(obj: &ObjectRef, key: &str) -> Option<Value> {
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        let borrowed = o.borrow();
        if let Some(prop) = borrowed.get_own(key) {
            return Some(prop.value.clone());
        }
        current = borrowed.proto();
    }
    None
}

/// `for..in` 相当: 自身と継承元の列挙可能なキーを、重複なく近い順に集める。
pub fn enumerable_keys_in_chain(obj: &ObjectRef) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let mut current = Some(obj.clone());
    while let Some(o) = current {
        let borrowed = o.borrow();
        for key in borrowed.own_enumerable_keys() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        current = borrowed.proto();
    }
    keys
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn function(name: &str, call: NativeFn) -> Self {
        Value::Function(Rc::new(NativeFunction {
            name: name.to_string(),
            call,
        }))
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// 同一性比較（`===` 相当）。オブジェクトは参照で比較する。
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

/// 数値を JavaScript と同じ規則で文字列化する。
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if n == 0.0 {
        return "0".into();
    }
    let abs = n.abs();
    if !(1e-6..1e21).contains(&abs) {
        // Rust の `{:e}` は `1e21` / `1e-7` を返すので指数の符号だけ補う。
        let s = format!("{:e}", n);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }
    format!("{}", n)
}

/// 文字列連結や `String()` で使う文字列化。
pub fn to_display_string(v: &Value) -> String {
    match v {
        Value::Undefined => "undefined".into(),
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Str(s) => s.clone(),
        Value::Function(f) => format!("function {}() {{ [native code] }}", f.name),
        Value::Object(o) => {
            if o.borrow().kind == ObjectKind::Error {
                error_summary(o)
            } else {
                "[object Object]".into()
            }
        }
    }
}

/// 例外として投げられた値を `Name: message` 形式で要約する。
pub fn describe_thrown(v: &Value) -> String {
    match v {
        Value::Object(o) if o.borrow().kind == ObjectKind::Error => error_summary(o),
        other => format_value(other),
    }
}

fn error_summary(o: &ObjectRef) -> String {
    let name = lookup(o, "name")
        .map(|v| to_display_string(&v))
        .unwrap_or_else(|| "Error".into());
    let message = lookup(o, "message")
        .map(|v| to_display_string(&v))
        .unwrap_or_default();
    if message.is_empty() {
        name
    } else {
        format!("{}: {}", name, message)
    }
}

const MAX_DEPTH: usize = 2;

/// 評価結果を対話表示向けに整形する（文字列は引用符付き、オブジェクトは浅く展開）。
pub fn format_value(v: &Value) -> String {
    format_at_depth(v, 0)
}

fn format_at_depth(v: &Value, depth: usize) -> String {
    match v {
        Value::Str(s) => quote(s),
        Value::Function(f) => format!("[Function: {}]", f.name),
        Value::Object(o) => {
            let obj = o.borrow();
            if obj.kind == ObjectKind::Error {
                drop(obj);
                return format!("[{}]", error_summary(o));
            }
            let entries: Vec<(String, Value)> = obj
                .own_entries()
                .filter(|(_, p)| p.enumerable)
                .map(|(k, p)| (k.to_string(), p.value.clone()))
                .collect();
            drop(obj);
            if entries.is_empty() {
                return "{}".into();
            }
            if depth >= MAX_DEPTH {
                return "[Object]".into();
            }
            let body: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", format_key(k), format_at_depth(v, depth + 1)))
                .collect();
            format!("{{ {} }}", body.join(", "))
        }
        other => to_display_string(other),
    }
}

fn format_key(key: &str) -> String {
    let mut chars = key.chars();
    let ident = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if ident {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}
