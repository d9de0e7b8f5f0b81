// パス: src/namespace.rs
// 役割: Shared namespace handle, built-in prototype realm and dotted-path resolution
// 意図: Make the live scope an explicit, cloneable handle that every component receives
// 関連ファイル: src/value.rs, src/console/completer.rs, src/console/evaluator.rs
//! 名前空間ハンドルとパス解決。
//!
//! `Namespace` はホストのグローバルスコープに相当するオブジェクトへの共有参照であり、
//! クローンしても同じ実体を指す。コンソールはこれを複製せず、常に参照越しに読み書きする。

use std::rc::Rc;

use crate::errors::ResolveError;
use crate::value::{enumerable_keys_in_chain, lookup, Object, ObjectKind, ObjectRef, Value};

/// 組み込みプロトタイプ一式。プリミティブのプロパティ参照にも使う。
#[derive(Debug)]
pub struct Realm {
    pub object_proto: ObjectRef,
    pub function_proto: ObjectRef,
    pub string_proto: ObjectRef,
    pub number_proto: ObjectRef,
    pub boolean_proto: ObjectRef,
    pub error_proto: ObjectRef,
}

impl Realm {
    fn new() -> Self {
        let object_proto = Object::new(None).into_ref();
        let child = || Object::new(Some(object_proto.clone())).into_ref();
        let error_proto = Object::with_kind(ObjectKind::Error, Some(object_proto.clone()));
        let error_proto = error_proto.into_ref();
        error_proto
            .borrow_mut()
            .define("name", Value::str("Error"), false);
        error_proto
            .borrow_mut()
            .define("message", Value::str(""), false);
        Self {
            function_proto: child(),
            string_proto: child(),
            number_proto: child(),
            boolean_proto: child(),
            error_proto,
            object_proto,
        }
    }

    /// `kind` 名（`Error`, `TypeError` など）のエラーオブジェクトを生成する。
    pub fn make_error(&self, kind: &str, message: &str) -> Value {
        let mut obj = Object::with_kind(ObjectKind::Error, Some(self.error_proto.clone()));
        if kind != "Error" {
            obj.define("name", Value::str(kind), false);
        }
        obj.define("message", Value::str(message), false);
        Value::Object(obj.into_ref())
    }

    /// 値に対応するプロトタイプを返す（`null` / `undefined` は持たない）。
    pub fn proto_of(&self, v: &Value) -> Option<ObjectRef> {
        match v {
            Value::Undefined | Value::Null => None,
            Value::Bool(_) => Some(self.boolean_proto.clone()),
            Value::Number(_) => Some(self.number_proto.clone()),
            Value::Str(_) => Some(self.string_proto.clone()),
            Value::Function(_) => Some(self.function_proto.clone()),
            Value::Object(o) => o.borrow().proto(),
        }
    }
}

/// ホストと共有する名前空間への参照。
#[derive(Clone, Debug)]
pub struct Namespace {
    global: ObjectRef,
    realm: Rc<Realm>,
}

impl Namespace {
    /// 組み込みを持たない空の名前空間を作る（プロトタイプだけは用意する）。
    pub fn new() -> Self {
        let realm = Rc::new(Realm::new());
        let global = Object::new(Some(realm.object_proto.clone())).into_ref();
        Self { global, realm }
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn global(&self) -> &ObjectRef {
        &self.global
    }

    /// 同じ実体を指すハンドルかどうか。
    pub fn same_as(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.global, &other.global)
    }

    /// グローバル束縛を読む。継承元（`Object.prototype`）は見ない。
    pub fn get(&self, name: &str) -> Option<Value> {
        self.global
            .borrow()
            .get_own(name)
            .map(|p| p.value.clone())
    }

    pub fn set(&self, name: &str, value: Value) {
        self.global.borrow_mut().set(name, value);
    }

    /// 列挙されない組み込み束縛として定義する。
    pub fn define_builtin(&self, name: &str, value: Value) {
        self.global.borrow_mut().define(name, value, false);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.global.borrow_mut().remove(name).map(|p| p.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.global.borrow().has_own(name)
    }

    /// 任意の値からプロパティを読む。プリミティブは対応するプロトタイプを参照する。
    ///
    /// 呼び出し側で `null` / `undefined` を弾いておくこと（ここでは `None` を返す）。
    pub fn get_property(&self, target: &Value, key: &str) -> Option<Value> {
        match target {
            Value::Object(o) => lookup(o, key),
            Value::Str(s) => {
                if key == "length" {
                    return Some(Value::Number(s.chars().count() as f64));
                }
                if let Ok(idx) = key.parse::<usize>() {
                    if let Some(ch) = s.chars().nth(idx) {
                        return Some(Value::Str(ch.to_string()));
                    }
                }
                lookup(&self.realm.string_proto, key)
            }
            Value::Function(f) => match key {
                "name" => Some(Value::str(f.name.clone())),
                _ => lookup(&self.realm.function_proto, key),
            },
            Value::Undefined | Value::Null => None,
            other => self.realm.proto_of(other).and_then(|p| lookup(&p, key)),
        }
    }

    /// `in` 演算子相当。オブジェクトと関数のみが対象になる。
    fn has_property(&self, target: &Value, key: &str) -> Option<bool> {
        match target {
            Value::Object(o) => Some(lookup(o, key).is_some()),
            Value::Function(_) => Some(self.get_property(target, key).is_some()),
            _ => None,
        }
    }

    /// 補完候補の元になるプロパティ名を集める。
    ///
    /// 列挙可能な自身・継承キー、自身の全プロパティ名、直接のプロトタイプの全プロパティ名の和集合。
    /// `null` / `undefined` は列挙できないため `None`。
    pub fn property_names(&self, target: &Value) -> Option<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        match target {
            Value::Undefined | Value::Null => return None,
            Value::Object(o) => {
                names.extend(enumerable_keys_in_chain(o));
                names.extend(o.borrow().own_keys());
            }
            Value::Str(s) => {
                names.extend((0..s.chars().count()).map(|i| i.to_string()));
                names.push("length".into());
            }
            Value::Function(_) => names.push("name".into()),
            Value::Bool(_) | Value::Number(_) => {}
        }
        if let Some(proto) = self.realm.proto_of(target) {
            names.extend(proto.borrow().own_keys());
        }
        Some(names)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

/// ドット区切りのパスを名前空間上で解決する。空パスはグローバルオブジェクト自身。
///
/// 途中の値がオブジェクト（または関数）でない場合や、プロパティが存在しない場合は失敗する。
/// 最終的な値はプリミティブでもよい。名前空間は一切変更しない。
pub fn resolve(path: &str, ns: &Namespace) -> Result<Value, ResolveError> {
    let mut current = Value::Object(ns.global().clone());
    if path.is_empty() {
        return Ok(current);
    }
    for segment in path.split('.') {
        match ns.has_property(&current, segment) {
            None => {
                return Err(ResolveError::NotAnObject {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
            Some(false) => {
                return Err(ResolveError::Missing {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
            Some(true) => {}
        }
        current = ns
            .get_property(&current, segment)
            .ok_or_else(|| ResolveError::Missing {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Namespace {
        let ns = Namespace::new();
        let mut config = Object::new(Some(ns.realm().object_proto.clone()));
        config.set("name", Value::str("demo"));
        config.set("retries", Value::Number(3.0));
        ns.set("config", Value::Object(config.into_ref()));
        ns
    }

    #[test]
    /// 空パスはグローバルオブジェクト自身へ解決されることを確認する。
    fn resolve_empty_path_is_global() {
        let ns = fixture();
        let v = resolve("", &ns).unwrap();
        assert!(matches!(v, Value::Object(ref o) if Rc::ptr_eq(o, ns.global())));
    }

    #[test]
    /// 入れ子のプロパティやプリミティブの終端値を解決できるか検証する。
    fn resolve_nested_and_primitive_leaf() {
        let ns = fixture();
        assert!(matches!(resolve("config", &ns).unwrap(), Value::Object(_)));
        assert!(matches!(resolve("config.name", &ns).unwrap(), Value::Str(ref s) if s == "demo"));
    }

    #[test]
    /// 欠落したプロパティやプリミティブを経由するパスは失敗する。
    fn resolve_failures() {
        let ns = fixture();
        assert!(matches!(
            resolve("missing", &ns),
            Err(ResolveError::Missing { .. })
        ));
        assert!(matches!(
            resolve("config.name.length", &ns),
            Err(ResolveError::NotAnObject { .. })
        ));
        assert!(matches!(
            resolve("config.", &ns),
            Err(ResolveError::Missing { .. })
        ));
    }

    #[test]
    /// ハンドルを複製しても同じ実体を共有していることを確かめる。
    fn cloned_handles_share_the_graph() {
        let ns = fixture();
        let alias = ns.clone();
        alias.set("x", Value::Number(1.0));
        assert!(ns.same_as(&alias));
        assert!(matches!(ns.get("x"), Some(Value::Number(n)) if n == 1.0));
        assert!(ns.remove("x").is_some());
        assert!(!alias.contains("x"));
    }

    #[test]
    /// 文字列のプロパティ名にはインデックスと length が含まれる。
    fn property_names_of_string_include_indices_and_length() {
        let ns = Namespace::new();
        let names = ns.property_names(&Value::str("ab")).unwrap();
        assert!(names.contains(&"0".to_string()));
        assert!(names.contains(&"1".to_string()));
        assert!(names.contains(&"length".to_string()));
        assert!(ns.property_names(&Value::Null).is_none());
    }
}
