// パス: src/script/mod.rs
// 役割: Default script engine wiring lexer, parser and evaluator behind the Engine trait
// 意図: Provide a JavaScript-flavoured language for inspecting and mutating the namespace
// 関連ファイル: src/engine.rs, src/script/parser.rs, src/script/interp.rs
//! 既定のスクリプトエンジン。
//!
//! - `lexer`: 字句解析
//! - `parser`: 1 行 1 文の構文解析
//! - `interp`: 名前空間に対する評価
//! - `builtins`: `Math` などの組み込み

pub mod ast;
pub mod builtins;
pub mod interp;
pub mod lexer;
pub mod parser;

use crate::engine::Engine;
use crate::errors::{EvalError, ParseError};
use crate::namespace::Namespace;
use crate::value::Value;

/// `Engine` の標準実装。状態を持たない。
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptEngine;

impl Engine for ScriptEngine {
    fn assignment_target(&self, line: &str) -> Result<String, ParseError> {
        let stmt = parser::parse_statement(line)?;
        stmt.assignment_target()
            .map(str::to_string)
            .ok_or_else(|| ParseError::new("PAR100", "最上位の代入文ではありません", None))
    }

    fn declaration_target(&self, line: &str) -> Result<String, ParseError> {
        let stmt = parser::parse_statement(line)?;
        stmt.declared_name()
            .map(str::to_string)
            .ok_or_else(|| ParseError::new("PAR101", "最上位の宣言文ではありません", None))
    }

    fn evaluate(&self, line: &str, ns: &Namespace) -> Result<Value, EvalError> {
        let stmt = parser::parse_statement(line)?;
        interp::exec_statement(&stmt, ns)
    }
}

/// 組み込み一式を登録済みの名前空間を作る。
pub fn standard_namespace() -> Namespace {
    let ns = Namespace::new();
    builtins::install(&ns);
    ns
}
