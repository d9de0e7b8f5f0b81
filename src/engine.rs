// パス: src/engine.rs
// 役割: Narrow capability boundary between the console and a parser/evaluator
// 意図: Let the console stay ignorant of how lines are parsed and run
// 関連ファイル: src/script/mod.rs, src/console/evaluator.rs
//! 構文解析・評価の能力境界。
//!
//! コンソールはこのトレイトだけを通して入力行を扱う。テストでは差し替え可能。

use crate::errors::{EvalError, ParseError};
use crate::namespace::Namespace;
use crate::value::Value;

pub trait Engine {
    /// 行が最上位の代入文であれば、左辺の識別子を返す。
    fn assignment_target(&self, line: &str) -> Result<String, ParseError>;

    /// 行が最上位の宣言文であれば、宣言された識別子を返す。
    fn declaration_target(&self, line: &str) -> Result<String, ParseError>;

    /// 行を名前空間に対して評価する。書き込みは名前空間へ直接反映される。
    fn evaluate(&self, line: &str, ns: &Namespace) -> Result<Value, EvalError>;
}
