// パス: src/console/evaluator.rs
// 役割: Evaluate a console line, detect the binding it writes and snapshot the prior value
// 意図: Let the session put every touched top-level name back when it ends
// 関連ファイル: src/engine.rs, src/console/session.rs, src/namespace.rs
//! 入力行の評価と、束縛名ごとの元の値の記録。
//!
//! 記録は名前ごとにセッション中で最初の 1 回だけ。以後の再代入は記録を
//! 上書きしないため、復元時にはセッション開始前の値へ戻る。

use std::fmt;

use tracing::debug;

use crate::engine::Engine;
use crate::namespace::Namespace;
use crate::value::{format_value, Value};

/// 束縛名 → セッション開始前の値。`None` は未定義だったことを表す。
#[derive(Debug, Default)]
pub struct Snapshot {
    entries: Vec<(String, Option<Value>)>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 未記録の名前なら値を記録して `true` を返す。記録済みなら何もしない。
    pub fn record(&mut self, name: &str, original: Option<Value>) -> bool {
        if self.contains(name) {
            return false;
        }
        self.entries.push((name.to_string(), original));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Option<Value>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 記録した値をすべて名前空間へ書き戻し、記録を空にする。
    ///
    /// 元々未定義だった名前は名前空間から取り除く。
    pub fn restore(&mut self, ns: &Namespace) {
        for (name, original) in self.entries.drain(..) {
            match original {
                Some(value) => {
                    debug!(name = %name, "restoring binding");
                    ns.set(&name, value);
                }
                None => {
                    debug!(name = %name, "removing binding introduced by the session");
                    ns.remove(&name);
                }
            }
        }
    }
}

/// 1 行の評価結果。失敗は表示用に整形済みの文字列で持つ。
#[derive(Debug)]
pub struct EvaluationOutcome {
    pub result: Result<Value, String>,
    /// 行が代入・宣言した最上位の名前（静的に判明した場合）。
    pub bound_name: Option<String>,
}

impl EvaluationOutcome {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

impl fmt::Display for EvaluationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(value) => f.write_str(&format_value(value)),
            Err(reason) => f.write_str(reason),
        }
    }
}

/// 代入先、次に宣言名の順で束縛名の抽出を試みる。どちらも失敗すれば `None`。
pub fn binding_name<E: Engine + ?Sized>(engine: &E, line: &str) -> Option<String> {
    engine
        .assignment_target(line)
        .or_else(|_| engine.declaration_target(line))
        .ok()
}

/// 行を名前空間に対して評価し、成功時は束縛名の評価前の値をスナップショットへ記録する。
pub fn evaluate<E: Engine + ?Sized>(
    engine: &E,
    line: &str,
    ns: &Namespace,
    snapshot: &mut Snapshot,
) -> EvaluationOutcome {
    let bound_name = binding_name(engine, line);
    let before = bound_name.as_deref().map(|name| ns.get(name));
    match engine.evaluate(line, ns) {
        Ok(value) => {
            if let (Some(name), Some(original)) = (bound_name.as_deref(), before) {
                if snapshot.record(name, original) {
                    debug!(name, "snapshotted binding");
                }
            }
            EvaluationOutcome {
                result: Ok(value),
                bound_name,
            }
        }
        Err(err) => {
            debug!(%err, "evaluation failed");
            EvaluationOutcome {
                result: Err(err.to_string()),
                bound_name,
            }
        }
    }
}
