// パス: tests/test_support.rs
// 役割: 統合テスト共通の台本入力・終了記録・名前空間フィクスチャを提供する
// 意図: 端末やプロセス終了に依存せずセッションを再現しテストを簡潔に保つ
// 関連ファイル: tests/session.rs, tests/completion.rs, tests/script_engine.rs
#![allow(dead_code)]
use std::collections::VecDeque;
use std::io;

use pausepoint::console::line_editor::ReadResult;
use pausepoint::console::{run_session_with, LineSource, Session, SessionEnd, Terminate};
use pausepoint::script::{standard_namespace, ScriptEngine};
use pausepoint::value::{format_value, Object, Value};
use pausepoint::Namespace;

/// 事前に用意した行を順に返す入力源。尽きたら EOF を返す。
pub struct ScriptedSource {
    lines: VecDeque<ReadResult>,
    pub prompts: Vec<String>,
    pub history: Vec<String>,
    pub saves: usize,
}

impl ScriptedSource {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines
                .iter()
                .map(|l| ReadResult::Line(l.to_string()))
                .collect(),
            prompts: Vec::new(),
            history: Vec::new(),
            saves: 0,
        }
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front().unwrap_or(ReadResult::Eof))
    }

    fn add_history(&mut self, entry: &str) {
        self.history.push(entry.to_string());
    }

    fn save_history(&mut self) -> io::Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// 終了プリミティブの呼び出しを記録するだけの実装。
#[derive(Default)]
pub struct RecordingTerminator {
    pub codes: Vec<i32>,
}

impl Terminate for RecordingTerminator {
    fn terminate(&mut self, code: i32) {
        self.codes.push(code);
    }
}

/// 1 回のセッション実行の記録。
pub struct Transcript {
    pub end: SessionEnd,
    pub out: String,
    pub err: String,
    pub exit_codes: Vec<i32>,
    pub prompts: usize,
    pub session: Session,
}

pub const PROMPT: &str = "debug> ";
pub const HELP_BODY: &str = "テスト用のヘルプ本文";

/// 組み込みに加えて `x = 1`、`config`、`greeting` を持つ名前空間。
pub fn fixture_namespace() -> Namespace {
    let ns = standard_namespace();
    ns.set("x", Value::Number(1.0));
    let mut config = Object::new(Some(ns.realm().object_proto.clone()));
    config.set("retries", Value::Number(3.0));
    config.set("retryDelay", Value::Number(250.0));
    config.set("name", Value::str("demo"));
    ns.set("config", Value::Object(config.into_ref()));
    ns.set("greeting", Value::str("hi"));
    ns
}

/// 台本どおりに入力してセッションを最後まで走らせる。
pub fn run_script(ns: &Namespace, lines: &[&str]) -> Transcript {
    let mut source = ScriptedSource::new(lines);
    let mut terminator = RecordingTerminator::default();
    let mut session = Session::new(HELP_BODY);
    let mut out = Vec::new();
    let mut err = Vec::new();
    let end = run_session_with(
        &ScriptEngine,
        ns,
        &mut session,
        PROMPT,
        &mut source,
        &mut terminator,
        &mut out,
        &mut err,
    )
    .expect("session io");
    Transcript {
        end,
        out: String::from_utf8(out).expect("utf8 stdout"),
        err: String::from_utf8(err).expect("utf8 stderr"),
        exit_codes: terminator.codes,
        prompts: source.prompts.len(),
        session,
    }
}

/// グローバル束縛を表示形式で取り出す。未定義なら `None`。
pub fn shown(ns: &Namespace, name: &str) -> Option<String> {
    ns.get(name).map(|v| format_value(&v))
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
