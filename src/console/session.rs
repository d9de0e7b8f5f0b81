// パス: src/console/session.rs
// 役割: Prompt/dispatch loop of the debugging console and its session lifecycle
// 意図: Pause the host, run operator input against the namespace, then restore it
// 関連ファイル: src/console/evaluator.rs, src/console/line_editor.rs, src/console/printer.rs
//! コンソールの対話ループ。
//!
//! 状態は `Prompting -> Dispatching -> (Prompting | Terminated)`。
//! `go` と入力終端は復元してから戻り、`exit` は復元せずに終了プリミティブを呼ぶ。

use std::io::{self, Write};

use tracing::{debug, error, info};

use super::evaluator::{evaluate, Snapshot};
use super::line_editor::{LineEditor, ReadResult};
use super::printer::{help_text, render_help, write_outcome};
use crate::config::ConsoleConfig;
use crate::engine::Engine;
use crate::namespace::Namespace;
use crate::script::ScriptEngine;

/// `exit` で終了プリミティブへ渡す終了コード。
pub const EXIT_CODE: i32 = 1;
pub const EXIT_NOTICE: &str = "緊急終了: 名前空間を復元せずにプロセスを終了します";
pub const GO_NOTICE: &str = "実行を再開します";

/// 1 行ずつ入力を供給する抽象。端末のほか、テストでは台本を使う。
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult>;
    fn add_history(&mut self, entry: &str);
    fn save_history(&mut self) -> io::Result<()>;
}

impl LineSource for LineEditor {
    fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult> {
        LineEditor::read_line(self, prompt)
    }

    fn add_history(&mut self, entry: &str) {
        LineEditor::add_history(self, entry);
    }

    fn save_history(&mut self) -> io::Result<()> {
        LineEditor::save_history(self)
    }
}

/// ホストプロセスの終了プリミティブ。本番実装は戻らない。
pub trait Terminate {
    fn terminate(&mut self, code: i32);
}

/// `std::process::exit` を呼ぶ終了プリミティブ。
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExit;

impl Terminate for ProcessExit {
    #[allow(unexpected_cfgs)]
    #[cfg_attr(coverage, coverage(off))]
    fn terminate(&mut self, code: i32) {
        std::process::exit(code);
    }
}

/// 解釈済みの入力行。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Exit,
    Go,
    Help,
    Blank,
    Eval(String),
}

/// 入力行を組み込みコマンドか評価対象の行に分類する。
///
/// コマンドは行全体との完全一致のみ。空白を含む `" exit"` などは評価に回す。
pub fn parse_command(line: &str) -> Command {
    if line.trim().is_empty() {
        return Command::Blank;
    }
    match line {
        "exit" => Command::Exit,
        "go" => Command::Go,
        "help" | "h" => Command::Help,
        other => Command::Eval(other.to_string()),
    }
}

/// ループがどう終わったか。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// 名前空間を復元してホストへ制御を戻した。
    Resumed,
    /// 終了プリミティブを呼んだ（復元なし）。
    Exited(i32),
}

/// 1 回の一時停止に対応するセッション状態。
#[derive(Debug)]
pub struct Session {
    active: bool,
    help_text: String,
    snapshot: Snapshot,
}

impl Session {
    /// 本文に組み込みコマンドの一覧を付けたヘルプでセッションを開始する。
    pub fn new(help_body: &str) -> Self {
        Self {
            active: true,
            help_text: help_text(help_body),
            snapshot: Snapshot::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// スナップショットを名前空間へ書き戻してセッションを閉じる。
    pub fn finish(&mut self, ns: &Namespace) {
        let restored = self.snapshot.len();
        self.snapshot.restore(ns);
        self.active = false;
        info!(restored, "console session finished");
    }
}

/// 任意の入出力と終了プリミティブでセッションを駆動する。
#[allow(clippy::too_many_arguments)]
pub fn run_session_with<G, S, T, W, E>(
    engine: &G,
    ns: &Namespace,
    session: &mut Session,
    prompt: &str,
    source: &mut S,
    terminator: &mut T,
    out: &mut W,
    err: &mut E,
) -> io::Result<SessionEnd>
where
    G: Engine + ?Sized,
    S: LineSource,
    T: Terminate,
    W: Write,
    E: Write,
{
    info!("console session started");
    writeln!(out, "一時停止中です。h でヘルプ、go で再開します。")?;
    loop {
        let line = match source.read_line(prompt) {
            Ok(ReadResult::Line(line)) => line,
            Ok(ReadResult::Interrupted) => continue,
            Ok(ReadResult::Eof) => {
                debug!("end of input; resuming");
                writeln!(out, "{}", GO_NOTICE)?;
                break;
            }
            Err(e) => {
                error!(error = %e, "console input failed; resuming");
                writeln!(err, "入力エラー: {}", e)?;
                break;
            }
        };
        let command = parse_command(&line);
        if command != Command::Blank {
            source.add_history(&line);
        }
        debug!(?command, "dispatching console input");
        match command {
            Command::Blank => {}
            Command::Exit => {
                error!("{}", EXIT_NOTICE);
                writeln!(err, "{}", EXIT_NOTICE)?;
                err.flush()?;
                save_history(source, err)?;
                terminator.terminate(EXIT_CODE);
                return Ok(SessionEnd::Exited(EXIT_CODE));
            }
            Command::Go => {
                writeln!(out, "{}", GO_NOTICE)?;
                break;
            }
            Command::Help => render_help(out, session.help_text())?,
            Command::Eval(src) => {
                let outcome = evaluate(engine, &src, ns, &mut session.snapshot);
                write_outcome(out, err, &outcome)?;
            }
        }
    }
    session.finish(ns);
    save_history(source, err)?;
    Ok(SessionEnd::Resumed)
}

fn save_history<S: LineSource, E: Write>(source: &mut S, err: &mut E) -> io::Result<()> {
    if let Err(e) = source.save_history() {
        writeln!(err, "ヒストリーの保存に失敗しました: {}", e)?;
    }
    Ok(())
}

/// 端末上でコンソールを開き、`go` まで呼び出し元を停止させる。
///
/// `exit` が入力された場合はプロセスごと終了するため戻らない。
///
/// # Examples
/// ```no_run
/// use pausepoint::config::ConsoleConfig;
/// use pausepoint::script::standard_namespace;
/// let ns = standard_namespace();
/// pausepoint::console::pause(&ns, &ConsoleConfig::default()).unwrap();
/// ```
pub fn pause(ns: &Namespace, config: &ConsoleConfig) -> io::Result<()> {
    let mut editor = LineEditor::new(ns.clone(), config);
    let mut session = Session::new(&config.help_text);
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    run_session_with(
        &ScriptEngine,
        ns,
        &mut session,
        &config.prompt,
        &mut editor,
        &mut ProcessExit,
        &mut stdout,
        &mut stderr,
    )?;
    Ok(())
}
