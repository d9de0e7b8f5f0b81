// パス: src/console/mod.rs
// 役割: Console module facade and re-exports
// 意図: Expose the pause entry point and the pieces hosts and tests compose
// 関連ファイル: src/console/session.rs, src/console/line_editor.rs, src/lib.rs
//! 一時停止コンソールを構成するモジュール群をまとめたファサード。
//!
//! - `completer`: 名前空間に対する Tab 補完
//! - `highlight`: 入力行の装飾と除去
//! - `renderer`: 打鍵ごとの装飾維持
//! - `line_editor`: Raw モードの行入力と履歴
//! - `evaluator`: 行の評価とスナップショット
//! - `printer`: ヘルプと結果の表示
//! - `session`: 対話ループ

pub mod completer;
pub mod evaluator;
pub mod highlight;
pub mod line_editor;
pub mod printer;
pub mod renderer;
pub mod session;

pub use session::{pause, run_session_with, LineSource, ProcessExit, Session, SessionEnd, Terminate};
