// パス: src/lib.rs
// 役割: Crate root wiring modules and exports
// 意図: Expose the console, the namespace model and the default script engine
// 関連ファイル: src/console/mod.rs, src/namespace.rs, src/engine.rs
//! pausepoint ルートモジュール
//!
//! 目的:
//! - ホストプログラムを一時停止し、生きた名前空間を対話的に調べて書き換える。
//! - `go` で再開するときは、セッション中に書き換えた束縛を元に戻す。
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - 名前空間は共有ハンドル (`Namespace`) として明示的に受け渡す。
//! - 構文解析と評価は `Engine` トレイトの向こう側に閉じ込める。
#![allow(unexpected_cfgs)]
#![cfg_attr(coverage, feature(coverage_attribute))]

pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod namespace;
pub mod script;
pub mod value;

pub use crate::config::ConsoleConfig;
pub use crate::console::pause;
pub use crate::engine::Engine;
pub use crate::namespace::{resolve, Namespace};
pub use crate::value::Value;
