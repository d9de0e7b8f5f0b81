// パス: src/config.rs
// 役割: Console configuration with defaults, JSON loading and environment overrides
// 意図: Keep prompt, help text, colour and history settings in one serialisable record
// 関連ファイル: src/console/session.rs, src/console/line_editor.rs, src/bin/pausepoint.rs
//! コンソール設定。
//!
//! 優先順位は「既定値 < JSON ファイル < 環境変数 < コマンドライン」。
//! コマンドラインの反映はバイナリ側で行う。

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 履歴ファイルの場所を上書きする環境変数。
pub const HISTORY_ENV: &str = "PAUSEPOINT_HISTORY_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[CFG001] 設定ファイルを読めません: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[CFG002] 設定ファイルの形式が不正です: {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// プロンプト文字列。
    pub prompt: String,
    /// ヘルプ本文。組み込みコマンドの一覧は常に末尾へ追加される。
    pub help_text: String,
    /// 入力行をハイライトするかどうか。
    pub color: bool,
    /// 履歴の保存先。`None` なら保存しない。
    pub history_file: Option<PathBuf>,
    pub max_history: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: "debug> ".into(),
            help_text: "実行を一時停止しています。式を入力すると現在の名前空間で評価します。".into(),
            color: true,
            history_file: default_history_path(),
            max_history: 1000,
        }
    }
}

impl ConsoleConfig {
    /// JSON ファイルから読み込む。欠けた項目は既定値で補う。
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 環境変数による上書きを適用する（`PAUSEPOINT_HISTORY_FILE`, `NO_COLOR`）。
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = env::var_os(HISTORY_ENV) {
            self.history_file = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.color = false;
        }
        self
    }
}

/// 履歴ファイルの既定の保存場所をユーザーのホームから決定する。
fn default_history_path() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .map(|home| home.join(".pausepoint_history"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    /// 環境変数を書き換えるテストを直列化するためのヘルパ。
    fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        let lock = GUARD.get_or_init(|| Mutex::new(()));
        let _guard = lock.lock().unwrap();
        f()
    }

    #[test]
    /// JSON の一部項目だけを指定しても残りは既定値になることを確認する。
    fn partial_json_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        fs::write(&path, r#"{ "prompt": ">> ", "color": false }"#).unwrap();
        let cfg = ConsoleConfig::from_file(&path).unwrap();
        assert_eq!(cfg.prompt, ">> ");
        assert!(!cfg.color);
        assert_eq!(cfg.max_history, ConsoleConfig::default().max_history);
    }

    #[test]
    /// 未知のキーや壊れた JSON はエラーとして報告される。
    fn invalid_json_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console.json");
        fs::write(&path, r#"{ "promt": ">> " }"#).unwrap();
        assert!(matches!(
            ConsoleConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            ConsoleConfig::from_file(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    /// 環境変数で履歴パスと色設定を上書きできることを確認する。
    fn env_overrides_history_and_color() {
        with_env_lock(|| {
            env::set_var(HISTORY_ENV, "/tmp/pausepoint_env_history");
            env::set_var("NO_COLOR", "1");
            let cfg = ConsoleConfig::default().with_env_overrides();
            env::remove_var(HISTORY_ENV);
            env::remove_var("NO_COLOR");
            assert_eq!(
                cfg.history_file.as_deref(),
                Some(Path::new("/tmp/pausepoint_env_history"))
            );
            assert!(!cfg.color);
        });
    }
}
