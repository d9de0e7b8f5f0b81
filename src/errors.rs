// パス: src/errors.rs
// 役割: Shared diagnostic record and the error types of every layer
// 意図: Keep one display format ([CODE] message @pos) across lexer, parser, resolver and evaluator
// 関連ファイル: src/script/lexer.rs, src/script/parser.rs, src/namespace.rs, src/script/interp.rs
//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ @line:col / @pos）。

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub msg: String,
    pub pos: Option<usize>,      // 文字オフセット（任意）
    pub line: Option<usize>,     // 1-origin（任意）
    pub col: Option<usize>,      // 1-origin（任意）
    pub snippet: Option<String>, // エラー行のスニペット（任意）
}

impl ErrorInfo {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
            line: None,
            col: None,
            snippet: None,
        }
    }

    pub fn at(
        code: &'static str,
        msg: impl Into<String>,
        pos: Option<usize>,
        line: Option<usize>,
        col: Option<usize>,
    ) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
            line,
            col,
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // 1行目: ヘッダ
        match (self.line, self.col, self.pos) {
            (Some(l), Some(c), Some(p)) => write!(
                f,
                "[{}] {} @line={},col={} @pos={}",
                self.code, self.msg, l, c, p
            )?,
            (Some(l), Some(c), None) => {
                write!(f, "[{}] {} @line={},col={}", self.code, self.msg, l, c)?
            }
            (_, _, Some(p)) => write!(f, "[{}] {} @pos={}", self.code, self.msg, p)?,
            _ => write!(f, "[{}] {}", self.code, self.msg)?,
        }
        // 2行目以降: スニペット
        if let (Some(s), Some(c)) = (&self.snippet, self.col) {
            let caret = if c > 1 {
                " ".repeat(c - 1) + "^"
            } else {
                "^".to_string()
            };
            write!(f, "\n{}\n{}", s, caret)?;
        }
        Ok(())
    }
}

/// 字句解析の失敗。
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct LexerError(pub ErrorInfo);

impl LexerError {
    pub fn at_with_snippet(
        code: &'static str,
        msg: impl Into<String>,
        pos: Option<usize>,
        line: Option<usize>,
        col: Option<usize>,
        snippet: impl Into<String>,
    ) -> Self {
        Self(ErrorInfo::at(code, msg, pos, line, col).with_snippet(snippet))
    }
}

/// 構文解析の失敗。字句エラーもこの型に畳み込んで上位へ渡す。
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ParseError(pub ErrorInfo);

impl ParseError {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self(ErrorInfo::new(code, msg, pos))
    }
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        Self(err.0)
    }
}

/// ドット区切りパスを名前空間上で解決できなかったことを表す。
///
/// 補完では空の候補として扱われ、利用者へ表示されることはない。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("[RES001] プロパティ '{segment}' が見つかりません (path: {path})")]
    Missing { path: String, segment: String },
    #[error("[RES002] '{segment}' の手前がオブジェクトではありません (path: {path})")]
    NotAnObject { path: String, segment: String },
}

/// 評価中に投げられた例外。
///
/// スクリプト側の `throw` は `Thrown` として値ごと保持し、表示時に整形する。
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("Uncaught {}", crate::value::describe_thrown(.0))]
    Thrown(crate::value::Value),
}

impl EvalError {
    /// 組み込みのエラーオブジェクトを生成して例外として包む。
    pub fn raise(ns: &crate::namespace::Namespace, kind: &str, msg: impl Into<String>) -> Self {
        EvalError::Thrown(ns.realm().make_error(kind, &msg.into()))
    }
}
