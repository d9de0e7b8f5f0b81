// パス: src/console/completer.rs
// 役割: Tab completion of identifiers and dotted paths against the live namespace
// 意図: Offer candidates the operator can actually reach from the prompt
// 関連ファイル: src/namespace.rs, src/console/line_editor.rs, src/console/highlight.rs
//! 入力行末尾のトークンに対する補完候補の生成。
//!
//! 手順:
//! 1. 装飾を取り除き、`[A-Za-z0-9._$]` の連続でトークンに分ける。
//! 2. 最後のトークンを最後の `.` で `object_path` と `prefix` に分ける。
//! 3. `object_path` を名前空間上で解決し、そのプロパティ名から候補を選ぶ。
//!
//! 解決や列挙の失敗は空の候補として返し、エラーとしては扱わない。

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::highlight::strip;
use crate::namespace::{resolve, Namespace};

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9._$]+").expect("token pattern"));
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_$]+$").expect("identifier pattern"));

/// 補完対象。`object_path` はドットを含まないトークンでは `None`。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionTarget {
    pub object_path: Option<String>,
    pub prefix: String,
}

impl CompletionTarget {
    /// トークンを最後の `.` で分割する。
    pub fn parse(token: &str) -> Self {
        match token.rfind('.') {
            Some(idx) => Self {
                object_path: Some(token[..idx].to_string()),
                prefix: token[idx + 1..].to_string(),
            },
            None => Self {
                object_path: None,
                prefix: token.to_string(),
            },
        }
    }
}

/// 行をトークン列に分解する。
pub fn tokenize(line: &str) -> Vec<&str> {
    TOKEN.find_iter(line).map(|m| m.as_str()).collect()
}

/// 補完候補と、置き換え対象となったトークンを返す。
///
/// # Examples
/// ```
/// use pausepoint::console::completer::complete;
/// use pausepoint::script::standard_namespace;
/// let ns = standard_namespace();
/// let (candidates, token) = complete("Math.fl", &ns);
/// assert_eq!(candidates, vec!["Math.floor".to_string()]);
/// assert_eq!(token, "Math.fl");
/// ```
pub fn complete(line: &str, ns: &Namespace) -> (Vec<String>, String) {
    let plain = strip(line);
    let Some(token) = tokenize(&plain).last().map(|t| t.to_string()) else {
        return (Vec::new(), line.to_string());
    };
    let target = CompletionTarget::parse(&token);
    let object_path = match target.object_path.as_deref() {
        // `.foo` のように修飾子のないドットは曖昧なので候補なし。
        Some("") => return (Vec::new(), token),
        other => other,
    };
    let resolved = match resolve(object_path.unwrap_or(""), ns) {
        Ok(v) => v,
        Err(err) => {
            debug!(%err, "completion target did not resolve");
            return (Vec::new(), token);
        }
    };
    let Some(mut names) = ns.property_names(&resolved) else {
        return (Vec::new(), token);
    };
    names.sort();
    names.dedup();
    let candidates = names
        .into_iter()
        .filter(|name| name.starts_with(&target.prefix))
        .filter(|name| IDENTIFIER.is_match(name))
        .filter(|name| !name.starts_with(|c: char| c.is_ascii_digit()))
        .map(|name| match object_path {
            Some(path) => format!("{}.{}", path, name),
            None => name,
        })
        .collect();
    (candidates, token)
}

/// 候補群の最長共通接頭辞。
pub fn common_prefix(candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut len = first.len();
    for c in &candidates[1..] {
        len = first
            .char_indices()
            .zip(c.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((i, a), _)| i + a.len_utf8())
            .unwrap_or(0)
            .min(len);
    }
    first[..len].to_string()
}
