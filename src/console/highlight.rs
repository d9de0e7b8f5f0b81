// パス: src/console/highlight.rs
// 役割: Syntax highlighting of the input line and removal of that decoration
// 意図: Separate display-only ANSI markers from the plain text the editor edits
// 関連ファイル: src/console/renderer.rs, src/console/completer.rs, src/script/lexer.rs
//! 入力行の装飾（ANSI エスケープ）と、その除去。
//!
//! 装飾は表示幅を変えずに文字列長だけを変える。カーソル計算は必ず `strip` 後の
//! プレーンテキストで行うこと。

use std::borrow::Cow;

use nu_ansi_term::{Color, Style};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::script::lexer::{is_ident_rest, is_ident_start, KEYWORDS};

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("ansi escape pattern"));

/// 装飾を取り除いたプレーンテキストを返す。装飾がなければ借用のまま返す。
pub fn strip(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// プレーンテキストとしての文字数。
pub fn plain_len(text: &str) -> usize {
    strip(text).chars().count()
}

/// 装飾済みかどうか。
pub fn is_decorated(text: &str) -> bool {
    ANSI_ESCAPE.is_match(text)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Class {
    Keyword,
    Literal,
    Number,
    Str,
    Comment,
    Plain,
}

impl Class {
    fn style(self) -> Option<Style> {
        match self {
            Class::Keyword => Some(Color::Magenta.bold()),
            Class::Literal | Class::Number => Some(Style::new().fg(Color::Yellow)),
            Class::Str => Some(Style::new().fg(Color::Green)),
            Class::Comment => Some(Style::new().fg(Color::DarkGray)),
            Class::Plain => None,
        }
    }
}

/// 入力行を字句単位で着色するハイライタ。
#[derive(Clone, Copy, Debug)]
pub struct Highlighter {
    enabled: bool,
}

impl Highlighter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// プレーンテキスト全体を装飾する。無効化されていればそのまま返す。
    ///
    /// 未完成の行（閉じていない文字列など）でも失敗しない。
    pub fn highlight(&self, plain: &str) -> String {
        if !self.enabled {
            return plain.to_string();
        }
        let mut out = String::with_capacity(plain.len() * 2);
        for (class, piece) in classify(plain) {
            match class.style() {
                Some(style) => out.push_str(&style.paint(piece.as_str()).to_string()),
                None => out.push_str(&piece),
            }
        }
        out
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(true)
    }
}

/// 寛容な字句分類。字句エラーは起こさず、未知の文字は素通しにする。
fn classify(src: &str) -> Vec<(Class, String)> {
    let chars: Vec<char> = src.chars().collect();
    let mut pieces: Vec<(Class, String)> = Vec::new();
    let mut i = 0;
    let mut after_dot = false;
    while i < chars.len() {
        let start = i;
        let ch = chars[i];
        let class = if ch == '/' && chars.get(i + 1) == Some(&'/') {
            i = chars.len();
            Class::Comment
        } else if ch == '\'' || ch == '"' {
            i += 1;
            while i < chars.len() && chars[i] != ch {
                i += if chars[i] == '\\' { 2 } else { 1 };
            }
            i = (i + 1).min(chars.len());
            Class::Str
        } else if ch.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                i += 1;
            }
            Class::Number
        } else if is_ident_start(ch) {
            while i < chars.len() && is_ident_rest(chars[i]) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            match KEYWORDS.iter().find(|(kw, _)| *kw == word) {
                // `.` の直後はプロパティ名なので着色しない。
                Some(_) if after_dot => Class::Plain,
                Some((kw, _)) if matches!(*kw, "true" | "false" | "null" | "undefined") => {
                    Class::Literal
                }
                Some(_) => Class::Keyword,
                None => Class::Plain,
            }
        } else {
            i += 1;
            Class::Plain
        };
        if !ch.is_whitespace() {
            after_dot = ch == '.' && class == Class::Plain;
        }
        let piece: String = chars[start..i].iter().collect();
        match pieces.last_mut() {
            Some((last, text)) if *last == class && class == Class::Plain => text.push_str(&piece),
            _ => pieces.push((class, piece)),
        }
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 装飾の付与と除去でプレーンテキストが復元されることを確認する。
    fn highlight_then_strip_restores_plain_text() {
        let h = Highlighter::new(true);
        let src = "let x = 'a' + 42 // note";
        let decorated = h.highlight(src);
        assert_ne!(decorated, src);
        assert!(is_decorated(&decorated));
        assert_eq!(strip(&decorated), src);
        assert_eq!(plain_len(&decorated), src.chars().count());
    }

    #[test]
    /// 未完成の文字列でも最後まで分類されることを確認する。
    fn unterminated_string_is_tolerated() {
        let h = Highlighter::new(true);
        let decorated = h.highlight("'abc");
        assert_eq!(strip(&decorated), "'abc");
    }

    #[test]
    /// 無効化されたハイライタは入力をそのまま返す。
    fn disabled_highlighter_is_identity() {
        let h = Highlighter::new(false);
        assert_eq!(h.highlight("let x = 1"), "let x = 1");
        assert!(!is_decorated("let x = 1"));
    }

    #[test]
    /// ドット直後の予約語はプロパティ名として扱われる。
    fn keywords_after_dot_are_plain() {
        let pieces = classify("a.new");
        assert_eq!(pieces, vec![(Class::Plain, "a.new".to_string())]);
        let pieces = classify("new X");
        assert_eq!(pieces[0], (Class::Keyword, "new".to_string()));
    }
}
