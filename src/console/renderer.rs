// パス: src/console/renderer.rs
// 役割: Per-keystroke wrapper that keeps the edit buffer highlighted without losing the cursor
// 意図: Compose highlighting and tab completion around a plain line-edit handler
// 関連ファイル: src/console/line_editor.rs, src/console/highlight.rs, src/console/completer.rs
//! 打鍵ごとの装飾維持。
//!
//! 基底の `LineEdit` は常にプレーンテキストを編集し、このラッパーが前後で
//! 装飾の除去と再付与を行う。不変条件: 装飾済みのバッファではカーソルが
//! 必ず装飾後の末尾にある。

use super::completer::{common_prefix, complete};
use super::highlight::{plain_len, strip, Highlighter};
use super::line_editor::{Key, LineEdit};
use crate::namespace::Namespace;

/// 1 打鍵の処理結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// 行の再描画が必要か。改行確定時のみ `false`。
    pub redraw: bool,
    /// Tab で複数候補が見つかったときの一覧。
    pub candidates: Vec<String>,
}

pub struct LineRenderer<E: LineEdit> {
    base: E,
    highlighter: Highlighter,
    ns: Namespace,
}

impl<E: LineEdit> LineRenderer<E> {
    pub fn new(base: E, highlighter: Highlighter, ns: Namespace) -> Self {
        Self {
            base,
            highlighter,
            ns,
        }
    }

    /// 表示用のバッファ（装飾を含みうる）。
    pub fn text(&self) -> String {
        self.base.text()
    }

    pub fn plain_text(&self) -> String {
        strip(&self.base.text()).into_owned()
    }

    pub fn cursor(&self) -> usize {
        self.base.cursor()
    }

    /// キーを 1 つ処理する。
    pub fn handle(&mut self, key: Key) -> Rendered {
        self.undecorate();
        let candidates = match key {
            Key::Complete => self.complete_at_cursor(),
            other => {
                self.base.apply(other);
                Vec::new()
            }
        };
        let text = self.base.text();
        if self.base.cursor() < plain_len(&text) {
            self.undecorate();
        } else {
            let decorated = self.highlighter.highlight(&strip(&text));
            let end = decorated.chars().count();
            self.base.set_text(&decorated, end);
        }
        Rendered {
            redraw: key != Key::Submit,
            candidates,
        }
    }

    /// 装飾を除去し、プレーン長を超えたカーソルを行末へ寄せる。
    fn undecorate(&mut self) {
        let text = self.base.text();
        let plain = strip(&text);
        if plain.len() == text.len() {
            return;
        }
        let len = plain.chars().count();
        let cursor = self.base.cursor().min(len);
        self.base.set_text(&plain, cursor);
    }

    /// カーソルより前の部分を補完する。候補が 1 つならトークンを置き換え、
    /// 複数なら共通接頭辞まで伸ばして候補一覧を返す。
    fn complete_at_cursor(&mut self) -> Vec<String> {
        let text = self.base.text();
        let cursor = self.base.cursor();
        let before: String = text.chars().take(cursor).collect();
        let after: String = text.chars().skip(cursor).collect();
        let (candidates, token) = complete(&before, &self.ns);
        if candidates.is_empty() || !before.ends_with(token.as_str()) {
            return Vec::new();
        }
        let replacement = if candidates.len() == 1 {
            candidates[0].clone()
        } else {
            common_prefix(&candidates)
        };
        if replacement.len() > token.len() {
            let head = &before[..before.len() - token.len()];
            let line = format!("{}{}{}", head, replacement, after);
            let new_cursor = head.chars().count() + replacement.chars().count();
            self.base.set_text(&line, new_cursor);
        }
        if candidates.len() > 1 {
            candidates
        } else {
            Vec::new()
        }
    }
}
