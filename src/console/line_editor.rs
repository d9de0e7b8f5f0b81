// パス: src/console/line_editor.rs
// 役割: Raw-mode terminal line editor with history, key decoding and redraw
// 意図: Provide interactive input whose keys run through the highlighting renderer
// 関連ファイル: src/console/renderer.rs, src/console/session.rs, src/config.rs
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[cfg(unix)]
use crossterm::terminal;

use super::highlight::{strip, Highlighter};
#[cfg(unix)]
use super::renderer::LineRenderer;
use crate::config::ConsoleConfig;
use crate::namespace::Namespace;

/// 行入力が返す 3 種類の結果を表す列挙体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    Line(String),
    Eof,
    Interrupted,
}

/// 端末から読み取ったキー 1 打鍵分の編集操作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Submit,
    Interrupt,
    Eof,
    DeleteLeft,
    DeleteRight,
    MoveLeft,
    MoveRight,
    Home,
    End,
    HistoryPrev,
    HistoryNext,
    Complete,
    InsertChar(char),
    Ignore,
}

/// 1 打鍵ずつ編集を受け付ける行バッファ。カーソルは文字単位。
pub trait LineEdit {
    fn text(&self) -> String;
    fn cursor(&self) -> usize;
    /// バッファ全体とカーソルを置き換える。履歴の走査位置は変えない。
    fn set_text(&mut self, text: &str, cursor: usize);
    /// 標準的な行編集としてキーを適用する。`Complete` などは無視してよい。
    fn apply(&mut self, key: Key);
}

/// 履歴付きの行編集を提供する簡易ラインエディタ。
pub struct LineEditor {
    history: History,
    highlighter: Highlighter,
    ns: Namespace,
}

impl LineEditor {
    /// 保存済みの履歴を読み込み、補完対象の名前空間を共有するエディタを構築する。
    pub fn new(ns: Namespace, config: &ConsoleConfig) -> Self {
        Self {
            history: History::load(config.history_file.clone(), config.max_history),
            highlighter: Highlighter::new(config.color),
            ns,
        }
    }

    /// プロンプトを出力し、1 行分の入力または制御シグナルを取得する。
    pub fn read_line(&mut self, prompt: &str) -> io::Result<ReadResult> {
        #[cfg(unix)]
        {
            self.read_line_unix(prompt)
        }
        #[cfg(not(unix))]
        {
            self.read_line_fallback(prompt)
        }
    }

    /// 入力文字列を履歴へ追加し、重複や空行を除外する。
    pub fn add_history(&mut self, entry: &str) {
        self.history.add(entry);
    }

    /// 現在の履歴内容を永続ストレージへ書き出す。
    pub fn save_history(&self) -> io::Result<()> {
        self.history.save()
    }
}

#[cfg(not(unix))]
impl LineEditor {
    /// Raw モードが利用できない環境向けのフォールバック読み取り。
    fn read_line_fallback(&mut self, prompt: &str) -> io::Result<ReadResult> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        let bytes = io::stdin().read_line(&mut line)?;
        if bytes == 0 {
            return Ok(ReadResult::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(ReadResult::Line(line))
    }
}

#[cfg(unix)]
impl LineEditor {
    /// UNIX 端末を Raw モードに切り替えて対話入力を処理する。
    #[allow(unexpected_cfgs)]
    #[cfg_attr(coverage, coverage(off))]
    fn read_line_unix(&mut self, prompt: &str) -> io::Result<ReadResult> {
        let _raw = RawMode::new()?;
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let stdin = io::stdin();
        let mut stdin = stdin.lock();
        let session = EditorSession::new(&self.history);
        let mut renderer = LineRenderer::new(session, self.highlighter, self.ns.clone());
        loop {
            let mut byte = [0u8; 1];
            if stdin.read(&mut byte)? == 0 {
                return Ok(ReadResult::Eof);
            }
            let key = interpret_key(byte[0], &mut stdin)?;
            match key {
                Key::Interrupt => {
                    write!(stdout, "^C\r\n")?;
                    stdout.flush()?;
                    return Ok(ReadResult::Interrupted);
                }
                Key::Eof if renderer.plain_text().is_empty() => {
                    write!(stdout, "\r\n")?;
                    stdout.flush()?;
                    return Ok(ReadResult::Eof);
                }
                Key::Ignore => continue,
                _ => {}
            }
            let rendered = renderer.handle(key);
            if key == Key::Submit {
                write!(stdout, "\r\n")?;
                stdout.flush()?;
                return Ok(ReadResult::Line(renderer.plain_text()));
            }
            if rendered.candidates.len() > 1 {
                write!(stdout, "\r\n{}\r\n", rendered.candidates.join("  "))?;
            }
            if rendered.redraw {
                refresh_line(&mut stdout, prompt, &renderer.text(), renderer.cursor())?;
            }
        }
    }
}

/// 先頭バイトと後続バイトから UTF-8 の 1 文字を復元する。
pub fn read_utf8_char<R: Read>(first: u8, reader: &mut R) -> io::Result<Option<char>> {
    let width = match first {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Ok(None),
    };
    let mut buf = [0u8; 4];
    buf[0] = first;
    for idx in 1..width {
        reader.read_exact(&mut buf[idx..idx + 1])?;
    }
    match std::str::from_utf8(&buf[..width]) {
        Ok(s) => Ok(s.chars().next()),
        Err(_) => Ok(None),
    }
}

/// 読み取った制御シーケンスを内部の編集操作へ写像する。
pub fn interpret_key<R: Read>(first: u8, reader: &mut R) -> io::Result<Key> {
    match first {
        b'\n' | b'\r' => Ok(Key::Submit),
        b'\t' => Ok(Key::Complete),
        0x01 => Ok(Key::Home),
        0x03 => Ok(Key::Interrupt),
        0x04 => Ok(Key::Eof),
        0x05 => Ok(Key::End),
        0x7f | 0x08 => Ok(Key::DeleteLeft),
        0x1b => {
            let mut seq = [0u8; 3];
            if reader.read_exact(&mut seq[..1]).is_err() {
                return Ok(Key::Ignore);
            }
            if seq[0] != b'[' {
                return Ok(Key::Ignore);
            }
            if reader.read_exact(&mut seq[1..2]).is_err() {
                return Ok(Key::Ignore);
            }
            Ok(match seq[1] {
                b'A' => Key::HistoryPrev,
                b'B' => Key::HistoryNext,
                b'C' => Key::MoveRight,
                b'D' => Key::MoveLeft,
                b'H' => Key::Home,
                b'F' => Key::End,
                // ESC [ 3 ~ は Delete キー。
                b'3' => match reader.read_exact(&mut seq[2..3]) {
                    Ok(()) if seq[2] == b'~' => Key::DeleteRight,
                    _ => Key::Ignore,
                },
                _ => Key::Ignore,
            })
        }
        _ => {
            if let Some(ch) = read_utf8_char(first, reader)? {
                if ch.is_control() {
                    Ok(Key::Ignore)
                } else {
                    Ok(Key::InsertChar(ch))
                }
            } else {
                Ok(Key::Ignore)
            }
        }
    }
}

/// 標準の行編集。文字の挿入・削除・カーソル移動・履歴走査を扱う。
pub struct EditorSession<'a> {
    buffer: Vec<char>,
    cursor: usize,
    history_index: usize,
    saved_current: Option<Vec<char>>,
    history: &'a History,
}

impl<'a> EditorSession<'a> {
    pub fn new(history: &'a History) -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            history_index: history.len(),
            saved_current: None,
            history,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += 1;
        self.reset_history_cursor();
    }

    fn delete_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.buffer.remove(self.cursor);
        self.reset_history_cursor();
        true
    }

    fn delete_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.buffer.remove(self.cursor);
        self.reset_history_cursor();
        true
    }

    fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    fn history_prev(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        if self.history_index == self.history.len() {
            self.saved_current = Some(self.buffer.clone());
        }
        self.history_index -= 1;
        if let Some(entry) = self.history.get(self.history_index) {
            self.buffer = entry.chars().collect();
            self.cursor = self.buffer.len();
            return true;
        }
        false
    }

    fn history_next(&mut self) -> bool {
        if self.history_index >= self.history.len() {
            return false;
        }
        self.history_index += 1;
        if self.history_index == self.history.len() {
            self.buffer = self.saved_current.take().unwrap_or_default();
        } else if let Some(entry) = self.history.get(self.history_index) {
            self.buffer = entry.chars().collect();
        }
        self.cursor = self.buffer.len();
        true
    }

    fn reset_history_cursor(&mut self) {
        self.history_index = self.history.len();
        self.saved_current = None;
    }
}

impl LineEdit for EditorSession<'_> {
    fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_text(&mut self, text: &str, cursor: usize) {
        self.buffer = text.chars().collect();
        self.cursor = cursor.min(self.buffer.len());
    }

    fn apply(&mut self, key: Key) {
        match key {
            Key::InsertChar(ch) => self.insert_char(ch),
            Key::DeleteLeft => {
                self.delete_left();
            }
            Key::DeleteRight => {
                self.delete_right();
            }
            Key::MoveLeft => {
                self.move_left();
            }
            Key::MoveRight => {
                self.move_right();
            }
            Key::Home => self.cursor = 0,
            Key::End => self.cursor = self.buffer.len(),
            Key::HistoryPrev => {
                self.history_prev();
            }
            Key::HistoryNext => {
                self.history_next();
            }
            Key::Submit | Key::Interrupt | Key::Eof | Key::Complete | Key::Ignore => {}
        }
    }
}

/// バッファとカーソル位置に合わせて行全体を再描画する。
///
/// `cursor` は `text` 上の文字位置。装飾を含む場合でも表示桁は装飾を除いて数える。
pub fn refresh_line<W: Write>(
    writer: &mut W,
    prompt: &str,
    text: &str,
    cursor: usize,
) -> io::Result<()> {
    write!(writer, "\r{}{}", prompt, text)?;
    write!(writer, "\x1b[K")?;
    let head: String = text.chars().take(cursor).collect();
    let total = strip(text).chars().count();
    let target = strip(&head).chars().count();
    if total > target {
        write!(writer, "\x1b[{}D", total - target)?;
    }
    writer.flush()
}

/// 入力履歴の保持と永続化を司る補助構造体。
pub struct History {
    entries: Vec<String>,
    path: Option<PathBuf>,
    max_entries: usize,
}

impl History {
    /// 過去の履歴ファイルを読み込み、`History` を初期化する。
    pub fn load(path: Option<PathBuf>, max_entries: usize) -> Self {
        let entries: Vec<String> = path
            .as_ref()
            .and_then(|p| fs::read_to_string(p).ok())
            .map(|content| content.lines().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        let mut history = Self {
            entries,
            path,
            max_entries: max_entries.max(1),
        };
        let excess = history.entries.len().saturating_sub(history.max_entries);
        history.entries.drain(..excess);
        history
    }

    /// 永続化しない空の履歴。
    pub fn in_memory(max_entries: usize) -> Self {
        Self::load(None, max_entries)
    }

    /// 新しい入力を追加し、空行と直前の重複をスキップする。
    pub fn add(&mut self, entry: &str) {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.entries.last().map(|s| s.as_str()) == Some(trimmed) {
            return;
        }
        if self.entries.len() == self.max_entries {
            self.entries.remove(0);
        }
        self.entries.push(trimmed.to_string());
    }

    /// 登録されている履歴件数を返す。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 指定インデックスの履歴エントリを参照する。
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|s| s.as_str())
    }

    /// 現在の履歴をファイルへ書き出す。
    pub fn save(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        for entry in &self.entries {
            writeln!(file, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
/// Raw モードへの切り替えと復帰を担う RAII ガード。
///
/// 端末属性の取得と復元は crossterm に任せ、ガードが落ちたときに必ず元へ戻す。
struct RawMode;

#[cfg(unix)]
impl RawMode {
    #[allow(unexpected_cfgs)]
    #[cfg_attr(coverage, coverage(off))]
    fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

#[cfg(unix)]
impl Drop for RawMode {
    #[allow(unexpected_cfgs)]
    #[cfg_attr(coverage, coverage(off))]
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn history(entries: &[&str], max: usize) -> History {
        History {
            entries: entries.iter().map(|s| s.to_string()).collect(),
            path: None,
            max_entries: max,
        }
    }

    #[test]
    /// 同じ入力が連続しても履歴に重複登録されず、空白は除去されることを確かめる。
    fn history_add_deduplicates_and_trims() {
        let mut h = history(&[], 5);
        h.add("   ");
        h.add(" x = 1 ");
        h.add("x = 1");
        h.add("go");
        assert_eq!(h.entries, vec!["x = 1", "go"]);
    }

    #[test]
    /// 上限を超えた履歴が先頭から削除されることを確認する。
    fn history_respects_max_entries() {
        let mut h = history(&["0", "1", "2"], 3);
        h.add("3");
        assert_eq!(h.entries, vec!["1", "2", "3"]);
    }

    #[test]
    /// 履歴が保存・再読込で失われず、読込時にも上限が適用されることを検証する。
    fn history_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.txt");
        let mut h = History::load(Some(path.clone()), 10);
        assert!(h.is_empty());
        h.add("a");
        h.add("b");
        h.add("c");
        h.save().unwrap();

        let loaded = History::load(Some(path.clone()), 10);
        assert_eq!(loaded.entries, vec!["a", "b", "c"]);
        let capped = History::load(Some(path), 2);
        assert_eq!(capped.entries, vec!["b", "c"]);
    }

    #[test]
    /// 複数バイトの UTF-8 文字の復元と、不正な先頭バイトの拒否を検証する。
    fn read_utf8_char_handles_multibyte_and_invalid() {
        let mut cursor = Cursor::new(vec![0x81, 0x82]);
        assert_eq!(read_utf8_char(0xe3, &mut cursor).unwrap(), Some('あ'));
        let mut cursor = Cursor::new(vec![0x00]);
        assert_eq!(read_utf8_char(0x80, &mut cursor).unwrap(), None);
    }

    #[test]
    /// 制御文字とエスケープシーケンスがキー操作へ変換されることを確認する。
    fn interpret_key_maps_sequences() {
        let cases: Vec<(u8, Vec<u8>, Key)> = vec![
            (b'\r', vec![], Key::Submit),
            (b'\t', vec![], Key::Complete),
            (0x01, vec![], Key::Home),
            (0x05, vec![], Key::End),
            (0x03, vec![], Key::Interrupt),
            (0x04, vec![], Key::Eof),
            (0x7f, vec![], Key::DeleteLeft),
            (0x1b, b"[A".to_vec(), Key::HistoryPrev),
            (0x1b, b"[B".to_vec(), Key::HistoryNext),
            (0x1b, b"[C".to_vec(), Key::MoveRight),
            (0x1b, b"[D".to_vec(), Key::MoveLeft),
            (0x1b, b"[H".to_vec(), Key::Home),
            (0x1b, b"[F".to_vec(), Key::End),
            (0x1b, b"[3~".to_vec(), Key::DeleteRight),
            (b'a', vec![], Key::InsertChar('a')),
        ];
        for (first, rest, expected) in cases {
            let mut reader = Cursor::new(rest);
            assert_eq!(interpret_key(first, &mut reader).unwrap(), expected);
        }
    }

    #[test]
    /// 不完全なエスケープシーケンスや非表示文字が無視されるか検証する。
    fn interpret_key_ignores_incomplete_sequences() {
        for rest in [vec![], vec![b'X'], vec![b'['], vec![b'[', b'Z'], vec![b'[', b'3']] {
            let mut reader = Cursor::new(rest);
            assert_eq!(interpret_key(0x1b, &mut reader).unwrap(), Key::Ignore);
        }
        let mut reader = Cursor::new(Vec::<u8>::new());
        assert_eq!(interpret_key(0x02, &mut reader).unwrap(), Key::Ignore);
    }

    #[test]
    /// 挿入・削除・Home/End などの基本編集がカーソル位置に従うことを確認する。
    fn editor_session_basic_editing() {
        let h = history(&[], 10);
        let mut s = EditorSession::new(&h);
        assert!(s.is_empty());
        for ch in "abc".chars() {
            s.apply(Key::InsertChar(ch));
        }
        s.apply(Key::Home);
        s.apply(Key::DeleteRight);
        assert_eq!((s.text().as_str(), s.cursor()), ("bc", 0));
        s.apply(Key::DeleteLeft);
        assert_eq!(s.text(), "bc");
        s.apply(Key::End);
        s.apply(Key::DeleteRight);
        s.apply(Key::MoveLeft);
        s.apply(Key::InsertChar('x'));
        assert_eq!((s.text().as_str(), s.cursor()), ("bxc", 2));
        s.apply(Key::Complete);
        assert_eq!(s.text(), "bxc");
    }

    #[test]
    /// 上下キーで履歴を辿り、最後に編集中の入力へ戻ることを確認する。
    fn editor_session_history_navigation() {
        let h = history(&["first", "second"], 10);
        let mut s = EditorSession::new(&h);
        s.apply(Key::InsertChar('t'));
        s.apply(Key::HistoryPrev);
        assert_eq!(s.text(), "second");
        s.apply(Key::HistoryPrev);
        assert_eq!(s.text(), "first");
        s.apply(Key::HistoryPrev);
        assert_eq!(s.text(), "first");
        s.apply(Key::HistoryNext);
        s.apply(Key::HistoryNext);
        assert_eq!((s.text().as_str(), s.cursor()), ("t", 1));
    }

    #[test]
    /// 装飾付きの行でも表示桁に基づいてカーソルを戻すことを確認する。
    fn refresh_line_counts_visual_columns() {
        let mut out: Vec<u8> = Vec::new();
        refresh_line(&mut out, ":: ", "abc", 1).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains(":: abc"));
        assert!(output.contains("\x1b[K"));
        assert!(output.contains("\x1b[2D"));

        let decorated = "\x1b[33m42\x1b[0m";
        let mut out: Vec<u8> = Vec::new();
        refresh_line(&mut out, "> ", decorated, decorated.chars().count()).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(!output.ends_with("D"));
    }

    #[cfg(unix)]
    #[test]
    /// Raw モードのガードは破棄時に端末を元へ戻す。端末がない環境では生成自体が失敗する。
    fn raw_mode_guard_restores_cooked_mode() {
        match RawMode::new() {
            Ok(guard) => {
                assert!(terminal::is_raw_mode_enabled().unwrap());
                drop(guard);
                assert!(!terminal::is_raw_mode_enabled().unwrap());
            }
            Err(_) => assert!(!terminal::is_raw_mode_enabled().unwrap()),
        }
    }
}
