// パス: src/console/printer.rs
// 役割: Help text assembly and rendering of evaluation outcomes
// 意図: Keep console messaging consistent across commands
// 関連ファイル: src/console/session.rs, src/console/evaluator.rs, src/value.rs
//! セッションで用いるヘルプメッセージと評価結果の出力。

use std::io::{self, Write};

use super::evaluator::EvaluationOutcome;

/// ヘルプ本文の末尾へ常に付け加える組み込みコマンドの一覧。
pub const COMMANDS_SUFFIX: &str = concat!(
    "\n",
    "組み込みコマンド:\n",
    "  h, help   ヘルプ（本メッセージ）\n",
    "  go        名前空間を元に戻して実行を再開\n",
    "  exit      復元せずに即座にプロセスを終了\n",
);

/// 呼び出し側の本文に組み込みコマンドの一覧を連結する。
pub fn help_text(body: &str) -> String {
    let mut text = body.trim_end_matches('\n').to_string();
    text.push('\n');
    text.push_str(COMMANDS_SUFFIX);
    text
}

/// ヘルプメッセージを任意のライターへ描画する。
pub fn render_help<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())
}

/// 成功は `out` へ、失敗は `err` へ 1 行で書き出す。
pub fn write_outcome<W: Write, E: Write>(
    out: &mut W,
    err: &mut E,
    outcome: &EvaluationOutcome,
) -> io::Result<()> {
    if outcome.is_failure() {
        writeln!(err, "{}", outcome)
    } else {
        writeln!(out, "{}", outcome)
    }
}
