// パス: tests/session.rs
// 役割: 対話ループの組み込みコマンド・評価・復元をシナリオで検証する
// 意図: go による復元と exit の非復元という非対称な挙動を固定する
// 関連ファイル: tests/test_support.rs, src/console/session.rs, src/console/evaluator.rs
mod test_support;

use pausepoint::console::printer::COMMANDS_SUFFIX;
use pausepoint::console::session::{EXIT_CODE, EXIT_NOTICE, GO_NOTICE};
use pausepoint::console::SessionEnd;
use test_support::{fixture_namespace, run_script, shown, HELP_BODY};

#[test]
/// `x = 2` のあと `go` で x がセッション前の 1 に戻る。
fn go_restores_overwritten_binding() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["x = 2", "go"]);
    assert_eq!(t.end, SessionEnd::Resumed);
    assert!(t.out.lines().any(|l| l == "2"));
    assert!(t.out.contains(GO_NOTICE));
    assert_eq!(shown(&ns, "x").as_deref(), Some("1"));
    assert!(!t.session.is_active());
    assert!(t.session.snapshot().is_empty());
}

#[test]
/// 同じ名前を何度書き換えても、復元先はセッション開始前の値になる。
fn repeated_rebinding_restores_pre_session_value() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["x = 2", "x = 3", "x += 10", "x", "go"]);
    assert!(t.out.lines().any(|l| l == "13"));
    assert_eq!(shown(&ns, "x").as_deref(), Some("1"));
}

#[test]
/// セッション中に新しく導入した名前は、再開時に取り除かれる。
fn go_removes_bindings_introduced_by_the_session() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["let fresh = 'tmp'", "var other = 2", "fresh + other", "go"]);
    assert!(t.out.lines().any(|l| l == "'tmp2'"));
    assert!(!ns.contains("fresh"));
    assert!(!ns.contains("other"));
}

#[test]
/// `1+1` は `2` を表示して再びプロンプトを出す。
fn expression_prints_result_and_reprompts() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["1+1"]);
    assert!(t.out.lines().any(|l| l == "2"));
    // 1 行目と、入力終端を受け取った 2 回目。
    assert_eq!(t.prompts, 2);
    assert!(t.err.is_empty());
}

#[test]
/// `exit` は非ゼロで終了プリミティブを呼び、スナップショットがあっても復元しない。
fn exit_terminates_without_restoring() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["x = 2", "exit", "x = 99"]);
    assert_eq!(t.end, SessionEnd::Exited(EXIT_CODE));
    assert_eq!(t.exit_codes, vec![EXIT_CODE]);
    assert_ne!(EXIT_CODE, 0);
    assert!(t.err.contains(EXIT_NOTICE));
    // 記録はあるが適用されていない。
    assert!(t.session.snapshot().contains("x"));
    assert!(t.session.is_active());
    assert_eq!(shown(&ns, "x").as_deref(), Some("2"));
    assert_eq!(t.prompts, 2);
}

#[test]
/// `help` と `h` はヘルプを原文どおり表示し、名前空間もスナップショットも変えない。
fn help_prints_text_verbatim_without_side_effects() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["help", "h"]);
    let help = t.session.help_text().to_string();
    assert!(help.starts_with(HELP_BODY));
    assert!(help.ends_with(COMMANDS_SUFFIX));
    assert_eq!(t.out.matches(help.as_str()).count(), 2);
    for command in ["h, help", "go", "exit"] {
        assert!(
            help.lines().any(|l| l.trim_start().starts_with(command)),
            "missing command line: {}",
            command
        );
    }
    assert!(t.session.snapshot().is_empty());
    assert_eq!(shown(&ns, "x").as_deref(), Some("1"));
}

#[test]
/// 例外を投げる行は整形済みの失敗として表示され、束縛は記録されない。
fn throwing_line_prints_failure_and_records_nothing() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["throw new Error('boom')", "x = nope", "x"]);
    assert!(t.err.lines().any(|l| l == "Uncaught Error: boom"));
    assert!(t
        .err
        .lines()
        .any(|l| l == "Uncaught ReferenceError: nope is not defined"));
    assert!(t.out.lines().any(|l| l == "1"));
    assert_eq!(t.prompts, 4);
    assert_eq!(shown(&ns, "x").as_deref(), Some("1"));
}

#[test]
/// 構文エラーも評価の失敗として表示され、ループは続く。
fn syntax_error_is_reported_and_loop_continues() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["1 +", "2 * 3"]);
    assert!(t.err.contains("PAR"));
    assert!(t.out.lines().any(|l| l == "6"));
}

#[test]
/// オブジェクト内部への書き込みは最上位の束縛ではないため復元対象にならない。
fn member_writes_are_not_snapshotted() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["config.retries = 9", "go"]);
    assert!(t.out.lines().any(|l| l == "9"));
    assert_eq!(
        shown(&ns, "config").as_deref(),
        Some("{ retries: 9, retryDelay: 250, name: 'demo' }")
    );
}

#[test]
/// 空行は履歴にもスナップショットにも影響しない。
fn blank_lines_are_ignored() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["", "   ", "go"]);
    assert!(t.err.is_empty());
    assert_eq!(t.prompts, 3);
    assert!(!t.out.lines().any(|l| l == "undefined"));
}

#[test]
/// 前後に空白の付いた `exit` や `go` はコマンドではなく通常の入力として評価される。
fn padded_commands_are_evaluated_not_dispatched() {
    let ns = fixture_namespace();
    let t = run_script(&ns, &["x = 5", " exit", "go ", " help"]);
    assert!(t.exit_codes.is_empty());
    assert!(!t.err.contains(EXIT_NOTICE));
    assert!(t
        .err
        .lines()
        .any(|l| l == "Uncaught ReferenceError: exit is not defined"));
    assert!(t
        .err
        .lines()
        .any(|l| l == "Uncaught ReferenceError: go is not defined"));
    assert!(!t.out.contains(COMMANDS_SUFFIX));
    // 入力終端で再開し、x は復元される。
    assert_eq!(t.end, SessionEnd::Resumed);
    assert_eq!(shown(&ns, "x").as_deref(), Some("1"));
}

#[test]
/// 入れ子の深すぎる行は構文エラーとして表示され、プロンプトに戻る。
fn deeply_nested_line_fails_without_ending_the_session() {
    let ns = fixture_namespace();
    let deep_unary = format!("{}1", "-".repeat(20_000));
    let deep_parens = format!("x = {}2{}", "(".repeat(5_000), ")".repeat(5_000));
    let t = run_script(&ns, &[&deep_unary, &deep_parens, "x + 1"]);
    assert_eq!(t.err.matches("[PAR040]").count(), 2);
    assert!(t.out.lines().any(|l| l == "2"));
    assert_eq!(t.prompts, 4);
    assert_eq!(shown(&ns, "x").as_deref(), Some("1"));
}
