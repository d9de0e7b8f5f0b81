// パス: tests/script_engine.rs
// 役割: 既定のスクリプトエンジンを Engine トレイト越しに検証する
// 意図: コンソールから見える評価結果と表示形式を固定する
// 関連ファイル: tests/test_support.rs, src/script/mod.rs, src/script/interp.rs
mod test_support;

use pausepoint::engine::Engine;
use pausepoint::errors::EvalError;
use pausepoint::script::ScriptEngine;
use pausepoint::value::format_value;
use test_support::fixture_namespace;

fn eval_shown(src: &str) -> String {
    let ns = fixture_namespace();
    let v = ScriptEngine.evaluate(src, &ns).expect("evaluate");
    format_value(&v)
}

fn eval_failure(src: &str) -> String {
    let ns = fixture_namespace();
    ScriptEngine
        .evaluate(src, &ns)
        .expect_err("expected failure")
        .to_string()
}

#[test]
/// 算術・文字列連結・比較・論理演算が JavaScript 風に評価される。
fn operators_follow_script_semantics() {
    assert_eq!(eval_shown("1 + 2 * 3"), "7");
    assert_eq!(eval_shown("2 ** 3 ** 2"), "512");
    assert_eq!(eval_shown("7 % 4"), "3");
    assert_eq!(eval_shown("1 / 0"), "Infinity");
    assert_eq!(eval_shown("0.1 + 0.2"), "0.30000000000000004");
    assert_eq!(eval_shown("'n' + 1"), "'n1'");
    assert_eq!(eval_shown("'2' == 2"), "true");
    assert_eq!(eval_shown("'2' === 2"), "false");
    assert_eq!(eval_shown("null || 'fallback'"), "'fallback'");
    assert_eq!(eval_shown("x && greeting"), "'hi'");
    assert_eq!(eval_shown("!x"), "false");
    assert_eq!(eval_shown("typeof nope"), "'undefined'");
    assert_eq!(eval_shown("typeof Math.max"), "'function'");
}

#[test]
/// メンバー参照・メソッド呼び出し・組み込み関数が名前空間上で動く。
fn members_methods_and_builtins() {
    assert_eq!(eval_shown("config.retries * 2"), "6");
    assert_eq!(eval_shown("config['name']"), "'demo'");
    assert_eq!(eval_shown("greeting.toUpperCase()"), "'HI'");
    assert_eq!(eval_shown("greeting.length"), "2");
    assert_eq!(eval_shown("Math.max(1, 5, 3)"), "5");
    assert_eq!(eval_shown("Math.floor(2.7)"), "2");
    assert_eq!(eval_shown("parseInt('42px') + 1"), "43");
    assert_eq!(eval_shown("(3.14159).toFixed(2)"), "'3.14'");
    assert_eq!(eval_shown("config.hasOwnProperty('retries')"), "true");
    assert_eq!(
        eval_shown("JSON.stringify({ a: 1, b: 'x' })"),
        r#"'{"a":1,"b":"x"}'"#
    );
}

#[test]
/// オブジェクト・関数・エラーの表示形式を確認する。
fn display_formats() {
    assert_eq!(eval_shown("{ a: 1, 'b c': 'x' }"), "{ a: 1, 'b c': 'x' }");
    assert_eq!(eval_shown("{ a: { b: { c: {d: 1} } } }"), "{ a: { b: [Object] } }");
    assert_eq!(eval_shown("{}"), "{}");
    assert_eq!(eval_shown("Math.abs"), "[Function: abs]");
    assert_eq!(eval_shown("new TypeError('bad')"), "[TypeError: bad]");
    assert_eq!(eval_shown("undefined"), "undefined");
    assert_eq!(eval_shown("null"), "null");
}

#[test]
/// 代入は名前空間へ直接書き込まれ、ハンドルの複製からも見える。
fn assignments_write_through_the_shared_handle() {
    let ns = fixture_namespace();
    let alias = ns.clone();
    assert!(ns.same_as(&alias));
    ScriptEngine.evaluate("x = x + 41", &ns).unwrap();
    ScriptEngine.evaluate("config.retries += 1", &ns).unwrap();
    ScriptEngine.evaluate("let made = { n: 1 }", &ns).unwrap();
    assert_eq!(format_value(&alias.get("x").unwrap()), "42");
    assert_eq!(
        format_value(&ScriptEngine.evaluate("config.retries", &alias).unwrap()),
        "4"
    );
    assert!(alias.contains("made"));
}

#[test]
/// 実行時エラーは JavaScript 風の例外として整形される。
fn runtime_errors_are_thrown_values() {
    assert_eq!(eval_failure("nope + 1"), "Uncaught ReferenceError: nope is not defined");
    assert_eq!(eval_failure("x()"), "Uncaught TypeError: x is not a function");
    assert!(eval_failure("nothing.a").starts_with("Uncaught ReferenceError"));
    assert!(eval_failure("undefined.a").starts_with("Uncaught TypeError: Cannot read properties"));
    assert_eq!(eval_failure("throw 'plain'"), "Uncaught 'plain'");
    assert_eq!(eval_failure("throw new Error('boom')"), "Uncaught Error: boom");
}

#[test]
/// 構文エラーは ParseError として評価から返り、コード付きで表示される。
fn syntax_errors_surface_as_parse_errors() {
    let ns = fixture_namespace();
    let err = ScriptEngine.evaluate("1 +", &ns).unwrap_err();
    assert!(matches!(err, EvalError::Parse(_)));
    assert!(err.to_string().starts_with("[PAR"));
    let err = ScriptEngine.evaluate("'open", &ns).unwrap_err();
    assert!(err.to_string().starts_with("[LEX"));
}

#[test]
/// 束縛名の抽出は最上位の代入・宣言だけを対象にする。
fn binding_targets_are_top_level_only() {
    let e = ScriptEngine;
    assert_eq!(e.assignment_target("counter = 1").unwrap(), "counter");
    assert_eq!(e.assignment_target("counter *= 2;").unwrap(), "counter");
    assert!(e.assignment_target("config.retries = 1").is_err());
    assert!(e.assignment_target("let y = 1").is_err());
    assert_eq!(e.declaration_target("let y = 1").unwrap(), "y");
    assert_eq!(e.declaration_target("var z").unwrap(), "z");
    assert!(e.declaration_target("1 + 1").is_err());
    assert!(e.declaration_target("let = 1").is_err());
}
