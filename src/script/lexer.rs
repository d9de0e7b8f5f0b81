// パス: src/script/lexer.rs
// 役割: Tokenizer for the console's script language
// 意図: Produce position-tagged tokens for the recursive-descent parser
// 関連ファイル: src/script/parser.rs, src/errors.rs, src/console/highlight.rs
//! 字句解析モジュール
//!
//! - 1 行分のソースをトークン列へ変換する。位置は文字オフセットで記録する。
//! - 識別子は `[A-Za-z_$][A-Za-z0-9_$]*`。予約語は別種別に振り分ける。
//! - 文字列は `'...'` / `"..."` の両方を受け付け、エスケープをここで展開する。

use crate::errors::LexerError;

#[derive(Debug, Clone, PartialEq)]
/// 生成されたトークンとその位置情報を保持するレコード。
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// 字句解析で識別されるトークンの分類。
pub enum TokenKind {
    EOF,
    // 演算子・記号トークン
    STRICTEQ, // `===`
    STRICTNE, // `!==`
    EQ,
    NE,
    LE,
    GE,
    LT,
    GT,
    ANDAND,
    OROR,
    PLUSEQ,
    MINUSEQ,
    STAREQ,
    SLASHEQ,
    DBLSTAR,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    BANG,
    ASSIGN,
    DOT,
    COMMA,
    COLON,
    SEMI,
    LPAREN,
    RPAREN,
    LBRACK,
    RBRACK,
    LBRACE,
    RBRACE,
    // リテラル分類
    NUMBER,
    STRING,
    // 識別子
    IDENT,
    // キーワード分類
    LET,
    CONST,
    VAR,
    THROW,
    NEW,
    TYPEOF,
    TRUE,
    FALSE,
    NULL,
    UNDEFINED,
}

/// 予約語の一覧。ハイライトでも同じ表を参照する。
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("let", TokenKind::LET),
    ("const", TokenKind::CONST),
    ("var", TokenKind::VAR),
    ("throw", TokenKind::THROW),
    ("new", TokenKind::NEW),
    ("typeof", TokenKind::TYPEOF),
    ("true", TokenKind::TRUE),
    ("false", TokenKind::FALSE),
    ("null", TokenKind::NULL),
    ("undefined", TokenKind::UNDEFINED),
];

/// 識別子の先頭に使用可能な文字かどうかを判定する。
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}
/// 識別子の後続として許容される文字か判定する。
pub fn is_ident_rest(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<char>,
    cursor: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.chars().collect(),
            cursor: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexerError> {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.cursor += 1;
                continue;
            }
            if self.starts_with("//") {
                break;
            }
            self.lex_token(ch)?;
        }
        let end = self.chars.len();
        self.push(TokenKind::EOF, String::new(), end);
        Ok(self.tokens)
    }

    fn lex_token(&mut self, ch: char) -> Result<(), LexerError> {
        if self.try_symbol() {
            return Ok(());
        }
        if ch == '\'' || ch == '"' {
            return self.lex_string(ch);
        }
        if ch.is_ascii_digit() || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.lex_number();
        }
        if is_ident_start(ch) {
            self.lex_identifier_or_keyword();
            return Ok(());
        }
        Err(self.err("LEX090", format!("字句解析に失敗: {:?}", ch), self.cursor))
    }

    fn try_symbol(&mut self) -> bool {
        // 長い記号から順に照合する。
        const SYMBOLS: &[(&str, TokenKind)] = &[
            ("===", TokenKind::STRICTEQ),
            ("!==", TokenKind::STRICTNE),
            ("==", TokenKind::EQ),
            ("!=", TokenKind::NE),
            ("<=", TokenKind::LE),
            (">=", TokenKind::GE),
            ("&&", TokenKind::ANDAND),
            ("||", TokenKind::OROR),
            ("+=", TokenKind::PLUSEQ),
            ("-=", TokenKind::MINUSEQ),
            ("*=", TokenKind::STAREQ),
            ("/=", TokenKind::SLASHEQ),
            ("**", TokenKind::DBLSTAR),
            ("<", TokenKind::LT),
            (">", TokenKind::GT),
            ("+", TokenKind::PLUS),
            ("-", TokenKind::MINUS),
            ("*", TokenKind::STAR),
            ("/", TokenKind::SLASH),
            ("%", TokenKind::PERCENT),
            ("!", TokenKind::BANG),
            ("=", TokenKind::ASSIGN),
            (",", TokenKind::COMMA),
            (":", TokenKind::COLON),
            (";", TokenKind::SEMI),
            ("(", TokenKind::LPAREN),
            (")", TokenKind::RPAREN),
            ("[", TokenKind::LBRACK),
            ("]", TokenKind::RBRACK),
            ("{", TokenKind::LBRACE),
            ("}", TokenKind::RBRACE),
        ];
        if self.peek() == Some('.') && !self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            let start = self.cursor;
            self.cursor += 1;
            self.push(TokenKind::DOT, ".".into(), start);
            return true;
        }
        for (text, kind) in SYMBOLS {
            if self.starts_with(text) {
                let start = self.cursor;
                self.cursor += text.chars().count();
                self.push(*kind, (*text).to_string(), start);
                return true;
            }
        }
        false
    }

    fn lex_string(&mut self, quote: char) -> Result<(), LexerError> {
        let start = self.cursor;
        self.cursor += 1; // 開始クォート
        let mut value = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.err("LEX003", "文字列リテラルが閉じていません", start));
            };
            self.cursor += 1;
            if ch == quote {
                break;
            }
            if ch != '\\' {
                value.push(ch);
                continue;
            }
            let Some(esc) = self.peek() else {
                return Err(self.err("LEX003", "文字列リテラルが閉じていません", start));
            };
            self.cursor += 1;
            value.push(match esc {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
        }
        self.push(TokenKind::STRING, value, start);
        Ok(())
    }

    fn lex_number(&mut self) -> Result<(), LexerError> {
        let start = self.cursor;
        if self.starts_with("0x") || self.starts_with("0X") {
            self.cursor += 2;
            let digits = self.take_while(|c| c.is_ascii_hexdigit());
            if digits.is_empty() {
                return Err(self.err("LEX010", "16進数の桁がありません", start));
            }
            let value = i64::from_str_radix(&digits, 16)
                .map(|v| v as f64)
                .map_err(|_| self.err("LEX011", "16進数が大きすぎます", start))?;
            self.push(TokenKind::NUMBER, value.to_string(), start);
            return Ok(());
        }
        let mut text = self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.cursor += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save = self.cursor;
            let mut exp = String::from("e");
            self.cursor += 1;
            if let Some(sign @ ('+' | '-')) = self.peek() {
                exp.push(sign);
                self.cursor += 1;
            }
            let digits = self.take_while(|c| c.is_ascii_digit());
            if digits.is_empty() {
                self.cursor = save;
            } else {
                exp.push_str(&digits);
                text.push_str(&exp);
            }
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(self.err("LEX012", "数値の直後に識別子があります", self.cursor));
        }
        self.push(TokenKind::NUMBER, text, start);
        Ok(())
    }

    fn lex_identifier_or_keyword(&mut self) {
        let start = self.cursor;
        let word = self.take_while(is_ident_rest);
        let kind = KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == word)
            .map(|(_, kind)| *kind)
            .unwrap_or(TokenKind::IDENT);
        self.push(kind, word, start);
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            out.push(ch);
            self.cursor += 1;
        }
        out
    }

    fn push(&mut self, kind: TokenKind, value: String, pos: usize) {
        self.tokens.push(Token { kind, value, pos });
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor + offset).copied()
    }

    fn starts_with(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.cursor + i) == Some(&c))
    }

    fn err(&self, code: &'static str, message: impl Into<String>, pos: usize) -> LexerError {
        LexerError::at_with_snippet(code, message, Some(pos), Some(1), Some(pos + 1), self.src)
    }
}

pub fn lex(src: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::new(src).run()
}

#[cfg(test)]
mod tests {
    use super::{lex, TokenKind};

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    /// 長い記号が短い記号より優先して切り出されることを確認する。
    fn longest_symbol_wins() {
        assert_eq!(
            kinds("a === b !== c ** 2"),
            vec![
                TokenKind::IDENT,
                TokenKind::STRICTEQ,
                TokenKind::IDENT,
                TokenKind::STRICTNE,
                TokenKind::IDENT,
                TokenKind::DBLSTAR,
                TokenKind::NUMBER,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    /// 数値リテラルの各表記と、メンバアクセスのドットを区別できるか検証する。
    fn numbers_and_member_dots() {
        let toks = lex("0x1f 1.5 .25 2e3 Math.PI").unwrap();
        assert_eq!(toks[0].value, "31");
        assert_eq!(toks[1].value, "1.5");
        assert_eq!(toks[2].value, ".25");
        assert_eq!(toks[3].value, "2e3");
        assert_eq!(toks[4].kind, TokenKind::IDENT);
        assert_eq!(toks[5].kind, TokenKind::DOT);
        assert_eq!(toks[6].value, "PI");
    }

    #[test]
    /// 文字列のエスケープが展開され、閉じ忘れはエラーになることを確認する。
    fn strings_unescape_and_report_unterminated() {
        let toks = lex(r#"'it\'s' "a\nb""#).unwrap();
        assert_eq!(toks[0].value, "it's");
        assert_eq!(toks[1].value, "a\nb");
        let err = lex("'open").unwrap_err();
        assert_eq!(err.0.code, "LEX003");
    }

    #[test]
    /// 予約語と `$` を含む識別子の分類を確認する。
    fn keywords_and_dollar_identifiers() {
        assert_eq!(
            kinds("let $el = undefined"),
            vec![
                TokenKind::LET,
                TokenKind::IDENT,
                TokenKind::ASSIGN,
                TokenKind::UNDEFINED,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    /// 行コメント以降は無視され、未知の文字はエラーになる。
    fn comments_and_unknown_characters() {
        assert_eq!(kinds("1 // note"), vec![TokenKind::NUMBER, TokenKind::EOF]);
        assert_eq!(lex("#").unwrap_err().0.code, "LEX090");
    }
}
