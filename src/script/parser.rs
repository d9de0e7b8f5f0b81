// パス: src/script/parser.rs
// 役割: トークン列から 1 行分の文を生成する再帰下降パーサを実装する
// 意図: 代入先・宣言名の静的抽出と評価の両方に同じ AST を渡す
// 関連ファイル: src/script/lexer.rs, src/script/ast.rs, src/errors.rs
//! 構文解析モジュール
//!
//! - 演算子の優先順位は `|| < && < 等価 < 比較 < 加減 < 乗除 < **` をテーブルで表す。
//! - 代入は右結合で最も弱い。左辺は識別子かメンバ参照でなければならない。
//! - 1 行に 1 文のみ。末尾のセミコロンは省略可。
//! - 括弧・単項演算子・右結合演算子の入れ子は `MAX_NESTING` 段まで。超えると PAR040。

use crate::errors::ParseError;
use crate::script::ast::{BinOp, DeclKind, Expr, Stmt, UnaryOp};
use crate::script::lexer::{lex, Token, TokenKind};

/// 式の入れ子の上限。AST の深さもこれで抑えられ、評価時の再帰も有限になる。
pub const MAX_NESTING: usize = 64;

/// 再帰下降パーサの進行状態を保持する構造体。
pub struct Parser {
    ts: Vec<Token>,
    i: usize,
    depth: usize,
}

#[derive(Clone, Copy)]
enum Assoc {
    Left,
    Right,
}

struct InfixSpec {
    tokens: &'static [TokenKind],
    assoc: Assoc,
}

impl InfixSpec {
    fn contains(&self, kind: &TokenKind) -> bool {
        self.tokens.iter().any(|tk| tk == kind)
    }
}

const INFIX_LEVELS: &[InfixSpec] = &[
    InfixSpec {
        tokens: &[TokenKind::OROR],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::ANDAND],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[
            TokenKind::EQ,
            TokenKind::NE,
            TokenKind::STRICTEQ,
            TokenKind::STRICTNE,
        ],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::LT, TokenKind::LE, TokenKind::GT, TokenKind::GE],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::PLUS, TokenKind::MINUS],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::STAR, TokenKind::SLASH, TokenKind::PERCENT],
        assoc: Assoc::Left,
    },
    InfixSpec {
        tokens: &[TokenKind::DBLSTAR],
        assoc: Assoc::Right,
    },
];

fn binop_for(kind: TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::PLUS | TokenKind::PLUSEQ => BinOp::Add,
        TokenKind::MINUS | TokenKind::MINUSEQ => BinOp::Sub,
        TokenKind::STAR | TokenKind::STAREQ => BinOp::Mul,
        TokenKind::SLASH | TokenKind::SLASHEQ => BinOp::Div,
        TokenKind::PERCENT => BinOp::Rem,
        TokenKind::DBLSTAR => BinOp::Pow,
        TokenKind::EQ => BinOp::Eq,
        TokenKind::NE => BinOp::Ne,
        TokenKind::STRICTEQ => BinOp::StrictEq,
        TokenKind::STRICTNE => BinOp::StrictNe,
        TokenKind::LT => BinOp::Lt,
        TokenKind::LE => BinOp::Le,
        TokenKind::GT => BinOp::Gt,
        TokenKind::GE => BinOp::Ge,
        _ => return None,
    })
}

/// `Parser` が提供する各種解析メソッド。
impl Parser {
    /// トークン列から新しいパーサインスタンスを構築する。
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            ts: tokens,
            i: 0,
            depth: 0,
        }
    }
    /// 入れ子の段数を 1 つ進める。上限に達していれば PAR040。
    fn deepen(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(
                "PAR040",
                format!("式の入れ子が深すぎます（上限 {} 段）", MAX_NESTING),
                Some(self.peek().pos),
            ));
        }
        self.depth += 1;
        Ok(())
    }
    /// `f` の中で進めた段数を抜けるときに戻す。
    fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let base = self.depth;
        let result = f(self);
        self.depth = base;
        result
    }
    /// 入れ子を 1 段深くして `f` を実行する。
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.scoped(|p| {
            p.deepen()?;
            f(p)
        })
    }
    /// 現在位置のトークンを参照する。
    fn peek(&self) -> &Token {
        &self.ts[self.i.min(self.ts.len() - 1)]
    }
    /// 現在位置のトークンを消費して返す。
    fn pop_any(&mut self) -> Token {
        let t = self.peek().clone();
        if self.i < self.ts.len() - 1 {
            self.i += 1;
        }
        t
    }
    /// 指定した種別のトークンを期待しつつ消費する。
    fn pop(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let t = self.peek().clone();
        if t.kind != kind {
            return Err(ParseError::new(
                "PAR001",
                format!("{:?} を期待しましたが {:?} ({})", kind, t.kind, t.value),
                Some(t.pos),
            ));
        }
        Ok(self.pop_any())
    }
    /// 指定した種別が先頭にあれば消費し、なければ `None` を返す。
    fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind == kind {
            Some(self.pop_any())
        } else {
            None
        }
    }

    /// 1 行分の文（`stmt := decl | 'throw' expr | expr`、末尾 `;` 省略可）を解析する。
    pub fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let stmt = match self.peek().kind {
            TokenKind::LET | TokenKind::CONST | TokenKind::VAR => self.parse_declaration()?,
            TokenKind::THROW => {
                self.pop_any();
                Stmt::Throw(self.parse_expr()?)
            }
            _ => Stmt::Expr(self.parse_expr()?),
        };
        self.accept(TokenKind::SEMI);
        let t = self.peek();
        if t.kind != TokenKind::EOF {
            return Err(ParseError::new(
                "PAR002",
                format!("文の後に余分なトークンがあります: {}", t.value),
                Some(t.pos),
            ));
        }
        Ok(stmt)
    }

    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.pop_any();
        let kind = match kw.kind {
            TokenKind::CONST => DeclKind::Const,
            TokenKind::VAR => DeclKind::Var,
            _ => DeclKind::Let,
        };
        let name = self.pop(TokenKind::IDENT)?.value;
        let init = if self.accept(TokenKind::ASSIGN).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        if kind == DeclKind::Const && init.is_none() {
            return Err(ParseError::new(
                "PAR003",
                format!("const 宣言 {} に初期化子がありません", name),
                Some(kw.pos),
            ));
        }
        Ok(Stmt::Declare { kind, name, init })
    }

    /// 代入を含む式を解析する。
    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_assignment)
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().pos;
        let lhs = self.parse_infix_level(0)?;
        let op = match self.peek().kind {
            TokenKind::ASSIGN => None,
            kind @ (TokenKind::PLUSEQ
            | TokenKind::MINUSEQ
            | TokenKind::STAREQ
            | TokenKind::SLASHEQ) => binop_for(kind),
            _ => return Ok(lhs),
        };
        if !matches!(lhs, Expr::Ident { .. } | Expr::Member { .. }) {
            return Err(ParseError::new("PAR010", "代入先が不正です", Some(start)));
        }
        self.pop_any();
        let value = self.parse_expr()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(lhs),
            value: Box::new(value),
        })
    }

    fn parse_infix_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        let Some(spec) = INFIX_LEVELS.get(level) else {
            return self.parse_unary();
        };
        let base = self.depth;
        let result = self.parse_infix_chain(level, spec);
        self.depth = base;
        result
    }

    /// 同じ優先順位の演算子を畳み込む。左辺を包むたびに 1 段深くなる。
    fn parse_infix_chain(&mut self, level: usize, spec: &InfixSpec) -> Result<Expr, ParseError> {
        let mut left = self.parse_infix_level(level + 1)?;
        while spec.contains(&self.peek().kind) {
            self.deepen()?;
            let op_tok = self.pop_any();
            let right = match spec.assoc {
                Assoc::Left => self.parse_infix_level(level + 1)?,
                Assoc::Right => self.parse_infix_level(level)?,
            };
            left = match op_tok.kind {
                TokenKind::OROR | TokenKind::ANDAND => Expr::Logical {
                    and: op_tok.kind == TokenKind::ANDAND,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                kind => Expr::Binary {
                    op: binop_for(kind).ok_or_else(|| {
                        ParseError::new("PAR020", "未知の演算子", Some(op_tok.pos))
                    })?,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
            if matches!(spec.assoc, Assoc::Right) {
                break;
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek().kind {
            TokenKind::BANG => UnaryOp::Not,
            TokenKind::MINUS => UnaryOp::Neg,
            TokenKind::PLUS => UnaryOp::Plus,
            TokenKind::TYPEOF => UnaryOp::TypeOf,
            _ => return self.parse_postfix(),
        };
        self.pop_any();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let base = self.depth;
        let result = self.parse_postfix_chain();
        self.depth = base;
        result
    }

    /// メンバ参照・呼び出しを左から畳み込む。
    fn parse_postfix_chain(&mut self) -> Result<Expr, ParseError> {
        let mut expr = if self.peek().kind == TokenKind::NEW {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            if matches!(
                self.peek().kind,
                TokenKind::DOT | TokenKind::LBRACK | TokenKind::LPAREN
            ) {
                self.deepen()?;
            }
            match self.peek().kind {
                TokenKind::DOT => {
                    self.pop_any();
                    let name = self.pop_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(Expr::Str { value: name }),
                        computed: false,
                    };
                }
                TokenKind::LBRACK => {
                    self.pop_any();
                    let property = self.parse_expr()?;
                    self.pop(TokenKind::RBRACK)?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: true,
                    };
                }
                TokenKind::LPAREN => {
                    let args = self.parse_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// `.` の直後は予約語もプロパティ名として扱う。
    fn pop_property_name(&mut self) -> Result<String, ParseError> {
        let t = self.peek().clone();
        let is_word = t.kind == TokenKind::IDENT
            || crate::script::lexer::KEYWORDS
                .iter()
                .any(|(_, kind)| *kind == t.kind);
        if !is_word {
            return Err(ParseError::new(
                "PAR004",
                format!("プロパティ名を期待しましたが {:?} ({})", t.kind, t.value),
                Some(t.pos),
            ));
        }
        Ok(self.pop_any().value)
    }

    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        self.scoped(Self::parse_new_chain)
    }

    fn parse_new_chain(&mut self) -> Result<Expr, ParseError> {
        self.pop(TokenKind::NEW)?;
        let mut callee = Expr::Ident {
            name: self.pop(TokenKind::IDENT)?.value,
        };
        while self.accept(TokenKind::DOT).is_some() {
            self.deepen()?;
            let name = self.pop_property_name()?;
            callee = Expr::Member {
                object: Box::new(callee),
                property: Box::new(Expr::Str { value: name }),
                computed: false,
            };
        }
        let args = if self.peek().kind == TokenKind::LPAREN {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.pop(TokenKind::LPAREN)?;
        let mut args = Vec::new();
        if self.accept(TokenKind::RPAREN).is_some() {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.accept(TokenKind::COMMA).is_none() {
                break;
            }
        }
        self.pop(TokenKind::RPAREN)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let t = self.pop_any();
        match t.kind {
            TokenKind::IDENT => Ok(Expr::Ident { name: t.value }),
            TokenKind::NUMBER => t
                .value
                .parse::<f64>()
                .map(|value| Expr::Number { value })
                .map_err(|_| ParseError::new("PAR030", "数値リテラルが不正です", Some(t.pos))),
            TokenKind::STRING => Ok(Expr::Str { value: t.value }),
            TokenKind::TRUE => Ok(Expr::Bool { value: true }),
            TokenKind::FALSE => Ok(Expr::Bool { value: false }),
            TokenKind::NULL => Ok(Expr::Null),
            TokenKind::UNDEFINED => Ok(Expr::Undefined),
            TokenKind::LPAREN => {
                let e = self.parse_expr()?;
                self.pop(TokenKind::RPAREN)?;
                Ok(e)
            }
            TokenKind::LBRACE => self.parse_object_literal(),
            _ => Err(ParseError::new(
                "PAR090",
                format!("式を期待しましたが {:?} ({})", t.kind, t.value),
                Some(t.pos),
            )),
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();
        while self.peek().kind != TokenKind::RBRACE {
            let key_tok = self.pop_any();
            let key = match key_tok.kind {
                TokenKind::IDENT | TokenKind::STRING | TokenKind::NUMBER => key_tok.value,
                _ => {
                    return Err(ParseError::new(
                        "PAR005",
                        format!("オブジェクトのキーが不正です: {}", key_tok.value),
                        Some(key_tok.pos),
                    ))
                }
            };
            self.pop(TokenKind::COLON)?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if self.accept(TokenKind::COMMA).is_none() {
                break;
            }
        }
        self.pop(TokenKind::RBRACE)?;
        Ok(Expr::ObjectLit { entries })
    }
}

/// 文字列から 1 行分の文を解析する。
pub fn parse_statement(src: &str) -> Result<Stmt, ParseError> {
    let tokens = lex(src)?;
    Parser::new(tokens).parse_statement()
}
