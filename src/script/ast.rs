//! 抽象構文木（AST）
//!
//! 1 行 = 1 文。式文・宣言文・throw 文のみを扱う。
//! 代入は式として表現し、左辺は識別子かメンバ参照に限る。

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Declare {
        kind: DeclKind,
        name: String,
        init: Option<Expr>,
    },
    Throw(Expr),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

// 式ノード
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Ident {
        name: String,
    },
    Number {
        value: f64,
    },
    Str {
        value: String,
    },
    Bool {
        value: bool,
    },
    Null,
    Undefined,
    ObjectLit {
        entries: Vec<(String, Expr)>,
    },
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        and: bool,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: Option<BinOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Stmt {
    /// 最上位の `name = ...` / `name op= ...` であれば代入先の識別子を返す。
    pub fn assignment_target(&self) -> Option<&str> {
        match self {
            Stmt::Expr(Expr::Assign { target, .. }) => match target.as_ref() {
                Expr::Ident { name } => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// 最上位の宣言文であれば宣言された識別子を返す。
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Stmt::Declare { name, .. } => Some(name),
            _ => None,
        }
    }
}
