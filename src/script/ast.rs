// src/script/ast.rs

//! Syntax tree produced by the parser and walked by the interpreter.

use std::fmt;
use std::rc::Rc;

/// A parsed script: the ordered top-level statements of one source fragment.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) body: Vec<Stmt>,
}

impl Program {
    /// Returns the number of top-level statements.
    pub fn statement_count(&self) -> usize {
        self.body.len()
    }

    /// Names of the functions declared at the top level, in source order.
    pub fn declared_functions(&self) -> Vec<&str> {
        self.body
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Function(def) => def.name.as_deref(),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Script ({} statements)", self.statement_count())?;
        for name in self.declared_functions() {
            writeln!(f, "  function {name}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub(crate) struct FunctionDef {
    pub(crate) name: Option<String>,
    pub(crate) params: Vec<String>,
    pub(crate) body: FunctionBody,
}

#[derive(Debug, Clone)]
pub(crate) enum FunctionBody {
    Block(Vec<Stmt>),
    /// Concise arrow body: `x => x * 2`
    Expr(Box<Expr>),
}

#[derive(Debug, Clone)]
pub(crate) enum Stmt {
    Var {
        kind: DeclKind,
        decls: Vec<(String, Option<Expr>)>,
    },
    Function(Rc<FunctionDef>),
    Expr(Expr),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        kind: Option<DeclKind>,
        name: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    ForIn {
        kind: Option<DeclKind>,
        name: String,
        object: Expr,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Break,
    Continue,
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        param: Option<String>,
        handler: Option<Vec<Stmt>>,
        finalizer: Option<Vec<Stmt>>,
    },
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Plus,
    Not,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone)]
pub(crate) enum PropKey {
    Static(String),
    Computed(Expr),
}

#[derive(Debug, Clone)]
pub(crate) enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Template(Vec<TemplatePart>),
    Ident(String),
    Array(Vec<Expr>),
    Object(Vec<(PropKey, Expr)>),
    Function(Rc<FunctionDef>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Update {
        increment: bool,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub(crate) fn is_assignable(&self) -> bool {
        matches!(self, Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. })
    }
}
