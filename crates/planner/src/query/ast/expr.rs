//! Expression nodes shared by all statements.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference, optionally qualified by a table or alias.
    Identifier(Ident),

    /// A bound parameter. Rendered as a placeholder, never inlined.
    Value(Value),

    /// Caller-supplied SQL fragment, emitted verbatim inside parentheses.
    /// Used for backend-native filter predicates.
    Raw(String),

    BinaryOp(Box<BinaryOp>),

    /// `CAST(expr AS type)`
    Cast { expr: Box<Expr>, data_type: String },

    /// `name(args...)`; an empty `args` with `star` renders `name(*)`.
    Function {
        name: String,
        args: Vec<Expr>,
        star: bool,
    },

    /// `*` in a projection.
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub qualifier: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Gt,
    And,
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    /// ANDs the given conditions together; `None` when the list is empty.
    pub fn conjunction(conditions: Vec<Expr>) -> Option<Expr> {
        conditions
            .into_iter()
            .reduce(|acc, cond| Expr::binary(acc, BinaryOperator::And, cond))
    }

    pub fn count_star() -> Expr {
        Expr::Function {
            name: "COUNT".to_string(),
            args: Vec::new(),
            star: true,
        }
    }
}
