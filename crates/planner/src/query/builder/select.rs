use crate::query::{
    ast::{
        common::{OrderDir, TableRef},
        expr::Expr,
        select::{OrderByExpr, Select},
    },
    ident,
};

#[derive(Debug, Clone)]
pub struct SelectBuilder {
    ast: Select,
    conditions: Vec<Expr>,
}

impl SelectBuilder {
    pub fn new(from: TableRef) -> Self {
        Self {
            ast: Select {
                from,
                ..Default::default()
            },
            conditions: Vec::new(),
        }
    }

    pub fn column(mut self, expr: Expr) -> Self {
        self.ast.columns.push(expr);
        self
    }

    /// Adds a condition; all conditions are ANDed together.
    pub fn and_where(mut self, condition: Expr) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by_asc(mut self, column: &str) -> Self {
        self.ast.order_by.push(OrderByExpr {
            expr: ident(column),
            direction: Some(OrderDir::Asc),
        });
        self
    }

    pub fn window(mut self, offset: u64, limit: u64) -> Self {
        self.ast.offset = Some(offset);
        self.ast.limit = Some(limit);
        self
    }

    pub fn build(mut self) -> Select {
        self.ast.where_clause = Expr::conjunction(self.conditions);
        self.ast
    }
}
