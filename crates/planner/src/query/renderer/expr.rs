use crate::query::{
    ast::expr::{BinaryOperator, Expr},
    renderer::{Render, Renderer},
};

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Identifier(ident) => {
                if let Some(qualifier) = &ident.qualifier {
                    r.sql.push_str(&r.dialect.quote_identifier(qualifier));
                    r.sql.push('.');
                }
                r.sql.push_str(&r.dialect.quote_identifier(&ident.name));
            }
            Expr::Value(value) => r.add_param(value.clone()),
            Expr::Raw(fragment) => {
                r.sql.push('(');
                r.sql.push_str(fragment);
                r.sql.push(')');
            }
            Expr::BinaryOp(op) => {
                op.left.render(r);
                r.sql.push_str(match op.op {
                    BinaryOperator::Eq => " = ",
                    BinaryOperator::Gt => " > ",
                    BinaryOperator::And => " AND ",
                });
                op.right.render(r);
            }
            Expr::Cast { expr, data_type } => {
                r.sql.push_str("CAST(");
                expr.render(r);
                r.sql.push_str(" AS ");
                r.sql.push_str(data_type);
                r.sql.push(')');
            }
            Expr::Function { name, args, star } => {
                r.sql.push_str(name);
                r.sql.push('(');
                if *star {
                    r.sql.push('*');
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        r.sql.push_str(", ");
                    }
                    arg.render(r);
                }
                r.sql.push(')');
            }
            Expr::Wildcard => r.sql.push('*'),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::expr::{BinaryOperator, Expr},
        dialect::Postgres,
        ident,
        renderer::render,
        value,
    };
    use model::core::value::Value;

    #[test]
    fn test_render_conjunction_with_raw_predicate() {
        let expr = Expr::conjunction(vec![
            Expr::binary(ident("UpdatedAt"), BinaryOperator::Gt, value(Value::Int(1))),
            Expr::Raw("Status='Active'".to_string()),
        ])
        .unwrap();

        let (sql, params) = render(&expr, &Postgres);
        assert_eq!(sql, r#""UpdatedAt" > $1 AND (Status='Active')"#);
        assert_eq!(params, vec![Value::Int(1)]);
    }

    #[test]
    fn test_empty_conjunction_is_none() {
        assert!(Expr::conjunction(Vec::new()).is_none());
    }
}
