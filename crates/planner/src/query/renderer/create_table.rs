use crate::query::{
    ast::create_table::{CreateTable, TableConstraint},
    renderer::{Render, Renderer},
};

impl Render for CreateTable {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("CREATE ");
        if self.temp {
            r.sql.push_str("TEMP ");
        }
        r.sql.push_str("TABLE ");
        if self.if_not_exists {
            r.sql.push_str("IF NOT EXISTS ");
        }
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");

        let mut first = true;
        if let Some(like) = &self.like {
            r.sql.push_str("LIKE ");
            r.render_table_ref(like);
            r.sql.push_str(" INCLUDING DEFAULTS");
            first = false;
        }

        for col in &self.columns {
            if !first {
                r.sql.push_str(", ");
            }
            first = false;
            r.sql.push_str(&r.dialect.quote_identifier(&col.name));
            r.sql.push(' ');
            r.sql.push_str(&col.data_type);
            if !col.is_nullable {
                r.sql.push_str(" NOT NULL");
            }
            if let Some(default) = &col.default_value {
                r.sql.push_str(" DEFAULT ");
                default.render(r);
            }
        }

        for constraint in &self.constraints {
            if !first {
                r.sql.push_str(", ");
            }
            first = false;
            match constraint {
                TableConstraint::Unique { name, columns } => {
                    r.sql.push_str("CONSTRAINT ");
                    r.sql.push_str(&r.dialect.quote_identifier(name));
                    r.sql.push_str(" UNIQUE (");
                    r.push_quoted_list(columns);
                    r.sql.push(')');
                }
            }
        }

        r.sql.push(')');
        if self.temp && self.drop_on_commit {
            r.sql.push_str(" ON COMMIT DROP");
        }
    }
}
