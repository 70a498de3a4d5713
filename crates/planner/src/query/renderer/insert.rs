use crate::query::{
    ast::insert::{ConflictAction, Insert, OnConflict},
    renderer::{Render, Renderer},
};

impl Render for Insert {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        r.push_quoted_list(&self.columns);
        r.sql.push(')');

        if !self.values.is_empty() {
            render_values(self, r);
        } else if let Some(select) = &self.select {
            r.sql.push(' ');
            select.render(r);
        }

        if let Some(on_conflict) = &self.on_conflict {
            render_on_conflict(on_conflict, r);
        }
    }
}

fn render_values(insert: &Insert, r: &mut Renderer) {
    r.sql.push_str(" VALUES ");
    for (i, row) in insert.values.iter().enumerate() {
        if i > 0 {
            r.sql.push_str(", ");
        }
        r.sql.push('(');
        for (j, val) in row.iter().enumerate() {
            if j > 0 {
                r.sql.push_str(", ");
            }
            val.render(r);
        }
        r.sql.push(')');
    }
}

fn render_on_conflict(on_conflict: &OnConflict, r: &mut Renderer) {
    if on_conflict.columns.is_empty() {
        return;
    }

    r.sql.push_str(" ON CONFLICT (");
    r.push_quoted_list(&on_conflict.columns);
    r.sql.push(')');

    match &on_conflict.action {
        ConflictAction::DoNothing => r.sql.push_str(" DO NOTHING"),
        ConflictAction::DoUpdate { assignments } => {
            if assignments.is_empty() {
                r.sql.push_str(" DO NOTHING");
                return;
            }

            r.sql.push_str(" DO UPDATE SET ");
            for (i, assignment) in assignments.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                r.sql
                    .push_str(&r.dialect.quote_identifier(&assignment.column));
                r.sql.push_str(" = ");
                assignment.value.render(r);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{
        ast::{
            common::TableRef,
            insert::{ConflictAction, ConflictAssignment, Insert, OnConflict},
        },
        dialect::Postgres,
        qualified,
        renderer::render,
        value,
    };
    use model::core::value::Value;

    #[test]
    fn test_render_insert_on_conflict_update() {
        let insert = Insert {
            table: TableRef::new("public", "t"),
            columns: vec!["id".into(), "name".into()],
            values: vec![vec![value(Value::Int(1)), value(Value::String("a".into()))]],
            select: None,
            on_conflict: Some(OnConflict {
                columns: vec!["id".into()],
                action: ConflictAction::DoUpdate {
                    assignments: vec![ConflictAssignment {
                        column: "name".into(),
                        value: qualified("excluded", "name"),
                    }],
                },
            }),
        };

        let (sql, params) = render(&insert, &Postgres);
        assert_eq!(
            sql,
            r#"INSERT INTO "public"."t" ("id", "name") VALUES ($1, $2) ON CONFLICT ("id") DO UPDATE SET "name" = "excluded"."name""#
        );
        assert_eq!(params.len(), 2);
    }
}
