use crate::query::{
    ast::copy::CopyFrom,
    renderer::{Render, Renderer},
};

impl Render for CopyFrom {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("COPY ");
        r.render_table_ref(&self.table);

        if !self.columns.is_empty() {
            r.sql.push_str(" (");
            r.push_quoted_list(&self.columns);
            r.sql.push(')');
        }
        r.sql.push_str(" FROM STDIN");

        if self.options.is_empty() {
            return;
        }
        let options: Vec<String> = self
            .options
            .iter()
            .map(|(key, value)| format!("{key} {value}"))
            .collect();
        r.sql.push_str(" WITH (");
        r.sql.push_str(&options.join(", "));
        r.sql.push(')');
    }
}
