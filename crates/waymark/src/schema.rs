//! Fluent builders that turn table definitions into DDL strings.
//!
//! Builders only produce SQL text; nothing here touches a database. The
//! output lands in migration files, where the runner executes it later.

/// Collects DDL statements built through the table-level builders.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with an implicit autoincrementing `id` primary key.
    pub fn create_table<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        self.create_table_inner(table, true, build)
    }

    /// Create a table without the implicit `id` column.
    pub fn create_table_without_id<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        self.create_table_inner(table, false, build)
    }

    fn create_table_inner<F>(&mut self, table: &str, with_id: bool, build: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        let mut builder = TableBuilder::new(table);
        if with_id {
            builder.id();
        }
        build(&mut builder);

        self.statements.push(builder.to_sql());
        self.statements.extend(builder.index_statements());
        self
    }

    /// Alter an existing table, adding and removing columns.
    pub fn change_table<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(&mut ChangeBuilder),
    {
        let mut builder = ChangeBuilder::new(table);
        build(&mut builder);
        self.statements.extend(builder.into_sql());
        self
    }

    pub fn drop_table(&mut self, table: &str) -> &mut Self {
        self.statements.push(format!("DROP TABLE {};", table));
        self
    }

    pub fn create_index(&mut self, table: &str, columns: &[&str], unique: bool) -> &mut Self {
        self.statements.push(index_sql(table, columns, unique));
        self
    }

    pub fn drop_index(&mut self, index_name: &str) -> &mut Self {
        self.statements.push(format!("DROP INDEX {};", index_name));
        self
    }

    /// All statements built so far.
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements joined into one SQL string.
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

fn index_sql(table: &str, columns: &[&str], unique: bool) -> String {
    let suffix = if unique { "unique" } else { "idx" };
    let name = format!("{}_{}_{}", table, columns.join("_"), suffix);
    let keyword = if unique { "CREATE UNIQUE INDEX" } else { "CREATE INDEX" };
    format!("{} {} ON {} ({});", keyword, name, table, columns.join(", "))
}

/// Builder for one CREATE TABLE statement.
#[derive(Debug)]
pub struct TableBuilder {
    table: String,
    columns: Vec<String>,
    constraints: Vec<String>,
    indexes: Vec<String>,
}

impl TableBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Autoincrementing integer primary key.
    pub fn id(&mut self) -> &mut Self {
        self.column("id", "INTEGER PRIMARY KEY")
    }

    /// Raw column escape hatch.
    pub fn column(&mut self, name: &str, sql_type: &str) -> &mut Self {
        self.columns.push(format!("{} {}", name, sql_type));
        self
    }

    pub fn string(&mut self, name: &str, length: Option<u32>) -> &mut Self {
        self.column(name, &format!("VARCHAR({})", length.unwrap_or(255)))
    }

    pub fn text(&mut self, name: &str) -> &mut Self {
        self.column(name, "TEXT")
    }

    pub fn integer(&mut self, name: &str) -> &mut Self {
        self.column(name, "INTEGER")
    }

    pub fn float(&mut self, name: &str) -> &mut Self {
        self.column(name, "FLOAT")
    }

    pub fn double(&mut self, name: &str) -> &mut Self {
        self.column(name, "DOUBLE PRECISION")
    }

    pub fn boolean(&mut self, name: &str) -> &mut Self {
        self.column(name, "BOOLEAN")
    }

    pub fn datetime(&mut self, name: &str) -> &mut Self {
        self.column(name, "TIMESTAMP")
    }

    /// `created_at` and `updated_at`, stamped on insert.
    pub fn timestamps(&mut self) -> &mut Self {
        self.column("created_at", "TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP");
        self.column("updated_at", "TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP")
    }

    /// Foreign key column named after the referenced table's singular form,
    /// e.g. `references("users")` adds `user_id`.
    pub fn references(&mut self, table: &str) -> &mut Self {
        let column = format!("{}_id", table.trim_end_matches('s'));
        self.columns.push(format!("{} INTEGER", column));
        self.constraints.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} (id) ON DELETE CASCADE",
            column, table
        ));
        self
    }

    pub fn unique(&mut self, columns: &[&str]) -> &mut Self {
        self.constraints
            .push(format!("UNIQUE ({})", columns.join(", ")));
        self
    }

    /// Named index on this table, emitted after the CREATE TABLE.
    pub fn index(&mut self, columns: &[&str]) -> &mut Self {
        self.indexes.push(index_sql(&self.table, columns, false));
        self
    }

    pub fn unique_index(&mut self, columns: &[&str]) -> &mut Self {
        self.indexes.push(index_sql(&self.table, columns, true));
        self
    }

    /// Build the CREATE TABLE SQL.
    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.clone());
        format!(
            "CREATE TABLE {} (\n    {}\n);",
            self.table,
            parts.join(",\n    ")
        )
    }

    fn index_statements(&self) -> Vec<String> {
        self.indexes.clone()
    }
}

/// Builder for ALTER TABLE statements against an existing table.
#[derive(Debug)]
pub struct ChangeBuilder {
    table: String,
    statements: Vec<String>,
}

impl ChangeBuilder {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            statements: Vec::new(),
        }
    }

    pub fn add_column(&mut self, name: &str, sql_type: &str) -> &mut Self {
        self.statements.push(format!(
            "ALTER TABLE {} ADD COLUMN {} {};",
            self.table, name, sql_type
        ));
        self
    }

    pub fn remove_column(&mut self, name: &str) -> &mut Self {
        self.statements
            .push(format!("ALTER TABLE {} DROP COLUMN {};", self.table, name));
        self
    }

    fn into_sql(self) -> Vec<String> {
        self.statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_gets_implicit_id_and_columns() {
        let mut schema = SchemaBuilder::new();
        schema.create_table("users", |t| {
            t.string("name", None);
            t.string("email", Some(128));
            t.timestamps();
            t.unique(&["email"]);
        });

        let sql = schema.build();
        assert!(sql.contains("CREATE TABLE users"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(sql.contains("name VARCHAR(255)"));
        assert!(sql.contains("email VARCHAR(128)"));
        assert!(sql.contains("created_at TIMESTAMP"));
        assert!(sql.contains("UNIQUE (email)"));
    }

    #[test]
    fn create_table_without_id_skips_the_primary_key() {
        let mut schema = SchemaBuilder::new();
        schema.create_table_without_id("tags", |t| {
            t.string("label", None);
        });
        assert!(!schema.build().contains("id INTEGER PRIMARY KEY"));
    }

    #[test]
    fn references_singularizes_the_column_name() {
        let mut schema = SchemaBuilder::new();
        schema.create_table("posts", |t| {
            t.string("title", None);
            t.references("users");
        });

        let sql = schema.build();
        assert!(sql.contains("user_id INTEGER"));
        assert!(sql.contains("FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE"));
    }

    #[test]
    fn indexes_are_emitted_after_the_table() {
        let mut schema = SchemaBuilder::new();
        schema.create_table("events", |t| {
            t.string("kind", None);
            t.datetime("occurred_at");
            t.index(&["kind"]);
            t.unique_index(&["kind", "occurred_at"]);
        });

        let statements = schema.to_sql();
        assert_eq!(statements.len(), 3);
        assert!(statements[1].contains("CREATE INDEX events_kind_idx ON events (kind)"));
        assert!(statements[2]
            .contains("CREATE UNIQUE INDEX events_kind_occurred_at_unique ON events (kind, occurred_at)"));
    }

    #[test]
    fn change_table_builds_alter_statements() {
        let mut schema = SchemaBuilder::new();
        schema.change_table("users", |t| {
            t.add_column("nickname", "VARCHAR(64)");
            t.remove_column("legacy_flag");
        });

        let statements = schema.to_sql();
        assert_eq!(
            statements[0],
            "ALTER TABLE users ADD COLUMN nickname VARCHAR(64);"
        );
        assert_eq!(statements[1], "ALTER TABLE users DROP COLUMN legacy_flag;");
    }

    #[test]
    fn drop_table_and_index() {
        let mut schema = SchemaBuilder::new();
        schema.drop_table("users").drop_index("users_email_unique");
        assert_eq!(
            schema.to_sql(),
            ["DROP TABLE users;", "DROP INDEX users_email_unique;"]
        );
    }
}
