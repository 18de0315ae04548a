//! SQL text for the target table: identifiers, DDL and insert prefixes

use crate::ingestion::schema_inference::BatchSchema;

/// Row-sequence column added in front of the CSV columns.
pub const INDEX_COLUMN: &str = "index";

/// PostgreSQL's limit on bind parameters in one statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Quote an identifier, preserving case and escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn index_name(table: &str) -> String {
    format!("ix_{}_{}", table, INDEX_COLUMN)
}

pub fn create_table_sql(table: &str, schema: &BatchSchema) -> String {
    let mut columns = Vec::with_capacity(schema.len() + 1);
    columns.push(format!("\t{} BIGINT", quote_ident(INDEX_COLUMN)));
    for col in &schema.columns {
        columns.push(format!("\t{} {}", quote_ident(&col.name), col.data_type.sql_type()));
    }
    format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", quote_ident(table), columns.join(",\n"))
}

pub fn create_index_sql(table: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        quote_ident(&index_name(table)),
        quote_ident(table),
        quote_ident(INDEX_COLUMN)
    )
}

/// `INSERT INTO "t" ("index", "a", ...) ` - values are pushed after this.
pub fn insert_prefix(table: &str, schema: &BatchSchema) -> String {
    let columns = std::iter::once(INDEX_COLUMN)
        .chain(schema.column_names())
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({}) ", quote_ident(table), columns)
}

/// How many rows fit in one INSERT without exceeding the bind limit.
pub fn max_rows_per_statement(column_count: usize) -> usize {
    (MAX_BIND_PARAMS / (column_count + 1)).max(1)
}
