//! `db_schema` parser (§4.1): two paths — introspect a live connection, or
//! summarize raw DDL text. Connection failure fails the whole job; DDL
//! summarization never fails (a summary of zero tables is still a summary).

use crate::error::ParseError;
use crate::types::ParsedDocument;
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::postgres::PgPoolOptions;
use sqlx::Row;

#[derive(Debug, Clone, serde::Serialize)]
struct ColumnInfo {
    name: String,
    data_type: String,
    nullable: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
struct ForeignKeyInfo {
    constraint_name: String,
    table: String,
    column: String,
    references_table: String,
    references_column: String,
}

#[derive(Debug, Clone, serde::Serialize)]
struct TableInfo {
    name: String,
    columns: Vec<ColumnInfo>,
    indexes: Vec<String>,
}

/// Introspects a live database over `connection_string`, emitting one
/// overview document, one document per table, and one per foreign-key
/// relationship.
pub async fn parse_live(connection_string: &str) -> Result<Vec<ParsedDocument>, ParseError> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(connection_string)
        .await?;

    let table_rows = sqlx::query(
        "select table_name from information_schema.tables \
         where table_schema = 'public' and table_type = 'BASE TABLE' order by table_name",
    )
    .fetch_all(&pool)
    .await?;
    let table_names: Vec<String> = table_rows.iter().map(|r| r.get::<String, _>("table_name")).collect();

    let mut tables = Vec::with_capacity(table_names.len());
    for name in &table_names {
        let column_rows = sqlx::query(
            "select column_name, data_type, is_nullable from information_schema.columns \
             where table_schema = 'public' and table_name = $1 order by ordinal_position",
        )
        .bind(name)
        .fetch_all(&pool)
        .await?;
        let columns = column_rows
            .iter()
            .map(|r| ColumnInfo {
                name: r.get("column_name"),
                data_type: r.get("data_type"),
                nullable: r.get::<String, _>("is_nullable") == "YES",
            })
            .collect();

        let index_rows = sqlx::query("select indexname from pg_indexes where schemaname = 'public' and tablename = $1")
            .bind(name)
            .fetch_all(&pool)
            .await?;
        let indexes = index_rows.iter().map(|r| r.get::<String, _>("indexname")).collect();

        tables.push(TableInfo { name: name.clone(), columns, indexes });
    }

    let fk_rows = sqlx::query(
        "select tc.constraint_name, tc.table_name, kcu.column_name, \
                ccu.table_name as ref_table, ccu.column_name as ref_column \
         from information_schema.table_constraints tc \
         join information_schema.key_column_usage kcu on tc.constraint_name = kcu.constraint_name \
         join information_schema.constraint_column_usage ccu on tc.constraint_name = ccu.constraint_name \
         where tc.constraint_type = 'FOREIGN KEY' and tc.table_schema = 'public'",
    )
    .fetch_all(&pool)
    .await?;
    let foreign_keys: Vec<ForeignKeyInfo> = fk_rows
        .iter()
        .map(|r| ForeignKeyInfo {
            constraint_name: r.get("constraint_name"),
            table: r.get("table_name"),
            column: r.get("column_name"),
            references_table: r.get("ref_table"),
            references_column: r.get("ref_column"),
        })
        .collect();

    let mut documents = Vec::with_capacity(1 + tables.len() + foreign_keys.len());

    let overview = format!(
        "Database schema overview: {} tables, {} foreign-key relationships.\nTables: {}",
        tables.len(),
        foreign_keys.len(),
        table_names.join(", ")
    );
    documents.push(
        ParsedDocument::new("Database Schema Overview", overview)
            .with_metadata(serde_json::json!({"table_count": tables.len(), "foreign_key_count": foreign_keys.len()})),
    );

    for table in &tables {
        let body = table
            .columns
            .iter()
            .map(|c| format!("- {} {} {}", c.name, c.data_type, if c.nullable { "(nullable)" } else { "(not null)" }))
            .collect::<Vec<_>>()
            .join("\n");
        documents.push(
            ParsedDocument::new(table.name.clone(), body)
                .with_metadata(serde_json::to_value(table).unwrap_or_default()),
        );
    }

    for fk in &foreign_keys {
        let title = format!("{} → {}", fk.table, fk.references_table);
        let body = format!(
            "Foreign key {} links {}.{} to {}.{}",
            fk.constraint_name, fk.table, fk.column, fk.references_table, fk.references_column
        );
        documents.push(ParsedDocument::new(title, body).with_metadata(serde_json::to_value(fk).unwrap_or_default()));
    }

    Ok(documents)
}

static CREATE_TABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)create\s+table\s+(?:if\s+not\s+exists\s+)?[`\"\[]?(\w+)[`\"\]]?\s*\(").unwrap());

/// Summarizes DDL text (a `.sql` dump) into a single document, counting
/// `CREATE TABLE` statements and listing the table names found.
pub fn parse_ddl(ddl: &str) -> ParsedDocument {
    let tables: Vec<String> = CREATE_TABLE_RE.captures_iter(ddl).map(|c| c[1].to_string()).collect();
    let summary = format!(
        "DDL summary: {} CREATE TABLE statement(s) found.\nTables: {}",
        tables.len(),
        tables.join(", ")
    );
    ParsedDocument::new("Database Schema Overview", summary)
        .with_metadata(serde_json::json!({"table_count": tables.len(), "tables": tables}))
}
