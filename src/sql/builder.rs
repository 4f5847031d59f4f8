//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for one table.
//! Rows come back as a single `to_jsonb` column; writes go through `jsonb_populate_record`
//! so Postgres coerces each JSON value to the column's type.

use crate::backend::{Row, Select, ID};
use crate::sql::BindValue;
use serde_json::Value;

const ALIAS: &str = "t";
/// Upper bound applied to any requested LIMIT.
pub const MAX_LIMIT: u32 = 1000;

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

fn returning() -> String {
    format!("RETURNING to_jsonb({}.*)", ALIAS)
}

/// Column list plus the matching projection out of `jsonb_populate_record` (bound as `$n`).
fn populate(schema: &str, table: &str, row: &Row, param: usize) -> (String, String) {
    let cols = row.keys().map(|k| quoted(k)).collect::<Vec<_>>().join(", ");
    let source = format!(
        "SELECT {} FROM jsonb_populate_record(NULL::{}, ${})",
        cols,
        qualified_table(schema, table),
        param
    );
    (cols, source)
}

/// SELECT with exact-match filters (compared as text), optional ORDER BY, LIMIT, OFFSET.
pub fn select(schema: &str, table: &str, query: &Select) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in &query.filters {
        let n = q.push_param(BindValue::Text(crate::backend::filter_text(val)));
        where_parts.push(format!("{}.{}::text = ${}", ALIAS, quoted(col), n));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let order_clause = query
        .order
        .as_ref()
        .map(|o| {
            format!(
                " ORDER BY {}.{} {}",
                ALIAS,
                quoted(&o.column),
                if o.descending { "DESC" } else { "ASC" }
            )
        })
        .unwrap_or_default();
    let limit_clause = query
        .limit
        .map(|n| format!(" LIMIT {}", n.min(MAX_LIMIT)))
        .unwrap_or_default();
    let offset_clause = query.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT to_jsonb({}.*) FROM {} AS {}{}{}{}{}",
        ALIAS,
        qualified_table(schema, table),
        ALIAS,
        where_clause,
        order_clause,
        limit_clause,
        offset_clause
    );
    q
}

/// INSERT one row. Columns missing from `row` keep their database default.
pub fn insert(schema: &str, table: &str, row: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = format!("{} AS {}", qualified_table(schema, table), ALIAS);
    if row.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES {}", target, returning());
        return q;
    }
    let n = q.push_param(BindValue::Json(Value::Object(row.clone())));
    let (cols, source) = populate(schema, table, row, n);
    q.sql = format!("INSERT INTO {} ({}) {} {}", target, cols, source, returning());
    q
}

/// UPDATE by id: SET only the columns present in `row`. The primary key is never rewritten.
pub fn update(schema: &str, table: &str, id: &str, row: &Row) -> QueryBuf {
    let mut row = row.clone();
    row.remove(ID);
    if row.is_empty() {
        return select(schema, table, &Select::all().eq(ID, id).limit(1));
    }
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Json(Value::Object(row.clone())));
    let (cols, source) = populate(schema, table, &row, n);
    let id_param = q.push_param(BindValue::Text(id.to_string()));
    q.sql = format!(
        "UPDATE {} AS {} SET ({}) = ({}) WHERE {}.{}::text = ${} {}",
        qualified_table(schema, table),
        ALIAS,
        cols,
        source,
        ALIAS,
        quoted(ID),
        id_param,
        returning()
    );
    q
}

/// DELETE by id.
pub fn delete(schema: &str, table: &str, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(BindValue::Text(id.to_string()));
    q.sql = format!(
        "DELETE FROM {} AS {} WHERE {}.{}::text = ${} {}",
        qualified_table(schema, table),
        ALIAS,
        ALIAS,
        quoted(ID),
        n,
        returning()
    );
    q
}
