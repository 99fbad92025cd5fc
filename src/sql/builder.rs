//! Builds parameterized SELECT, INSERT, UPDATE, DELETE against the apps table.
//! Identifiers come from the schema only; every value travels as a `?` parameter.

use crate::error::ProviderError;
use crate::schema::{self, COLUMNS, COLUMN_ID, TABLE_NAME};
use serde_json::Value;
use std::collections::HashMap;

/// Column name to value, as supplied to insert and update.
pub type ContentValues = HashMap<String, Value>;

/// Quote identifier for SQLite (safe: only from the schema).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }
}

/// A caller-supplied filter: a SQL boolean expression using anonymous `?`
/// placeholders, and the values bound to them in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub clause: String,
    pub args: Vec<Value>,
}

impl Selection {
    pub fn new(clause: impl Into<String>, args: Vec<Value>) -> Self {
        Selection {
            clause: clause.into(),
            args,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clause.trim().is_empty()
    }

    /// Equality filters ANDed together. Unknown columns are rejected; `None` when no filters.
    pub fn from_filters(filters: &[(String, Value)]) -> Result<Option<Self>, ProviderError> {
        if filters.is_empty() {
            return Ok(None);
        }
        let mut parts = Vec::with_capacity(filters.len());
        let mut args = Vec::with_capacity(filters.len());
        for (col, val) in filters {
            if !schema::is_column(col) {
                return Err(ProviderError::UnknownColumn(col.clone()));
            }
            parts.push(format!("{} = ?", quoted(col)));
            args.push(val.clone());
        }
        Ok(Some(Selection::new(parts.join(" AND "), args)))
    }
}

/// Rejects a caller clause that could end the group it is wrapped in: a `)`
/// below depth zero, unclosed `(` or quotes, and comments. Quoted text
/// (`'..'`, `".."`, `` `..` ``, `[..]`) does not count toward the depth.
fn check_clause(clause: &str) -> Result<(), ProviderError> {
    let invalid = |reason: &str| {
        Err(ProviderError::Validation(format!(
            "selection {}: {}",
            reason, clause
        )))
    };
    let mut depth: usize = 0;
    let mut chars = clause.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                loop {
                    match chars.next() {
                        // A doubled quote is an escaped quote inside the literal.
                        Some(q) if q == close && close != ']' && chars.peek() == Some(&close) => {
                            chars.next();
                        }
                        Some(q) if q == close => break,
                        Some(_) => {}
                        None => return invalid("has an unterminated quote"),
                    }
                }
            }
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return invalid("closes a parenthesis it did not open"),
            },
            '-' if chars.peek() == Some(&'-') => return invalid("contains a comment"),
            '/' if chars.peek() == Some(&'*') => return invalid("contains a comment"),
            ';' => return invalid("contains a statement separator"),
            _ => {}
        }
    }
    if depth != 0 {
        return invalid("has unbalanced parentheses");
    }
    Ok(())
}

/// The predicate actually sent to storage. For an item address the id comes
/// first, as a bound parameter, and the caller filter is parenthesized after it.
pub fn effective_selection(
    id: Option<i64>,
    selection: Option<&Selection>,
) -> Result<Option<Selection>, ProviderError> {
    let caller = selection.filter(|s| !s.is_empty());
    if let Some(s) = caller {
        check_clause(&s.clause)?;
    }
    Ok(match (id, caller) {
        (None, None) => None,
        (None, Some(s)) => Some(s.clone()),
        (Some(id), None) => Some(Selection::new(
            format!("{} = ?", quoted(COLUMN_ID)),
            vec![Value::from(id)],
        )),
        (Some(id), Some(s)) => {
            let mut args = Vec::with_capacity(s.args.len() + 1);
            args.push(Value::from(id));
            args.extend(s.args.iter().cloned());
            Some(Selection::new(
                format!("{} = ? AND ({})", quoted(COLUMN_ID), s.clause),
                args,
            ))
        }
    })
}

fn push_where(q: &mut QueryBuf, selection: Option<&Selection>) {
    if let Some(s) = selection {
        q.sql.push_str(" WHERE ");
        q.sql.push_str(&s.clause);
        q.params.extend(s.args.iter().cloned());
    }
}

/// SELECT `projection` (or every column) with optional predicate and ORDER BY.
/// `order_by` must already be normalized by the validator.
pub fn select(projection: &[&str], selection: Option<&Selection>, order_by: Option<&str>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols = if projection.is_empty() {
        COLUMNS.iter().map(|c| quoted(c)).collect::<Vec<_>>()
    } else {
        projection.iter().map(|c| quoted(c)).collect::<Vec<_>>()
    };
    q.sql = format!("SELECT {} FROM {}", cols.join(", "), quoted(TABLE_NAME));
    push_where(&mut q, selection);
    if let Some(order) = order_by {
        q.sql.push_str(" ORDER BY ");
        q.sql.push_str(order);
    }
    q
}

/// INSERT of the known columns present in `values`, in table order.
/// An empty value set inserts DEFAULT VALUES and lets the NOT NULL constraints reject it.
pub fn insert(values: &ContentValues) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    for c in COLUMNS {
        if let Some(v) = values.get(c) {
            cols.push(quoted(c));
            q.params.push(v.clone());
        }
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quoted(TABLE_NAME))
    } else {
        let placeholders = vec!["?"; cols.len()];
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(TABLE_NAME),
            cols.join(", "),
            placeholders.join(", ")
        )
    };
    q
}

/// UPDATE: SET only the known columns present in `values`; SET params precede WHERE params.
pub fn update(values: &ContentValues, selection: Option<&Selection>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in COLUMNS {
        if let Some(v) = values.get(c) {
            sets.push(format!("{} = ?", quoted(c)));
            q.params.push(v.clone());
        }
    }
    q.sql = format!("UPDATE {} SET {}", quoted(TABLE_NAME), sets.join(", "));
    push_where(&mut q, selection);
    q
}

pub fn delete(selection: Option<&Selection>) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("DELETE FROM {}", quoted(TABLE_NAME));
    push_where(&mut q, selection);
    q
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quoted(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_selection_is_passed_verbatim() {
        let s = Selection::new("name = ? OR name = ?", vec![json!("App0"), json!("App2")]);
        let eff = effective_selection(None, Some(&s)).unwrap().unwrap();
        assert_eq!(eff, s);
    }

    #[test]
    fn empty_selection_means_no_predicate() {
        assert!(effective_selection(None, None).unwrap().is_none());
        let blank = Selection::new("  ", vec![]);
        assert!(effective_selection(None, Some(&blank)).unwrap().is_none());
    }

    #[test]
    fn item_id_is_bound_not_inlined() {
        let eff = effective_selection(Some(7), None).unwrap().unwrap();
        assert_eq!(eff.clause, "\"id\" = ?");
        assert_eq!(eff.args, vec![json!(7)]);
    }

    #[test]
    fn item_id_precedes_caller_args_and_caller_clause_is_grouped() {
        let s = Selection::new("name = ? OR name = ?", vec![json!("App1"), json!("App2")]);
        let eff = effective_selection(Some(3), Some(&s)).unwrap().unwrap();
        assert_eq!(eff.clause, "\"id\" = ? AND (name = ? OR name = ?)");
        assert_eq!(eff.args, vec![json!(3), json!("App1"), json!("App2")]);
    }

    #[test]
    fn clause_that_escapes_its_group_is_rejected() {
        for bad in [
            "0) OR (1=1",
            "name = ? OR (vendor = ?",
            "1=1) --",
            "name = ? /* ( */ ) OR (1=1",
            "[(] ) OR (1=1",
            "name = 'unterminated",
            "1=1; DELETE FROM apps",
        ] {
            let s = Selection::new(bad, vec![]);
            assert!(
                matches!(effective_selection(Some(1), Some(&s)), Err(ProviderError::Validation(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn parentheses_inside_literals_do_not_count() {
        for ok in [
            "name = ')' OR name = '('",
            "description = 'it''s (x'",
            "(name = ? OR name = ?) AND vendor = ?",
        ] {
            let s = Selection::new(ok, vec![]);
            assert!(effective_selection(Some(1), Some(&s)).is_ok(), "{ok}");
        }
    }

    #[test]
    fn select_uses_projection_and_order() {
        let s = Selection::new("vendor = ?", vec![json!("hisense")]);
        let q = select(&["name", "package"], Some(&s), Some("\"name\" ASC"));
        assert_eq!(
            q.sql,
            "SELECT \"name\", \"package\" FROM \"apps\" WHERE vendor = ? ORDER BY \"name\" ASC"
        );
        assert_eq!(q.params, vec![json!("hisense")]);
    }

    #[test]
    fn select_without_projection_lists_every_column() {
        let q = select(&[], None, None);
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"name\", \"package\", \"vendor\", \"description\" FROM \"apps\""
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn insert_orders_columns_by_table() {
        let values: ContentValues = [
            ("vendor".to_string(), json!("hisense")),
            ("name".to_string(), json!("App0")),
        ]
        .into_iter()
        .collect();
        let q = insert(&values);
        assert_eq!(q.sql, "INSERT INTO \"apps\" (\"name\", \"vendor\") VALUES (?, ?)");
        assert_eq!(q.params, vec![json!("App0"), json!("hisense")]);
    }

    #[test]
    fn insert_without_values_uses_defaults() {
        let q = insert(&ContentValues::new());
        assert_eq!(q.sql, "INSERT INTO \"apps\" DEFAULT VALUES");
    }

    #[test]
    fn update_binds_set_before_where() {
        let values: ContentValues = [("name".to_string(), json!("Renamed"))].into_iter().collect();
        let eff = effective_selection(Some(9), None).unwrap();
        let q = update(&values, eff.as_ref());
        assert_eq!(q.sql, "UPDATE \"apps\" SET \"name\" = ? WHERE \"id\" = ?");
        assert_eq!(q.params, vec![json!("Renamed"), json!(9)]);
    }

    #[test]
    fn delete_without_selection_targets_table() {
        assert_eq!(delete(None).sql, "DELETE FROM \"apps\"");
    }

    #[test]
    fn filters_become_parameterized_equalities() {
        let filters = vec![
            ("vendor".to_string(), json!("hisense")),
            ("name".to_string(), json!("App3")),
        ];
        let s = Selection::from_filters(&filters).unwrap().unwrap();
        assert_eq!(s.clause, "\"vendor\" = ? AND \"name\" = ?");
        assert_eq!(s.args, vec![json!("hisense"), json!("App3")]);
        assert!(Selection::from_filters(&[]).unwrap().is_none());
    }

    #[test]
    fn filters_on_unknown_columns_are_rejected() {
        let filters = vec![("name; DROP TABLE apps".to_string(), json!("x"))];
        assert!(matches!(
            Selection::from_filters(&filters),
            Err(ProviderError::UnknownColumn(_))
        ));
    }
}
