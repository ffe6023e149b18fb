use crate::error::ApiError;
use crate::model::leave_request::parse_date;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::MySqlPool;

/// A value bound into a dynamically built statement.
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Builds `UPDATE table SET a = ?, b = ? WHERE id_column = ?` from a partial
/// JSON object. Keys outside `columns` are rejected, so column names in the
/// statement only ever come from that list.
pub fn build_update_sql(
    table: &str,
    columns: &[&str],
    payload: &Value,
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::BadRequest("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(ApiError::BadRequest("No fields provided for update".into()));
    }

    let mut assignments = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = columns
            .iter()
            .find(|c| **c == key.as_str())
            .ok_or_else(|| ApiError::BadRequest(format!("Field cannot be updated: {key}")))?;
        assignments.push(format!("{column} = ?"));

        values.push(match value {
            Value::String(s) => match parse_date(s) {
                Some(d) if s.len() == 10 => SqlValue::Date(d),
                _ => SqlValue::String(s.clone()),
            },
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::I64(i),
                None => SqlValue::F64(n.as_f64().unwrap_or_default()),
            },
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Null => SqlValue::Null,
            _ => return Err(ApiError::BadRequest(format!("Unsupported value for {key}"))),
        });
    }

    values.push(SqlValue::I64(i64::try_from(id_value).map_err(|_| {
        ApiError::BadRequest("Identifier out of range".into())
    })?));

    Ok(SqlUpdate {
        sql: format!(
            "UPDATE {table} SET {} WHERE {id_column} = ?",
            assignments.join(", ")
        ),
        values,
    })
}

/// Row offset of a 1-based page. Pages whose offset does not fit in a `u64`
/// are rejected.
pub fn page_offset(page: u64, per_page: u64) -> Result<u64, ApiError> {
    page.saturating_sub(1)
        .checked_mul(per_page)
        .ok_or_else(|| ApiError::BadRequest(format!("Page {page} is out of range")))
}

pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
