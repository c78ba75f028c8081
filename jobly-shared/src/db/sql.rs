/// SQL fragment compilers
///
/// Repositories build their dynamic statements from two pieces:
///
/// - [`sql_for_partial_update`]: turns a sparse set of `(field, value)` pairs into
///   the `SET` list of an `UPDATE` plus its positional bind values.
/// - [`FilterBuilder`]: collects listing predicates into a `WHERE` clause whose
///   values are always bound as parameters, never interpolated into the SQL text.
///
/// Both produce [`SqlValue`]s, which [`bind_values`] attaches to a sqlx query in order.
///
/// # Example
///
/// ```
/// use jobly_shared::db::sql::{sql_for_partial_update, SqlValue};
///
/// let update = sql_for_partial_update(
///     vec![
///         ("firstName", SqlValue::from("Aliya")),
///         ("age", SqlValue::from(32)),
///     ],
///     &[("firstName", "first_name")],
/// )
/// .unwrap();
///
/// assert_eq!(update.set_cols, r#""first_name"=$1, "age"=$2"#);
/// assert_eq!(update.next_placeholder(), "$3");
/// ```

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{postgres::PgArguments, query::QueryAs, Postgres};
use std::str::FromStr;

/// Error type for statement compilation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlError {
    /// A partial update was requested with zero fields
    #[error("No data")]
    NoData,

    /// A value cannot be stored in the target column
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// A typed bind parameter
///
/// Each variant carries an `Option` so NULLs are sent with a type that matches
/// the target column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Integer(Option<i32>),
    Numeric(Option<Decimal>),
    Boolean(Option<bool>),
}

impl SqlValue {
    /// Returns true for any typed NULL
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Integer(v) => v.is_none(),
            SqlValue::Numeric(v) => v.is_none(),
            SqlValue::Boolean(v) => v.is_none(),
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(Some(value))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(Some(value.to_string()))
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(Some(value))
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Numeric(Some(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Boolean(Some(value))
    }
}

/// Storage type of an updatable column
///
/// Used to coerce untyped JSON patch values into [`SqlValue`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    NullableText,
    Integer,
    NullableInteger,
    NullableNumeric,
    Boolean,
}

impl ColumnKind {
    fn nullable(self) -> bool {
        matches!(
            self,
            ColumnKind::NullableText | ColumnKind::NullableInteger | ColumnKind::NullableNumeric
        )
    }

    /// Converts a JSON value into a bind parameter for this column kind
    ///
    /// # Errors
    ///
    /// Returns `SqlError::InvalidValue` when the JSON type does not fit the column,
    /// or when `null` is given for a non-nullable column.
    pub fn coerce(self, field: &str, value: &Value) -> Result<SqlValue, SqlError> {
        let invalid = |message: &str| SqlError::InvalidValue {
            field: field.to_string(),
            message: message.to_string(),
        };

        if value.is_null() {
            if !self.nullable() {
                return Err(invalid("cannot be null"));
            }
            return Ok(match self {
                ColumnKind::NullableText => SqlValue::Text(None),
                ColumnKind::NullableInteger => SqlValue::Integer(None),
                _ => SqlValue::Numeric(None),
            });
        }

        match self {
            ColumnKind::Text | ColumnKind::NullableText => value
                .as_str()
                .map(SqlValue::from)
                .ok_or_else(|| invalid("expected a string")),
            ColumnKind::Integer | ColumnKind::NullableInteger => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(SqlValue::from)
                .ok_or_else(|| invalid("expected an integer")),
            ColumnKind::NullableNumeric => {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return Err(invalid("expected a decimal number")),
                };
                Decimal::from_str(&text)
                    .map(SqlValue::from)
                    .map_err(|_| invalid("expected a decimal number"))
            }
            ColumnKind::Boolean => value
                .as_bool()
                .map(SqlValue::from)
                .ok_or_else(|| invalid("expected a boolean")),
        }
    }
}

/// Compiled `SET` list of a partial update
#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    /// Comma-separated `"column"=$n` assignments
    pub set_cols: String,

    /// Values for `$1..$n`, in the same order as `set_cols`
    pub values: Vec<SqlValue>,
}

impl PartialUpdate {
    /// Placeholder for the first parameter after the assignments
    ///
    /// Callers use it for the key in the `WHERE` clause.
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.values.len() + 1)
    }
}

/// Compiles a partial update
///
/// Each `(field, value)` becomes `"<column>"=$<n>`, numbered from 1 in input order.
/// `<column>` is the field's entry in `js_to_sql` when present, otherwise the field
/// name verbatim. NULL values are passed through as-is so nullable columns can be
/// cleared.
///
/// # Errors
///
/// Returns `SqlError::NoData` when `data` is empty.
pub fn sql_for_partial_update<'a, I>(
    data: I,
    js_to_sql: &[(&str, &str)],
) -> Result<PartialUpdate, SqlError>
where
    I: IntoIterator<Item = (&'a str, SqlValue)>,
{
    let mut cols = Vec::new();
    let mut values = Vec::new();

    for (idx, (field, value)) in data.into_iter().enumerate() {
        let column = js_to_sql
            .iter()
            .find(|(js, _)| *js == field)
            .map(|(_, sql)| *sql)
            .unwrap_or(field);

        cols.push(format!("\"{}\"=${}", column, idx + 1));
        values.push(value);
    }

    if cols.is_empty() {
        return Err(SqlError::NoData);
    }

    Ok(PartialUpdate {
        set_cols: cols.join(", "),
        values,
    })
}

/// Compiled `WHERE` clause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// `WHERE ...` text, or empty when there are no predicates
    pub sql: String,

    /// Values for `$1..$n`
    pub values: Vec<SqlValue>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Accumulates `AND`-joined predicates with positional parameters
#[derive(Debug, Default)]
pub struct FilterBuilder {
    predicates: Vec<String>,
    values: Vec<SqlValue>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `<column> <op> $n` and binds `value` as `$n`
    pub fn compare(&mut self, column: &str, op: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.values.push(value.into());
        self.predicates
            .push(format!("{} {} ${}", column, op, self.values.len()));
        self
    }

    /// Adds a case-insensitive substring match on `column`
    pub fn contains_ignore_case(&mut self, column: &str, needle: &str) -> &mut Self {
        self.compare(column, "ILIKE", contains_pattern(needle))
    }

    /// Adds a predicate that takes no parameters
    pub fn predicate(&mut self, predicate: &str) -> &mut Self {
        self.predicates.push(predicate.to_string());
        self
    }

    pub fn build(self) -> WhereClause {
        if self.predicates.is_empty() {
            return WhereClause::default();
        }

        WhereClause {
            sql: format!("WHERE {}", self.predicates.join(" AND ")),
            values: self.values,
        }
    }
}

/// Wraps `needle` in `%` after escaping LIKE metacharacters
pub fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Binds `values` to `query` in order
pub fn bind_values<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    values: Vec<SqlValue>,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for value in values {
        query = match value {
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Integer(v) => query.bind(v),
            SqlValue::Numeric(v) => query.bind(v),
            SqlValue::Boolean(v) => query.bind(v),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_update_empty_data() {
        let result = sql_for_partial_update(Vec::new(), &[]);
        assert_eq!(result.unwrap_err(), SqlError::NoData);
    }

    #[test]
    fn test_partial_update_without_translation() {
        let data = vec![
            ("property1", SqlValue::from("value1")),
            ("property2", SqlValue::from("value2")),
            ("property3", SqlValue::from("value3")),
            ("extraProp", SqlValue::from("extraVal")),
        ];

        let update = sql_for_partial_update(data, &[]).unwrap();

        assert_eq!(
            update.set_cols,
            r#""property1"=$1, "property2"=$2, "property3"=$3, "extraProp"=$4"#
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::from("value1"),
                SqlValue::from("value2"),
                SqlValue::from("value3"),
                SqlValue::from("extraVal"),
            ]
        );
    }

    #[test]
    fn test_partial_update_with_translation() {
        let data = vec![
            ("property1", SqlValue::from("value1")),
            ("property2", SqlValue::from("value2")),
            ("property3", SqlValue::from("value3")),
            ("extraProp", SqlValue::from("extraVal")),
        ];
        let js_to_sql = [
            ("property1", "property_1"),
            ("property3", "property_3"),
            ("extraProp", "extra_prop"),
        ];

        let update = sql_for_partial_update(data, &js_to_sql).unwrap();

        assert_eq!(
            update.set_cols,
            r#""property_1"=$1, "property2"=$2, "property_3"=$3, "extra_prop"=$4"#
        );
        assert_eq!(update.values.len(), 4);
        assert_eq!(update.next_placeholder(), "$5");
    }

    #[test]
    fn test_partial_update_passes_nulls_through() {
        let data = vec![
            ("numEmployees", SqlValue::Integer(None)),
            ("name", SqlValue::from("Acme")),
        ];

        let update = sql_for_partial_update(data, &[("numEmployees", "num_employees")]).unwrap();

        assert_eq!(update.set_cols, r#""num_employees"=$1, "name"=$2"#);
        assert!(update.values[0].is_null());
        assert!(!update.values[1].is_null());
    }

    #[test]
    fn test_coerce_values() {
        assert_eq!(
            ColumnKind::Text.coerce("name", &json!("Acme")).unwrap(),
            SqlValue::from("Acme")
        );
        assert_eq!(
            ColumnKind::NullableInteger.coerce("numEmployees", &json!(12)).unwrap(),
            SqlValue::from(12)
        );
        assert_eq!(
            ColumnKind::NullableNumeric.coerce("equity", &json!("0.25")).unwrap(),
            SqlValue::Numeric(Some(Decimal::new(25, 2)))
        );
        assert_eq!(
            ColumnKind::NullableNumeric.coerce("equity", &json!(0.5)).unwrap(),
            SqlValue::Numeric(Some(Decimal::new(5, 1)))
        );
        assert_eq!(
            ColumnKind::Boolean.coerce("isAdmin", &json!(true)).unwrap(),
            SqlValue::from(true)
        );
    }

    #[test]
    fn test_coerce_nulls() {
        assert_eq!(
            ColumnKind::NullableText.coerce("logoUrl", &Value::Null).unwrap(),
            SqlValue::Text(None)
        );
        assert_eq!(
            ColumnKind::NullableNumeric.coerce("equity", &Value::Null).unwrap(),
            SqlValue::Numeric(None)
        );

        let err = ColumnKind::Text.coerce("name", &Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for 'name': cannot be null");
    }

    #[test]
    fn test_coerce_type_mismatch() {
        assert!(ColumnKind::Integer.coerce("salary", &json!("lots")).is_err());
        assert!(ColumnKind::Integer.coerce("salary", &json!(1.5)).is_err());
        assert!(ColumnKind::Integer.coerce("salary", &json!(i64::MAX)).is_err());
        assert!(ColumnKind::Text.coerce("title", &json!(5)).is_err());
        assert!(ColumnKind::Boolean.coerce("isAdmin", &json!("yes")).is_err());
        assert!(ColumnKind::NullableNumeric.coerce("equity", &json!("abc")).is_err());
    }

    #[test]
    fn test_filter_builder_empty() {
        let clause = FilterBuilder::new().build();
        assert!(clause.is_empty());
        assert!(clause.values.is_empty());
    }

    #[test]
    fn test_filter_builder_numbers_parameters() {
        let mut builder = FilterBuilder::new();
        builder
            .contains_ignore_case("name", "net")
            .compare("num_employees", ">=", 10)
            .predicate("equity > 0")
            .compare("num_employees", "<=", 500);

        let clause = builder.build();

        assert_eq!(
            clause.sql,
            "WHERE name ILIKE $1 AND num_employees >= $2 AND equity > 0 AND num_employees <= $3"
        );
        assert_eq!(
            clause.values,
            vec![SqlValue::from("%net%"), SqlValue::from(10), SqlValue::from(500)]
        );
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("c1"), "%c1%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern(r"x\y"), r"%x\\y%");
    }
}
