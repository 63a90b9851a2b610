//! Q objects for complex query filtering.
//!
//! Q objects allow building complex filter expressions that can be combined
//! with AND, OR, and NOT operators, similar to Django's Q objects. Every
//! expression lowers to a WHERE fragment with `?` placeholders and the
//! parameters to bind to them, in placeholder order.

use std::fmt;

use crate::error::{OrmError, Result};
use crate::value::{SqlValue, ToSqlValue};

/// A filter expression that can be combined with other expressions.
///
/// # Example
///
/// ```
/// use oxide_link::Q;
///
/// let filter = Q::eq("status", "active").and(Q::gt("age", 18).or(Q::eq("verified", true)));
/// assert_eq!(
///     filter.where_clause(),
///     "status = ? AND ((age > ?) OR (verified = ?))"
/// );
/// assert_eq!(filter.parameters().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Q {
    expr: FilterExpr,
}

/// Filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `left op right`
    Comparison {
        op: CompareOp,
        left: Operand,
        right: Operand,
    },
    /// `column BETWEEN low AND high`
    Between {
        column: String,
        low: SqlValue,
        high: SqlValue,
    },
    /// `column IN (values…)`, never empty
    In {
        column: String,
        values: Vec<SqlValue>,
    },
    /// AND combination
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// OR combination
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// NOT negation
    Not(Box<FilterExpr>),
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Rendered verbatim: a column name or SQL expression.
    Raw(String),
    /// Rendered as `?` and bound as a parameter.
    Value(SqlValue),
}

impl Operand {
    /// Builds an operand from a value and its `is_value` flag.
    ///
    /// When the flag is unset the value is written into the SQL text: text
    /// as-is (a column name), anything else as an escaped literal.
    pub fn new(value: impl ToSqlValue, is_value: bool) -> Self {
        let value = value.to_sql_value();
        if is_value {
            Self::Value(value)
        } else {
            match value {
                SqlValue::Text(token) => Self::Raw(token),
                other => Self::Raw(other.to_sql_inline()),
            }
        }
    }

    fn render(&self) -> &str {
        match self {
            Self::Raw(token) => token,
            Self::Value(_) => SqlValue::placeholder(),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Pattern match (LIKE)
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
        }
    }
}

impl Q {
    /// Creates a comparison `column op ?` with `value` bound.
    pub fn compare<V: ToSqlValue>(op: CompareOp, column: &str, value: V) -> Self {
        Self::compare_with(op, column, value, false, true)
    }

    /// Creates a comparison with explicit control over which operands are
    /// bound values (`true`) and which are raw SQL tokens (`false`).
    pub fn compare_with<L: ToSqlValue, R: ToSqlValue>(
        op: CompareOp,
        left: L,
        right: R,
        left_is_value: bool,
        right_is_value: bool,
    ) -> Self {
        Self {
            expr: FilterExpr::Comparison {
                op,
                left: Operand::new(left, left_is_value),
                right: Operand::new(right, right_is_value),
            },
        }
    }

    /// Compares two columns (`left op right`, nothing bound).
    pub fn columns(op: CompareOp, left: &str, right: &str) -> Self {
        Self::compare_with(op, left, right, false, false)
    }

    /// Creates an equality filter (field = value).
    pub fn eq<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(CompareOp::Eq, field, value)
    }

    /// Creates an inequality filter (field != value).
    pub fn ne<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(CompareOp::Ne, field, value)
    }

    /// Creates a greater-than filter (field > value).
    pub fn gt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(CompareOp::Gt, field, value)
    }

    /// Creates a greater-than-or-equal filter (field >= value).
    pub fn gte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(CompareOp::Gte, field, value)
    }

    /// Creates a less-than filter (field < value).
    pub fn lt<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(CompareOp::Lt, field, value)
    }

    /// Creates a less-than-or-equal filter (field <= value).
    pub fn lte<V: ToSqlValue>(field: &str, value: V) -> Self {
        Self::compare(CompareOp::Lte, field, value)
    }

    /// Creates a LIKE filter. Use `%` for wildcard matching.
    pub fn like(field: &str, pattern: &str) -> Self {
        Self::compare(CompareOp::Like, field, pattern)
    }

    /// Creates a BETWEEN filter (low <= field <= high).
    pub fn between<V: ToSqlValue>(field: &str, low: V, high: V) -> Self {
        Self {
            expr: FilterExpr::Between {
                column: field.to_string(),
                low: low.to_sql_value(),
                high: high.to_sql_value(),
            },
        }
    }

    /// Creates an IN list filter.
    ///
    /// An empty list is rejected here rather than producing `IN ()`.
    pub fn in_list<V: ToSqlValue>(field: &str, values: impl IntoIterator<Item = V>) -> Result<Self> {
        let values: Vec<SqlValue> = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        if values.is_empty() {
            return Err(OrmError::configuration(format!(
                "IN filter on \"{field}\" has no values; at least one is required"
            )));
        }
        Ok(Self {
            expr: FilterExpr::In {
                column: field.to_string(),
                values,
            },
        })
    }

    /// Combines this filter with another using AND.
    #[must_use]
    pub fn and(self, other: Q) -> Q {
        Q {
            expr: FilterExpr::And(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Combines this filter with another using OR.
    #[must_use]
    pub fn or(self, other: Q) -> Q {
        Q {
            expr: FilterExpr::Or(Box::new(self.expr), Box::new(other.expr)),
        }
    }

    /// Negates this filter with NOT.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Q {
        Q {
            expr: FilterExpr::Not(Box::new(self.expr)),
        }
    }

    /// Returns the internal filter expression.
    pub fn into_expr(self) -> FilterExpr {
        self.expr
    }

    /// Returns the WHERE fragment.
    pub fn where_clause(&self) -> String {
        self.expr.where_clause()
    }

    /// Returns the bound parameters in placeholder order.
    pub fn parameters(&self) -> Vec<SqlValue> {
        self.expr.parameters()
    }

    /// Builds the SQL WHERE clause and parameters.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        self.expr.build()
    }
}

impl From<Q> for FilterExpr {
    fn from(q: Q) -> Self {
        q.expr
    }
}

impl From<FilterExpr> for Q {
    fn from(expr: FilterExpr) -> Self {
        Self { expr }
    }
}

impl FilterExpr {
    /// Returns the WHERE fragment.
    pub fn where_clause(&self) -> String {
        self.build().0
    }

    /// Returns the bound parameters in placeholder order.
    pub fn parameters(&self) -> Vec<SqlValue> {
        let mut params = Vec::new();
        self.collect_parameters(&mut params);
        params
    }

    /// Builds the SQL WHERE clause and parameters.
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        self.write_sql(&mut sql, &mut params);
        (sql, params)
    }

    fn collect_parameters(&self, params: &mut Vec<SqlValue>) {
        match self {
            Self::Comparison { left, right, .. } => {
                for operand in [left, right] {
                    if let Operand::Value(value) = operand {
                        params.push(value.clone());
                    }
                }
            }
            Self::Between { low, high, .. } => {
                params.push(low.clone());
                params.push(high.clone());
            }
            Self::In { values, .. } => params.extend(values.iter().cloned()),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_parameters(params);
                right.collect_parameters(params);
            }
            Self::Not(inner) => inner.collect_parameters(params),
        }
    }

    // Text and parameters are produced in one left-to-right walk so the
    // placeholders and the parameter list cannot drift apart.
    fn write_sql(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        match self {
            Self::Comparison { op, left, right } => {
                sql.push_str(left.render());
                sql.push(' ');
                sql.push_str(&op.to_string());
                sql.push(' ');
                sql.push_str(right.render());
                for operand in [left, right] {
                    if let Operand::Value(value) = operand {
                        params.push(value.clone());
                    }
                }
            }
            Self::Between { column, low, high } => {
                sql.push_str(column);
                sql.push_str(" BETWEEN ? AND ?");
                params.push(low.clone());
                params.push(high.clone());
            }
            Self::In { column, values } => {
                let placeholders = vec![SqlValue::placeholder(); values.len()];
                sql.push_str(&format!("{column} IN ({})", placeholders.join(", ")));
                params.extend(values.iter().cloned());
            }
            Self::And(left, right) => {
                left.write_and_operand(sql, params);
                sql.push_str(" AND ");
                right.write_and_operand(sql, params);
            }
            Self::Or(left, right) => {
                left.write_wrapped(sql, params);
                sql.push_str(" OR ");
                right.write_wrapped(sql, params);
            }
            Self::Not(inner) => {
                sql.push_str("NOT ");
                inner.write_wrapped(sql, params);
            }
        }
    }

    fn write_wrapped(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        sql.push('(');
        self.write_sql(sql, params);
        sql.push(')');
    }

    // AND binds tighter than OR, so only an OR child needs parentheses.
    fn write_and_operand(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        if matches!(self, Self::Or(..)) {
            self.write_wrapped(sql, params);
        } else {
            self.write_sql(sql, params);
        }
    }
}
