//! Translation of predicates into parameterized SQL filters.
//!
//! [`SqlQuery`] is a [`Queryable`] that never runs anything in-process: each
//! attached predicate is rendered as a `WHERE` fragment with `?` placeholders
//! and a matching parameter list, ready for a database driver.
//!
//! Leaves are rendered as `(col IS NOT NULL AND col op ?)` so that a missing
//! value is false rather than NULL, which keeps `NOT` consistent with
//! in-process evaluation. Closure leaves cannot be translated and fail with
//! [`SpecError::Untranslatable`].

use tracing::trace;

use crate::clause::{Condition, Operand};
use crate::error::{Result, SpecError};
use crate::expr::{Expr, Predicate};
use crate::op::Op;
use crate::query::Queryable;
use crate::value::Number;

const NEVER: &str = "1 = 0";
const ALWAYS: &str = "1 = 1";

/// A bound parameter for a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Real(f64),
    Bool(bool),
}

/// A rendered piece of SQL and the parameters its placeholders consume.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    fn plain(sql: impl Into<String>) -> Self {
        SqlFragment {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// A `SELECT` over one table, filtered by translated predicates.
///
/// # Example
///
/// ```
/// use standout_spec::{Fields, Number, Param, Specification, SqlParam, SqlQuery, Value};
///
/// struct User {
///     age: u32,
/// }
///
/// impl Fields for User {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "age" => Value::Number(Number::U64(self.age as u64)),
///             _ => Value::None,
///         }
///     }
/// }
///
/// let user = Param::<User>::new("user");
/// let adult = Specification::try_new(user.clone(), user.field("age").gte(18), "IsAdult").unwrap();
///
/// let query = adult.apply(SqlQuery::new("users")).unwrap();
/// assert_eq!(
///     query.to_sql(),
///     r#"SELECT * FROM "users" WHERE ("age" IS NOT NULL AND "age" >= ?)"#
/// );
/// assert_eq!(query.params(), &[SqlParam::Integer(18)]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    table: String,
    filters: Vec<String>,
    params: Vec<SqlParam>,
}

impl SqlQuery {
    pub fn new(table: impl Into<String>) -> Self {
        SqlQuery {
            table: table.into(),
            filters: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    /// The combined `WHERE` condition, if any filter is attached.
    pub fn where_clause(&self) -> Option<String> {
        match self.filters.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(
                many.iter()
                    .map(|f| format!("({})", f))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }

    pub fn to_sql(&self) -> String {
        let select = format!("SELECT * FROM {}", quote_ident(&self.table));
        match self.where_clause() {
            Some(condition) => format!("{} WHERE {}", select, condition),
            None => select,
        }
    }
}

impl<T> Queryable<T> for SqlQuery {
    type Filtered = Result<SqlQuery>;

    fn filter(mut self, predicate: &Predicate<T>) -> Self::Filtered {
        let fragment = translate(predicate.body())?;
        trace!(table = %self.table, sql = %fragment.sql, "attached sql filter");
        self.filters.push(fragment.sql);
        self.params.extend(fragment.params);
        Ok(self)
    }
}

/// Renders an expression tree as a SQL condition.
pub fn translate<T>(expr: &Expr<T>) -> Result<SqlFragment> {
    match expr {
        Expr::Const(true) => Ok(SqlFragment::plain(ALWAYS)),
        Expr::Const(false) => Ok(SqlFragment::plain(NEVER)),
        Expr::Compare { condition, .. } => Ok(translate_condition(condition)),
        Expr::Test { name, .. } => Err(SpecError::Untranslatable(name.to_string())),
        Expr::Not(inner) => {
            let inner = translate(inner)?;
            Ok(SqlFragment {
                sql: format!("NOT ({})", inner.sql),
                params: inner.params,
            })
        }
        Expr::And(l, r) => Ok(binary(translate(l)?, "AND", translate(r)?)),
        Expr::Or(l, r) => Ok(binary(translate(l)?, "OR", translate(r)?)),
        Expr::Xor(l, r) => {
            let (l, r) = (translate(l)?, translate(r)?);
            let mut params = Vec::with_capacity(2 * (l.params.len() + r.params.len()));
            for _ in 0..2 {
                params.extend(l.params.iter().cloned());
                params.extend(r.params.iter().cloned());
            }
            Ok(SqlFragment {
                sql: format!(
                    "(({l}) OR ({r})) AND NOT (({l}) AND ({r}))",
                    l = l.sql,
                    r = r.sql
                ),
                params,
            })
        }
    }
}

fn binary(left: SqlFragment, keyword: &str, right: SqlFragment) -> SqlFragment {
    let mut params = left.params;
    params.extend(right.params);
    SqlFragment {
        sql: format!("({}) {} ({})", left.sql, keyword, right.sql),
        params,
    }
}

fn translate_condition(condition: &Condition) -> SqlFragment {
    let column = quote_ident(&condition.field);
    let guarded = |test: String, params: Vec<SqlParam>| SqlFragment {
        sql: format!("({} IS NOT NULL AND {})", column, test),
        params,
    };

    match (&condition.operand, condition.op) {
        (Operand::Regex(regex), Op::Matches) => guarded(
            format!("{} REGEXP ?", column),
            vec![SqlParam::Text(regex.as_str().to_string())],
        ),
        (Operand::String(s), Op::StartsWith) => {
            like(&column, format!("{}%", escape_like(s)), guarded)
        }
        (Operand::String(s), Op::EndsWith) => {
            like(&column, format!("%{}", escape_like(s)), guarded)
        }
        (Operand::String(s), Op::Contains) => {
            like(&column, format!("%{}%", escape_like(s)), guarded)
        }
        (Operand::EnumSet(set), Op::In) if set.is_empty() => SqlFragment::plain(NEVER),
        (Operand::EnumSet(set), Op::In) => {
            let placeholders = vec!["?"; set.len()].join(", ");
            guarded(
                format!("{} IN ({})", column, placeholders),
                set.iter().map(|d| SqlParam::Unsigned(u64::from(*d))).collect(),
            )
        }
        (Operand::String(_) | Operand::Number(_), op) if op.is_ordering_op() => {
            comparison(&column, op, &condition.operand, guarded)
        }
        (Operand::Bool(_) | Operand::Enum(_), op @ (Op::Eq | Op::Ne)) => {
            comparison(&column, op, &condition.operand, guarded)
        }
        // Every other combination never matches in-process either.
        _ => SqlFragment::plain(NEVER),
    }
}

fn like<F>(column: &str, pattern: String, guarded: F) -> SqlFragment
where
    F: Fn(String, Vec<SqlParam>) -> SqlFragment,
{
    guarded(
        format!("{} LIKE ? ESCAPE '\\'", column),
        vec![SqlParam::Text(pattern)],
    )
}

fn comparison<F>(column: &str, op: Op, operand: &Operand, guarded: F) -> SqlFragment
where
    F: Fn(String, Vec<SqlParam>) -> SqlFragment,
{
    let symbol = match op {
        Op::Eq => "=",
        Op::Ne => "<>",
        Op::Gt => ">",
        Op::Gte => ">=",
        Op::Lt => "<",
        _ => "<=",
    };
    let param = match operand {
        Operand::String(s) => SqlParam::Text(s.clone()),
        Operand::Number(Number::I64(n)) => SqlParam::Integer(*n),
        Operand::Number(Number::U64(n)) => SqlParam::Unsigned(*n),
        Operand::Number(Number::F64(n)) => SqlParam::Real(*n),
        Operand::Bool(b) => SqlParam::Bool(*b),
        Operand::Enum(d) => SqlParam::Unsigned(u64::from(*d)),
        Operand::EnumSet(_) | Operand::Regex(_) => return SqlFragment::plain(NEVER),
    };
    guarded(format!("{} {} ?", column, symbol), vec![param])
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("age"), "\"age\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn conditions_render_with_null_guard() {
        let fragment = translate_condition(&Condition::new("name", Op::StartsWith, "ab"));
        assert_eq!(
            fragment.sql,
            "(\"name\" IS NOT NULL AND \"name\" LIKE ? ESCAPE '\\')"
        );
        assert_eq!(fragment.params, vec![SqlParam::Text("ab%".to_string())]);
    }

    #[test]
    fn impossible_conditions_render_never() {
        assert_eq!(
            translate_condition(&Condition::new("n", Op::StartsWith, 3)).sql,
            NEVER
        );
        assert_eq!(
            translate_condition(&Condition::new("flag", Op::Gt, true)).sql,
            NEVER
        );
        assert_eq!(
            translate_condition(&Condition::new("s", Op::In, Vec::<u32>::new())).sql,
            NEVER
        );
    }

    #[test]
    fn empty_query_has_no_where() {
        let query = SqlQuery::new("users");
        assert_eq!(query.where_clause(), None);
        assert_eq!(query.to_sql(), "SELECT * FROM \"users\"");
        assert!(query.params().is_empty());
    }
}
