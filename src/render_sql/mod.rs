//! SQL fragment model.
//!
//! The compiler builds these structures and renders them with [`ToSql`].
//! Values never appear in rendered text: every condition carries its bound
//! parameters alongside the `?` placeholders it renders, and
//! [`SelectStatement::parameters`] / [`SetQuery::parameters`] return them in
//! exactly the order the placeholders appear.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query_model::{SqlType, Value};

pub trait ToSql {
    fn to_sql(&self) -> String;
}

/// Format a qualified column reference: table_alias.column_name
pub fn qualified_column(table_alias: &str, column_name: &str) -> String {
    format!("{}.{}", table_alias, column_name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundParameter {
    pub value: Value,
    pub sql_type: SqlType,
}

/// A boolean SQL condition with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub sql: String,
    pub parameters: Vec<BoundParameter>,
}

impl Condition {
    /// Condition without placeholders.
    pub fn raw(sql: impl Into<String>) -> Self {
        Condition {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    /// `<lhs> <operator> ?` bound to `parameter`.
    pub fn binary(lhs: &str, operator: &str, parameter: BoundParameter) -> Self {
        Condition {
            sql: format!("{} {} ?", lhs, operator),
            parameters: vec![parameter],
        }
    }

    pub fn is_null(column: &str) -> Self {
        Condition::raw(format!("{} IS NULL", column))
    }

    /// Conjunction of `parts`, parenthesised when there is more than one.
    pub fn all(parts: Vec<Condition>) -> Self {
        Condition::join(parts, " AND ")
    }

    /// Disjunction of `parts`, parenthesised when there is more than one.
    pub fn any(parts: Vec<Condition>) -> Self {
        Condition::join(parts, " OR ")
    }

    fn join(parts: Vec<Condition>, separator: &str) -> Self {
        if parts.len() == 1 {
            return parts.into_iter().next().unwrap_or_else(|| Condition::raw(""));
        }
        let mut parameters = Vec::new();
        let mut sql = Vec::with_capacity(parts.len());
        for part in parts {
            sql.push(part.sql);
            parameters.extend(part.parameters);
        }
        Condition {
            sql: format!("({})", sql.join(separator)),
            parameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub table_name: String,
    pub table_alias: String,
    pub join_type: JoinType,
    /// Column equalities, ANDed together
    pub joining_on: Vec<String>,
}

impl ToSql for Join {
    fn to_sql(&self) -> String {
        format!(
            "{} {} {} ON {}",
            self.join_type.keyword(),
            self.table_name,
            self.table_alias,
            self.joining_on.join(" AND ")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderByOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: String,
    pub order: OrderByOrder,
}

impl ToSql for OrderByItem {
    fn to_sql(&self) -> String {
        match self.order {
            OrderByOrder::Asc => format!("{} ASC", self.expression),
            OrderByOrder::Desc => format!("{} DESC", self.expression),
        }
    }
}

/// One `SELECT` over the entity table and its attribute joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub distinct: bool,
    pub select: Vec<String>,
    pub from_table: String,
    pub from_alias: String,
    pub joins: Vec<Join>,
    /// ANDed WHERE conditions
    pub filters: Vec<Condition>,
    pub group_by: Vec<String>,
    pub having: Option<Condition>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectStatement {
    pub fn new(from_table: impl Into<String>, from_alias: impl Into<String>) -> Self {
        SelectStatement {
            distinct: false,
            select: Vec::new(),
            from_table: from_table.into(),
            from_alias: from_alias.into(),
            joins: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Parameters in placeholder order: WHERE first, then HAVING.
    pub fn parameters(&self) -> Vec<BoundParameter> {
        let mut parameters: Vec<BoundParameter> = self
            .filters
            .iter()
            .flat_map(|f| f.parameters.iter().cloned())
            .collect();
        if let Some(having) = &self.having {
            parameters.extend(having.parameters.iter().cloned());
        }
        parameters
    }
}

impl ToSql for SelectStatement {
    fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.select.join(", "));
        sql.push_str(&format!(" FROM {} {}", self.from_table, self.from_alias));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }
        if !self.filters.is_empty() {
            let filters: Vec<&str> = self.filters.iter().map(|f| f.sql.as_str()).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(&having.sql);
        }
        if !self.order_by.is_empty() {
            let items: Vec<String> = self.order_by.iter().map(|o| o.to_sql()).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&items.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOperator {
    Intersect,
    Union,
    Except,
}

impl SetOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Union => "UNION",
            SetOperator::Except => "EXCEPT",
        }
    }
}

/// Set of `(entity pk, identity)` rows: one select or a set operation over two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SetQuery {
    Select(Box<SelectStatement>),
    Compound {
        operator: SetOperator,
        left: Box<SetQuery>,
        right: Box<SetQuery>,
    },
}

impl SetQuery {
    pub fn select(statement: SelectStatement) -> Self {
        SetQuery::Select(Box::new(statement))
    }

    pub fn compound(operator: SetOperator, left: SetQuery, right: SetQuery) -> Self {
        SetQuery::Compound {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn parameters(&self) -> Vec<BoundParameter> {
        match self {
            SetQuery::Select(statement) => statement.parameters(),
            SetQuery::Compound { left, right, .. } => {
                let mut parameters = left.parameters();
                parameters.extend(right.parameters());
                parameters
            }
        }
    }
}

impl ToSql for SetQuery {
    fn to_sql(&self) -> String {
        match self {
            SetQuery::Select(statement) => statement.to_sql(),
            SetQuery::Compound {
                operator,
                left,
                right,
            } => format!(
                "({}) {} ({})",
                left.to_sql(),
                operator.keyword(),
                right.to_sql()
            ),
        }
    }
}
