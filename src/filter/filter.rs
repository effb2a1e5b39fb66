use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

/// Column every keyset cursor refers to
const CURSOR_KEY: &str = "id";

pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
    after: Option<String>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", table_name)));
        }
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
            after: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        if let Some(after) = data.after { self.after(after)?; }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column != "*" && !is_identifier(column) {
                return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit.unwrap_or(i32::MAX);
        let applied_limit = if limit > max_limit {
            if crate::config::CONFIG.filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    /// Continue after the row whose id is `cursor`, in the current ordering.
    /// The ordering must be non-empty and use a single direction.
    pub fn after(&mut self, cursor: impl Into<String>) -> Result<&mut Self, FilterError> {
        let cursor = cursor.into();
        if cursor.trim().is_empty() {
            return Err(FilterError::InvalidCursor("Cursor cannot be empty".to_string()));
        }
        self.after = Some(cursor);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        if crate::config::CONFIG.filter.debug_logging {
            tracing::debug!(sql = %query, params = where_result.params.len(), "filter sql");
        }

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let (mut where_clause, mut params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, 0)?,
            None => ("1=1".to_string(), vec![]),
        };

        if let Some(ref cursor) = self.after {
            let seek = self.build_seek_clause(params.len() + 1)?;
            where_clause = format!("({}) AND {}", where_clause, seek);
            params.push(Value::String(cursor.clone()));
        }

        Ok(SqlResult { query: where_clause, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.table_name, where_result.query);
        Ok(SqlResult { query, params: where_result.params })
    }

    /// `SELECT <column> AS key, COUNT(*) AS count ... GROUP BY <column> ORDER BY <column> ASC`
    pub fn to_group_count_sql(&self, column: &str) -> Result<SqlResult, FilterError> {
        if !is_identifier(column) {
            return Err(FilterError::InvalidColumn(format!("Invalid group column: {}", column)));
        }
        let where_result = self.to_where_sql()?;
        let query = format!(
            "SELECT \"{col}\" AS key, COUNT(*) AS count FROM \"{table}\" WHERE {filter} GROUP BY \"{col}\" ORDER BY \"{col}\" ASC",
            col = column,
            table = self.table_name,
            filter = where_result.query,
        );
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_seek_clause(&self, param_index: usize) -> Result<String, FilterError> {
        let first = self
            .order_data
            .first()
            .ok_or_else(|| FilterError::InvalidCursor("Cursor pagination requires an order".to_string()))?;
        if self.order_data.iter().any(|o| o.sort != first.sort) {
            return Err(FilterError::InvalidCursor("Cursor pagination requires a single sort direction".to_string()));
        }

        let columns = self
            .order_data
            .iter()
            .map(|o| format!("\"{}\"", o.column))
            .collect::<Vec<_>>()
            .join(", ");
        let comparator = first.sort.after_sql();
        Ok(format!(
            "({cols}) {cmp} (SELECT {cols} FROM \"{table}\" WHERE \"{key}\" = ${idx})",
            cols = columns,
            cmp = comparator,
            table = self.table_name,
            key = CURSOR_KEY,
            idx = param_index,
        ))
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

/// Table and column names: ASCII letter or underscore first, then alphanumerics/underscores
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
