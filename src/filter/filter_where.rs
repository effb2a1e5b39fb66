use serde_json::Value;

use super::error::FilterError;
use super::filter::is_identifier;
use super::types::{FilterOp, FilterWhereInfo};

/// Translates the JSON where dialect into a parameterized SQL predicate.
///
/// Field keys map to columns (`{ "category": "Science" }` is implicit equality),
/// `$`-prefixed keys are logical operators (`$and`, `$or`). Sibling keys
/// in one object are ANDed together.
pub struct FilterWhere {
    param_values: Vec<Value>,
    starting_param_index: usize,
    max_depth: u32,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            starting_param_index,
            max_depth: crate::config::CONFIG.filter.max_nested_depth,
        }
    }

    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build_clause(where_data, 0)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build_clause(&mut self, where_data: &Value, depth: u32) -> Result<String, FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::TooDeep(self.max_depth));
        }

        match where_data {
            Value::Null => Ok("1=1".to_string()),
            Value::Object(obj) => {
                let mut parts = Vec::new();
                for (key, value) in obj {
                    if key.starts_with('$') {
                        parts.push(self.build_logical(key, value, depth)?);
                    } else {
                        parts.extend(self.build_field(key, value)?);
                    }
                }
                Ok(if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") })
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn build_logical(&mut self, op: &str, value: &Value, depth: u32) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // Identity elements: empty AND matches everything, empty OR nothing
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::with_capacity(arr.len());
                for v in arr {
                    sql_parts.push(format!("({})", self.build_clause(v, depth + 1)?));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn build_field(&mut self, field: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        if !is_identifier(field) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", field)));
        }

        match value {
            Value::Object(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => {
                let mut out = Vec::with_capacity(obj.len());
                for (op_key, op_val) in obj {
                    let operator = FilterOp::parse(op_key)
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                    out.push(self.build_condition(&FilterWhereInfo {
                        column: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    })?);
                }
                Ok(out)
            }
            // Implicit equality: { field: value }
            _ => Ok(vec![self.build_condition(&FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            })?]),
        }
    }

    fn build_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", condition.column);
        let data = &condition.data;

        if let Some(sql_op) = condition.operator.binary_sql() {
            return Ok(match (condition.operator, data.is_null()) {
                (FilterOp::Eq, true) => format!("{} IS NULL", quoted_column),
                (FilterOp::Ne, true) => format!("{} IS NOT NULL", quoted_column),
                _ => format!("{} {} {}", quoted_column, sql_op, self.param(data.clone())),
            });
        }

        // Only the set operators are left
        let values = match data {
            Value::Array(values) => values.clone(),
            other => vec![other.clone()],
        };
        let negated = condition.operator == FilterOp::NIn;
        if values.is_empty() {
            return Ok(if negated { "1=1" } else { "1=0" }.to_string());
        }
        let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(format!("{} {} ({})", quoted_column, keyword, params.join(", ")))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.starting_param_index + self.param_values.len())
    }
}
