use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterData, SqlResult};

/// Filter-driven reads over one table.
///
/// Each call compiles a fresh [`Filter`] for the table, so a repository is
/// cheap to build per store call and holds nothing but a pool handle.
pub struct Repository<T> {
    table: String,
    pool: PgPool,
    _row: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table: impl Into<String>, pool: PgPool) -> Self {
        Self {
            table: table.into(),
            pool,
            _row: std::marker::PhantomData,
        }
    }

    fn compile(&self, filter_data: FilterData) -> Result<Filter, DatabaseError> {
        let mut filter = Filter::new(self.table.as_str())?;
        filter.assign(filter_data)?;
        Ok(filter)
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        let sql = self.compile(filter_data)?.to_sql()?;
        let rows = sqlx::query_as_with::<_, T, _>(&sql.query, arguments(&sql))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        let sql = self.compile(filter_data)?.to_sql()?;
        let row = sqlx::query_as_with::<_, T, _>(&sql.query, arguments(&sql))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        let sql = self.compile(filter_data)?.to_count_sql()?;
        let count: i64 = sqlx::query_scalar_with(&sql.query, arguments(&sql))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// `(key, count)` rows grouped by `column`, mapped into `G`
    pub async fn group_count<G>(&self, column: &str, filter_data: FilterData) -> Result<Vec<G>, DatabaseError>
    where
        G: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        // Grouped counts ignore paging
        let filter_data = FilterData {
            order: None,
            limit: None,
            offset: None,
            after: None,
            ..filter_data
        };
        let sql = self.compile(filter_data)?.to_group_count_sql(column)?;
        let rows = sqlx::query_as_with::<_, G, _>(&sql.query, arguments(&sql))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

/// Positional arguments for a compiled filter, in `$n` order
fn arguments(sql: &SqlResult) -> PgArguments {
    let mut args = PgArguments::default();
    for param in &sql.params {
        match param {
            Value::Null => args.add(Option::<String>::None),
            Value::Bool(b) => args.add(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => args.add(i),
                (None, Some(f)) => args.add(f),
                (None, None) => args.add(n.to_string()),
            },
            Value::String(s) => args.add(s.clone()),
            // FilterWhere expands arrays into one placeholder per element
            Value::Array(_) => {}
            Value::Object(_) => args.add(param.clone()),
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_params_are_bindable_scalars() {
        let mut filter = Filter::new("videos").unwrap();
        filter
            .assign(FilterData {
                where_clause: Some(json!({
                    "is_published": true,
                    "age_group": { "$in": ["4-6", "7-9"] },
                    "title": { "$ilike": "%cat%" }
                })),
                ..Default::default()
            })
            .unwrap();
        let sql = filter.to_sql().unwrap();
        let placeholders = (1..=10).filter(|n| sql.query.contains(&format!("${}", n))).count();

        assert_eq!(sql.params.len(), placeholders);
        assert!(sql.params.iter().all(|p| !p.is_array()));
        let _ = arguments(&sql);
    }
}
