use serde_json::Value;

/// Operators accepted inside a field condition, e.g. `{ "age_group": { "$in": [...] } }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    ILike,
    In,
    NIn,
}

impl FilterOp {
    pub fn parse(op_key: &str) -> Option<Self> {
        let op = match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" => FilterOp::Ne,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            _ => return None,
        };
        Some(op)
    }

    /// SQL operator for the ones that compare a column with a single parameter
    pub fn binary_sql(&self) -> Option<&'static str> {
        match self {
            FilterOp::Eq => Some("="),
            FilterOp::Ne => Some("<>"),
            FilterOp::ILike => Some("ILIKE"),
            FilterOp::In | FilterOp::NIn => None,
        }
    }
}

/// Everything a query can ask for. Stores build these from typed queries;
/// the filter validates identifiers and turns them into parameterized SQL.
#[derive(Debug, Clone, Default)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    pub where_clause: Option<Value>,
    pub order: Option<Value>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    /// Keyset cursor: id of the last row already seen in the current ordering
    pub after: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Comparison that selects rows after a keyset anchor in this direction
    pub fn after_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => ">",
            SortDirection::Desc => "<",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// A compiled query and its positional parameters
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
