//! Query engine — free-text search and field filters over loaded rows.
//!
//! Both passes are stable filters: the output is an order-preserving
//! subsequence of the input and rows are cloned, never modified. Neither pass
//! can fail. A criterion that cannot be evaluated against a row (missing
//! field, null, non-numeric value under a comparison) is a non-match.
//!
//! When a [`Query`] carries both a term and criteria, the term narrows first
//! and the criteria narrow the remainder.

use crate::types::{value_number, value_text, Row};
use serde_json::Value;

/// Query-string names that configure a search instead of naming a column.
pub const TERM_PARAM: &str = "q";
pub const CASE_INSENSITIVE_PARAM: &str = "case_insensitive";
pub const PARTIAL_PARAM: &str = "partial";

const OPERATOR_SEPARATOR: &str = "__";

// ---------------------------------------------------------------------------
// Operators and criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Operator {
    /// Operator named by a parameter suffix (`size__gte` → `Gte`).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "eq" => Some(Operator::Eq),
            "gt" => Some(Operator::Gt),
            "lt" => Some(Operator::Lt),
            "gte" => Some(Operator::Gte),
            "lte" => Some(Operator::Lte),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
        }
    }

    fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Gt => lhs > rhs,
            Operator::Lt => lhs < rhs,
            Operator::Gte => lhs >= rhs,
            Operator::Lte => lhs <= rhs,
            Operator::Eq => lhs == rhs,
        }
    }
}

/// Call-level switches for equality criteria. Comparisons ignore them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Lower-case both sides before comparing.
    pub case_insensitive: bool,
    /// Match when the criterion value is a substring of the row value.
    pub partial: bool,
}

/// One field-level test.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Criterion {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// Build a criterion from a parameter name. `size__gt` is a comparison on
    /// `size`; a name whose last `__` segment is not an operator is an
    /// equality test on the whole name.
    pub fn from_param(name: &str, value: impl Into<Value>) -> Self {
        match name.rsplit_once(OPERATOR_SEPARATOR) {
            Some((field, suffix)) if !field.is_empty() => match Operator::from_suffix(suffix) {
                Some(op) => Self::new(field, op, value),
                None => Self::eq(name, value),
            },
            _ => Self::eq(name, value),
        }
    }

    /// Parameter name this criterion would be spelled with.
    pub fn param_name(&self) -> String {
        match self.op {
            Operator::Eq => self.field.clone(),
            op => format!("{}{OPERATOR_SEPARATOR}{}", self.field, op.suffix()),
        }
    }

    pub fn matches(&self, row: &Row, options: FilterOptions) -> bool {
        match self.op {
            Operator::Eq => self.matches_text(row, options),
            op => {
                let lhs = row.get(&self.field).and_then(value_number);
                let rhs = value_number(&self.value);
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => op.compare(lhs, rhs),
                    _ => false,
                }
            }
        }
    }

    fn matches_text(&self, row: &Row, options: FilterOptions) -> bool {
        let (Some(mut have), Some(mut want)) = (row.text(&self.field), value_text(&self.value))
        else {
            return false;
        };
        if options.case_insensitive {
            have = have.to_lowercase();
            want = want.to_lowercase();
        }
        if options.partial {
            have.contains(&want)
        } else {
            have == want
        }
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Rows where any non-null value contains `term`, ignoring case. An empty
/// term keeps every row.
pub fn search(rows: &[Row], term: &str) -> Vec<Row> {
    if term.is_empty() {
        return rows.to_vec();
    }
    let needle = term.to_lowercase();
    rows.iter()
        .filter(|row| row_contains(row, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lower-case.
pub fn row_contains(row: &Row, needle: &str) -> bool {
    row.values()
        .filter_map(value_text)
        .any(|text| text.to_lowercase().contains(needle))
}

/// Rows satisfying every criterion. No criteria keeps every row.
pub fn filter(rows: &[Row], criteria: &[Criterion], options: FilterOptions) -> Vec<Row> {
    rows.iter()
        .filter(|row| criteria.iter().all(|c| c.matches(row, options)))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A search term plus field criteria, as parsed from request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub term: Option<String>,
    pub criteria: Vec<Criterion>,
    pub options: FilterOptions,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Split request parameters into term, flags and criteria. Every name
    /// other than `q`, `case_insensitive` and `partial` becomes a criterion.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        for (name, value) in params {
            let (name, value) = (name.as_ref(), value.as_ref());
            match name {
                TERM_PARAM => query.term = Some(value.to_string()),
                CASE_INSENSITIVE_PARAM => query.options.case_insensitive = is_truthy(value),
                PARTIAL_PARAM => query.options.partial = is_truthy(value),
                _ => query.criteria.push(Criterion::from_param(name, value)),
            }
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.term.as_deref().map_or(true, str::is_empty) && self.criteria.is_empty()
    }

    /// Search, then filter.
    pub fn apply(&self, rows: &[Row]) -> Vec<Row> {
        let searched;
        let rows = match self.term.as_deref() {
            Some(term) if !term.is_empty() => {
                searched = search(rows, term);
                &searched[..]
            }
            _ => rows,
        };
        filter(rows, &self.criteria, self.options)
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
