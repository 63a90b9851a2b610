//! QuerySet implementation for lazy, chainable database queries.
//!
//! QuerySets are lazy: building one runs nothing. The first call that needs
//! results (`count()`, the cursor methods, `get()`, ...) executes the query
//! and buffers every row in memory. Later calls reuse that buffer until a
//! filter, ordering or limit change invalidates it.
//!
//! The whole result set is held in memory; there is no row streaming.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{OrmError, Result};
use crate::gateway::SharedGateway;
use crate::instance::ModelInstance;
use crate::query::{FilterExpr, Q};
use crate::schema::ModelSchema;
use crate::value::SqlValue;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Returns the SQL representation.
    pub fn to_sql(&self) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{} ASC", self.column),
            OrderDirection::Desc => format!("{} DESC", self.column),
        }
    }
}

/// A lazy, chainable query over one model's table.
///
/// Builder methods consume the QuerySet and return it, so calls chain.
/// Each of them drops any buffered results.
///
/// # Example
///
/// ```ignore
/// let mut users = User::objects(&gateway)?
///     .filter(Q::gt("name", "B"))
///     .order("name", true)
///     .limit(2, 0)?;
///
/// for user in users.instances()? {
///     println!("{user}");
/// }
/// ```
#[derive(Clone)]
pub struct QuerySet {
    schema: Arc<ModelSchema>,
    gateway: SharedGateway,
    /// Root filter; successive `filter()` calls nest under AND
    filter: Option<FilterExpr>,
    /// Sort keys; the first entry is the primary ordering
    order_by: Vec<OrderBy>,
    /// LIMIT count, 0 = unbounded
    limit: u64,
    /// LIMIT offset
    offset: u64,
    /// Buffered results of the last execution
    results: Option<Vec<ModelInstance>>,
    cursor: usize,
}

impl fmt::Debug for QuerySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("table", &self.schema.table_name())
            .field("filter", &self.filter)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("cached", &self.results.as_ref().map(Vec::len))
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl QuerySet {
    /// Creates a QuerySet over every row of `schema`'s table.
    pub fn new(schema: Arc<ModelSchema>, gateway: SharedGateway) -> Self {
        Self {
            schema,
            gateway,
            filter: None,
            order_by: Vec::new(),
            limit: 0,
            offset: 0,
            results: None,
            cursor: 0,
        }
    }

    /// Returns the schema of the queried model.
    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Returns whether results are currently buffered.
    pub fn is_cached(&self) -> bool {
        self.results.is_some()
    }

    fn invalidate(&mut self) {
        self.results = None;
        self.cursor = 0;
    }

    /// Adds a filter to the QuerySet.
    ///
    /// Multiple filters are combined with AND.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.invalidate();
        let expr = q.into_expr();
        self.filter = Some(match self.filter.take() {
            None => expr,
            Some(root) => FilterExpr::And(Box::new(root), Box::new(expr)),
        });
        self
    }

    /// Adds an exclude filter to the QuerySet.
    ///
    /// Excluded rows are those that match the filter.
    #[must_use]
    pub fn exclude(self, q: Q) -> Self {
        self.filter(q.not())
    }

    /// Appends a sort key. The first key is the primary ordering, later ones
    /// break ties.
    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.invalidate();
        self.order_by.push(if ascending {
            OrderBy::asc(column)
        } else {
            OrderBy::desc(column)
        });
        self
    }

    /// Limits the number of results, skipping `offset` rows first.
    ///
    /// A `count` of 0 removes the limit. Negative values are rejected.
    pub fn limit(mut self, count: i64, offset: i64) -> Result<Self> {
        let count = u64::try_from(count)
            .map_err(|_| OrmError::configuration(format!("query limit cannot be lower than 0, got {count}")))?;
        let offset = u64::try_from(offset)
            .map_err(|_| OrmError::configuration(format!("query offset cannot be lower than 0, got {offset}")))?;

        self.invalidate();
        self.limit = count;
        self.offset = offset;
        Ok(self)
    }

    /// Builds the SQL SELECT query and parameters.
    pub fn compile(&self) -> (String, Vec<SqlValue>) {
        let mut sql = format!("SELECT * FROM {}", self.schema.table_name());
        let mut params = Vec::new();

        if let Some(filter) = &self.filter {
            let (where_clause, filter_params) = filter.build();
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
            params = filter_params;
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let order_parts: Vec<String> = self.order_by.iter().map(OrderBy::to_sql).collect();
            sql.push_str(&order_parts.join(", "));
        }

        // Offset comes before the count in this LIMIT form.
        if self.limit > 0 {
            sql.push_str(&format!(" LIMIT {},{}", self.offset, self.limit));
        }

        (sql, params)
    }

    fn fetch(&mut self) -> Result<()> {
        if self.results.is_some() {
            trace!(table = %self.schema.table_name(), "Reusing buffered query results");
            return Ok(());
        }

        let (sql, params) = self.compile();
        debug!(sql = %sql, params = params.len(), "Executing query");

        let result_set = {
            let mut statement = self.gateway.prepare(&sql)?;
            statement.execute(&params)?
        };
        let instances = result_set.fetch_all_as(&self.schema, &self.gateway)?;

        debug!(table = %self.schema.table_name(), rows = instances.len(), "Query fetched rows");
        self.results = Some(instances);
        self.cursor = 0;
        Ok(())
    }

    fn buffered(&self) -> &[ModelInstance] {
        self.results.as_deref().unwrap_or(&[])
    }

    /// Returns the number of rows the query produces.
    pub fn count(&mut self) -> Result<usize> {
        self.fetch()?;
        Ok(self.buffered().len())
    }

    /// Returns all results in fetch order.
    pub fn instances(&mut self) -> Result<&[ModelInstance]> {
        self.fetch()?;
        Ok(self.buffered())
    }

    /// Returns the first result, if any.
    pub fn first(&mut self) -> Result<Option<&ModelInstance>> {
        self.fetch()?;
        Ok(self.buffered().first())
    }

    /// Returns whether the query produces any row.
    pub fn exists(&mut self) -> Result<bool> {
        Ok(self.count()? > 0)
    }

    /// Returns exactly one matching row.
    ///
    /// Zero rows is `ObjectDoesNotExist`, more than one is
    /// `MultipleObjectsReturned` with the full row count.
    pub fn get(mut self) -> Result<ModelInstance> {
        self.fetch()?;
        let mut results = self.results.take().unwrap_or_default();
        match (results.pop(), results.len()) {
            (Some(instance), 0) => Ok(instance),
            (None, _) => Err(OrmError::ObjectDoesNotExist {
                model: self.schema.table_name().to_string(),
            }),
            (Some(_), rest) => Err(OrmError::MultipleObjectsReturned {
                model: self.schema.table_name().to_string(),
                count: rest + 1,
            }),
        }
    }

    /// Executes the query (if needed) and hands over the results.
    pub fn into_instances(mut self) -> Result<Vec<ModelInstance>> {
        self.fetch()?;
        Ok(self.results.take().unwrap_or_default())
    }

    /// Moves the cursor back to the first result.
    pub fn rewind(&mut self) -> Result<()> {
        self.fetch()?;
        self.cursor = 0;
        Ok(())
    }

    /// Advances the cursor.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        self.fetch()?;
        self.cursor += 1;
        Ok(())
    }

    /// Returns whether the cursor points at a result.
    pub fn valid(&mut self) -> Result<bool> {
        self.fetch()?;
        Ok(self.cursor < self.buffered().len())
    }

    /// Returns the cursor position, or `None` past the end.
    pub fn key(&mut self) -> Result<Option<usize>> {
        Ok(self.valid()?.then_some(self.cursor))
    }

    /// Returns the result under the cursor.
    pub fn current(&mut self) -> Result<&ModelInstance> {
        self.fetch()?;
        let (index, len) = (self.cursor, self.buffered().len());
        self.buffered()
            .get(index)
            .ok_or(OrmError::InvalidCursor { index, len })
    }

    /// Returns the result under the cursor for modification.
    pub fn current_mut(&mut self) -> Result<&mut ModelInstance> {
        self.fetch()?;
        let index = self.cursor;
        let results = self.results.get_or_insert_with(Vec::new);
        let len = results.len();
        results
            .get_mut(index)
            .ok_or(OrmError::InvalidCursor { index, len })
    }
}
