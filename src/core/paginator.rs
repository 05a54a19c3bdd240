//! Keyset pagination over the monotonic `insert_id` ordering column.
//!
//! Paging compares `insert_id` against the row the cursor identifies instead
//! of skipping an offset, so pages stay stable under concurrent inserts and
//! deletes. The transform is pure: no persisted state, no retries.

use crate::core::error::StorageError;
use crate::core::mapping::{IDENTITY_COLUMN, ORDER_COLUMN};
use crate::core::sql;
use serde_json::Value as JsonValue;

/// Which end of the already-held adjacent page the cursor marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorEnd {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paginator {
    page_size: u32,
    cursor: Option<String>,
    cursor_points_to: CursorEnd,
    order: SortOrder,
}

impl Paginator {
    pub fn new(
        page_size: u32,
        cursor: Option<String>,
        cursor_points_to: CursorEnd,
        order: SortOrder,
    ) -> Self {
        Self {
            page_size,
            cursor,
            cursor_points_to,
            order,
        }
    }

    /// Cursorless page from the start of the requested order.
    pub fn first_page(page_size: u32, order: SortOrder) -> Self {
        Self::new(page_size, None, CursorEnd::Last, order)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Seek operator and inner sort direction. Bounding the window on the
    /// `First` side requires sorting opposite to the requested final order;
    /// the outer re-sort restores it.
    fn seek(&self) -> (&'static str, SortOrder) {
        match (self.cursor_points_to, self.order) {
            (CursorEnd::Last, SortOrder::Asc) => (">", SortOrder::Asc),
            (CursorEnd::Last, SortOrder::Desc) => ("<", SortOrder::Desc),
            (CursorEnd::First, SortOrder::Asc) => ("<", SortOrder::Desc),
            (CursorEnd::First, SortOrder::Desc) => (">", SortOrder::Asc),
        }
    }

    /// Bounds, orders, and limits `query`. With a cursor the bounded page is
    /// wrapped as a subquery and re-sorted into the requested final order;
    /// without one only `ORDER BY ... LIMIT` applies. The table name comes
    /// from the mapping registry at call sites, never from free-form input.
    pub fn add_to_query(
        &self,
        table: &str,
        query: &str,
        args: &mut Vec<JsonValue>,
    ) -> Result<String, StorageError> {
        if !sql::is_sql_identifier(table) {
            return Err(StorageError::Validation(format!(
                "'{table}' is not a valid table name"
            )));
        }

        let Some(cursor) = &self.cursor else {
            return Ok(format!(
                "{query} ORDER BY {ORDER_COLUMN} {} LIMIT {}",
                self.order.as_sql(),
                self.page_size
            ));
        };

        let (seek_op, inner_sort) = self.seek();
        let glue = if sql::has_where(query) { "AND" } else { "WHERE" };
        args.push(JsonValue::String(cursor.clone()));
        Ok(format!(
            "SELECT * FROM ({query} {glue} {ORDER_COLUMN} {seek_op} \
             (SELECT {ORDER_COLUMN} FROM {table} WHERE {IDENTITY_COLUMN} = '%s') \
             ORDER BY {ORDER_COLUMN} {} LIMIT {}) ORDER BY {ORDER_COLUMN} {}",
            inner_sort.as_sql(),
            self.page_size,
            self.order.as_sql()
        ))
    }
}
