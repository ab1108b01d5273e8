//! Offset based pagination over the platform's list endpoints.

use std::marker::PhantomData;

use crate::error::{Error, Result};

/// Default number of items per page to request from the API.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Maximum number of items per page which can be requested from the API.
pub const MAX_PAGE_SIZE: usize = 100;

/// One slice of a query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of items matching the query, as reported with this page.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Iterator over the pages of a query, requesting `offset = 0, page_size, 2 * page_size, ...`
/// until the reported total is reached.
pub struct OffsetPages<T, QueryFn> {
    query: QueryFn,
    page_size: usize,
    next_offset: Option<usize>,
    _item: PhantomData<T>,
}

impl<T, QueryFn> OffsetPages<T, QueryFn>
where
    QueryFn: FnMut(usize, usize) -> Result<Page<T>>,
{
    /// Pages larger than `MAX_PAGE_SIZE` are requested as `MAX_PAGE_SIZE`, the API would truncate
    /// them and the offsets would skip items.
    pub fn new(query: QueryFn, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::BadPageSize);
        }
        Ok(Self {
            query,
            page_size: page_size.min(MAX_PAGE_SIZE),
            next_offset: Some(0),
            _item: PhantomData,
        })
    }
}

impl<T, QueryFn> Iterator for OffsetPages<T, QueryFn>
where
    QueryFn: FnMut(usize, usize) -> Result<Page<T>>,
{
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.next_offset.take()?;
        let response = (self.query)(self.page_size, offset);
        Some(response.map(|page| {
            // The total is re-read on every page, the collection may change underneath us.
            let next_offset = offset + self.page_size;
            if next_offset < page.total {
                self.next_offset = Some(next_offset);
            }
            page.items
        }))
    }
}

/// Request every page of a query and concatenate the items in request order.
pub fn fetch_all<T, QueryFn>(query: QueryFn, page_size: usize) -> Result<Vec<T>>
where
    QueryFn: FnMut(usize, usize) -> Result<Page<T>>,
{
    let mut items = Vec::new();
    for page in OffsetPages::new(query, page_size)? {
        items.extend(page?);
    }
    Ok(items)
}
