//! This modules defines the common functionality for paging data.

use serde::Serialize;

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

/// A validated page number and size.
///
/// Held as `i64` since SQLite integers are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub number: i64,
    /// The maximum number of items on the page.
    pub size: i64,
}

impl Page {
    /// The number of rows to skip to get to this page.
    ///
    /// Pages from [PaginationConfig::resolve] never saturate.
    pub fn offset(&self) -> i64 {
        self.number
            .saturating_sub(1)
            .max(0)
            .saturating_mul(self.size)
    }
}

impl PaginationConfig {
    /// Fill in defaults for `page` and `page_size` and check they are in range.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `page` is zero, `page_size` is not in
    /// `1..=max_page_size` or the page starts past the largest SQLite offset.
    pub fn resolve(&self, page: Option<u64>, page_size: Option<u64>) -> Result<Page, Error> {
        let number = page.unwrap_or(self.default_page);
        let size = page_size.unwrap_or(self.default_page_size);

        if number == 0 {
            return Err(Error::Validation("page must be 1 or greater".to_owned()));
        }

        if size == 0 || size > self.max_page_size {
            return Err(Error::Validation(format!(
                "page_size must be between 1 and {}",
                self.max_page_size
            )));
        }

        let too_far = || Error::Validation(format!("page {number} is out of range"));
        let number = i64::try_from(number).map_err(|_| too_far())?;
        let size = i64::try_from(size).map_err(|_| too_far())?;
        (number - 1).checked_mul(size).ok_or_else(too_far)?;

        Ok(Page { number, size })
    }
}

/// One page of results along with the total number of matching items.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    /// The items on this page.
    pub data: Vec<T>,
    /// The number of items across all pages.
    pub total: i64,
    /// The page number.
    pub page: i64,
    /// The page size used for the query.
    pub page_size: i64,
}
