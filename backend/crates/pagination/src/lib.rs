//! Page-window primitives shared by collection list endpoints.
//!
//! A [`Pagination`] describes which slice of a result set a caller asked for:
//! a one-based page number and a page size clamped into `1..=100`. The row
//! offset is always derived from those two values and never stored.
//!
//! A [`PaginatedResult`] pairs one page of items with the total number of
//! matching rows and serialises to the wire contract consumed by clients:
//!
//! ```json
//! {
//!   "items": [],
//!   "pagination": {
//!     "total": 45, "currentPage": 1, "perPage": 20,
//!     "totalPages": 3, "hasNextPage": true, "hasPreviousPage": false
//!   }
//! }
//! ```

mod result;
mod window;

pub use result::{PaginatedResult, PaginationBlock};
pub use window::{DEFAULT_PAGE, DEFAULT_PER_PAGE, MAX_PER_PAGE, MIN_PER_PAGE, Pagination};
