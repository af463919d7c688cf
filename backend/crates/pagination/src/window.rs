//! Page window parsing and clamping.

use serde::{Deserialize, Serialize};

/// Page returned when the caller does not ask for one.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Smallest page size a caller can request.
pub const MIN_PER_PAGE: u32 = 1;
/// Largest page size a caller can request.
pub const MAX_PER_PAGE: u32 = 100;

const PAGE_KEY: &str = "page";
const PER_PAGE_KEYS: [&str; 2] = ["per_page", "perPage"];

/// Requested page window.
///
/// ## Invariants
/// - `page >= 1`
/// - `MIN_PER_PAGE <= per_page <= MAX_PER_PAGE`
///
/// # Examples
/// ```
/// use pagination::Pagination;
///
/// let window = Pagination::new(3, 500);
/// assert_eq!(window.page(), 3);
/// assert_eq!(window.per_page(), 100);
/// assert_eq!(window.offset(), 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(from = "RawWindow")]
pub struct Pagination {
    page: u32,
    per_page: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWindow {
    page: i64,
    per_page: i64,
}

impl From<RawWindow> for Pagination {
    fn from(raw: RawWindow) -> Self {
        Self::new(raw.page, raw.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

fn clamp_page(page: i64) -> u32 {
    u32::try_from(page.max(1)).unwrap_or(u32::MAX)
}

fn clamp_per_page(per_page: i64) -> u32 {
    let bounded = per_page.clamp(i64::from(MIN_PER_PAGE), i64::from(MAX_PER_PAGE));
    u32::try_from(bounded).unwrap_or(DEFAULT_PER_PAGE)
}

fn parse_number(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

impl Pagination {
    /// Build a window from untrusted numbers, clamping both into range.
    #[must_use]
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: clamp_page(page),
            per_page: clamp_per_page(per_page),
        }
    }

    /// Build a window from decoded query pairs.
    ///
    /// `page` is read from the `page` key. The page size is read from
    /// `per_page`, falling back to `perPage` when `per_page` is absent. Values
    /// that do not parse as integers fall back to the defaults before
    /// clamping.
    ///
    /// # Examples
    /// ```
    /// use pagination::Pagination;
    ///
    /// let window = Pagination::from_query([("page", "2"), ("perPage", "5")]);
    /// assert_eq!((window.page(), window.per_page()), (2, 5));
    /// ```
    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page: Option<String> = None;
        let mut per_page: [Option<String>; 2] = [None, None];

        for (key, value) in pairs {
            let key = key.as_ref();
            if key == PAGE_KEY {
                page.get_or_insert_with(|| value.as_ref().to_owned());
                continue;
            }
            for (slot, alias) in per_page.iter_mut().zip(PER_PAGE_KEYS) {
                if key == alias {
                    slot.get_or_insert_with(|| value.as_ref().to_owned());
                }
            }
        }

        let page = page
            .as_deref()
            .and_then(parse_number)
            .unwrap_or(i64::from(DEFAULT_PAGE));
        let per_page = per_page
            .iter()
            .flatten()
            .next()
            .and_then(|raw| parse_number(raw))
            .unwrap_or(i64::from(DEFAULT_PER_PAGE));

        Self::new(page, per_page)
    }

    /// Build a window from a raw URL query string such as `page=2&per_page=5`.
    ///
    /// A leading `?` is ignored.
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_query(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of rows to skip before the first item of this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    /// Return a copy of this window moved to another page.
    #[must_use]
    pub fn with_page(self, page: i64) -> Self {
        Self {
            page: clamp_page(page),
            ..self
        }
    }

    /// Return a copy of this window with another page size.
    #[must_use]
    pub fn with_per_page(self, per_page: i64) -> Self {
        Self {
            per_page: clamp_per_page(per_page),
            ..self
        }
    }
}
