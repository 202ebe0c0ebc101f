//! Entities, request payloads and the pure business rules attached to them.
//!
//! Every entity derives `FromRow` for the Postgres repository, `ToSchema` for the
//! OpenAPI document and `TS` so the dashboard and store apps share the exact shapes.

use serde::Deserialize;
use utoipa::IntoParams;

pub mod brand;
pub mod campaign;
pub mod cart;
pub mod coupon;
pub mod dashboard;
pub mod inventory;
pub mod option;
pub mod payment_method;
pub mod product;
pub mod review;
pub mod ticket;
pub mod upload;
pub mod user;
pub mod validation;
pub mod wallet;

pub use brand::*;
pub use campaign::*;
pub use cart::*;
pub use coupon::*;
pub use dashboard::*;
pub use inventory::*;
pub use option::*;
pub use payment_method::*;
pub use product::*;
pub use review::*;
pub use ticket::*;
pub use upload::*;
pub use user::*;
pub use wallet::*;

/// Declares a status-like enum persisted as upper-case text.
///
/// Generates `as_str`, `FromStr`, `Display` and `TryFrom<String>` (the latter is what
/// `#[sqlx(try_from = "String")]` uses when decoding rows).
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, ts_rs::TS, utoipa::ToSchema)]
        #[ts(export)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(crate::models::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = crate::models::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_enum;

/// Raised when stored or submitted text does not name a known enum variant.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

text_enum!(
    /// Shared ACTIVE/INACTIVE toggle for brands, options, campaigns and payment methods.
    RecordStatus {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
    }
);

/// Page
///
/// A slice of a filtered listing plus the total number of matches before pagination.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// ListQuery
///
/// Query parameters shared by every management table:
/// `?page=&limit=&search=&status=&sort_by=&sort_order=`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 10, max 100).
    pub limit: Option<u32>,
    /// Case-insensitive free-text search.
    pub search: Option<String>,
    /// Status filter; accepted values depend on the resource.
    pub status: Option<String>,
    /// Column to sort by; unknown columns fall back to the resource default.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `desc`).
    pub sort_order: Option<String>,
}

/// ListParams
///
/// A `ListQuery` after normalisation: bounded page numbers and a sort column taken
/// from the resource's whitelist, so it can be spliced into SQL verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub sort_by: &'static str,
    pub descending: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            sort_by: "created_at",
            descending: true,
        }
    }
}

impl ListParams {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Lower-cased search needle, or `None` when blank.
    pub fn needle(&self) -> Option<String> {
        self.search.as_ref().map(|s| s.to_lowercase())
    }

    /// In-memory counterpart of `LIMIT/OFFSET`.
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect();
        Page { items, total }
    }
}

impl ListQuery {
    /// Normalises paging and resolves `sort_by` against `sortable`. The first entry of
    /// `sortable` is the default column.
    pub fn params(&self, sortable: &[&'static str]) -> ListParams {
        let default_column = sortable.first().copied().unwrap_or("created_at");
        let sort_by = self
            .sort_by
            .as_deref()
            .and_then(|wanted| sortable.iter().copied().find(|c| *c == wanted))
            .unwrap_or(default_column);

        ListParams {
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort_by,
            descending: !matches!(
                self.sort_order.as_deref().map(str::to_ascii_lowercase).as_deref(),
                Some("asc")
            ),
        }
    }

    /// Parses the `status` parameter into the resource's enum.
    pub fn status<S>(&self) -> Result<Option<S>, crate::error::AppError>
    where
        S: std::str::FromStr<Err = UnknownVariant>,
    {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e: UnknownVariant| crate::error::AppError::Validation(e.to_string())),
        }
    }
}

/// Orders `items` in place by `cmp`, reversing for descending sorts.
pub(crate) fn sort_by_column<T>(
    items: &mut [T],
    descending: bool,
    cmp: impl Fn(&T, &T) -> std::cmp::Ordering,
) {
    items.sort_by(|a, b| {
        let ord = cmp(a, b);
        if descending { ord.reverse() } else { ord }
    });
}
