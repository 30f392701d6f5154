//! Request validation for the store list and score-detail queries.
//!
//! Everything here runs before any data access, so a malformed request never
//! costs a database round trip.

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{CategoryId, Coordinate, SortBy, StoreId, StoreType},
    services::{filter::StoreFilters, scoring::MAX_RADIUS_KM},
};

pub const DEFAULT_RADIUS_KM: f64 = 3.0;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// How the ranked sequence is cut into pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Zero-indexed page of `size` rows
    Offset { page: u32, size: u32 },
    /// `limit` rows following `last_id`, or from the start when `last_id` is `None`
    Cursor {
        last_id: Option<StoreId>,
        limit: u32,
    },
}

impl Default for Paging {
    fn default() -> Self {
        Paging::Offset {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A validated list query
#[derive(Debug, Clone, PartialEq)]
pub struct RankQuery {
    pub origin: Coordinate,
    pub radius_km: f64,
    pub sort_by: SortBy,
    pub filters: StoreFilters,
    pub paging: Paging,
}

impl RankQuery {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            origin,
            radius_km: DEFAULT_RADIUS_KM,
            sort_by: SortBy::default(),
            filters: StoreFilters::default(),
            paging: Paging::default(),
        }
    }
}

/// Raw store list query parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSearchParams {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub sort_by: Option<String>,
    /// Comma separated category ids
    pub category_ids: Option<String>,
    pub store_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub last_id: Option<i64>,
    pub limit: Option<i64>,
}

impl StoreSearchParams {
    pub fn validate(&self) -> AppResult<RankQuery> {
        let origin = Coordinate::new(
            validate_latitude(self.latitude)?,
            validate_longitude(self.longitude)?,
        );
        let radius_km = validate_radius(self.radius_km.unwrap_or(DEFAULT_RADIUS_KM))?;

        let sort_by = match self.sort_by.as_deref().map(str::trim) {
            None | Some("") => SortBy::default(),
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::validation(ErrorCode::InvalidSort, format!("{}", e)))?,
        };

        let filters = StoreFilters {
            category_ids: parse_category_ids(self.category_ids.as_deref())?,
            store_type: match self.store_type.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(raw.parse::<StoreType>().map_err(|e| {
                    AppError::validation(ErrorCode::InvalidStoreType, format!("{}", e))
                })?),
            },
            min_price: self.min_price,
            max_price: self.max_price,
        };
        validate_price_range(filters.min_price, filters.max_price)?;

        Ok(RankQuery {
            origin,
            radius_km,
            sort_by,
            filters,
            paging: self.paging()?,
        })
    }

    fn paging(&self) -> AppResult<Paging> {
        let offset_requested = self.page.is_some() || self.size.is_some();
        let cursor_requested = self.last_id.is_some() || self.limit.is_some();

        if offset_requested && cursor_requested {
            return Err(AppError::validation(
                ErrorCode::InvalidPage,
                "page/size cannot be combined with lastId/limit",
            ));
        }

        if cursor_requested {
            let last_id = match self.last_id {
                Some(id) if id <= 0 => {
                    return Err(AppError::validation(
                        ErrorCode::InvalidPage,
                        format!("lastId must be positive, got {}", id),
                    ))
                }
                other => other,
            };
            let limit = validate_size(self.limit, "limit")?;
            return Ok(Paging::Cursor { last_id, limit });
        }

        let page = match self.page {
            None => 0,
            Some(p) => u32::try_from(p).map_err(|_| {
                AppError::validation(
                    ErrorCode::InvalidPage,
                    format!("page must be zero or greater, got {}", p),
                )
            })?,
        };
        let size = validate_size(self.size, "size")?;
        Ok(Paging::Offset { page, size })
    }
}

/// Raw score-detail query parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDetailParams {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ScoreDetailParams {
    /// The explicit coordinate, or `None` to fall back to the member's address
    pub fn validate(&self) -> AppResult<Option<Coordinate>> {
        match (self.latitude, self.longitude) {
            (None, None) => Ok(None),
            (lat, lon) => Ok(Some(Coordinate::new(
                validate_latitude(lat)?,
                validate_longitude(lon)?,
            ))),
        }
    }
}

pub fn validate_latitude(latitude: Option<f64>) -> AppResult<f64> {
    match latitude {
        None => Err(AppError::validation(
            ErrorCode::InvalidLatitude,
            "latitude is required",
        )),
        Some(lat) if lat.is_finite() && (-90.0..=90.0).contains(&lat) => Ok(lat),
        Some(lat) => Err(AppError::validation(
            ErrorCode::InvalidLatitude,
            format!("latitude must be between -90 and 90, got {}", lat),
        )),
    }
}

pub fn validate_longitude(longitude: Option<f64>) -> AppResult<f64> {
    match longitude {
        None => Err(AppError::validation(
            ErrorCode::InvalidLongitude,
            "longitude is required",
        )),
        Some(lon) if lon.is_finite() && (-180.0..=180.0).contains(&lon) => Ok(lon),
        Some(lon) => Err(AppError::validation(
            ErrorCode::InvalidLongitude,
            format!("longitude must be between -180 and 180, got {}", lon),
        )),
    }
}

/// Radius must lie in (0, 50] km
pub fn validate_radius(radius_km: f64) -> AppResult<f64> {
    if radius_km.is_finite() && radius_km > 0.0 && radius_km <= MAX_RADIUS_KM {
        Ok(radius_km)
    } else {
        Err(AppError::validation(
            ErrorCode::InvalidRadius,
            format!(
                "radiusKm must be greater than 0 and at most {}, got {}",
                MAX_RADIUS_KM, radius_km
            ),
        ))
    }
}

fn validate_size(size: Option<i64>, field: &str) -> AppResult<u32> {
    match size {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(s) if (1..=i64::from(MAX_PAGE_SIZE)).contains(&s) => Ok(s as u32),
        Some(s) => Err(AppError::validation(
            ErrorCode::InvalidSize,
            format!("{} must be between 1 and {}, got {}", field, MAX_PAGE_SIZE, s),
        )),
    }
}

fn validate_price_range(min_price: Option<i64>, max_price: Option<i64>) -> AppResult<()> {
    for price in [min_price, max_price].into_iter().flatten() {
        if price < 0 {
            return Err(AppError::validation(
                ErrorCode::InvalidPriceRange,
                format!("prices must not be negative, got {}", price),
            ));
        }
    }
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            return Err(AppError::validation(
                ErrorCode::InvalidPriceRange,
                format!("minPrice {} is greater than maxPrice {}", min, max),
            ));
        }
    }
    Ok(())
}

fn parse_category_ids(raw: Option<&str>) -> AppResult<Option<Vec<CategoryId>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let mut ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<CategoryId>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(AppError::validation(
                ErrorCode::InvalidCategoryIds,
                format!("'{}' is not a valid category id", part),
            )),
        })
        .collect::<AppResult<Vec<_>>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(Some(ids))
}
