//! Validated query parameters for the live query paths.
//!
//! Constructing a [`NearbyQuery`] or [`BoundsQuery`] is the only way into
//! the proximity functions, so malformed coordinates, radii and limits are
//! rejected before any index work happens. Nothing is silently coerced
//! except the result limit, which is capped at [`MAX_LIMIT`].

use hotspot_map_hotspot_models::coordinates_in_range;

use crate::geo_math::BoundingBox;

/// Hard upper bound on results returned by a nearby query.
pub const MAX_LIMIT: usize = 1000;

/// Limit used when the caller does not supply one.
pub const DEFAULT_LIMIT: usize = 100;

/// Largest accepted search radius. The planar pre-filter is only accurate
/// at regional scale.
pub const MAX_RADIUS_KM: f64 = 500.0;

/// Errors raised while validating query input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// Latitude/longitude outside WGS84 range or not finite.
    #[error("invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates {
        /// Supplied latitude.
        lat: f64,
        /// Supplied longitude.
        lng: f64,
    },

    /// Radius not in `(0, MAX_RADIUS_KM]`.
    #[error("radiusKm must be greater than 0 and at most {MAX_RADIUS_KM}, got {0}")]
    InvalidRadius(f64),

    /// A limit of zero.
    #[error("limit must be at least 1")]
    InvalidLimit,

    /// Viewport edges out of range or inverted.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// Input that could not be parsed as numbers.
    #[error("malformed {what}: '{input}'")]
    Malformed {
        /// Which parameter was malformed.
        what: &'static str,
        /// The raw input.
        input: String,
    },
}

/// Parses a comma-separated list of exactly `N` numbers.
fn parse_numbers<const N: usize>(input: &str, what: &'static str) -> Result<[f64; N], QueryError> {
    let malformed = || QueryError::Malformed {
        what,
        input: input.to_string(),
    };

    let values = input
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|_| malformed()))
        .collect::<Result<Vec<f64>, _>>()?;

    <[f64; N]>::try_from(values).map_err(|_| malformed())
}

/// A "hotspots near this point" query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    latitude: f64,
    longitude: f64,
    radius_km: f64,
    limit: usize,
}

impl NearbyQuery {
    /// Validates and builds a nearby query. `limit` defaults to
    /// [`DEFAULT_LIMIT`] and is capped at [`MAX_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the coordinates are out of range, the
    /// radius is not in `(0, MAX_RADIUS_KM]`, or `limit` is zero.
    pub fn new(
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        limit: Option<usize>,
    ) -> Result<Self, QueryError> {
        if !coordinates_in_range(latitude, longitude) {
            return Err(QueryError::InvalidCoordinates {
                lat: latitude,
                lng: longitude,
            });
        }
        if !radius_km.is_finite() || radius_km <= 0.0 || radius_km > MAX_RADIUS_KM {
            return Err(QueryError::InvalidRadius(radius_km));
        }
        let limit = match limit {
            Some(0) => return Err(QueryError::InvalidLimit),
            Some(n) => n.min(MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };

        Ok(Self {
            latitude,
            longitude,
            radius_km,
            limit,
        })
    }

    /// Parses a `"lat,lng"` path segment and validates the full query.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Malformed`] if `coords` is not two numbers, or
    /// any validation error from [`Self::new`].
    pub fn parse(coords: &str, radius_km: f64, limit: Option<usize>) -> Result<Self, QueryError> {
        let [lat, lng] = parse_numbers::<2>(coords, "coordinates")?;
        Self::new(lat, lng, radius_km, limit)
    }

    /// Query latitude.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Query longitude.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Search radius in kilometers.
    #[must_use]
    pub const fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Maximum number of results (already capped).
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

/// A "hotspots visible in this viewport" query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsQuery {
    bounds: BoundingBox,
}

impl BoundsQuery {
    /// Validates a viewport. `west > east` denotes a viewport that crosses
    /// the antimeridian.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidBounds`] if an edge is out of range or
    /// `south > north`.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, QueryError> {
        if !coordinates_in_range(south, west) || !coordinates_in_range(north, east) {
            return Err(QueryError::InvalidBounds(format!(
                "{west},{south},{east},{north} is outside WGS84 range"
            )));
        }
        if south > north {
            return Err(QueryError::InvalidBounds(format!(
                "south {south} is greater than north {north}"
            )));
        }
        Ok(Self {
            bounds: BoundingBox::new(west, south, east, north),
        })
    }

    /// Parses `"west,south,east,north"`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Malformed`] if the string is not four numbers,
    /// or any validation error from [`Self::new`].
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let [west, south, east, north] = parse_numbers::<4>(input, "bounds")?;
        Self::new(west, south, east, north)
    }

    /// The viewport as supplied.
    #[must_use]
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Non-wrapping boxes whose union is the viewport.
    #[must_use]
    pub fn boxes(&self) -> Vec<BoundingBox> {
        let b = self.bounds;
        if b.west > b.east {
            vec![
                BoundingBox::new(b.west, b.south, 180.0, b.north),
                BoundingBox::new(-180.0, b.south, b.east, b.north),
            ]
        } else {
            vec![b]
        }
    }
}
