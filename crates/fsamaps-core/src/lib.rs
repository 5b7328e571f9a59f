//! Domain types shared by the FSA Maps crates: businesses and their ratings,
//! dataset metadata, map geometry, and application configuration.

pub mod app_config;
pub mod business;
pub mod config;
pub mod geo;
pub mod metadata;
pub mod query;
pub mod ratings;

pub use app_config::{AppConfig, Environment};
pub use business::Business;
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{BoundingBox, LatLng, MapView, PixelSize};
pub use metadata::{ApiStatus, HealthStatus, Metadata, MetadataHistoryEntry};
pub use query::{SearchQuery, ViewportQuery};
pub use ratings::{
    rating_image, rating_style, KnownRating, RatingFilter, RatingStyle, UnknownRating,
    DEFAULT_RATING_STYLE,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
