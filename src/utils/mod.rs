pub mod code_generator;
pub mod geo;
pub mod jwt;
pub mod pagination;
pub mod phone;
pub mod slug;

pub use code_generator::{generate_invite_token, generate_nonce};
pub use geo::{GeoPoint, is_inside, polygon_from_geojson};
pub use jwt::*;
pub use pagination::*;
pub use phone::normalize_israeli_phone;
pub use slug::normalize_slug;
