//! Domain records and the DTOs used on the HTTP surface.

pub mod ids;
pub mod property;
pub mod requests;
pub mod responses;
pub mod user;

pub use ids::{FavoriteId, InvalidId, PropertyId, RecommendationId, UserId};
pub use property::Property;
pub use requests::{
    LoginRequest, PropertyPatch, PropertyRequest, RecommendRequest, RegisterRequest,
};
pub use responses::{AuthResponse, ErrorResponse, HealthResponse, MessageResponse};
pub use user::{Favorite, Recommendation, RecommendationDetails, User, UserProfile};
