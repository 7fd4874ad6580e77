pub mod jwt_auth;

// Middleware modules:
// - jwt_auth: Bearer token validation and user_id extraction
// - Request logging: handled by tracing-actix-web
// - CORS: handled by actix_cors::Cors

pub use jwt_auth::{JwtAuthMiddleware, UserId};
