pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod utils;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{optional_claims, AuthMiddleware, AuthenticatedUser};
pub use utils::{extract_claims_from_context, require_owner, require_owner_or_staff, require_staff};
