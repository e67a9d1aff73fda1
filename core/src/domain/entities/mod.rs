//! Domain entities representing core business objects.

pub mod session;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use session::{
    ClientContext, DeviceInfo, LoginMethod, RevocationReason, Session, SessionMetadata,
    SessionSelector, SessionSummary,
};
pub use token::{
    Claims, EncodedToken, TokenPair, TokenType, ACCESS_TOKEN_EXPIRY_MINUTES,
    REFRESH_TOKEN_EXPIRY_DAYS,
};
pub use user::User;
