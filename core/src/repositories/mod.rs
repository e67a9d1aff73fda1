pub mod session;
pub mod user;

pub use session::{InMemorySessionRepository, SessionRepository, SessionRotation};
pub use user::{InMemoryUserRepository, UserRepository};
