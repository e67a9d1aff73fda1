//! Business services containing domain logic and use cases.

pub mod token;

pub use token::{
    RevocationManager, RotationOrchestrator, RotationStage, SessionReaper, SessionService,
    Sha256TokenHasher, TokenCodec, TokenHasher, TokenIssuer, TokenServiceConfig, TokenVerifier,
};
