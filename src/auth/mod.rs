pub mod extractors;
pub mod impersonation;

pub use extractors::Authenticated;
pub use impersonation::{
    ImpersonationAffordance, ImpersonationConfig, ImpersonationService, ImpersonationSession,
    can_impersonate,
};
