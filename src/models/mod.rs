// Domain models (inventory API payloads and auth state)

mod auth;
mod site;

pub use auth::{AuthToken, Credential, JwtClaims};
pub use site::{PhysicalAddress, SiteDetail, SiteRef, SiteStatus};
