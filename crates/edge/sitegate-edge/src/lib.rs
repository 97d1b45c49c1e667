//! Authentication and tenant-routing gate for a multi-tenant static site.
//!
//! Each request either carries a valid identity token in the session cookie
//! and is rewritten to its tenant's content on the origin, or is sent through
//! the identity provider's hosted login and brought back to where it started.

pub mod gate;
pub mod origin;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use gate::{Gate, GateAction};
pub use origin::{OriginClient, OriginError};
pub use request::{EdgeRequest, normalize_host};
pub use router::{PathRouter, RoutedPath};
pub use server::{EdgeState, HEALTH_PATH, build_router};
pub use session::SessionCookie;
pub use settings::{GateSettings, SecretProvider, Settings};
