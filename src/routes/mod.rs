/// Router Module Index
///
/// Routes are split by access level. The authenticated router is wrapped in
/// `auth_middleware` as a whole, so a protected endpoint cannot be exposed by
/// forgetting a per-handler check.

/// Routes open to anonymous clients: reads, login and registration.
pub mod public;

/// Routes that require a valid bearer token.
pub mod authenticated;
