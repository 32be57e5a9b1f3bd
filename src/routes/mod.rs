/// Router Module Index
///
/// Routes are split by who may reach them. The session gate runs in front of all
/// three groups; the login requirement is layered onto `authenticated` and `admin`
/// in `create_router`, never inside the groups themselves.

/// Routes open to anonymous and logged-in visitors alike.
pub mod public;

/// Routes that need a resolved identity. Mutations additionally pass the
/// ownership policy inside the question service.
pub mod authenticated;

/// Routes that need an identity carrying the admin flag.
pub mod admin;
