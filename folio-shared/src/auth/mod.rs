/// Authentication and authorization
///
/// - [`password`]: Argon2id hashing and registration password rules
/// - [`jwt`]: access/refresh token issuing and validation
/// - [`middleware`]: bearer-token extraction into an [`middleware::AuthContext`]
/// - [`ownership`]: resolving the owning user of any resource
/// - [`authorization`]: collection and instance access checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod ownership;
pub mod password;
