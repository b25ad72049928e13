//! Role-based authorization.
//!
//! A route's permission is granted iff it appears verbatim in the token's
//! roles. No hierarchy, wildcard or prefix semantics.

use crate::error::GatewayError;
use crate::security::token::Claims;

/// Authorize `claims` for `required`.
///
/// Absent claims, or claims with no roles at all, are reported as
/// `ClaimsMissing` rather than as a denial.
pub fn authorize(claims: Option<&Claims>, required: &str) -> Result<(), GatewayError> {
    let roles = match claims.map(Claims::roles) {
        Some(roles) if !roles.is_empty() => roles,
        _ => return Err(GatewayError::ClaimsMissing),
    };

    if roles.iter().any(|role| role == required) {
        Ok(())
    } else {
        Err(GatewayError::PermissionDenied)
    }
}
