//! Caller scope extraction.
//!
//! Identity is established by the proxy in front of the registry, which
//! forwards the caller's project and roles as headers.

use axum::{extract::FromRequestParts, http::request::Parts};
use strata_core::VisibilityScope;

use crate::infra::errors::AppError;

pub const PROJECT_ID_HEADER: &str = "x-project-id";
pub const ROLES_HEADER: &str = "x-roles";

const ADMIN_ROLE: &str = "admin";

/// The [`VisibilityScope`] of the caller making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerScope(pub VisibilityScope);

impl CallerScope {
    pub fn scope(&self) -> &VisibilityScope {
        &self.0
    }

    /// Writes need a project or the admin role.
    pub fn require_writer(&self) -> Result<&VisibilityScope, AppError> {
        match &self.0 {
            VisibilityScope::PublicOnly => Err(AppError::forbidden(
                "A project or admin role is required to modify images",
            )),
            scope => Ok(scope),
        }
    }

    fn from_headers(project: Option<&str>, roles: Option<&str>) -> Self {
        let is_admin = roles.is_some_and(|roles| {
            roles
                .split(',')
                .any(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE))
        });
        if is_admin {
            return CallerScope(VisibilityScope::All);
        }

        match project.map(str::trim).filter(|p| !p.is_empty()) {
            Some(project) => {
                CallerScope(VisibilityScope::owned_or_public(project))
            }
            None => CallerScope(VisibilityScope::PublicOnly),
        }
    }
}

impl<S> FromRequestParts<S> for CallerScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(
            header_value(parts, PROJECT_ID_HEADER)?,
            header_value(parts, ROLES_HEADER)?,
        ))
    }
}

fn header_value<'a>(
    parts: &'a Parts,
    name: &str,
) -> Result<Option<&'a str>, AppError> {
    parts
        .headers
        .get(name)
        .map(|value| {
            value.to_str().map_err(|_| {
                AppError::bad_request(format!("Header {name} is not valid UTF-8"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_grants_full_scope() {
        let scope = CallerScope::from_headers(Some("p1"), Some("member, Admin"));
        assert_eq!(scope.0, VisibilityScope::All);
    }

    #[test]
    fn project_without_admin_is_owned_or_public() {
        let scope = CallerScope::from_headers(Some(" p1 "), Some("member"));
        assert_eq!(scope.0, VisibilityScope::owned_or_public("p1"));
    }

    #[test]
    fn anonymous_callers_are_public_only_and_cannot_write() {
        let scope = CallerScope::from_headers(None, None);
        assert_eq!(scope.0, VisibilityScope::PublicOnly);
        assert!(scope.require_writer().is_err());

        let blank = CallerScope::from_headers(Some("  "), Some(""));
        assert_eq!(blank.0, VisibilityScope::PublicOnly);
    }
}
