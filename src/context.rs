//! Request Context
//!
//! Tenant and client identity extracted once per request and passed
//! explicitly down to key construction.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const CLIENT_HEADER: &str = "x-client-id";

pub const DEFAULT_TENANT: &str = "default";
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Tenant a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant: String,
}

impl TenantContext {
    /// Trims `raw`; blank or absent values fall back to the default tenant.
    pub fn new(raw: Option<&str>) -> Self {
        Self {
            tenant: non_blank(raw).unwrap_or(DEFAULT_TENANT).to_string(),
        }
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }
}

impl Default for TenantContext {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Caller identity used to partition rate limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn new(raw: Option<&str>) -> Self {
        Self(non_blank(raw).unwrap_or(ANONYMOUS_CLIENT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TenantContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(TenantContext::new(header(parts, TENANT_HEADER)))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIdentity::new(header(parts, CLIENT_HEADER)))
    }
}
