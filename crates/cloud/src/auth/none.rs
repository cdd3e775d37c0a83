//! No-op authentication for local and public endpoints.

use crate::auth::CloudAuth;
use crate::error::Result;

/// No authentication, used against local test servers.
pub struct NoAuth;

impl CloudAuth for NoAuth {
    fn sign_request(
        &self,
        _url: &str,
        _method: &str,
        _headers: &mut Vec<(String, String)>,
    ) -> Result<()> {
        Ok(())
    }
}
