//! Authentication for the compute and storage APIs.

mod bearer;
mod none;
pub mod oauth;

pub use bearer::BearerToken;
pub use none::NoAuth;
pub use oauth::{ClientSecrets, InstalledFlow};

use crate::error::Result;

/// Trait for signing HTTP requests to the remote APIs.
///
/// Implementations add authentication headers (e.g. OAuth bearer tokens)
/// to outgoing requests before they are sent.
pub trait CloudAuth: Send + Sync {
    /// Sign a request by adding authentication headers.
    ///
    /// `url` is the full request URL, `headers` collects the headers to
    /// attach.
    fn sign_request(
        &self,
        url: &str,
        method: &str,
        headers: &mut Vec<(String, String)>,
    ) -> Result<()>;
}
