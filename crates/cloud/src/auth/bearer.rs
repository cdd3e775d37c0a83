//! OAuth 2.0 bearer tokens.

use crate::auth::CloudAuth;
use crate::error::{CloudError, Result};

/// A static access token sent as `Authorization: Bearer <token>`.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

impl CloudAuth for BearerToken {
    fn sign_request(
        &self,
        _url: &str,
        _method: &str,
        headers: &mut Vec<(String, String)>,
    ) -> Result<()> {
        if self.token.is_empty() {
            return Err(CloudError::Auth("empty access token".into()));
        }
        headers.push(("Authorization".into(), format!("Bearer {}", self.token)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_authorization_header() {
        let mut headers = Vec::new();
        BearerToken::new("abc")
            .sign_request("https://example.com", "GET", &mut headers)
            .unwrap();
        assert_eq!(headers, vec![("Authorization".to_string(), "Bearer abc".to_string())]);
    }

    #[test]
    fn empty_token_is_rejected() {
        let mut headers = Vec::new();
        assert!(BearerToken::new("").sign_request("u", "GET", &mut headers).is_err());
        assert_eq!(format!("{:?}", BearerToken::new("secret")), "BearerToken(***)");
    }
}
