//! HTTP basic auth for the admin dashboard
//!
//! The queue dashboard sits behind a single shared credential pair from
//! configuration. No sessions, no tokens; every request re-authenticates.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use base64::{engine::general_purpose::STANDARD, Engine};
use chibi_core::config::AdminConfig;
use chibi_core::error::AppError;
use futures::future::{ready, Ready};
use tracing::warn;

/// Compare two strings in time independent of where they diverge
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Decode the credential pair out of an `Authorization: Basic` header value
fn decode_basic_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Authenticated admin extractor
///
/// Validates HTTP basic auth against the configured admin credentials.
/// Handlers take this as a parameter to require authentication.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// Authenticated username
    pub username: String,
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let config = match req.app_data::<web::Data<AdminConfig>>() {
            Some(config) => config,
            None => {
                warn!("Admin credentials not configured");
                return ready(Err(AppError::Internal(
                    "Admin credentials not configured".to_string(),
                )));
            }
        };

        let header = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok());

        let credentials = header.and_then(decode_basic_credentials);

        match credentials {
            Some((username, password)) => {
                // Non-short-circuiting so both halves are always checked.
                let valid = constant_time_eq(&username, &config.username)
                    & constant_time_eq(&password, &config.password);
                if valid {
                    ready(Ok(AdminUser { username }))
                } else {
                    warn!("Rejected admin login for {}", username);
                    ready(Err(AppError::Unauthorized(
                        "Invalid credentials".to_string(),
                    )))
                }
            }
            None => ready(Err(AppError::Unauthorized(
                "Basic authentication required".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn config() -> AdminConfig {
        AdminConfig {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn basic_header(username: &str, password: &str) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", username, password))
        )
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hunter2", "hunter2"));
        assert!(!constant_time_eq("hunter2", "hunter3"));
        assert!(!constant_time_eq("hunter2", "hunter22"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_decode_basic_credentials() {
        let header = basic_header("admin", "hunter2");
        assert_eq!(
            decode_basic_credentials(&header),
            Some(("admin".to_string(), "hunter2".to_string()))
        );

        assert_eq!(decode_basic_credentials("Bearer abc"), None);
        assert_eq!(decode_basic_credentials("Basic !!!"), None);
    }

    #[actix_web::test]
    async fn test_valid_credentials_accepted() {
        let req = TestRequest::default()
            .app_data(web::Data::new(config()))
            .insert_header(("Authorization", basic_header("admin", "hunter2")))
            .to_http_request();

        let user = AdminUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(user.username, "admin");
    }

    #[actix_web::test]
    async fn test_wrong_password_rejected() {
        let req = TestRequest::default()
            .app_data(web::Data::new(config()))
            .insert_header(("Authorization", basic_header("admin", "wrong")))
            .to_http_request();

        let err = AdminUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn test_missing_header_rejected() {
        let req = TestRequest::default()
            .app_data(web::Data::new(config()))
            .to_http_request();

        let err = AdminUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
