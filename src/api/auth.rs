// Bearer-token authentication
use actix_web::{HttpRequest, Error, error::ErrorUnauthorized};
use log::warn;

/// Authenticate a request against the configured static API key
pub fn authenticate_request(req: &HttpRequest, api_key: &str) -> Result<(), Error> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if header != format!("Bearer {}", api_key) {
        warn!("Rejected request to {}: bad or missing bearer token", req.path());
        return Err(ErrorUnauthorized("Unauthorized"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;

    #[test]
    fn test_authenticate_request_accepts_matching_token() {
        let req = actix_test::TestRequest::default()
            .uri("/logs/index")
            .insert_header(("Authorization", "Bearer secret-key"))
            .to_http_request();

        assert!(authenticate_request(&req, "secret-key").is_ok());
    }

    #[test]
    fn test_authenticate_request_rejects_missing_header() {
        let req = actix_test::TestRequest::default().uri("/logs/index").to_http_request();

        assert!(authenticate_request(&req, "secret-key").is_err());
    }

    #[test]
    fn test_authenticate_request_rejects_wrong_token() {
        let req = actix_test::TestRequest::default()
            .uri("/logs/index")
            .insert_header(("Authorization", "Bearer other-key"))
            .to_http_request();

        assert!(authenticate_request(&req, "secret-key").is_err());
    }

    #[test]
    fn test_authenticate_request_rejects_non_bearer_scheme() {
        let req = actix_test::TestRequest::default()
            .uri("/logs/index")
            .insert_header(("Authorization", "Basic secret-key"))
            .to_http_request();

        assert!(authenticate_request(&req, "secret-key").is_err());
    }
}
