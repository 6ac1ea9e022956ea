use axum::{extract::FromRequestParts, http::request::Parts};

/// Set by the upstream authorizer once the caller is verified.
pub const REQUESTOR_HEADER: &str = "x-requestor-id";

const ANONYMOUS: &str = "anonymous";

/// Opaque caller identity. Only ever logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requestor(pub String);

impl<S> FromRequestParts<S> for Requestor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUESTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(ANONYMOUS);
        Ok(Requestor(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Requestor {
        let (mut parts, _) = request.into_parts();
        Requestor::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn reads_header() {
        let request = Request::builder()
            .header(REQUESTOR_HEADER, "user-42")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, Requestor("user-42".to_string()));
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_anonymous() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await.0, ANONYMOUS);

        let request = Request::builder()
            .header(REQUESTOR_HEADER, "   ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.0, ANONYMOUS);
    }
}
