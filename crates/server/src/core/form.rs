//! Form field extraction for both urlencoded and multipart bodies.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};

use crate::core::error::{Error, Result};

/// Text fields of a form post. Later duplicates overwrite earlier ones.
#[derive(Debug, Default, Clone)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// Value of `name` when present and non-empty.
    pub fn required(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;
            return Ok(Self(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?;

        let mut fields = HashMap::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            // File parts are not form values.
            if field.file_name().is_some() {
                continue;
            }
            fields.insert(name, field.text().await?);
        }

        Ok(Self(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;

    fn urlencoded(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn multipart(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=B")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_urlencoded_fields() {
        let fields = FormFields::from_request(urlencoded("meet_id=a%20b&user_id=u1&empty="), &())
            .await
            .unwrap();

        assert_eq!(fields.required("meet_id"), Some("a b"));
        assert_eq!(fields.required("user_id"), Some("u1"));
        assert_eq!(fields.required("empty"), None);
        assert_eq!(fields.required("absent"), None);
    }

    #[tokio::test]
    async fn test_multipart_fields() {
        let body = "--B\r\n\
                    Content-Disposition: form-data; name=\"user_id\"\r\n\r\n\
                    alice\r\n\
                    --B\r\n\
                    Content-Disposition: form-data; name=\"meet_id\"\r\n\r\n\
                    m-1\r\n\
                    --B--\r\n";
        let fields = FormFields::from_request(multipart(body), &()).await.unwrap();

        assert_eq!(fields.required("user_id"), Some("alice"));
        assert_eq!(fields.required("meet_id"), Some("m-1"));
    }

    #[tokio::test]
    async fn test_multipart_skips_file_parts() {
        let body = "--B\r\n\
                    Content-Disposition: form-data; name=\"user_id\"; filename=\"id.txt\"\r\n\
                    Content-Type: text/plain\r\n\r\n\
                    alice\r\n\
                    --B--\r\n";
        let fields = FormFields::from_request(multipart(body), &()).await.unwrap();
        assert_eq!(fields.required("user_id"), None);
    }

    #[tokio::test]
    async fn test_unsupported_body_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"user_id\": \"x\"}"))
            .unwrap();

        let err = FormFields::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
