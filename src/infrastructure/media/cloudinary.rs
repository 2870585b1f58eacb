use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{
    entities::image::{RemoteImageRef, UploadedFile},
    repositories::media_store::{MediaError, MediaStore},
    settings::CloudinaryCredentials,
};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Signed calls against the Cloudinary upload API.
///
/// Requests are signed with SHA-256, so the account must have SHA-256
/// signatures enabled.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: Client,
    credentials: CloudinaryCredentials,
}

impl CloudinaryClient {
    pub fn new(credentials: CloudinaryCredentials) -> Result<Self, MediaError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(credentials.timeout_secs))
            .build()
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        Ok(CloudinaryClient { http, credentials })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.credentials.api_base, self.credentials.cloud_name, action
        )
    }

    fn signature(&self, params: &[(&str, String)]) -> String {
        sign_params(params, &self.credentials.api_secret)
    }

    async fn check_status(response: Response) -> Result<Response, MediaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        Err(MediaError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(&self, target: &RemoteImageRef, file: UploadedFile) -> Result<String, MediaError> {
        let params = vec![
            ("allowed_formats", "jpg,png".to_string()),
            ("folder", target.folder.clone()),
            ("public_id", target.public_id.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = self.signature(&params);

        let file_name = file.upload_name();
        let part = multipart::Part::bytes(file.data)
            .file_name(file_name)
            .mime_str(file.mime.as_str())
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        let form = params
            .into_iter()
            .fold(multipart::Form::new(), |form, (key, value)| form.text(key, value))
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let uploaded: UploadResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        Ok(uploaded.secure_url)
    }

    async fn destroy(&self, target: &RemoteImageRef) -> Result<(), MediaError> {
        let full_id = target.full_id();
        let params = vec![
            ("invalidate", "true".to_string()),
            ("public_id", full_id.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = self.signature(&params);

        let mut body: Vec<(&str, String)> = params;
        body.push(("api_key", self.credentials.api_key.clone()));
        body.push(("signature", signature));

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&body)
            .send()
            .await
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        let destroyed: DestroyResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => Err(MediaError::NotFound(full_id)),
            other => Err(MediaError::InvalidResponse(format!("destroy returned {other}"))),
        }
    }
}

/// Cloudinary request signature: params sorted by key, joined as
/// `k=v&k=v`, the API secret appended, then hex-encoded SHA-256.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::image::ImageMime;
    use zeroize::Zeroizing;

    fn credentials(api_base: String) -> CloudinaryCredentials {
        CloudinaryCredentials {
            cloud_name: "demo".into(),
            api_key: "123456".into(),
            api_secret: Zeroizing::new("abcd".into()),
            api_base,
            timeout_secs: 5,
        }
    }

    fn file() -> UploadedFile {
        UploadedFile {
            data: vec![0x89, b'P', b'N', b'G'],
            mime: ImageMime::Png,
            file_name: None,
        }
    }

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];

        let mut expected = Sha256::new();
        expected.update(
            b"eager=w_400,h_300,c_pad|w_260,h_200,c_crop&public_id=sample_image&timestamp=1315060510abcd",
        );

        assert_eq!(sign_params(&params, "abcd"), hex::encode(expected.finalize()));
    }

    #[test]
    fn signature_is_independent_of_param_order() {
        let a = [("a", "1".to_string()), ("b", "2".to_string())];
        let b = [("b", "2".to_string()), ("a", "1".to_string())];
        assert_eq!(sign_params(&a, "s"), sign_params(&b, "s"));
        assert_eq!(sign_params(&a, "s").len(), 64);
    }

    #[tokio::test]
    async fn upload_returns_secure_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1_1/demo/image/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"secure_url":"https://res.cloudinary.com/demo/image/upload/v1/blog_images/post_1_abcdef.png","public_id":"blog_images/post_1_abcdef"}"#)
            .create_async()
            .await;

        let client = CloudinaryClient::new(credentials(server.url())).unwrap();
        let url = client
            .upload(&RemoteImageRef::new("blog_images", "post_1_abcdef"), file())
            .await
            .unwrap();

        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1/blog_images/post_1_abcdef.png");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_surfaces_remote_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1_1/demo/image/upload")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid Signature"}}"#)
            .create_async()
            .await;

        let client = CloudinaryClient::new(credentials(server.url())).unwrap();
        let result = client
            .upload(&RemoteImageRef::new("blog_images", "post_1_abcdef"), file())
            .await;

        match result {
            Err(MediaError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn destroy_treats_not_found_result_as_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1_1/demo/image/destroy")
            .match_body(mockito::Matcher::UrlEncoded("public_id".into(), "blog_images/post_1_abcdef".into()))
            .with_status(200)
            .with_body(r#"{"result":"not found"}"#)
            .create_async()
            .await;

        let client = CloudinaryClient::new(credentials(server.url())).unwrap();
        let result = client.destroy(&RemoteImageRef::new("blog_images", "post_1_abcdef")).await;

        assert!(matches!(result, Err(MediaError::NotFound(id)) if id == "blog_images/post_1_abcdef"));
    }

    #[tokio::test]
    async fn destroy_ok_result_succeeds() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1_1/demo/image/destroy")
            .with_status(200)
            .with_body(r#"{"result":"ok"}"#)
            .create_async()
            .await;

        let client = CloudinaryClient::new(credentials(server.url())).unwrap();
        assert!(client.destroy(&RemoteImageRef::new("blog_images", "post_1_abcdef")).await.is_ok());
    }
}
