//! HTTP backend implementation using `reqwest`.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use warden_protocol::{
    Codec, ErrorBody, JsonCodec, LoginRequest, TokenResponse, UserProfile,
    VerifyResponse,
};

use crate::{AuthBackend, BackendConfig, BackendError};

/// An [`AuthBackend`] that calls the backend's REST endpoints.
///
/// Cloning is cheap: `reqwest::Client` is reference-counted internally.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
    codec: JsonCodec,
}

impl HttpBackend {
    /// Builds a backend client from config.
    ///
    /// # Errors
    /// Returns [`BackendError::Config`] if the HTTP client can't be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        tracing::debug!(base_url = %config.base_url, "http auth backend ready");
        Ok(Self {
            client,
            config,
            codec: JsonCodec,
        })
    }

    /// Returns the config this backend was built with.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Reads a response body, mapping non-2xx statuses to
    /// [`BackendError::Rejected`] and undecodable bodies to
    /// [`BackendError::Malformed`].
    async fn read<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            // An undecodable error body still counts as a rejection;
            // it just has no detail.
            let detail = self
                .codec
                .decode::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message());
            tracing::debug!(
                endpoint,
                status = status.as_u16(),
                detail = detail.as_deref().unwrap_or(""),
                "backend rejected request"
            );
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        self.codec.decode(&body).map_err(|e| {
            tracing::warn!(endpoint, error = %e, "undecodable backend response");
            BackendError::Malformed(e.to_string())
        })
    }

    async fn get_with_auth<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.config.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        self.read(path, response).await
    }
}

impl AuthBackend for HttpBackend {
    async fn login(
        &self,
        req: &LoginRequest,
    ) -> Result<TokenResponse, BackendError> {
        let path = &self.config.paths.login;
        let response = self
            .client
            .post(self.config.url(path))
            .json(req)
            .send()
            .await
            .map_err(transport_error)?;

        let token: TokenResponse = self.read(path, response).await?;
        token
            .validate()
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        Ok(token)
    }

    async fn current_user(
        &self,
        token: &str,
    ) -> Result<UserProfile, BackendError> {
        self.get_with_auth(&self.config.paths.me, token).await
    }

    async fn verify(
        &self,
        token: &str,
    ) -> Result<VerifyResponse, BackendError> {
        self.get_with_auth(&self.config.paths.verify, token).await
    }

    async fn logout(&self, token: &str) -> Result<(), BackendError> {
        let path = &self.config.paths.logout;
        let response = self
            .client
            .post(self.config.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Rejected {
                status: status.as_u16(),
                detail: None,
            })
        }
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Unreachable(e.to_string())
    }
}
