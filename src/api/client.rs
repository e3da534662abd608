// src/api/client.rs
//! Blocking HTTP client for the Tandoor API.
//!
//! A thin wrapper around reqwest: it handles authentication, endpoint
//! joining and status classification, and leaves sequencing to the caller.

use super::types::{ConvertedSource, SourceRequest};
use super::{
    ApiOutcome, AttachmentRef, CreatedRecipe, ErrorPayload, FoodEntry, RecipeDocument,
    RecipeService,
};
use crate::constants::{
    ENDPOINT_FOOD, ENDPOINT_RECIPE, ENDPOINT_RECIPE_FROM_SOURCE, ENDPOINT_USER_FILE,
};
use crate::error::AppError;
use crate::types::{ApiToken, ServerUrl};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A Tandoor API session bound to one server and token.
#[derive(Clone)]
pub struct TandoorClient {
    client: Client,
    base_url: ServerUrl,
}

impl TandoorClient {
    /// Creates a new HTTP client with bearer authentication.
    pub fn new(base_url: ServerUrl, token: &ApiToken) -> Result<Self, AppError> {
        Self::with_builder(Client::builder(), base_url, token)
    }

    /// Like [`new`](Self::new), starting from a preconfigured builder
    /// (timeouts, proxies, TLS roots).
    pub fn with_builder(
        builder: ClientBuilder,
        base_url: ServerUrl,
        token: &ApiToken,
    ) -> Result<Self, AppError> {
        let client = builder
            .default_headers(Self::create_headers(token)?)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Creates the default headers for Tandoor API requests.
    fn create_headers(token: &ApiToken) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", token.as_str());
        let mut auth_value = header::HeaderValue::from_str(&auth_header).map_err(|e| {
            AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
        })?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    pub fn base_url(&self) -> &ServerUrl {
        &self.base_url
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<ApiResponse<String>, AppError> {
        let url = self.base_url.endpoint(endpoint)?;
        log::debug!("POST {}", url);

        let response = self.client.post(url).json(body).send()?;
        extract_response_text(response)
    }

    /// Makes a multipart POST; the form replaces the default JSON content type.
    pub fn post_multipart(
        &self,
        endpoint: &str,
        form: Form,
    ) -> Result<ApiResponse<String>, AppError> {
        let url = self.base_url.endpoint(endpoint)?;
        log::debug!("POST multipart {}", url);

        let response = self.client.post(url).multipart(form).send()?;
        extract_response_text(response)
    }
}

impl RecipeService for TandoorClient {
    fn convert_text_to_recipe(
        &self,
        document: &str,
    ) -> Result<ApiOutcome<RecipeDocument>, AppError> {
        let response =
            self.post_json(ENDPOINT_RECIPE_FROM_SOURCE, &SourceRequest { data: document })?;
        Ok(classify::<ConvertedSource>(response, StatusCode::OK)
            .map(|converted| converted.recipe_json))
    }

    fn upload_attachment(
        &self,
        display_name: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ApiOutcome<AttachmentRef>, AppError> {
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(mime) = mime_guess::from_path(file_name).first() {
            part = part.mime_str(mime.essence_str())?;
        }
        let form = Form::new()
            .text("name", display_name.to_string())
            .part("file", part);

        let response = self.post_multipart(ENDPOINT_USER_FILE, form)?;
        Ok(classify_by_status(response, StatusCode::CREATED).map(AttachmentRef))
    }

    fn create_recipe(
        &self,
        recipe: &RecipeDocument,
    ) -> Result<ApiOutcome<CreatedRecipe>, AppError> {
        let response = self.post_json(ENDPOINT_RECIPE, recipe)?;
        Ok(classify_by_status(response, StatusCode::CREATED).map(CreatedRecipe))
    }

    fn create_food_entry(&self, food: &FoodEntry) -> Result<ApiOutcome<Value>, AppError> {
        let response = self.post_json(ENDPOINT_FOOD, food)?;
        Ok(classify_by_status(response, StatusCode::CREATED))
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text()?;

    log::debug!("{} answered {}", url, status);

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}

fn reject_unexpected_status<T>(
    response: &ApiResponse<String>,
    expected: StatusCode,
) -> Option<ApiOutcome<T>> {
    if response.status == expected {
        return None;
    }
    log::debug!(
        "{} returned {} (expected {})",
        response.url,
        response.status,
        expected
    );
    Some(ApiOutcome::Rejected(ErrorPayload::from_body(
        response.status.as_u16(),
        &response.data,
    )))
}

/// Turns a response into an outcome by status alone.
///
/// Used for calls that create something: once the server answered the
/// expected status the object exists, so the body never turns it into a
/// refusal. A JSON body is kept as parsed, any other body as a JSON string,
/// and an empty body as `null`.
pub fn classify_by_status(
    response: ApiResponse<String>,
    expected: StatusCode,
) -> ApiOutcome<Value> {
    if let Some(rejected) = reject_unexpected_status(&response, expected) {
        return rejected;
    }

    if response.data.trim().is_empty() {
        return ApiOutcome::Accepted(Value::Null);
    }
    match serde_json::from_str::<Value>(&response.data) {
        Ok(value) => ApiOutcome::Accepted(value),
        Err(e) => {
            log::warn!("Non-JSON body from {}: {}", response.url, e);
            ApiOutcome::Accepted(Value::String(response.data))
        }
    }
}

/// Turns a response into an outcome: accepted only on the expected status
/// with a body that decodes as `T`.
pub fn classify<T: DeserializeOwned>(
    response: ApiResponse<String>,
    expected: StatusCode,
) -> ApiOutcome<T> {
    if let Some(rejected) = reject_unexpected_status(&response, expected) {
        return rejected;
    }

    let status = response.status.as_u16();
    match serde_json::from_str::<T>(&response.data) {
        Ok(value) => ApiOutcome::Accepted(value),
        Err(e) => {
            log::warn!("Unexpected response shape from {}: {}", response.url, e);
            ApiOutcome::Rejected(ErrorPayload::from_body(status, &response.data))
        }
    }
}
