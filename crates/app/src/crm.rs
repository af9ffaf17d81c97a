//! Client for the CRM's portal-external API.
//!
//! Responses are passed through as opaque JSON. The artisan id always comes
//! from the authenticated portal session, never from caller input.

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Connection settings for the CRM.
#[derive(Debug, Clone)]
pub struct CrmConfig {
    /// CRM origin, e.g. `"https://crm.example.com"`.
    pub url: String,

    /// Value of the `X-GMBS-Key-Id` header.
    pub key_id: String,

    /// Value of the `X-GMBS-Secret` header.
    pub secret: String,
}

/// CRM call failures.
#[derive(Debug, Error)]
pub enum CrmError {
    /// The request could not be sent or the body not read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The CRM answered with a non-success status.
    #[error("CRM responded with {status}: {message}")]
    UnexpectedResponse {
        /// HTTP status.
        status: u16,
        /// Error message from the body, or the raw body.
        message: String,
    },
}

/// Notice sent once a report has been submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSubmittedNotice {
    /// CRM artisan identifier.
    pub artisan_id: String,
    /// Submitted report.
    pub report_id: String,
    /// Report text as submitted.
    pub report_content: String,
    /// Photos attached to the report.
    pub photo_count: usize,
}

/// Portal-facing CRM operations, always scoped to one artisan.
#[automock]
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Interventions assigned to the artisan.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or refuses the call.
    async fn artisan_interventions(&self, artisan_id: &str) -> Result<Value, CrmError>;

    /// One intervention, if it belongs to the artisan.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or the intervention is not the artisan's.
    async fn intervention_detail(
        &self,
        intervention_id: &str,
        artisan_id: &str,
    ) -> Result<Value, CrmError>;

    /// Documents attached to an intervention.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or the intervention is not the artisan's.
    async fn intervention_documents(
        &self,
        intervention_id: &str,
        artisan_id: &str,
    ) -> Result<Value, CrmError>;

    /// Compliance documents on file for the artisan.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or refuses the call.
    async fn artisan_documents(&self, artisan_id: &str) -> Result<Value, CrmError>;

    /// Forward a document upload. `payload` carries kind, filename, MIME type and base64 data.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or rejects the document.
    async fn upload_artisan_document(
        &self,
        artisan_id: &str,
        payload: Value,
    ) -> Result<Value, CrmError>;

    /// The CRM's copy of an intervention report.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or the intervention is not the artisan's.
    async fn intervention_report(
        &self,
        intervention_id: &str,
        artisan_id: &str,
    ) -> Result<Value, CrmError>;

    /// Forward a report. `artisanId` in `payload` is overwritten with `artisan_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or rejects the report.
    async fn submit_intervention_report(
        &self,
        intervention_id: &str,
        artisan_id: &str,
        payload: Value,
    ) -> Result<Value, CrmError>;

    /// Tell the CRM a report is ready to pull.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError`] when the CRM is unreachable or refuses the notice.
    async fn notify_report_submitted(
        &self,
        intervention_id: &str,
        notice: &ReportSubmittedNotice,
    ) -> Result<(), CrmError>;
}

/// [`CrmClient`] over HTTP, authenticated with the key-id/secret header pair.
#[derive(Debug, Clone)]
pub struct HttpCrmClient {
    base_url: String,
    key_id: String,
    secret: String,
    http: Client,
}

impl HttpCrmClient {
    /// Client for the configured CRM origin.
    #[must_use]
    pub fn new(config: CrmConfig) -> Self {
        Self {
            base_url: format!(
                "{}/api/portal-external",
                config.url.trim_end_matches('/')
            ),
            key_id: config.key_id,
            secret: config.secret,
            http: Client::new(),
        }
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.authorized(self.http.get(format!("{}{endpoint}", self.base_url)))
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        self.authorized(self.http.post(format!("{}{endpoint}", self.base_url)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-GMBS-Key-Id", &self.key_id)
            .header("X-GMBS-Secret", &self.secret)
    }

    async fn send(request: RequestBuilder) -> Result<Value, CrmError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            return Err(CrmError::UnexpectedResponse {
                status,
                message: error_message(&body).unwrap_or(body),
            });
        }

        Ok(response.json().await?)
    }
}

/// The `error` field of a JSON error body, if there is one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl CrmClient for HttpCrmClient {
    async fn artisan_interventions(&self, artisan_id: &str) -> Result<Value, CrmError> {
        Self::send(self.get(&format!("/artisan/{artisan_id}/interventions"))).await
    }

    async fn intervention_detail(
        &self,
        intervention_id: &str,
        artisan_id: &str,
    ) -> Result<Value, CrmError> {
        Self::send(
            self.get(&format!("/intervention/{intervention_id}"))
                .query(&[("artisanId", artisan_id)]),
        )
        .await
    }

    async fn intervention_documents(
        &self,
        intervention_id: &str,
        artisan_id: &str,
    ) -> Result<Value, CrmError> {
        Self::send(
            self.get(&format!("/intervention/{intervention_id}/documents"))
                .query(&[("artisanId", artisan_id)]),
        )
        .await
    }

    async fn artisan_documents(&self, artisan_id: &str) -> Result<Value, CrmError> {
        Self::send(self.get(&format!("/artisan/{artisan_id}/documents"))).await
    }

    async fn upload_artisan_document(
        &self,
        artisan_id: &str,
        payload: Value,
    ) -> Result<Value, CrmError> {
        Self::send(
            self.post(&format!("/artisan/{artisan_id}/documents"))
                .json(&payload),
        )
        .await
    }

    async fn intervention_report(
        &self,
        intervention_id: &str,
        artisan_id: &str,
    ) -> Result<Value, CrmError> {
        Self::send(
            self.get(&format!("/intervention/{intervention_id}/report"))
                .query(&[("artisanId", artisan_id)]),
        )
        .await
    }

    async fn submit_intervention_report(
        &self,
        intervention_id: &str,
        artisan_id: &str,
        mut payload: Value,
    ) -> Result<Value, CrmError> {
        match payload.as_object_mut() {
            Some(fields) => {
                fields.insert("artisanId".to_string(), json!(artisan_id));
            }
            None => payload = json!({ "artisanId": artisan_id }),
        }

        Self::send(
            self.post(&format!("/intervention/{intervention_id}/report"))
                .json(&payload),
        )
        .await
    }

    async fn notify_report_submitted(
        &self,
        intervention_id: &str,
        notice: &ReportSubmittedNotice,
    ) -> Result<(), CrmError> {
        Self::send(
            self.post(&format!(
                "/intervention/{intervention_id}/report-submitted"
            ))
            .json(notice),
        )
        .await?;

        Ok(())
    }
}
