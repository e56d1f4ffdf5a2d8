//! # Brevo Client
//!
//! Contact lists record who bought what; transactional email delivers links.

use crate::config::{BrevoConfig, Sender};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use shop_core::{Contact, ContactDirectory, EmailMessage, Mailer, ShopError, ShopResult};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "brevo";

/// Brevo v3 REST client
pub struct BrevoClient {
    config: BrevoConfig,
    client: Client,
}

impl BrevoClient {
    pub fn new(config: BrevoConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(BrevoConfig::from_env()?)
    }

    /// `{base}/{segments...}` with every segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> ShopResult<Url> {
        let mut url = Url::parse(&self.config.api_base_url)
            .map_err(|e| ShopError::Configuration(format!("Invalid Brevo base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ShopError::Configuration("Brevo base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

#[async_trait]
impl ContactDirectory for BrevoClient {
    #[instrument(skip(self, email))]
    async fn find_contact(&self, email: &str) -> ShopResult<Option<Contact>> {
        let url = self.endpoint(&["contacts", email])?;

        let response = self
            .client
            .get(url)
            .header("api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Contact not found");
            return Ok(None);
        }

        let body = read_body(response).await?;
        let contact: BrevoContact = serde_json::from_str(&body).map_err(|e| {
            ShopError::Serialization(format!("Failed to parse Brevo contact: {}", e))
        })?;

        Ok(Some(Contact {
            id: contact.id,
            email: contact.email,
            list_ids: contact.list_ids,
        }))
    }

    #[instrument(skip(self, email))]
    async fn create_contact(&self, email: &str, list_id: u64) -> ShopResult<()> {
        let url = self.endpoint(&["contacts"])?;
        let payload = CreateContact {
            email,
            list_ids: vec![list_id],
        };

        let response = self
            .client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        read_body(response).await?;
        info!("Created contact on list {}", list_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_to_list(&self, contact_id: u64, list_id: u64) -> ShopResult<()> {
        let url = self.endpoint(&["contacts", &contact_id.to_string()])?;
        let payload = UpdateContact {
            list_ids: vec![list_id],
        };

        let response = self
            .client
            .put(url)
            .header("api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        read_body(response).await?;
        info!("Added contact {} to list {}", contact_id, list_id);
        Ok(())
    }
}

#[async_trait]
impl Mailer for BrevoClient {
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: &EmailMessage) -> ShopResult<()> {
        let url = self.endpoint(&["smtp", "email"])?;
        let payload = SendEmail {
            sender: &self.config.sender,
            reply_to: &self.config.sender,
            to: vec![Recipient {
                email: &message.to,
            }],
            subject: &message.subject,
            html_content: &message.html,
            text_content: &message.text,
        };

        let response = self
            .client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let body = read_body(response).await?;
        debug!("Brevo accepted email: {}", body);
        Ok(())
    }
}

/// Read the body, turning non-2xx into a provider error
async fn read_body(response: Response) -> ShopResult<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ShopError::Network(e.to_string()))?;

    if !status.is_success() {
        error!("Brevo API error: status={}, body={}", status, body);

        if let Ok(error_response) = serde_json::from_str::<BrevoError>(&body) {
            return Err(ShopError::provider(
                PROVIDER,
                format!("{}: {}", error_response.code, error_response.message),
            ));
        }

        return Err(ShopError::provider(
            PROVIDER,
            format!("HTTP {}: {}", status, body),
        ));
    }

    Ok(body)
}

// =============================================================================
// Brevo API Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrevoContact {
    id: u64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    list_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContact<'a> {
    email: &'a str,
    list_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateContact {
    list_ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmail<'a> {
    sender: &'a Sender,
    reply_to: &'a Sender,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct BrevoError {
    code: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> BrevoClient {
        let config = BrevoConfig::new("xkeysib-test", "Course Store", "store@example.com")
            .with_api_base_url(server.uri());
        BrevoClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_find_contact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts/a@b.com"))
            .and(header("api-key", "xkeysib-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "email": "a@b.com",
                "emailBlacklisted": false,
                "listIds": [2, 4]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let contact = client(&server).find_contact("a@b.com").await.unwrap().unwrap();

        assert_eq!(contact.id, 42);
        assert_eq!(contact.list_ids, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_find_unknown_contact() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contacts/nobody@b.com"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "document_not_found",
                "message": "Contact does not exist"
            })))
            .mount(&server)
            .await;

        assert!(client(&server)
            .find_contact("nobody@b.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_contact_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "unauthorized",
                "message": "Key not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server).find_contact("a@b.com").await.unwrap_err();

        match err {
            ShopError::Provider { provider, message } => {
                assert_eq!(provider, "brevo");
                assert_eq!(message, "unauthorized: Key not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_contact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contacts"))
            .and(body_json(json!({ "email": "a@b.com", "listIds": [4] })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 43 })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).create_contact("a@b.com", 4).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_to_list() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/contacts/42"))
            .and(body_json(json!({ "listIds": [3] })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).add_to_list(42, 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/smtp/email"))
            .and(body_json(json!({
                "sender": { "name": "Course Store", "email": "store@example.com" },
                "replyTo": { "name": "Course Store", "email": "store@example.com" },
                "to": [{ "email": "a@b.com" }],
                "subject": "Download CSS",
                "htmlContent": "<a href=\"x\">Download it now</a>",
                "textContent": "Download it now. x"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "messageId": "<201798300811.5787683@relay.domain.com>"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = EmailMessage {
            to: "a@b.com".to_string(),
            subject: "Download CSS".to_string(),
            html: "<a href=\"x\">Download it now</a>".to_string(),
            text: "Download it now. x".to_string(),
        };

        client(&server).send(&message).await.unwrap();
    }
}
