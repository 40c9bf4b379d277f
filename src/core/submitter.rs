use crate::core::{ObjectKind, PropertyDefinition, ResultRecord};
use crate::utils::error::EtlError;
use reqwest::Client;
use std::time::Duration;

/// Create-property URL for each object kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEndpoints {
    pub contact: String,
    pub deal: String,
    pub ticket: String,
}

impl PropertyEndpoints {
    pub fn resolve(url_for: impl Fn(ObjectKind) -> String) -> Self {
        Self {
            contact: url_for(ObjectKind::Contact),
            deal: url_for(ObjectKind::Deal),
            ticket: url_for(ObjectKind::Ticket),
        }
    }

    pub fn from_base_url(base_url: &str) -> Self {
        Self::resolve(|kind| kind.default_endpoint(base_url))
    }

    pub fn get(&self, kind: ObjectKind) -> &str {
        match kind {
            ObjectKind::Contact => &self.contact,
            ObjectKind::Deal => &self.deal,
            ObjectKind::Ticket => &self.ticket,
        }
    }
}

/// Posts property definitions to the CRM with bearer auth.
///
/// `submit` never fails: every call yields exactly one `ResultRecord`.
#[derive(Debug, Clone)]
pub struct PropertySubmitter {
    client: Client,
    access_token: String,
    endpoints: PropertyEndpoints,
    timeout: Option<Duration>,
}

impl PropertySubmitter {
    pub fn new(
        client: Client,
        access_token: impl Into<String>,
        endpoints: PropertyEndpoints,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            access_token: access_token.into(),
            endpoints,
            timeout,
        }
    }

    pub fn endpoint(&self, kind: ObjectKind) -> &str {
        self.endpoints.get(kind)
    }

    pub async fn submit(&self, kind: ObjectKind, definition: &PropertyDefinition) -> ResultRecord {
        let endpoint = self.endpoint(kind);

        tracing::debug!("POST {} for property '{}'", endpoint, definition.name);

        let mut request = self
            .client
            .post(endpoint)
            .bearer_auth(&self.access_token)
            .json(definition);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = EtlError::from(e);
                tracing::warn!("❌ {} '{}': {}", kind, definition.name, error);
                return ResultRecord::failure(kind, definition, error.to_string());
            }
        };

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_success() {
            tracing::info!("✅ Created {} property '{}'", kind, definition.name);
            return ResultRecord::success(kind, definition);
        }

        let message = match response.text().await {
            Ok(body) => extract_error_message(&body)
                .unwrap_or_else(|| format!("HTTP {}", status)),
            Err(e) => EtlError::from(e).to_string(),
        };

        tracing::warn!(
            "❌ {} '{}' rejected ({}): {}",
            kind,
            definition.name,
            status,
            message
        );
        ResultRecord::failure(kind, definition, message)
    }
}

/// The `message` field of a JSON error body, else the raw body. `None` for an empty body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => match json.get("message").and_then(|m| m.as_str()) {
            Some(message) => Some(message.to_string()),
            None => Some(json.to_string()),
        },
        Err(_) => Some(body.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResultStatus;
    use httpmock::prelude::*;

    fn definition() -> PropertyDefinition {
        PropertyDefinition {
            name: "favorite_color".to_string(),
            label: "Favorite Color".to_string(),
            description: "Customer's favorite color".to_string(),
            group_name: "contactinformation".to_string(),
            property_type: "string".to_string(),
            field_type: "text".to_string(),
            form_field: true,
            options: None,
            number_display_hint: None,
        }
    }

    fn submitter_for(server: &MockServer) -> PropertySubmitter {
        let endpoints = PropertyEndpoints::from_base_url(&server.base_url());
        PropertySubmitter::new(Client::new(), "test-token", endpoints, None)
    }

    #[tokio::test]
    async fn test_submit_success() {
        let server = MockServer::start();

        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/crm/v3/properties/contacts")
                .header("Authorization", "Bearer test-token")
                .json_body_partial(r#"{"name":"favorite_color","formField":true}"#);
            then.status(201)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"name": "favorite_color"}));
        });

        let submitter = submitter_for(&server);
        let record = submitter.submit(ObjectKind::Contact, &definition()).await;

        api_mock.assert();
        assert_eq!(record.status, ResultStatus::Success);
        assert_eq!(record.object_type, "contact");
        assert_eq!(record.name, "favorite_color");
        assert_eq!(record.label, "Favorite Color");
        assert!(record.error_message.is_none());
    }

    #[tokio::test]
    async fn test_submit_rejection_extracts_message() {
        let server = MockServer::start();

        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/crm/v3/properties/deals");
            then.status(409)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "status": "error",
                    "message": "Property named 'favorite_color' already exists."
                }));
        });

        let submitter = submitter_for(&server);
        let record = submitter.submit(ObjectKind::Deal, &definition()).await;

        api_mock.assert_hits(1);
        assert_eq!(record.status, ResultStatus::Failure);
        assert_eq!(
            record.error_message.as_deref(),
            Some("Property named 'favorite_color' already exists.")
        );
    }

    #[tokio::test]
    async fn test_submit_rejection_with_plain_body() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/crm/v3/properties/tickets");
            then.status(502).body("Bad Gateway");
        });

        let submitter = submitter_for(&server);
        let record = submitter.submit(ObjectKind::Ticket, &definition()).await;

        assert_eq!(record.status, ResultStatus::Failure);
        assert_eq!(record.error_message.as_deref(), Some("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_submit_rejection_with_empty_body() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/crm/v3/properties/contacts");
            then.status(401);
        });

        let submitter = submitter_for(&server);
        let record = submitter.submit(ObjectKind::Contact, &definition()).await;

        assert_eq!(record.status, ResultStatus::Failure);
        assert!(record.error_message.unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_submit_network_error_is_recorded() {
        let endpoints = PropertyEndpoints::from_base_url("http://127.0.0.1:1");
        let submitter = PropertySubmitter::new(Client::new(), "test-token", endpoints, None);

        let record = submitter.submit(ObjectKind::Contact, &definition()).await;

        assert_eq!(record.status, ResultStatus::Failure);
        assert!(record
            .error_message
            .unwrap()
            .starts_with("API request failed:"));
    }

    #[tokio::test]
    async fn test_each_kind_posts_to_its_own_endpoint() {
        let server = MockServer::start();

        let mocks: Vec<_> = ["/c", "/d", "/t"]
            .iter()
            .map(|path| {
                server.mock(|when, then| {
                    when.method(POST).path(*path);
                    then.status(201);
                })
            })
            .collect();

        let endpoints = PropertyEndpoints::resolve(|kind| match kind {
            ObjectKind::Contact => server.url("/c"),
            ObjectKind::Deal => server.url("/d"),
            ObjectKind::Ticket => server.url("/t"),
        });
        let submitter = PropertySubmitter::new(Client::new(), "test-token", endpoints, None);

        for kind in ObjectKind::ALL {
            let record = submitter.submit(kind, &definition()).await;
            assert_eq!(record.status, ResultStatus::Success);
            assert_eq!(record.object_type, kind.as_str());
        }

        for mock in &mocks {
            mock.assert_hits(1);
        }
    }

    #[test]
    fn test_endpoints_from_base_url() {
        let endpoints = PropertyEndpoints::from_base_url("https://api.hubapi.com/");

        assert_eq!(
            endpoints.get(ObjectKind::Contact),
            "https://api.hubapi.com/crm/v3/properties/contacts"
        );
        assert_eq!(
            endpoints.get(ObjectKind::Ticket),
            "https://api.hubapi.com/crm/v3/properties/tickets"
        );
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(""), None);
        assert_eq!(extract_error_message("  "), None);
        assert_eq!(
            extract_error_message(r#"{"message":"boom"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(
            extract_error_message(r#"{"error":"bad"}"#).as_deref(),
            Some(r#"{"error":"bad"}"#)
        );
        assert_eq!(extract_error_message("oops").as_deref(), Some("oops"));
    }
}
