//! REST client for the building access API.

use reqwest::Response;
use secrecy::SecretString;
use serde::{de::DeserializeOwned, Deserialize};

use crate::config::AccessKitConfig;
use crate::error::AccessKitError;
use crate::http_request::Request;
use crate::types::{AccessLogEntry, Credential, GuestAccessInvitation, NewGuestInvitation};

#[derive(Debug, Deserialize)]
struct CredentialsResponse {
    credentials: Vec<Credential>,
}

#[derive(Debug, Deserialize)]
struct CredentialResponse {
    credential: Credential,
}

#[derive(Debug, Deserialize)]
struct InvitationResponse {
    invitation: GuestAccessInvitation,
}

#[derive(Debug, Deserialize)]
struct InvitationsResponse {
    invitations: Vec<GuestAccessInvitation>,
}

/// Access API client. All endpoints live under `{base_url}/api/v1/access`.
pub struct AccessApiClient {
    base_url: String,
    request: Request,
}

impl AccessApiClient {
    /// Creates a client from configuration.
    #[must_use]
    pub fn new(config: &AccessKitConfig) -> Self {
        Self {
            base_url: format!("{}/api/v1/access", config.api_base()),
            request: Request::new(config.request_timeout(), config.max_retries),
        }
    }

    /// Sets the bearer token for subsequent requests.
    pub fn set_auth_token(&self, token: SecretString) {
        self.request.set_auth_token(token);
    }

    /// `GET /credentials`: the authoritative credential list.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status or an unparseable body.
    pub async fn fetch_credentials(&self) -> Result<Vec<Credential>, AccessKitError> {
        let url = format!("{}/credentials", self.base_url);
        let response = self.request.handle(self.request.get(&url)).await?;
        let body: CredentialsResponse = parse_json(&url, response).await?;
        Ok(body.credentials)
    }

    /// `POST /credentials/{id}/refresh`: rotates the credential payload.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status or an unparseable body.
    pub async fn refresh_credential(&self, id: &str) -> Result<Credential, AccessKitError> {
        let url = format!("{}/credentials/{id}/refresh", self.base_url);
        let response = self.request.handle(self.request.post(&url)).await?;
        let body: CredentialResponse = parse_json(&url, response).await?;
        Ok(body.credential)
    }

    /// `POST /credentials/revoke-all`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn revoke_all_credentials(&self) -> Result<(), AccessKitError> {
        let url = format!("{}/credentials/revoke-all", self.base_url);
        let response = self.request.handle(self.request.post(&url)).await?;
        ensure_success(&url, response).await
    }

    /// `POST /log`: mirrors one access log entry.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn submit_log_entry(&self, entry: &AccessLogEntry) -> Result<(), AccessKitError> {
        let url = format!("{}/log", self.base_url);
        let response = self
            .request
            .handle(self.request.post(&url).json(entry))
            .await?;
        ensure_success(&url, response).await
    }

    /// `POST /invitations`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status or an unparseable body.
    pub async fn create_invitation(
        &self,
        invitation: &NewGuestInvitation,
    ) -> Result<GuestAccessInvitation, AccessKitError> {
        let url = format!("{}/invitations", self.base_url);
        let response = self
            .request
            .handle(self.request.post(&url).json(invitation))
            .await?;
        let body: InvitationResponse = parse_json(&url, response).await?;
        Ok(body.invitation)
    }

    /// `GET /invitations?building_id=`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status or an unparseable body.
    pub async fn list_invitations(
        &self,
        building_id: &str,
    ) -> Result<Vec<GuestAccessInvitation>, AccessKitError> {
        let url = format!("{}/invitations", self.base_url);
        let response = self
            .request
            .handle(self.request.get(&url).query(&[("building_id", building_id)]))
            .await?;
        let body: InvitationsResponse = parse_json(&url, response).await?;
        Ok(body.invitations)
    }

    /// `POST /invitations/{id}/cancel`.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn cancel_invitation(&self, id: &str) -> Result<(), AccessKitError> {
        let url = format!("{}/invitations/{id}/cancel", self.base_url);
        let response = self.request.handle(self.request.post(&url)).await?;
        ensure_success(&url, response).await
    }
}

async fn ensure_success(url: &str, response: Response) -> Result<(), AccessKitError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let error_body = response.text().await.unwrap_or_default();
    Err(AccessKitError::NetworkError {
        url: url.to_string(),
        status: Some(status.as_u16()),
        error: format!("request failed: {error_body}"),
    })
}

async fn parse_json<T: DeserializeOwned>(
    url: &str,
    response: Response,
) -> Result<T, AccessKitError> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(AccessKitError::NetworkError {
            url: url.to_string(),
            status: Some(status.as_u16()),
            error: format!("request failed: {error_body}"),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| AccessKitError::SerializationError {
        error: format!("failed to parse response from {url}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{AccessAttemptResult, InvitationStatus};

    fn client(server: &mockito::Server) -> AccessApiClient {
        let mut config = AccessKitConfig::new(server.url());
        config.max_retries = 0;
        AccessApiClient::new(&config)
    }

    fn credential_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "buildingId": "b-1",
            "buildingName": "Riverside",
            "userId": "u-1",
            "accessLevel": "tenant",
            "accessPoints": [],
            "validFrom": "2025-01-01T00:00:00Z",
            "validUntil": "2026-01-01T00:00:00Z",
            "status": "active",
            "usageCount": 0,
            "encryptedData": "payload"
        })
    }

    #[tokio::test]
    async fn test_fetch_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/access/credentials")
            .match_header("authorization", "Bearer token-1")
            .with_status(200)
            .with_body(
                serde_json::json!({ "credentials": [credential_json("c-1"), credential_json("c-2")] })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = client(&server);
        client.set_auth_token(SecretString::from("token-1".to_string()));
        let credentials = client.fetch_credentials().await.unwrap();

        mock.assert_async().await;
        assert_eq!(credentials.len(), 2);
        assert_eq!(credentials[1].id, "c-2");
    }

    #[tokio::test]
    async fn test_refresh_credential_http_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/access/credentials/c-1/refresh")
            .with_status(403)
            .with_body(r#"{"error":"forbidden"}"#)
            .create_async()
            .await;

        let err = client(&server).refresh_credential("c-1").await.unwrap_err();
        match err {
            AccessKitError::NetworkError { status, error, .. } => {
                assert_eq!(status, Some(403));
                assert!(error.contains("forbidden"));
            }
            _ => panic!("Expected NetworkError, got: {err:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_serialization_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/access/credentials")
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let err = client(&server).fetch_credentials().await.unwrap_err();
        assert!(matches!(err, AccessKitError::SerializationError { .. }));
    }

    #[tokio::test]
    async fn test_submit_log_entry_posts_flat_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/access/log")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "id": "log-1",
                "credentialId": "c-1",
                "accessPointId": "main-1",
                "granted": true
            })))
            .with_status(201)
            .create_async()
            .await;

        let entry = AccessLogEntry {
            id: "log-1".to_string(),
            credential_id: "c-1".to_string(),
            building_id: "b-1".to_string(),
            attempt: AccessAttemptResult::granted(
                "main-1",
                "Main Entrance",
                Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
            ),
        };
        client(&server).submit_log_entry(&entry).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invitations_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let invitation = serde_json::json!({
            "id": "inv-1",
            "inviterId": "u-1",
            "inviterName": "Ana",
            "guestName": "Bob",
            "buildingId": "b-1",
            "accessPointIds": ["main-1"],
            "validFrom": "2025-06-02T09:00:00Z",
            "validUntil": "2025-06-02T18:00:00Z",
            "maxEntries": 2,
            "entryCount": 0,
            "status": "pending",
            "claimLink": "https://example.com/claim/inv-1",
            "createdAt": "2025-06-01T12:00:00Z"
        });

        let create = server
            .mock("POST", "/api/v1/access/invitations")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({ "buildingId": "b-1", "guestName": "Bob" }),
            ))
            .with_status(201)
            .with_body(serde_json::json!({ "invitation": invitation }).to_string())
            .create_async()
            .await;
        let list = server
            .mock("GET", "/api/v1/access/invitations")
            .match_query(mockito::Matcher::UrlEncoded(
                "building_id".to_string(),
                "b-1".to_string(),
            ))
            .with_status(200)
            .with_body(serde_json::json!({ "invitations": [invitation] }).to_string())
            .create_async()
            .await;
        let cancel = server
            .mock("POST", "/api/v1/access/invitations/inv-1/cancel")
            .with_status(204)
            .create_async()
            .await;

        let client = client(&server);
        let created = client
            .create_invitation(&NewGuestInvitation {
                building_id: "b-1".to_string(),
                guest_name: "Bob".to_string(),
                guest_email: None,
                guest_phone: None,
                access_point_ids: vec!["main-1".to_string()],
                valid_from: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
                valid_until: Utc.with_ymd_and_hms(2025, 6, 2, 18, 0, 0).unwrap(),
                max_entries: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(created.status, InvitationStatus::Pending);
        assert_eq!(created.max_entries, Some(2));

        let listed = client.list_invitations("b-1").await.unwrap();
        assert_eq!(listed, vec![created]);

        client.cancel_invitation("inv-1").await.unwrap();

        create.assert_async().await;
        list.assert_async().await;
        cancel.assert_async().await;
    }
}
