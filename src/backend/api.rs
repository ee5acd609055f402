//! HTTP client for the adebar server API

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::Arc;

use crate::backend::types::{
    decode_records, RemoveReservationForm, ReservationForm, StatusResponse,
};
use crate::config::{AppConfig, HttpMethod, PickerConfig};
use crate::error::{SearchError, SubmitError};
use crate::picker::model::{CandidateRecord, FormField, SearchQuery};
use crate::picker::reservations::Reservation;

/// Searchable source of candidate records for one picker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateRecord>, SearchError>;
}

/// Client for the adebar server: searches, reservation calls, form submission
pub struct BackendClient {
    client: Client,
    config: Arc<AppConfig>,
}

impl BackendClient {
    pub fn new(config: Arc<AppConfig>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.search_timeout())
            .build()
            .inspect_err(|e| tracing::error!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    /// Name and value of the CSRF field, if a token is configured
    fn csrf(&self) -> Option<(String, String)> {
        self.config
            .csrf_token
            .as_ref()
            .map(|token| (self.config.csrf_field.clone(), token.clone()))
    }

    /// Run one search against a picker's endpoint
    pub async fn search(
        &self,
        picker: &PickerConfig,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateRecord>, SearchError> {
        let url = self.config.resolve_url(&picker.endpoint);
        let timeout_secs = self.config.search_timeout().as_secs();

        let request = match picker.method {
            HttpMethod::Post => {
                let params = search_params(query, self.csrf());
                self.client.post(&url).form(&params)
            }
            HttpMethod::Get => {
                let params = search_params(query, None);
                self.client.get(&url).query(&params)
            }
        };

        tracing::debug!(picker = %picker.name, fields = query.len(), "POST/GET {}", url);

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::from_reqwest(e, timeout_secs))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::from_reqwest(e, timeout_secs))?;
        decode_records(picker.shape, &body).map_err(|e| SearchError::Decode(e.to_string()))
    }

    pub async fn add_reservation(
        &self,
        event_id: &str,
        reservation: &Reservation,
    ) -> Result<StatusResponse, SubmitError> {
        let form = ReservationForm {
            event: event_id,
            id: None,
            description: &reservation.description,
            slots: reservation.slots,
            email: &reservation.email,
        };
        self.post_status("/api/events/addReservation", &form).await
    }

    /// Replace the reservation identified by its current description
    pub async fn edit_reservation(
        &self,
        event_id: &str,
        original_description: &str,
        reservation: &Reservation,
    ) -> Result<StatusResponse, SubmitError> {
        let form = ReservationForm {
            event: event_id,
            id: Some(original_description),
            description: &reservation.description,
            slots: reservation.slots,
            email: &reservation.email,
        };
        self.post_status("/api/events/editReservation", &form).await
    }

    pub async fn remove_reservation(
        &self,
        event_id: &str,
        description: &str,
    ) -> Result<StatusResponse, SubmitError> {
        let form = RemoveReservationForm {
            event: event_id,
            id: description,
        };
        self.post_status("/api/events/removeReservation", &form).await
    }

    /// Post the host form: every hidden field plus the CSRF token
    pub async fn submit_form(&self, fields: &[FormField]) -> Result<(), SubmitError> {
        let url = self.config.resolve_url(&self.config.form_action);
        let mut params: Vec<(String, String)> = fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect();
        params.extend(self.csrf());

        tracing::info!(fields = fields.len(), "Submitting host form to {}", url);

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| SubmitError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        check_status(&url, &response)?;
        Ok(())
    }

    async fn post_status<T: serde::Serialize + ?Sized>(
        &self,
        endpoint: &str,
        form: &T,
    ) -> Result<StatusResponse, SubmitError> {
        let url = self.config.resolve_url(endpoint);

        // Form body is the struct alone; the CSRF token travels in the query string
        let mut request = self.client.post(&url).form(form);
        if let Some(csrf) = self.csrf() {
            request = request.query(&[csrf]);
        }

        let response = request.send().await.map_err(|e| SubmitError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        check_status(&url, &response)?;

        response
            .json::<StatusResponse>()
            .await
            .map_err(|e| SubmitError::Decode {
                url,
                message: e.to_string(),
            })
    }
}

fn check_status(url: &str, response: &Response) -> Result<(), SubmitError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SubmitError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Request parameters of a search: the non-empty filter values, then the CSRF field
pub fn search_params(query: &SearchQuery, csrf: Option<(String, String)>) -> Vec<(String, String)> {
    query
        .pairs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .chain(csrf)
        .collect()
}

/// Catalog backed by a configured search endpoint
pub struct HttpCatalog {
    backend: Arc<BackendClient>,
    picker: PickerConfig,
}

impl HttpCatalog {
    pub fn new(backend: Arc<BackendClient>, picker: PickerConfig) -> Self {
        Self { backend, picker }
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateRecord>, SearchError> {
        self.backend.search(&self.picker, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_sends_only_csrf() {
        let params = search_params(
            &SearchQuery::new(),
            Some(("_csrf".to_string(), "abc".to_string())),
        );
        assert_eq!(params, vec![("_csrf".to_string(), "abc".to_string())]);

        assert!(search_params(&SearchQuery::new(), None).is_empty());
    }

    #[test]
    fn test_search_params_keep_field_order() {
        let query = SearchQuery::new()
            .with("firstname", "Anna")
            .with("lastname", "")
            .with("city", "Berlin");
        let params = search_params(&query, None);

        assert_eq!(
            params,
            vec![
                ("firstname".to_string(), "Anna".to_string()),
                ("city".to_string(), "Berlin".to_string()),
            ]
        );
    }

    #[test]
    fn test_reservation_form_shape() {
        let form = ReservationForm {
            event: "ev-1",
            id: None,
            description: "Bus",
            slots: 3,
            email: "",
        };
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["event"], "ev-1");
        assert_eq!(value["slots"], 3);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_client_builds_with_configured_timeout() {
        let config = Arc::new(AppConfig {
            search_timeout_secs: 0,
            ..AppConfig::default()
        });
        assert!(BackendClient::new(config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = Arc::new(AppConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            search_timeout_secs: 2,
            ..AppConfig::default()
        });
        let backend = Arc::new(BackendClient::new(config.clone()).unwrap());
        let picker = config.pickers[0].clone();
        let catalog = HttpCatalog::new(backend, picker);

        let result = catalog.search(&SearchQuery::new()).await;
        assert!(matches!(
            result,
            Err(SearchError::Transport(_)) | Err(SearchError::Timeout(_))
        ));
    }
}
