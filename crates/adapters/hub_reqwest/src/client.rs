//! [`HubClient`] over the hub's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use hublink_app::ports::HubClient;
use hublink_domain::attribute::Attributes;
use hublink_domain::device::{AuditLogEntry, ChildDevice, DeviceStateRecord, HubVersion};
use hublink_domain::error::{HubLinkError, NotFoundError, ValidationError};
use hublink_domain::event::{Event, EventPatch, EventRecord, NewEventRequest};
use hublink_domain::event_type::{EventType, EventTypesBatchResponse};
use hublink_domain::id::{ExecutionId, ObjectId};
use hublink_domain::object::{ObjectAction, ObjectDescriptor};
use hublink_domain::state::{
    ObjectStateChange, PaginatedStateRecords, StateChangeOutcome, StateRecord,
};

use crate::config::HubClientConfig;
use crate::error::HttpError;

/// Event types sent per batch request.
pub const EVENT_TYPE_BATCH_SIZE: usize = 30;

const ALL_EVENT_TYPES_FAILED: &str = "all event types failed to create";

#[derive(Deserialize)]
struct EncodedSource {
    stream_id: String,
}

#[derive(Deserialize)]
struct UploadedFile {
    filename: String,
}

/// Status and body of a hub answer.
struct Answer {
    status: u16,
    body: String,
}

impl Answer {
    fn into_result(self) -> Result<String, HttpError> {
        if self.status >= 400 {
            return Err(HttpError::Status {
                status: self.status,
                body: self.body,
            });
        }
        Ok(self.body)
    }
}

/// Hub client backed by a shared [`reqwest::Client`].
pub struct ReqwestHubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    driver_key: String,
}

impl ReqwestHubClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::EmptyHost`] when no host is configured, or
    /// [`HttpError::Build`] when the TLS backend cannot be initialised.
    pub fn new(config: &HubClientConfig) -> Result<Self, HttpError> {
        let base_url = config.base_url()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(HttpError::Build)?;
        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
            driver_key: config.driver_key.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("X-Auth-Token", &self.token)
    }

    async fn send(request: RequestBuilder) -> Result<Answer, HttpError> {
        let response = request.send().await.map_err(HttpError::Request)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(HttpError::Request)?;
        Ok(Answer { status, body })
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Answer, HttpError> {
        let mut request = self.request(method.clone(), path);
        if let Some(body) = body {
            request = request.json(body);
        }

        let answer = Self::send(request).await?;
        tracing::trace!(%method, path, status = answer.status, "hub call");
        Ok(answer)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, HttpError> {
        self.call(Method::POST, path, Some(body)).await?.into_result()
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, HttpError> {
        self.call(Method::PUT, path, Some(body)).await?.into_result()
    }

    async fn put_empty(&self, path: &str) -> Result<String, HttpError> {
        self.call::<()>(Method::PUT, path, None).await?.into_result()
    }

    async fn get(&self, path: &str) -> Result<String, HttpError> {
        self.call::<()>(Method::GET, path, None).await?.into_result()
    }

    async fn add_event_types_one_by_one(&self, event_types: &[EventType]) -> Result<(), HttpError> {
        for event_type in event_types {
            event_type.validate()?;
            let path = format!(
                "/objects/events/types/{}/{}",
                event_type.domain, event_type.event_type
            );
            let answer = self.call(Method::POST, &path, Some(event_type)).await?;
            if answer.status >= 400 && answer.body.contains(hublink_domain::error::DUPLICATE_ENTRY) {
                tracing::debug!(domain = %event_type.domain, event_type = %event_type.event_type, "event type already exists");
                continue;
            }
            answer.into_result()?;
        }
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, HttpError> {
    serde_json::from_str(body).map_err(HttpError::Decode)
}

#[async_trait]
impl HubClient for ReqwestHubClient {
    #[tracing::instrument(skip_all, fields(object_id = %object.metadata.object_id))]
    async fn create_object(&self, object: &ObjectDescriptor) -> Result<(), HubLinkError> {
        let metadata = &object.metadata;
        let body = json!({
            "id": metadata.object_id,
            "domain": metadata.domain,
            "name": metadata.name,
            "tags": metadata.tags,
            "type": metadata.object_type,
            "device_id": metadata.numeric_device_id(),
            "enabled": true,
            "states_available": object.available_states,
            "events_available": [],
            "actions_available": object.action_names(),
        });
        match self.call(Method::POST, "/objects", Some(&body)).await?.into_result() {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_domain();
                if err.is_already_exists() {
                    tracing::debug!("object already exists");
                    return Ok(());
                }
                Err(err)
            }
        }
    }

    async fn new_action(&self, action: &ObjectAction) -> Result<(), HubLinkError> {
        match self
            .call(Method::POST, "/objects/actions", Some(action))
            .await?
            .into_result()
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_domain();
                if err.is_already_exists() {
                    tracing::debug!(action = %action.action, domain = %action.domain, "action already exists");
                    return Ok(());
                }
                Err(err)
            }
        }
    }

    async fn set_state(&self, object_id: &ObjectId, state: &str) -> Result<(), HubLinkError> {
        let path = format!("/objects/states/{object_id}");
        match self.put(&path, &json!({ "state": state })).await {
            Ok(_) => Ok(()),
            Err(err) => {
                let err = err.into_domain();
                if err.is_object_disabled() {
                    tracing::debug!(%object_id, state, "state ignored, object is disabled");
                    return Ok(());
                }
                Err(err)
            }
        }
    }

    async fn update_state_attributes(
        &self,
        object_id: &ObjectId,
        attributes: &Attributes,
    ) -> Result<(), HubLinkError> {
        let path = format!("/objects/states/{object_id}");
        self.put(&path, &json!({ "state_additional_properties": attributes }))
            .await?;
        Ok(())
    }

    async fn update_state_attributes_batch(
        &self,
        changes: &[ObjectStateChange],
    ) -> Result<(), HubLinkError> {
        self.put("/objects/states_batch", &json!({ "changes": changes }))
            .await?;
        Ok(())
    }

    async fn set_objects_batch_state(
        &self,
        changes: &[ObjectStateChange],
    ) -> Result<Vec<StateChangeOutcome>, HubLinkError> {
        let body = self
            .put("/objects/states-batch", &json!({ "changes": changes }))
            .await?;
        let outcomes: Vec<StateChangeOutcome> = decode(&body)?;
        let refused: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.error.is_empty())
            .map(|o| format!("{}: {}", o.object_id, o.error))
            .collect();
        if !refused.is_empty() {
            return Err(HubLinkError::BatchFailed(refused.join(" | ")));
        }
        Ok(outcomes)
    }

    async fn update_result_attributes(
        &self,
        execution_id: &ExecutionId,
        attributes: &Attributes,
    ) -> Result<(), HubLinkError> {
        let path = format!("/objects/actions/executions/{execution_id}");
        self.put(&path, &json!({ "result": attributes })).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = event_types.len()))]
    async fn add_event_types(&self, event_types: &[EventType]) -> Result<(), HubLinkError> {
        if event_types.is_empty() {
            return Err(ValidationError::NoEventTypes.into());
        }

        for (index, batch) in event_types.chunks(EVENT_TYPE_BATCH_SIZE).enumerate() {
            let answer = self
                .call(Method::POST, "/objects/events/types/batch", Some(batch))
                .await?;
            match answer.status {
                404 => {
                    tracing::info!("batch endpoint unavailable, registering event types one by one");
                    let remaining = &event_types[index * EVENT_TYPE_BATCH_SIZE..];
                    return Ok(self.add_event_types_one_by_one(remaining).await?);
                }
                201 | 207 => {
                    let outcome: EventTypesBatchResponse = decode(&answer.body)?;
                    for failed in &outcome.failed {
                        tracing::error!(
                            domain = %failed.event_type.domain,
                            event_type = %failed.event_type.event_type,
                            "failed to create event type"
                        );
                    }
                    if outcome.all_failed() {
                        return Err(HubLinkError::BatchFailed(ALL_EVENT_TYPES_FAILED.to_string()));
                    }
                }
                status if status >= 400 => {
                    if answer.body.contains(ALL_EVENT_TYPES_FAILED) {
                        return Err(HubLinkError::BatchFailed(ALL_EVENT_TYPES_FAILED.to_string()));
                    }
                    return Err(HubLinkError::Rejected {
                        status,
                        body: answer.body,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    async fn increment(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.put_empty(&format!("/objects/states/{object_id}/increment"))
            .await?;
        Ok(())
    }

    async fn decrement(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.put_empty(&format!("/objects/states/{object_id}/decrement"))
            .await?;
        Ok(())
    }

    async fn get_state(&self, object_id: &ObjectId) -> Result<StateRecord, HubLinkError> {
        let body = self
            .get(&format!("/objects/states/{object_id}?limit=1"))
            .await?;
        let page: PaginatedStateRecords = decode(&body)?;
        Ok(page.into_latest())
    }

    async fn enable_object(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.put_empty(&format!("/objects/{object_id}/enabled"))
            .await?;
        Ok(())
    }

    async fn disable_object(&self, object_id: &ObjectId) -> Result<(), HubLinkError> {
        self.put_empty(&format!("/objects/{object_id}/disabled"))
            .await?;
        Ok(())
    }

    async fn dispatch_event(
        &self,
        domain: &str,
        event_key: &str,
        event: Event,
    ) -> Result<String, HubLinkError> {
        let request = NewEventRequest::new(domain, event_key, event);
        let body = self
            .call(Method::POST, "/objects/events", Some(&request))
            .await?
            .into_result()?;
        Ok(body)
    }

    async fn get_event(&self, event_id: &str) -> Result<EventRecord, HubLinkError> {
        let body = self.get(&format!("/objects/events/{event_id}")).await?;
        Ok(decode(&body)?)
    }

    async fn patch_event(&self, event_id: &str, patch: EventPatch) -> Result<(), HubLinkError> {
        let mut record = self.get_event(event_id).await?;
        record.apply(patch);
        self.put(&format!("/objects/events/{event_id}"), &record)
            .await?;
        Ok(())
    }

    async fn get_children(&self, parent_id: i64) -> Result<Vec<ChildDevice>, HubLinkError> {
        let request = self
            .request(Method::GET, &format!("/api/v1/get_childs/{parent_id}"))
            .header("Authorization", &self.driver_key);
        let body = Self::send(request).await?.into_result()?;
        let devices: Vec<ChildDevice> = decode(&body)?;
        Ok(devices
            .into_iter()
            .map(ChildDevice::with_child_id_from_params)
            .collect())
    }

    async fn write_log(&self, entry: &AuditLogEntry) -> Result<(), HubLinkError> {
        let request = self
            .request(Method::POST, "/devices/audit-logs")
            .bearer_auth(&self.token)
            .json(entry);
        Self::send(request).await?.into_result()?;
        Ok(())
    }

    async fn get_device_state(&self, device_id: i64) -> Result<DeviceStateRecord, HubLinkError> {
        let body = self.get(&format!("/devices/{device_id}/state")).await?;
        let records: Vec<DeviceStateRecord> = decode(&body)?;
        records.into_iter().next().ok_or_else(|| {
            NotFoundError {
                entity: "Device state",
                id: device_id.to_string(),
            }
            .into()
        })
    }

    async fn set_device_state(&self, device_id: i64, state: &str) -> Result<(), HubLinkError> {
        self.post(&format!("/devices/{device_id}/state"), &json!({ "state": state }))
            .await?;
        Ok(())
    }

    async fn rtsp_to_stream_id(&self, rtsp: &str, name: &str) -> Result<String, HubLinkError> {
        let body = self
            .post(
                "/objects/video-channels/encoded-sources",
                &json!({ "source": rtsp, "name": name }),
            )
            .await?;
        let source: EncodedSource = decode(&body)?;
        Ok(source.stream_id)
    }

    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    async fn upload_file(&self, file_name: &str, content: &[u8]) -> Result<String, HubLinkError> {
        let part = Part::bytes(content.to_vec()).file_name(file_name.to_string());
        let request = self
            .request(Method::POST, "/api/v1/upload")
            .header("Authorization", &self.driver_key)
            .multipart(Form::new().part("file", part));
        let body = Self::send(request).await?.into_result()?;
        let uploaded: UploadedFile = decode(&body)?;
        Ok(format!("{}/public/{}", self.base_url, uploaded.filename))
    }

    async fn hub_version(&self) -> Result<HubVersion, HubLinkError> {
        let body = self.get("/api/v1/version").await?;
        Ok(decode(&body)?)
    }
}
