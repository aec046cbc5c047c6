//! HTTP implementation of [`TaskApi`] backed by reqwest.

use std::time::Duration;

use url::Url;

use taskboard_proto::api::{CreateTaskRequest, TaskWithRefs, UpdateTaskRequest};
use taskboard_proto::task::TaskId;

use super::{ApiError, TaskApi};

/// Persistence client for the real task API server.
///
/// The base URL should end with a trailing slash (e.g.
/// `http://127.0.0.1:9400/`) so endpoint paths join cleanly.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTaskApi {
    /// Creates a client against the given base URL with a per-request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn collection_url(&self) -> Result<Url, ApiError> {
        Ok(self.base_url.join("api/tasks")?)
    }

    fn task_url(&self, task_id: &TaskId) -> Result<Url, ApiError> {
        Ok(self.base_url.join(&format!("api/tasks/{task_id}"))?)
    }
}

/// Returns the response if its status is a success, otherwise the status
/// as an [`ApiError`].
fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
        })
    }
}

impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<TaskWithRefs>, ApiError> {
        let response = self.client.get(self.collection_url()?).send().await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskWithRefs, ApiError> {
        let response = self
            .client
            .post(self.collection_url()?)
            .json(request)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn update_task(
        &self,
        task_id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> Result<TaskWithRefs, ApiError> {
        let response = self
            .client
            .put(self.task_url(task_id)?)
            .json(request)
            .send()
            .await?;
        Ok(check_status(response)?.json().await?)
    }

    async fn delete_task(&self, task_id: &TaskId) -> Result<(), ApiError> {
        let response = self.client.delete(self.task_url(task_id)?).send().await?;
        check_status(response).map(|_| ())
    }
}
