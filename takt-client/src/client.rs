use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dev::DevBackend;
use crate::domain::{
    Category, CategoryStats, DateRangeFilter, EntryFilter, Session, StatsSummary, Tag, TaktFilter,
    Task, TopTask,
};
use crate::dto::{NewCategory, NewTask, StartTimerRequest, StopTimerRequest, UpsertEntryRequest};
use crate::TaktUrl;

/// HTTP client for the remote time-tracking data store.
///
/// Cheap to clone; clones share the underlying connection pool, so spawned
/// fetch tasks can each hold their own handle.
#[derive(Debug, Clone)]
pub struct TaktClient {
    http: reqwest::Client,
    base_url: TaktUrl,
    dev: Option<DevBackend>,
}

impl TaktClient {
    pub fn new(base_url: &str) -> Result<Self, TaktFetchError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TaktFetchError::ResponseError(e.to_string()))?;
        Ok(Self {
            http,
            base_url: TaktUrl::new(base_url),
            dev: None,
        })
    }

    /// A client backed by an in-memory store instead of a server.
    pub fn dev() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: TaktUrl::new("http://localhost"),
            dev: Some(DevBackend::new()),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: TaktUrl) -> Result<T, TaktFetchError> {
        tracing::debug!(url = url.as_ref(), "GET");
        let resp = self
            .http
            .get(url.as_ref())
            .send()
            .await
            .map_err(|e| TaktFetchError::ResponseError(e.to_string()))?;
        Self::into_json(resp).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        body: &impl Serialize,
    ) -> Result<T, TaktFetchError> {
        let resp = request
            .json(body)
            .send()
            .await
            .map_err(|e| TaktFetchError::ResponseError(e.to_string()))?;
        Self::into_json(resp).await
    }

    async fn into_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TaktFetchError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TaktFetchError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        resp.json::<T>().await.map_err(|e| {
            TaktFetchError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })
    }

    /// GET /entries/running/ returns the running session, if any.
    pub async fn running_session(&self) -> Result<Option<Session>, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.running_session());
        }
        let url = self.base_url.append_path("/entries/running/");
        self.fetch(url).await
    }

    /// POST /entries/start_timer/ starts a session; the backend stops
    /// any session still running first.
    pub async fn start_timer(&self, req: &StartTimerRequest) -> Result<Session, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.start_timer(req));
        }
        let url = self.base_url.append_path("/entries/start_timer/");
        self.send_json(self.http.post(url.as_ref()), req).await
    }

    /// POST /entries/stop_timer/ finalizes the entry; the returned
    /// session carries the server-computed duration.
    pub async fn stop_timer(&self, entry_id: i64) -> Result<Session, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return dev.stop_timer(entry_id).ok_or(TaktFetchError::ApiError {
                status: 404,
                message: "timer not found or already stopped".to_string(),
            });
        }
        let url = self.base_url.append_path("/entries/stop_timer/");
        self.send_json(self.http.post(url.as_ref()), &StopTimerRequest { entry_id })
            .await
    }

    /// GET /entries/ with the given filter.
    pub async fn sessions(&self, filter: &EntryFilter) -> Result<Vec<Session>, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.sessions(filter));
        }
        let url = self.base_url.append_path("/entries/").with_filter(filter);
        let list: ListResponse<Session> = self.fetch(url).await?;
        Ok(list.into_vec())
    }

    /// POST /entries/ creates a manually entered session.
    pub async fn create_session(&self, req: &UpsertEntryRequest) -> Result<Session, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.create_entry(req));
        }
        let url = self.base_url.append_path("/entries/");
        self.send_json(self.http.post(url.as_ref()), req).await
    }

    /// PUT /entries/{id}/
    pub async fn update_session(
        &self,
        entry_id: i64,
        req: &UpsertEntryRequest,
    ) -> Result<Session, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return dev
                .update_entry(entry_id, req)
                .ok_or(TaktFetchError::ApiError {
                    status: 404,
                    message: "entry not found".to_string(),
                });
        }
        let url = self
            .base_url
            .append_path(&format!("/entries/{}/", entry_id));
        self.send_json(self.http.put(url.as_ref()), req).await
    }

    /// DELETE /entries/{id}/
    pub async fn delete_session(&self, entry_id: i64) -> Result<(), TaktFetchError> {
        if let Some(dev) = &self.dev {
            dev.delete_entry(entry_id);
            return Ok(());
        }
        let url = self
            .base_url
            .append_path(&format!("/entries/{}/", entry_id));
        let resp = self
            .http
            .delete(url.as_ref())
            .send()
            .await
            .map_err(|e| TaktFetchError::ResponseError(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TaktFetchError::ApiError {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// GET /categories/tree/ returns the full category tree.
    pub async fn category_tree(&self) -> Result<Vec<Category>, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.category_tree());
        }
        let url = self.base_url.append_path("/categories/tree/");
        self.fetch(url).await
    }

    /// POST /categories/
    pub async fn create_category(&self, req: &NewCategory) -> Result<Category, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.create_category(req));
        }
        let url = self.base_url.append_path("/categories/");
        self.send_json(self.http.post(url.as_ref()), req).await
    }

    /// GET /categories/{id}/stats/ returns historical aggregates for the
    /// category and its descendants.
    pub async fn category_stats(&self, category_id: i64) -> Result<CategoryStats, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.category_stats(category_id));
        }
        let url = self
            .base_url
            .append_path(&format!("/categories/{}/stats/", category_id));
        self.fetch(url).await
    }

    /// GET /tasks/?category_id={id}
    pub async fn tasks(&self, category_id: Option<i64>) -> Result<Vec<Task>, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.tasks(category_id));
        }
        let mut url = self.base_url.append_path("/tasks/");
        if let Some(id) = category_id {
            url = url.with_query(&[("category_id", id.to_string())]);
        }
        let list: ListResponse<Task> = self.fetch(url).await?;
        Ok(list.into_vec())
    }

    /// POST /tasks/
    pub async fn create_task(&self, req: &NewTask) -> Result<Task, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.create_task(req));
        }
        let url = self.base_url.append_path("/tasks/");
        self.send_json(self.http.post(url.as_ref()), req).await
    }

    /// GET /tags/
    pub async fn tags(&self) -> Result<Vec<Tag>, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.tags());
        }
        let url = self.base_url.append_path("/tags/");
        let list: ListResponse<Tag> = self.fetch(url).await?;
        Ok(list.into_vec())
    }

    /// GET /entries/stats_summary/?from&to
    pub async fn stats_summary(
        &self,
        range: &DateRangeFilter,
    ) -> Result<StatsSummary, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.stats_summary(range.from, range.to));
        }
        let url = self
            .base_url
            .append_path("/entries/stats_summary/")
            .with_filter(range);
        self.fetch(url).await
    }

    /// GET /entries/top_tasks/?from&to&limit
    pub async fn top_tasks(
        &self,
        range: &DateRangeFilter,
        limit: usize,
    ) -> Result<Vec<TopTask>, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.top_tasks(range.from, range.to, limit));
        }
        let url = self
            .base_url
            .append_path("/entries/top_tasks/")
            .with_filter(range)
            .with_query(&[("limit", limit.to_string())]);
        self.fetch(url).await
    }

    /// GET /entries/export_csv/?from&to returns a raw CSV export of the period.
    pub async fn export_csv(&self, range: &DateRangeFilter) -> Result<String, TaktFetchError> {
        if let Some(dev) = &self.dev {
            return Ok(dev.export_csv(range.from, range.to));
        }
        let url = self
            .base_url
            .append_path("/entries/export_csv/")
            .with_filter(range);
        tracing::debug!(url = url.as_ref(), "GET");
        let resp = self
            .http
            .get(url.as_ref())
            .send()
            .await
            .map_err(|e| TaktFetchError::ResponseError(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TaktFetchError::ApiError {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        resp.text()
            .await
            .map_err(|e| TaktFetchError::ParsingError(e.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum TaktFetchError {
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
    #[error("ApiError: status {status}: {message}")]
    ApiError { status: u16, message: String },
}

/// List endpoints may return a bare array or a paginated envelope with a
/// `results` key; both are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> ListResponse<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Paged { results } => results,
            ListResponse::Plain(list) => list,
        }
    }
}
