//! The data provider: nine async operations over an injected transport.
//!
//! # Design
//! `DataProvider` pairs a stateless `ODataClient` with an `HttpClient`. Each
//! operation builds its request(s), sends them, and parses the response(s);
//! identifier normalization happens inside the client's `parse_*` methods.
//! Bulk operations the backend has no endpoint for (`update_many`,
//! `delete_many`) fan out one request per id and join them with
//! `try_join_all`: all requests are in flight at once, the first failure
//! fails the whole operation, and results keep input-id order.

use futures::future::try_join_all;
use tracing::{debug, instrument, warn};

use crate::client::ODataClient;
use crate::config::ProviderConfig;
use crate::error::ApiError;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::identifier::{normalized, ID_FIELD};
use crate::transport::UreqTransport;
use crate::types::{
    CreateParams, DeleteManyParams, DeleteManyResult, DeleteParams, GetListParams, GetManyParams,
    GetManyReferenceParams, GetOneParams, ListResult, ManyResult, Record, RecordResult, UpdateManyParams,
    UpdateManyResult, UpdateParams,
};

pub struct DataProvider<C = UreqTransport> {
    client: ODataClient,
    http: C,
}

impl DataProvider<UreqTransport> {
    /// Provider over the default `ureq` transport.
    pub fn new(api_url: &str) -> Self {
        Self::with_client(api_url, UreqTransport::new())
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::with_client(&config.api_url, UreqTransport::with_timeout(config.timeout))
    }
}

impl<C: HttpClient> DataProvider<C> {
    pub fn with_client(api_url: &str, http: C) -> Self {
        Self {
            client: ODataClient::new(api_url),
            http,
        }
    }

    /// `total` is the length of the returned page, not a backend count.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn get_list(&self, resource: &str, params: GetListParams) -> Result<ListResult, ApiError> {
        let request = self.client.build_get_list(resource, &params);
        let data = self.client.parse_list(self.send(request).await?)?;
        Ok(ListResult {
            total: data.len(),
            data,
        })
    }

    #[instrument(skip_all, fields(resource = %resource, id = %params.id))]
    pub async fn get_one(&self, resource: &str, params: GetOneParams) -> Result<RecordResult, ApiError> {
        let request = self.client.build_get_one(resource, &params.id);
        let data = self.client.parse_record(self.send(request).await?)?;
        Ok(RecordResult { data })
    }

    /// One batched `$filter=Id in (...)` request.
    #[instrument(skip_all, fields(resource = %resource, count = params.ids.len()))]
    pub async fn get_many(&self, resource: &str, params: GetManyParams) -> Result<ManyResult, ApiError> {
        let request = self.client.build_get_many(resource, &params.ids);
        let data = self.client.parse_list(self.send(request).await?)?;
        Ok(ManyResult { data })
    }

    #[instrument(skip_all, fields(resource = %resource, target = %params.target))]
    pub async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> Result<ListResult, ApiError> {
        let request = self.client.build_get_many_reference(resource, &params.target, &params.id);
        let data = self.client.parse_list(self.send(request).await?)?;
        Ok(ListResult {
            total: data.len(),
            data,
        })
    }

    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn create(&self, resource: &str, params: CreateParams) -> Result<RecordResult, ApiError> {
        let request = self.client.build_create(resource, &params.data)?;
        let data = self.client.parse_record(self.send(request).await?)?;
        Ok(RecordResult { data })
    }

    /// The backend answers PUT without a body, so the result echoes the sent
    /// data (minus `id`), normalized.
    #[instrument(skip_all, fields(resource = %resource, id = %params.id))]
    pub async fn update(&self, resource: &str, params: UpdateParams) -> Result<RecordResult, ApiError> {
        let UpdateParams { id, mut data } = params;
        data.shift_remove(ID_FIELD);
        let request = self.client.build_update(resource, &id, &data)?;
        self.client.parse_empty(self.send(request).await?)?;
        Ok(RecordResult {
            data: normalized(data),
        })
    }

    /// One PUT per id, all with the same body. Returns each response's `Id`.
    #[instrument(skip_all, fields(resource = %resource, count = params.ids.len()))]
    pub async fn update_many(&self, resource: &str, params: UpdateManyParams) -> Result<UpdateManyResult, ApiError> {
        let UpdateManyParams { ids, data } = params;
        let requests = ids
            .iter()
            .map(|id| self.client.build_update(resource, id, &data))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(width = requests.len(), "fanning out updates");

        let data = try_join_all(requests.into_iter().map(|request| async move {
            let response = self.send(request).await?;
            self.client.parse_identifier(response)
        }))
        .await?;
        Ok(UpdateManyResult { data })
    }

    /// Echoes `previous_data` when given, otherwise a record holding `id`.
    #[instrument(skip_all, fields(resource = %resource, id = %params.id))]
    pub async fn delete(&self, resource: &str, params: DeleteParams) -> Result<RecordResult, ApiError> {
        let DeleteParams { id, previous_data } = params;
        let request = self.client.build_delete(resource, &id);
        self.client.parse_empty(self.send(request).await?)?;

        let data = match previous_data {
            Some(previous) => normalized(previous),
            None => {
                let mut record = Record::new();
                record.insert(ID_FIELD.to_string(), id.to_value());
                record
            }
        };
        Ok(RecordResult { data })
    }

    /// One DELETE per id. The backend confirms nothing, so success echoes the
    /// ids.
    #[instrument(skip_all, fields(resource = %resource, count = params.ids.len()))]
    pub async fn delete_many(&self, resource: &str, params: DeleteManyParams) -> Result<DeleteManyResult, ApiError> {
        let DeleteManyParams { ids } = params;
        debug!(width = ids.len(), "fanning out deletes");

        try_join_all(ids.iter().map(|id| async move {
            let response = self.send(self.client.build_delete(resource, id)).await?;
            self.client.parse_empty(response)
        }))
        .await?;
        Ok(DeleteManyResult { data: ids })
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "dispatching request");
        let response = self
            .http
            .request(request)
            .await
            .inspect_err(|e| warn!(error = %e, "request failed"))?;
        if !response.is_success() {
            warn!(status = response.status, "backend returned an error status");
        }
        Ok(response)
    }
}
