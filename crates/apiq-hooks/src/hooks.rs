//! Endpoint-to-operation binding.

use std::fmt;
use std::sync::Arc;

use apiq_cache::{InfiniteQuery, Mutation, MutationOptions, Query, QueryClient, QueryOptions};
use apiq_core::{
    CacheKey, EndpointDescriptor, EndpointRegistry, Method, NotFoundError, PageFragment,
    RequestConfig,
};
use apiq_http::{FetchError, HttpClient, RequestOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::alias::{AliasKind, AliasOperation, AliasTable};
use crate::error::HooksError;
use crate::key::{derive_immutable_key, derive_key, derive_query_key};
use crate::operations::{ApiInfiniteQuery, ApiMutation, ApiQuery};
use crate::pagination::{merge_maps, PageMerger, PagingKeys};
use crate::typed::Endpoint;

/// One API bound to an HTTP client and a query cache.
///
/// Every operation it builds derives its cache key from the API name and
/// the endpoint path, fetches through the shared [`HttpClient`] and stores
/// results in the shared [`QueryClient`]. Building an operation is
/// synchronous and never touches the network.
#[derive(Clone)]
pub struct ApiHooks {
    api: String,
    registry: Arc<EndpointRegistry>,
    http: Arc<dyn HttpClient>,
    client: QueryClient,
    aliases: Arc<AliasTable>,
}

impl fmt::Debug for ApiHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiHooks")
            .field("api", &self.api)
            .field("endpoints", &self.registry.len())
            .field("operations", &self.aliases.len())
            .finish_non_exhaustive()
    }
}

impl ApiHooks {
    /// Bind `registry` under the name `api` and synthesize the alias
    /// operations.
    pub fn new(
        api: impl Into<String>,
        registry: Arc<EndpointRegistry>,
        http: Arc<dyn HttpClient>,
        client: QueryClient,
    ) -> Self {
        let api = api.into();
        let aliases = Arc::new(AliasTable::build(&registry));
        debug!(api = %api, endpoints = registry.len(), operations = aliases.len(), "Bound API");
        Self {
            api,
            registry,
            http,
            client,
            aliases,
        }
    }

    /// The API name used as the `api` field of every key.
    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn http(&self) -> &Arc<dyn HttpClient> {
        &self.http
    }

    /// The synthesized `create<Alias>` operations.
    pub fn operations(&self) -> &AliasTable {
        &self.aliases
    }

    // === Keys ===

    /// Key of the endpoint declaring `method` and `path`.
    pub fn key_by_path(
        &self,
        method: Method,
        path: &str,
        config: Option<&RequestConfig>,
    ) -> Result<CacheKey, NotFoundError> {
        let endpoint = self.registry.by_path(method, path)?;
        Ok(derive_key(&self.api, endpoint, config))
    }

    /// Key of the endpoint declaring `alias`.
    pub fn key_by_alias(
        &self,
        alias: &str,
        config: Option<&RequestConfig>,
    ) -> Result<CacheKey, NotFoundError> {
        let endpoint = self.registry.by_alias(alias)?;
        Ok(derive_key(&self.api, endpoint, config))
    }

    // === Queries ===

    /// Query a `get` endpoint.
    pub fn create_query<T>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> Result<ApiQuery<T>, NotFoundError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let endpoint = self.registry.by_path(Method::Get, path)?;
        Ok(self.build_query(endpoint, config, options))
    }

    /// Same as [`ApiHooks::create_query`].
    pub fn create_get<T>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> Result<ApiQuery<T>, NotFoundError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.create_query(path, config, options)
    }

    /// Query a `post` endpoint whose body is a read parameter.
    ///
    /// The body is part of the key: different bodies are cached separately
    /// under the same endpoint prefix. Falls back to the configuration's
    /// body when `body` is `None`.
    pub fn create_immutable_query<T>(
        &self,
        path: &str,
        body: Option<Value>,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> Result<ApiQuery<T>, NotFoundError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let endpoint = self.registry.by_path(Method::Post, path)?;
        Ok(self.build_immutable_query(endpoint, body, config, options))
    }

    /// Paginated query of a `get` endpoint.
    ///
    /// The first page is fetched with `config` as given. Each further page
    /// merges the fragment returned by `get_next_page_param` over it. Fields
    /// named by `paging_keys` are left out of the key.
    pub fn create_infinite_query<T, N>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        paging_keys: PagingKeys,
        get_next_page_param: N,
        options: QueryOptions,
    ) -> Result<ApiInfiniteQuery<T>, NotFoundError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<PageFragment> + Send + Sync + 'static,
    {
        let endpoint = self.registry.by_path(Method::Get, path)?;
        Ok(self.build_infinite_query(endpoint, config, paging_keys, get_next_page_param, options))
    }

    /// Paginated immutable query: like [`ApiHooks::create_infinite_query`]
    /// but POSTs the body, and fragments may override body fields.
    pub fn create_immutable_infinite_query<T, N>(
        &self,
        path: &str,
        body: Option<Value>,
        config: Option<RequestConfig>,
        paging_keys: PagingKeys,
        get_next_page_param: N,
        options: QueryOptions,
    ) -> Result<ApiInfiniteQuery<T>, NotFoundError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<PageFragment> + Send + Sync + 'static,
    {
        let endpoint = self.registry.by_path(Method::Post, path)?;
        Ok(self.build_immutable_infinite_query(
            endpoint,
            body,
            config,
            paging_keys,
            get_next_page_param,
            options,
        ))
    }

    // === Mutations ===

    /// Write to the endpoint declaring `method` and `path`.
    ///
    /// Each `mutate(variables)` issues one request whose body is the
    /// serialized variables. When both the variables and the static
    /// configuration body are objects, they are merged with the variables
    /// winning; `()` variables send the configuration body.
    pub fn create_mutation<V, T>(
        &self,
        method: Method,
        path: &str,
        config: Option<RequestConfig>,
        options: MutationOptions<V, T, FetchError>,
    ) -> Result<ApiMutation<V, T>, NotFoundError>
    where
        V: Serialize + Clone + Send + Sync + 'static,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let endpoint = self.registry.by_path(method, path)?;
        Ok(self.build_mutation(endpoint, config, options))
    }

    pub fn create_post<V, T>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        options: MutationOptions<V, T, FetchError>,
    ) -> Result<ApiMutation<V, T>, NotFoundError>
    where
        V: Serialize + Clone + Send + Sync + 'static,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.create_mutation(Method::Post, path, config, options)
    }

    pub fn create_put<V, T>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        options: MutationOptions<V, T, FetchError>,
    ) -> Result<ApiMutation<V, T>, NotFoundError>
    where
        V: Serialize + Clone + Send + Sync + 'static,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.create_mutation(Method::Put, path, config, options)
    }

    pub fn create_patch<V, T>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        options: MutationOptions<V, T, FetchError>,
    ) -> Result<ApiMutation<V, T>, NotFoundError>
    where
        V: Serialize + Clone + Send + Sync + 'static,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.create_mutation(Method::Patch, path, config, options)
    }

    pub fn create_delete<V, T>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
        options: MutationOptions<V, T, FetchError>,
    ) -> Result<ApiMutation<V, T>, NotFoundError>
    where
        V: Serialize + Clone + Send + Sync + 'static,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.create_mutation(Method::Delete, path, config, options)
    }

    // === Synthesized operations ===

    /// Run a synthesized query operation (`createGetUser` or `getUser`).
    pub fn alias_query<T>(
        &self,
        name: &str,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> Result<ApiQuery<T>, HooksError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let op = self.alias_operation(name, AliasKind::Query)?;
        Ok(self.build_query(&op.endpoint, config, options))
    }

    /// Run a synthesized query operation as a paginated query.
    pub fn alias_infinite_query<T, N>(
        &self,
        name: &str,
        config: Option<RequestConfig>,
        paging_keys: PagingKeys,
        get_next_page_param: N,
        options: QueryOptions,
    ) -> Result<ApiInfiniteQuery<T>, HooksError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<PageFragment> + Send + Sync + 'static,
    {
        let op = self.alias_operation(name, AliasKind::Query)?;
        Ok(self.build_infinite_query(&op.endpoint, config, paging_keys, get_next_page_param, options))
    }

    /// Run a synthesized immutable query operation.
    pub fn alias_immutable_query<T>(
        &self,
        name: &str,
        body: Option<Value>,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> Result<ApiQuery<T>, HooksError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let op = self.alias_operation(name, AliasKind::ImmutableQuery)?;
        Ok(self.build_immutable_query(&op.endpoint, body, config, options))
    }

    /// Run a synthesized immutable query operation as a paginated query.
    pub fn alias_immutable_infinite_query<T, N>(
        &self,
        name: &str,
        body: Option<Value>,
        config: Option<RequestConfig>,
        paging_keys: PagingKeys,
        get_next_page_param: N,
        options: QueryOptions,
    ) -> Result<ApiInfiniteQuery<T>, HooksError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<PageFragment> + Send + Sync + 'static,
    {
        let op = self.alias_operation(name, AliasKind::ImmutableQuery)?;
        Ok(self.build_immutable_infinite_query(
            &op.endpoint,
            body,
            config,
            paging_keys,
            get_next_page_param,
            options,
        ))
    }

    /// Run a synthesized mutation operation.
    pub fn alias_mutation<V, T>(
        &self,
        name: &str,
        config: Option<RequestConfig>,
        options: MutationOptions<V, T, FetchError>,
    ) -> Result<ApiMutation<V, T>, HooksError>
    where
        V: Serialize + Clone + Send + Sync + 'static,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let op = self.alias_operation(name, AliasKind::Mutation)?;
        Ok(self.build_mutation(&op.endpoint, config, options))
    }

    fn alias_operation(&self, name: &str, expected: AliasKind) -> Result<&AliasOperation, HooksError> {
        let op = self
            .aliases
            .get(name)
            .ok_or_else(|| NotFoundError::Alias(name.to_string()))?;
        if op.kind != expected {
            return Err(HooksError::AliasShape {
                name: op.name.clone(),
                expected,
                actual: op.kind,
            });
        }
        Ok(op)
    }

    // === Typed endpoints ===

    /// Query a typed endpoint.
    pub fn endpoint_query<E: Endpoint>(
        &self,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> Result<ApiQuery<E::Response>, HooksError> {
        let endpoint = self.typed_endpoint::<E>(AliasKind::Query)?;
        Ok(self.build_query(endpoint, config, options))
    }

    /// Immutable query of a typed endpoint with a typed body.
    pub fn endpoint_immutable_query<E: Endpoint>(
        &self,
        body: &E::Body,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> Result<ApiQuery<E::Response>, HooksError> {
        let endpoint = self.typed_endpoint::<E>(AliasKind::ImmutableQuery)?;
        let body = serde_json::to_value(body).map_err(|e| HooksError::InvalidBody(e.to_string()))?;
        Ok(self.build_immutable_query(endpoint, Some(body), config, options))
    }

    /// Mutation of a typed endpoint; variables are its body type.
    pub fn endpoint_mutation<E: Endpoint>(
        &self,
        config: Option<RequestConfig>,
        options: MutationOptions<E::Body, E::Response, FetchError>,
    ) -> Result<ApiMutation<E::Body, E::Response>, HooksError> {
        let endpoint = self.typed_endpoint::<E>(AliasKind::Mutation)?;
        Ok(self.build_mutation(endpoint, config, options))
    }

    fn typed_endpoint<E: Endpoint>(&self, expected: AliasKind) -> Result<&EndpointDescriptor, HooksError> {
        let endpoint = self.registry.by_path(E::METHOD, E::PATH)?;
        let actual = AliasKind::of(endpoint);
        if actual != expected {
            return Err(HooksError::AliasShape {
                name: format!("{} {}", E::METHOD, E::PATH),
                expected,
                actual,
            });
        }
        Ok(endpoint)
    }

    // === Builders ===

    fn build_query<T>(
        &self,
        endpoint: &EndpointDescriptor,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> ApiQuery<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let config = config.unwrap_or_default();
        let key = derive_query_key(&self.api, endpoint, &config);
        debug!(key = %key, "Built query");
        let request = RequestOptions::from_config(endpoint.method, endpoint.path.as_str(), &config);
        let http = self.http.clone();
        let query = Query::new(self.client.clone(), key, options, move || {
            send::<T>(http.clone(), request.clone())
        });
        ApiQuery::new(endpoint.clone(), query)
    }

    fn build_immutable_query<T>(
        &self,
        endpoint: &EndpointDescriptor,
        body: Option<Value>,
        config: Option<RequestConfig>,
        options: QueryOptions,
    ) -> ApiQuery<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let config = config.unwrap_or_default();
        let body = body.or_else(|| config.body.clone());
        let key = derive_immutable_key(&self.api, endpoint, Some(&config), body.as_ref());
        debug!(key = %key, "Built immutable query");
        let request = RequestOptions::from_config(endpoint.method, endpoint.path.as_str(), &config)
            .with_body(body);
        let http = self.http.clone();
        let query = Query::new(self.client.clone(), key, options, move || {
            send::<T>(http.clone(), request.clone())
        });
        ApiQuery::new(endpoint.clone(), query)
    }

    fn build_infinite_query<T, N>(
        &self,
        endpoint: &EndpointDescriptor,
        config: Option<RequestConfig>,
        paging_keys: PagingKeys,
        get_next_page_param: N,
        options: QueryOptions,
    ) -> ApiInfiniteQuery<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<PageFragment> + Send + Sync + 'static,
    {
        let merger = PageMerger::new(config.unwrap_or_default(), paging_keys);
        let key = CacheKey::identity(self.api.as_str(), endpoint.path.as_str())
            .with_params(&merger.key_params());
        self.paginate(endpoint, key, merger, get_next_page_param, options)
    }

    fn build_immutable_infinite_query<T, N>(
        &self,
        endpoint: &EndpointDescriptor,
        body: Option<Value>,
        config: Option<RequestConfig>,
        paging_keys: PagingKeys,
        get_next_page_param: N,
        options: QueryOptions,
    ) -> ApiInfiniteQuery<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<PageFragment> + Send + Sync + 'static,
    {
        let mut base = config.unwrap_or_default();
        if body.is_some() {
            base.body = body;
        }
        let merger = PageMerger::with_body(base, paging_keys);
        let key = CacheKey::identity(self.api.as_str(), endpoint.path.as_str())
            .with_params(&merger.key_params());
        let key = match merger.key_body() {
            Some(body) => key.with_body(body),
            None => key,
        };
        self.paginate(endpoint, key, merger, get_next_page_param, options)
    }

    fn paginate<T, N>(
        &self,
        endpoint: &EndpointDescriptor,
        key: CacheKey,
        merger: PageMerger,
        get_next_page_param: N,
        options: QueryOptions,
    ) -> ApiInfiniteQuery<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
        N: Fn(&T, &[Arc<T>]) -> Option<PageFragment> + Send + Sync + 'static,
    {
        debug!(key = %key, "Built infinite query");
        let http = self.http.clone();
        let method = endpoint.method;
        let path = endpoint.path.clone();
        let query = InfiniteQuery::new(
            self.client.clone(),
            key,
            options,
            move |fragment: Option<PageFragment>| {
                let config = merger.merge(fragment.as_ref());
                let request = RequestOptions::from_config(method, path.as_str(), &config);
                send::<T>(http.clone(), request)
            },
            get_next_page_param,
        );
        ApiInfiniteQuery::new(endpoint.clone(), query)
    }

    fn build_mutation<V, T>(
        &self,
        endpoint: &EndpointDescriptor,
        config: Option<RequestConfig>,
        options: MutationOptions<V, T, FetchError>,
    ) -> ApiMutation<V, T>
    where
        V: Serialize + Clone + Send + Sync + 'static,
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let key = derive_key(&self.api, endpoint, None);
        debug!(key = %key, method = %endpoint.method, "Built mutation");
        let http = self.http.clone();
        let method = endpoint.method;
        let path = endpoint.path.clone();
        let config = config.unwrap_or_default();
        let mutation = Mutation::new(self.client.clone(), options, move |variables: V| {
            let http = http.clone();
            let request = serde_json::to_value(&variables).map(|vars| {
                RequestOptions::from_config(method, path.as_str(), &config)
                    .with_body(mutation_body(vars, config.body.as_ref()))
            });
            async move {
                match request {
                    Ok(request) => send::<T>(http, request).await,
                    Err(err) => Err(FetchError::from(err)),
                }
            }
        });
        ApiMutation::new(endpoint.clone(), key, mutation)
    }
}

/// Issue one request and decode the response.
async fn send<T: DeserializeOwned>(
    http: Arc<dyn HttpClient>,
    request: RequestOptions,
) -> Result<T, FetchError> {
    http.request(request).await?.json()
}

/// The request body for one mutation call.
fn mutation_body(variables: Value, static_body: Option<&Value>) -> Option<Value> {
    match (variables, static_body) {
        (Value::Null, base) => base.cloned(),
        (Value::Object(vars), Some(Value::Object(base))) => {
            merge_maps(Some(base), Some(&vars)).map(Value::Object)
        }
        (vars, _) => Some(vars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mutation_body_merges_objects() {
        assert_eq!(
            mutation_body(json!({"name": "John"}), Some(&json!({"role": "admin", "name": "x"}))),
            Some(json!({"name": "John", "role": "admin"}))
        );
    }

    #[test]
    fn test_mutation_body_unit_uses_static_body() {
        assert_eq!(mutation_body(Value::Null, None), None);
        assert_eq!(
            mutation_body(Value::Null, Some(&json!({"a": 1}))),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_mutation_body_non_object_replaces() {
        assert_eq!(
            mutation_body(json!([1, 2]), Some(&json!({"a": 1}))),
            Some(json!([1, 2]))
        );
        assert_eq!(mutation_body(json!("x"), None), Some(json!("x")));
    }
}
