//! ApiHooks against an in-memory HTTP client that records every request and
//! echoes it back as the response body.

use std::sync::Mutex;
use std::time::Duration;

use apiq_hooks::prelude::*;
use apiq_hooks::AliasKind;
use apiq_http::{RequestOptions, Response};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

type Responder = Box<dyn Fn(&RequestOptions) -> Result<Response, FetchError> + Send + Sync>;

struct MockHttp {
    requests: Mutex<Vec<RequestOptions>>,
    responder: Responder,
}

impl MockHttp {
    fn echo() -> Arc<Self> {
        Self::with_responder(|req| {
            Ok(Response::json_ok(&json!({
                "method": req.method.as_str(),
                "path": req.render_path()?,
                "params": req.params,
                "queries": req.queries,
                "body": req.body,
            })))
        })
    }

    fn with_responder(
        f: impl Fn(&RequestOptions) -> Result<Response, FetchError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(f),
        })
    }

    fn requests(&self) -> Vec<RequestOptions> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn request(&self, options: RequestOptions) -> Result<Response, FetchError> {
        self.requests.lock().unwrap().push(options.clone());
        tokio::time::sleep(Duration::from_millis(5)).await;
        (self.responder)(&options)
    }
}

fn registry() -> Arc<EndpointRegistry> {
    Arc::new(
        EndpointRegistry::new(vec![
            EndpointDescriptor::get("/users").with_alias("getUsers"),
            EndpointDescriptor::post("/users/search")
                .with_alias("searchUsers")
                .immutable(),
            EndpointDescriptor::get("/users/:id").with_alias("getUser"),
            EndpointDescriptor::get("/users/:id/address/:address").with_alias("getUserAddress"),
            EndpointDescriptor::post("/users").with_alias("createUser"),
            EndpointDescriptor::put("/users/:id").with_alias("updateUser"),
            EndpointDescriptor::patch("/users/:id").with_alias("patchUser"),
            EndpointDescriptor::delete("/users/:id").with_alias("deleteUser"),
        ])
        .unwrap(),
    )
}

fn bind(http: &Arc<MockHttp>, client: QueryClient) -> ApiHooks {
    let http: Arc<dyn HttpClient> = http.clone();
    ApiHooks::new("test", registry(), http, client)
}

fn long_lived_cache() -> QueryClient {
    QueryClient::new(QueryClientConfig::new().with_stale_time(Duration::from_secs(60)))
}

// === Keys ===

#[test]
fn test_key_by_path_equals_key_by_alias() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());
    let config = RequestConfig::new().param("id", 1);

    let by_path = hooks
        .key_by_path(Method::Get, "/users/:id", Some(&config))
        .unwrap();
    let by_alias = hooks.key_by_alias("getUser", Some(&config)).unwrap();

    assert_eq!(by_path, by_alias);
    assert_eq!(
        serde_json::to_value(&by_path).unwrap(),
        json!([{"api": "test", "path": "/users/:id"}, {"params": {"id": 1}}])
    );
}

#[test]
fn test_key_purity() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());
    let a = RequestConfig::new().query("page", 1).query("limit", 10);
    let b = RequestConfig::new().query("limit", 10).query("page", 1);
    assert_eq!(
        hooks.key_by_alias("getUsers", Some(&a)).unwrap(),
        hooks.key_by_alias("getUsers", Some(&b)).unwrap()
    );
}

#[test]
fn test_identity_key_is_strict_prefix() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());
    let identity = hooks.key_by_path(Method::Get, "/users/:id", None).unwrap();
    let full = hooks
        .key_by_path(Method::Get, "/users/:id", Some(&RequestConfig::new().param("id", 1)))
        .unwrap();

    assert_eq!(identity.len(), 1);
    assert!(full.starts_with(&identity));
    assert_ne!(full, identity);
}

#[test]
fn test_unknown_path() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());
    let err = hooks
        .key_by_path(Method::Get, "/users/:id/bad", None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No endpoint found for path 'get /users/:id/bad'"
    );

    let err = hooks
        .create_query::<Value>("/users/:id/bad", None, QueryOptions::new())
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "No endpoint found for path 'get /users/:id/bad'"
    );
}

#[test]
fn test_unknown_alias() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());
    let err = hooks.key_by_alias("getTest", None).unwrap_err();
    assert_eq!(err.to_string(), "No endpoint found for alias 'getTest'");

    let err = hooks
        .alias_query::<Value>("getTest", None, QueryOptions::new())
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "No endpoint found for alias 'getTest'");
}

// === Queries ===

#[tokio::test]
async fn test_query_fetches_with_full_config() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let config = RequestConfig::new()
        .param("id", 1)
        .param("address", "home")
        .header("Authorization", "Bearer token");

    let query = hooks
        .create_get::<Value>("/users/:id/address/:address", Some(config), QueryOptions::new())
        .unwrap();
    let state = query.fetch().await;

    assert!(state.is_success());
    assert_eq!(state.data().unwrap()["path"], "/users/1/address/home");
    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].headers["Authorization"], "Bearer token");
}

#[tokio::test]
async fn test_query_data_lands_under_its_key() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let config = RequestConfig::new().param("id", 3);

    let query = hooks
        .create_query::<Value>("/users/:id", Some(config.clone()), QueryOptions::new())
        .unwrap();
    query.fetch().await;

    let key = hooks.key_by_alias("getUser", Some(&config)).unwrap();
    assert_eq!(query.key(), &key);
    let cached = hooks.client().get_query_data::<Value>(&key).await.unwrap();
    assert_eq!(cached["path"], "/users/3");
}

#[tokio::test]
async fn test_identical_queries_share_one_request() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let build = || {
        hooks
            .create_query::<Value>("/users", Some(RequestConfig::new().query("page", 1)), QueryOptions::new())
            .unwrap()
    };
    let (a, b) = (build(), build());

    let (sa, sb) = tokio::join!(a.fetch(), b.fetch());
    assert_eq!(sa.data, sb.data);
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn test_disabled_query_never_requests() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let query = hooks
        .create_query::<Value>("/users", None, QueryOptions::new().enabled(false))
        .unwrap();

    query.fetch().await;
    assert!(http.requests().is_empty());
}

#[tokio::test]
async fn test_query_invalidate_drops_descendants() {
    let http = MockHttp::echo();
    let hooks = bind(&http, long_lived_cache());
    let one = hooks
        .create_query::<Value>("/users/:id", Some(RequestConfig::new().param("id", 1)), QueryOptions::new())
        .unwrap();
    let two = hooks
        .create_query::<Value>("/users/:id", Some(RequestConfig::new().param("id", 2)), QueryOptions::new())
        .unwrap();
    let all = hooks
        .create_query::<Value>("/users/:id", None, QueryOptions::new())
        .unwrap();

    one.fetch().await;
    two.fetch().await;
    assert!(!one.is_stale().await);

    assert_eq!(all.invalidate().await, 2);
    assert!(one.is_stale().await);
    assert!(two.is_stale().await);

    one.fetch().await;
    assert_eq!(http.requests().len(), 3);
}

// === Immutable queries ===

#[tokio::test]
async fn test_immutable_queries_keyed_by_body() {
    let http = MockHttp::echo();
    let hooks = bind(&http, long_lived_cache());

    let john = hooks
        .create_immutable_query::<Value>("/users/search", Some(json!({"name": "John"})), None, QueryOptions::new())
        .unwrap();
    let jane = hooks
        .create_immutable_query::<Value>("/users/search", Some(json!({"name": "Jane"})), None, QueryOptions::new())
        .unwrap();
    let identity = hooks
        .key_by_path(Method::Post, "/users/search", None)
        .unwrap();

    assert_ne!(john.key(), jane.key());
    assert!(john.key().starts_with(&identity));
    assert!(jane.key().starts_with(&identity));
    assert_eq!(
        serde_json::to_value(john.key()).unwrap(),
        json!([{"api": "test", "path": "/users/search"}, {}, {"name": "John"}])
    );

    let state = john.fetch().await;
    jane.fetch().await;
    assert_eq!(state.data().unwrap()["method"], "post");
    assert_eq!(state.data().unwrap()["body"], json!({"name": "John"}));

    assert_eq!(hooks.client().invalidate_queries(&identity).await, 2);
    assert!(john.is_stale().await);
    assert!(jane.is_stale().await);
}

#[tokio::test]
async fn test_absent_and_empty_config_share_one_entry() {
    let http = MockHttp::echo();
    let hooks = bind(&http, long_lived_cache());
    let bare = hooks
        .create_query::<Value>("/users", None, QueryOptions::new())
        .unwrap();
    let empty = hooks
        .create_query::<Value>("/users", Some(RequestConfig::new()), QueryOptions::new())
        .unwrap();
    assert_eq!(bare.key(), empty.key());
    assert!(bare.key().starts_with(&hooks.key_by_alias("getUsers", None).unwrap()));

    bare.fetch().await;
    let state = empty.fetch().await;
    assert!(state.is_success());
    assert_eq!(http.requests().len(), 1);
    assert_eq!(hooks.client().keys().await.len(), 1);
}

// === Paginated queries ===

fn next_page(last: &Value, _pages: &[Arc<Value>]) -> Option<PageFragment> {
    let page = last["queries"]["page"].as_i64()?;
    (page < 3).then(|| PageFragment::new().query("page", page + 1))
}

#[tokio::test]
async fn test_infinite_query_overrides_page() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let base = RequestConfig::new().query("page", 1).query("limit", 10);

    let users = hooks
        .create_infinite_query::<Value, _>(
            "/users",
            Some(base),
            PagingKeys::fixed(["page"]),
            next_page,
            QueryOptions::new(),
        )
        .unwrap();
    let key = users.key().clone();
    assert_eq!(
        serde_json::to_value(&key).unwrap(),
        json!([{"api": "test", "path": "/users"}, {"queries": {"limit": 10}}])
    );

    users.fetch().await;
    let state = users.fetch_next_page().await;
    assert_eq!(state.pages().len(), 2);
    assert!(users.has_next_page());

    let requests = http.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].queries.as_ref().unwrap()["page"], 1);
    assert_eq!(requests[1].queries.as_ref().unwrap()["page"], 2);
    assert_eq!(requests[1].queries.as_ref().unwrap()["limit"], 10);

    assert_eq!(users.key(), &key);
    assert_eq!(hooks.client().keys().await, vec![key]);
}

#[tokio::test]
async fn test_infinite_query_absent_and_empty_config_share_key() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let build = |config: Option<RequestConfig>| {
        hooks
            .create_infinite_query::<Value, _>(
                "/users",
                config,
                PagingKeys::fixed(["page"]),
                next_page,
                QueryOptions::new(),
            )
            .unwrap()
    };
    let bare = build(None);
    let empty = build(Some(RequestConfig::new()));
    assert_eq!(bare.key(), empty.key());
    assert_eq!(
        serde_json::to_value(bare.key()).unwrap(),
        json!([{"api": "test", "path": "/users"}, {}])
    );
}

#[tokio::test]
async fn test_infinite_query_stops_at_last_page() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let users = hooks
        .alias_infinite_query::<Value, _>(
            "createGetUsers",
            Some(RequestConfig::new().query("page", 1)),
            PagingKeys::fixed(["page"]),
            next_page,
            QueryOptions::new(),
        )
        .unwrap();

    users.fetch().await;
    users.fetch_next_page().await;
    users.fetch_next_page().await;
    assert!(!users.has_next_page());
    users.fetch_next_page().await;

    assert_eq!(users.state().pages().len(), 3);
    assert_eq!(http.requests().len(), 3);
}

#[tokio::test]
async fn test_immutable_infinite_query_merges_body() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let search = hooks
        .create_immutable_infinite_query::<Value, _>(
            "/users/search",
            Some(json!({"name": "John", "page": 1})),
            None,
            PagingKeys::fixed(["page"]),
            |last: &Value, _: &[Arc<Value>]| {
                let page = last["body"]["page"].as_i64()?;
                Some(PageFragment::new().body_field("page", page + 1))
            },
            QueryOptions::new(),
        )
        .unwrap();

    assert_eq!(
        serde_json::to_value(search.key()).unwrap(),
        json!([{"api": "test", "path": "/users/search"}, {}, {"name": "John"}])
    );

    search.fetch().await;
    search.fetch_next_page().await;

    let requests = http.requests();
    assert_eq!(requests[0].body, Some(json!({"name": "John", "page": 1})));
    assert_eq!(requests[1].body, Some(json!({"name": "John", "page": 2})));
    assert_eq!(requests[1].method, Method::Post);
}

#[test]
fn test_immutable_infinite_without_paging_keys_keeps_full_body() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());
    let search = hooks
        .create_immutable_infinite_query::<Value, _>(
            "/users/search",
            Some(json!({"name": "John", "page": 1})),
            None,
            PagingKeys::none(),
            |_: &Value, _: &[Arc<Value>]| None,
            QueryOptions::new(),
        )
        .unwrap();

    assert_eq!(
        search.key().segments()[2],
        json!({"name": "John", "page": 1})
    );
}

// === Mutations ===

#[derive(Debug, Clone, Serialize)]
struct NewUser {
    name: String,
}

#[tokio::test]
async fn test_mutation_issues_one_write() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let config = RequestConfig::new()
        .header("X-Api-Key", "secret")
        .query("notify", true);

    let create = hooks
        .create_post::<NewUser, Value>("/users", Some(config), MutationOptions::new())
        .unwrap();
    let result = create
        .mutate(NewUser {
            name: "John".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result["body"], json!({"name": "John"}));
    let requests = http.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path, "/users");
    assert_eq!(requests[0].body, Some(json!({"name": "John"})));
    assert_eq!(requests[0].headers["X-Api-Key"], "secret");
    assert_eq!(requests[0].queries.as_ref().unwrap()["notify"], true);
    assert!(create.state().is_success());
}

#[tokio::test]
async fn test_mutation_merges_static_body() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let config = RequestConfig::new()
        .param("id", 1)
        .with_body(json!({"role": "admin"}));

    let update = hooks
        .create_put::<Value, Value>("/users/:id", Some(config), MutationOptions::new())
        .unwrap();
    update.mutate(json!({"name": "John"})).await.unwrap();

    let requests = http.requests();
    assert_eq!(requests[0].method, Method::Put);
    assert_eq!(requests[0].render_path().unwrap(), "/users/1");
    assert_eq!(requests[0].body, Some(json!({"name": "John", "role": "admin"})));
}

#[tokio::test]
async fn test_each_mutate_is_one_request() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let patch = hooks
        .create_patch::<Value, Value>("/users/:id", Some(RequestConfig::new().param("id", 2)), MutationOptions::new())
        .unwrap();

    patch.mutate(json!({"name": "A"})).await.unwrap();
    patch.mutate(json!({"name": "B"})).await.unwrap();

    let bodies: Vec<_> = http.requests().into_iter().map(|r| r.body).collect();
    assert_eq!(bodies, vec![Some(json!({"name": "A"})), Some(json!({"name": "B"}))]);
}

#[tokio::test]
async fn test_mutation_invalidates_endpoint_reads() {
    let http = MockHttp::echo();
    let hooks = bind(&http, long_lived_cache());
    let user = hooks
        .create_query::<Value>("/users/:id", Some(RequestConfig::new().param("id", 1)), QueryOptions::new())
        .unwrap();
    user.fetch().await;

    let delete = hooks
        .create_delete::<(), Value>("/users/:id", Some(RequestConfig::new().param("id", 1)), MutationOptions::new())
        .unwrap();
    delete.mutate(()).await.unwrap();
    assert_eq!(http.requests()[1].body, None);
    assert!(!user.is_stale().await);

    assert_eq!(delete.invalidate().await, 1);
    assert!(user.is_stale().await);
}

#[tokio::test]
async fn test_mutation_options_invalidate_on_success() {
    let http = MockHttp::echo();
    let hooks = bind(&http, long_lived_cache());
    let users = hooks
        .create_query::<Value>("/users", Some(RequestConfig::new()), QueryOptions::new())
        .unwrap();
    users.fetch().await;

    let users_prefix = hooks.key_by_alias("getUsers", None).unwrap();
    let create = hooks
        .alias_mutation::<Value, Value>(
            "createCreateUser",
            None,
            MutationOptions::new().invalidates(users_prefix),
        )
        .unwrap();
    create.mutate(json!({"name": "John"})).await.unwrap();

    assert!(users.is_stale().await);
}

// === Errors ===

#[tokio::test]
async fn test_http_error_surfaces_in_state() {
    let http = MockHttp::with_responder(|_| {
        Err(FetchError::Http {
            status: 500,
            message: "boom".to_string(),
        })
    });
    let hooks = bind(&http, QueryClient::default());
    let query = hooks
        .create_query::<Value>("/users", None, QueryOptions::new())
        .unwrap();

    let state = query.fetch().await;
    assert!(state.is_error());
    assert_eq!(state.error.as_ref().and_then(FetchError::status), Some(500));
    assert_eq!(http.requests().len(), 1);
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct User {
    id: u32,
    name: String,
}

#[tokio::test]
async fn test_response_shape_mismatch_is_validation_error() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());
    let query = hooks
        .create_query::<User>("/users/:id", Some(RequestConfig::new().param("id", 1)), QueryOptions::new())
        .unwrap();

    let state = query.fetch().await;
    assert!(matches!(state.error, Some(FetchError::Validation(_))));
}

#[tokio::test]
async fn test_mutation_error_reaches_callbacks() {
    let http = MockHttp::with_responder(|_| {
        Err(FetchError::Transport("connection refused".to_string()))
    });
    let hooks = bind(&http, QueryClient::default());
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();

    let create = hooks
        .create_post::<Value, Value>(
            "/users",
            None,
            MutationOptions::<Value, Value, FetchError>::new()
                .on_error(move |err, _| *sink.lock().unwrap() = Some(err.clone())),
        )
        .unwrap();

    let err = create.mutate(json!({"name": "John"})).await.unwrap_err();
    assert_eq!(err, FetchError::Transport("connection refused".to_string()));
    assert_eq!(*seen.lock().unwrap(), Some(err));
    assert!(create.state().is_error());
}

// === Synthesized operations ===

#[test]
fn test_one_operation_per_alias() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());
    let ops = hooks.operations();
    assert_eq!(ops.len(), 8);
    assert_eq!(ops.get("createGetUser").unwrap().kind, AliasKind::Query);
    assert_eq!(
        ops.get("createSearchUsers").unwrap().kind,
        AliasKind::ImmutableQuery
    );
    for name in ["createCreateUser", "createUpdateUser", "createPatchUser", "createDeleteUser"] {
        assert_eq!(ops.get(name).unwrap().kind, AliasKind::Mutation);
    }
}

#[tokio::test]
async fn test_alias_operations_dispatch() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());

    let user = hooks
        .alias_query::<Value>("createGetUser", Some(RequestConfig::new().param("id", 1)), QueryOptions::new())
        .unwrap();
    assert_eq!(
        user.key(),
        &hooks
            .key_by_alias("getUser", Some(&RequestConfig::new().param("id", 1)))
            .unwrap()
    );
    user.fetch().await;

    let search = hooks
        .alias_immutable_query::<Value>("createSearchUsers", Some(json!({"name": "John"})), None, QueryOptions::new())
        .unwrap();
    search.fetch().await;

    let delete = hooks
        .alias_mutation::<(), Value>(
            "deleteUser",
            Some(RequestConfig::new().param("id", 1)),
            MutationOptions::new(),
        )
        .unwrap();
    delete.mutate(()).await.unwrap();

    let requests = http.requests();
    let calls: Vec<_> = requests
        .iter()
        .map(|r| format!("{} {}", r.method, r.render_path().unwrap()))
        .collect();
    assert_eq!(calls, vec!["get /users/1", "post /users/search", "delete /users/1"]);
}

#[test]
fn test_alias_shape_mismatch() {
    let hooks = bind(&MockHttp::echo(), QueryClient::default());

    let err = hooks
        .alias_query::<Value>("createCreateUser", None, QueryOptions::new())
        .err()
        .unwrap();
    assert_eq!(
        err,
        HooksError::AliasShape {
            name: "createCreateUser".to_string(),
            expected: AliasKind::Query,
            actual: AliasKind::Mutation,
        }
    );

    let err = hooks
        .alias_mutation::<Value, Value>("createSearchUsers", None, MutationOptions::new())
        .err()
        .unwrap();
    assert!(matches!(err, HooksError::AliasShape { actual: AliasKind::ImmutableQuery, .. }));
}

// === Typed endpoints ===

#[derive(Debug, Clone, Serialize)]
struct Search {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Echo {
    method: String,
    path: String,
    body: Option<Value>,
}

struct SearchUsers;

impl Endpoint for SearchUsers {
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/users/search";
    type Body = Search;
    type Response = Echo;
}

struct CreateUser;

impl Endpoint for CreateUser {
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/users";
    type Body = NewUser;
    type Response = Echo;
}

#[tokio::test]
async fn test_typed_endpoints() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());

    let search = hooks
        .endpoint_immutable_query::<SearchUsers>(
            &Search {
                name: "Jane".to_string(),
            },
            None,
            QueryOptions::new(),
        )
        .unwrap();
    let state = search.fetch().await;
    let echo = state.data().unwrap();
    assert_eq!(echo.method, "post");
    assert_eq!(echo.path, "/users/search");
    assert_eq!(echo.body, Some(json!({"name": "Jane"})));

    let create = hooks
        .endpoint_mutation::<CreateUser>(None, MutationOptions::new())
        .unwrap();
    let created = create
        .mutate(NewUser {
            name: "John".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.body, Some(json!({"name": "John"})));
}

#[test]
fn test_typed_endpoint_shape_is_checked() {
    let http = MockHttp::echo();
    let hooks = bind(&http, QueryClient::default());

    let err = hooks
        .endpoint_query::<CreateUser>(None, QueryOptions::new())
        .unwrap_err();
    assert_eq!(
        err,
        HooksError::AliasShape {
            name: "post /users".to_string(),
            expected: AliasKind::Query,
            actual: AliasKind::Mutation,
        }
    );

    let err = hooks
        .endpoint_mutation::<SearchUsers>(None, MutationOptions::new())
        .unwrap_err();
    assert!(matches!(
        err,
        HooksError::AliasShape {
            expected: AliasKind::Mutation,
            actual: AliasKind::ImmutableQuery,
            ..
        }
    ));

    let err = hooks
        .endpoint_immutable_query::<CreateUser>(
            &NewUser {
                name: "John".to_string(),
            },
            None,
            QueryOptions::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        HooksError::AliasShape {
            expected: AliasKind::ImmutableQuery,
            actual: AliasKind::Mutation,
            ..
        }
    ));
    assert!(http.requests().is_empty());
}
