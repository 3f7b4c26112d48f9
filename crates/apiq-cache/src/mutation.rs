//! Mutations: writes with lifecycle callbacks.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use apiq_core::CacheKey;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tracing::debug;

use crate::client::QueryClient;
use crate::retry::RetryPolicy;
use crate::state::{MutationState, MutationStatus};

/// A boxed mutation function.
pub type MutationFn<V, T, E> = Arc<dyn Fn(V) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

type SuccessFn<V, T> = Arc<dyn Fn(&T, &V) + Send + Sync>;
type ErrorFn<V, E> = Arc<dyn Fn(&E, &V) + Send + Sync>;
type SettledFn<V, T, E> = Arc<dyn Fn(Option<&T>, Option<&E>, &V) + Send + Sync>;

/// Callbacks and retry settings for a [`Mutation`].
pub struct MutationOptions<V, T, E> {
    on_success: Option<SuccessFn<V, T>>,
    on_error: Option<ErrorFn<V, E>>,
    on_settled: Option<SettledFn<V, T, E>>,
    retry: RetryPolicy,
    invalidates: Vec<CacheKey>,
}

impl<V, T, E> Default for MutationOptions<V, T, E> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
            on_settled: None,
            retry: RetryPolicy::none(),
            invalidates: Vec::new(),
        }
    }
}

impl<V, T, E> Clone for MutationOptions<V, T, E> {
    fn clone(&self) -> Self {
        Self {
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
            on_settled: self.on_settled.clone(),
            retry: self.retry.clone(),
            invalidates: self.invalidates.clone(),
        }
    }
}

impl<V, T, E> MutationOptions<V, T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the result and the variables after a successful write.
    pub fn on_success(mut self, f: impl Fn(&T, &V) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Called with the error and the variables after a failed write.
    pub fn on_error(mut self, f: impl Fn(&E, &V) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Called after every write, successful or not.
    pub fn on_settled(
        mut self,
        f: impl Fn(Option<&T>, Option<&E>, &V) + Send + Sync + 'static,
    ) -> Self {
        self.on_settled = Some(Arc::new(f));
        self
    }

    /// Mutations do not retry unless asked to.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Invalidate `prefix` after every successful write.
    pub fn invalidates(mut self, prefix: CacheKey) -> Self {
        self.invalidates.push(prefix);
        self
    }
}

/// A write operation. Each [`Mutation::mutate`] call runs the mutation
/// function once (plus retries, if configured).
pub struct Mutation<V, T, E> {
    client: QueryClient,
    mutate_fn: MutationFn<V, T, E>,
    options: MutationOptions<V, T, E>,
    state: watch::Sender<MutationState<T, E>>,
}

impl<V, T, E> Mutation<V, T, E> {
    pub fn client(&self) -> &QueryClient {
        &self.client
    }
}

impl<V, T, E> Mutation<V, T, E>
where
    V: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    pub fn new<F, Fut>(client: QueryClient, options: MutationOptions<V, T, E>, mutate_fn: F) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let mutate_fn: MutationFn<V, T, E> = Arc::new(move |vars| mutate_fn(vars).boxed());
        let (state, _) = watch::channel(MutationState::idle());
        Self {
            client,
            mutate_fn,
            options,
            state,
        }
    }

    pub fn state(&self) -> MutationState<T, E> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState<T, E>> {
        self.state.subscribe()
    }

    /// Back to idle, forgetting the last result.
    pub fn reset(&self) {
        self.state.send_replace(MutationState::idle());
    }

    /// Run the mutation with `variables`.
    pub async fn mutate(&self, variables: V) -> Result<Arc<T>, E> {
        self.state.send_modify(|s| {
            s.status = MutationStatus::Pending;
            s.error = None;
        });

        let mutate_fn = self.mutate_fn.clone();
        let result = self
            .options
            .retry
            .run(|| mutate_fn(variables.clone()))
            .await
            .map(Arc::new)
            .map_err(|(err, _)| err);

        match &result {
            Ok(data) => {
                for prefix in &self.options.invalidates {
                    self.client.invalidate_queries(prefix).await;
                }
                if let Some(on_success) = &self.options.on_success {
                    on_success(data, &variables);
                }
                if let Some(on_settled) = &self.options.on_settled {
                    on_settled(Some(data), None, &variables);
                }
            }
            Err(err) => {
                debug!(error = ?err, "Mutation failed");
                if let Some(on_error) = &self.options.on_error {
                    on_error(err, &variables);
                }
                if let Some(on_settled) = &self.options.on_settled {
                    on_settled(None, Some(err), &variables);
                }
            }
        }

        let snapshot = result.clone();
        self.state.send_modify(|s| match snapshot {
            Ok(data) => {
                s.status = MutationStatus::Success;
                s.data = Some(data);
            }
            Err(err) => {
                s.status = MutationStatus::Error;
                s.error = Some(err);
            }
        });
        result
    }
}
