//! # Test Doubles
//!
//! Two tools for testing code that talks to a `ResourceActor` through a `ResourceClient`:
//!
//! * **Mock channel** ([`create_mock_client`] + `expect_*`): the client sends into a
//!   channel the test owns, so the test plays the actor and scripts every reply.
//! * **[`FaultProxy`]**: sits between a client and a real actor and forwards requests,
//!   except for the ones the test marked to fail. Faults can refuse a request outright,
//!   lose it, or let it apply and drop the reply, which covers both definite and
//!   ambiguous store failures.
//!
//! ```text
//! let (actor, upstream) = ResourceActor::<Product>::new(32);
//! tokio::spawn(actor.run(()));
//! let (proxy, client) = FaultProxy::spawn(upstream);
//!
//! proxy.fail_nth(RequestKind::Replace, 2, Fault::DropReply);
//! // second replace issued through `client` lands but its reply is lost
//! ```

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{RequestKind, ResourceRequest, Response};
use crate::record::{Revision, Versioned, WriteTag};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

// =============================================================================
// MOCK CHANNEL HELPERS
// =============================================================================

/// Creates a mock client and a receiver for asserting requests.
///
/// Instead of spinning up a `ResourceActor`, the client sends into a channel the test
/// controls. The test inspects each request and answers through its `respond_to`,
/// simulating success, failure or a dropped reply deterministically.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<Versioned<T>>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// A captured Replace request.
pub struct ReplaceRequest<T: ActorEntity> {
    pub id: T::Id,
    pub expected: Revision,
    pub record: T,
    pub tag: WriteTag,
    pub respond_to: Response<Revision>,
}

/// Helper to verify that the next message is a Replace request
pub async fn expect_replace<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<ReplaceRequest<T>> {
    match receiver.recv().await {
        Some(ResourceRequest::Replace {
            id,
            expected,
            record,
            tag,
            respond_to,
        }) => Some(ReplaceRequest {
            id,
            expected,
            record,
            tag,
            respond_to,
        }),
        _ => None,
    }
}

// =============================================================================
// FAULT PROXY
// =============================================================================

/// What happens to a request selected for failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Answer [`FrameworkError::Unavailable`] without forwarding. Nothing is applied.
    Refuse,
    /// Swallow the request and drop its reply. Nothing is applied, but the caller only
    /// sees an ambiguous failure.
    Lose,
    /// Forward the request, wait until the actor has applied it, then drop the reply.
    DropReply,
}

#[derive(Debug)]
struct Rule {
    kind: RequestKind,
    /// `None` matches every request of `kind`.
    at: Option<usize>,
    fault: Fault,
}

#[derive(Debug, Default)]
struct ProxyState {
    rules: Vec<Rule>,
    seen: HashMap<RequestKind, usize>,
    injected: usize,
}

impl ProxyState {
    fn next_fault(&mut self, kind: RequestKind) -> Option<Fault> {
        let count = self.seen.entry(kind).or_insert(0);
        *count += 1;
        let count = *count;

        let index = self
            .rules
            .iter()
            .position(|rule| rule.kind == kind && rule.at.map_or(true, |at| at == count))?;
        let fault = if self.rules[index].at.is_some() {
            self.rules.remove(index).fault
        } else {
            self.rules[index].fault
        };
        self.injected += 1;
        Some(fault)
    }
}

/// Handle for steering a fault-injecting proxy task.
///
/// Requests are forwarded one at a time in arrival order. A `DropReply` fault waits for
/// the actor's answer before the next request is forwarded, so a re-read issued after an
/// ambiguous failure always observes the write.
#[derive(Clone)]
pub struct FaultProxy {
    state: Arc<Mutex<ProxyState>>,
}

impl FaultProxy {
    /// Starts a proxy in front of `upstream` and returns a client that routes through it.
    /// The returned client keeps `upstream`'s call timeout.
    pub fn spawn<T: ActorEntity>(upstream: ResourceClient<T>) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(upstream.sender().max_capacity());
        let proxy = Self {
            state: Arc::new(Mutex::new(ProxyState::default())),
        };
        let mut downstream = ResourceClient::new(sender);
        if let Some(limit) = upstream.call_timeout() {
            downstream = downstream.with_timeout(limit);
        }
        tokio::spawn(Self::forward(proxy.clone(), upstream, receiver));
        (proxy, downstream)
    }

    fn state(&self) -> MutexGuard<'_, ProxyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the `n`-th request of `kind` counted from now (1-based).
    pub fn fail_nth(&self, kind: RequestKind, n: usize, fault: Fault) {
        let mut state = self.state();
        let base = state.seen.get(&kind).copied().unwrap_or(0);
        state.rules.push(Rule {
            kind,
            at: Some(base + n),
            fault,
        });
    }

    /// Fail every request of `kind` until [`heal`](Self::heal) is called.
    pub fn fail_all(&self, kind: RequestKind, fault: Fault) {
        self.state().rules.push(Rule {
            kind,
            at: None,
            fault,
        });
    }

    /// Drop all pending fault rules.
    pub fn heal(&self) {
        self.state().rules.clear();
    }

    /// Number of requests of `kind` that reached the proxy.
    pub fn seen(&self, kind: RequestKind) -> usize {
        self.state().seen.get(&kind).copied().unwrap_or(0)
    }

    /// Number of faults injected so far.
    pub fn injected(&self) -> usize {
        self.state().injected
    }

    async fn forward<T: ActorEntity>(
        self,
        upstream: ResourceClient<T>,
        mut receiver: mpsc::Receiver<ResourceRequest<T>>,
    ) {
        while let Some(request) = receiver.recv().await {
            let kind = request.kind();
            let fault = self.state().next_fault(kind);
            match fault {
                None => {
                    if upstream.sender().send(request).await.is_err() {
                        break;
                    }
                }
                Some(Fault::Refuse) => {
                    warn!(?kind, "Injected fault: refused");
                    request.refuse(FrameworkError::Unavailable("injected fault".into()));
                }
                Some(Fault::Lose) => {
                    warn!(?kind, "Injected fault: lost");
                    drop(request);
                }
                Some(Fault::DropReply) => {
                    warn!(?kind, "Injected fault: reply dropped");
                    let (request, pending) = detach(request);
                    if upstream.sender().send(request).await.is_err() {
                        break;
                    }
                    pending.await;
                }
            }
        }
    }
}

type Pending = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Hold the original reply channel until the actor has answered the forwarded copy,
/// then drop both.
fn hold<R: Send + 'static>(
    reply: oneshot::Receiver<Result<R, FrameworkError>>,
    original: Response<R>,
) -> Pending {
    Box::pin(async move {
        let _ = reply.await;
        drop(original);
    })
}

/// Swap the request's reply channel for one the proxy owns.
fn detach<T: ActorEntity>(request: ResourceRequest<T>) -> (ResourceRequest<T>, Pending) {
    match request {
        ResourceRequest::Create { params, respond_to } => {
            let (tx, rx) = oneshot::channel();
            let forward = ResourceRequest::Create {
                params,
                respond_to: tx,
            };
            (forward, hold(rx, respond_to))
        }
        ResourceRequest::Get { id, respond_to } => {
            let (tx, rx) = oneshot::channel();
            let forward = ResourceRequest::Get { id, respond_to: tx };
            (forward, hold(rx, respond_to))
        }
        ResourceRequest::List { respond_to } => {
            let (tx, rx) = oneshot::channel();
            let forward = ResourceRequest::List { respond_to: tx };
            (forward, hold(rx, respond_to))
        }
        ResourceRequest::Update {
            id,
            update,
            respond_to,
        } => {
            let (tx, rx) = oneshot::channel();
            let forward = ResourceRequest::Update {
                id,
                update,
                respond_to: tx,
            };
            (forward, hold(rx, respond_to))
        }
        ResourceRequest::Replace {
            id,
            expected,
            record,
            tag,
            respond_to,
        } => {
            let (tx, rx) = oneshot::channel();
            let forward = ResourceRequest::Replace {
                id,
                expected,
                record,
                tag,
                respond_to: tx,
            };
            (forward, hold(rx, respond_to))
        }
        ResourceRequest::Delete { id, respond_to } => {
            let (tx, rx) = oneshot::channel();
            let forward = ResourceRequest::Delete { id, respond_to: tx };
            (forward, hold(rx, respond_to))
        }
        ResourceRequest::Action {
            id,
            action,
            respond_to,
        } => {
            let (tx, rx) = oneshot::channel();
            let forward = ResourceRequest::Action {
                id,
                action,
                respond_to: tx,
            };
            (forward, hold(rx, respond_to))
        }
    }
}
