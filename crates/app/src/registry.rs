//! Object registry and action dispatcher.
//!
//! Objects are grouped by domain. Registration creates the object and its
//! actions on the hub, announces the domain on the [`EventBus`] and hands the
//! object its hub client. Dispatch turns an action-execution request into one
//! task per addressed object and reports every outcome back to the hub.

use std::collections::HashMap;
use std::error::Error as _;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Semaphore;

use hublink_domain::action::ActionExecutionRequest;
use hublink_domain::attribute::{Attributes, error_result};
use hublink_domain::error::{HubLinkError, ValidationError};
use hublink_domain::id::{ExecutionId, ObjectId, SubscriptionId};

use crate::event_bus::{BusEvent, EventBus, Topic};
use crate::ports::{HubClient, RegistrableObject};

/// Limits applied to action handlers.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Deadline of a single `run_action` call.
    pub action_timeout: Duration,
    /// Handlers running at the same time, across all dispatches.
    pub max_concurrent_actions: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(30),
            max_concurrent_actions: 64,
        }
    }
}

/// Registered objects, keyed by domain, plus the dispatcher over them.
pub struct ObjectRegistry {
    hub: Arc<dyn HubClient>,
    bus: Arc<EventBus>,
    objects: RwLock<HashMap<String, Vec<Arc<dyn RegistrableObject>>>>,
    /// Ids whose registration is in flight, with their domain.
    pending: Mutex<HashMap<ObjectId, String>>,
    permits: Arc<Semaphore>,
    options: DispatchOptions,
}

impl ObjectRegistry {
    #[must_use]
    pub fn new(hub: Arc<dyn HubClient>, bus: Arc<EventBus>, options: DispatchOptions) -> Self {
        Self {
            hub,
            bus,
            objects: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            permits: Arc::new(Semaphore::new(options.max_concurrent_actions.max(1))),
            options,
        }
    }

    /// Register `object` with the hub and make it reachable by actions.
    ///
    /// Registering an id that is already present is not an error; the object
    /// is not inserted twice and its setup is not run again. When `setup`
    /// fails the object is removed again so a later call retries it.
    ///
    /// # Errors
    ///
    /// Returns [`HubLinkError::Validation`] when the metadata is invalid, the
    /// id is registered under another domain or is being registered by a
    /// concurrent call, a hub error when the object or one of its actions
    /// cannot be created, or the error of `setup`.
    #[tracing::instrument(skip_all, fields(object_id, domain))]
    pub async fn register_object(
        &self,
        object: Arc<dyn RegistrableObject>,
    ) -> Result<(), HubLinkError> {
        let descriptor = object.descriptor();
        let metadata = &descriptor.metadata;
        metadata.validate()?;
        tracing::Span::current()
            .record("object_id", metadata.object_id.as_str())
            .record("domain", metadata.domain.as_str());

        let claim = self.claim(&metadata.object_id, &metadata.domain)?;

        self.hub.create_object(&descriptor).await?;
        for action in &descriptor.available_actions {
            self.hub.new_action(action).await?;
        }

        let Claim::New(_reservation) = claim else {
            self.bus.publish(BusEvent::DomainRegistered {
                domain: metadata.domain.clone(),
            });
            tracing::debug!("object already registered, setup skipped");
            return Ok(());
        };

        self.insert(&metadata.domain, &object);
        self.bus.publish(BusEvent::DomainRegistered {
            domain: metadata.domain.clone(),
        });

        if let Err(err) = object.setup(Arc::clone(&self.hub)).await {
            self.remove(&metadata.domain, &metadata.object_id);
            return Err(err);
        }
        tracing::info!(
            actions = descriptor.available_actions.len(),
            "object registered"
        );
        Ok(())
    }

    /// Subscribe the dispatcher to action-execution requests on the bus.
    pub fn listen(self: &Arc<Self>) -> SubscriptionId {
        let registry = Arc::clone(self);
        self.bus
            .subscribe(Topic::ActionExecutionRequested, move |event| {
                let registry = Arc::clone(&registry);
                async move {
                    if let BusEvent::ActionExecutionRequested(data) = event {
                        registry.dispatch(data);
                    }
                }
            })
    }

    /// Run an action-execution request on every addressed object.
    ///
    /// Returns immediately; each handler runs in its own task.
    pub fn dispatch(&self, data: serde_json::Value) {
        let request: ActionExecutionRequest = match serde_json::from_value(data) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "malformed action execution request");
                return;
            }
        };

        if request.domain.is_empty() {
            tracing::warn!(execution_id = %request.id, "action execution request without domain");
            return;
        }

        let targets = self.targets(&request);
        if targets.is_empty() {
            tracing::warn!(
                execution_id = %request.id,
                domain = %request.domain,
                action = %request.action,
                "no registered object addressed by action"
            );
            return;
        }

        tracing::debug!(
            execution_id = %request.id,
            domain = %request.domain,
            action = %request.action,
            targets = targets.len(),
            "dispatching action"
        );

        for object in targets {
            self.spawn_handler(object, &request);
        }
    }

    /// Objects registered under `domain`, in registration order.
    #[must_use]
    pub fn objects_in(&self, domain: &str) -> Vec<Arc<dyn RegistrableObject>> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .cloned()
            .unwrap_or_default()
    }

    /// Every domain with at least one registered object.
    #[must_use]
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        domains.sort();
        domains
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve `object_id` for `domain` unless it is already registered.
    fn claim(&self, object_id: &ObjectId, domain: &str) -> Result<Claim<'_>, HubLinkError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(owner) = pending.get(object_id) {
            if owner != domain {
                return Err(mismatch(object_id, owner.clone()));
            }
            return Err(ValidationError::RegistrationInProgress(object_id.to_string()).into());
        }

        let registered = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(_, list)| list.iter().any(|o| o.metadata().object_id == *object_id))
            .map(|(owner, _)| owner.clone());
        match registered {
            Some(owner) if owner != domain => Err(mismatch(object_id, owner)),
            Some(_) => Ok(Claim::Existing),
            None => {
                pending.insert(object_id.clone(), domain.to_string());
                Ok(Claim::New(Reservation {
                    pending: &self.pending,
                    object_id: object_id.clone(),
                }))
            }
        }
    }

    fn insert(&self, domain: &str, object: &Arc<dyn RegistrableObject>) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(domain.to_string())
            .or_default()
            .push(Arc::clone(object));
    }

    fn remove(&self, domain: &str, object_id: &ObjectId) {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = objects.get_mut(domain) {
            list.retain(|o| o.metadata().object_id != *object_id);
            if list.is_empty() {
                objects.remove(domain);
            }
        }
    }

    fn targets(&self, request: &ActionExecutionRequest) -> Vec<Arc<dyn RegistrableObject>> {
        self.objects_in(&request.domain)
            .into_iter()
            .filter(|object| request.targets(&object.metadata().object_id))
            .collect()
    }

    fn spawn_handler(&self, object: Arc<dyn RegistrableObject>, request: &ActionExecutionRequest) {
        let hub = Arc::clone(&self.hub);
        let permits = Arc::clone(&self.permits);
        let deadline = self.options.action_timeout;
        let execution_id = request.id.clone();
        let action = request.action.clone();
        let payload = request.payload.clone();
        let object_id = object.metadata().object_id;

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let attributes = run_with_deadline(object, &execution_id, action, payload, deadline).await;
            if attributes.contains_key("error") {
                tracing::warn!(%execution_id, %object_id, result = ?attributes, "action failed");
            } else {
                tracing::debug!(%execution_id, %object_id, "action succeeded");
            }
            if let Err(err) = hub.update_result_attributes(&execution_id, &attributes).await {
                tracing::error!(%execution_id, %object_id, error = %describe(&err), "failed to report action result");
            }
        });
    }
}

enum Claim<'a> {
    New(Reservation<'a>),
    Existing,
}

/// Releases a pending id when the registration that claimed it ends.
struct Reservation<'a> {
    pending: &'a Mutex<HashMap<ObjectId, String>>,
    object_id: ObjectId,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.object_id);
    }
}

fn mismatch(object_id: &ObjectId, domain: String) -> HubLinkError {
    ValidationError::DomainMismatch {
        object_id: object_id.to_string(),
        domain,
    }
    .into()
}

async fn run_with_deadline(
    object: Arc<dyn RegistrableObject>,
    execution_id: &ExecutionId,
    action: String,
    payload: serde_json::Value,
    deadline: Duration,
) -> Attributes {
    let id = execution_id.clone();
    let handle =
        tokio::spawn(async move { object.run_action(&id, &action, &payload).await });
    let abort = handle.abort_handle();

    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(Ok(attributes))) => attributes,
        Ok(Ok(Err(err))) => error_result(describe(&err)),
        Ok(Err(join_err)) => error_result(format!("action handler panicked: {join_err}")),
        Err(_) => {
            abort.abort();
            error_result(HubLinkError::Timeout(deadline).to_string())
        }
    }
}

/// `err` and its sources, joined with `: `.
fn describe(err: &HubLinkError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use hublink_domain::attribute::single;
    use hublink_domain::object::{ObjectAction, ObjectMetadata};

    use crate::testing::{HubCall, RecordingHubClient};

    enum Behaviour {
        Succeed,
        Fail,
        Hang,
        Panic,
    }

    struct FakeObject {
        metadata: ObjectMetadata,
        behaviour: Behaviour,
        runs: AtomicUsize,
        setups: AtomicUsize,
        failing_setups: AtomicUsize,
    }

    impl FakeObject {
        fn new(id: &str, domain: &str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                metadata: ObjectMetadata::builder()
                    .object_id(id)
                    .name(id)
                    .domain(domain)
                    .build()
                    .unwrap(),
                behaviour,
                runs: AtomicUsize::new(0),
                setups: AtomicUsize::new(0),
                failing_setups: AtomicUsize::new(0),
            })
        }

        fn failing_setup_once(id: &str, domain: &str) -> Arc<Self> {
            let object = Self::new(id, domain, Behaviour::Succeed);
            object.failing_setups.store(1, Ordering::SeqCst);
            object
        }
    }

    #[async_trait]
    impl RegistrableObject for FakeObject {
        fn metadata(&self) -> ObjectMetadata {
            self.metadata.with_type("fake")
        }

        fn available_states(&self) -> Vec<String> {
            vec!["fake.state.on".to_string()]
        }

        fn available_actions(&self) -> Vec<ObjectAction> {
            self.metadata.actions(&["fake.action.run", "fake.action.stop"])
        }

        async fn setup(&self, _hub: Arc<dyn HubClient>) -> Result<(), HubLinkError> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .failing_setups
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if failing.is_ok() {
                return Err(HubLinkError::handler("device offline"));
            }
            Ok(())
        }

        async fn run_action(
            &self,
            _execution_id: &ExecutionId,
            _action: &str,
            _payload: &serde_json::Value,
        ) -> Result<Attributes, HubLinkError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => Ok(single("ran", self.metadata.object_id.as_str())),
                Behaviour::Fail => Err(HubLinkError::handler("relay unreachable")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Attributes::new())
                }
                Behaviour::Panic => panic!("handler bug"),
            }
        }

        async fn set_state(&self, _state: &str) -> Result<(), HubLinkError> {
            Ok(())
        }

        async fn update_state_attributes(&self, _attributes: Attributes) -> Result<(), HubLinkError> {
            Ok(())
        }
    }

    fn registry_with(options: DispatchOptions) -> (Arc<ObjectRegistry>, Arc<RecordingHubClient>, Arc<EventBus>) {
        let hub = Arc::new(RecordingHubClient::new());
        let bus = Arc::new(EventBus::new());
        let registry = Arc::new(ObjectRegistry::new(
            Arc::clone(&hub) as Arc<dyn HubClient>,
            Arc::clone(&bus),
            options,
        ));
        (registry, hub, bus)
    }

    fn registry() -> (Arc<ObjectRegistry>, Arc<RecordingHubClient>, Arc<EventBus>) {
        registry_with(DispatchOptions::default())
    }

    fn request(id: &str, domain: &str, object_ids: &[&str]) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "domain": domain,
            "action": "fake.action.run",
            "object_id": object_ids,
            "payload": {}
        })
    }

    #[tokio::test]
    async fn should_create_object_and_actions_then_setup() {
        let (registry, hub, _) = registry();
        let object = FakeObject::new("a", "fake", Behaviour::Succeed);

        registry.register_object(object.clone()).await.unwrap();

        let calls = hub.calls();
        assert!(matches!(&calls[0], HubCall::CreateObject(d) if d.metadata.object_type == "fake"));
        assert_eq!(calls[1], HubCall::NewAction(ObjectAction::new("fake.action.run", "fake")));
        assert_eq!(calls[2], HubCall::NewAction(ObjectAction::new("fake.action.stop", "fake")));
        assert_eq!(object.setups.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn should_not_duplicate_object_registered_twice() {
        let (registry, _, _) = registry();
        let object = FakeObject::new("a", "fake", Behaviour::Succeed);

        registry.register_object(object.clone()).await.unwrap();
        registry.register_object(object.clone()).await.unwrap();

        assert_eq!(registry.objects_in("fake").len(), 1);
        assert_eq!(object.setups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_reject_same_id_in_another_domain() {
        let (registry, _, _) = registry();
        registry
            .register_object(FakeObject::new("a", "fake", Behaviour::Succeed))
            .await
            .unwrap();

        let result = registry
            .register_object(FakeObject::new("a", "other", Behaviour::Succeed))
            .await;

        assert!(matches!(
            result,
            Err(HubLinkError::Validation(ValidationError::DomainMismatch { .. }))
        ));
        assert_eq!(registry.domains(), vec!["fake".to_string()]);
    }

    #[tokio::test]
    async fn should_abort_registration_when_create_object_fails() {
        let (registry, hub, _) = registry();
        hub.fail_create_object(500, "boom");
        let object = FakeObject::new("a", "fake", Behaviour::Succeed);

        let result = registry.register_object(object.clone()).await;

        assert!(matches!(result, Err(HubLinkError::Rejected { status: 500, .. })));
        assert!(registry.is_empty());
        assert_eq!(object.setups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_retry_setup_after_failed_registration() {
        let (registry, _, _) = registry();
        let object = FakeObject::failing_setup_once("a", "fake");

        let first = registry.register_object(object.clone()).await;
        assert!(matches!(first, Err(HubLinkError::Handler(_))));
        assert!(registry.is_empty());

        registry.register_object(object.clone()).await.unwrap();
        assert_eq!(object.setups.load(Ordering::SeqCst), 2);
        assert_eq!(registry.objects_in("fake").len(), 1);
    }

    #[tokio::test]
    async fn should_reject_other_domain_while_registration_in_flight() {
        let (registry, hub, _) = registry();
        let id = ObjectId::from("a");
        let reservation = registry.claim(&id, "light").unwrap();

        let other = registry
            .register_object(FakeObject::new("a", "switch", Behaviour::Succeed))
            .await;
        assert!(matches!(
            other,
            Err(HubLinkError::Validation(ValidationError::DomainMismatch { ref domain, .. })) if domain == "light"
        ));
        let same = registry
            .register_object(FakeObject::new("a", "light", Behaviour::Succeed))
            .await;
        assert!(matches!(
            same,
            Err(HubLinkError::Validation(ValidationError::RegistrationInProgress(_)))
        ));
        assert!(hub.calls().is_empty());

        drop(reservation);
        registry
            .register_object(FakeObject::new("a", "switch", Behaviour::Succeed))
            .await
            .unwrap();
        assert_eq!(registry.domains(), vec!["switch".to_string()]);
    }

    #[tokio::test]
    async fn should_announce_domain_on_bus() {
        let (registry, _, bus) = registry();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        bus.subscribe(Topic::DomainRegistered, move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
            }
        });

        registry
            .register_object(FakeObject::new("a", "fake", Behaviour::Succeed))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(BusEvent::DomainRegistered {
                domain: "fake".to_string()
            })
        );
    }

    #[tokio::test]
    async fn should_broadcast_to_every_object_of_domain() {
        let (registry, hub, _) = registry();
        let objects: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|id| FakeObject::new(id, "fake", Behaviour::Succeed))
            .collect();
        for object in &objects {
            registry.register_object(object.clone()).await.unwrap();
        }

        registry.dispatch(request("exec-1", "fake", &[]));

        let results = hub.wait_for_results(3).await;
        assert_eq!(results.len(), 3);
        for object in &objects {
            assert_eq!(object.runs.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn should_run_only_addressed_object() {
        let (registry, hub, _) = registry();
        let a = FakeObject::new("a", "fake", Behaviour::Succeed);
        let b = FakeObject::new("b", "fake", Behaviour::Succeed);
        registry.register_object(a.clone()).await.unwrap();
        registry.register_object(b.clone()).await.unwrap();

        registry.dispatch(request("exec-1", "fake", &["b"]));

        let results = hub.wait_for_results(1).await;
        assert_eq!(results[0].0.as_str(), "exec-1");
        assert_eq!(results[0].1, single("ran", "b"));
        assert_eq!(a.runs.load(Ordering::SeqCst), 0);
        assert_eq!(b.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_report_error_key_when_handler_fails() {
        let (registry, hub, _) = registry();
        registry
            .register_object(FakeObject::new("a", "fake", Behaviour::Fail))
            .await
            .unwrap();

        registry.dispatch(request("exec-2", "fake", &["a"]));

        let results = hub.wait_for_results(1).await;
        assert_eq!(results[0].1, error_result("relay unreachable"));
    }

    #[tokio::test]
    async fn should_report_error_when_handler_panics() {
        let (registry, hub, _) = registry();
        registry
            .register_object(FakeObject::new("a", "fake", Behaviour::Panic))
            .await
            .unwrap();

        registry.dispatch(request("exec-3", "fake", &["a"]));

        let results = hub.wait_for_results(1).await;
        assert!(results[0].1.contains_key("error"));
    }

    #[tokio::test]
    async fn should_report_timeout_when_handler_exceeds_deadline() {
        let (registry, hub, _) = registry_with(DispatchOptions {
            action_timeout: Duration::from_millis(20),
            max_concurrent_actions: 4,
        });
        registry
            .register_object(FakeObject::new("a", "fake", Behaviour::Hang))
            .await
            .unwrap();

        registry.dispatch(request("exec-4", "fake", &["a"]));

        let results = hub.wait_for_results(1).await;
        assert!(results[0].1.contains_key("error"));
    }

    #[tokio::test]
    async fn should_ignore_unknown_domain_and_malformed_payload() {
        let (registry, hub, _) = registry();
        registry
            .register_object(FakeObject::new("a", "fake", Behaviour::Succeed))
            .await
            .unwrap();

        registry.dispatch(request("exec-5", "unknown", &[]));
        registry.dispatch(request("exec-6", "", &[]));
        registry.dispatch(serde_json::json!("not an object"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(hub.results().is_empty());
    }

    #[tokio::test]
    async fn should_dispatch_requests_published_on_bus() {
        let (registry, hub, bus) = registry();
        registry.listen();
        registry
            .register_object(FakeObject::new("a", "fake", Behaviour::Succeed))
            .await
            .unwrap();

        bus.publish(BusEvent::ActionExecutionRequested(request("exec-7", "fake", &[])));

        let results = hub.wait_for_results(1).await;
        assert_eq!(results[0].0.as_str(), "exec-7");
    }

    #[test]
    fn should_describe_error_with_sources() {
        let err = HubLinkError::from(ValidationError::EmptyDomain);
        assert_eq!(describe(&err), "validation error: domain must not be empty");
    }
}
