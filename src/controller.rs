// Lifecycle controller - destroy-then-create orchestration per control
//
// `initialize` is the only entry point and is always safe to call: it
// destroys any prior instance for the control before creating the next one,
// so a control never ends up with duplicate hooks or double attachment.
// Steps run under the registry lock with no await points inside, which
// serializes concurrent initialize calls for the same control.
//
// User interaction flows back in through the SelectHandle the host receives
// at attach time: keystrokes (debounced search), scroll-to-load, open-focus,
// and selection changes. Handles are epoch-bound - a handle from a destroyed
// instance goes silent instead of double-firing alongside its replacement.

use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::binder::{resolve_binding_target, SelectionBinder, StateSink};
use crate::config::SelectConfig;
use crate::error::SelectError;
use crate::events::{EventPublisher, SelectEvent};
use crate::options::{OptionItem, SearchPage, SearchRequest};
use crate::registry::InstanceRegistry;
use crate::remote::RemoteSource;
use crate::source::{OptionSource, StaticSource};
use crate::widget::{SearchState, WidgetHost, WidgetInstance, WidgetOptions};

/// Orchestrates widget lifecycles for one page/document
pub struct SelectController {
    pub(crate) inner: Arc<ControllerInner>,
}

pub(crate) struct ControllerInner {
    pub(crate) host: Arc<dyn WidgetHost>,
    pub(crate) sink: Arc<dyn StateSink>,
    pub(crate) registry: Mutex<InstanceRegistry>,
    pub(crate) events: EventPublisher,
    next_epoch: AtomicU64,
}

impl SelectController {
    /// Controller with no event observer attached
    pub fn new(host: Arc<dyn WidgetHost>, sink: Arc<dyn StateSink>) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                host,
                sink,
                registry: Mutex::new(InstanceRegistry::new()),
                events: EventPublisher::disabled(),
                next_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Controller paired with an event stream for host observability
    pub fn with_event_channel(
        host: Arc<dyn WidgetHost>,
        sink: Arc<dyn StateSink>,
        capacity: usize,
    ) -> (Self, tokio::sync::mpsc::Receiver<SelectEvent>) {
        let (events, rx) = EventPublisher::channel(capacity);
        let controller = Self {
            inner: Arc::new(ControllerInner {
                host,
                sink,
                registry: Mutex::new(InstanceRegistry::new()),
                events,
                next_epoch: AtomicU64::new(0),
            }),
        };
        (controller, rx)
    }

    /// Initialize (or re-initialize) the control described by `config`.
    ///
    /// The option source is chosen from the config: a remote adapter when
    /// `remote_url` is present, the static option list otherwise.
    pub fn initialize(&self, config: SelectConfig) -> Result<SelectHandle, SelectError> {
        self.inner.initialize(config)
    }

    /// Initialize with a caller-supplied option source instead of the
    /// config-derived one. This is the seam for custom data sources.
    pub fn initialize_with_source(
        &self,
        config: SelectConfig,
        source: Arc<dyn OptionSource>,
    ) -> Result<SelectHandle, SelectError> {
        self.inner.initialize_with_source(config, source)
    }

    /// True iff a widget instance is currently active for the control
    pub fn is_initialized(&self, control_id: &str) -> bool {
        self.inner.registry.lock().unwrap().has(control_id)
    }

    /// Destroy the control's instance if active; safe no-op otherwise.
    /// Returns true when an instance was actually destroyed.
    pub fn destroy(&self, control_id: &str) -> bool {
        let destroyed = self
            .inner
            .registry
            .lock()
            .unwrap()
            .destroy(control_id, self.inner.host.as_ref());
        if destroyed {
            self.inner.events.publish(SelectEvent::Destroyed {
                control_id: control_id.to_string(),
                timestamp: Utc::now(),
            });
        }
        destroyed
    }

    /// Number of currently active widget instances
    pub fn active_count(&self) -> usize {
        self.inner.registry.lock().unwrap().len()
    }
}

impl ControllerInner {
    pub(crate) fn initialize(
        self: &Arc<Self>,
        config: SelectConfig,
    ) -> Result<SelectHandle, SelectError> {
        config.validate()?;
        let source: Arc<dyn OptionSource> = match &config.remote_url {
            Some(url) => Arc::new(RemoteSource::new(
                url.clone(),
                config.option_label_field.clone(),
            )),
            None => Arc::new(StaticSource::new(
                config.options.clone(),
                config.preselected.clone(),
            )),
        };
        self.initialize_with_source(config, source)
    }

    pub(crate) fn initialize_with_source(
        self: &Arc<Self>,
        config: SelectConfig,
        source: Arc<dyn OptionSource>,
    ) -> Result<SelectHandle, SelectError> {
        config.validate()?;
        let control_id = config.control_id.clone();

        // Steps below form one non-preemptible unit: the lock is held from
        // destroy through registration and nothing awaits inside.
        let mut registry = self.registry.lock().unwrap();

        if registry.destroy(&control_id, self.host.as_ref()) {
            self.events.publish(SelectEvent::Destroyed {
                control_id: control_id.clone(),
                timestamp: Utc::now(),
            });
        }

        let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = SelectHandle {
            control_id: control_id.clone(),
            epoch,
            inner: Arc::downgrade(self),
        };

        // Attach fails when the control has no backing element. Nothing has
        // been registered yet, so no partial widget is left behind.
        self.host.attach(handle.clone(), &WidgetOptions::default())?;

        let binding_target = resolve_binding_target(&config, self.host.as_ref());
        let search = Arc::new(SearchState::new());

        // Initial render: a static control shows its full option list up
        // front; a remote one shows only the preselected option (if any)
        // until the first search.
        let initial: Vec<OptionItem> = if config.remote_url.is_none() {
            let mut all = Vec::with_capacity(config.options.len() + 1);
            if let Some(pre) = &config.preselected {
                all.push(pre.clone());
            }
            all.extend(config.options.iter().cloned());
            all
        } else {
            config.preselected.iter().cloned().collect()
        };
        search.store_page(
            1,
            SearchPage {
                results: initial.clone(),
                has_more: false,
            },
        );
        self.host.render_page(&control_id, &initial, false);

        registry.insert(
            control_id.clone(),
            WidgetInstance {
                config,
                binding_target,
                epoch,
                source,
                search,
            },
        );

        tracing::info!(control_id = %control_id, "Widget instance initialized");
        self.events.publish(SelectEvent::Initialized {
            control_id,
            timestamp: Utc::now(),
        });

        Ok(handle)
    }
}

/// Snapshot of the instance state a handle method needs, taken under the
/// registry lock and used after it is released
struct HandleContext {
    source: Arc<dyn OptionSource>,
    search: Arc<SearchState>,
    binding_target: String,
    debounce: Duration,
}

/// Per-instance handle through which the host delivers user interaction.
///
/// Cloneable and cheap; holds only a weak reference to the controller. Every
/// method is a no-op once the instance it was created for has been destroyed
/// or replaced, so stale hooks can never fire against a newer instance.
#[derive(Clone)]
pub struct SelectHandle {
    control_id: String,
    epoch: u64,
    inner: Weak<ControllerInner>,
}

impl fmt::Debug for SelectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectHandle")
            .field("control_id", &self.control_id)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl SelectHandle {
    /// The control this handle belongs to
    pub fn control_id(&self) -> &str {
        &self.control_id
    }

    /// True while the instance this handle was created for is the active one
    pub fn is_live(&self) -> bool {
        self.context().is_some()
    }

    fn context(&self) -> Option<(Arc<ControllerInner>, HandleContext)> {
        let inner = self.inner.upgrade()?;
        let context = {
            let registry = inner.registry.lock().unwrap();
            let instance = registry.get(&self.control_id)?;
            if instance.epoch != self.epoch {
                tracing::trace!(
                    control_id = %self.control_id,
                    "Ignoring event from replaced widget instance"
                );
                return None;
            }
            HandleContext {
                source: instance.source.clone(),
                search: instance.search.clone(),
                binding_target: instance.binding_target.clone(),
                debounce: instance.config.debounce(),
            }
        };
        Some((inner, context))
    }

    /// The user typed in the search field. Starts the debounce window; only
    /// the last keystroke within it produces a dispatched request.
    pub fn input_changed(&self, term: &str) {
        let Some((inner, context)) = self.context() else {
            return;
        };
        let generation = context.search.begin_search(term);
        let control_id = self.control_id.clone();
        let epoch = self.epoch;
        let term = term.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(context.debounce).await;
            if context.search.generation() != generation {
                tracing::trace!(
                    control_id = %control_id,
                    term = %term,
                    "Keystroke superseded within debounce window"
                );
                return;
            }
            dispatch_fetch(
                inner,
                control_id,
                epoch,
                context.source,
                context.search,
                term,
                1,
                generation,
            )
            .await;
        });
    }

    /// The user scrolled to the end of the result list. Requests the next
    /// page iff the last applied page reported more results available.
    pub fn load_more(&self) {
        let Some((inner, context)) = self.context() else {
            return;
        };
        if !context.search.has_more() {
            return;
        }
        let generation = context.search.generation();
        let term = context.search.term();
        let page = context.search.next_page();
        let control_id = self.control_id.clone();
        let epoch = self.epoch;

        tokio::spawn(dispatch_fetch(
            inner,
            control_id,
            epoch,
            context.source,
            context.search,
            term,
            page,
            generation,
        ));
    }

    /// The dropdown was opened. Moves focus into the generated search
    /// field; failure to find the field is non-fatal.
    pub fn opened(&self) {
        let Some((inner, _)) = self.context() else {
            return;
        };
        if !inner.host.focus_search(&self.control_id) {
            tracing::debug!(
                control_id = %self.control_id,
                "Search field not found; skipping focus"
            );
        }
    }

    /// The user changed the selection. Writes the value to the external
    /// sink under the resolved binding target - exactly one write per
    /// change, a cleared selection writing the empty value.
    pub fn selection_changed(&self, value: Option<&str>) {
        let Some((inner, context)) = self.context() else {
            return;
        };
        let binder = SelectionBinder::new(inner.sink.clone(), context.binding_target.clone());
        binder.push(value);
        inner.events.publish(SelectEvent::SelectionWritten {
            control_id: self.control_id.clone(),
            key: context.binding_target,
            value: value.unwrap_or("").to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Dispatch one search request and apply its response unless it is stale.
///
/// Staleness has three causes, all silent no-ops: the widget instance was
/// destroyed or replaced while the request was in flight, a newer search
/// generation started, or a response with a higher sequence number already
/// applied. Fetch failures degrade to an empty page so the widget is never
/// stuck loading.
#[allow(clippy::too_many_arguments)]
async fn dispatch_fetch(
    inner: Arc<ControllerInner>,
    control_id: String,
    epoch: u64,
    source: Arc<dyn OptionSource>,
    search: Arc<SearchState>,
    term: String,
    page: u32,
    generation: u64,
) {
    let sequence = search.next_sequence();
    tracing::debug!(
        control_id = %control_id,
        term = %term,
        page,
        sequence,
        source = source.describe(),
        "Dispatching search request"
    );
    inner.events.publish(SelectEvent::SearchDispatched {
        control_id: control_id.clone(),
        term: term.clone(),
        page,
        sequence,
        timestamp: Utc::now(),
    });

    let result = source.fetch(SearchRequest::new(term, page)).await;
    let page_data = match result {
        Ok(page_data) => page_data,
        Err(e) => {
            tracing::warn!(control_id = %control_id, error = %e, "Fetch failed; rendering empty page");
            inner.events.publish(SelectEvent::FetchFailed {
                control_id: control_id.clone(),
                message: e.to_string(),
                timestamp: Utc::now(),
            });
            SearchPage::empty()
        }
    };

    let instance_current = {
        let registry = inner.registry.lock().unwrap();
        registry.get(&control_id).map(|i| i.epoch) == Some(epoch)
    };
    if !instance_current || !search.try_apply(generation, sequence) {
        tracing::trace!(control_id = %control_id, sequence, "Discarding stale response");
        inner.events.publish(SelectEvent::StaleResponseDiscarded {
            control_id,
            sequence,
            timestamp: Utc::now(),
        });
        return;
    }

    let has_more = page_data.has_more;
    let rendered = search.store_page(page, page_data);
    inner.host.render_page(&control_id, &rendered, has_more);
    inner.events.publish(SelectEvent::PageApplied {
        control_id,
        page,
        count: rendered.len(),
        has_more,
        sequence,
        timestamp: Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    // ─────────────────────────────────────────────────────────────────────
    // Test doubles
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct MockHost {
        attach_count: AtomicUsize,
        detach_count: AtomicUsize,
        focus_count: AtomicUsize,
        fail_attach: bool,
        focus_found: bool,
        reactive: Option<String>,
        handles: Mutex<HashMap<String, SelectHandle>>,
        renders: Mutex<Vec<(String, Vec<OptionItem>, bool)>>,
    }

    impl MockHost {
        fn with_defaults() -> Self {
            Self {
                focus_found: true,
                ..Default::default()
            }
        }

        fn last_render(&self) -> Option<(Vec<OptionItem>, bool)> {
            self.renders
                .lock()
                .unwrap()
                .last()
                .map(|(_, options, has_more)| (options.clone(), *has_more))
        }
    }

    impl WidgetHost for MockHost {
        fn attach(&self, handle: SelectHandle, _options: &WidgetOptions) -> Result<(), SelectError> {
            if self.fail_attach {
                return Err(SelectError::Configuration(format!(
                    "no element for control '{}'",
                    handle.control_id()
                )));
            }
            self.attach_count.fetch_add(1, Ordering::SeqCst);
            self.handles
                .lock()
                .unwrap()
                .insert(handle.control_id().to_string(), handle);
            Ok(())
        }

        fn detach(&self, control_id: &str) {
            self.detach_count.fetch_add(1, Ordering::SeqCst);
            self.handles.lock().unwrap().remove(control_id);
        }

        fn render_page(&self, control_id: &str, options: &[OptionItem], has_more: bool) {
            self.renders
                .lock()
                .unwrap()
                .push((control_id.to_string(), options.to_vec(), has_more));
        }

        fn focus_search(&self, _control_id: &str) -> bool {
            self.focus_count.fetch_add(1, Ordering::SeqCst);
            self.focus_found
        }

        fn reactive_key(&self, _control_id: &str) -> Option<String> {
            self.reactive.clone()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, String)>>,
    }

    impl StateSink for RecordingSink {
        fn set(&self, key: &str, value: &str) {
            self.writes
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
        }
    }

    /// Source that records every request and serves scripted pages with
    /// per-call delays
    struct ScriptedSource {
        calls: Mutex<Vec<SearchRequest>>,
        script: Mutex<VecDeque<(Duration, SearchPage)>>,
        fallback: SearchPage,
    }

    impl ScriptedSource {
        fn new(script: Vec<(Duration, SearchPage)>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                script: Mutex::new(script.into()),
                fallback: SearchPage::empty(),
            }
        }

        fn serving(page: SearchPage) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                script: Mutex::new(VecDeque::new()),
                fallback: page,
            }
        }

        fn calls(&self) -> Vec<SearchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OptionSource for ScriptedSource {
        fn describe(&self) -> &str {
            "scripted"
        }

        fn fetch(&self, request: SearchRequest) -> BoxFuture<'_, Result<SearchPage, SelectError>> {
            self.calls.lock().unwrap().push(request);
            let (delay, page) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((Duration::ZERO, self.fallback.clone()));
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(page)
            })
        }
    }

    fn widget_page() -> SearchPage {
        SearchPage {
            results: vec![OptionItem::new("7", "Widget")],
            has_more: false,
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn setup() -> (SelectController, Arc<MockHost>, Arc<RecordingSink>) {
        init_tracing();
        let host = Arc::new(MockHost::with_defaults());
        let sink = Arc::new(RecordingSink::default());
        let controller = SelectController::new(host.clone(), sink.clone());
        (controller, host, sink)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_double_initialize_leaves_one_instance() {
        let (controller, host, sink) = setup();
        let first = controller
            .initialize(SelectConfig::remote("c1", "/items"))
            .unwrap();
        let second = controller
            .initialize(SelectConfig::remote("c1", "/items"))
            .unwrap();

        assert_eq!(controller.active_count(), 1);
        assert_eq!(host.attach_count.load(Ordering::SeqCst), 2);
        assert_eq!(host.detach_count.load(Ordering::SeqCst), 1);

        // Only the live instance's hooks fire: one write, not two
        assert!(!first.is_live());
        assert!(second.is_live());
        first.selection_changed(Some("stale"));
        second.selection_changed(Some("7"));
        assert_eq!(
            *sink.writes.lock().unwrap(),
            vec![("c1".to_string(), "7".to_string())]
        );
    }

    #[tokio::test]
    async fn test_initialize_with_new_config_replaces_old_one() {
        let (controller, _host, _sink) = setup();
        controller
            .initialize(SelectConfig::remote("c1", "/items"))
            .unwrap();
        controller
            .initialize(SelectConfig::remote("c1", "/cities"))
            .unwrap();

        let registry = controller.inner.registry.lock().unwrap();
        let config = registry.get("c1").unwrap().config();
        assert_eq!(config.remote_url.as_deref(), Some("/cities"));
    }

    #[tokio::test]
    async fn test_attach_failure_is_a_configuration_error() {
        let host = Arc::new(MockHost {
            fail_attach: true,
            ..MockHost::with_defaults()
        });
        let sink = Arc::new(RecordingSink::default());
        let controller = SelectController::new(host, sink);

        let err = controller
            .initialize(SelectConfig::remote("ghost", "/items"))
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(!controller.is_initialized("ghost"));
    }

    #[tokio::test]
    async fn test_empty_control_id_is_rejected() {
        let (controller, host, _sink) = setup();
        let err = controller.initialize(SelectConfig::default()).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(host.attach_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent_through_controller() {
        let (controller, host, _sink) = setup();
        controller
            .initialize(SelectConfig::local("c1", Vec::new()))
            .unwrap();

        assert!(controller.destroy("c1"));
        assert!(!controller.destroy("c1"));
        assert!(!controller.is_initialized("c1"));
        assert_eq!(host.detach_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_opened_focuses_search_field() {
        let (controller, host, _sink) = setup();
        let handle = controller
            .initialize(SelectConfig::local("c1", Vec::new()))
            .unwrap();
        handle.opened();
        assert_eq!(host.focus_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_search_field_is_non_fatal() {
        let host = Arc::new(MockHost {
            focus_found: false,
            ..MockHost::with_defaults()
        });
        let sink = Arc::new(RecordingSink::default());
        let controller = SelectController::new(host, sink);
        let handle = controller
            .initialize(SelectConfig::local("c1", Vec::new()))
            .unwrap();
        handle.opened();
        assert!(handle.is_live());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Debounced search and pagination
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_debounce_dispatches_only_final_term() {
        let (controller, _host, _sink) = setup();
        let source = Arc::new(ScriptedSource::serving(widget_page()));
        let handle = controller
            .initialize_with_source(SelectConfig::remote("c1", "/items"), source.clone())
            .unwrap();

        handle.input_changed("w");
        handle.input_changed("wi");
        handle.input_changed("wid");
        sleep(Duration::from_millis(300)).await;

        let calls = source.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], SearchRequest::new("wid", 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_scenario_renders_page_and_stops_paginating() {
        let (controller, host, _sink) = setup();
        let source = Arc::new(ScriptedSource::serving(widget_page()));
        let handle = controller
            .initialize_with_source(SelectConfig::remote("c1", "/items"), source.clone())
            .unwrap();

        handle.input_changed("wid");
        sleep(Duration::from_millis(300)).await;

        let (options, has_more) = host.last_render().unwrap();
        assert_eq!(options, vec![OptionItem::new("7", "Widget")]);
        assert!(!has_more);

        // has_more = false: scrolling must not request another page
        handle.load_more();
        sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_more_appends_next_page() {
        let (controller, host, _sink) = setup();
        let source = Arc::new(ScriptedSource::new(vec![
            (
                Duration::ZERO,
                SearchPage {
                    results: vec![OptionItem::new("1", "Alpha")],
                    has_more: true,
                },
            ),
            (
                Duration::ZERO,
                SearchPage {
                    results: vec![OptionItem::new("2", "Beta")],
                    has_more: false,
                },
            ),
        ]));
        let handle = controller
            .initialize_with_source(SelectConfig::remote("c1", "/items"), source.clone())
            .unwrap();

        handle.input_changed("a");
        sleep(Duration::from_millis(300)).await;
        handle.load_more();
        sleep(Duration::from_millis(50)).await;

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], SearchRequest::new("a", 2));

        let (options, has_more) = host.last_render().unwrap();
        assert_eq!(
            options,
            vec![OptionItem::new("1", "Alpha"), OptionItem::new("2", "Beta")]
        );
        assert!(!has_more);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_early_response_never_overwrites_later_one() {
        let host = Arc::new(MockHost::with_defaults());
        let sink = Arc::new(RecordingSink::default());
        let (controller, mut events) =
            SelectController::with_event_channel(host.clone(), sink, 64);

        let slow_page = SearchPage {
            results: vec![OptionItem::new("1", "Old")],
            has_more: false,
        };
        let fast_page = SearchPage {
            results: vec![OptionItem::new("2", "New")],
            has_more: false,
        };
        let source = Arc::new(ScriptedSource::new(vec![
            (Duration::from_millis(500), slow_page),
            (Duration::from_millis(10), fast_page),
        ]));
        let handle = controller
            .initialize_with_source(SelectConfig::remote("c1", "/items"), source.clone())
            .unwrap();

        handle.input_changed("first");
        sleep(Duration::from_millis(260)).await; // dispatches the slow request
        handle.input_changed("second");
        sleep(Duration::from_millis(260)).await; // dispatches the fast one
        sleep(Duration::from_millis(600)).await; // slow response finally arrives

        assert_eq!(source.calls().len(), 2);
        let (options, _) = host.last_render().unwrap();
        assert_eq!(options, vec![OptionItem::new("2", "New")]);

        let mut discarded = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SelectEvent::StaleResponseDiscarded { .. }) {
                discarded += 1;
            }
        }
        assert_eq!(discarded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_degrades_to_empty_page() {
        struct FailingSource;
        impl OptionSource for FailingSource {
            fn describe(&self) -> &str {
                "failing"
            }
            fn fetch(
                &self,
                _request: SearchRequest,
            ) -> BoxFuture<'_, Result<SearchPage, SelectError>> {
                Box::pin(async { Err(SelectError::Network("connection refused".into())) })
            }
        }

        let host = Arc::new(MockHost::with_defaults());
        let sink = Arc::new(RecordingSink::default());
        let (controller, mut events) =
            SelectController::with_event_channel(host.clone(), sink, 64);
        let handle = controller
            .initialize_with_source(SelectConfig::remote("c1", "/items"), Arc::new(FailingSource))
            .unwrap();

        handle.input_changed("wid");
        sleep(Duration::from_millis(300)).await;

        // Widget is not stuck loading: an empty page was rendered
        let (options, has_more) = host.last_render().unwrap();
        assert!(options.is_empty());
        assert!(!has_more);

        let mut failed = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, SelectEvent::FetchFailed { .. }) {
                failed += 1;
            }
        }
        assert_eq!(failed, 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Static option mode
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_static_mode_renders_supplied_options() {
        let (controller, host, _sink) = setup();
        let config = SelectConfig::local(
            "c1",
            vec![OptionItem::new("1", "A"), OptionItem::new("2", "B")],
        );
        let handle = controller.initialize(config).unwrap();

        // Both options render immediately, no fetch needed
        let (options, has_more) = host.last_render().unwrap();
        assert_eq!(options.len(), 2);
        assert!(!has_more);

        // Typing filters the static list through the same search path
        handle.input_changed("b");
        sleep(Duration::from_millis(300)).await;
        let (options, _) = host.last_render().unwrap();
        assert_eq!(options, vec![OptionItem::new("2", "B")]);
    }

    #[tokio::test]
    async fn test_preselected_renders_ahead_of_remote_results() {
        let (controller, host, _sink) = setup();
        let mut config = SelectConfig::remote("c1", "/items");
        config.preselected = Some(OptionItem::new("7", "Widget"));
        controller.initialize(config).unwrap();

        let (options, _) = host.last_render().unwrap();
        assert_eq!(options, vec![OptionItem::new("7", "Widget")]);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selection binding
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_selection_round_trip_writes_once() {
        let (controller, _host, sink) = setup();
        let handle = controller
            .initialize(SelectConfig::remote("c1", "/items"))
            .unwrap();

        handle.selection_changed(Some("7"));
        assert_eq!(
            *sink.writes.lock().unwrap(),
            vec![("c1".to_string(), "7".to_string())]
        );
    }

    #[tokio::test]
    async fn test_selection_uses_reactive_key_when_configured() {
        let host = Arc::new(MockHost {
            reactive: Some("form.city_id".to_string()),
            ..MockHost::with_defaults()
        });
        let sink = Arc::new(RecordingSink::default());
        let controller = SelectController::new(host, sink.clone());

        let mut config = SelectConfig::remote("c1", "/items");
        config.use_reactive_binding = true;
        let handle = controller.initialize(config).unwrap();

        handle.selection_changed(Some("7"));
        assert_eq!(
            *sink.writes.lock().unwrap(),
            vec![("form.city_id".to_string(), "7".to_string())]
        );
    }

    #[tokio::test]
    async fn test_clearing_selection_writes_empty_value() {
        let (controller, _host, sink) = setup();
        let handle = controller
            .initialize(SelectConfig::remote("c1", "/items"))
            .unwrap();
        handle.selection_changed(None);
        assert_eq!(
            *sink.writes.lock().unwrap(),
            vec![("c1".to_string(), String::new())]
        );
    }
}
