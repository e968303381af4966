//! Widget instance model and the host-side collaborator trait
//!
//! The binding layer is headless: it never touches markup. Everything that
//! renders or owns actual UI elements lives behind [`WidgetHost`], which the
//! embedding application implements. What this module owns is the per-control
//! record the controller keeps ([`WidgetInstance`]) and the mutable search
//! state shared with in-flight fetch tasks ([`SearchState`]).

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::SelectConfig;
use crate::controller::SelectHandle;
use crate::error::SelectError;
use crate::options::{OptionItem, SearchPage};
use crate::source::OptionSource;

/// Where the dropdown panel is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropdownParent {
    /// Inside the control's immediate parent container, so positioning is
    /// scoped to the control rather than the whole document
    #[default]
    Scoped,
    /// At document level (the usual library default, not used here)
    Document,
}

/// Presentation options passed to the host at attach time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    /// Show a clear-selection affordance
    pub allow_clear: bool,
    /// Stretch the widget to the full width of its container
    pub full_width: bool,
    /// Dropdown mount point
    pub dropdown_parent: DropdownParent,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            allow_clear: true,
            full_width: true,
            dropdown_parent: DropdownParent::Scoped,
        }
    }
}

/// The external UI collaborator for one page/document.
///
/// Implementations own the actual controls. The controller calls these
/// methods during the lifecycle; the host delivers user interaction back
/// through the [`SelectHandle`] it receives in `attach`.
pub trait WidgetHost: Send + Sync {
    /// Attach widget augmentation to the control and store the handle the
    /// UI's event hooks will call into. Fails when the control has no
    /// backing element - that is a configuration error, not a crash.
    fn attach(&self, handle: SelectHandle, options: &WidgetOptions) -> Result<(), SelectError>;

    /// Remove all augmentation and hooks for the control. Must be safe to
    /// call for a control that was never attached.
    fn detach(&self, control_id: &str);

    /// Replace the rendered option list for the control
    fn render_page(&self, control_id: &str, options: &[OptionItem], has_more: bool);

    /// Move input focus to the generated search field.
    /// Returns false when the field cannot be found; callers treat that
    /// as non-fatal.
    fn focus_search(&self, control_id: &str) -> bool;

    /// The reactive-model binding key declared on the control's element,
    /// if any
    fn reactive_key(&self, control_id: &str) -> Option<String>;
}

/// Mutable search state for one widget instance, shared with the debounce
/// and fetch tasks it spawns.
///
/// Two counters resolve the timing races:
/// - `generation` identifies the newest keystroke; a debounce task only
///   dispatches if its generation is still current, and a response only
///   applies under the generation it was requested for.
/// - `sequence` numbers every dispatched request monotonically; a response
///   only applies if its sequence is higher than the last applied one, so a
///   slow early response can never overwrite a later one.
pub(crate) struct SearchState {
    generation: AtomicU64,
    next_sequence: AtomicU64,
    applied_sequence: AtomicU64,
    term: Mutex<String>,
    next_page: AtomicU32,
    has_more: AtomicBool,
    results: Mutex<Vec<OptionItem>>,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            next_sequence: AtomicU64::new(0),
            applied_sequence: AtomicU64::new(0),
            term: Mutex::new(String::new()),
            next_page: AtomicU32::new(1),
            has_more: AtomicBool::new(false),
            results: Mutex::new(Vec::new()),
        }
    }

    /// Start a new search generation for `term`, superseding any pending
    /// debounce task or in-flight response of an older generation. The
    /// pagination cursor belongs to the superseded term, so it resets here:
    /// a scroll event between the keystroke and the page-1 response must not
    /// fetch pages for the old term.
    pub fn begin_search(&self, term: &str) -> u64 {
        *self.term.lock().unwrap() = term.to_string();
        self.has_more.store(false, Ordering::SeqCst);
        self.next_page.store(1, Ordering::SeqCst);
        self.results.lock().unwrap().clear();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn term(&self) -> String {
        self.term.lock().unwrap().clone()
    }

    /// Claim the sequence number for the next dispatched request
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Decide whether a response may be applied. True exactly when the
    /// response belongs to the current generation and no response with an
    /// equal or higher sequence has been applied yet.
    pub fn try_apply(&self, generation: u64, sequence: u64) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        self.applied_sequence.fetch_max(sequence, Ordering::SeqCst) < sequence
    }

    /// Store an applied page and return the full result set to render.
    /// Page 1 replaces the accumulated results; later pages append.
    pub fn store_page(&self, page_number: u32, page: SearchPage) -> Vec<OptionItem> {
        let mut results = self.results.lock().unwrap();
        if page_number <= 1 {
            *results = page.results;
        } else {
            results.extend(page.results);
        }
        self.has_more.store(page.has_more, Ordering::SeqCst);
        self.next_page.store(page_number + 1, Ordering::SeqCst);
        results.clone()
    }

    pub fn has_more(&self) -> bool {
        self.has_more.load(Ordering::SeqCst)
    }

    pub fn next_page(&self) -> u32 {
        self.next_page.load(Ordering::SeqCst)
    }
}

/// One active widget instance, exclusively owned by the lifecycle
/// controller's registry while active.
pub struct WidgetInstance {
    pub(crate) config: SelectConfig,
    pub(crate) binding_target: String,
    pub(crate) epoch: u64,
    pub(crate) source: Arc<dyn OptionSource>,
    pub(crate) search: Arc<SearchState>,
}

impl WidgetInstance {
    /// The configuration this instance was created from
    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    /// The key selection values are written under
    pub fn binding_target(&self) -> &str {
        &self.binding_target
    }
}
