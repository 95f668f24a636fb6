//! Navigation history state machine
//!
//! Keeps the in-memory view state and the platform history stack in
//! step. User-driven changes push a new tagged entry; back/forward
//! events restore (never re-push) the popped entry; entries without our
//! marker belong to another context and are ignored. On mount a
//! synthetic baseline entry is pushed so the very first back-navigation
//! stays inside the app instead of being swallowed by the browser's own
//! history.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::view::{ViewMode, ViewSelection};
use std::collections::VecDeque;
use std::sync::Arc;

/// Marker distinguishing this app's history entries from foreign ones
const HISTORY_MARKER: &str = "kelp-stock";

/// View state carried in each history entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub mode: ViewMode,
    #[serde(flatten)]
    pub selection: ViewSelection,
}

impl ViewState {
    pub fn stock() -> Self {
        Self {
            mode: ViewMode::Stock,
            selection: ViewSelection::default(),
        }
    }

    pub fn admin() -> Self {
        Self {
            mode: ViewMode::Admin,
            selection: ViewSelection::default(),
        }
    }
}

/// Tagged history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub marker: String,
    #[serde(flatten)]
    pub state: ViewState,
    pub index: u64,
}

impl HistoryEntry {
    fn tagged(state: ViewState, index: u64) -> Self {
        Self {
            marker: HISTORY_MARKER.to_string(),
            state,
            index,
        }
    }

    pub fn is_tagged(&self) -> bool {
        self.marker == HISTORY_MARKER
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Instruction for the platform history stack
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryCommand {
    /// Replace the current entry
    Replace(HistoryEntry),
    /// Push a new entry
    Push(HistoryEntry),
}

/// Outcome of an in-app back request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackAction {
    /// Delegate to native back navigation; the popstate handler restores
    Native,
    /// No history depth yet - the selection was collapsed one level in
    /// memory without touching history
    Collapsed,
    /// Nothing left to unwind
    AtRoot,
}

/// Platform history stack operations the app needs
///
/// A browser shell maps these onto `history.replaceState` / `pushState`
/// / `back()`; [`InMemoryHistory`] simulates the same semantics.
pub trait HistoryStack: Send {
    /// Current entry's state, if any
    fn current(&self) -> Option<Value>;
    fn replace(&mut self, state: Value);
    fn push(&mut self, state: Value);
    /// Request native back navigation; the popstate arrives asynchronously
    fn back(&mut self);
}

/// The navigation state machine
///
/// Pure over [`HistoryCommand`]s so transitions are directly testable;
/// the coordinator applies commands to the platform stack.
#[derive(Debug)]
pub struct Navigator {
    state: ViewState,
    index: u64,
}

impl Navigator {
    pub fn new(initial: ViewState) -> Self {
        Self {
            state: initial,
            index: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    /// Initial mount against whatever entry the platform already holds
    ///
    /// A tagged entry (reload mid-session) is adopted as-is. Otherwise
    /// the current entry is replaced with a tagged snapshot at index 0
    /// and a synthetic follow-up entry is pushed (index 0 -> 1) as the
    /// baseline guard.
    pub fn mount(&mut self, existing: Option<&Value>) -> Vec<HistoryCommand> {
        if let Some(entry) = parse_tagged(existing) {
            self.state = entry.state;
            self.index = entry.index;
            return Vec::new();
        }
        let baseline = HistoryEntry::tagged(self.state.clone(), 0);
        let guard = HistoryEntry::tagged(self.state.clone(), 1);
        self.index = 1;
        vec![
            HistoryCommand::Replace(baseline),
            HistoryCommand::Push(guard),
        ]
    }

    /// User-driven change to the view tuple
    pub fn navigate(&mut self, new_state: ViewState) -> Vec<HistoryCommand> {
        if new_state == self.state {
            return Vec::new();
        }
        self.state = new_state;
        self.index += 1;
        vec![HistoryCommand::Push(HistoryEntry::tagged(
            self.state.clone(),
            self.index,
        ))]
    }

    /// Back/forward event from the platform
    ///
    /// Tagged entries are restored, not re-pushed; foreign entries are
    /// ignored. Returns whether the view state was adopted.
    pub fn on_popstate(&mut self, payload: Option<&Value>) -> bool {
        let Some(entry) = parse_tagged(payload) else {
            return false;
        };
        self.state = entry.state;
        self.index = entry.index;
        true
    }

    /// Back request from within the UI
    pub fn request_back(&mut self) -> BackAction {
        if self.index > 0 {
            return BackAction::Native;
        }
        if self.state.selection.collapse() {
            BackAction::Collapsed
        } else {
            BackAction::AtRoot
        }
    }
}

fn parse_tagged(payload: Option<&Value>) -> Option<HistoryEntry> {
    let entry: HistoryEntry = serde_json::from_value(payload?.clone()).ok()?;
    entry.is_tagged().then_some(entry)
}

// =============================================================================
// In-memory history stack
// =============================================================================

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<Value>,
    pos: usize,
    /// Popstate payloads awaiting delivery to the app
    pending: VecDeque<Option<Value>>,
}

impl Default for HistoryInner {
    fn default() -> Self {
        Self {
            // The entry that was current before the app loaded
            entries: vec![Value::Null],
            pos: 0,
            pending: VecDeque::new(),
        }
    }
}

/// Browser-like history stack held in memory
///
/// Pushing truncates the forward entries, exactly like a real browser;
/// `back`/`forward` queue popstate payloads for the shell to drain via
/// [`take_popstate`](Self::take_popstate).
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    inner: Arc<Mutex<HistoryInner>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user pressing the browser forward button
    pub fn forward(&self) {
        let mut inner = self.inner.lock();
        if inner.pos + 1 < inner.entries.len() {
            inner.pos += 1;
            let state = inner.entries[inner.pos].clone();
            let payload = (!state.is_null()).then_some(state);
            inner.pending.push_back(payload);
        }
    }

    /// Next queued popstate payload, if a back/forward happened
    pub fn take_popstate(&self) -> Option<Option<Value>> {
        self.inner.lock().pending.pop_front()
    }

    /// Number of entries on the stack
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of the current entry
    pub fn position(&self) -> usize {
        self.inner.lock().pos
    }
}

impl HistoryStack for InMemoryHistory {
    fn current(&self) -> Option<Value> {
        let inner = self.inner.lock();
        let state = inner.entries[inner.pos].clone();
        (!state.is_null()).then_some(state)
    }

    fn replace(&mut self, state: Value) {
        let mut inner = self.inner.lock();
        let pos = inner.pos;
        inner.entries[pos] = state;
    }

    fn push(&mut self, state: Value) {
        let mut inner = self.inner.lock();
        let pos = inner.pos;
        inner.entries.truncate(pos + 1);
        inner.entries.push(state);
        inner.pos += 1;
    }

    fn back(&mut self) {
        let mut inner = self.inner.lock();
        if inner.pos > 0 {
            inner.pos -= 1;
            let state = inner.entries[inner.pos].clone();
            let payload = (!state.is_null()).then_some(state);
            inner.pending.push_back(payload);
        }
    }
}
