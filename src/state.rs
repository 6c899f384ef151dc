use std::collections::VecDeque;

/// Flat application state. Every state is reachable from every other; the
/// machine holds exactly one current state at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    MainMenu,
    Editing,
    Playing,
}

impl AppState {
    pub fn label(self) -> &'static str {
        match self {
            AppState::MainMenu => "MainMenu",
            AppState::Editing => "Editing",
            AppState::Playing => "Playing",
        }
    }
}

type StateObserver = Box<dyn FnMut(AppState)>;

/// Holds the current application state and notifies observers synchronously,
/// in registration order, on every transition.
///
/// Transitions requested while a dispatch is in progress queue up and drain
/// in order before control returns to the outermost caller, so observers are
/// never notified re-entrantly.
pub struct StateMachine {
    current: AppState,
    observers: Vec<StateObserver>,
    pending: VecDeque<AppState>,
    dispatching: bool,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: AppState::MainMenu,
            observers: Vec::new(),
            pending: VecDeque::new(),
            dispatching: false,
        }
    }

    pub fn current(&self) -> AppState {
        self.current
    }

    /// Observers are not notified of the state in effect at registration
    /// time; callers that need it read `current()` first.
    pub fn subscribe(&mut self, observer: StateObserver) {
        self.observers.push(observer);
    }

    pub fn update_state(&mut self, next: AppState) {
        self.pending.push_back(next);
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some(state) = self.pending.pop_front() {
            self.current = state;
            for observer in &mut self.observers {
                observer(state);
            }
        }
        self.dispatching = false;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
