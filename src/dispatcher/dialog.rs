use tracing::debug;

/// Identifies one opening of a dialog. Responses that carry an older generation are stale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DialogKind {
    InsertElement,
    DeleteElement,
    RenameElement,
    ChangeType,
    Occurrences,
    SaveTemplate,
    SaveType,
    RootTypeName,
    DeleteBucket,
    ResolveDependencies,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Closed,
    Open {
        kind: DialogKind,
        generation: Generation,
    },
    /// Confirmed; the request is outstanding.
    InFlight {
        kind: DialogKind,
        generation: Generation,
    },
}

/// The single modal dialog of the composer page.
///
/// `Closed -> Open -> InFlight -> {Closed (applied), Open (rejected)}`, with `Open -> Closed` on
/// cancel. Opening a dialog always starts a new generation and discards whatever was shown
/// before, including an outstanding request.
#[derive(Debug, Default)]
pub struct Dialog {
    state: DialogState,
    generations: u64,
}

impl Dialog {
    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn open(&mut self, kind: DialogKind) -> Generation {
        if self.state != DialogState::Closed {
            debug!("discarding {:?}", self.state);
        }
        self.generations += 1;
        let generation = Generation(self.generations);
        self.state = DialogState::Open { kind, generation };
        generation
    }

    pub fn cancel(&mut self) {
        self.state = DialogState::Closed;
    }

    /// Moves an open dialog of `kind` to in-flight. Returns `None` if no such dialog is open.
    pub fn confirm(&mut self, kind: DialogKind) -> Option<Generation> {
        match self.state {
            DialogState::Open {
                kind: open,
                generation,
            } if open == kind => {
                self.state = DialogState::InFlight { kind, generation };
                Some(generation)
            }
            _ => None,
        }
    }

    /// Whether a response for `generation` may still be applied.
    pub fn is_awaiting(&self, generation: Generation) -> bool {
        matches!(self.state, DialogState::InFlight { generation: g, .. } if g == generation)
    }

    pub fn applied(&mut self, generation: Generation) {
        if self.is_awaiting(generation) {
            self.state = DialogState::Closed;
        }
    }

    /// The service refused; the dialog stays open so the user can correct the input.
    pub fn rejected(&mut self, generation: Generation) {
        if let DialogState::InFlight { kind, generation: g } = self.state {
            if g == generation {
                self.state = DialogState::Open { kind, generation };
            }
        }
    }
}
