//! Accordion state for the Truth Layer disclosure.

/// One of the four Truth Layer sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruthSection {
    Lineage,
    Targeting,
    StateFit,
    ProofHooks,
}

impl TruthSection {
    pub const ALL: [TruthSection; 4] = [
        Self::Lineage,
        Self::Targeting,
        Self::StateFit,
        Self::ProofHooks,
    ];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Lineage => "Lineage",
            Self::Targeting => "Targeting",
            Self::StateFit => "State-fit",
            Self::ProofHooks => "Proof Hooks",
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Lineage => 0,
            Self::Targeting => 1,
            Self::StateFit => 2,
            Self::ProofHooks => 3,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Single-open accordion: at most one section is expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisclosureState {
    expanded: Option<TruthSection>,
}

impl DisclosureState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn expanded(&self) -> Option<TruthSection> {
        self.expanded
    }

    #[must_use]
    pub fn is_expanded(&self, section: TruthSection) -> bool {
        self.expanded == Some(section)
    }

    /// Open `section`, closing whichever was open; toggling the open section closes it.
    pub fn toggle(&mut self, section: TruthSection) {
        self.expanded = if self.expanded == Some(section) {
            None
        } else {
            Some(section)
        };
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }
}
