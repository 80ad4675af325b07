#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

pub use card::*;
pub use clock::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use store::*;
pub use types::*;

mod card;
mod clock;
mod engine;
mod error;
mod generator;
mod store;
mod types;

/// Largest symbol set whose deck can still be indexed by [`CardId`].
pub const MAX_SYMBOLS: usize = (CardId::MAX / 2) as usize;

/// Ordered list of distinct face values, one per pair on the board.
///
/// The empty set only appears on a board that was never started.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSet {
    labels: Vec<String>,
}

impl SymbolSet {
    pub fn new<I>(symbols: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let labels: Vec<String> = symbols.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(ConfigIssue::EmptySymbolSet.into());
        }
        if labels.len() > MAX_SYMBOLS {
            return Err(ConfigIssue::TooManySymbols.into());
        }
        if labels.iter().any(String::is_empty) {
            return Err(ConfigIssue::EmptySymbol.into());
        }

        let has_duplicate = {
            let mut seen = HashSet::with_capacity(labels.len());
            !labels.iter().all(|label| seen.insert(label.as_str()))
        };
        if has_duplicate {
            return Err(ConfigIssue::DuplicateSymbol.into());
        }

        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of pairs a deck built from this set holds.
    pub fn pair_count(&self) -> Score {
        // bounded by MAX_SYMBOLS
        self.labels.len() as Score
    }

    pub fn card_count(&self) -> usize {
        self.labels.len() * 2
    }

    pub fn label(&self, symbol: SymbolId) -> Option<&str> {
        self.labels.get(usize::from(symbol)).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// A dealt, face-down deck: the symbol set plus the symbol at each card position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    symbols: SymbolSet,
    order: Vec<SymbolId>,
}

impl Deck {
    pub(crate) fn new_unchecked(symbols: SymbolSet, order: Vec<SymbolId>) -> Self {
        debug_assert_eq!(order.len(), symbols.card_count());
        Self { symbols, order }
    }

    /// Builds a deck with a fixed layout, `order[i]` being the symbol of card `i`.
    pub fn from_symbol_order(symbols: SymbolSet, order: &[SymbolId]) -> Result<Self> {
        if order.len() != symbols.card_count() {
            return Err(ConfigIssue::InvalidLayout.into());
        }

        let mut counts = alloc::vec![0u8; symbols.len()];
        for &symbol in order {
            let count = counts
                .get_mut(usize::from(symbol))
                .ok_or(ConfigIssue::InvalidLayout)?;
            *count = count.saturating_add(1);
        }
        if counts.iter().any(|&count| count != 2) {
            return Err(ConfigIssue::InvalidLayout.into());
        }

        Ok(Self::new_unchecked(symbols, order.to_vec()))
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn order(&self) -> &[SymbolId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn into_parts(self) -> (SymbolSet, Vec<Card>) {
        let cards = self
            .order
            .iter()
            .enumerate()
            .map(|(id, &symbol)| Card::face_down(id as CardId, symbol))
            .collect();
        (self.symbols, cards)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Selection ignored, the board did not change.
    NoChange,
    /// First card of a new attempt is now face-up.
    Flipped,
    /// A shown mismatch was flipped down early and the selected card flipped up.
    ClickedThrough,
    Matched,
    /// The two face-up cards differ; the ticket must be resolved after [`UNFLIP_DELAY_MS`].
    Mismatched(UnflipTicket),
    /// The last pair was matched.
    Completed,
}

impl SelectOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }

    pub const fn scheduled_unflip(self) -> Option<UnflipTicket> {
        match self {
            Self::Mismatched(ticket) => Some(ticket),
            _ => None,
        }
    }

    /// Whether any earlier deferred unflip was cancelled by this selection.
    pub const fn cancels_unflip(self) -> bool {
        matches!(self, Self::ClickedThrough)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnflipOutcome {
    /// Ticket was superseded or cancelled; nothing changed.
    Stale,
    FlippedDown,
}

impl UnflipOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::FlippedDown)
    }
}
