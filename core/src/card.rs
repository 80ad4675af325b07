use serde::{Deserialize, Serialize};

use crate::{CardId, SymbolId};

/// Player-visible state of a single card on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    id: CardId,
    symbol: SymbolId,
    face_up: bool,
    matched: bool,
}

impl Card {
    pub(crate) const fn face_down(id: CardId, symbol: SymbolId) -> Self {
        Self {
            id,
            symbol,
            face_up: false,
            matched: false,
        }
    }

    pub const fn id(&self) -> CardId {
        self.id
    }

    pub const fn symbol(&self) -> SymbolId {
        self.symbol
    }

    pub const fn is_face_up(&self) -> bool {
        self.face_up
    }

    pub const fn is_matched(&self) -> bool {
        self.matched
    }

    /// Face-up but not yet part of a found pair.
    pub const fn is_pending(&self) -> bool {
        self.face_up && !self.matched
    }

    pub(crate) fn flip_up(&mut self) {
        self.face_up = true;
    }

    pub(crate) fn flip_down(&mut self) {
        debug_assert!(!self.matched, "matched cards stay face-up");
        self.face_up = false;
    }

    pub(crate) fn mark_matched(&mut self) {
        self.face_up = true;
        self.matched = true;
    }
}
