use crate::*;
pub use random::*;

mod random;

/// Shuffle source: turns a symbol set into a dealt deck.
///
/// Fixed layouts skip this step and go straight to
/// [`MemoryEngine::start_with_deck`].
pub trait DeckGenerator {
    fn generate(self, symbols: SymbolSet) -> Deck;
}
