use alloc::vec::Vec;

use super::*;

/// Two cards per symbol, uniformly shuffled from a seed.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomDeckGenerator {
    seed: u64,
}

impl RandomDeckGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DeckGenerator for RandomDeckGenerator {
    fn generate(self, symbols: SymbolSet) -> Deck {
        use rand::prelude::*;
        use rand::rngs::SmallRng;

        let mut order: Vec<SymbolId> = (0..symbols.pair_count())
            .flat_map(|symbol| [symbol, symbol])
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        log::trace!("dealt {} cards from seed {}", order.len(), self.seed);
        Deck::new_unchecked(symbols, order)
    }
}
