use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Delay before a mismatched pair is turned back face-down.
pub const UNFLIP_DELAY_MS: u32 = 1000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    NotStarted,
    InProgress,
    Completed,
}

impl GamePhase {
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Handle for a deferred unflip. Only the most recently issued ticket is
/// honoured; anything the engine did since issuing it makes it stale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnflipTicket {
    generation: u64,
    cards: [CardId; 2],
}

impl UnflipTicket {
    pub(crate) const fn new(generation: u64, cards: [CardId; 2]) -> Self {
        Self { generation, cards }
    }

    pub const fn cards(&self) -> [CardId; 2] {
        self.cards
    }

    pub const fn delay_ms(&self) -> u32 {
        UNFLIP_DELAY_MS
    }
}

/// Read-only board snapshot handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    symbols: SymbolSet,
    cards: Vec<Card>,
    score: Score,
    moves: u32,
    started_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    best_score: Score,
}

impl GameState {
    fn unstarted(best_score: Score) -> Self {
        Self {
            symbols: SymbolSet::default(),
            cards: Vec::new(),
            score: 0,
            moves: 0,
            started_at: None,
            completed_at: None,
            best_score,
        }
    }

    pub fn phase(&self) -> GamePhase {
        match (self.started_at, self.completed_at) {
            (None, _) => GamePhase::NotStarted,
            (Some(_), None) => GamePhase::InProgress,
            (Some(_), Some(_)) => GamePhase::Completed,
        }
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(usize::from(id))
    }

    pub fn label_of(&self, card: &Card) -> Option<&str> {
        self.symbols.label(card.symbol())
    }

    /// Matched pairs found so far in this game.
    pub fn score(&self) -> Score {
        self.score
    }

    /// Pair attempts made so far, successful or not.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn best_score(&self) -> Score {
        self.best_score
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn pair_count(&self) -> Score {
        self.symbols.pair_count()
    }

    /// Face-up cards that are not matched yet, in id order.
    pub fn pending_pair(&self) -> SmallVec<[CardId; 2]> {
        self.cards
            .iter()
            .filter(|card| card.is_pending())
            .map(Card::id)
            .collect()
    }

    pub fn is_all_matched(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(Card::is_matched)
    }

    /// Whole seconds between start and completion, zero unless both are known.
    pub fn elapsed_secs(&self) -> u64 {
        match (self.started_at, self.completed_at) {
            (Some(started_at), Some(completed_at)) => completed_at.secs_since(started_at),
            _ => 0,
        }
    }

    /// Seconds to show on a live timer: frozen once completed.
    pub fn running_secs(&self, now: Timestamp) -> u64 {
        match self.started_at {
            Some(started_at) => self.completed_at.unwrap_or(now).secs_since(started_at),
            None => 0,
        }
    }

    fn card_mut(&mut self, id: CardId) -> &mut Card {
        &mut self.cards[usize::from(id)]
    }
}

/// Rules of the pair-matching game over a fixed, even-sized deck.
#[derive(Debug)]
pub struct MemoryEngine<C, S> {
    clock: C,
    store: S,
    state: GameState,
    generation: u64,
    pending_unflip: Option<UnflipTicket>,
}

impl<C: Clock, S: ScoreStore> MemoryEngine<C, S> {
    /// Creates an engine with no game started, reading the best score once.
    pub fn new(clock: C, store: S) -> Self {
        let best_score = match store.load(BEST_SCORE_KEY) {
            Ok(best_score) => best_score.unwrap_or(0),
            Err(err) => {
                log::warn!("could not load best score, starting from 0: {err}");
                0
            }
        };

        Self {
            clock,
            store,
            state: GameState::unstarted(best_score),
            generation: 0,
            pending_unflip: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn best_score(&self) -> Score {
        self.state.best_score
    }

    pub fn pending_unflip(&self) -> Option<UnflipTicket> {
        self.pending_unflip
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.state.elapsed_secs()
    }

    pub fn running_secs(&self) -> u64 {
        self.state.running_secs(self.clock.now())
    }

    /// Deals a fresh board of two cards per symbol. On error the current game
    /// is left as it was.
    pub fn new_game<I, G>(&mut self, symbols: I, generator: G) -> Result<&GameState>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        G: DeckGenerator,
    {
        let symbols = SymbolSet::new(symbols)?;
        Ok(self.start_with_deck(generator.generate(symbols)))
    }

    /// Starts a game on an already dealt deck.
    pub fn start_with_deck(&mut self, deck: Deck) -> &GameState {
        self.cancel_unflip();

        let (symbols, cards) = deck.into_parts();
        let now = self.clock.now();
        log::debug!("new game: {} pairs at {}", symbols.pair_count(), now);

        self.state = GameState {
            symbols,
            cards,
            score: 0,
            moves: 0,
            started_at: Some(now),
            completed_at: None,
            best_score: self.state.best_score,
        };
        &self.state
    }

    pub fn select_card(&mut self, card_id: CardId) -> SelectOutcome {
        use SelectOutcome::*;

        if !self.state.phase().is_in_progress() {
            log::trace!("ignored selection of {card_id}: no game in progress");
            return NoChange;
        }

        match self.state.card(card_id) {
            None => {
                log::trace!("ignored selection of unknown card {card_id}");
                return NoChange;
            }
            Some(card) if card.is_face_up() => {
                log::trace!("ignored selection of face-up card {card_id}");
                return NoChange;
            }
            Some(_) => {}
        }

        let pending = self.state.pending_pair();
        if pending.len() >= 2 {
            for id in pending {
                self.state.card_mut(id).flip_down();
            }
            self.cancel_unflip();
            self.state.card_mut(card_id).flip_up();
            return ClickedThrough;
        }

        self.state.card_mut(card_id).flip_up();

        let (first, second) = match self.state.pending_pair().as_slice() {
            &[first, second] => (first, second),
            _ => return Flipped,
        };
        self.state.moves = self.state.moves.saturating_add(1);

        let same_symbol = self.state.card(first).map(Card::symbol)
            == self.state.card(second).map(Card::symbol);
        if same_symbol {
            self.state.card_mut(first).mark_matched();
            self.state.card_mut(second).mark_matched();
            self.state.score = self.state.score.saturating_add(1);
            self.record_best_score();

            if self.finish_if_complete() {
                Completed
            } else {
                Matched
            }
        } else {
            Mismatched(self.schedule_unflip([first, second]))
        }
    }

    /// Applies a deferred unflip if its ticket is still the outstanding one.
    pub fn resolve_unflip(&mut self, ticket: UnflipTicket) -> UnflipOutcome {
        if self.pending_unflip != Some(ticket) {
            log::trace!("dropped stale unflip {:?}", ticket);
            return UnflipOutcome::Stale;
        }
        self.pending_unflip = None;

        for id in ticket.cards {
            if let Some(card) = self.state.cards.get_mut(usize::from(id)) {
                if card.is_pending() {
                    card.flip_down();
                }
            }
        }
        UnflipOutcome::FlippedDown
    }

    fn schedule_unflip(&mut self, cards: [CardId; 2]) -> UnflipTicket {
        self.generation = self.generation.wrapping_add(1);
        let ticket = UnflipTicket::new(self.generation, cards);
        self.pending_unflip = Some(ticket);
        ticket
    }

    fn cancel_unflip(&mut self) {
        if self.pending_unflip.take().is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
    }

    fn finish_if_complete(&mut self) -> bool {
        if self.state.completed_at.is_some() || !self.state.is_all_matched() {
            return false;
        }

        let now = self.clock.now();
        let completed_at = self.state.started_at.map_or(now, |started_at| now.max(started_at));
        self.state.completed_at = Some(completed_at);
        log::debug!(
            "game completed: {} pairs in {}s",
            self.state.score,
            self.state.elapsed_secs()
        );
        true
    }

    fn record_best_score(&mut self) {
        if self.state.score <= self.state.best_score {
            return;
        }

        self.state.best_score = self.state.score;
        if let Err(err) = self.store.save(BEST_SCORE_KEY, self.state.best_score) {
            log::warn!("could not persist best score: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rand::prelude::*;
    use rand::rngs::SmallRng;

    const T0: Timestamp = Timestamp::from_millis(1_000_000);

    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn load(&self, _key: &str) -> core::result::Result<Option<Score>, StoreError> {
            Err(StoreError::Unavailable)
        }

        fn save(&mut self, _key: &str, _value: Score) -> core::result::Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    fn engine() -> (ManualClock, MemoryEngine<ManualClock, MemoryStore>) {
        let clock = ManualClock::new(T0);
        (clock.clone(), MemoryEngine::new(clock, MemoryStore::new()))
    }

    fn ab_deck() -> Deck {
        let symbols = SymbolSet::new(["A", "B"]).unwrap();
        Deck::from_symbol_order(symbols, &[0, 1, 0, 1]).unwrap()
    }

    fn pending_count(state: &GameState) -> usize {
        state.pending_pair().len()
    }

    #[test]
    fn new_game_deals_two_of_each_face_down() {
        let (_, mut engine) = engine();

        let state = engine
            .new_game(["🍎", "🍌", "🍒"], RandomDeckGenerator::new(9))
            .unwrap();

        assert_eq!(state.cards().len(), 6);
        assert!(state.cards().iter().all(|card| !card.is_face_up()));
        assert_eq!(state.score(), 0);
        assert_eq!(state.started_at(), Some(T0));
        assert_eq!(state.completed_at(), None);
        assert_eq!(state.phase(), GamePhase::InProgress);
        for symbol in 0..3 {
            let copies = state
                .cards()
                .iter()
                .filter(|card| card.symbol() == symbol)
                .count();
            assert_eq!(copies, 2);
        }
    }

    #[test]
    fn fixed_deck_is_dealt_as_laid_out() {
        let symbols = SymbolSet::new(["X", "Y"]).unwrap();
        let deck = Deck::from_symbol_order(symbols.clone(), &[1, 1, 0, 0]).unwrap();
        let (_, mut engine) = engine();

        let state = engine.start_with_deck(deck);

        assert_eq!(state.symbols(), &symbols);
        assert_eq!(
            state.cards().iter().map(Card::symbol).collect::<Vec<_>>(),
            vec![1, 1, 0, 0]
        );
        assert_eq!(state.label_of(&state.cards()[0]), Some("Y"));
    }

    #[test]
    fn new_game_with_empty_symbols_keeps_previous_board() {
        let (_, mut engine) = engine();
        engine.start_with_deck(ab_deck());
        engine.select_card(0);
        let before = engine.state().clone();

        let none: [&str; 0] = [];
        let err = engine.new_game(none, RandomDeckGenerator::new(0)).unwrap_err();

        assert_eq!(
            err,
            GameError::InvalidConfiguration(ConfigIssue::EmptySymbolSet)
        );
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn selection_before_start_is_ignored() {
        let (_, mut engine) = engine();

        assert_eq!(engine.select_card(0), SelectOutcome::NoChange);
        assert_eq!(engine.state().phase(), GamePhase::NotStarted);
    }

    #[test]
    fn face_up_and_unknown_cards_are_ignored() {
        let (_, mut engine) = engine();
        engine.start_with_deck(ab_deck());

        assert_eq!(engine.select_card(0), SelectOutcome::Flipped);
        let before = engine.state().clone();

        assert_eq!(engine.select_card(0), SelectOutcome::NoChange);
        assert_eq!(engine.select_card(42), SelectOutcome::NoChange);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn matched_cards_are_ignored() {
        let (_, mut engine) = engine();
        engine.start_with_deck(ab_deck());
        engine.select_card(0);
        assert_eq!(engine.select_card(2), SelectOutcome::Matched);
        let before = engine.state().clone();

        assert_eq!(engine.select_card(2), SelectOutcome::NoChange);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn scripted_game_with_click_through() {
        let (clock, mut engine) = engine();
        engine.start_with_deck(ab_deck());

        assert_eq!(engine.select_card(0), SelectOutcome::Flipped);
        assert!(engine.state().card(0).unwrap().is_face_up());

        let outcome = engine.select_card(1);
        let ticket = outcome.scheduled_unflip().expect("mismatch schedules unflip");
        assert_eq!(ticket.cards(), [0, 1]);
        assert_eq!(ticket.delay_ms(), 1000);
        assert_eq!(engine.state().score(), 0);

        clock.advance(400);
        assert_eq!(engine.select_card(2), SelectOutcome::ClickedThrough);
        assert!(!engine.state().card(0).unwrap().is_face_up());
        assert!(!engine.state().card(1).unwrap().is_face_up());
        assert!(engine.state().card(2).unwrap().is_face_up());
        assert_eq!(engine.pending_unflip(), None);

        assert_eq!(engine.select_card(0), SelectOutcome::Matched);
        assert_eq!(engine.state().score(), 1);

        clock.advance(600);
        assert_eq!(engine.resolve_unflip(ticket), UnflipOutcome::Stale);
        assert!(engine.state().card(0).unwrap().is_matched());

        assert_eq!(engine.select_card(1), SelectOutcome::Flipped);
        clock.advance(2_500);
        assert_eq!(engine.select_card(3), SelectOutcome::Completed);

        let state = engine.state();
        assert_eq!(state.score(), 2);
        assert_eq!(state.moves(), 3);
        assert_eq!(state.completed_at(), Some(T0.saturating_add_millis(3_500)));
        assert_eq!(engine.elapsed_secs(), 3);
        assert_eq!(engine.best_score(), 2);
        assert_eq!(state.phase(), GamePhase::Completed);
    }

    #[test]
    fn deferred_unflip_turns_mismatch_face_down() {
        let (clock, mut engine) = engine();
        engine.start_with_deck(ab_deck());
        engine.select_card(0);
        let ticket = engine.select_card(1).scheduled_unflip().unwrap();

        clock.advance(u64::from(UNFLIP_DELAY_MS));

        assert_eq!(engine.resolve_unflip(ticket), UnflipOutcome::FlippedDown);
        assert_eq!(pending_count(engine.state()), 0);
        assert_eq!(engine.pending_unflip(), None);
        assert_eq!(engine.resolve_unflip(ticket), UnflipOutcome::Stale);
    }

    #[test]
    fn stale_unflip_does_not_touch_newer_pending_cards() {
        let symbols = SymbolSet::new(["A", "B", "C"]).unwrap();
        let deck = Deck::from_symbol_order(symbols, &[0, 1, 2, 0, 1, 2]).unwrap();
        let (_, mut engine) = engine();
        engine.start_with_deck(deck);

        engine.select_card(0);
        let first = engine.select_card(1).scheduled_unflip().unwrap();

        // third pick lands just as the timer fires
        assert_eq!(engine.select_card(2), SelectOutcome::ClickedThrough);
        let second = engine.select_card(0).scheduled_unflip().unwrap();
        assert_ne!(first, second);

        assert_eq!(engine.resolve_unflip(first), UnflipOutcome::Stale);
        assert_eq!(engine.state().pending_pair().as_slice(), &[0, 2]);

        assert_eq!(engine.resolve_unflip(second), UnflipOutcome::FlippedDown);
        assert_eq!(pending_count(engine.state()), 0);
    }

    #[test]
    fn new_game_cancels_outstanding_unflip() {
        let (_, mut engine) = engine();
        engine.start_with_deck(ab_deck());
        engine.select_card(0);
        let ticket = engine.select_card(1).scheduled_unflip().unwrap();

        engine.start_with_deck(ab_deck());
        engine.select_card(0);
        engine.select_card(1);
        let before = engine.state().clone();

        assert_eq!(engine.resolve_unflip(ticket), UnflipOutcome::Stale);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn best_score_survives_engine_recreation() {
        let mut store = MemoryStore::with_value(BEST_SCORE_KEY, 1);

        {
            let mut engine = MemoryEngine::new(ManualClock::new(T0), &mut store);
            assert_eq!(engine.best_score(), 1);
            engine.start_with_deck(ab_deck());
            for id in [0, 2, 1, 3] {
                engine.select_card(id);
            }
            assert_eq!(engine.best_score(), 2);
        }

        assert_eq!(store.load(BEST_SCORE_KEY), Ok(Some(2)));
        let engine = MemoryEngine::new(ManualClock::new(T0), &mut store);
        assert_eq!(engine.state().best_score(), 2);
    }

    #[test]
    fn partial_score_is_kept_after_abandoned_game() {
        let mut store = MemoryStore::new();

        {
            let mut engine = MemoryEngine::new(ManualClock::new(T0), &mut store);
            engine.start_with_deck(ab_deck());
            engine.select_card(0);
            assert_eq!(engine.select_card(2), SelectOutcome::Matched);
            assert_eq!(engine.best_score(), 1);

            engine.start_with_deck(ab_deck());
            assert_eq!(engine.state().score(), 0);
            assert_eq!(engine.best_score(), 1);
        }

        assert_eq!(store.load(BEST_SCORE_KEY), Ok(Some(1)));
    }

    #[test]
    fn lower_score_keeps_best_score() {
        let store = MemoryStore::with_value(BEST_SCORE_KEY, 5);
        let mut engine = MemoryEngine::new(ManualClock::new(T0), store);

        engine.start_with_deck(ab_deck());
        for id in [0, 2, 1, 3] {
            engine.select_card(id);
        }

        assert_eq!(engine.state().score(), 2);
        assert_eq!(engine.best_score(), 5);
        assert_eq!(engine.store().load(BEST_SCORE_KEY), Ok(Some(5)));
    }

    #[test]
    fn broken_store_degrades_to_memory() {
        let mut engine = MemoryEngine::new(ManualClock::new(T0), BrokenStore);
        assert_eq!(engine.best_score(), 0);

        engine.start_with_deck(ab_deck());
        for id in [0, 2, 1, 3] {
            engine.select_card(id);
        }

        assert_eq!(engine.state().phase(), GamePhase::Completed);
        assert_eq!(engine.best_score(), 2);
    }

    #[test]
    fn completed_game_ignores_selection() {
        let (_, mut engine) = engine();
        engine.start_with_deck(ab_deck());
        for id in [0, 2, 1, 3] {
            engine.select_card(id);
        }
        let before = engine.state().clone();

        assert_eq!(engine.select_card(0), SelectOutcome::NoChange);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn running_timer_freezes_on_completion() {
        let (clock, mut engine) = engine();
        assert_eq!(engine.running_secs(), 0);

        engine.start_with_deck(ab_deck());
        clock.advance(1_999);
        assert_eq!(engine.running_secs(), 1);
        assert_eq!(engine.elapsed_secs(), 0);

        for id in [0, 2, 1, 3] {
            engine.select_card(id);
        }
        clock.advance(60_000);

        assert_eq!(engine.running_secs(), 1);
        assert_eq!(engine.elapsed_secs(), 1);
    }

    #[test]
    fn single_pair_game_completes_on_first_match() {
        let (_, mut engine) = engine();
        engine.new_game(["★"], RandomDeckGenerator::new(3)).unwrap();

        assert_eq!(engine.select_card(0), SelectOutcome::Flipped);
        assert_eq!(engine.select_card(1), SelectOutcome::Completed);
        assert_eq!(engine.state().score(), 1);
    }

    #[test]
    fn random_play_preserves_invariants() {
        let mut rng = SmallRng::seed_from_u64(0xC0FFEE);

        for round in 0..50u64 {
            let pairs = rng.random_range(1..=8usize);
            let labels: Vec<_> = (0..pairs).map(|i| alloc::format!("{i}")).collect();
            let (clock, mut engine) = engine();
            engine
                .new_game(labels, RandomDeckGenerator::new(round))
                .unwrap();

            let mut last_score = 0;
            let mut outstanding = vec![];
            for _ in 0..400 {
                if engine.state().phase().is_finished() {
                    break;
                }
                clock.advance(rng.random_range(0..1_500));

                if !outstanding.is_empty() && rng.random_bool(0.3) {
                    let ticket = outstanding.swap_remove(rng.random_range(0..outstanding.len()));
                    engine.resolve_unflip(ticket);
                } else {
                    let card_id = rng.random_range(0..(pairs as CardId * 2 + 1));
                    if let Some(ticket) = engine.select_card(card_id).scheduled_unflip() {
                        outstanding.push(ticket);
                    }
                }

                let state = engine.state();
                assert!(pending_count(state) <= 2);
                assert!(state.score() >= last_score);
                assert!(state.best_score() >= state.score());
                last_score = state.score();
                let matched = state.cards().iter().filter(|card| card.is_matched()).count();
                assert_eq!(matched, usize::from(state.score()) * 2);
                assert!(state.cards().iter().all(|card| !card.is_matched() || card.is_face_up()));
                assert_eq!(
                    state.completed_at().is_some(),
                    state.score() == state.pair_count()
                );
                assert!(u32::from(state.score()) <= state.moves());
            }
        }
    }

    #[test]
    fn game_state_snapshot_round_trips_through_json() {
        let (_, mut engine) = engine();
        engine.start_with_deck(ab_deck());
        engine.select_card(0);

        let json = serde_json::to_string(engine.state()).unwrap();
        let restored: GameState = serde_json::from_str(&json).unwrap();

        assert_eq!(&restored, engine.state());
    }
}
