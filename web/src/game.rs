use crate::theme::Theme;
use crate::utils::*;
use clap::Args;
use gloo::timers::callback::{Interval, Timeout};
use pairflip_core as game;
use yew::prelude::*;

/// Face values used when no other symbol set is configured.
pub(crate) const DEFAULT_SYMBOLS: [&str; 8] = ["🍎", "🍋", "🍇", "🍒", "🥝", "🍑", "🍍", "🥥"];

const GRID_COLUMNS: usize = 4;

type Engine = game::MemoryEngine<game::SystemClock, LocalScoreStore>;

#[derive(Args, Debug, Clone, PartialEq)]
pub(crate) struct GameOptions {
    /// Force a seed for the first deal instead of random
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of pairs on the board
    #[arg(short, long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(1..=8))]
    pub pairs: u8,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            seed: None,
            pairs: DEFAULT_SYMBOLS.len() as u8,
        }
    }
}

impl GameOptions {
    fn symbols(&self) -> &'static [&'static str] {
        let pairs = usize::from(self.pairs).clamp(1, DEFAULT_SYMBOLS.len());
        &DEFAULT_SYMBOLS[..pairs]
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum ViewCardState {
    Hidden,
    Revealed,
    Matched,
}

impl ViewCardState {
    fn of(card: &game::Card) -> Self {
        match (card.is_face_up(), card.is_matched()) {
            (_, true) => Self::Matched,
            (true, false) => Self::Revealed,
            (false, false) => Self::Hidden,
        }
    }

    fn class_names(self, locked: bool) -> Vec<&'static str> {
        let mut names = vec!["card"];
        match self {
            Self::Hidden => {}
            Self::Revealed => names.push("up"),
            Self::Matched => names.extend(["up", "matched"]),
        }
        if locked {
            names.push("locked");
        }
        names
    }
}

/// A card can be clicked while the game runs and it is still face-down.
fn is_locked(state: &game::GameState, card: &game::Card) -> bool {
    !state.phase().is_in_progress() || card.is_face_up()
}

fn game_state_class(phase: game::GamePhase) -> &'static str {
    use game::GamePhase::*;
    match phase {
        NotStarted => "not-started",
        InProgress => "in-progress",
        Completed => "win",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Select(game::CardId),
    Unflip(game::UnflipTicket),
    UpdateTime,
    NewGame,
}

#[derive(Properties, Clone, PartialEq)]
struct CardProps {
    id: game::CardId,
    label: AttrValue,
    card_state: ViewCardState,
    #[prop_or_default]
    locked: bool,
    callback: Callback<game::CardId>,
}

#[function_component(CardView)]
fn card_component(props: &CardProps) -> Html {
    let CardProps {
        id,
        label,
        card_state,
        locked,
        callback,
    } = props.clone();

    let class = classes!(card_state.class_names(locked));
    let onclick = Callback::from(move |_: MouseEvent| {
        log::trace!("card {} clicked", id);
        callback.emit(id);
    });

    html! {
        <li {class} {onclick}>
            <span class="back"/>
            <span class="face">{label}</span>
        </li>
    }
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct GameProps {
    pub options: GameOptions,
    #[prop_or_default]
    pub theme: Theme,
}

pub(crate) struct GameView {
    engine: Engine,
    seed: u64,
    prev_time: u64,
    best_at_start: game::Score,
    unflip_timeout: Option<Timeout>,
    _timer_interval: Interval,
}

impl GameView {
    fn start_game(&mut self, options: &GameOptions) {
        self.unflip_timeout = None;
        self.best_at_start = self.engine.best_score();
        self.prev_time = 0;

        let generator = game::RandomDeckGenerator::new(self.seed);
        match self.engine.new_game(options.symbols().iter().copied(), generator) {
            Ok(state) => log::debug!("dealt {} cards, seed {}", state.cards().len(), self.seed),
            Err(err) => log::error!("could not start game: {}", err),
        }
    }

    fn select_card(&mut self, ctx: &Context<Self>, card_id: game::CardId) -> bool {
        let outcome = self.engine.select_card(card_id);
        log::debug!("select {}: {:?}", card_id, outcome);

        if let Some(ticket) = outcome.scheduled_unflip() {
            let link = ctx.link().clone();
            // replacing the previous timeout cancels it
            self.unflip_timeout = Some(Timeout::new(ticket.delay_ms(), move || {
                link.send_message(Msg::Unflip(ticket))
            }));
        } else if outcome.cancels_unflip() {
            self.unflip_timeout = None;
        }

        if matches!(outcome, game::SelectOutcome::Completed) {
            log::info!(
                "board cleared in {}s, best {}",
                self.engine.elapsed_secs(),
                self.engine.best_score()
            );
        }

        outcome.has_update()
    }

    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(500, move || link.send_message(Msg::UpdateTime))
    }

    fn view_header(&self, ctx: &Context<Self>) -> Html {
        let state = self.engine.state();
        let score = format_for_counter(state.score().into());
        let best = format_for_counter(state.best_score().into());
        let moves = format_for_counter(state.moves().into());
        let elapsed_time = format_for_counter(self.engine.running_secs());
        let state_class = game_state_class(state.phase());

        let cb_new_game = ctx.link().callback(|e: MouseEvent| {
            e.stop_propagation();
            Msg::NewGame
        });

        html! {
            <nav>
                <aside title="Pairs found">{score}</aside>
                <aside title="Best score">{best}</aside>
                <span><button class={state_class} onclick={cb_new_game} title="New game"/></span>
                <aside title="Moves">{moves}</aside>
                <aside title="Time">{elapsed_time}</aside>
            </nav>
        }
    }

    fn view_banner(&self) -> Html {
        let state = self.engine.state();
        if !state.phase().is_finished() {
            return html! {};
        }

        html! {
            <p class="banner">
                {format!(
                    "All {} pairs in {} moves, {}s",
                    state.score(),
                    state.moves(),
                    state.elapsed_secs()
                )}
                if self.engine.best_score() > self.best_at_start {
                    <strong>{" New best!"}</strong>
                }
            </p>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let options = &ctx.props().options;
        let mut view = Self {
            engine: game::MemoryEngine::new(game::SystemClock, LocalScoreStore),
            seed: options.seed.unwrap_or_else(js_random_seed),
            prev_time: 0,
            best_at_start: 0,
            unflip_timeout: None,
            _timer_interval: GameView::create_timer(ctx),
        };
        view.start_game(options);
        view
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            Select(card_id) => self.select_card(ctx, card_id),
            Unflip(ticket) => {
                let outcome = self.engine.resolve_unflip(ticket);
                log::trace!("unflip {:?}: {:?}", ticket.cards(), outcome);
                if outcome.has_update() {
                    self.unflip_timeout = None;
                }
                outcome.has_update()
            }
            UpdateTime => {
                let time = self.engine.running_secs();
                if self.prev_time != time {
                    self.prev_time = time;
                    true
                } else {
                    false
                }
            }
            NewGame => {
                self.seed = js_random_seed();
                self.start_game(&ctx.props().options);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let state = self.engine.state();
        let theme = ctx.props().theme;
        let callback = ctx.link().callback(Msg::Select);
        let rows = state.cards().len().div_ceil(GRID_COLUMNS);

        html! {
            <div class={classes!("pairflip", theme.scheme())}>
                {self.view_header(ctx)}
                <ul class="board" style={format!("--rows: {}; --columns: {}", rows, GRID_COLUMNS)}>
                    {
                        for state.cards().iter().map(|card| {
                            let id = card.id();
                            let label = AttrValue::from(state.label_of(card).unwrap_or("?").to_string());
                            let card_state = ViewCardState::of(card);
                            let locked = is_locked(state, card);
                            let callback = callback.clone();
                            html! {
                                <CardView key={id} {id} {label} {card_state} {locked} {callback}/>
                            }
                        })
                    }
                </ul>
                {self.view_banner()}
            </div>
        }
    }
}
