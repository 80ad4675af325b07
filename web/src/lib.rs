use clap::Parser;
use wasm_bindgen::prelude::*;
use yew::prelude::*;

mod game;
mod theme;
mod utils;

use game::{GameOptions, GameView};
use theme::{Theme, ThemeToggle};

/// Options are read from the page hash, e.g. `#-vv&--seed=42&--pairs=6`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(flatten)]
    game: GameOptions,
}

#[derive(Properties, Clone, PartialEq)]
struct AppProps {
    options: GameOptions,
}

#[function_component(App)]
fn app(props: &AppProps) -> Html {
    let theme = use_state(Theme::init);

    let on_toggle = {
        let theme = theme.clone();
        Callback::from(move |()| {
            let next = theme.toggled();
            next.apply();
            theme.set(next);
        })
    };

    html! {
        <main>
            <ThemeToggle theme={*theme} {on_toggle}/>
            <GameView options={props.options.clone()} theme={*theme}/>
        </main>
    }
}

fn parse_args(location_hash: &str) -> Result<Args, clap::Error> {
    Args::try_parse_from(location_hash.split(['#', '&']))
}

#[wasm_bindgen(start)]
pub fn run_app() {
    use gloo::utils::{document, window};

    #[cfg(feature = "console_error_panic_hook")]
    {
        console_error_panic_hook::set_once();
    }

    let location_hash = window()
        .location()
        .hash()
        .unwrap_or_else(|_| "".to_string());

    let (args, parse_error) = match parse_args(&location_hash) {
        Ok(args) => (args, None),
        Err(err) => (Args::parse_from([""]), Some(err)),
    };
    if let Some(log_level) = args.verbose.log_level() {
        if let Err(err) = console_log::init_with_level(log_level) {
            gloo::console::error!(format!("Error initializing logger: {err}"));
        }
    }
    if let Some(err) = parse_error {
        log::warn!("ignoring invalid options {:?}: {}", location_hash, err);
    }
    log::debug!("options: {:?}", args.game);

    let Some(root) = document().get_element_by_id("pairflip") else {
        log::error!("Could not find id=\"pairflip\" element");
        return;
    };

    log::debug!("App started");
    yew::Renderer::<App>::with_root_and_props(root, AppProps { options: args.game }).render();
}
