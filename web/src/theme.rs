use crate::utils::*;
use serde::{Deserialize, Serialize};
use yew::prelude::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const ATTR_NAME: &'static str = "data-theme";

    pub(crate) const fn scheme(self) -> &'static str {
        use Theme::*;
        match self {
            Light => "light",
            Dark => "dark",
        }
    }

    pub(crate) const fn toggled(self) -> Self {
        use Theme::*;
        match self {
            Light => Dark,
            Dark => Light,
        }
    }

    const fn icon(self) -> &'static str {
        use Theme::*;
        match self {
            Light => "☾",
            Dark => "☀",
        }
    }

    fn update_html(self) {
        use gloo::utils::document;
        let html = match document().query_selector("html") {
            Ok(Some(html)) => html,
            _ => {
                log::error!("no html element to theme");
                return;
            }
        };
        let scheme = self.scheme();
        log::debug!("theme-scheme: {}", scheme);
        if let Err(err) = html.set_attribute(Self::ATTR_NAME, scheme) {
            log::error!("failed to set theme: {:?}", err);
        }
    }

    /// Loads the saved preference, falling back to light, and applies it.
    pub(crate) fn init() -> Self {
        let saved: Option<Self> = LocalOrDefault::local_or_default();
        let theme = saved.unwrap_or_default();
        theme.update_html();
        theme
    }

    pub(crate) fn apply(self) {
        Some(self).local_save();
        self.update_html();
    }
}

impl StorageKey for Theme {
    const KEY: &'static str = "pairflip:theme";
}

#[derive(Properties, PartialEq)]
pub(crate) struct ThemeToggleProps {
    pub theme: Theme,
    pub on_toggle: Callback<()>,
}

#[function_component(ThemeToggle)]
pub(crate) fn theme_toggle(props: &ThemeToggleProps) -> Html {
    let onclick = props.on_toggle.reform(|_: MouseEvent| ());
    let title = format!("Switch to {} theme", props.theme.toggled().scheme());

    html! {
        <button class={classes!("theme-toggle", props.theme.scheme())} {onclick} {title}>
            {props.theme.icon()}
        </button>
    }
}
