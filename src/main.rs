use dioxus::prelude::*;
use tracing::Level;

mod api;
mod components;
mod config;
mod db;
mod utils;

use components::StoryApp;

const APP_CSS: Asset = asset!("/assets/styling/app.css");

fn main() {
    if let Err(err) = dioxus::logger::init(Level::INFO) {
        eprintln!("Failed to initialize logging: {err}");
    }
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "Story Loop" }
        document::Meta { name: "theme-color", content: "#1890ff" }
        document::Meta { name: "mobile-web-app-capable", content: "yes" }
        document::Stylesheet { href: APP_CSS }

        StoryApp {}
    }
}
