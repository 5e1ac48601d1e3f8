use gemchat::config::{init_tracing, load_dotenv};

fn main() {
    load_dotenv();
    init_tracing();
    dioxus::launch(gemchat::ui::App);
}
