use std::sync::Arc;

use gpui::{
    App, AppContext, Application, Bounds, WindowAppearance, WindowBounds, WindowOptions, px, size,
};
use gpui_component::Root;

use pictor::app::ThemeController;
use pictor::infra::prefs::FilePreferenceStore;

mod backend;
mod request;
mod state;
mod theme;
mod utils;
mod window;

const WINDOW_WIDTH: f32 = 1080.0;
const WINDOW_HEIGHT: f32 = 760.0;
const JOB_UPDATE_POLL_INTERVAL_MS: u64 = 50;
const GENERATE_REENABLE_MS: u64 = 1500;
const PROMPT_TYPING_INTERVAL_MS: u64 = 10;
const NOTICE_DISMISS_MS: u64 = 5000;
const GALLERY_SLOT_WIDTH_PX: f32 = 240.0;

const DEFAULT_IMAGE_COUNT: u8 = 1;
const DEFAULT_ASPECT_RATIO: &str = "1/1";
const IMAGE_COUNT_CHOICES: [u8; 4] = [1, 2, 3, 4];
const ASPECT_RATIO_CHOICES: [&str; 5] = ["1/1", "16/9", "9/16", "3/2", "4/3"];

const DEFAULT_PROMPT: &str = "A futuristic city skyline at sunset";
const PROMPT_PLACEHOLDER: &str =
    "Describe your image, for example: A dragon sleeping on gold coins in a crystal cave.";
const SLOT_LOADING_MESSAGE: &str = "Generating...";
const SLOT_FAILED_MESSAGE: &str = "Failed to load image!";
const SLOT_FAILED_GLYPH: &str = "⚠";
const DOWNLOAD_FAILED_NOTICE: &str = "Failed to download image. Please try again.";

const EXAMPLE_PROMPTS: [&str; 5] = [
    "A magic forest with glowing plants and fairy homes among giant mushrooms",
    "A futuristic city skyline at sunset with flying cars",
    "A cyberpunk street full of neon lights and rain reflections",
    "A dragon sleeping on gold coins in a crystal cave",
    "An astronaut walking on an alien planet with purple skies",
];

const DEBUG_PROMPT_LOG_ENV: &str = "PICTOR_DEBUG_PROMPT_LOG";
const DEBUG_PROMPT_PREVIEW_CHARS: usize = 120;

pub(crate) fn run_app() {
    Application::new().run(|cx: &mut App| {
        gpui_component::init(cx);

        let preference_store = Arc::new(FilePreferenceStore::from_default_location());
        let system_prefers_dark = matches!(
            cx.window_appearance(),
            WindowAppearance::Dark | WindowAppearance::VibrantDark
        );
        let theme_controller = ThemeController::bootstrap(preference_store, system_prefers_dark);
        theme::apply_theme_mode(theme_controller.mode(), cx);

        let bounds = Bounds::centered(None, size(px(WINDOW_WIDTH), px(WINDOW_HEIGHT)), cx);
        let options = WindowOptions {
            window_bounds: Some(WindowBounds::Windowed(bounds)),
            ..Default::default()
        };

        if cx
            .open_window(options, |window, cx| {
                let view = cx.new(|cx| window::PictorMainWindow::new(theme_controller, window, cx));
                cx.new(|cx| Root::new(view, window, cx))
            })
            .is_err()
        {
            cx.quit();
            return;
        }

        cx.on_window_closed(|cx| {
            if cx.windows().is_empty() {
                cx.quit();
            }
        })
        .detach();

        cx.activate(true);
    });
}
