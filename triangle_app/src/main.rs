//! Hello Triangle application
//!
//! Opens an 800x600 OpenGL 3.3 core window and draws one triangle until the
//! window is closed or Escape is pressed. Settings are read from
//! `hello_triangle.toml` in the working directory when that file exists.

use triangle_engine::core::config::AppConfig;
use triangle_engine::foundation::logging;

const CONFIG_PATH: &str = "hello_triangle.toml";

fn main() {
    // Set up panic hook for better error reporting
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC occurred: {panic_info}");
    }));

    let config = match AppConfig::load_or_default(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            if let Err(log_err) = logging::init(log::LevelFilter::Info) {
                eprintln!("Logger already initialized: {log_err}");
            }
            log::error!("Failed to load {CONFIG_PATH}: {e}");
            std::process::exit(1);
        }
    };

    // Config was validated on load, so the level parses
    let level = config.engine.level_filter().unwrap_or(log::LevelFilter::Info);
    if let Err(e) = logging::init(level) {
        eprintln!("Logger already initialized: {e}");
    }

    log::info!("Starting Hello Triangle");

    match triangle_engine::run(&config) {
        Ok(stats) => {
            log::info!("Rendered {} frames", stats.frames);
            log::info!("Hello Triangle exited cleanly");
        }
        Err(e) => {
            log::error!("Hello Triangle failed: {e}");
            std::process::exit(1);
        }
    }
}
