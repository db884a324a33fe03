/// Entry point and event loop.

mod app;
mod config;
mod domain;
mod logger;
mod nav;
mod store;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{info, warn};

use app::{App, AppEvent};
use config::AppConfig;
use nav::shortcut::KeyOutcome;
use store::game::GameStateManager;
use store::medium::{FileMedium, MemoryMedium, StorageMedium};
use store::persist::PersistentStateStore;
use ui::gamepad::{GamepadState, PadAction};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const TICK_RATE: Duration = Duration::from_millis(50);

fn main() {
    let config = AppConfig::load();

    if let Err(e) = logger::init(&config.log) {
        eprintln!("Warning: logging disabled ({}): {e}", config.log.file.display());
    }
    info!("questmap {} starting", env!("CARGO_PKG_VERSION"));

    let medium: Box<dyn StorageMedium> = if config.storage.ephemeral {
        info!("ephemeral session, progress is not written to disk");
        Box::new(MemoryMedium::new())
    } else {
        info!("save data in {}", config.storage.dir.display());
        Box::new(FileMedium::new(config.storage.dir.clone()))
    };
    let game = GameStateManager::new(PersistentStateStore::new(medium, config.storage.key.clone()));
    let mut app = App::new(game, &config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = if config.audio_enabled { SoundEngine::new() } else { None };

    let result = event_loop(&mut app, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        warn!("exited with error: {e}");
        eprintln!("Error: {e}");
    }

    if let Some(err) = app.game.last_persist_error() {
        eprintln!("Warning: latest progress was not saved: {err}");
    }
    info!("questmap exiting");
}

fn event_loop(
    app: &mut App,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if kb.resized {
            renderer.invalidate();
        }

        let mut events: Vec<AppEvent> = Vec::new();
        for key in &kb.presses {
            events.extend(app.handle_key(*key));
        }
        for action in gp.actions() {
            events.extend(pad_action(app, action));
        }

        let mut quit = false;
        for event in &events {
            quit |= *event == AppEvent::Quit;
            process_sound_event(sound, event);
        }
        if quit {
            break;
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.tick();
            last_tick = Instant::now();
        }

        if app.take_dirty() || kb.resized {
            renderer.render(app)?;
        }
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Pad actions share the keyboard path; tab buttons jump directly.
fn pad_action(app: &mut App, action: PadAction) -> Option<AppEvent> {
    let code = match action {
        PadAction::Menu => KeyCode::Esc,
        PadAction::Back => KeyCode::Char('['),
        PadAction::Confirm => KeyCode::Enter,
        PadAction::Up => KeyCode::Up,
        PadAction::Down => KeyCode::Down,
        PadAction::Go(tab) => return Some(app.go_to(tab)),
    };
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn process_sound_event(sound: Option<&SoundEngine>, event: &AppEvent) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    match event {
        AppEvent::Menu(KeyOutcome::MenuOpened) => sfx.play_open(),
        AppEvent::Menu(KeyOutcome::MenuClosed) => sfx.play_close(),
        AppEvent::Menu(_) | AppEvent::Moved | AppEvent::Practiced => sfx.play_nav(),
        AppEvent::Denied => sfx.play_deny(),
        AppEvent::RewardClaimed => sfx.play_coin(),
        AppEvent::WorldCleared(_) => sfx.play_unlock(),
        AppEvent::Quit => {}
    }
}
