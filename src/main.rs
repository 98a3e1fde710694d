/// Entry point and frame loop for the terminal front-end.

mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use bobo::config::GameConfig;
use bobo::domain::control::Intent;
use bobo::sim::error::SimError;
use bobo::sim::event::GameEvent;
use bobo::sim::level::load_campaign;
use bobo::sim::step;
use bobo::sim::world::{Phase, World};
use ui::gamepad::GamepadState;
use ui::input::{InputState, IntentFeed};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    // Raw mode owns the terminal; log to stderr only when asked.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let config = GameConfig::load();
    let campaign = load_campaign(&config);
    let mut world = match World::new(config.tuning.clone(), campaign) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Could not start: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    };

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Bobo's Adventure!");
    println!("Reached level {} of {}", world.level_index() + 1, world.level_count());
}

/// What a meta key asked for this frame.
enum Meta {
    Continue,
    Quit,
    /// A level was (re)loaded; carries the transition's events.
    Loaded(Vec<GameEvent>),
}

fn game_loop(
    world: &mut World,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new(&config.gamepad);
    let mut feed = IntentFeed::new();
    let mut pending: Vec<Intent> = Vec::new();
    let mut paused = false;

    let clock = Instant::now();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        match handle_meta(world, &kb, &gp, &mut paused)? {
            Meta::Quit => break,
            Meta::Loaded(events) => {
                play_sounds(sound, &events);
                feed.rearm();
                pending.clear();
            }
            Meta::Continue => {}
        }

        let running = world.phase() == Phase::Playing && !paused;

        // Collect edges every frame so taps shorter than a tick still count.
        if running {
            let held = kb.held().merge(gp.held());
            let now_ms = clock.elapsed().as_millis() as u64;
            pending.extend(feed.diff(held, now_ms));
        }

        if last_tick.elapsed() >= tick_rate {
            let dt_ms = last_tick.elapsed().as_secs_f32() * 1000.0;
            last_tick = Instant::now();
            if running {
                let events = step::step(world, &pending, dt_ms)?;
                pending.clear();
                play_sounds(sound, &events);
            }
        }

        renderer.render(&world.snapshot(), &world.hud(), paused)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn play_sounds(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    if let Some(sfx) = sound {
        sfx.play_events(events);
    }
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1), KeyCode::Char('p'), KeyCode::Char('P')];

fn handle_meta(
    world: &mut World,
    kb: &InputState,
    gp: &GamepadState,
    paused: &mut bool,
) -> Result<Meta, SimError> {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let restart = kb.any_pressed(KEYS_RESTART) || gp.restart_pressed();

    if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        return Ok(Meta::Quit);
    }

    // R starts over from any phase, paused or not.
    if restart && world.phase() != Phase::Title {
        *paused = false;
        return step::fresh_start(world).map(Meta::Loaded);
    }

    if world.phase() == Phase::Playing && kb.any_pressed(KEYS_PAUSE) {
        *paused = !*paused;
        return Ok(Meta::Continue);
    }
    if *paused {
        return Ok(Meta::Continue);
    }

    if !confirm {
        return Ok(Meta::Continue);
    }
    match world.phase() {
        Phase::Title | Phase::GameOver | Phase::Won => step::fresh_start(world).map(Meta::Loaded),
        Phase::LevelComplete => step::advance(world).map(Meta::Loaded),
        Phase::Playing => Ok(Meta::Continue),
    }
}
