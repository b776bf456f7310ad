/// Entry point and game loop.

mod config;
mod domain;
mod fetch;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Instant;

use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::GameConfig;
use fetch::{FetchError, HttpSource, PoolLoader};
use sim::event::GameEvent;
use sim::scores::{data_dir, ScoreBoard};
use sim::session::{Phase, Session};
use sim::step;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

/// Banner lifetime in frames.
const MESSAGE_FRAMES: u32 = 90;

fn main() {
    init_tracing();

    let config = GameConfig::load();
    let mut board = ScoreBoard::open(&config.scores.file, config.scores.capacity);

    let mut session = Session::new(&config.timing, StdRng::from_entropy());
    session.dark = config.display.dark;
    session.top_scores = board.scores().to_vec();

    let loader = match HttpSource::new(&config.api) {
        Ok(source) => Some(PoolLoader::spawn(
            source,
            config.api.batch_size,
            config.api.max_character_id,
        )),
        Err(e) => {
            tracing::error!("could not build HTTP client: {e}");
            None
        }
    };

    let sound = if config.display.sound { SoundEngine::new() } else { None };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut ctx = Context {
        session: &mut session,
        board: &mut board,
        loader: loader.as_ref(),
        sound: sound.as_ref(),
    };
    let result = game_loop(&mut ctx, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        tracing::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Rick & Morty Trivia!");
    println!("Final Score: {}", session.state.score);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_path = data_dir().join("rickquiz.log");

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %log_path.display(), "Logging initialized");
        }
        // Without a log file, stay silent rather than write over the TUI.
        Err(_) => tracing_subscriber::registry().with(env_filter).init(),
    }
}

/// Everything the loop mutates besides the renderer.
struct Context<'a> {
    session: &'a mut Session,
    board: &'a mut ScoreBoard,
    loader: Option<&'a PoolLoader>,
    sound: Option<&'a SoundEngine>,
}

fn game_loop(
    ctx: &mut Context<'_>,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let events = step::start(ctx.session);
    process_events(ctx, events, Instant::now());

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || handle_input(ctx, &kb, &gp) {
            break;
        }

        let now = Instant::now();
        while let Some(reply) = ctx.loader.and_then(PoolLoader::try_recv) {
            let events = step::on_pool_loaded(ctx.session, reply.epoch, reply.result, now);
            process_events(ctx, events, now);
        }

        let events = step::advance(ctx.session, now);
        process_events(ctx, events, now);

        ctx.session.tick_frame();
        renderer.render(ctx.session)?;
        std::thread::sleep(config.timing.frame);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_THEME: &[KeyCode] = &[KeyCode::Char('t'), KeyCode::Char('T')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Left];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Right, KeyCode::Tab];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

/// Apply this frame's presses. Returns true when the player quits.
fn handle_input(ctx: &mut Context<'_>, kb: &InputState, gp: &GamepadState) -> bool {
    if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        return true;
    }

    let now = Instant::now();

    if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
        let events = step::restart(ctx.session);
        process_events(ctx, events, now);
        return false;
    }
    if kb.any_pressed(KEYS_THEME) || gp.theme_pressed() {
        ctx.session.dark = !ctx.session.dark;
        return false;
    }

    if ctx.session.phase() != Phase::Playing {
        return false;
    }

    if kb.any_pressed(KEYS_UP) || gp.up_pressed() {
        ctx.session.move_cursor(-1);
    } else if kb.any_pressed(KEYS_DOWN) || gp.down_pressed() {
        ctx.session.move_cursor(1);
    }

    let chosen = kb
        .slot_pressed()
        .or_else(|| gp.option_pressed())
        .or_else(|| {
            (kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed()).then_some(ctx.session.cursor)
        });
    if let Some(slot) = chosen {
        let events = step::submit_slot(ctx.session, slot, now);
        process_events(ctx, events, now);
    }

    false
}

/// Side effects of game events: sound, persistence, fetch requests, banners.
fn process_events(ctx: &mut Context<'_>, events: Vec<GameEvent>, now: Instant) {
    let sfx = ctx.sound;
    for event in events {
        match event {
            GameEvent::PoolRequested { epoch } => {
                let sent = ctx
                    .loader
                    .ok_or(FetchError::WorkerGone)
                    .and_then(|loader| loader.request(epoch));
                if let Err(e) = sent {
                    let events = step::on_pool_loaded(ctx.session, epoch, Err(e), now);
                    process_events(ctx, events, now);
                }
            }
            GameEvent::PoolLoaded { size } => tracing::debug!(size, "pool ready"),
            GameEvent::PoolFailed | GameEvent::QuestionUnavailable => {}
            GameEvent::QuestionShown => {
                if let Some(s) = sfx { s.play_question(); }
            }
            GameEvent::Answered { correct, .. } => {
                if let Some(s) = sfx {
                    if correct { s.play_correct() } else { s.play_wrong() }
                }
            }
            GameEvent::TierUp => {
                if let Some(s) = sfx { s.play_tier_up(); }
                let label = ctx.session.state.difficulty.label();
                let msg = format!("Difficulty up: {label}! Lives restored.");
                ctx.session.set_message(&msg, MESSAGE_FRAMES);
            }
            GameEvent::Countdown { .. } => {
                if let Some(s) = sfx { s.play_countdown(); }
            }
            GameEvent::TimedOut => {
                if let Some(s) = sfx { s.play_timeout(); }
                ctx.session.set_message("Time's up! You lost a life.", MESSAGE_FRAMES);
            }
            GameEvent::GameOver { score } => {
                if let Some(s) = sfx { s.play_game_over(); }
                match ctx.board.record(score) {
                    Ok(true) => tracing::info!(score, "new top score"),
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("{e}");
                        ctx.session.set_message("Could not save your score.", MESSAGE_FRAMES);
                    }
                }
                ctx.session.top_scores = ctx.board.scores().to_vec();
            }
        }
    }
}
