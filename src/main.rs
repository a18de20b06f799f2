/// Entry point and game loop.

mod config;
mod domain;
mod provider;
mod quiz;
mod ui;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::ladder;
use provider::loader::Fetcher;
use quiz::engine;
use quiz::event::GameEvent;
use quiz::session::{GameSession, Phase};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    pretty_env_logger::init();

    let config = GameConfig::load();
    let source = provider::select_source(&config.provider);

    let mut session = GameSession::new(config.timing.clone());
    let mut fetcher = Fetcher::new(Arc::clone(&source));

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut fetcher, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Summit Quiz!");
    if session.has_won() {
        println!("You left with the ${} top prize.", ladder::prize_for_level(ladder::TOP_LEVEL));
    } else if session.phase == Phase::Lost {
        println!("You left with ${}.", ladder::secured_prize(session.level));
    }
}

fn game_loop(
    session: &mut GameSession,
    fetcher: &mut Fetcher,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }

        let mut events: Vec<GameEvent> = Vec::new();
        if handle_keys(session, fetcher, &kb, &mut events) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            events.extend(engine::tick(session));
            last_tick = Instant::now();
        }

        while let Some(outcome) = fetcher.poll() {
            events.extend(engine::apply_fetch(session, outcome));
        }

        for event in &events {
            log::debug!("event {event:?}");
        }

        process_fetch_requests(session, fetcher, &events);
        process_sound_events(sound, &events);

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Start the provider calls that this frame's events asked for.
fn process_fetch_requests(session: &GameSession, fetcher: &Fetcher, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::QuestionRequested { level } => fetcher.request_question(*level),
            GameEvent::AdviceRequested => {
                if let Some(q) = &session.question {
                    fetcher.request_advice(q);
                }
            }
            _ => {}
        }
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::GameStarted => sfx.play_start(),
            GameEvent::AnswerRevealed { correct: true } => sfx.play_correct(),
            GameEvent::AnswerRevealed { correct: false } => sfx.play_wrong(),
            GameEvent::LifelineUsed { .. } => sfx.play_lifeline(),
            GameEvent::GameWon => sfx.play_win(),
            GameEvent::GameLost { .. } => sfx.play_game_over(),
            _ => {}
        }
    }
}

// ── Key Constants ──

const KEYS_OPT_A: &[KeyCode] = &[KeyCode::Char('1'), KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_OPT_B: &[KeyCode] = &[KeyCode::Char('2'), KeyCode::Char('b'), KeyCode::Char('B')];
const KEYS_OPT_C: &[KeyCode] = &[KeyCode::Char('3'), KeyCode::Char('c'), KeyCode::Char('C')];
const KEYS_OPT_D: &[KeyCode] = &[KeyCode::Char('4'), KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_FIFTY: &[KeyCode] = &[KeyCode::Char('f'), KeyCode::Char('F')];
const KEYS_PHONE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_SWAP: &[KeyCode] = &[KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RETRY: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_NEW_GAME: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

/// Translate this frame's key presses into engine calls.
/// Returns true when the player asked to quit the program.
fn handle_keys(
    session: &mut GameSession,
    fetcher: &mut Fetcher,
    kb: &InputState,
    events: &mut Vec<GameEvent>,
) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.any_pressed(&[KeyCode::Esc]);

    match session.phase {
        // ── Title Screen ──
        Phase::Title => {
            if confirm {
                events.extend(engine::begin_game(session));
            } else if kb.any_pressed(&[KeyCode::Char('q'), KeyCode::Char('Q')]) || esc {
                return true;
            }
        }

        // ── First fetch of a run ──
        Phase::Loading => {
            if kb.any_pressed(KEYS_RETRY) {
                events.extend(engine::retry_load(session));
            } else if esc {
                engine::reset_game(session);
                fetcher.invalidate();
            }
        }

        // ── Playing ──
        Phase::Playing => {
            // The swap prompt captures confirm/cancel while it is open
            if session.confirm_swap {
                if confirm {
                    events.extend(engine::confirm_change_question(session));
                } else if esc {
                    engine::cancel_change_question(session);
                }
                return false;
            }

            if session.friend_message.is_some() && confirm {
                engine::dismiss_advice(session);
                return false;
            }

            if esc {
                engine::reset_game(session);
                fetcher.invalidate();
                return false;
            }

            let option_keys = [KEYS_OPT_A, KEYS_OPT_B, KEYS_OPT_C, KEYS_OPT_D];
            for (i, keys) in option_keys.iter().enumerate() {
                if kb.any_pressed(keys) {
                    events.extend(engine::submit_answer(session, i));
                    return false;
                }
            }

            if kb.any_pressed(KEYS_FIFTY) {
                events.extend(engine::use_fifty_fifty(session));
            } else if kb.any_pressed(KEYS_PHONE) {
                events.extend(engine::use_call_friend(session));
            } else if kb.any_pressed(KEYS_SWAP) {
                engine::request_change_question(session);
            } else if kb.any_pressed(KEYS_RETRY) {
                events.extend(engine::retry_load(session));
            }
        }

        // ── End screens ──
        Phase::Lost | Phase::Won => {
            if kb.any_pressed(KEYS_NEW_GAME) || confirm {
                events.extend(engine::begin_game(session));
            } else if esc {
                engine::reset_game(session);
            }
        }
    }

    false
}
