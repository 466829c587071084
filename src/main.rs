/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::TickInput;
use sim::event::GameEvent;
use sim::level::load_level;
use sim::step;
use sim::world::SessionState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = GameConfig::load();

    let level = match load_level(config.level_file.as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("ledgehop: {e}");
            std::process::exit(1);
        }
    };
    let mut session = SessionState::new(level, config.physics.clone());

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        std::process::exit(1);
    }

    let sound = SoundEngine::new(&config.audio);

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }

    println!("{}: {} deaths over {} frames", session.level_name, session.deaths, session.frame);
}

fn game_loop(
    session: &mut SessionState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let frame = Duration::from_millis(config.timing.frame_ms);
    let max_elapsed_ms = config.timing.max_frame_ms as f32;
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        kb.drain_events();
        gp.update();

        if kb.quit_pressed() {
            break;
        }

        // A restart frame consumes its elapsed time too.
        let elapsed_ms = advance_clock(&mut last_tick, Instant::now(), max_elapsed_ms);
        let events = if kb.restart_pressed() || gp.restart_pressed() {
            step::restart(session)
        } else {
            let input = merge(kb.tick_input(), gp.tick_input());
            step::tick(session, elapsed_ms, &input)
        };
        process_sound_events(sound, &events);

        renderer.render(session)?;

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}

/// Milliseconds since `last`, which moves to `now`. Long stalls (suspend,
/// debugger) are clamped so they never turn into one huge step.
fn advance_clock(last: &mut Instant, now: Instant, max_ms: f32) -> f32 {
    let elapsed_ms = now.saturating_duration_since(*last).as_secs_f32() * 1000.0;
    *last = now;
    elapsed_ms.min(max_ms)
}

/// Keyboard and gamepad drive the same player.
fn merge(a: TickInput, b: TickInput) -> TickInput {
    TickInput {
        left: a.left || b.left,
        right: a.right || b.right,
        jump_held: a.jump_held || b.jump_held,
        jump_pressed: a.jump_pressed || b.jump_pressed,
        confirm: a.confirm || b.confirm,
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Started => sfx.start_music(),
            GameEvent::Jumped | GameEvent::DoubleJumped => sfx.play_jump(),
            GameEvent::Died => sfx.play_die(),
            GameEvent::Won => sfx.play_win(),
            GameEvent::Landed | GameEvent::Respawned => {}
        }
    }
}
