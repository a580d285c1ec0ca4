use std::time::Instant;

use glow::HasContext;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;

use crate::abs::*;
use crate::scene::{Scene, SceneError};
use crate::settings::Settings;

mod abs;
mod logger;
mod scene;
mod settings;

#[derive(thiserror::Error, Debug)]
enum RunError {
    #[error("failed to create window: {0}")]
    Window(String),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

fn main() {
    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    if let Err(e) = logger::init(settings.level_filter(), settings.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }
    if let Some(e) = settings_error {
        log::warn!("{e}; using default settings");
    }

    if let Err(e) = run(&settings) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(settings: &Settings) -> Result<(), RunError> {
    let mut app = App::new(
        &settings.title,
        settings.width,
        settings.height,
        settings.fullscreen,
        settings.vsync,
    )
    .map_err(RunError::Window)?;

    let (width, height) = drawable_viewport(&app.window);
    unsafe {
        app.ctx.gl().viewport(0, 0, width, height);
    }

    let scene = Scene::new(
        &mut app.ctx,
        settings.scene,
        &settings.shader_dir,
        settings.wireframe,
    )?;

    let [r, g, b, a] = settings.clear_color;
    let start = Instant::now();

    'running: loop {
        for event in app.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..),
                    ..
                } => {
                    let (width, height) = drawable_viewport(&app.window);
                    unsafe {
                        app.ctx.gl().viewport(0, 0, width, height);
                    }
                }
                _ => {}
            }
        }

        unsafe {
            app.ctx.gl().clear_color(r, g, b, a);
            app.ctx.gl().clear(glow::COLOR_BUFFER_BIT);
        }

        scene.draw(&mut app.ctx, start.elapsed().as_secs_f32());

        app.window.gl_swap_window();
    }

    scene.delete(&mut app.ctx);
    log::info!("Shutting down");
    Ok(())
}
