//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2
//! window and the OpenGL context used for rendering.

use std::sync::Arc;

use super::GlContext;

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub ctx: GlContext,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Creates a new [`App`] with an OpenGL 3.3 core context.
    /// The width and height options are ignored if `fullscreen` is set to `true`.
    pub fn new(
        title: &str,
        width: u32,
        height: u32,
        fullscreen: bool,
        vsync: bool,
    ) -> Result<Self, String> {
        let sdl = sdl2::init()?;
        let video_subsystem = sdl.video()?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);

        let (width, height) = if fullscreen {
            let display_mode = video_subsystem.current_display_mode(0)?;
            (display_mode.w as u32, display_mode.h as u32)
        } else {
            (width, height)
        };
        let mut window = video_subsystem
            .window(title, width, height)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;
        if fullscreen {
            window.set_fullscreen(sdl2::video::FullscreenType::Desktop)?;
        }

        let gl_context = window.gl_create_context()?;
        window.gl_make_current(&gl_context)?;
        if vsync {
            if let Err(e) = video_subsystem.gl_set_swap_interval(sdl2::video::SwapInterval::VSync) {
                log::warn!("Could not enable vsync: {e}");
            }
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump()?;
        let ctx = GlContext::new(&Arc::new(gl));

        log::info!("Created {width}x{height} window {title:?} with an OpenGL 3.3 core context");

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            ctx,
            event_pump,
        })
    }
}

/// The viewport matching the window's drawable size in pixels, which differs from the
/// window size reported by resize events on HiDPI displays.
pub fn drawable_viewport(window: &sdl2::video::Window) -> (i32, i32) {
    viewport_size(window.drawable_size())
}

fn viewport_size((width, height): (u32, u32)) -> (i32, i32) {
    (
        i32::try_from(width).unwrap_or(i32::MAX),
        i32::try_from(height).unwrap_or(i32::MAX),
    )
}
