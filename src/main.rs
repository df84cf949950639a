use std::{path::PathBuf, process::ExitCode};

use sdl2::keyboard::Keycode;

use glsteps::{
    abs::App,
    error::StartupError,
    frame::{CloseCondition, FrameLoop},
    logger,
    render::GlRenderer,
    scenes::{SceneKind, SetupContext},
    settings::Settings,
};

const USAGE: &str = "usage: glsteps [--config <path>] [--list] [scene]";

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    scene: SceneKind,
    config: Option<PathBuf>,
    list: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Args::default();
        let mut scene = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--list" => parsed.list = true,
                "--config" => {
                    let path = args.next().ok_or("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                flag if flag.starts_with('-') => return Err(format!("unknown option '{flag}'")),
                name if scene.is_none() => {
                    scene = Some(name.parse::<SceneKind>().map_err(|e| e.to_string())?);
                }
                extra => return Err(format!("unexpected argument '{extra}'")),
            }
        }
        parsed.scene = scene.unwrap_or_default();
        Ok(parsed)
    }
}

fn main() -> ExitCode {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("glsteps: {e}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    if args.list {
        for kind in SceneKind::ALL {
            println!("{:<10} {}", kind.name(), kind.description());
        }
        return ExitCode::SUCCESS;
    }

    let settings = match Settings::load_or_default(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("glsteps: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(settings.log_level) {
        eprintln!("glsteps: failed to set up logging: {e}");
    }

    match run(&settings, args.scene) {
        Ok(frames) => {
            log::info!("closed after {frames} frames");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Sets up the window and the scene, runs the frame loop, and tears everything down.
fn run(settings: &Settings, kind: SceneKind) -> Result<u64, StartupError> {
    let mut app = App::new(&settings.window)?;
    let close_key = Keycode::from_name(&settings.close_key)
        .ok_or_else(|| StartupError::CloseKey(settings.close_key.clone()))?;

    let mut renderer = GlRenderer::new(&app.gl);
    let mut scene = kind.setup(&mut SetupContext {
        gl: &app.gl,
        resources: renderer.resources_mut(),
        settings,
    })?;

    let mut frame_loop = FrameLoop::new(CloseCondition::new(close_key))
        .with_clear_color(settings.clear_color_override());
    let frames = frame_loop.run(&mut app, scene.as_mut(), &mut renderer);

    // buffers, textures and programs go before the context they live in
    drop(scene);
    drop(renderer);
    drop(app);
    Ok(frames)
}
