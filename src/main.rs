use std::f64::consts::TAU;

use log::{debug, info, warn};
use overlay_engine::{Color, OverlayApp, OverlayEvent, Position, Size, WindowConfig};

const DEFAULT_WIDTH: u32 = 480;
const DEFAULT_HEIGHT: u32 = 320;

struct Args {
    width: Option<u32>,
    height: Option<u32>,
    config: Option<String>,
    vsync: bool,
}

/// Parse command line arguments
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        width: None,
        height: None,
        config: None,
        vsync: true,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => parsed.vsync = false,
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    if let Ok(w) = args[i + 1].parse::<u32>() {
                        parsed.width = Some(w);
                    }
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < args.len() {
                    if let Ok(h) = args[i + 1].parse::<u32>() {
                        parsed.height = Some(h);
                    }
                    i += 1;
                }
            },
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: overlay-demo [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  --width W, -w W       Set overlay width (default: {})",
                    DEFAULT_WIDTH
                );
                println!(
                    "  --height H, -h H      Set overlay height (default: {})",
                    DEFAULT_HEIGHT
                );
                println!("  --config PATH, -c PATH  Load window settings from a JSON file");
                println!("  --no-vsync            Present without waiting for vertical sync");
                println!("  --help                Show this help message");
                std::process::exit(0);
            },
            other => warn!("ignoring unknown argument '{}'", other),
        }
        i += 1;
    }

    parsed
}

fn build_config(args: &Args) -> Result<WindowConfig, String> {
    let mut config = match &args.config {
        Some(path) => WindowConfig::load(path).map_err(|e| e.to_string())?,
        // SDL2 windows are opaque
        None => WindowConfig::overlay()
            .with_transparent(false)
            .with_title("overlay-demo")
            .with_size(Size::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)),
    };
    if let Some(width) = args.width {
        config.size.width = width;
    }
    if let Some(height) = args.height {
        config.size.height = height;
    }
    if !args.vsync {
        config.vsync = false;
    }
    Ok(config)
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args();
    let config = build_config(&args)?;
    info!("starting overlay-demo at {}", config.size);

    let mut app = OverlayApp::new().map_err(|e| e.to_string())?;
    let mut overlay = app.create_window(config).map_err(|e| e.to_string())?;

    // Orbiting dot over a crossed, bordered frame
    let palette = [Color::CYAN, Color::MAGENTA, Color::YELLOW, Color::ORANGE];
    let mut angle = 0.0f64;

    overlay
        .start(|overlay, tick| {
            for event in &tick.events {
                match event {
                    OverlayEvent::Resized(size) => info!("resized to {}", size),
                    OverlayEvent::Focused | OverlayEvent::Unfocused => {},
                    other => debug!("event {}", other.name()),
                }
            }

            let size = overlay.frame_size();
            let (w, h) = (size.width as i32, size.height as i32);
            let center = Position::new(w / 2, h / 2);
            let orbit = (w.min(h) / 3) as f64;

            angle = (angle + tick.delta.as_secs_f64() * 1.5) % TAU;
            let dot = Position::new(
                center.x + (orbit * angle.cos()) as i32,
                center.y + (orbit * angle.sin()) as i32,
            );
            let color_index = (tick.frame / 60) as usize % palette.len();
            let color = palette[color_index];
            let next = palette[(color_index + 1) % palette.len()];
            let t = (tick.frame % 60) as f64 / 60.0;

            overlay.clear_frame(Color::TRANSPARENT);
            overlay.draw_rectangle(Position::new(0, 0), Size::new(size.width, 2), Color::WHITE);
            overlay.draw_rectangle(Position::new(0, h - 2), Size::new(size.width, 2), Color::WHITE);
            overlay.draw_line(Position::new(0, 0), Position::new(w - 1, h - 1), Color::DARK_GRAY);
            overlay.draw_line(Position::new(w - 1, 0), Position::new(0, h - 1), Color::DARK_GRAY);
            overlay.draw_circle(center, orbit as i32, Color::GRAY)?;
            overlay.draw_line(center, dot, Color::blend(color, next, t));
            for radius in 0..6 {
                overlay.draw_circle(dot, radius, Color::blend(color, next, t))?;
            }

            if tick.frame % 300 == 0 {
                info!("frame {}: {:.1} fps", tick.frame, tick.fps);
            }
            Ok(())
        })
        .map_err(|e| e.to_string())?;

    info!("overlay closed after {} frames", overlay.frames_presented());
    Ok(())
}
