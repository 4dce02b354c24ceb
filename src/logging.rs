//! Colored logger setup.

use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;
use termcolor::{Color, ColorSpec, WriteColor};

/// Dependencies that log per frame or per audio block at `info`
const QUIETED: [&str; 3] = ["naga", "wgpu", "cpal"];

const CRATE_PREFIX: &str = "resonance_viz::";

fn level_color(level: Level) -> Color {
    match level {
        Level::Trace => Color::Cyan,
        Level::Debug => Color::Blue,
        Level::Info => Color::Green,
        Level::Warn => Color::Yellow,
        Level::Error => Color::Red,
    }
}

/// `resonance_viz::render::canvas` → `render::canvas`
fn short_module(path: &str) -> &str {
    path.strip_prefix(CRATE_PREFIX).unwrap_or(path)
}

/// Initialise the global logger on stderr.
///
/// Honors `RUST_LOG`; defaults to `resonance_viz=info`. Calling this more
/// than once is harmless.
pub fn init_logger() {
    let mut builder = Builder::from_env(Env::default().default_filter_or("resonance_viz=info"));
    for module in QUIETED {
        builder.filter_module(module, LevelFilter::Warn);
    }

    builder.format(|_buf, record| {
        let writer = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = writer.buffer();

        buffer.set_color(ColorSpec::new().set_fg(Some(level_color(record.level()))))?;
        let module = record.module_path().map_or("<unknown>", short_module);
        write!(buffer, "[{:<5}][{}]", record.level(), module)?;
        buffer.reset()?;
        writeln!(buffer, " {}", record.args())?;
        writer.print(&buffer)?;
        Ok(())
    });

    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_module_strips_crate() {
        assert_eq!(short_module("resonance_viz::render::canvas"), "render::canvas");
        assert_eq!(short_module("wgpu_core::device"), "wgpu_core::device");
        assert_eq!(short_module("resonance_viz"), "resonance_viz");
    }

    #[test]
    fn test_levels_have_distinct_colors() {
        let levels = [Level::Trace, Level::Debug, Level::Info, Level::Warn, Level::Error];
        for (i, a) in levels.iter().enumerate() {
            for b in &levels[i + 1..] {
                assert_ne!(level_color(*a), level_color(*b));
            }
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logger();
        init_logger();
        log::debug!("logger initialised");
    }
}
