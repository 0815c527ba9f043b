use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "computetrace",
    author,
    version,
    about = "Real-time compute-shader ray tracer",
    arg_required_else_help = false
)]
pub struct Args {
    /// Configuration file; falls back to `$COMPUTETRACE_CONFIG`, then the user config directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Compute kernel to trace with.
    #[arg(long, value_name = "PATH")]
    pub compute: Option<PathBuf>,

    /// Vertex stage of the present pass.
    #[arg(long, value_name = "PATH")]
    pub vertex: Option<PathBuf>,

    /// Fragment stage of the present pass.
    #[arg(long, value_name = "PATH")]
    pub fragment: Option<PathBuf>,

    /// Render the single fixed triangle instead of the mesh scene.
    #[arg(long)]
    pub triangle: bool,

    /// Log filter directive (e.g. `debug` or `renderer=trace`); overrides `RUST_LOG`.
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

/// Parses `WxH` (also accepts `X` and `×` as the separator).
pub fn parse_surface_size(spec: &str) -> Result<(u32, u32), String> {
    let (width, height) = spec
        .trim()
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}' in size specification", width.trim()))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}' in size specification", height.trim()))?;

    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_surface_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_surface_size(" 640 X 480 "), Ok((640, 480)));
        assert_eq!(parse_surface_size("800×600"), Ok((800, 600)));
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("widex720").is_err());
    }

    #[test]
    fn flags_are_optional() {
        let args = Args::try_parse_from(["computetrace"]).unwrap();
        assert!(args.config.is_none());
        assert!(!args.triangle);

        let args = Args::try_parse_from([
            "computetrace",
            "--triangle",
            "--size",
            "320x200",
            "--log-filter",
            "debug",
        ])
        .unwrap();
        assert!(args.triangle);
        assert_eq!(args.size.as_deref(), Some("320x200"));
        assert_eq!(args.log_filter.as_deref(), Some("debug"));
    }
}
