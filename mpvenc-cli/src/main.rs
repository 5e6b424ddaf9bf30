#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{debug, info};

use mpvenc::{EncodeConfig, Encoder, EncoderConfig, FramePixels, FrameRate, PacketKind, SearchRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pattern {
    /// Still checkerboard
    Grid,
    /// Checkerboard moving one pixel right and down per picture
    Moving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Range {
    Narrow,
    Medium,
    Wide,
}

impl From<Range> for SearchRange {
    fn from(r: Range) -> Self {
        match r {
            Range::Narrow => SearchRange::Narrow,
            Range::Medium => SearchRange::Medium,
            Range::Wide => SearchRange::Wide,
        }
    }
}

/// Encode 4:2:0 video into an MPEG-2 I/P elementary stream.
#[derive(Debug, Parser)]
#[command(name = "mpvenc", version)]
struct Cli {
    /// Input YUV4MPEG2 file
    #[arg(required_unless_present_any = ["solid", "pattern"], conflicts_with_all = ["solid", "pattern"])]
    input: Option<PathBuf>,

    /// Output elementary stream (.m2v)
    #[arg(short, long)]
    output: PathBuf,

    /// Solid colour input, WxH:Y,U,V
    #[arg(long, value_parser = parse_solid, conflicts_with = "pattern")]
    solid: Option<Solid>,

    /// Generated test pattern
    #[arg(long, value_enum, requires = "size")]
    pattern: Option<Pattern>,

    /// Size of the generated pattern, WxH
    #[arg(long, value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Number of pictures for generated inputs
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Quantiser level, 1 (fine) to 4 (coarse)
    #[arg(short, long, default_value_t = mpvenc::DEFAULT_Q_LEVEL)]
    q_level: u8,

    /// Motion search range
    #[arg(long, value_enum, default_value_t = Range::Narrow)]
    search_range: Range,

    /// P pictures between I pictures
    #[arg(long, default_value_t = mpvenc::DEFAULT_P_FRAMES)]
    p_frames: u8,

    /// Picture rate, NUM or NUM/DEN
    #[arg(long, value_parser = parse_fps, default_value = "25")]
    fps: FrameRate,

    /// Log per-picture details
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy)]
struct Solid {
    width: u32,
    height: u32,
    yuv: [u8; 3],
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let dim = |v: &str| match v.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid dimension {v:?}")),
    };
    Ok((dim(w)?, dim(h)?))
}

fn parse_solid(s: &str) -> Result<Solid, String> {
    let (size, colour) = s
        .split_once(':')
        .ok_or_else(|| format!("expected WxH:Y,U,V, got {s:?}"))?;
    let (width, height) = parse_size(size)?;
    let values = colour
        .split(',')
        .map(|v| v.trim().parse::<u8>().map_err(|_| format!("invalid sample value {v:?}")))
        .collect::<Result<Vec<_>, _>>()?;
    let yuv: [u8; 3] = values
        .try_into()
        .map_err(|_| "expected three sample values Y,U,V".to_owned())?;
    Ok(Solid { width, height, yuv })
}

fn parse_fps(s: &str) -> Result<FrameRate, String> {
    let (num, den) = s.split_once('/').unwrap_or((s, "1"));
    let num = num.parse().map_err(|_| format!("invalid frame rate {s:?}"))?;
    let den = den.parse().map_err(|_| format!("invalid frame rate {s:?}"))?;
    FrameRate::new(num, den).map_err(|e| e.to_string())
}

fn load_frames(cli: &Cli) -> Result<Vec<FramePixels>> {
    if let Some(path) = &cli.input {
        return FramePixels::all_from_y4m_file(path)
            .with_context(|| format!("reading {}", path.display()));
    }
    if let Some(solid) = cli.solid {
        let [y, u, v] = solid.yuv;
        let frame = FramePixels::solid(solid.width, solid.height, y, u, v);
        return Ok(vec![frame; cli.frames as usize]);
    }
    match (cli.pattern, cli.size) {
        (Some(pattern), Some((width, height))) => Ok((0..cli.frames)
            .map(|i| {
                let offset = if pattern == Pattern::Moving { i } else { 0 };
                FramePixels::grid(width, height, offset)
            })
            .collect()),
        _ => bail!("no input given"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let frames = load_frames(&cli)?;
    let Some(first) = frames.first() else {
        bail!("no input frames");
    };

    let config = EncodeConfig {
        q_level: cli.q_level,
        search_range: cli.search_range.into(),
        p_frames: cli.p_frames,
        frame_rate: cli.fps,
        ..Default::default()
    };
    let encoder_config = EncoderConfig::try_from(&config).context("invalid encoder configuration")?;
    let mut encoder =
        Encoder::new(first.width, first.height, encoder_config).context("creating encoder")?;

    let file = File::create(&cli.output).with_context(|| format!("creating {}", cli.output.display()))?;
    let mut out = BufWriter::new(file);
    let mut written = 0usize;

    let mut drain = |encoder: &mut Encoder, out: &mut BufWriter<File>| -> Result<()> {
        while let Some(packet) = encoder.receive_packet() {
            match packet.kind {
                PacketKind::Picture(frame_type) => debug!(
                    "frame {:>4}  {:>9}  {} bytes",
                    packet.frame_number,
                    format!("{frame_type:?}"),
                    packet.data.len()
                ),
                PacketKind::EndOfSequence => debug!("sequence end  {} bytes", packet.data.len()),
            }
            out.write_all(&packet.data)?;
            written += packet.data.len();
        }
        Ok(())
    };

    for (n, frame) in frames.iter().enumerate() {
        encoder
            .send_frame(frame)
            .with_context(|| format!("encoding frame {n}"))?;
        drain(&mut encoder, &mut out).with_context(|| format!("writing {}", cli.output.display()))?;
    }
    encoder.flush();
    drain(&mut encoder, &mut out).with_context(|| format!("writing {}", cli.output.display()))?;
    out.flush()?;

    let stats = *encoder.stats();
    info!(
        "Wrote {} bytes to {} ({} frames {}x{} coded {}x{}, q_level={}, range={:?}, gop={}, fps={})",
        written,
        cli.output.display(),
        frames.len(),
        encoder.width(),
        encoder.height(),
        encoder.coded_width(),
        encoder.coded_height(),
        encoder.config().q_level,
        encoder.config().search_range,
        encoder.config().p_frames as u32 + 1,
        encoder.config().frame_rate
    );
    info!(
        "macroblocks: {} intra, {} inter ({} all-zero), {} escapes",
        stats.intra_macroblocks, stats.inter_macroblocks, stats.all_zero_macroblocks, stats.escapes
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_size() {
        assert_eq!(parse_size("64x48"), Ok((64, 48)));
        assert!(parse_size("64").is_err());
        assert!(parse_size("0x48").is_err());
    }

    #[test]
    fn parses_solid() {
        let s = parse_solid("80x64:16,128,240").unwrap();
        assert_eq!((s.width, s.height, s.yuv), (80, 64, [16, 128, 240]));
        assert!(parse_solid("80x64:16,128").is_err());
        assert!(parse_solid("80x64:16,128,300").is_err());
    }

    #[test]
    fn parses_fps() {
        assert_eq!(parse_fps("25").unwrap().code(), 3);
        assert_eq!(parse_fps("30000/1001").unwrap().code(), 4);
        assert!(parse_fps("15").is_err());
        assert!(parse_fps("abc").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn pattern_input_generates_frames() {
        let cli = Cli::parse_from(["mpvenc", "--pattern", "moving", "--size", "64x64", "--frames", "3", "-o", "out.m2v"]);
        let frames = load_frames(&cli).unwrap();
        assert_eq!(frames.len(), 3);
        assert_ne!(frames[0], frames[1]);
    }

    #[test]
    fn solid_input_repeats_frame() {
        let cli = Cli::parse_from(["mpvenc", "--solid", "64x64:1,2,3", "--frames", "2", "-o", "out.m2v"]);
        let frames = load_frames(&cli).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], frames[1]);
    }
}
