use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};
use simple_logger::SimpleLogger;

use intrf_engine::{
    devices, EffectSettings, Engine, EngineConfig, FilterTap, Instance, LossModel, ParamId,
    ParamKind, Prng, MAX_CHANNELS,
};

/// Meter refresh period of `run`.
const METER_INTERVAL: Duration = Duration::from_millis(50);
const METER_WIDTH: usize = 40;

#[derive(Parser)]
#[command(name = "intrf", version, about = "Voice interference effect: shatter, noise, loss, filter")]
struct Cli {
    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List audio devices
    Devices,
    /// Print the parameter index table
    Params,
    /// Run the effect live from an input device to an output device
    Run(RunArgs),
    /// Process a WAV file offline
    Render(RenderArgs),
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    effect: EffectArgs,
    /// Input device (name substring, case-insensitive)
    #[arg(long)]
    input: Option<String>,
    /// Output device (name substring, case-insensitive)
    #[arg(long)]
    output: Option<String>,
    /// Input device index from `intrf devices`
    #[arg(long)]
    input_index: Option<usize>,
    /// Output device index from `intrf devices`
    #[arg(long)]
    output_index: Option<usize>,
    #[arg(long)]
    sample_rate: Option<u32>,
    /// Frames per buffer, if the backend honours it
    #[arg(long)]
    block_size: Option<u32>,
    /// How long to run
    #[arg(long, default_value_t = 10.0)]
    seconds: f32,
    /// Start bypassed (dry signal)
    #[arg(long)]
    bypass: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct RenderArgs {
    input: PathBuf,
    output: PathBuf,
    #[command(flatten)]
    effect: EffectArgs,
    /// Frames handed to the effect per call
    #[arg(long, default_value_t = 512)]
    block_size: usize,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct EffectArgs {
    /// Voice amplitude jitter depth, percent
    #[arg(long, default_value_t = 0.0, value_parser = percent)]
    voice_shatter: f32,
    /// Injected noise level, percent
    #[arg(long, default_value_t = 0.0, value_parser = percent)]
    noise_volume: f32,
    /// Noise amplitude jitter depth, percent
    #[arg(long, default_value_t = 0.0, value_parser = percent)]
    noise_shatter: f32,
    /// Share of samples to drop, percent (needs --loss)
    #[arg(long, default_value_t = 0.0, value_parser = percent)]
    loss_rate: f32,
    #[arg(long, value_enum, default_value_t = LossModelArg::Constant)]
    loss_model: LossModelArg,
    /// Enable sample loss
    #[arg(long)]
    loss: bool,
    /// Filter cutoff, percent of the one-pole coefficient (needs --filter)
    #[arg(long, default_value_t = 0.0, value_parser = percent)]
    filter_cutoff: f32,
    #[arg(long, value_enum, default_value_t = FilterTypeArg::Lowpass)]
    filter_type: FilterTypeArg,
    /// Enable the voice filter
    #[arg(long)]
    filter: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum LossModelArg {
    Constant,
    Random,
    Buffer,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterTypeArg {
    Lowpass,
    Highpass,
    Bandpass,
}

impl From<LossModelArg> for LossModel {
    fn from(arg: LossModelArg) -> Self {
        match arg {
            LossModelArg::Constant => LossModel::Constant,
            LossModelArg::Random => LossModel::Random,
            LossModelArg::Buffer => LossModel::Buffer,
        }
    }
}

impl From<FilterTypeArg> for FilterTap {
    fn from(arg: FilterTypeArg) -> Self {
        match arg {
            FilterTypeArg::Lowpass => FilterTap::Lowpass,
            FilterTypeArg::Highpass => FilterTap::Highpass,
            FilterTypeArg::Bandpass => FilterTap::Bandpass,
        }
    }
}

impl EffectArgs {
    fn settings(&self) -> EffectSettings {
        EffectSettings {
            voice_shatter: self.voice_shatter,
            noise_volume: self.noise_volume,
            noise_shatter: self.noise_shatter,
            loss_rate: self.loss_rate,
            loss_model: self.loss_model.into(),
            loss_enabled: self.loss,
            filter_cutoff: self.filter_cutoff,
            filter_type: self.filter_type.into(),
            filter_enabled: self.filter,
        }
    }
}

fn percent(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=100.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{v} is outside 0..=100"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to install logger")?;

    match cli.cmd {
        Command::Devices => devices::print_devices(),
        Command::Params => {
            print_params();
            Ok(())
        }
        Command::Run(args) => run(args),
        Command::Render(args) => render(args),
    }
}

fn print_params() {
    for id in ParamId::ALL {
        let range = match id.kind() {
            ParamKind::Float => "0..100".to_string(),
            ParamKind::Int => match id {
                ParamId::LossModel => "0=constant 1=random 2=buffer".to_string(),
                _ => "0=lowpass 1=highpass 2=bandpass".to_string(),
            },
            ParamKind::Bool => "on/off".to_string(),
        };
        println!(
            "{:>2}  {:<14} {:<5} {:<2} {}",
            id.index(),
            id.name(),
            id.kind(),
            id.unit(),
            range
        );
    }
}

fn run(args: RunArgs) -> Result<()> {
    let cfg = EngineConfig {
        input_name: args.input,
        output_name: args.output,
        input_index: args.input_index,
        output_index: args.output_index,
        sample_rate: args.sample_rate,
        block_size: args.block_size,
        settings: args.effect.settings(),
        seed: args.seed,
    };
    let mut engine = Engine::new(cfg);
    engine.set_bypass(args.bypass);
    engine.start()?;

    let deadline = Instant::now() + Duration::from_secs_f32(args.seconds.max(0.0));
    let mut stdout = std::io::stdout();
    while Instant::now() < deadline {
        std::thread::sleep(METER_INTERVAL);
        let line: Vec<String> = engine
            .meters()
            .iter()
            .enumerate()
            .map(|(ch, &peak)| format!("{ch:>2} {}", meter_bar(peak)))
            .collect();
        let state = if engine.is_bypassed() { "bypass" } else { "active" };
        write!(stdout, "\r[{state}] {}", line.join("  "))?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    engine.stop();
    Ok(())
}

fn meter_bar(peak: f32) -> String {
    let level = ((peak.clamp(0.0, 1.0) * METER_WIDTH as f32) as usize).min(METER_WIDTH);
    format!("{:<width$}", "=".repeat(level), width = METER_WIDTH)
}

fn render(args: RenderArgs) -> Result<()> {
    if args.block_size == 0 {
        bail!("--block-size must be at least 1");
    }
    let (spec, samples) = read_wav(&args.input)?;
    let channels = spec.channels as usize;
    if channels == 0 {
        bail!("{} has no channels", args.input.display());
    }
    if channels > MAX_CHANNELS {
        warn!("{channels} channels; channels past {MAX_CHANNELS} are copied through unprocessed");
    }

    let rng = match args.seed {
        Some(seed) => Prng::seeded(seed),
        None => Prng::new(),
    };
    let mut inst = Instance::create_with_rng(args.block_size, channels, rng)
        .context("Failed to create interference instance")?;
    inst.parameters()?.apply(&args.effect.settings());

    let mut out = vec![0.0_f32; samples.len()];
    let chunk = args.block_size * channels;
    for (src, dst) in samples.chunks(chunk).zip(out.chunks_mut(chunk)) {
        inst.process(src, dst, channels, src.len() / channels)?;
    }
    inst.release();

    let out_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args.output, out_spec)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    for s in &out {
        writer.write_sample(*s)?;
    }
    writer.finalize()?;

    info!(
        "rendered {} frames x {} ch -> {}",
        samples.len() / channels,
        channels,
        args.output.display()
    );
    Ok(())
}

/// Interleaved samples scaled to [-1, 1].
fn read_wav(path: &Path) -> Result<(hound::WavSpec, Vec<f32>)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    info!(
        "read {}: {} ch, {} Hz, {} samples",
        path.display(),
        spec.channels,
        spec.sample_rate,
        samples.len()
    );
    Ok((spec, samples))
}
