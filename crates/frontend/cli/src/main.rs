use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use emu_core::logging::{LogConfig, LogLevel};
use emu_p2000::config::RAM_SIZES_KB;
use emu_p2000::media::{load_video_ram_dump, VRAM_DUMP_SIZE};
use emu_p2000::mono::decode_frame_mono;
use emu_p2000::palette::{glyph_char, Color};
use emu_p2000::saa5050::{decode_frame, CellCommand, ROWS, VRAM_SIZE};
use emu_p2000::sound::AudioSynthesizer;
use emu_p2000::{DisplayModel, MachineConfig, StateSerializer};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "p2000", about = "Headless tools for the P2000T core")]
struct Args {
    /// Machine configuration as JSON; missing fields use the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Core log level: off, error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a video RAM dump and print it
    Render {
        dump: PathBuf,

        /// Print characters only, without colours
        #[arg(long, default_value_t = false)]
        plain: bool,

        /// Render in the flash phase where flashing text is hidden
        #[arg(long, default_value_t = false)]
        blank: bool,
    },
    /// Check a save state against the configured RAM size
    StateInfo { state: PathBuf },
    /// Feed beeper toggles through the synthesizer and report each period
    Beep {
        /// Toggles as `period:cycle:level`, e.g. `0:25000:1`
        #[arg(required = true)]
        toggles: Vec<String>,

        /// Periods to synthesize
        #[arg(long, default_value_t = 4)]
        periods: u32,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let Some(level) = LogLevel::from_str(&args.log_level) else {
        bail!("Unknown log level: {}", args.log_level);
    };
    LogConfig::global().set_global_level(level);
    // RUST_LOG still narrows or widens individual targets
    env_logger::Builder::new()
        .filter_level(level_filter(level))
        .parse_default_env()
        .init();

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            MachineConfig::from_json(&text)?
        }
        None => MachineConfig::default(),
    };
    log::debug!("machine config {}", serde_json::to_string(&config)?);

    match args.command {
        Command::Render { dump, plain, blank } => render(&config, &dump, plain, blank),
        Command::StateInfo { state } => state_info(&config, &state),
        Command::Beep { toggles, periods } => beep(&config, &toggles, periods),
    }
}

fn level_filter(level: LogLevel) -> log::LevelFilter {
    match level {
        LogLevel::Off => log::LevelFilter::Off,
        LogLevel::Error => log::LevelFilter::Error,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Trace => log::LevelFilter::Trace,
    }
}

fn render(config: &MachineConfig, dump: &Path, plain: bool, blank: bool) -> Result<()> {
    let data = fs::read(dump).with_context(|| format!("reading {}", dump.display()))?;
    if data.len() != VRAM_DUMP_SIZE {
        log::warn!(
            "{} holds {} bytes, a full screen is {VRAM_DUMP_SIZE}",
            dump.display(),
            data.len()
        );
    }

    let mut vram = Box::new([0x20u8; VRAM_SIZE]);
    load_video_ram_dump(&mut vram, 0, &data);

    let mut cells: Vec<CellCommand> = Vec::new();
    match config.model {
        DisplayModel::T => decode_frame(&vram, 0, blank, |cell| cells.push(cell)),
        DisplayModel::M => decode_frame_mono(&vram, 0, |cell, _| cells.push(cell)),
    }

    for row in cells.chunks(cells.len() / ROWS) {
        let mut line = String::new();
        for cell in row {
            if !plain {
                let fg = Color::from_index(cell.fg);
                let bg = Color::from_index(cell.bg);
                line.push_str(&format!("\x1b[{};{}m", fg.ansi_fg(), bg.ansi_bg()));
            }
            line.push(glyph_char(cell.glyph));
        }
        if !plain {
            line.push_str("\x1b[0m");
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn state_info(config: &MachineConfig, path: &Path) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let serializer = StateSerializer::new(config.ram_len());

    let image = match serializer.deserialize(&data) {
        Ok(image) => image,
        Err(err) => {
            let fits = RAM_SIZES_KB
                .iter()
                .find(|&&kb| StateSerializer::new(kb as usize * 1024).size() == data.len());
            match fits {
                Some(kb) => bail!("{err}; the state matches a {kb} KiB machine"),
                None => bail!("{err}"),
            }
        }
    };

    let r = &image.registers;
    println!("state size  {} bytes ({} KiB RAM)", data.len(), config.ram_kb);
    println!(
        "AF {:04X}  BC {:04X}  DE {:04X}  HL {:04X}",
        r.af, r.bc, r.de, r.hl
    );
    println!("IX {:04X}  IY {:04X}  PC {:04X}  SP {:04X}", r.ix, r.iy, r.pc, r.sp);
    println!(
        "AF' {:04X} BC' {:04X} DE' {:04X} HL' {:04X}",
        r.af_alt, r.bc_alt, r.de_alt, r.hl_alt
    );
    println!(
        "I {:02X}  R {:02X}  IFF1 {}  IFF2 {}  IM {}  HALT {}",
        r.i, r.r, r.iff1, r.iff2, r.im, r.halt
    );
    let used = image.ram.iter().filter(|&&b| b != 0).count();
    println!("RAM: {used} of {} bytes non-zero", image.ram.len());
    Ok(())
}

fn parse_toggle(text: &str) -> Result<(u32, u32, bool)> {
    let parts: Vec<&str> = text.split(':').collect();
    let [period, cycle, level] = parts.as_slice() else {
        bail!("Toggle {text} is not period:cycle:level");
    };
    let level = match *level {
        "0" => false,
        "1" => true,
        other => bail!("Toggle level must be 0 or 1, got {other}"),
    };
    Ok((period.parse()?, cycle.parse()?, level))
}

fn beep(config: &MachineConfig, toggles: &[String], periods: u32) -> Result<()> {
    let mut toggles = toggles
        .iter()
        .map(|t| parse_toggle(t))
        .collect::<Result<Vec<_>>>()?;
    toggles.sort_by_key(|&(period, cycle, _)| (period, cycle));

    let cycles = config.cycles_per_period();
    let mut synth = AudioSynthesizer::new(config.audio_model, config.interrupt_rate, config.volume);
    synth.set_enabled(config.sound);
    println!(
        "{:?} model, {} samples per period at {} Hz",
        config.audio_model,
        synth.buffer_len(),
        synth.sample_rate()
    );

    for period in 0..periods {
        for &(_, cycle, level) in toggles.iter().filter(|t| t.0 == period) {
            if cycle >= cycles {
                bail!("Cycle {cycle} is past the period length {cycles}");
            }
            synth.on_toggle(cycle, level);
        }
        let samples = synth.flush(cycles);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        let active = samples.iter().filter(|&&s| s != 0).count();
        println!("period {period:3}: peak {peak:5}, {active:5} non-zero samples");
    }
    Ok(())
}
