mod config;
mod events;

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Context, Result};
use crossbeam::channel::{unbounded, Receiver};
use indicatif::{ProgressBar, ProgressStyle};
use num_complex::Complex32;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use config::CliConfig;
use events::{EventLog, LogEvent};
use waveclock_core::{
    channel, generator, ChannelSettings, ClockDecoder, Modulation, ReportMessage,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Longwave time-signal decoder", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Modulation override: dcf77, tdf or msf60
    #[arg(short, long)]
    modulation: Option<Modulation>,

    /// Write decoder events as JSON lines to this file
    #[arg(long)]
    json_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a two-channel IQ WAV recording
    Decode {
        input: PathBuf,

        /// Channel frequency offset in Hz (overrides the config file)
        #[arg(long)]
        frequency_offset: Option<f64>,
    },
    /// Synthesize minutes of signal and decode them end to end
    Simulate {
        /// Number of minutes to synthesize
        #[arg(long, default_value_t = 3)]
        minutes: u32,

        /// Transmitted time of the first minute, RFC 3339
        #[arg(long, default_value = "2024-12-31T13:41:00+01:00")]
        start: DateTime<FixedOffset>,

        /// Add white noise at this SNR in dB
        #[arg(long)]
        snr_db: Option<f32>,
    },
}

const FEED_CHUNK: usize = 4096;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let mut config = args
        .config
        .as_deref()
        .map(CliConfig::from_file)
        .transpose()?
        .unwrap_or_default();
    if let Some(modulation) = args.modulation {
        config.modulation = modulation;
    }

    let mut log = EventLog::create(args.json_log.as_deref())?;

    let mut decoder = ClockDecoder::new(config.decoder_settings())?;
    let (tx, rx) = unbounded();
    decoder.set_report_queue(Some(tx));

    match args.command {
        Command::Decode {
            input,
            frequency_offset,
        } => {
            let offset = frequency_offset.unwrap_or(config.frequency_offset);
            decode_wav(&mut decoder, &rx, &mut log, &input, offset, &config)
        }
        Command::Simulate {
            minutes,
            start,
            snr_db,
        } => simulate(&mut decoder, &rx, &mut log, minutes, &start, snr_db, &config),
    }
}

fn decode_wav(
    decoder: &mut ClockDecoder,
    rx: &Receiver<ReportMessage>,
    log: &mut EventLog,
    input: &PathBuf,
    frequency_offset: f64,
    config: &CliConfig,
) -> Result<()> {
    let mut reader = hound::WavReader::open(input)
        .wrap_err_with(|| format!("Failed to open {}", input.display()))?;
    let spec = reader.spec();
    if spec.channels != 2 {
        bail!(
            "expected a two-channel IQ recording, got {} channel(s)",
            spec.channels
        );
    }

    decoder.apply_channel_settings(
        &ChannelSettings {
            sample_rate: spec.sample_rate,
            frequency_offset,
        },
        true,
    )?;

    let iq: Vec<Complex32> = match spec.sample_format {
        hound::SampleFormat::Float => {
            let samples: Vec<f32> = reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()?;
            samples
                .chunks_exact(2)
                .map(|pair| Complex32::new(pair[0], pair[1]))
                .collect()
        }
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            let samples: Vec<i32> = reader
                .samples::<i32>()
                .collect::<std::result::Result<_, _>>()?;
            samples
                .chunks_exact(2)
                .map(|pair| Complex32::new(pair[0] as f32 * scale, pair[1] as f32 * scale))
                .collect()
        }
    };

    eprintln!(
        "decoding {} as {}: {} IQ samples at {} Hz",
        input.display(),
        config.modulation,
        iq.len(),
        spec.sample_rate
    );
    run(decoder, rx, log, &iq)
}

fn simulate(
    decoder: &mut ClockDecoder,
    rx: &Receiver<ReportMessage>,
    log: &mut EventLog,
    minutes: u32,
    start: &DateTime<FixedOffset>,
    snr_db: Option<f32>,
    config: &CliConfig,
) -> Result<()> {
    let mut samples = generator::minutes(config.modulation, start, minutes);
    if let Some(snr_db) = snr_db {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let noise_std = channel::snr_to_noise_std(snr_db);
        samples = channel::apply_iq_noise(&samples, noise_std, &mut rng);
    }

    eprintln!(
        "simulating {} minute(s) of {} starting at {}",
        minutes, config.modulation, start
    );
    run(decoder, rx, log, &samples)
}

fn run(
    decoder: &mut ClockDecoder,
    rx: &Receiver<ReportMessage>,
    log: &mut EventLog,
    samples: &[Complex32],
) -> Result<()> {
    let bar = ProgressBar::new(samples.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40} {pos}/{len} samples ({eta})",
    )?);

    for chunk in samples.chunks(FEED_CHUNK) {
        decoder.feed(chunk);
        bar.inc(chunk.len() as u64);
        drain_reports(rx, log, &bar)?;
    }
    bar.finish_and_clear();

    let level = decoder.take_level_report();
    log.record(&LogEvent::Level {
        avg: level.avg,
        peak: level.peak,
        count: level.count,
    })?;
    eprintln!(
        "input level: avg {:.6}, peak {:.6} over {} samples",
        level.avg, level.peak, level.count
    );

    match decoder.date_time() {
        Some(date_time) => println!("final: {}", date_time.format("%Y-%m-%d %H:%M:%S %:z")),
        None => println!("no complete decode"),
    }
    Ok(())
}

fn drain_reports(rx: &Receiver<ReportMessage>, log: &mut EventLog, bar: &ProgressBar) -> Result<()> {
    for message in rx.try_iter() {
        match message {
            ReportMessage::Status(status) => {
                bar.println(format!("status: {status}"));
                log.record(&LogEvent::Status {
                    text: status.to_string(),
                })?;
            }
            ReportMessage::DateTime(Some(date_time)) => {
                bar.println(format!(
                    "time: {}",
                    date_time.format("%Y-%m-%d %H:%M:%S %:z")
                ));
                log.record(&LogEvent::DateTime {
                    value: Some(date_time.to_rfc3339()),
                })?;
            }
            ReportMessage::DateTime(None) => {
                log.record(&LogEvent::DateTime { value: None })?;
            }
        }
    }
    Ok(())
}
