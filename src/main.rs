use anyhow::{Context, Result};
use async_channel::{Sender as AsyncSender, TrySendError};
use gonioscope::audio::meter_tap::{self, AudioPacket, SnapshotSlot, TapMessage};
use gonioscope::dsp::goniometer::{GoniometerConfig, GoniometerProcessor};
use gonioscope::settings::{self, SettingsManager};
use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const SAMPLE_RATE: f32 = 44_100.0;
const BLOCK_FRAMES: usize = 1_024;
const CHANNEL_CAPACITY: usize = 16;
const RENDER_INTERVAL: Duration = Duration::from_millis(30);
const SCENE_DURATION: Duration = Duration::from_secs(2);
const DEFAULT_RUN_SECONDS: u64 = 8;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let run_for = match std::env::args().nth(1) {
        Some(arg) => Duration::from_secs(
            arg.parse()
                .with_context(|| format!("invalid run length '{arg}' (seconds)"))?,
        ),
        None => Duration::from_secs(DEFAULT_RUN_SECONDS),
    };

    let manager = SettingsManager::load_or_default(settings::config_path());
    let config = manager.settings().to_config().unwrap_or_else(|err| {
        warn!("[settings] {err}; using defaults");
        GoniometerConfig::default()
    });
    if !manager.path().exists()
        && let Err(err) = manager.save()
    {
        warn!("[settings] could not write defaults: {err:#}");
    }

    let engine = GoniometerProcessor::new(config)?;
    let (sender, receiver) = async_channel::bounded(CHANNEL_CAPACITY);
    let slot = SnapshotSlot::new();
    let analyzer = meter_tap::spawn_analyzer(engine, receiver, slot.clone())
        .context("failed to spawn analyzer thread")?;

    let running = Arc::new(AtomicBool::new(true));
    let producer = {
        let running = running.clone();
        thread::Builder::new()
            .name("gonioscope-tone".into())
            .spawn(move || produce(sender, running))
            .context("failed to spawn tone generator")?
    };

    render_loop(&slot, run_for);

    running.store(false, Ordering::Relaxed);
    let dropped = producer
        .join()
        .map_err(|_| anyhow::anyhow!("tone generator panicked"))?;
    let engine = analyzer
        .join()
        .map_err(|_| anyhow::anyhow!("analyzer thread panicked"))?;
    info!(
        "[host] done: {dropped} blocks dropped, final state {:?}",
        engine.state()
    );
    Ok(())
}

/// Polls the latest snapshot on a fixed cadence, independent of audio timing.
fn render_loop(slot: &SnapshotSlot, run_for: Duration) {
    let start = Instant::now();
    let mut seen = 0u64;
    let mut last_report = start;

    while start.elapsed() < run_for {
        thread::sleep(RENDER_INTERVAL);
        let serial = slot.serial();
        if serial == seen {
            continue;
        }
        seen = serial;

        let snapshot = slot.latest();
        debug!(
            "[render] {} points, {} trail frames, {}",
            snapshot.points.len(),
            snapshot.trail.len(),
            snapshot.correlation
        );
        if last_report.elapsed() >= Duration::from_secs(1) {
            info!(
                "[render] {} ({:?}) at {} Hz",
                snapshot.correlation, snapshot.correlation.tier, snapshot.sample_rate
            );
            last_report = Instant::now();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Scene {
    Mono,
    Wide,
    AntiPhase,
    Silence,
}

impl Scene {
    const ALL: [Scene; 4] = [Scene::Mono, Scene::Wide, Scene::AntiPhase, Scene::Silence];
}

/// Generates stereo test blocks at the device cadence. Returns dropped block count.
fn produce(sender: AsyncSender<TapMessage>, running: Arc<AtomicBool>) -> u64 {
    let block_period = Duration::from_secs_f32(BLOCK_FRAMES as f32 / SAMPLE_RATE);
    let start = Instant::now();
    let mut phase = 0.0f32;
    let mut noise = 0x9e37_79b9u32;
    let mut dropped = 0u64;
    let mut scene_index = usize::MAX;

    while running.load(Ordering::Relaxed) {
        let index = (start.elapsed().as_secs_f32() / SCENE_DURATION.as_secs_f32()) as usize;
        let scene = Scene::ALL[index % Scene::ALL.len()];
        if index != scene_index {
            info!("[tone] scene {scene:?}");
            if scene_index != usize::MAX && sender.send_blocking(TapMessage::Reset).is_err() {
                break;
            }
            scene_index = index;
        }

        let mut samples = Vec::with_capacity(BLOCK_FRAMES * 2);
        for _ in 0..BLOCK_FRAMES {
            let tone = 0.6 * phase.sin();
            phase = (phase + TAU * 220.0 / SAMPLE_RATE) % TAU;
            let (l, r) = match scene {
                Scene::Mono => (tone, tone),
                Scene::Wide => {
                    noise ^= noise << 13;
                    noise ^= noise >> 17;
                    noise ^= noise << 5;
                    (tone, noise as f32 / u32::MAX as f32 * 1.2 - 0.6)
                }
                Scene::AntiPhase => (tone, -tone),
                Scene::Silence => (0.0, 0.0),
            };
            samples.extend([l, r]);
        }

        let packet = AudioPacket {
            samples,
            channels: 2,
            sample_rate: SAMPLE_RATE,
        };
        match sender.try_send(TapMessage::Block(packet)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => dropped += 1,
            Err(TrySendError::Closed(_)) => break,
        }
        thread::sleep(block_period);
    }

    dropped
}
