//! Serialises audio blocks into a single goniometer engine and publishes results.

use crate::dsp::goniometer::{GoniometerProcessor, GoniometerSnapshot};
use crate::dsp::{AudioBlock, AudioProcessor};
use arc_swap::ArcSwap;
use async_channel::Receiver as AsyncReceiver;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Interleaved samples captured by the producer, owned so the device buffer can be reused.
#[derive(Debug, Clone)]
pub struct AudioPacket {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: f32,
}

#[derive(Debug, Clone)]
pub enum TapMessage {
    Block(AudioPacket),
    Reset,
}

/// Latest engine output, written by one thread and read by any number of renderers.
#[derive(Debug)]
pub struct SnapshotSlot {
    latest: ArcSwap<GoniometerSnapshot>,
    serial: AtomicU64,
}

impl Default for SnapshotSlot {
    fn default() -> Self {
        Self {
            latest: ArcSwap::from_pointee(GoniometerSnapshot::default()),
            serial: Default::default(),
        }
    }
}

impl SnapshotSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn publish(&self, snapshot: GoniometerSnapshot) {
        self.latest.store(Arc::new(snapshot));
        self.serial.fetch_add(1, Ordering::Release);
    }

    pub fn latest(&self) -> Arc<GoniometerSnapshot> {
        self.latest.load_full()
    }

    /// Number of snapshots published so far; lets a renderer skip redraws.
    pub fn serial(&self) -> u64 {
        self.serial.load(Ordering::Acquire)
    }
}

/// Runs `engine` on its own thread until the sending side of `receiver` closes.
///
/// Messages are handled strictly in arrival order. The engine is handed back
/// through the join handle.
pub fn spawn_analyzer(
    engine: GoniometerProcessor,
    receiver: AsyncReceiver<TapMessage>,
    slot: Arc<SnapshotSlot>,
) -> std::io::Result<JoinHandle<GoniometerProcessor>> {
    thread::Builder::new()
        .name("gonioscope-analyzer".into())
        .spawn(move || analyze_loop(engine, receiver, slot))
}

fn analyze_loop(
    mut engine: GoniometerProcessor,
    receiver: AsyncReceiver<TapMessage>,
    slot: Arc<SnapshotSlot>,
) -> GoniometerProcessor {
    info!(
        "[analyzer] running (max_points={}, trail={})",
        engine.config().max_points,
        engine.config().trail_max_frames
    );
    let mut blocks = 0u64;

    while let Ok(message) = receiver.recv_blocking() {
        match message {
            TapMessage::Block(packet) => {
                let block = AudioBlock::new(
                    &packet.samples,
                    packet.channels,
                    packet.sample_rate,
                    Instant::now(),
                );
                slot.publish(engine.process_block(&block));
                blocks += 1;
            }
            TapMessage::Reset => {
                debug!("[analyzer] reset after {blocks} blocks");
                engine.reset();
                slot.publish(engine.snapshot().clone());
            }
        }
    }

    info!("[analyzer] audio channel closed after {blocks} blocks");
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::correlation::CorrelationTier;
    use crate::dsp::goniometer::{EngineState, GoniometerConfig};

    fn packet(samples: Vec<f32>) -> TapMessage {
        TapMessage::Block(AudioPacket {
            samples,
            channels: 2,
            sample_rate: 48_000.0,
        })
    }

    #[test]
    fn processes_blocks_in_order_and_publishes_last() {
        let engine = GoniometerProcessor::new(GoniometerConfig::default()).unwrap();
        let (sender, receiver) = async_channel::bounded(8);
        let slot = SnapshotSlot::new();
        let handle = spawn_analyzer(engine, receiver, slot.clone()).expect("spawn analyzer");

        sender.send_blocking(packet(vec![0.5, 0.5, -0.25, -0.25])).unwrap();
        sender.send_blocking(packet(vec![0.5, -0.5, -0.25, 0.25])).unwrap();
        drop(sender);

        let engine = handle.join().expect("analyzer thread");
        assert_eq!(slot.serial(), 2);
        let latest = slot.latest();
        assert_eq!(latest.correlation.tier, CorrelationTier::Poor);
        assert_eq!(latest.correlation.value, Some(-1.0));
        assert_eq!(latest.trail.len(), 2);
        assert_eq!(engine.state(), EngineState::Active);
    }

    #[test]
    fn reset_message_publishes_cleared_snapshot() {
        let engine = GoniometerProcessor::new(GoniometerConfig::default()).unwrap();
        let (sender, receiver) = async_channel::bounded(8);
        let slot = SnapshotSlot::new();
        let handle = spawn_analyzer(engine, receiver, slot.clone()).expect("spawn analyzer");

        sender.send_blocking(packet(vec![0.1, 0.2, 0.3, 0.4])).unwrap();
        sender.send_blocking(TapMessage::Reset).unwrap();
        drop(sender);

        let engine = handle.join().expect("analyzer thread");
        let latest = slot.latest();
        assert!(!latest.has_data());
        assert!(latest.trail.is_empty());
        assert!(engine.trail().is_empty());
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn readers_keep_their_snapshot_after_new_publish() {
        let slot = SnapshotSlot::new();
        let mut engine = GoniometerProcessor::new(GoniometerConfig::default()).unwrap();
        slot.publish(engine.update_audio(&AudioBlock::now(&[0.2, 0.1, -0.4, 0.3], 2, 48_000.0)));
        let held = slot.latest();
        let before = held.points.clone();

        slot.publish(engine.update_audio(&AudioBlock::now(&[0.9, 0.9, 0.1, 0.1], 2, 48_000.0)));
        assert_eq!(held.points, before);
        assert_ne!(slot.latest().points, before);
    }
}
