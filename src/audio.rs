//! Host-side plumbing between an audio producer and the goniometer engine.

pub mod meter_tap;
