//! quakesim-core: seismic wavefront propagation and JMA intensity engine.
//!
//! Layers, bottom up:
//!   projection → wavefront → intensity → aggregator / envelope → trigger → engine
//! with `geocoder` and `station` loading the polygon and station data.

pub mod aggregator;
pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod event;
pub mod geocoder;
pub mod geometry;
pub mod intensity;
pub mod placement;
pub mod projection;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod station;
pub mod trigger;
pub mod types;
pub mod wavefront;
