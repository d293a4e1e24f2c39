//! Post relay: fan a channel post out to every other accepted member of the
//! source's groups, treating multi-part albums as atomic units.

pub mod coalescer;
pub mod engine;

pub use {
    coalescer::AlbumCoalescer,
    engine::{DeliveryFailure, DeliveryReport, RelayConfig, RelayEngine},
};
