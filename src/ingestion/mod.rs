pub mod applier;
pub mod backoff;
pub mod coordinator;
pub mod fills;
pub mod normalizer;
pub mod ports;
pub mod stream;

pub use applier::SnapshotApplier;
pub use backoff::Backoff;
pub use coordinator::{resolve_wallets, IngestionConfig, IngestionCoordinator};
pub use fills::{fill_wallet, normalize_fill};
pub use normalizer::normalize_snapshot;
pub use ports::{AccountStateSource, PersistenceSink, WalletRegistry};
pub use stream::{SessionState, StreamFrame, StreamSession, StreamSettings, WalletFill};
