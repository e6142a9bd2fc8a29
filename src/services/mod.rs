pub mod classify;
pub mod correlator;
pub mod enrichment;
pub mod status;
pub mod sweeper;
pub mod verification;
