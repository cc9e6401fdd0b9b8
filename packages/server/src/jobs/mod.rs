mod phase_sweep;

pub use phase_sweep::run_phase_sweep;
