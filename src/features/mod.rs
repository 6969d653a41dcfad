// Event-driven features
pub mod appeal_gate;
pub mod setup_wizard;
pub mod wizard_flow;
