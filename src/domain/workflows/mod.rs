pub mod delivery_state_machine;
pub mod retry_policy;
