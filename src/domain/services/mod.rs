pub mod adapters;
pub mod signer;
