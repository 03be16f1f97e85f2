//! Integration flows, one module per scenario family.

pub mod arena_flow;
pub mod direct_flow;
pub mod escrow_flow;
pub mod gateway_flow;
pub mod identity;
