#![deny(warnings)]

//! Simulation engines for Freight Tycoon.
//!
//! Each engine is a pure function over an immutable [`sim_core::GameSnapshot`]
//! returning explicit deltas; nothing here touches storage or reads a
//! clock. The [`orchestrator`] sequences the engines into one game tick.
//! Collaborators (RNG, caches) are injected by the caller.

pub mod cache;
pub mod ledger;
pub mod orchestrator;
pub mod orders;
pub mod production;
pub mod progression;
pub mod replay;
pub mod reputation;
pub mod steps;

pub use cache::TtlCache;
pub use ledger::Modifiers;
pub use orchestrator::advance;

use thiserror::Error;

/// Expected, user-facing precondition violations. These are control
/// flow, not failures; the API layer renders them as `{success:false}`.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Product already building")]
    ProductAlreadyBuilding,
    #[error("An active order is still in progress")]
    OrderInProgress,
    #[error("Not enough inventory!")]
    NotEnoughInventory,
    #[error("Not enough money")]
    NotEnoughMoney,
    #[error("No orders awaiting shipment")]
    NoOrdersAwaiting,
    #[error("No skill points available")]
    NoSkillPoints,
    #[error("Unknown skill")]
    UnknownSkill,
    #[error("No challenge pending")]
    NoChallengePending,
    #[error("No product found")]
    MissingProduct,
    #[error(transparent)]
    Econ(#[from] sim_econ::EconError),
}
