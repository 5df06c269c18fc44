//! The ownership contract.
//!
//! A closed set of calls (`call`), one handler per call (`handlers`), state
//! addressed by key domain (`state`), and a rejection taxonomy (`error`).

pub mod call;
pub mod error;
pub mod handlers;
pub mod state;

pub use call::{Authorization, BatchTransfer, ContractCall};
pub use error::{ContractError, HandlerResult};
pub use handlers::OwnershipContract;
pub use state::ContractState;
