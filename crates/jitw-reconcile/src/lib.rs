//! Pending adjudication and approved reconciliation: the policy-enforcement
//! core of the watcher's control loop (components E and F).

#![deny(unsafe_code)]

pub mod adjudicator;
pub mod reconciler;

pub use adjudicator::{adjudicate, PolicySwitches, APPROVE_REASON};
pub use reconciler::Reconciler;
