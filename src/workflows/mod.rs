// Issue lifecycle orchestration
// The remote is the source of truth: nothing here persists between interactions.

pub mod authorization;
pub mod flow;
pub mod interaction;
pub mod panel;
pub mod state_machine;

#[cfg(test)]
pub(crate) mod mocks;

pub use authorization::{Authorization, AuthorizationPolicy, Restriction};
pub use flow::{FlowConfig, FlowStep, FlowTable, NextStep, NotifyMode};
pub use interaction::{BlockAction, FlowAction, Interaction, InteractionContext};
pub use panel::{Affordance, Panel, PanelNote, Phase};
pub use state_machine::{ExecuteResult, FlowController, HandledInteraction, InteractionOutcome, PanelSurface};
