// Panel phases and the semantic content of a rendered panel.
//
// The phases are conceptual per-entity states; nothing here is persisted.
// Each interaction replays the events it observed through a fresh machine and
// renders whatever affordance the final phase allows.

use statig::prelude::*;

use super::authorization::Restriction;
use crate::jira::IssueKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A fresh read found a step for the current status.
    StepFound,
    /// A fresh read found no step for the current status. Ends an execute
    /// interaction; a refresh simply keeps waiting.
    NoStep,
    /// The authorization gate refused the actor.
    Denied,
    /// The transition was handed to the remote.
    Submitted,
    /// The remote accepted the transition.
    Applied,
    /// A remote call failed.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingRefresh,
    AwaitingExecute,
    Applying,
    Terminal,
}

#[derive(Debug, Default)]
pub struct PanelPhases;

#[state_machine(initial = "State::awaiting_refresh()")]
impl PanelPhases {
    #[state]
    fn awaiting_refresh(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::StepFound => Transition(State::awaiting_execute()),
            // Nothing to do yet; the status may still move externally.
            _ => Handled,
        }
    }

    #[state]
    fn awaiting_execute(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Submitted => Transition(State::applying()),
            PhaseEvent::NoStep => Transition(State::terminal()),
            PhaseEvent::Failed => Transition(State::awaiting_refresh()),
            // A denied actor leaves the execute affordance in place for others.
            _ => Handled,
        }
    }

    #[state]
    fn applying(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Applied | PhaseEvent::Failed => Transition(State::awaiting_refresh()),
            _ => Handled,
        }
    }

    #[state]
    fn terminal(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::StepFound => Transition(State::awaiting_execute()),
            _ => Handled,
        }
    }
}

/// Events observed during one interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseTrail {
    events: Vec<PhaseEvent>,
}

impl PhaseTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trail for an execute click: the panel it came from offered execute.
    pub fn from_execute_panel() -> Self {
        Self {
            events: vec![PhaseEvent::StepFound],
        }
    }

    pub fn record(&mut self, event: PhaseEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[PhaseEvent] {
        &self.events
    }

    /// Replay the trail from `AwaitingRefresh` and report where it lands.
    pub fn settle(&self) -> Phase {
        let mut machine = PanelPhases::default().state_machine();
        for event in &self.events {
            machine.handle(event);
        }
        match machine.state() {
            State::AwaitingRefresh { .. } => Phase::AwaitingRefresh,
            State::AwaitingExecute { .. } => Phase::AwaitingExecute,
            State::Applying { .. } => Phase::Applying,
            State::Terminal { .. } => Phase::Terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Affordance {
    Refresh,
    Execute { label: String, transition: String },
}

/// Free-form note shown under the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelNote {
    /// First render: ask for a refresh to load the next action.
    Intro,
    NoNextStep,
    /// Execute found no step after re-reading; the earlier render was stale.
    NoNextStepAfterDrift,
    Ready { transition: String },
    Restricted(Restriction),
    Failed { transition: String, error: String },
    Applied { transition: String },
    ReadFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub issue_key: IssueKey,
    pub issue_url: String,
    pub status: String,
    pub last_actor: Option<String>,
    pub affordance: Affordance,
    pub note: Option<PanelNote>,
}

impl Panel {
    /// Build a panel whose affordance follows `phase`: the execute button is
    /// offered only while awaiting execute and a step is known.
    pub fn for_phase(
        phase: Phase,
        issue_key: IssueKey,
        issue_url: String,
        status: String,
        last_actor: Option<String>,
        step: Option<(&str, &str)>,
        note: Option<PanelNote>,
    ) -> Self {
        let affordance = match (phase, step) {
            (Phase::AwaitingExecute, Some((label, transition))) => Affordance::Execute {
                label: label.to_string(),
                transition: transition.to_string(),
            },
            _ => Affordance::Refresh,
        };
        Self {
            issue_key,
            issue_url,
            status,
            last_actor,
            affordance,
            note,
        }
    }

    pub fn offers_execute(&self) -> bool {
        matches!(self.affordance, Affordance::Execute { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail(events: &[PhaseEvent]) -> PhaseTrail {
        let mut trail = PhaseTrail::new();
        for event in events {
            trail.record(*event);
        }
        trail
    }

    #[test]
    fn test_empty_trail_awaits_refresh() {
        assert_eq!(PhaseTrail::new().settle(), Phase::AwaitingRefresh);
    }

    #[test]
    fn test_refresh_with_step_awaits_execute() {
        assert_eq!(trail(&[PhaseEvent::StepFound]).settle(), Phase::AwaitingExecute);
    }

    #[test]
    fn test_refresh_without_step_keeps_awaiting_refresh() {
        assert_eq!(trail(&[PhaseEvent::NoStep]).settle(), Phase::AwaitingRefresh);
    }

    #[test]
    fn test_execute_without_step_is_terminal() {
        let events = [PhaseEvent::StepFound, PhaseEvent::NoStep];
        assert_eq!(trail(&events).settle(), Phase::Terminal);
    }

    #[test]
    fn test_successful_execute_cycles_back_to_refresh() {
        let events = [PhaseEvent::StepFound, PhaseEvent::Submitted, PhaseEvent::Applied];
        assert_eq!(trail(&events).settle(), Phase::AwaitingRefresh);
    }

    #[test]
    fn test_denied_execute_keeps_execute_affordance() {
        let events = [PhaseEvent::StepFound, PhaseEvent::Denied];
        assert_eq!(trail(&events).settle(), Phase::AwaitingExecute);
    }

    #[test]
    fn test_failed_submit_returns_to_refresh() {
        let events = [PhaseEvent::StepFound, PhaseEvent::Submitted, PhaseEvent::Failed];
        assert_eq!(trail(&events).settle(), Phase::AwaitingRefresh);
    }

    #[test]
    fn test_terminal_reopens_when_status_moves_externally() {
        let events = [PhaseEvent::StepFound, PhaseEvent::NoStep, PhaseEvent::StepFound];
        assert_eq!(trail(&events).settle(), Phase::AwaitingExecute);
    }

    #[test]
    fn test_panel_affordance_follows_phase() {
        let key = IssueKey::parse("KAN-1").unwrap();
        let panel = Panel::for_phase(
            Phase::AwaitingExecute,
            key.clone(),
            "https://acme.atlassian.net/browse/KAN-1".to_string(),
            "To Do".to_string(),
            None,
            Some(("Move to Pending Approval", "Task Create")),
            None,
        );
        assert!(panel.offers_execute());

        let panel = Panel::for_phase(
            Phase::Terminal,
            key,
            String::new(),
            "Done".to_string(),
            None,
            Some(("Ignored", "Ignored")),
            Some(PanelNote::NoNextStep),
        );
        assert_eq!(panel.affordance, Affordance::Refresh);
    }
}
