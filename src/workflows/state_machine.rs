// Flow controller: start / refresh / execute for one issue panel.
//
// No state survives between interactions. Every trigger re-reads the remote
// status and recomputes the step from it; the rendered panel is only a hint.

use std::sync::Arc;
use tracing::{info, warn, Instrument};

use super::authorization::{Authorization, AuthorizationPolicy, Restriction};
use super::flow::{FlowStep, FlowTable, NotifyMode};
use super::interaction::{FlowAction, Interaction, InteractionContext};
use super::panel::{Panel, PanelNote, PhaseEvent, PhaseTrail};
use crate::jira::{
    ConsistencyPoller, IssueKey, JiraError, PollConfig, StatusReader, TransitionExecutor, UNKNOWN_STATUS,
};
use crate::notify::{
    render_template, restriction_notice, summary_text, Audience, Completion, MessageRef, Notice, Notifier,
    TransitionSummary,
};
use crate::observability::JiraApiMetrics;
use crate::telemetry::{create_interaction_span, generate_correlation_id};

/// How an execute interaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteResult {
    Applied { before: String, transition: String },
    NoStep,
    Denied(Restriction),
    Failed { transition: String, error: String },
    ReadFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOutcome {
    pub result: ExecuteResult,
    pub completion: Completion,
    pub panel: Panel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandledInteraction {
    Refreshed(Panel),
    Executed(InteractionOutcome),
}

/// The read-and-render half of a panel: status reads with retry, the
/// notifier, and issue links. Starting a panel needs nothing else, so the
/// flow table is never consulted here.
pub struct PanelSurface<J, N> {
    poller: ConsistencyPoller<Arc<J>>,
    notifier: N,
    base_url: String,
}

impl<J, N> PanelSurface<J, N>
where
    J: StatusReader + 'static,
    N: Notifier,
{
    pub fn new(remote: Arc<J>, notifier: N, poll: PollConfig, base_url: impl Into<String>) -> Self {
        Self {
            poller: ConsistencyPoller::new(remote, poll),
            notifier,
            base_url: base_url.into(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<JiraApiMetrics>) -> Self {
        self.poller = self.poller.with_metrics(metrics);
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn issue_url(&self, key: &IssueKey) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }

    /// Initial invocation: post a panel showing the current status with a
    /// Refresh affordance. Never transitions and never completes.
    pub async fn start(&self, ctx: &InteractionContext) -> Result<MessageRef, JiraError> {
        let correlation_id = generate_correlation_id();
        let span = create_interaction_span("start", ctx.issue_key.as_str(), Some(ctx.actor.as_str()), &correlation_id);

        async {
            let (status, note) = match self.poller.read_with_retry(&ctx.issue_key).await {
                Ok(status) => (status, PanelNote::Intro),
                Err(err) => (UNKNOWN_STATUS.to_string(), PanelNote::ReadFailed { error: err.to_string() }),
            };
            let panel = Panel::for_phase(
                PhaseTrail::new().settle(),
                ctx.issue_key.clone(),
                self.issue_url(&ctx.issue_key),
                status,
                None,
                None,
                Some(note),
            );

            let message = self.notifier.post_panel(&ctx.channel, &panel).await?;
            info!(issue_key = %ctx.issue_key, status = %panel.status, "Panel started");
            Ok::<_, JiraError>(message)
        }
        .instrument(span)
        .await
    }

    /// Update the panel in place, or post a fresh one when the interaction
    /// has no message to update. Failures are logged only.
    async fn render(&self, ctx: &InteractionContext, panel: &Panel) {
        let outcome = match &ctx.message_ts {
            Some(ts) => {
                let message = MessageRef {
                    channel: ctx.channel.clone(),
                    ts: ts.clone(),
                };
                self.notifier.update_panel(&message, panel).await
            }
            None => self.notifier.post_panel(&ctx.channel, panel).await.map(|_| ()),
        };
        if let Err(err) = outcome {
            warn!(issue_key = %ctx.issue_key, error = %err, "Failed to render panel");
        }
    }

    async fn notify(&self, notice: Notice) {
        if let Err(err) = self.notifier.send_notice(&notice).await {
            warn!(audience = ?notice.audience, error = %err, "Failed to send notice");
        }
    }
}

pub struct FlowController<J, N> {
    remote: Arc<J>,
    surface: PanelSurface<J, N>,
    table: FlowTable,
    policy: AuthorizationPolicy,
}

impl<J, N> FlowController<J, N>
where
    J: StatusReader + TransitionExecutor + 'static,
    N: Notifier,
{
    pub fn new(
        remote: Arc<J>,
        notifier: N,
        table: FlowTable,
        policy: AuthorizationPolicy,
        poll: PollConfig,
        base_url: impl Into<String>,
    ) -> Self {
        Self::from_surface(
            Arc::clone(&remote),
            PanelSurface::new(remote, notifier, poll, base_url),
            table,
            policy,
        )
    }

    pub fn from_surface(remote: Arc<J>, surface: PanelSurface<J, N>, table: FlowTable, policy: AuthorizationPolicy) -> Self {
        Self {
            remote,
            surface,
            table,
            policy,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<JiraApiMetrics>) -> Self {
        self.surface = self.surface.with_metrics(metrics);
        self
    }

    pub fn notifier(&self) -> &N {
        self.surface.notifier()
    }

    pub fn table(&self) -> &FlowTable {
        &self.table
    }

    pub async fn handle(&self, interaction: Interaction) -> HandledInteraction {
        let correlation_id = generate_correlation_id();
        let span = create_interaction_span(
            interaction.action.as_str(),
            interaction.context.issue_key.as_str(),
            Some(interaction.context.actor.as_str()),
            &correlation_id,
        );

        async {
            match interaction.action {
                FlowAction::Refresh => HandledInteraction::Refreshed(self.refresh(&interaction.context).await),
                FlowAction::Execute => HandledInteraction::Executed(self.execute(&interaction.context).await),
            }
        }
        .instrument(span)
        .await
    }

    pub async fn start(&self, ctx: &InteractionContext) -> Result<MessageRef, JiraError> {
        self.surface.start(ctx).await
    }

    /// Re-read the status and offer the step it implies. Mutates nothing on
    /// the remote and leaves the interaction open.
    pub async fn refresh(&self, ctx: &InteractionContext) -> Panel {
        let key = &ctx.issue_key;
        let mut trail = PhaseTrail::new();

        let panel = match self.surface.poller.read_with_retry(key).await {
            Err(err) => {
                trail.record(PhaseEvent::Failed);
                self.panel(ctx, &trail, UNKNOWN_STATUS.to_string(), None, PanelNote::ReadFailed {
                    error: err.to_string(),
                })
            }
            Ok(status) => match self.table.decide_next(&status) {
                Some(step) => {
                    trail.record(PhaseEvent::StepFound);
                    let note = PanelNote::Ready {
                        transition: step.transition_name.to_string(),
                    };
                    let step = Some((step.label, step.transition_name));
                    self.panel(ctx, &trail, status.clone(), step, note)
                }
                None => {
                    trail.record(PhaseEvent::NoStep);
                    self.panel(ctx, &trail, status.clone(), None, PanelNote::NoNextStep)
                }
            },
        };

        info!(
            issue_key = %key,
            status = %panel.status,
            offers_execute = panel.offers_execute(),
            "Panel refreshed"
        );
        self.surface.render(ctx, &panel).await;
        panel
    }

    /// Re-read, re-decide, authorize, apply and confirm. Completes the
    /// interaction exactly once whichever way it ends.
    pub async fn execute(&self, ctx: &InteractionContext) -> InteractionOutcome {
        let (result, status, panel) = self.run_execute(ctx).await;

        let completion = Completion {
            issue_key: ctx.issue_key.to_string(),
            status,
            updated_by: ctx.actor.clone(),
            interactivity: ctx.interactivity.clone(),
        };
        if let Err(err) = self
            .notifier()
            .complete(ctx.execution_id.as_deref(), &completion)
            .await
        {
            warn!(issue_key = %ctx.issue_key, error = %err, "Failed to complete interaction");
        }

        info!(issue_key = %ctx.issue_key, result = ?result, status = %completion.status, "Execute finished");
        InteractionOutcome {
            result,
            completion,
            panel,
        }
    }

    async fn run_execute(&self, ctx: &InteractionContext) -> (ExecuteResult, String, Panel) {
        let key = &ctx.issue_key;
        let mut trail = PhaseTrail::from_execute_panel();

        let before = match self.surface.poller.read_with_retry(key).await {
            Ok(status) => status,
            Err(err) => {
                trail.record(PhaseEvent::Failed);
                let error = err.to_string();
                let panel = self.panel(ctx, &trail, UNKNOWN_STATUS.to_string(), None, PanelNote::ReadFailed {
                    error: error.clone(),
                });
                self.surface.render(ctx, &panel).await;
                return (ExecuteResult::ReadFailed { error }, UNKNOWN_STATUS.to_string(), panel);
            }
        };

        let Some(step) = self.table.decide_next(&before) else {
            trail.record(PhaseEvent::NoStep);
            let panel = self.panel(ctx, &trail, before.clone(), None, PanelNote::NoNextStepAfterDrift);
            self.surface.render(ctx, &panel).await;
            return (ExecuteResult::NoStep, before, panel);
        };
        trail.record(PhaseEvent::StepFound);
        let transition = step.transition_name.to_string();

        if let Authorization::Denied(restriction) = self.policy.authorize(&ctx.actor, &step) {
            trail.record(PhaseEvent::Denied);
            info!(issue_key = %key, actor = %ctx.actor, transition = %transition, "Execute denied");
            self.surface.notify(Notice {
                audience: Audience::Private {
                    channel: ctx.channel.clone(),
                    actor: ctx.actor.clone(),
                },
                text: restriction_notice(&restriction),
            })
            .await;

            let panel = self.panel(
                ctx,
                &trail,
                before.clone(),
                Some((step.label, step.transition_name)),
                PanelNote::Restricted(restriction.clone()),
            );
            self.surface.render(ctx, &panel).await;
            return (ExecuteResult::Denied(restriction), before, panel);
        }

        trail.record(PhaseEvent::Submitted);
        if let Err(err) = self.remote.apply_transition(key, &transition).await {
            trail.record(PhaseEvent::Failed);
            let error = err.to_string();
            warn!(issue_key = %key, transition = %transition, error = %error, "Transition failed");

            let after = self.surface.poller.read_best_effort(key).await;
            let panel = self.panel(ctx, &trail, after.clone(), None, PanelNote::Failed {
                transition: transition.clone(),
                error: error.clone(),
            });
            self.surface.render(ctx, &panel).await;
            return (ExecuteResult::Failed { transition, error }, after, panel);
        }

        trail.record(PhaseEvent::Applied);
        let after = self.surface.poller.wait_for_change(key, &before).await;
        info!(issue_key = %key, before = %before, after = %after, transition = %transition, "Transition applied");

        let summary = TransitionSummary {
            issue_key: key.to_string(),
            issue_url: self.surface.issue_url(key),
            before: before.clone(),
            after: after.clone(),
            transition: transition.clone(),
            label: step.label.to_string(),
            actor: ctx.actor.clone(),
        };
        if let Some(notice) = announcement(step.step, &summary, ctx) {
            self.surface.notify(notice).await;
        }

        let panel = self.panel(ctx, &trail, after.clone(), None, PanelNote::Applied {
            transition: transition.clone(),
        });
        self.surface.render(ctx, &panel).await;
        (ExecuteResult::Applied { before, transition }, after, panel)
    }

    fn panel(
        &self,
        ctx: &InteractionContext,
        trail: &PhaseTrail,
        status: String,
        step: Option<(&str, &str)>,
        note: PanelNote,
    ) -> Panel {
        Panel::for_phase(
            trail.settle(),
            ctx.issue_key.clone(),
            self.surface.issue_url(&ctx.issue_key),
            status,
            Some(ctx.actor.clone()),
            step,
            Some(note),
        )
    }
}

/// The notice a successful step announces, per its template. Steps without a
/// template post the default summary to the channel.
fn announcement(step: &FlowStep, summary: &TransitionSummary, ctx: &InteractionContext) -> Option<Notice> {
    let Some(template) = &step.notify else {
        return Some(Notice {
            audience: Audience::Channel {
                channel: ctx.channel.clone(),
            },
            text: summary_text(summary),
        });
    };

    let audience = match template.mode {
        NotifyMode::None => return None,
        NotifyMode::Channel => Audience::Channel {
            channel: ctx.channel.clone(),
        },
        NotifyMode::DmClicker => Audience::Direct {
            actor: ctx.actor.clone(),
        },
        NotifyMode::EphemeralClicker => Audience::Private {
            channel: ctx.channel.clone(),
            actor: ctx.actor.clone(),
        },
    };
    let text = if template.text.trim().is_empty() {
        summary_text(summary)
    } else {
        render_template(&template.text, summary)
    };
    Some(Notice { audience, text })
}
