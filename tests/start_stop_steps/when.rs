//! When steps for start/stop BDD scenarios.

use super::world::{ORG, StartStopWorld, run_async, scenario_now};
use rstest_bdd_macros::when;
use start_stop::assignment::{
    adapters::memory::FixedClock,
    domain::Sender,
    services::StartStopService,
};
use start_stop::plugin::PluginEvent;
use std::sync::Arc;

#[when(r#""{login}" with id {id:u64} comments "{body}""#)]
fn user_comments(
    world: &mut StartStopWorld,
    login: String,
    id: u64,
    body: String,
) -> Result<(), eyre::Report> {
    let event = PluginEvent::IssueCommentCreated {
        issue: world.issue()?.clone(),
        comment: body,
        sender: Sender::new(id, login),
    };
    let dispatcher = world.dispatcher();
    world.outcome = Some(run_async(dispatcher.handle(event))?);
    Ok(())
}

#[when(r#"the task limit of "{login}" is resolved"#)]
fn task_limit_is_resolved(world: &mut StartStopWorld, login: String) {
    let service = StartStopService::new(
        Arc::clone(&world.tracker),
        Arc::clone(&world.wallets),
        Arc::new(FixedClock::new(scenario_now())),
        Arc::new(world.settings.clone()),
    );
    world.resolved_limit = Some(run_async(service.limit_for(ORG, &login)));
}
