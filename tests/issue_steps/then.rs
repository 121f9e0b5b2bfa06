//! Then steps for issue reconcile BDD scenarios.

use super::world::ReconcileWorld;
use github_issue_operator::issue::{
    domain::{RemoteIssueState, RepoCoordinates},
    services::{ReconcileError, SyncError},
};
use rstest_bdd_macros::then;

fn scenario_repo() -> Result<RepoCoordinates, eyre::Report> {
    RepoCoordinates::new("acme", "widgets").map_err(|err| eyre::eyre!("{err}"))
}

#[then(r#"the number of issues titled "{title}" is {count:usize}"#)]
fn issue_count(world: &ReconcileWorld, title: String, count: usize) -> Result<(), eyre::Report> {
    let issues = world
        .tracker
        .issues(&scenario_repo()?)
        .map_err(|err| eyre::eyre!("read tracker: {err}"))?;
    let found = issues.iter().filter(|issue| issue.title == title).count();
    if found != count {
        return Err(eyre::eyre!("expected {count} issues titled {title}, found {found}"));
    }
    Ok(())
}

#[then(r#"condition "{condition}" is "{status}" on "{name}""#)]
fn condition_recorded(
    world: &ReconcileWorld,
    condition: String,
    status: String,
    name: String,
) -> Result<(), eyre::Report> {
    let resource = world
        .resource(&name)?
        .ok_or_else(|| eyre::eyre!("resource {name} does not exist"))?;
    let recorded = resource.status.conditions.iter().any(|entry| {
        entry.condition_type.as_str() == condition && entry.status.as_str() == status
    });
    if !recorded {
        return Err(eyre::eyre!(
            "expected condition {condition}={status} on {name}, found {:?}",
            resource.status.conditions
        ));
    }
    Ok(())
}

#[then(r#"the issue titled "{title}" is closed"#)]
fn issue_is_closed(world: &ReconcileWorld, title: String) -> Result<(), eyre::Report> {
    let issues = world
        .tracker
        .issues(&scenario_repo()?)
        .map_err(|err| eyre::eyre!("read tracker: {err}"))?;
    let issue = issues
        .iter()
        .find(|issue| issue.title == title)
        .ok_or_else(|| eyre::eyre!("no issue titled {title}"))?;
    if issue.state != RemoteIssueState::Closed {
        return Err(eyre::eyre!("issue {title} is still open"));
    }
    Ok(())
}

#[then(r#"the resource "{name}" no longer exists"#)]
fn resource_is_gone(world: &ReconcileWorld, name: String) -> Result<(), eyre::Report> {
    if world.resource(&name)?.is_some() {
        return Err(eyre::eyre!("resource {name} still exists"));
    }
    Ok(())
}

#[then("the last reconciliation failed with bad credentials")]
fn failed_with_bad_credentials(world: &ReconcileWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Err(ReconcileError::Sync(err))) if err.is_unauthorized() => Ok(()),
        Some(Err(ReconcileError::Sync(SyncError::Domain(err)))) => {
            Err(eyre::eyre!("unexpected domain error: {err}"))
        }
        other => Err(eyre::eyre!("expected a bad credentials failure, got {other:?}")),
    }
}
