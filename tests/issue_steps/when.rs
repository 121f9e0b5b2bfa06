//! When steps for issue reconcile BDD scenarios.

use super::world::{ReconcileWorld, VALID_TOKEN, key, run_async};
use eyre::WrapErr;
use github_issue_operator::issue::ports::IssueResourceStore;
use rstest_bdd_macros::when;

#[when(r#"the resource "{name}" is reconciled"#)]
fn resource_is_reconciled(world: &mut ReconcileWorld, name: String) {
    world.last_result = Some(run_async(world.reconciler.reconcile(&key(&name))));
}

#[when(r#"the secret for "{name}" receives a valid token"#)]
fn secret_receives_token(world: &mut ReconcileWorld, name: String) -> Result<(), eyre::Report> {
    world.provide_token(&name, VALID_TOKEN)
}

#[when(r#"the resource "{name}" is deleted"#)]
fn resource_is_deleted(world: &mut ReconcileWorld, name: String) -> Result<(), eyre::Report> {
    run_async(world.store.delete(&key(&name))).wrap_err("request deletion")?;
    Ok(())
}
