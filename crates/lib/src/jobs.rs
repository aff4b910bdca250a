//! Job names per director, cross-checked against `show jobs`.
//!
//! `.jobs` can be polluted by unrelated console chatter (e.g. "You have messages."),
//! so a name is kept only when `show jobs` has a `Job: name=<name>` line for it.

use serde_json::{Map, Value};

use crate::console::{valid_user_name, Bridge, ErrorCode, NormalizedResult, Output};

/// Map of director -> job names, in listing order. `limit > 0` caps the names per director.
pub fn job_tasks(bridge: &Bridge, user: Option<&str>, limit: usize) -> NormalizedResult {
    if user.is_some_and(|u| !valid_user_name(u)) {
        log::debug!("job tasks refused for user {:?}", user);
        return NormalizedResult::failure(ErrorCode::InvalidCommand);
    }
    let directors = bridge.list_directors();
    if !directors.is_ok() {
        return NormalizedResult::failure(ErrorCode::ConnectionProblem);
    }
    let mut tasks = Map::new();
    for director in &directors.output {
        let names = bridge.command(Some(director.as_str()), [".jobs"], user).output.into_lines();
        let show = bridge
            .command(Some(director.as_str()), ["show", "jobs"], user)
            .output
            .into_lines();
        let jobs = confirmed_jobs(&names, &show, limit);
        tasks.insert(
            director.clone(),
            Value::Array(jobs.into_iter().map(Value::String).collect()),
        );
    }
    NormalizedResult::ok(Output::Object(Value::Object(tasks)))
}

fn confirmed_jobs(names: &[String], show: &[String], limit: usize) -> Vec<String> {
    let mut jobs = Vec::new();
    for name in names {
        let prefix = format!("Job: name={}", name);
        if show.iter().any(|l| l.starts_with(&prefix)) {
            jobs.push(name.clone());
        }
        if limit > 0 && jobs.len() == limit {
            break;
        }
    }
    jobs
}
