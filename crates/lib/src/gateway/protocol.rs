//! Gateway wire types.

use serde::{Deserialize, Serialize};

/// `POST /api/console` body: `{ "command": [...], "director"?, "user"? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleParams {
    pub command: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
}

/// `GET /api/jobs/tasks` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobTasksQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub user: Option<String>,
}

/// `GET /` health payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub runtime: String,
    pub protocol: u32,
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_params_optional_fields() {
        let p: ConsoleParams = serde_json::from_str(r#"{"command":["status","dir"]}"#).unwrap();
        assert_eq!(p.command, vec!["status", "dir"]);
        assert!(p.director.is_none());
        assert!(p.user.is_none());

        let p: ConsoleParams = serde_json::from_str(
            r#"{"command":["show","pool=Default"],"director":"backupDir","user":"alice"}"#,
        )
        .unwrap();
        assert_eq!(p.director.as_deref(), Some("backupDir"));
        assert_eq!(p.user.as_deref(), Some("alice"));
    }
}
