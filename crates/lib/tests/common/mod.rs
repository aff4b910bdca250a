//! Shared fixture: a shell script standing in for the console program.
//!
//! The script is written once per test binary, before any test spawns a process,
//! so no child can inherit it open for writing.

#![allow(dead_code)]

use bridge::config::{ConsoleConfig, ExecMode};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const FAKE_CONSOLE: &str = r#"#!/bin/sh
cfg=""
director="default"
list=0
while [ $# -gt 0 ]; do
  case "$1" in
    -c) cfg="$2"; shift 2 ;;
    -D) director="$2"; shift 2 ;;
    -l) list=1; shift ;;
    *) shift ;;
  esac
done
if [ ! -f "$cfg" ]; then
  echo "Config file $cfg not found" >&2
  exit 1
fi
if [ "$list" -eq 1 ]; then
  echo backupDir
  echo archiveDir
  exit 0
fi
echo "Connecting to Director $director:9101"
while IFS= read -r line; do
  echo "$line"
  case "$line" in
    quit) exit 0 ;;
    version) echo "$director Version: 9.0.6 (20 November 2017)" ;;
    "show pool=Default")
      echo "Pool: name=Default PoolType=Backup"
      echo "  MaxVols=100 AutoPrune=1"
      ;;
    "status dir") echo "status using $cfg" ;;
    .jobs) echo "BackupCatalog"; echo "You have messages." ;;
    "show jobs") echo "Job: name=BackupCatalog JobType=66 level=Full" ;;
    sleep) sleep 30 ;;
    detach) sleep 30 & ;;
    stderr) echo "warning on stderr" >&2; echo "after" ;;
    *) echo "unknown: $line" ;;
  esac
done
exit 0
"#;

pub struct Fixture {
    pub dir: PathBuf,
    pub bin: PathBuf,
    pub cfg: PathBuf,
}

pub fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let dir = std::env::temp_dir().join(format!("bconsole-bridge-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create fixture dir");
        let bin = dir.join("bconsole");
        std::fs::write(&bin, FAKE_CONSOLE).expect("write fake console");
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake console");
        let cfg = dir.join("bconsole.conf");
        touch(&cfg);
        touch(&dir.join("bconsole-alice.conf"));
        Fixture { dir, bin, cfg }
    })
}

fn touch(path: &Path) {
    std::fs::write(path, "Director {\n  Name = backupDir\n}\n").expect("write console config");
}

/// Console config pointing at the fake console, with a per-user template in the fixture dir.
pub fn console_config(mode: ExecMode) -> ConsoleConfig {
    let f = fixture();
    ConsoleConfig {
        bin_path: f.bin.to_string_lossy().into_owned(),
        cfg_path: f.cfg.to_string_lossy().into_owned(),
        cfg_custom_path: Some(
            f.dir
                .join("bconsole-{user}.conf")
                .to_string_lossy()
                .into_owned(),
        ),
        use_sudo: false,
        timeout_secs: 20,
        exec_mode: mode,
    }
}
