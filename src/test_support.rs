//! Stand-in mirror binaries for tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Writes an executable `sh` script into `dir` that runs `prelude`, then
/// records its argument count and arguments (one per line) to `<name>.args`.
///
/// Returns the script path and the record path.
pub fn recording_script(dir: &Path, name: &str, prelude: &str) -> (PathBuf, PathBuf) {
    let script = dir.join(name);
    let record = dir.join(format!("{name}.args"));
    let staging = dir.join(format!("{name}.args.tmp"));

    let body = format!(
        "#!/bin/sh\n{prelude}\nprintf '%s\\n' \"$#\" \"$@\" > '{}'\nmv '{}' '{}'\n",
        staging.display(),
        staging.display(),
        record.display(),
    );
    std::fs::write(&script, body).unwrap();

    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    (script, record)
}

/// Arguments a [`recording_script`] was run with, or `None` if it never ran.
pub fn recorded_args(record: &Path) -> Option<Vec<String>> {
    let text = std::fs::read_to_string(record).ok()?;
    let mut lines = text.lines();
    let count: usize = lines.next()?.parse().ok()?;
    let args: Vec<String> = lines.map(str::to_owned).collect();
    assert_eq!(args.len(), count, "argument with an embedded newline");
    Some(args)
}
