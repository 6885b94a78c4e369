//! Deploy helper script generation.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{PublishError, PublishResult};

/// Render the deploy script for an app.
///
/// The script looks the app up by name with `doctl apps list` and either
/// updates it in place or creates it from the spec file sitting next to the
/// script. `app_name` must already be sanitized and `spec_file_name` must
/// have passed [`PublishConfig::validate`](crate::PublishConfig::validate).
pub fn render_deploy_script(app_name: &str, spec_file_name: &str) -> String {
    format!(
        r#"#!/usr/bin/env bash
# Deploy script for the {app} App Platform app.
# Generated by dospec - regenerate with `dospec publish` instead of editing.
set -euo pipefail

APP_NAME="{app}"
SCRIPT_DIR="$(cd "$(dirname "${{BASH_SOURCE[0]}}")" && pwd)"
SPEC_FILE="$SCRIPT_DIR/{spec}"

if ! command -v doctl >/dev/null 2>&1; then
  echo "doctl is required: https://docs.digitalocean.com/reference/doctl/how-to/install/" >&2
  exit 1
fi

APP_ID="$(doctl apps list --format ID,Spec.Name --no-header | awk -v name="$APP_NAME" '$2 == name {{ print $1; exit }}')"

if [ -n "$APP_ID" ]; then
  echo "Updating app $APP_NAME ($APP_ID)"
  doctl apps update "$APP_ID" --spec "$SPEC_FILE"
else
  echo "Creating app $APP_NAME"
  doctl apps create --spec "$SPEC_FILE"
fi
"#,
        app = app_name,
        spec = spec_file_name,
    )
}

/// Write a script in one buffer and mark it executable on Unix.
pub fn write_script(path: &Path, content: &str) -> PublishResult<()> {
    fs::write(path, content).map_err(|source| PublishError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    make_executable(path)?;
    debug!("Wrote deploy script {:?}", path);
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> PublishResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> PublishResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_render_deploy_script() {
        let script = render_deploy_script("my-shop", "app.yaml");
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        assert!(script.contains("APP_NAME=\"my-shop\""));
        assert!(script.contains("SPEC_FILE=\"$SCRIPT_DIR/app.yaml\""));
        assert!(script.contains("doctl apps list --format ID,Spec.Name --no-header"));
        assert!(script.contains("doctl apps update \"$APP_ID\" --spec \"$SPEC_FILE\""));
        assert!(script.contains("doctl apps create --spec \"$SPEC_FILE\""));
        assert!(script.contains("${BASH_SOURCE[0]}"));
        assert!(script.contains("{ print $1; exit }"));
    }

    #[test]
    fn test_write_script() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deploy.sh");
        write_script(&path, &render_deploy_script("app", "app.yaml")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("APP_NAME=\"app\""));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_write_script_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("deploy.sh");
        let err = write_script(&path, "#!/bin/sh\n").unwrap_err();
        assert!(matches!(err, PublishError::Write { .. }));
    }
}
