//! Replacement script: swaps the executable after this process has exited.
//!
//! A running image cannot reliably overwrite its own file, so the swap runs in
//! a detached shell that waits, copies the artifact over the target, starts
//! the target, then deletes the artifact and itself.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempPath;

const SCRIPT_PREFIX: &str = "relaunch-swap-";

#[cfg(unix)]
const SCRIPT_SUFFIX: &str = ".sh";
#[cfg(windows)]
const SCRIPT_SUFFIX: &str = ".bat";

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("cannot locate current executable: {0}")]
    CurrentExe(#[source] io::Error),

    #[error("failed to write replacement script: {0}")]
    Write(#[source] io::Error),

    #[error("failed to hand temp files to the replacement script: {0}")]
    Persist(#[source] io::Error),

    #[error("failed to launch replacement script: {0}")]
    Launch(#[source] io::Error),
}

/// POSIX shell body. Runs under `/bin/sh <script>`, so `$0` is the script itself.
pub fn render_sh(artifact: &Path, target: &Path, delay: Duration) -> String {
    let artifact = sh_quote(artifact);
    let target = sh_quote(target);
    format!(
        "#!/bin/sh\n\
         sleep {delay}\n\
         cp -f {artifact} {target}\n\
         {target} >/dev/null 2>&1 &\n\
         rm -f {artifact}\n\
         rm -f \"$0\"\n",
        delay = delay.as_secs(),
    )
}

/// Windows batch body. `ping` provides the delay because `timeout` refuses to
/// run without console input.
pub fn render_batch(artifact: &Path, target: &Path, delay: Duration) -> String {
    let artifact = batch_quote(artifact);
    let target = batch_quote(target);
    format!(
        "@echo off\r\n\
         ping -n {pings} 127.0.0.1 >nul\r\n\
         copy /Y {artifact} {target} >nul\r\n\
         start \"\" {target}\r\n\
         del {artifact}\r\n\
         del \"%~f0\"\r\n",
        pings = delay.as_secs() + 1,
    )
}

/// Script body for the host platform.
pub fn render(artifact: &Path, target: &Path, delay: Duration) -> String {
    if cfg!(windows) {
        render_batch(artifact, target, delay)
    } else {
        render_sh(artifact, target, delay)
    }
}

fn sh_quote(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

fn batch_quote(path: &Path) -> String {
    format!("\"{}\"", path.to_string_lossy().replace('%', "%%"))
}

/// Script written to the temp directory, not yet launched. Removed on drop.
#[derive(Debug)]
pub struct ReplacementScript {
    path: TempPath,
    artifact: PathBuf,
    target: PathBuf,
}

impl ReplacementScript {
    /// Writes a script in `dir` that will move `artifact` over `target`.
    pub fn create(
        dir: &Path,
        artifact: &Path,
        target: &Path,
        delay: Duration,
    ) -> Result<Self, ScriptError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(SCRIPT_PREFIX)
            .suffix(SCRIPT_SUFFIX)
            .tempfile_in(dir)
            .map_err(ScriptError::Write)?;
        tmp.write_all(render(artifact, target, delay).as_bytes())
            .map_err(ScriptError::Write)?;
        tmp.as_file().sync_all().map_err(ScriptError::Write)?;

        let path = tmp.into_temp_path();
        tracing::debug!(
            script = %path.display(),
            artifact = %artifact.display(),
            target = %target.display(),
            "replacement script written"
        );
        Ok(ReplacementScript {
            path,
            artifact: artifact.to_path_buf(),
            target: target.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Starts the script detached from this process. From here on the script
    /// owns its own file; if spawning fails the file is removed.
    pub fn launch(self) -> Result<(), ScriptError> {
        let path = self.path.keep().map_err(|e| ScriptError::Persist(e.error))?;
        match spawn_detached(&path) {
            Ok(child) => {
                tracing::debug!(pid = child.id(), script = %path.display(), "replacement script started");
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&path);
                Err(ScriptError::Launch(e))
            }
        }
    }
}

/// New session, no inherited stdio: the child survives our exit and never
/// touches the caller's terminal.
#[cfg(unix)]
fn spawn_detached(script: &Path) -> io::Result<Child> {
    use std::os::unix::process::CommandExt;

    let mut cmd = Command::new("/bin/sh");
    cmd.arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    // SAFETY: setsid is async-signal-safe and only affects the forked child.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
    cmd.spawn()
}

#[cfg(windows)]
fn spawn_detached(script: &Path) -> io::Result<Child> {
    use std::os::windows::process::CommandExt;

    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    Command::new("cmd")
        .arg("/C")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW)
        .spawn()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sh_script_steps_in_order() {
        let s = render_sh(
            Path::new("/tmp/relaunch-update-abc"),
            Path::new("/opt/app/bin/app"),
            Duration::from_secs(2),
        );
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(
            lines,
            [
                "#!/bin/sh",
                "sleep 2",
                "cp -f '/tmp/relaunch-update-abc' '/opt/app/bin/app'",
                "'/opt/app/bin/app' >/dev/null 2>&1 &",
                "rm -f '/tmp/relaunch-update-abc'",
                "rm -f \"$0\"",
            ]
        );
    }

    #[test]
    fn sh_quote_escapes_single_quotes() {
        let s = render_sh(
            Path::new("/tmp/it's"),
            Path::new("/home/o'brien/app"),
            Duration::from_secs(0),
        );
        assert!(s.contains(r"cp -f '/tmp/it'\''s' '/home/o'\''brien/app'"));
    }

    #[test]
    fn batch_script_steps_in_order() {
        let s = render_batch(
            Path::new(r"C:\Temp\relaunch-update-abc.exe"),
            Path::new(r"C:\Program Files\App\app.exe"),
            Duration::from_secs(2),
        );
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(
            lines,
            [
                "@echo off",
                "ping -n 3 127.0.0.1 >nul",
                r#"copy /Y "C:\Temp\relaunch-update-abc.exe" "C:\Program Files\App\app.exe" >nul"#,
                r#"start "" "C:\Program Files\App\app.exe""#,
                r#"del "C:\Temp\relaunch-update-abc.exe""#,
                r#"del "%~f0""#,
            ]
        );
    }

    #[test]
    fn batch_quote_doubles_percent() {
        let s = render_batch(
            Path::new(r"C:\Temp\50%\new.exe"),
            Path::new(r"C:\App\app.exe"),
            Duration::from_secs(1),
        );
        assert!(s.contains(r#""C:\Temp\50%%\new.exe""#));
    }

    #[test]
    fn create_writes_rendered_script_and_drop_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("artifact");
        let target = dir.path().join("target");
        let script =
            ReplacementScript::create(dir.path(), &artifact, &target, Duration::from_secs(2))
                .unwrap();
        let path = script.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            render(&artifact, &target, Duration::from_secs(2))
        );
        assert_eq!(script.artifact(), artifact);
        assert_eq!(script.target(), target);

        drop(script);
        assert!(!path.exists());
    }

    #[test]
    fn script_suffix_matches_launcher() {
        let dir = tempfile::tempdir().unwrap();
        let script = ReplacementScript::create(
            dir.path(),
            &dir.path().join("artifact"),
            &dir.path().join("target"),
            Duration::from_secs(0),
        )
        .unwrap();
        let name = script.path().file_name().unwrap().to_string_lossy();
        if cfg!(windows) {
            assert!(name.ends_with(".bat"), "{}", name);
        } else {
            assert!(name.ends_with(".sh"), "{}", name);
        }
    }

    /// Full swap against throwaway files: the "new build" is a shell script
    /// that leaves a marker when relaunched.
    #[cfg(unix)]
    #[test]
    fn launched_script_swaps_relaunches_and_cleans_up() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("relaunched");
        let artifact = dir.path().join("artifact");
        let target = dir.path().join("target");

        fs::write(
            &artifact,
            format!("#!/bin/sh\necho new > {}\n", sh_quote(&marker)),
        )
        .unwrap();
        fs::set_permissions(&artifact, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(&target, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o755)).unwrap();

        let script =
            ReplacementScript::create(dir.path(), &artifact, &target, Duration::from_secs(0))
                .unwrap();
        let script_path = script.path().to_path_buf();
        script.launch().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while (!marker.exists() || artifact.exists() || script_path.exists())
            && Instant::now() < deadline
        {
            std::thread::sleep(Duration::from_millis(50));
        }

        assert_eq!(fs::read_to_string(&marker).unwrap(), "new\n");
        assert!(fs::read_to_string(&target).unwrap().contains("echo new"));
        assert!(!artifact.exists(), "artifact should be deleted by the script");
        assert!(!script_path.exists(), "script should delete itself");
    }
}
