use crate::core::error::SmartCloudError;
use crate::display;
use crate::system::{ShellType, SystemInfo};
use std::process::{Command, Stdio};
use tracing::info;

/// Builds the shell invocation for a command on the detected shell.
pub fn shell_command(command: &str, system_info: &SystemInfo) -> Command {
    let mut cmd = Command::new(&system_info.shell_path);
    match system_info.shell_type {
        ShellType::Cmd => cmd.arg("/C").arg(command),
        ShellType::PowerShell => cmd.arg("-Command").arg(command),
        ShellType::UnixLike | ShellType::Fish => cmd.arg("-c").arg(command),
    };
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd
}

/// Runs a command the user has already confirmed. Returns whether it exited successfully.
pub fn execute_command(command: &str, system_info: &SystemInfo) -> Result<bool, SmartCloudError> {
    info!(command, shell = %system_info.shell_path, "executing confirmed command");
    display::display_execution_banner(command);

    let output = shell_command(command, system_info)
        .output()
        .map_err(|e| SmartCloudError::Execution(format!("Failed to spawn shell: {}", e)))?;

    display::display_stdout(&output.stdout);
    display::display_stderr(&output.stderr);
    display::display_execution_status(output.status.success());

    Ok(output.status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn unix_shell_receives_dash_c() {
        let info = SystemInfo {
            os_info: "Linux".to_string(),
            shell_path: "/bin/sh".to_string(),
            shell_type: ShellType::UnixLike,
        };
        let output = shell_command("echo routed", &info).output().unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "routed");
    }
}
