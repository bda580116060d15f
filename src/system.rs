use std::env;
use std::path::Path;

/// Shell families that take different arguments for an inline command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellType {
    Cmd,        // Windows Command Prompt
    PowerShell, // Windows PowerShell or PowerShell Core
    UnixLike,   // Bash, Zsh, Sh, etc.
    Fish,
}

/// The host environment a suggested command will eventually run in
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os_info: String,
    pub shell_path: String,
    pub shell_type: ShellType,
}

impl SystemInfo {
    /// Detects the current operating system and shell.
    pub fn detect() -> Self {
        let info = os_info::get();
        let os_info = format!("{} {} {}", info.os_type(), info.version(), info.bitness());
        let (shell_path, shell_type) = detect_shell();

        SystemInfo {
            os_info,
            shell_path,
            shell_type,
        }
    }

    /// One-line description handed to the action agent so its suggestion fits this host.
    pub fn prompt_context(&self) -> String {
        format!(
            "The current shell is {} and the OS is {}.",
            self.shell_path, self.os_info
        )
    }
}

fn detect_shell() -> (String, ShellType) {
    if cfg!(target_os = "windows") {
        if env::var("PSModulePath").is_ok() {
            if let Ok(posh_path) = env::var("POSH_EXECUTABLE") {
                if Path::new(&posh_path).exists() {
                    return (posh_path, ShellType::PowerShell);
                }
            }
            return ("powershell.exe".to_string(), ShellType::PowerShell);
        }
        (
            env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            ShellType::Cmd,
        )
    } else {
        let shell_path = env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        let shell_type = classify_unix_shell(&shell_path);
        (shell_path, shell_type)
    }
}

fn classify_unix_shell(shell_path: &str) -> ShellType {
    let shell_name = Path::new(shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sh")
        .to_lowercase();

    if shell_name == "fish" {
        ShellType::Fish
    } else {
        ShellType::UnixLike
    }
}
