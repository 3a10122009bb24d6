use super::{CommandExecutor, PLAIN_THRESHOLD, PLAYFUL_THRESHOLD};
use std::process::Command;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Notepad,
    Calculator,
    Browser,
    FileManager,
    VolumeUp,
    VolumeDown,
    VolumeMute,
    Screenshot,
}

/// A process to launch; `wait` means run to completion rather than detach.
#[derive(Debug, PartialEq, Eq)]
struct Launch {
    program: &'static str,
    args: Vec<&'static str>,
    wait: bool,
}

impl Launch {
    fn spawn(program: &'static str, args: &[&'static str]) -> Self {
        Self {
            program,
            args: args.to_vec(),
            wait: false,
        }
    }

    fn run(program: &'static str, args: &[&'static str]) -> Self {
        Self {
            wait: true,
            ..Self::spawn(program, args)
        }
    }
}

/// Local desktop actions: open apps, volume keys, screenshots.
pub struct DesktopCommands {
    platform: Platform,
    dry_run: bool,
}

impl Default for DesktopCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopCommands {
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
            dry_run: false,
        }
    }

    /// Recognise and phrase commands without launching anything.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::new()
        }
    }

    fn launch(&self, launch: &Launch) -> std::io::Result<()> {
        if self.dry_run {
            info!(program = launch.program, "dry run, not launching");
            return Ok(());
        }
        let mut cmd = Command::new(launch.program);
        cmd.args(&launch.args);
        if launch.wait {
            cmd.status().map(|_| ())
        } else {
            cmd.spawn().map(|_| ())
        }
    }
}

fn parse(raw: &str, platform: Platform) -> Option<Action> {
    let cmd = raw.to_lowercase();
    if cmd.contains("open") {
        if cmd.contains("notepad") {
            Some(Action::Notepad)
        } else if cmd.contains("calculator") {
            Some(Action::Calculator)
        } else if cmd.contains("browser") || cmd.contains("chrome") {
            Some(Action::Browser)
        } else if cmd.contains("file manager") || cmd.contains("explorer") {
            Some(Action::FileManager)
        } else {
            None
        }
    } else if cmd.contains("volume") {
        // volume keys are only wired up on Windows
        if platform != Platform::Windows {
            None
        } else if cmd.contains("up") {
            Some(Action::VolumeUp)
        } else if cmd.contains("down") {
            Some(Action::VolumeDown)
        } else if cmd.contains("mute") {
            Some(Action::VolumeMute)
        } else {
            None
        }
    } else if cmd.contains("screenshot") {
        Some(Action::Screenshot)
    } else {
        None
    }
}

const BROWSER_URL: &str = "https://www.google.com";

fn volume_key(code: u8) -> &'static str {
    match code {
        175 => "(New-Object -comObject WScript.Shell).SendKeys([char]175)",
        174 => "(New-Object -comObject WScript.Shell).SendKeys([char]174)",
        _ => "(New-Object -comObject WScript.Shell).SendKeys([char]173)",
    }
}

fn launch_for(action: Action, platform: Platform) -> Launch {
    use Platform::*;
    match (action, platform) {
        (Action::Notepad, Windows) => Launch::spawn("notepad.exe", &[]),
        (Action::Notepad, MacOs) => Launch::spawn("open", &["-a", "TextEdit"]),
        (Action::Notepad, Other) => Launch::spawn("gedit", &[]),
        (Action::Calculator, Windows) => Launch::spawn("calc.exe", &[]),
        (Action::Calculator, MacOs) => Launch::spawn("open", &["-a", "Calculator"]),
        (Action::Calculator, Other) => Launch::spawn("gnome-calculator", &[]),
        (Action::Browser, Windows) => Launch::spawn("cmd", &["/C", "start", "", BROWSER_URL]),
        (Action::Browser, MacOs) => Launch::spawn("open", &[BROWSER_URL]),
        (Action::Browser, Other) => Launch::spawn("xdg-open", &[BROWSER_URL]),
        (Action::FileManager, Windows) => Launch::spawn("explorer.exe", &[]),
        (Action::FileManager, MacOs) => Launch::spawn("open", &["."]),
        (Action::FileManager, Other) => Launch::spawn("nautilus", &[]),
        (Action::VolumeUp, _) => Launch::run("powershell", &["-c", volume_key(175)]),
        (Action::VolumeDown, _) => Launch::run("powershell", &["-c", volume_key(174)]),
        (Action::VolumeMute, _) => Launch::run("powershell", &["-c", volume_key(173)]),
        (Action::Screenshot, Windows) => Launch::run(
            "powershell",
            &[
                "-c",
                "Add-Type -AssemblyName System.Windows.Forms; [System.Windows.Forms.SendKeys]::SendWait('%{PRTSC}')",
            ],
        ),
        (Action::Screenshot, MacOs) => Launch::run("screencapture", &["screenshot.png"]),
        (Action::Screenshot, Other) => Launch::run("gnome-screenshot", &["-f", "screenshot.png"]),
    }
}

/// Reply text for `action`, in three tiers: playful (> 0.7), friendly (> 0.3), plain.
fn phrase(action: Action, platform: Platform, creativity: f64) -> String {
    let tier = |playful: &str, friendly: &str, plain: &str| {
        if creativity > PLAYFUL_THRESHOLD {
            playful.to_string()
        } else if creativity > PLAIN_THRESHOLD {
            friendly.to_string()
        } else {
            plain.to_string()
        }
    };
    let windows = platform == Platform::Windows;
    match action {
        Action::Notepad if windows => tier(
            "Notepad is now ready for your brilliant thoughts! Time to write something amazing!",
            "Opening Notepad for you...",
            "Opening Notepad...",
        ),
        Action::Notepad => tier("Text editor at your service!", "Text editor at your service!", "Opening text editor..."),
        Action::Calculator if windows => tier(
            "Calculator is ready to crunch some numbers! Let's solve the mysteries of mathematics!",
            "Opening Calculator for you...",
            "Opening Calculator...",
        ),
        Action::Calculator => tier("Calculator ready for action!", "Calculator ready for action!", "Opening Calculator..."),
        Action::Browser => tier(
            "Your digital gateway to the internet is now open! Happy browsing, explorer!",
            "Opening your web browser...",
            "Opening web browser...",
        ),
        Action::FileManager => {
            let name = if windows { "File Explorer" } else { "File Manager" };
            tier(
                &format!("📁 Opening {name} Time to organize those digital treasures!"),
                &format!("📁 Opening {name}..."),
                &format!("Opening {name}..."),
            )
        }
        Action::VolumeUp => tier(
            "🔊 Volume boosted! Hope your ears are ready for this!",
            "🔊 Volume increased.",
            "Volume increased.",
        ),
        Action::VolumeDown => tier(
            "🔉 Toned it down a notch! Your neighbors will thank you.",
            "🔉 Volume decreased.",
            "Volume decreased.",
        ),
        Action::VolumeMute => tier(
            "🔇 Silence is golden! Volume has been muted/unmuted.",
            "🔇 Volume muted/unmuted.",
            "Volume muted/unmuted.",
        ),
        Action::Screenshot if windows => tier(
            "📸 Say cheese! Screenshot captured and saved to your clipboard. Picture perfect!",
            "📸 Screenshot taken and saved to clipboard.",
            "Screenshot taken and saved to clipboard.",
        ),
        Action::Screenshot => tier(
            "📸 Snapshot saved as screenshot.png! Another moment preserved in digital amber!",
            "Screenshot saved as screenshot.png",
            "Screenshot saved as screenshot.png",
        ),
    }
}

fn failure_text(action: Action, creativity: f64) -> String {
    match action {
        Action::Screenshot if creativity > PLAYFUL_THRESHOLD => {
            "📸 Oops! My camera skills need some work. Screenshot failed to capture.".to_string()
        }
        Action::Screenshot => "Unable to take screenshot.".to_string(),
        _ => "Sorry, I couldn't run that command on this system.".to_string(),
    }
}

impl CommandExecutor for DesktopCommands {
    fn execute(&self, raw: &str, creativity: f64) -> Option<String> {
        let action = parse(raw, self.platform)?;
        let launch = launch_for(action, self.platform);
        match self.launch(&launch) {
            Ok(()) => {
                info!(action = ?action, program = launch.program, "system command executed");
                Some(phrase(action, self.platform, creativity))
            }
            Err(e) => {
                warn!(action = ?action, program = launch.program, "system command failed: {e}");
                Some(failure_text(action, creativity))
            }
        }
    }
}
