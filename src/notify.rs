use notify_rust::{Notification, Urgency};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

const SOUNDS: [(&str, &str); 3] = [
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

/// Desktop notification plus, when enabled, a short system sound.
/// Either part failing is not an error.
pub fn session_complete(minutes: u32, sound: bool) {
    let shown = Notification::new()
        .summary("Focus session complete 🎯")
        .body(&format!("{minutes} minutes of focus logged. Take a break!"))
        .appname("focusflow")
        .icon("alarm-clock")
        .urgency(Urgency::Critical)
        .show();
    if let Err(e) = shown {
        debug!(error = %e, "desktop notification unavailable");
    }

    if sound {
        chime();
    }
}

pub fn chime() {
    std::thread::spawn(|| {
        for (cmd, file) in SOUNDS {
            if Path::new(file).exists() {
                // Waiting here reaps the child; this thread is detached.
                let played = Command::new(cmd)
                    .arg(file)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
                if let Err(e) = played {
                    debug!(cmd, error = %e, "sound player unavailable");
                }
                return;
            }
        }
        // Terminal bell when no sound file is installed.
        print!("\x07");
    });
}
