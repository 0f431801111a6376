//! Terminal notifications and the completion sound.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use autobuild_core::{CompletionSound, NotificationSink};

const BELL: &str = "\x07";

/// Writes warnings to stderr and plays `<sounds_dir>/<name>.wav` with an
/// external player, ringing the terminal bell when that is not possible.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    sounds_dir: Option<PathBuf>,
    player: Option<String>,
    quiet: bool,
    warnings: Mutex<usize>,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sounds(mut self, sounds_dir: impl Into<PathBuf>, player: impl Into<String>) -> Self {
        self.sounds_dir = Some(sounds_dir.into());
        self.player = Some(player.into());
        self
    }

    /// Log warnings only; do not print them or ring the bell.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Number of warnings raised so far.
    pub fn warning_count(&self) -> usize {
        *self.warnings.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn sound_file(&self, sound: CompletionSound) -> Option<PathBuf> {
        let path = self
            .sounds_dir
            .as_ref()?
            .join(format!("{}.wav", sound.name()));
        path.is_file().then_some(path)
    }

    fn ring_bell(&self) {
        if self.quiet {
            return;
        }
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(BELL.as_bytes());
        let _ = stderr.flush();
    }
}

impl NotificationSink for TerminalNotifier {
    fn notify_warning(&self, title: &str, message: &str) {
        *self.warnings.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        warn!(title = %title, "{}", message);
        if !self.quiet {
            eprintln!("warning: {title}\n{message}");
        }
    }

    fn play_completion_sound(&self, sound: CompletionSound) {
        let (Some(player), Some(file)) = (self.player.as_ref(), self.sound_file(sound)) else {
            debug!(sound = %sound, "No sound file or player; ringing bell");
            self.ring_bell();
            return;
        };

        info!(sound = %sound, file = %file.display(), "Playing completion sound");
        let spawned = Command::new(player)
            .arg(&file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            warn!(player = %player, error = %e, "Failed to start sound player");
            self.ring_bell();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_warnings() {
        let notifier = TerminalNotifier::new().quiet();
        notifier.notify_warning("Git sync failed", "repo1: CONFLICT");
        notifier.notify_warning("Git sync failed", "repo2: CONFLICT");
        assert_eq!(notifier.warning_count(), 2);
    }

    #[test]
    fn test_sound_file_requires_existing_wav() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("music3.wav"), b"RIFF").unwrap();
        let notifier = TerminalNotifier::new().with_sounds(dir.path(), "true");

        assert_eq!(
            notifier.sound_file(CompletionSound::Music3),
            Some(dir.path().join("music3.wav"))
        );
        assert_eq!(notifier.sound_file(CompletionSound::Music1), None);
    }

    #[test]
    fn test_missing_player_falls_back_quietly() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("music1.wav"), b"RIFF").unwrap();
        let notifier = TerminalNotifier::new()
            .with_sounds(dir.path(), "autobuild-no-such-player")
            .quiet();
        notifier.play_completion_sound(CompletionSound::Music1);
    }
}
