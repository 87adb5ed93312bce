//! Playback element backed by an external player process

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::{Child, Command};

use super::playback::PlaybackElement;

/// Players tried in order when none is configured
const CANDIDATES: &[&str] = &[
    "afplay",
    "ffplay -nodisp -autoexit -loglevel quiet",
    "mpv --no-video --really-quiet",
];

/// Plays files by spawning a command-line player with the file as last argument
#[derive(Debug)]
pub struct CommandPlayer {
    command: Option<Vec<String>>,
    source: Option<PathBuf>,
    child: Option<Child>,
}

impl CommandPlayer {
    /// Player for an explicit command line, e.g. "mpv --no-video"
    pub fn new(command: &str) -> Self {
        let parts: Vec<String> = command.split_whitespace().map(String::from).collect();
        Self {
            command: if parts.is_empty() { None } else { Some(parts) },
            source: None,
            child: None,
        }
    }

    /// Use the configured command, or the first known player on PATH.
    ///
    /// Finding nothing is not an error here; `play` reports it instead.
    pub fn detect(configured: Option<&str>) -> Self {
        if let Some(command) = configured.filter(|c| !c.trim().is_empty()) {
            return Self::new(command);
        }

        for candidate in CANDIDATES {
            let program = candidate.split_whitespace().next().unwrap_or_default();
            if which::which(program).is_ok() {
                log::debug!("Using audio player: {}", candidate);
                return Self::new(candidate);
            }
        }

        log::debug!("No audio player found on PATH");
        Self {
            command: None,
            source: None,
            child: None,
        }
    }

    /// The command line that will be run, without the file argument
    pub fn command_line(&self) -> Option<String> {
        self.command.as_ref().map(|c| c.join(" "))
    }

    fn signal(&self, signal: &str) -> Result<()> {
        let Some(pid) = self.child.as_ref().and_then(|c| c.id()) else {
            return Ok(());
        };

        let status = std::process::Command::new("kill")
            .arg(signal)
            .arg(pid.to_string())
            .status()
            .context("Failed to run kill")?;

        if !status.success() {
            bail!("kill {} {} failed with status: {}", signal, pid, status);
        }
        Ok(())
    }

    fn report_exit(status: std::process::ExitStatus) {
        if status.success() {
            log::debug!("Player finished");
        } else {
            log::warn!("Player exited with status: {}", status);
        }
    }
}

#[async_trait]
impl PlaybackElement for CommandPlayer {
    fn set_source(&mut self, path: &Path) -> Result<()> {
        self.stop()?;
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let Some(command) = &self.command else {
            bail!(
                "No audio player found. Install ffmpeg or mpv, or run 'vocalize config set-player <command>'"
            );
        };
        let source = self.source.as_ref().context("No audio source set")?;

        let child = Command::new(&command[0])
            .args(&command[1..])
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", command[0]))?;

        self.child = Some(child);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.signal("-STOP")
    }

    fn resume(&mut self) -> Result<()> {
        self.signal("-CONT")
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            child.start_kill().context("Failed to stop player")?;
        }
        Ok(())
    }

    fn try_finished(&mut self) -> Result<bool> {
        let Some(child) = self.child.as_mut() else {
            return Ok(true);
        };

        match child.try_wait().context("Failed to check player")? {
            Some(status) => {
                Self::report_exit(status);
                self.child = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn wait_finished(&mut self) -> Result<()> {
        if let Some(child) = self.child.as_mut() {
            let status = child.wait().await.context("Failed to wait for player")?;
            Self::report_exit(status);
            self.child = None;
        }
        Ok(())
    }
}
