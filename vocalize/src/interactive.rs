//! Interactive session: the terminal version of the speak form
//!
//! A plain line sets the text and speaks it, an empty line speaks the
//! current text again, and `:` commands change the voice or control
//! playback.

use anyhow::Result;
use speech_client::{SpeechApi, Voice};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::audio::{PlaybackElement, PlaybackStatus};
use crate::coordinator::{Coordinator, Observer, ViewState};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Speak this text (empty = speak the current text)
    Speak(String),
    Voice(String),
    Voices,
    Pause,
    Resume,
    Stop,
    Replay,
    Status,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one input line
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Speak(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "voice" | "v" if !arg.is_empty() => Command::Voice(arg.to_string()),
        "voice" | "v" | "voices" => Command::Voices,
        "pause" | "p" => Command::Pause,
        "resume" | "r" => Command::Resume,
        "stop" | "s" => Command::Stop,
        "replay" => Command::Replay,
        "status" => Command::Status,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Messages worth printing when the view state changes from `prev` to `next`
pub fn describe_change(prev: &ViewState, next: &ViewState) -> Vec<String> {
    let mut lines = Vec::new();

    if next.loading && !prev.loading {
        lines.push("Generating audio...".to_string());
    }
    if next.voice != prev.voice {
        lines.push(format!("Voice: {}", next.voice.label()));
    }
    if let Some(error) = &next.error {
        if prev.error.as_ref() != Some(error) {
            lines.push(format!("Error: {}", error));
        }
    }
    if next.playback != prev.playback {
        match next.playback {
            PlaybackStatus::Playing if prev.playback == PlaybackStatus::Paused => {
                lines.push("Resumed".to_string())
            }
            PlaybackStatus::Playing => lines.push("Playing".to_string()),
            PlaybackStatus::Paused => lines.push("Paused".to_string()),
            PlaybackStatus::Ended => lines.push("Finished".to_string()),
            PlaybackStatus::Idle if prev.playback.is_active() && !next.loading => {
                lines.push("Stopped".to_string())
            }
            PlaybackStatus::Idle => {}
        }
    }

    lines
}

/// Observer that prints state changes to the terminal
pub fn terminal_observer() -> Observer {
    let mut prev = ViewState::default();
    Box::new(move |state: &ViewState| {
        for line in describe_change(&prev, state) {
            println!("{}", line);
        }
        prev = state.clone();
    })
}

const STILL_LOADING: &str = "Still loading, please wait";

/// Read stdin lines on a plain thread so a pending read never holds up exit
fn spawn_line_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Terminal input, with commands held back while a request is loading
struct Input {
    lines: mpsc::UnboundedReceiver<io::Result<String>>,
    held: VecDeque<String>,
    closed: bool,
}

impl Input {
    fn new(lines: mpsc::UnboundedReceiver<io::Result<String>>) -> Self {
        Self {
            lines,
            held: VecDeque::new(),
            closed: false,
        }
    }

    /// Next line to handle: held commands first, then stdin. None once
    /// stdin is closed and nothing is held.
    async fn next(&mut self) -> Option<io::Result<String>> {
        if let Some(line) = self.held.pop_front() {
            return Some(Ok(line));
        }
        if self.closed {
            return None;
        }
        let line = self.lines.recv().await;
        self.closed = line.is_none();
        line
    }

    /// A line typed while loading. Speak lines are rejected; anything else
    /// runs once the request is done.
    fn hold(&mut self, line: String) {
        match parse_command(&line) {
            Command::Speak(_) => println!("{}", STILL_LOADING),
            _ => self.held.push_back(line),
        }
    }
}

fn prompt(state: &ViewState) -> Result<()> {
    print!("[{} | {}] > ", state.voice, state.button_label());
    io::stdout().flush()?;
    Ok(())
}

fn print_help() {
    println!("Type text and press Enter to speak it. An empty line speaks the current text again.");
    println!();
    println!("  :voice NAME   Switch voice");
    println!("  :voices       List voices");
    println!("  :pause        Pause playback");
    println!("  :resume       Resume playback");
    println!("  :stop         Stop playback");
    println!("  :replay       Play the last audio again");
    println!("  :status       Show current state");
    println!("  :quit         Exit (also Ctrl-D)");
    println!();
    println!("Ctrl-C cancels a pending request, or exits at the prompt.");
}

fn print_voices(current: Voice) {
    for voice in Voice::ALL {
        let marker = if voice == current { "*" } else { " " };
        println!(" {} {}", marker, voice.label());
    }
}

fn print_status(state: &ViewState) {
    println!("Voice:    {}", state.voice.label());
    println!("Text:     {}", state.text);
    println!("Playback: {}", state.playback);
    if let Some(url) = &state.audio_url {
        println!("Audio:    {}", url);
    }
    if let Some(error) = &state.error {
        println!("Error:    {}", error);
    }
}

/// Speak the current text; Ctrl-C abandons the request
async fn speak<A: SpeechApi, E: PlaybackElement>(
    coordinator: &mut Coordinator<A, E>,
    input: &mut Input,
) -> Result<()> {
    let Some(ticket) = coordinator.begin() else {
        println!("{}", STILL_LOADING);
        return Ok(());
    };

    let outcome = {
        let request = coordinator.request(&ticket);
        tokio::pin!(request);
        loop {
            let line = tokio::select! {
                outcome = &mut request => break Some(outcome),
                _ = tokio::signal::ctrl_c() => break None,
                line = input.lines.recv(), if !input.closed => line,
            };
            match line {
                Some(line) => input.hold(line?),
                None => input.closed = true,
            }
        }
    };

    match outcome {
        Some(outcome) => match coordinator.finish(ticket, outcome) {
            // Errors are already shown by the observer
            Some(_) => {}
            None => log::debug!("Response arrived for an abandoned request"),
        },
        None => {
            println!();
            println!("Cancelled");
            coordinator.abandon();
        }
    }
    Ok(())
}

fn report<T>(result: Result<T, crate::error::PipelineError>) {
    if let Err(e) = result {
        println!("{}", e);
    }
}

/// Run the session until :quit, Ctrl-D or Ctrl-C at the prompt
pub async fn run<A: SpeechApi, E: PlaybackElement>(coordinator: &mut Coordinator<A, E>) -> Result<()> {
    println!("vocalize - text to speech with Amazon Polly");
    print_help();
    println!();
    prompt(coordinator.state())?;

    let mut input = Input::new(spawn_line_reader());
    let mut ticker = tokio::time::interval(POLL_INTERVAL);

    loop {
        let line = tokio::select! {
            line = input.next() => line.transpose()?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            _ = ticker.tick() => {
                let before = coordinator.state().playback;
                if coordinator.poll_playback() != before {
                    prompt(coordinator.state())?;
                }
                continue;
            }
        };

        let Some(line) = line else {
            println!();
            break;
        };

        match parse_command(&line) {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Voices => print_voices(coordinator.state().voice),
            Command::Voice(name) => match name.parse::<Voice>() {
                Ok(voice) => coordinator.set_voice(voice),
                Err(e) => println!("{}", e),
            },
            Command::Pause => report(coordinator.pause()),
            Command::Resume => report(coordinator.resume()),
            Command::Stop => coordinator.stop(),
            Command::Replay => match coordinator.replay() {
                Ok(false) => println!("Nothing to replay yet"),
                Ok(true) => {}
                Err(_) => {} // shown by the observer
            },
            Command::Status => print_status(coordinator.state()),
            Command::Speak(text) => {
                if !text.is_empty() {
                    coordinator.set_text(text);
                }
                speak(coordinator, &mut input).await?;
            }
            Command::Unknown(input) => println!("Unknown command: {} (try :help)", input),
        }

        prompt(coordinator.state())?;
    }

    coordinator.stop();
    Ok(())
}
