//! The event loop tying keyboard input, the controller and the view together.
//!
//! The controller runs in its own task and receives commands over a channel,
//! so typing stays responsive while a start is in flight. The terminal loop
//! re-renders whenever the controller publishes a new state.

use crate::terminal::{UserCommand, check_enabled, parse_command, render};
use mozart_core::{CallController, SessionState, ViewModel};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

/// Requests forwarded to the controller task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    Start,
    Stop,
}

impl ControllerCommand {
    fn from_user(command: UserCommand) -> Option<Self> {
        match command {
            UserCommand::Start => Some(Self::Start),
            UserCommand::Stop => Some(Self::Stop),
            UserCommand::Quit => None,
        }
    }
}

/// Moves `controller` into a task that executes commands one at a time.
///
/// When every sender is dropped the task stops any open session and exits.
pub fn spawn_controller(
    mut controller: CallController,
) -> (mpsc::Sender<ControllerCommand>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(8);
    let handle = tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            debug!(?command, "Controller command");
            match command {
                ControllerCommand::Start => controller.request_start().await,
                ControllerCommand::Stop => controller.request_stop().await,
            }
        }
        controller.request_stop().await;
        info!("Controller task finished");
    });
    (tx, handle)
}

/// Runs the terminal front-end until `quit`, end of input, or Ctrl+C.
pub async fn run_terminal<R>(
    input: R,
    commands: mpsc::Sender<ControllerCommand>,
    mut states: watch::Receiver<SessionState>,
    agent_name: &str,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let initial = states.borrow_and_update().clone();
    print!("{}", render(&ViewModel::from_state(&initial, agent_name), agent_name));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                print!("{}", render(&ViewModel::from_state(&state, agent_name), agent_name));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };
                let Some(command) = parse_command(&line) else {
                    if !line.trim().is_empty() {
                        println!("commands: start, stop, quit");
                    }
                    continue;
                };
                let view = ViewModel::from_state(&states.borrow(), agent_name);
                if let Err(reason) = check_enabled(&view, command) {
                    println!("{reason}");
                    continue;
                }
                let Some(command) = ControllerCommand::from_user(command) else {
                    break;
                };
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Received Ctrl+C, ending call");
                break;
            }
        }
    }

    Ok(())
}
