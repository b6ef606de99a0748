// SPDX-License-Identifier: GPL-3.0-only
//! Terminal front end for the tray
//!
//! Prints the menu on every refresh and reads selections line by line.
//! Failures additionally go to the desktop notification service when that
//! feature is compiled in and enabled.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{Command, EntryKind, MenuModel, TrayUi};

pub const FAILURE_SUMMARY: &str = "NVIDIA eject failed";

/// Menu shared between the renderer and the input reader
pub type SharedMenu = Arc<Mutex<MenuModel>>;

pub struct ConsoleTray<W: Write> {
    out: W,
    menu: SharedMenu,
    visible: Option<bool>,
    #[cfg(feature = "desktop-notifications")]
    notifications: bool,
}

impl ConsoleTray<io::Stdout> {
    pub fn stdout(notifications: bool) -> Self {
        Self::new(io::stdout(), notifications)
    }
}

impl<W: Write> ConsoleTray<W> {
    #[cfg_attr(not(feature = "desktop-notifications"), allow(unused_variables))]
    pub fn new(out: W, notifications: bool) -> Self {
        Self {
            out,
            menu: Arc::new(Mutex::new(MenuModel::default())),
            visible: None,
            #[cfg(feature = "desktop-notifications")]
            notifications,
        }
    }

    /// Handle for [`spawn_input`] to resolve selections against
    pub fn menu_handle(&self) -> SharedMenu {
        self.menu.clone()
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    fn write_menu(&mut self, menu: &MenuModel) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "NVIDIA GPUs:")?;
        let mut number = 0;
        for entry in menu.entries() {
            match &entry.kind {
                EntryKind::Action(_) => {
                    number += 1;
                    writeln!(self.out, "  {number}) {}", entry.label)?;
                }
                EntryKind::Placeholder => writeln!(self.out, "  -) {}", entry.label)?,
                EntryKind::Separator => writeln!(self.out, "  ---")?,
            }
        }
        self.out.flush()
    }
}

impl<W: Write> TrayUi for ConsoleTray<W> {
    fn render(&mut self, menu: &MenuModel) {
        *self.menu.lock().unwrap_or_else(|e| e.into_inner()) = menu.clone();
        if let Err(e) = self.write_menu(menu) {
            warn!("Failed to print menu: {}", e);
        }
    }

    fn notify_failure(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "{FAILURE_SUMMARY}: {message}") {
            warn!("Failed to print failure: {}", e);
        }

        #[cfg(feature = "desktop-notifications")]
        {
            if self.notifications {
                crate::notify::spawn_notification(FAILURE_SUMMARY, message);
            }
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible == Some(visible) {
            return;
        }
        self.visible = Some(visible);
        let status = if visible {
            "NVIDIA GPU present, eject available"
        } else {
            "No NVIDIA GPU present, nothing to eject"
        };
        if let Err(e) = writeln!(self.out, "[{status}]") {
            warn!("Failed to print status: {}", e);
        }
    }

    fn notify_success(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "{message}") {
            warn!("Failed to print confirmation: {}", e);
        }
    }
}

/// Read menu selections from `reader` until EOF and forward them as commands
pub fn spawn_input<R>(
    reader: R,
    menu: SharedMenu,
    commands: mpsc::UnboundedSender<Command>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("Console input closed");
                    return;
                }
                Err(e) => {
                    warn!("Failed to read console input: {}", e);
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = menu
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .resolve(&line);
            match command {
                Some(command) => {
                    if commands.send(command).is_err() {
                        return;
                    }
                }
                None => {
                    eprintln!("Unknown selection {line:?}: enter a number, 'eject <address>' or 'quit'");
                }
            }
        }
    })
}
