// SPDX-License-Identifier: GPL-3.0-only
//! Unprivileged tray front end
//!
//! The menu is built from the discovery result and rendered by a [`TrayUi`]
//! implementation. User actions come back as [`Command`] messages on a
//! channel and are handled in one place by [`TrayContext`], so building the
//! menu never needs to know how an eject is carried out.

mod console;
mod context;
mod lock;
mod menu;

pub use console::{ConsoleTray, SharedMenu, spawn_input};
pub use context::TrayContext;
pub use lock::InstanceLock;
pub use menu::{EntryKind, MenuEntry, MenuModel};

use crate::pci::PciAddress;

/// Actions the user can take from the menu
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Eject(PciAddress),
    Quit,
}

/// Presentation layer the tray loop drives
pub trait TrayUi {
    /// Show the current menu; called after every rescan
    fn render(&mut self, menu: &MenuModel);

    /// Surface a failure; `message` is the diagnostic, unedited
    fn notify_failure(&mut self, message: &str);

    fn notify_success(&mut self, _message: &str) {}

    /// Show or hide the indicator; it is visible only while a GPU is listed
    fn set_visible(&mut self, _visible: bool) {}
}
