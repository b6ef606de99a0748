// SPDX-License-Identifier: GPL-3.0-only
use super::Command;
use crate::pci::PciAddress;

pub const EMPTY_LABEL: &str = "No NVIDIA GPU detected";
pub const QUIT_LABEL: &str = "Quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Action(Command),
    /// Shown but not selectable
    Placeholder,
    Separator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub kind: EntryKind,
}

impl MenuEntry {
    pub fn command(&self) -> Option<&Command> {
        match &self.kind {
            EntryKind::Action(cmd) => Some(cmd),
            _ => None,
        }
    }
}

/// Menu contents for one discovery result
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuModel {
    entries: Vec<MenuEntry>,
    devices: Vec<PciAddress>,
}

impl MenuModel {
    pub fn build(devices: &[PciAddress]) -> Self {
        let mut entries: Vec<MenuEntry> = devices
            .iter()
            .map(|addr| MenuEntry {
                label: format!("Eject NVIDIA GPU ({addr})"),
                kind: EntryKind::Action(Command::Eject(addr.clone())),
            })
            .collect();

        if entries.is_empty() {
            entries.push(MenuEntry {
                label: EMPTY_LABEL.to_string(),
                kind: EntryKind::Placeholder,
            });
        }

        entries.push(MenuEntry {
            label: String::new(),
            kind: EntryKind::Separator,
        });
        entries.push(MenuEntry {
            label: QUIT_LABEL.to_string(),
            kind: EntryKind::Action(Command::Quit),
        });

        Self {
            entries,
            devices: devices.to_vec(),
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn devices(&self) -> &[PciAddress] {
        &self.devices
    }

    /// The tray indicator is only worth showing while a GPU can be ejected
    pub fn is_active(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Selectable entries, numbered from 1 in display order
    pub fn actions(&self) -> impl Iterator<Item = (usize, &MenuEntry)> {
        self.entries
            .iter()
            .filter(|e| e.command().is_some())
            .enumerate()
            .map(|(i, e)| (i + 1, e))
    }

    /// Map a line of user input to a command.
    ///
    /// Accepts an entry number, `quit`, or `eject <address>` for a listed
    /// device.
    pub fn resolve(&self, input: &str) -> Option<Command> {
        let input = input.trim();

        if let Ok(n) = input.parse::<usize>() {
            return self
                .actions()
                .find(|(i, _)| *i == n)
                .and_then(|(_, e)| e.command().cloned());
        }

        let mut words = input.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("quit" | "q"), None, None) => Some(Command::Quit),
            (Some("eject"), Some(raw), None) => {
                let addr = PciAddress::parse(raw).ok()?;
                self.devices.contains(&addr).then_some(Command::Eject(addr))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> PciAddress {
        PciAddress::parse(s).unwrap()
    }

    #[test]
    fn test_empty_menu_has_disabled_placeholder() {
        let menu = MenuModel::build(&[]);
        assert!(!menu.is_active());
        assert_eq!(menu.entries()[0].label, EMPTY_LABEL);
        assert_eq!(menu.entries()[0].kind, EntryKind::Placeholder);
        assert_eq!(menu.entries()[0].command(), None);

        let actions: Vec<_> = menu.actions().map(|(i, e)| (i, e.label.as_str())).collect();
        assert_eq!(actions, [(1, QUIT_LABEL)]);
    }

    #[test]
    fn test_one_entry_per_device() {
        let menu = MenuModel::build(&[addr("0000:01:00.0"), addr("0000:02:00.0")]);
        assert!(menu.is_active());

        let labels: Vec<_> = menu.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Eject NVIDIA GPU (0000:01:00.0)",
                "Eject NVIDIA GPU (0000:02:00.0)",
                "",
                QUIT_LABEL
            ]
        );
    }

    #[test]
    fn test_resolve_by_number() {
        let menu = MenuModel::build(&[addr("0000:01:00.0")]);
        assert_eq!(menu.resolve("1"), Some(Command::Eject(addr("0000:01:00.0"))));
        assert_eq!(menu.resolve(" 2 "), Some(Command::Quit));
        assert_eq!(menu.resolve("3"), None);
        assert_eq!(menu.resolve("0"), None);
    }

    #[test]
    fn test_resolve_by_text() {
        let menu = MenuModel::build(&[addr("0000:01:00.0")]);
        assert_eq!(
            menu.resolve("eject 0000:01:00.0"),
            Some(Command::Eject(addr("0000:01:00.0")))
        );
        assert_eq!(menu.resolve("eject 0000:01:00.0 now"), None);
        assert_eq!(menu.resolve("quit"), Some(Command::Quit));
        assert_eq!(menu.resolve("eject 0000:09:00.0"), None);
        assert_eq!(menu.resolve("eject bogus"), None);
        assert_eq!(menu.resolve(""), None);
    }
}
