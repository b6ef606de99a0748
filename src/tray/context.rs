// SPDX-License-Identifier: GPL-3.0-only
use std::io;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::{Command, MenuModel, TrayUi};
use crate::config::Config;
use crate::discovery::Scanner;
use crate::hotplug::{Batch, HotplugMonitor};
use crate::pool::{EjectOutcome, EjectPool};
use crate::runner::HelperInvocation;

/// Everything the tray loop owns, built once at startup.
///
/// Runs on a single-threaded runtime: the udev socket, user commands, eject
/// completions and the periodic rescan are all multiplexed in [`run`].
///
/// [`run`]: TrayContext::run
pub struct TrayContext<U: TrayUi> {
    scanner: Scanner,
    monitor: Option<HotplugMonitor>,
    pool: EjectPool,
    commands_tx: mpsc::UnboundedSender<Command>,
    commands: mpsc::UnboundedReceiver<Command>,
    completions: mpsc::UnboundedReceiver<EjectOutcome>,
    refresh_interval: Option<Duration>,
    menu: MenuModel,
    ui: U,
}

impl<U: TrayUi> TrayContext<U> {
    pub fn new(
        config: &Config,
        invocation: HelperInvocation,
        scanner: Scanner,
        monitor: Option<HotplugMonitor>,
        ui: U,
    ) -> Self {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();

        Self {
            scanner,
            monitor,
            pool: EjectPool::new(invocation, config.workers, completions_tx),
            commands_tx,
            commands,
            completions,
            refresh_interval: config.refresh_interval,
            menu: MenuModel::default(),
            ui,
        }
    }

    /// Sender for anything that produces user commands (menu input, signals)
    pub fn commands(&self) -> mpsc::UnboundedSender<Command> {
        self.commands_tx.clone()
    }

    pub fn menu(&self) -> &MenuModel {
        &self.menu
    }

    /// Rescan sysfs and hand the new menu to the UI
    pub fn refresh(&mut self) {
        let devices = self.scanner.list();
        info!("Refreshing menu with {} NVIDIA GPU(s)", devices.len());
        self.menu = MenuModel::build(&devices);
        self.ui.render(&self.menu);
        self.ui.set_visible(self.menu.is_active());
    }

    fn dispatch(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Eject(address) => {
                info!("Eject requested for {}", address);
                if let Err(e) = self.pool.submit(address) {
                    self.ui.notify_failure(&e.to_string());
                }
                ControlFlow::Continue(())
            }
            Command::Quit => {
                info!("Quit requested");
                ControlFlow::Break(())
            }
        }
    }

    fn report(&mut self, outcome: EjectOutcome) {
        match outcome.result {
            Ok(confirmation) => self.ui.notify_success(&confirmation),
            Err(e) => {
                error!("Eject of {} failed: {}", outcome.address, e);
                self.ui.notify_failure(&e.to_string());
            }
        }
    }

    fn on_outcome(&mut self, outcome: EjectOutcome) {
        self.report(outcome);
        // Success or not, the kernel may have changed topology
        self.refresh();
    }

    fn on_batch(&mut self, batch: io::Result<Batch>) {
        match batch {
            Ok(batch) if batch.needs_refresh() => {
                info!("PCI topology changed, rescanning");
                self.refresh();
            }
            Ok(_) => {}
            Err(e) => {
                error!("PCI hotplug monitoring stopped: {}", e);
                self.monitor = None;
            }
        }
    }

    /// Run until a `Quit` command arrives
    pub async fn run(&mut self) {
        self.refresh();

        let mut ticker = self.refresh_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        loop {
            tokio::select! {
                batch = next_batch(self.monitor.as_ref()) => self.on_batch(batch),
                Some(command) = self.commands.recv() => {
                    if self.dispatch(command).is_break() {
                        break;
                    }
                }
                Some(outcome) = self.completions.recv() => self.on_outcome(outcome),
                _ = tick(ticker.as_mut()) => {
                    debug!("Periodic rescan");
                    self.refresh();
                }
            }
        }
    }

    /// Tear down the context.
    ///
    /// Ejects cannot be cancelled, so outstanding ones are awaited and
    /// reported before returning.
    pub async fn shutdown(mut self) {
        self.monitor = None;
        self.finish_outstanding().await;
        info!("Tray shut down");
    }

    async fn finish_outstanding(&mut self) {
        let mut outstanding = self.pool.outstanding();
        if outstanding > 0 {
            info!("Waiting for {} eject(s) to finish", outstanding);
        }
        while outstanding > 0 {
            let Some(outcome) = self.completions.recv().await else {
                break;
            };
            self.report(outcome);
            outstanding = self.pool.outstanding();
        }

        // A job leaves the in-flight set before its outcome is queued, so
        // outcomes that finished while `Quit` was handled are still pending
        while let Ok(outcome) = self.completions.try_recv() {
            self.report(outcome);
        }
    }
}

async fn next_batch(monitor: Option<&HotplugMonitor>) -> io::Result<Batch> {
    match monitor {
        Some(monitor) => monitor.next_batch().await,
        None => std::future::pending().await,
    }
}

async fn tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
