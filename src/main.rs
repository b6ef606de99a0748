// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;

use nvidia_eject::config::Config;
use nvidia_eject::discovery::Scanner;
use nvidia_eject::hotplug::HotplugMonitor;
use nvidia_eject::logging::setup_logs;
use nvidia_eject::runner::HelperInvocation;
use nvidia_eject::tray::{Command, ConsoleTray, InstanceLock, TrayContext, spawn_input};

#[macro_use]
extern crate tracing;

fn main() -> anyhow::Result<()> {
    setup_logs();

    let config = match Config::load() {
        Ok(config) => config,
        Err((errs, config)) => {
            error!("errors loading config: {:?}", errs);
            config
        }
    };

    let lock = InstanceLock::acquire(&InstanceLock::default_path())
        .context("Failed to acquire tray instance lock")?;
    info!("Holding tray lock {}", lock.path().display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run(config));
    // The stdin reader sits in a blocking read that would otherwise hold up exit
    runtime.shutdown_background();
    Ok(())
}

async fn run(config: Config) {
    let monitor = match HotplugMonitor::new() {
        Ok(monitor) => Some(monitor),
        Err(e) => {
            error!("Failed to initialize PCI hotplug monitoring: {}", e);
            None
        }
    };

    let invocation = HelperInvocation::from_config(&config);
    info!("Using eject helper {}", invocation.helper.display());

    let ui = ConsoleTray::stdout(config.notifications);
    let menu = ui.menu_handle();
    let mut context = TrayContext::new(&config, invocation, Scanner::default(), monitor, ui);

    spawn_input(tokio::io::stdin(), menu, context.commands());

    let quit = context.commands();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = quit.send(Command::Quit);
        }
    });

    context.run().await;
    context.shutdown().await;
}
