// SPDX-License-Identifier: GPL-3.0-only
//! Privileged helper: `nvidia-eject-helper <PCI_ID>`
//!
//! Meant to be started through pkexec. Prints one confirmation line on
//! success (exit 0) or one diagnostic line on stderr (exit 1).

use std::process::ExitCode;

use nvidia_eject::eject::Ejector;
use nvidia_eject::logging::setup_helper_logs;

fn main() -> ExitCode {
    setup_helper_logs();

    match Ejector::system().run_cli(std::env::args_os().skip(1)) {
        Ok(ejected) => {
            println!("{ejected}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
