use std::io;

use tokio::io::unix::AsyncFd;

/// Kernel actions that can change which GPUs are present or ejectable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyAction {
    Add,
    Remove,
    Change,
    Bind,
    Unbind,
}

impl TopologyAction {
    pub fn from_event_type(event_type: udev::EventType) -> Option<Self> {
        match event_type {
            udev::EventType::Add => Some(Self::Add),
            udev::EventType::Remove => Some(Self::Remove),
            udev::EventType::Change => Some(Self::Change),
            udev::EventType::Bind => Some(Self::Bind),
            udev::EventType::Unbind => Some(Self::Unbind),
            _ => None,
        }
    }
}

/// Events drained from the socket in one wake-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Batch {
    pub received: usize,
    pub qualifying: usize,
}

impl Batch {
    pub fn tally<I>(actions: I) -> Self
    where
        I: IntoIterator<Item = Option<TopologyAction>>,
    {
        actions.into_iter().fold(Self::default(), |mut batch, action| {
            batch.received += 1;
            if action.is_some() {
                batch.qualifying += 1;
            }
            batch
        })
    }

    /// Whether this batch warrants a rescan
    pub fn needs_refresh(&self) -> bool {
        self.qualifying > 0
    }
}

/// Monitors udev for PCI topology events
///
/// The socket is registered with the tokio reactor instead of being polled
/// from a dedicated thread, so the monitor lives on the tray's single-threaded
/// loop. `MonitorSocket` is not Send; neither is this type.
pub struct HotplugMonitor {
    socket: AsyncFd<udev::MonitorSocket>,
}

impl HotplugMonitor {
    /// Subscribe to kernel events of the `pci` subsystem
    pub fn new() -> io::Result<Self> {
        let socket = udev::MonitorBuilder::new()?
            .match_subsystem("pci")?
            .listen()?;

        info!("PCI hotplug monitoring started");
        Ok(Self {
            socket: AsyncFd::new(socket)?,
        })
    }

    /// Wait until the socket is readable, then drain every queued event.
    pub async fn next_batch(&self) -> io::Result<Batch> {
        let mut guard = self.socket.readable().await?;

        let batch = Batch::tally(self.socket.get_ref().iter().map(|event| {
            let action = TopologyAction::from_event_type(event.event_type());
            debug!(
                "udev event: type={:?}, syspath={:?}",
                event.event_type(),
                event.syspath()
            );
            action
        }));

        // The iterator stops once the non-blocking socket is empty
        guard.clear_ready();

        if batch.received == 0 {
            debug!("Poll indicated ready but no event available");
        } else {
            debug!(
                "Drained {} udev event(s), {} qualifying",
                batch.received, batch.qualifying
            );
        }
        Ok(batch)
    }
}
