use std::time::Duration;

use tokio::time::Instant;
use tracing::{trace, warn};

/// How long [`ProcessGroup::reap`] waits for killed members to disappear
const REAP_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The process group a tool was started in
///
/// Tools such as fedpkg start git, rpmbuild and shell children of their
/// own; killing only the direct child leaves those running and writing into
/// the working tree. Every member of the group is sent SIGKILL when the tool
/// finishes, times out or its future is dropped.
#[derive(Debug)]
pub(crate) struct ProcessGroup {
    pgid: Option<i32>,
}

impl ProcessGroup {
    /// Group led by `leader`, which must have been spawned with
    /// `process_group(0)`
    pub(crate) fn new(leader: Option<u32>) -> Self {
        Self {
            pgid: leader.and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    /// SIGKILL every member still running
    pub(crate) fn kill(&self) {
        if let Some(pgid) = self.pgid {
            if signal_group(pgid, SIGKILL) {
                trace!("Killed process group {}", pgid);
            }
        }
    }

    /// Kill the group and wait until none of its members exist any more
    ///
    /// The leader must already have been waited for.
    pub(crate) async fn reap(mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        signal_group(pgid, SIGKILL);

        let deadline = Instant::now() + REAP_TIMEOUT;
        while signal_group(pgid, 0) {
            if Instant::now() >= deadline {
                warn!("Process group {} still has members after SIGKILL", pgid);
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        // Dropped mid-run (cancellation): no waiting possible here
        if let Some(pgid) = self.pgid.take() {
            signal_group(pgid, SIGKILL);
        }
    }
}

#[cfg(unix)]
const SIGKILL: i32 = libc::SIGKILL;

#[cfg(not(unix))]
const SIGKILL: i32 = 9;

/// `kill(-pgid, signal)`; signal 0 only checks that a member exists
#[cfg(unix)]
fn signal_group(pgid: i32, signal: i32) -> bool {
    // SAFETY: kill(2) takes plain integers and touches no memory of ours
    unsafe { libc::kill(-pgid, signal) == 0 }
}

#[cfg(not(unix))]
fn signal_group(_pgid: i32, _signal: i32) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reap_kills_every_member() {
        let mut command = tokio::process::Command::new("sh");
        command
            .args(["-c", "sleep 30 & sleep 30 & wait"])
            .process_group(0);
        let mut child = command.spawn().unwrap();
        let group = ProcessGroup::new(child.id());
        let pgid = child.id().unwrap() as i32;
        tokio::time::sleep(Duration::from_millis(100)).await;

        group.kill();
        child.wait().await.unwrap();
        group.reap().await;

        assert!(!signal_group(pgid, 0));
    }

    #[test]
    fn test_group_without_leader_is_inert() {
        let group = ProcessGroup::new(None);
        group.kill();
        drop(group);
    }
}
