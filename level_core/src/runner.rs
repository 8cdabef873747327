//! Cooperative loop around `MonitorCore::poll`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use level_traits::clock::Clock;
use level_traits::{ByteStore, SensorSource, SerialTransport};

use crate::config::Timing;
use crate::error::Result;
use crate::monitor::MonitorCore;
use crate::pipeline::LevelEstimate;
use crate::status::CycleStatus;

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown flag was raised.
    Shutdown,
    /// `max_cycles` cycles completed.
    CycleLimit,
}

#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub timing: Timing,
    /// Stop after this many completed cycles; run until shutdown when `None`.
    pub max_cycles: Option<u64>,
    /// Checked before every poll.
    pub shutdown: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles completed by this run.
    pub cycles: u64,
    pub last: Option<LevelEstimate>,
    pub reason: StopReason,
}

#[inline]
fn shutdown_requested(flag: Option<&Arc<AtomicBool>>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::Relaxed))
}

/// Drive `monitor` until shutdown, the cycle cap, or an error.
///
/// Sleeps `poll_interval_ms` while the scan is busy and `cycle_delay_ms` after
/// every completed cycle, which paces the serial data log. A fatal error is
/// returned as-is; the monitor stays halted.
pub fn run<S, B, T>(
    monitor: &mut MonitorCore<S, B, T>,
    clock: &dyn Clock,
    params: &RunParams,
) -> Result<RunSummary>
where
    S: SensorSource,
    B: ByteStore,
    T: SerialTransport,
{
    let poll_interval = Duration::from_millis(params.timing.poll_interval_ms);
    let cycle_delay = Duration::from_millis(params.timing.cycle_delay_ms);
    let shutdown = params.shutdown.as_ref();

    if !monitor.is_started() {
        monitor.start()?;
    }
    tracing::info!(
        max_cycles = ?params.max_cycles,
        cycle_delay_ms = params.timing.cycle_delay_ms,
        "run start"
    );

    let mut cycles = 0u64;
    let mut last = None;
    let reason = loop {
        if shutdown_requested(shutdown) {
            break StopReason::Shutdown;
        }
        if params.max_cycles.is_some_and(|max| cycles >= max) {
            break StopReason::CycleLimit;
        }
        match monitor.poll() {
            Ok(CycleStatus::Busy) => clock.sleep(poll_interval),
            Ok(CycleStatus::Completed(est)) => {
                cycles += 1;
                last = Some(est);
                clock.sleep(cycle_delay);
            }
            Err(e) => {
                tracing::error!(error = %e, cycles, "run aborted");
                return Err(e);
            }
        }
    };

    tracing::info!(cycles, ?reason, "run stop");
    Ok(RunSummary {
        cycles,
        last,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_monitor;
    use crate::config::{PipelineCfg, SampleCfg};
    use crate::mocks::{FixedSensors, MemoryByteStore, MockSerial};
    use level_traits::clock::ManualClock;

    fn monitor() -> MonitorCore<FixedSensors, MemoryByteStore, MockSerial> {
        build_monitor(
            FixedSensors::new(vec![0; 12]).with_busy_polls(2),
            MemoryByteStore::new(64),
            MockSerial::new(),
            PipelineCfg::default(),
            SampleCfg::default(),
        )
        .unwrap()
    }

    #[test]
    fn stops_at_cycle_limit_and_paces_with_clock() {
        let mut m = monitor();
        let clock = ManualClock::new();
        let params = RunParams {
            max_cycles: Some(3),
            ..RunParams::default()
        };
        let summary = run(&mut m, &clock, &params).unwrap();
        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.reason, StopReason::CycleLimit);
        // 3 cycles x 100 ms plus 2 busy polls of 1 ms before each
        assert_eq!(clock.elapsed(), Duration::from_millis(306));
    }

    #[test]
    fn raised_shutdown_flag_stops_before_first_cycle() {
        let mut m = monitor();
        let flag = Arc::new(AtomicBool::new(true));
        let params = RunParams {
            shutdown: Some(flag),
            ..RunParams::default()
        };
        let summary = run(&mut m, &ManualClock::new(), &params).unwrap();
        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.reason, StopReason::Shutdown);
        assert!(m.is_started());
    }

    #[test]
    fn store_failure_aborts_run() {
        let mut store = MemoryByteStore::new(64);
        store.fail_reads(true);
        let mut m = build_monitor(
            FixedSensors::new(vec![0; 12]),
            store,
            MockSerial::new(),
            PipelineCfg::default(),
            SampleCfg::default(),
        )
        .unwrap();
        let params = RunParams {
            max_cycles: Some(5),
            ..RunParams::default()
        };
        assert!(run(&mut m, &ManualClock::new(), &params).is_err());
        assert!(m.is_halted());
    }
}
