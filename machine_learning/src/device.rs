use std::{fmt, num::NonZeroUsize, thread};

use log::{info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;

use crate::{MlErr, Result};

/// Where the compute kernels run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Device {
    /// A single worker thread.
    #[default]
    Cpu,
    /// A pool of worker threads, one per available core unless `threads` is given.
    Parallel { threads: Option<NonZeroUsize> },
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Parallel { threads: Some(n) } => write!(f, "parallel({n})"),
            Device::Parallel { threads: None } => write!(f, "parallel"),
        }
    }
}

/// The thread pool backing a `Device`.
///
/// Building one never fails: if the requested device can't be provided, a warning is logged and
/// the context falls back to `Device::Cpu`.
pub struct ComputeContext {
    device: Device,
    pool: Option<ThreadPool>,
}

impl ComputeContext {
    pub fn new(requested: Device) -> Self {
        Self::or_fallback(Self::try_new(requested))
    }

    /// Keeps a successfully built context, otherwise falls back to `Device::Cpu`.
    fn or_fallback(result: Result<Self>) -> Self {
        match result {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("{e}, falling back to {}", Device::Cpu);
                Self::cpu()
            }
        }
    }

    /// Builds the context for exactly `device`.
    ///
    /// # Returns
    /// `DeviceUnavailable` if the device's thread pool can't be built.
    pub fn try_new(device: Device) -> Result<Self> {
        let threads = match device {
            Device::Cpu => 1,
            Device::Parallel { threads: Some(n) } => n.get(),
            Device::Parallel { threads: None } => {
                let cores = thread::available_parallelism()
                    .map_err(|e| MlErr::DeviceUnavailable(e.to_string()))?;

                if cores.get() < 2 {
                    return Err(MlErr::DeviceUnavailable(
                        "only one core is available".to_string(),
                    ));
                }

                cores.get()
            }
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("compute-{i}"))
            .build()
            .map_err(|e| MlErr::DeviceUnavailable(e.to_string()))?;

        info!(threads = threads; "using device {device}");

        Ok(Self {
            device,
            pool: Some(pool),
        })
    }

    fn cpu() -> Self {
        match Self::try_new(Device::Cpu) {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("{e}, running on the calling thread");
                Self {
                    device: Device::Cpu,
                    pool: None,
                }
            }
        }
    }

    /// The device actually in use, which differs from the requested one after a fallback.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Runs `op` inside this context's pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_runs_on_one_thread() {
        let ctx = ComputeContext::new(Device::Cpu);
        assert_eq!(ctx.device(), Device::Cpu);
        assert_eq!(ctx.install(rayon::current_num_threads), 1);
    }

    #[test]
    fn explicit_thread_count() {
        let threads = NonZeroUsize::new(3);
        let ctx = ComputeContext::new(Device::Parallel { threads });
        assert_eq!(ctx.device(), Device::Parallel { threads });
        assert_eq!(ctx.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn unavailable_device_falls_back_to_cpu() {
        let err = MlErr::DeviceUnavailable("no worker threads".into());
        let ctx = ComputeContext::or_fallback(Err(err));
        assert_eq!(ctx.device(), Device::Cpu);
        assert_eq!(ctx.install(rayon::current_num_threads), 1);
    }

    #[test]
    fn available_device_is_kept() {
        let threads = NonZeroUsize::new(2);
        let requested = Device::Parallel { threads };
        let ctx = ComputeContext::or_fallback(ComputeContext::try_new(requested));
        assert_eq!(ctx.device(), requested);
        assert_eq!(ctx.install(rayon::current_num_threads), 2);
    }
}
