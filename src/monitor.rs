//! Fixed-interval battery monitor
//!
//! Samples the power source on every tick and appends the sample to the log
//! when the level or direction changed since the last logged sample.

use crate::error::BatlogResult;
use crate::platform::Sampler;
use crate::sample::{MAX_PROCESSES, Sample};
use crate::segment::NOT_AVAILABLE;
use crate::store::SampleLog;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

/// What happened to one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The sample differed from the last one and was appended
    Logged(Sample),
    /// Nothing changed, the log was left alone
    Unchanged(Sample),
}

/// Periodic sampler writing to a [`SampleLog`]
#[derive(Debug, Clone)]
pub struct Monitor {
    sampler: Sampler,
    log: SampleLog,
    interval: Duration,
}

impl Monitor {
    pub fn new(sampler: Sampler, log: SampleLog, interval: Duration) -> Self {
        Monitor {
            sampler,
            log,
            interval,
        }
    }

    pub fn log(&self) -> &SampleLog {
        &self.log
    }

    /// Append `sample` if it differs from the last logged one
    pub fn record(&self, sample: Sample) -> BatlogResult<TickOutcome> {
        if self.log.should_append(&sample)? {
            self.log.append(&sample)?;
            Ok(TickOutcome::Logged(sample))
        } else {
            Ok(TickOutcome::Unchanged(sample))
        }
    }

    /// Take one sample and record it
    pub async fn tick(&self) -> BatlogResult<TickOutcome> {
        let sample = self.sampler.take_sample().await?;
        self.record(sample)
    }

    /// Sample immediately, then once per interval until Ctrl-C
    pub async fn run(&self) -> BatlogResult<()> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Sample immediately, then once per interval until `shutdown` resolves
    ///
    /// Failed ticks are logged and do not stop the loop.
    pub async fn run_until<F>(&self, shutdown: F) -> BatlogResult<()>
    where
        F: Future<Output = std::io::Result<()>>,
    {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            "Monitoring battery every {}s into {}",
            self.interval.as_secs(),
            self.log.path().display()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => match self.tick().await {
                    Ok(TickOutcome::Logged(sample)) => println!("{}", status_block(&sample)),
                    Ok(TickOutcome::Unchanged(sample)) => {
                        tracing::debug!("No change at {}% {}", sample.level, sample.direction);
                    }
                    Err(e) => tracing::warn!("Failed to sample battery: {e}"),
                },
                result = &mut shutdown => {
                    result?;
                    println!("\nShutting down battery monitor...");
                    return Ok(());
                }
            }
        }
    }
}

/// Human-readable block describing one sample
pub fn status_block(sample: &Sample) -> String {
    let mut lines = vec![
        "Battery Status:".to_string(),
        format!("    Level:     {}%", sample.level),
        format!("    State:     {}", sample.direction),
        format!("    Remaining: {}", sample.time_remaining),
        String::new(),
        "Top Processes:".to_string(),
    ];
    lines.extend((0..MAX_PROCESSES).map(|slot| {
        let name = sample
            .processes
            .get(slot)
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE);
        format!("    • {name}")
    }));
    lines.join("\n")
}
