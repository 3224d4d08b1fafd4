//! Pipeline statistics.

use std::time::Duration;

use supervisor::StatsSnapshot;

/// Statistics from a pipeline run, summed over all generations
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Number of supervisor generations that reported back
    pub generations: u64,

    /// Summed supervisor counters
    pub totals: StatsSnapshot,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Add one generation's counters
    pub fn absorb(&mut self, snapshot: &StatsSnapshot) {
        self.generations += 1;
        let totals = &mut self.totals;
        totals.acquire_attempts += snapshot.acquire_attempts;
        totals.acquire_failures += snapshot.acquire_failures;
        totals.sessions += snapshot.sessions;
        totals.frames_read += snapshot.frames_read;
        totals.decode_failures += snapshot.decode_failures;
        totals.records_written += snapshot.records_written;
        totals.write_failures += snapshot.write_failures;
        totals.unknown_messages += snapshot.unknown_messages;
    }

    /// Frames read per second
    pub fn frames_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.totals.frames_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let t = &self.totals;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Generations: {}", self.generations);
        println!("   ├─ Frames read: {}", t.frames_read);
        println!("   └─ Frames/s: {:.2}", self.frames_per_sec());

        println!("\n🔌 Connection");
        println!("   ├─ Acquire attempts: {}", t.acquire_attempts);
        println!("   ├─ Acquire failures: {}", t.acquire_failures);
        println!("   └─ Sessions: {}", t.sessions);

        println!("\n📤 Dispatch");
        println!("   ├─ Records written: {}", t.records_written);
        println!("   ├─ Write failures: {}", t.write_failures);
        println!("   ├─ Decode failures: {}", t.decode_failures);
        println!("   └─ Unknown messages: {}", t.unknown_messages);

        println!();
    }
}
