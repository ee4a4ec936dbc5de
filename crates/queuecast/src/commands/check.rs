//! `check`: one snapshot, per-queue statistics.

use std::sync::Arc;

use tabled::Tabled;

use queuecast_core::{HttpSnapshotSource, QueueStats, SnapshotSource, SystemClock, WaitEstimator};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, human_duration};

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Queue")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active")]
    active: usize,
    #[tabled(rename = "Waiting")]
    waiting: usize,
    #[tabled(rename = "Avg service")]
    average: String,
    #[tabled(rename = "Samples")]
    samples: String,
    #[tabled(rename = "Est. wait")]
    wait: String,
}

fn stats_row(s: &QueueStats) -> StatsRow {
    StatsRow {
        id: s.queue_id.clone(),
        name: s.queue_name.clone(),
        active: s.active_entries,
        waiting: s.waiting_entries,
        average: human_duration(s.average_service_time),
        samples: if s.sample_size == 0 {
            "fallback".into()
        } else {
            s.sample_size.to_string()
        },
        wait: human_duration(s.estimated_wait),
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let service = super::load_service_config(global)?;
    let source = HttpSnapshotSource::new(&service)?;
    let queues = source.fetch().await?;

    let estimator = WaitEstimator::new(service.estimator.clone(), Arc::new(SystemClock));
    let stats: Vec<QueueStats> = queues.iter().map(|q| estimator.compute_stats(q)).collect();

    let out = output::render_list(&global.output, &stats, stats_row, |s| {
        s.queue_id.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
