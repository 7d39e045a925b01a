use std::sync::Arc;
use std::time::Duration;

use qg_app::cli;
use qg_app::config_loader;
use qg_app::tracing_setup;
use qg_limiter::FailureKind;
use qg_limiter::QuotaGate;
use qg_limiter::stagger;
use tracing::Level;
use tracing::info;
use tracing::warn;

/// Synthetic admission drill: staggered workers reserve blocks, simulate
/// their bursts, report outcomes, and release what they did not use. Prints
/// the final pool snapshot so operators can sanity-check a gate config
/// before putting real traffic behind it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep guard alive for entire application lifetime
    let _guard = tracing_setup::init("qg_drill", "./logs", Level::INFO);

    let path = cli::get_config_path("config/gate.toml");
    let workers = cli::get_count_arg(2, 4);
    let bursts_per_worker = cli::get_count_arg(3, 3);

    let gate_config = config_loader::load_gate_config_or_demo(&path);
    let block = gate_config.default_block_sizes.get("drill").copied().unwrap_or(5);
    let delays = stagger::schedule(workers, Duration::from_millis(gate_config.stagger_interval_ms));

    let gate = Arc::new(QuotaGate::new(&gate_config)?);
    info!(workers, bursts_per_worker, block, "starting admission drill");

    let mut handles = Vec::new();
    for (slot, delay) in delays.into_iter().enumerate() {
        let gate = Arc::clone(&gate);
        handles.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let caller = format!("drill-{slot}");

            for burst in 0..bursts_per_worker {
                let reservation = match gate.acquire(&caller, block, None).await {
                    Ok(reservation) => reservation,
                    Err(err) => {
                        warn!(slot, burst, "reservation failed: {err}");
                        break;
                    }
                };

                // Simulate the burst: some slots come up short of the
                // estimate, and the occasional call fails transiently
                let used = block.saturating_sub(((slot + burst) % 3) as u32);
                for call in 0..used {
                    if (call as usize + slot) % 7 == 6 {
                        let _ = gate.record_failure(&reservation.credential_id, FailureKind::Other);
                    } else {
                        let _ = gate.record_success(&reservation.credential_id);
                    }
                }

                if let Err(err) = gate.release(&reservation, used) {
                    warn!(slot, burst, "release failed: {err}");
                }
                info!(slot, burst, credential = %reservation.credential_id, tier = %reservation.tier, used, "burst complete");
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    println!("{}", serde_json::to_string_pretty(&gate.status())?);
    Ok(())
}
