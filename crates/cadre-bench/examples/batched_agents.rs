//! End-to-end batched decision loop example.
//!
//! Demonstrates: build profile → ModelRunner → submit every agent →
//! flush once → read actions → terminate some agents → repeat.

use cadre_bench::{agent_requests, discrete_profile, REFERENCE_OBS_LEN};
use cadre_core::AgentId;

const AGENTS: usize = 8;

fn main() {
    println!("=== Cadre Batched Agents Example ===\n");

    let mut runner = discrete_profile(42).into_runner().unwrap();

    for step in 0..20u64 {
        for req in agent_requests(AGENTS, REFERENCE_OBS_LEN, step) {
            // Every fifth step, even-numbered agents end their episode.
            let done = step % 5 == 4 && req.agent.0 % 2 == 0;
            runner.submit(req.with_done(done)).unwrap();
        }
        let metrics = runner.decide_batch().unwrap().unwrap();

        if step % 5 == 0 || step == 19 {
            let actions: Vec<String> = (0..AGENTS as u64)
                .map(|id| format!("{:?}", runner.get_action(AgentId(id)).unwrap().discrete))
                .collect();
            println!(
                "  step {:>2}: batch={} time={:>5}μs actions={}",
                step + 1,
                metrics.batch_size,
                metrics.total_us,
                actions.join(" "),
            );
        }
    }

    let totals = runner.metrics();
    println!(
        "\n{} flushes, {} agent decisions, {} executor calls",
        totals.flushes, totals.agents_decided, totals.executor_calls
    );
}
