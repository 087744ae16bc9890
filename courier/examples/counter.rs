// Word counting with one agent per shard, all sharing a single worker pool.
//
// Run with: RUST_LOG=courier=debug cargo run --example counter

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use courier::{logging, AgentConfig, AgentRef, HandlerError, HandlerResult, MessageHandler, WorkerPool, WorkerPoolConfig};

enum Command {
    Count(String),
    Report(flume::Sender<Vec<(String, usize)>>),
}

#[derive(Default)]
struct Shard {
    counts: HashMap<String, usize>,
}

impl MessageHandler<Command> for Shard {
    fn handle_message(&mut self, command: Command) -> HandlerResult {
        match command {
            Command::Count(word) if word.is_empty() => Err(HandlerError::rejected("empty word")),
            Command::Count(word) => {
                *self.counts.entry(word).or_default() += 1;
                Ok(())
            }
            Command::Report(reply) => {
                let mut counts: Vec<_> = self.counts.iter().map(|(w, n)| (w.clone(), *n)).collect();
                counts.sort();
                reply.send(counts).map_err(|e| HandlerError::failed(e.to_string()))
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_development();

    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::named("counter", 4))?);
    let shards: Vec<AgentRef<Command>> = (0..3)
        .map(|i| {
            AgentRef::with_config(
                Shard::default(),
                pool.clone(),
                AgentConfig::named(format!("shard-{}", i)).with_failure_hook(|failure| {
                    eprintln!("dropped message: {}", failure);
                }),
            )
        })
        .collect();

    let text = "the quick brown fox jumps over the lazy dog  the end";
    let writers: Vec<_> = text
        .split(' ')
        .map(|word| {
            let shard = shards[word.len() % shards.len()].clone();
            let word = word.to_string();
            thread::spawn(move || shard.send(Command::Count(word)))
        })
        .collect();
    for writer in writers {
        let _ = writer.join();
    }

    for shard in &shards {
        let (tx, rx) = flume::bounded(1);
        let _ = shard << Command::Report(tx);
        let counts = rx.recv_timeout(Duration::from_secs(5))?;
        println!("{}: {:?} ({:?})", shard.name(), counts, shard.stats());
    }

    pool.shutdown()?;
    Ok(())
}
