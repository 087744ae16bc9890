// Handler failures reach the subscriber even when it is installed after the
// pool was built. Kept in its own binary because it owns the global subscriber.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use courier::{AgentRef, HandlerError, HandlerResult, WorkerPool, WorkerPoolConfig};

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_failure_logged_from_worker_built_before_subscriber() {
    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::named("early", 1)).unwrap());

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_thread_names(true)
        .init();

    let agent = AgentRef::new(
        |word: &'static str| -> HandlerResult {
            match word {
                "bad" => Err(HandlerError::failed("refused")),
                _ => Ok(()),
            }
        },
        pool.clone(),
    );
    agent.send("bad");
    agent.send("good");

    assert!(pool.await_quiescence(Duration::from_secs(10)));
    assert_eq!(agent.stats().failed, 1);

    let output = logs.contents();
    let line = output
        .lines()
        .find(|line| line.contains("message handling failed"))
        .unwrap_or_else(|| panic!("no failure record in:\n{}", output));
    assert!(line.contains("ERROR"), "{}", line);
    assert!(line.contains("early-worker-0"), "{}", line);
    assert!(line.contains("refused"), "{}", line);

    pool.shutdown().unwrap();
}
