// Integration tests for the pool sizing policy.
// Mutates the process environment: keep these in their own test binary.

use courier::{default_pool_size, WorkerPoolConfig};
use courier::agent::config::POOL_SIZE_ENV;

#[test]
fn test_environment_overrides_pool_size() {
    std::env::set_var(POOL_SIZE_ENV, "7");
    assert_eq!(default_pool_size(), 7);
    assert_eq!(WorkerPoolConfig::default().pool_size, 7);

    std::env::set_var(POOL_SIZE_ENV, "not-a-number");
    assert_eq!(default_pool_size(), num_cpus_plus_one());

    std::env::remove_var(POOL_SIZE_ENV);
    assert_eq!(default_pool_size(), num_cpus_plus_one());
}

#[test]
fn test_config_debug_format() {
    let config = WorkerPoolConfig::named("io", 2);
    let rendered = format!("{:?}", config);
    assert!(rendered.contains("pool_size: 2"));
    assert!(rendered.contains("\"io\""));
}

fn num_cpus_plus_one() -> usize {
    num_cpus::get() + 1
}
