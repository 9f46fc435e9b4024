mod properties;

/// Installs a test logger once; later calls are no-ops.
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Upper bound on the rounds of a greedy run over `n` symbols.
///
/// Every pair compression replaces at least a quarter of the adjacencies.
pub(crate) fn greedy_round_bound(n: usize) -> usize {
    let log = usize::BITS - n.max(1).leading_zeros();
    3 * log as usize + 2
}
