/// Default number of cached node outputs
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
/// Default I/O pool size: many concurrent, mostly-waiting units
pub const DEFAULT_IO_POOL_SIZE: usize = 16;
/// CPU pool size when the host parallelism cannot be determined
pub const FALLBACK_CPU_POOL_SIZE: usize = 4;
/// Default maximum nodes dispatched per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;
