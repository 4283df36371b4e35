use std::sync::atomic::{AtomicU64, Ordering};

// パケットIDの採番器
// 呼び出し側が保持して渡す (プロセス全体の状態は持たない)
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: AtomicU64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    // 次に払い出されるID
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
