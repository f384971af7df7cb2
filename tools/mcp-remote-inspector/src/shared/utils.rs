use std::{future::Future, time::Instant};

pub async fn measure_latency<F, Fut, T>(f: F) -> (T, u64)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let start = Instant::now();
    let res = f().await;
    let elapsed = start.elapsed().as_millis() as u64;
    (res, elapsed)
}
