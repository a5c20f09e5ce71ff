// Feed synthetic telemetry into a running listener.
//
// Usage: cargo run --example feed -- [ADDR] [INTERVAL_US] [COUNT]
//   ADDR         default: 127.0.0.1:5000
//   INTERVAL_US  default: 500000
//   COUNT        default: 100 (0 = forever)

use std::env;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let addr = args.get(1).map(String::as_str).unwrap_or("127.0.0.1:5000");
    let interval_us: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(500_000);
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);

    let mut stream = TcpStream::connect(addr).await?;
    stream
        .write_all(format!("INTERVAL_US:{}\n", interval_us).as_bytes())
        .await?;

    let mut i: u64 = 0;
    while count == 0 || i < count {
        let phase = i as f64 / 10.0;
        let cpu0 = 50.0 + 40.0 * phase.sin();
        let cpu1 = 50.0 + 40.0 * phase.cos();
        let line = format!(
            "CPU:{:.2}%, CPU0:{:.2}%, CPU1:{:.2}%, RAM:{:.2}% (170/487 MB), FREQ0:{}MHz, FREQ1:{}MHz, Temp:{:.2}°C\n",
            (cpu0 + cpu1) / 2.0,
            cpu0,
            cpu1,
            30.0 + (i % 20) as f64,
            if i % 4 == 0 { 333 } else { 667 },
            667,
            45.0 + 2.0 * (phase / 3.0).sin(),
        );
        stream.write_all(line.as_bytes()).await?;
        i += 1;
        sleep(Duration::from_micros(interval_us)).await;
    }
    Ok(())
}
