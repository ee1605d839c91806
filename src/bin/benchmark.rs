use std::future::IntoFuture;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dualfs::fs;
use dualfs::options::{AccessMode, CopyMode, MkdirOptions, ReadOptions, ReaddirOptions, RmOptions, WriteOptions};
use dualfs::{BenchConfig, DualCall, Mode};
use futures::future::join_all;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum BenchMode {
    Blocking,
    Suspending,
    Both,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "dualfs 双模式基准测试", long_about = None)]
struct Args {
    /// JSON 配置文件，命令行参数优先
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 测试目录的父目录
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// 调用模式
    #[arg(long, value_enum, default_value_t = BenchMode::Both)]
    mode: BenchMode,

    /// 测试文件数量
    #[arg(short, long)]
    num_files: Option<usize>,

    /// 小文件大小（字节）
    #[arg(long)]
    small_size: Option<usize>,

    /// 大文件大小（字节）
    #[arg(long)]
    large_size: Option<usize>,

    /// 元数据操作重复次数
    #[arg(short, long)]
    iterations: Option<usize>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(BenchConfig, BenchMode)> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::load(path).with_context(|| format!("读取配置失败: {:?}", path))?,
            None => BenchConfig::default(),
        };
        if let Some(workdir) = self.workdir {
            config.workdir = workdir;
        }
        if let Some(num_files) = self.num_files {
            config.num_files = num_files;
        }
        if let Some(small_size) = self.small_size {
            config.small_size = small_size;
        }
        if let Some(large_size) = self.large_size {
            config.large_size = large_size;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        Ok((config, self.mode))
    }
}

struct BenchmarkResult {
    operation: String,
    duration: Duration,
    ops_per_sec: f64,
    mb_per_sec: Option<f64>,
}

impl BenchmarkResult {
    fn new(operation: &str, duration: Duration, ops: usize, bytes: Option<usize>) -> Self {
        let secs = duration.as_secs_f64().max(f64::EPSILON);
        Self {
            operation: operation.to_string(),
            duration,
            ops_per_sec: ops as f64 / secs,
            mb_per_sec: bytes.map(|b| (b as f64 / 1_048_576.0) / secs),
        }
    }

    fn print(&self) {
        print!("  {:<30} {:>10.3} ms", self.operation, self.duration.as_secs_f64() * 1000.0);
        print!(" | {:>8.1} ops/s", self.ops_per_sec);
        if let Some(mb_per_sec) = self.mb_per_sec {
            print!(" | {:>8.2} MB/s", mb_per_sec);
        }
        println!();
    }
}

/// Runs a bound call through the public surface for `mode`.
async fn exec<A, T>(call: DualCall<A, T>, mode: Mode) -> io::Result<T>
where
    A: Send + 'static,
    T: Send + 'static,
{
    match mode {
        Mode::Blocking => call.sync(),
        Mode::Suspending => call.await,
    }
}

/// Times `ops` sequential calls built by `make`.
async fn measure<A, T>(
    results: &mut Vec<BenchmarkResult>,
    name: &str,
    mode: Mode,
    ops: usize,
    bytes: Option<usize>,
    mut make: impl FnMut(usize) -> DualCall<A, T>,
) -> anyhow::Result<()>
where
    A: Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    for i in 0..ops {
        exec(make(i), mode).await.with_context(|| format!("{} 失败 (#{})", name, i))?;
    }
    results.push(BenchmarkResult::new(name, start.elapsed(), ops, bytes));
    Ok(())
}

async fn benchmark_mode(config: &BenchConfig, mode: Mode) -> anyhow::Result<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let dir = config.scratch_dir().join(format!("{:?}", mode).to_lowercase());
    println!("\n=== {:?} ===", mode);

    let small_data = vec![b'a'; config.small_size];
    let large_data = vec![b'b'; config.large_size];
    let large_count = 10.min(config.num_files);
    let small = |i: usize| dir.join(format!("small_{}.txt", i));
    let large = |i: usize| dir.join(format!("large_{}.txt", i));
    let copied = |i: usize| dir.join(format!("copy_{}.txt", i));
    let moved = |i: usize| dir.join(format!("moved_{}.txt", i));

    exec(fs::mkdir(&dir, MkdirOptions::recursive()), mode)
        .await
        .with_context(|| format!("创建测试目录失败: {:?}", dir))?;
    debug!("scratch directory {:?}", dir);

    println!("\n测试小文件写入 ({} 个文件, 每个 {} 字节)...", config.num_files, config.small_size);
    measure(&mut results, "writeFile 小文件", mode, config.num_files, Some(config.num_files * config.small_size), |i| {
        fs::write_file(small(i), small_data.as_slice(), WriteOptions::default())
    })
    .await?;

    println!("测试小文件读取...");
    measure(&mut results, "readFile 小文件", mode, config.num_files, Some(config.num_files * config.small_size), |i| {
        fs::read_file(small(i), ReadOptions::default())
    })
    .await?;

    println!("\n测试大文件写入 ({} 个文件, 每个 {} 字节)...", large_count, config.large_size);
    measure(&mut results, "writeFile 大文件", mode, large_count, Some(large_count * config.large_size), |i| {
        fs::write_file(large(i), large_data.as_slice(), WriteOptions::default())
    })
    .await?;

    println!("测试大文件读取...");
    measure(&mut results, "readFile 大文件", mode, large_count, Some(large_count * config.large_size), |i| {
        fs::read_file(large(i), ReadOptions::default())
    })
    .await?;

    println!("\n测试元数据操作 ({} 次)...", config.iterations);
    measure(&mut results, "stat", mode, config.iterations, None, |i| {
        fs::stat(small(i % config.num_files.max(1)))
    })
    .await?;
    measure(&mut results, "access", mode, config.iterations, None, |_| fs::access(&dir, AccessMode::EXISTS))
        .await?;
    measure(&mut results, "readdir", mode, config.iterations, None, |_| {
        fs::readdir(&dir, ReaddirOptions::default())
    })
    .await?;
    measure(&mut results, "chmod", mode, config.num_files, None, |i| fs::chmod(small(i), 0o644)).await?;
    let now = SystemTime::now();
    measure(&mut results, "utimes", mode, config.num_files, None, |i| fs::utimes(small(i), now, now)).await?;

    println!("\n测试复制、重命名与删除...");
    measure(&mut results, "copyFile", mode, config.num_files, Some(config.num_files * config.small_size), |i| {
        fs::copy_file(small(i), copied(i), CopyMode::empty())
    })
    .await?;
    measure(&mut results, "rename", mode, config.num_files, None, |i| fs::rename(copied(i), moved(i))).await?;
    measure(&mut results, "unlink", mode, config.num_files, None, |i| fs::unlink(moved(i))).await?;

    if mode == Mode::Suspending {
        println!("测试并发读取...");
        let start = Instant::now();
        let reads = (0..config.num_files).map(|i| fs::read_file(small(i), ReadOptions::default()).into_future());
        for result in join_all(reads).await {
            result.context("并发读取失败")?;
        }
        results.push(BenchmarkResult::new(
            "readFile 并发",
            start.elapsed(),
            config.num_files,
            Some(config.num_files * config.small_size),
        ));
    }

    exec(fs::rm(&dir, RmOptions::recursive().force()), mode)
        .await
        .with_context(|| format!("清理测试目录失败: {:?}", dir))?;

    Ok(results)
}

fn print_results(results: &[BenchmarkResult]) {
    println!("\n📊 性能测试结果:");
    println!("  {:<30} {:>10} | {:>8} | {:>8}", "操作", "耗时", "吞吐量", "带宽");
    println!("  {}", "-".repeat(70));
    for result in results {
        result.print();
    }
}

fn compare_results(blocking_results: &[BenchmarkResult], suspending_results: &[BenchmarkResult]) {
    println!("\n📈 性能对比:");
    println!("  {:<30} {:>15} {:>15} {:>10}", "操作", "Blocking (ms)", "Suspending (ms)", "差异");
    println!("  {}", "-".repeat(75));

    for blocking in blocking_results {
        let Some(suspending) = suspending_results.iter().find(|r| r.operation == blocking.operation) else {
            continue;
        };
        let blocking_ms = blocking.duration.as_secs_f64() * 1000.0;
        let suspending_ms = suspending.duration.as_secs_f64() * 1000.0;
        let diff_percent = (suspending_ms - blocking_ms) / blocking_ms.max(f64::EPSILON) * 100.0;

        print!("  {:<30}", blocking.operation);
        print!(" {:>15.3}", blocking_ms);
        print!(" {:>15.3}", suspending_ms);

        if diff_percent < -5.0 {
            print!(" \x1b[32m{:>9.1}%\x1b[0m", diff_percent); // 绿色：Suspending 更快
        } else if diff_percent > 5.0 {
            print!(" \x1b[31m{:>9.1}%\x1b[0m", diff_percent); // 红色：Blocking 更快
        } else {
            print!(" {:>9.1}%", diff_percent);
        }
        println!();
    }
}

fn print_config(config: &BenchConfig, dir: &Path) {
    println!("🚀 dualfs 性能基准测试");
    println!("配置：");
    println!("  运行 ID: {}", config.run_id);
    println!("  测试目录: {:?}", dir);
    println!("  测试文件数: {}", config.num_files);
    println!("  小文件大小: {} 字节", config.small_size);
    println!("  大文件大小: {} 字节", config.large_size);
    println!("  元数据重复次数: {}", config.iterations);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(false)
        .init();

    let (config, bench_mode) = Args::parse().into_config()?;
    let scratch = config.scratch_dir();
    print_config(&config, &scratch);
    info!(run_id = %config.run_id, "benchmark started");

    let mut blocking_results = Vec::new();
    let mut suspending_results = Vec::new();

    if bench_mode != BenchMode::Suspending {
        println!("\n\n🔧 测试阻塞模式 (.sync())...");
        blocking_results = benchmark_mode(&config, Mode::Blocking).await?;
        print_results(&blocking_results);
    }

    if bench_mode != BenchMode::Blocking {
        println!("\n\n🔧 测试挂起模式 (.await)...");
        suspending_results = benchmark_mode(&config, Mode::Suspending).await?;
        print_results(&suspending_results);
    }

    if bench_mode == BenchMode::Both {
        compare_results(&blocking_results, &suspending_results);
    }

    fs::rm(&scratch, RmOptions::recursive().force()).await?;
    info!(run_id = %config.run_id, "benchmark finished");
    println!("\n✅ 基准测试完成！");
    Ok(())
}
