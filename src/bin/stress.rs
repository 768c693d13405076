//! Counter stress test for the interposed entry points.
//!
//! Worker threads increment one shared counter, taking a `pthread_mutex_t`
//! around every increment, and the run fails if any update was lost.
//!
//! ```text
//! $ spinmutex-stress --threads 4 --iterations 1000 --repetitions 10
//! $ SPINMUTEX_LOG=debug spinmutex-stress --recursive --depth 3
//! ```
use clap::{value_t, App, Arg};
use libc::pthread_mutex_t;
use log::{Level, LevelFilter, Log, Metadata, Record};
use spinmutex::interpose::{pthread_mutex_lock, pthread_mutex_unlock};
use spinmutex::{RawMutex, PTHREAD_MUTEX_RECURSIVE_NP};
use std::cell::UnsafeCell;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

struct StressConfig {
    threads: usize,
    iterations: u64,
    repetitions: u64,
    recursive: bool,
    depth: u32,
}

impl StressConfig {
    fn from_args() -> Self {
        let matches = App::new("spinmutex-stress")
            .about("Increments a shared counter from several threads under one pthread mutex")
            .arg(
                Arg::with_name("threads")
                    .long("threads")
                    .takes_value(true)
                    .default_value("4")
                    .help("Worker threads per repetition"),
            )
            .arg(
                Arg::with_name("iterations")
                    .long("iterations")
                    .takes_value(true)
                    .default_value("1000")
                    .help("Increments per worker"),
            )
            .arg(
                Arg::with_name("repetitions")
                    .long("repetitions")
                    .takes_value(true)
                    .default_value("10")
                    .help("Times the whole worker set is spawned and joined"),
            )
            .arg(
                Arg::with_name("recursive")
                    .long("recursive")
                    .help("Use a recursive mutex"),
            )
            .arg(
                Arg::with_name("depth")
                    .long("depth")
                    .takes_value(true)
                    .default_value("2")
                    .help("Nesting depth of each increment with --recursive"),
            )
            .get_matches();

        Self {
            threads: value_t!(matches, "threads", usize).unwrap_or_else(|e| e.exit()),
            iterations: value_t!(matches, "iterations", u64).unwrap_or_else(|e| e.exit()),
            repetitions: value_t!(matches, "repetitions", u64).unwrap_or_else(|e| e.exit()),
            recursive: matches.is_present("recursive"),
            depth: value_t!(matches, "depth", u32).unwrap_or_else(|e| e.exit()).max(1),
        }
    }

    fn expected(&self) -> u64 {
        self.threads as u64 * self.iterations * self.repetitions
    }
}

struct Counter {
    mutex: UnsafeCell<pthread_mutex_t>,
    value: UnsafeCell<u64>,
}

// Safety: `value` is only touched between lock and unlock of `mutex`.
unsafe impl Sync for Counter {}

impl Counter {
    fn new(recursive: bool) -> Self {
        let mut mutex = libc::PTHREAD_MUTEX_INITIALIZER;
        if recursive {
            let template = RawMutex::new(PTHREAD_MUTEX_RECURSIVE_NP);
            unsafe { std::ptr::copy_nonoverlapping(template.as_ptr(), &mut mutex, 1) };
        }
        Self {
            mutex: UnsafeCell::new(mutex),
            value: UnsafeCell::new(0),
        }
    }

    fn increment(&self, depth: u32) {
        let mutex = self.mutex.get();
        for _ in 0..depth {
            assert_eq!(unsafe { pthread_mutex_lock(mutex) }, 0);
        }
        unsafe { *self.value.get() += 1 };
        for _ in 0..depth {
            assert_eq!(unsafe { pthread_mutex_unlock(mutex) }, 0);
        }
    }

    fn get(&self) -> u64 {
        unsafe { *self.value.get() }
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(
            std::io::stderr(),
            "[{:>5}][{}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

fn init_logging() {
    static LOGGER: StderrLogger = StderrLogger;
    let level = match std::env::var("SPINMUTEX_LOG").as_deref() {
        Ok("error") => LevelFilter::Error,
        Ok("warn") => LevelFilter::Warn,
        Ok("debug") => LevelFilter::Debug,
        Ok("trace") => LevelFilter::Trace,
        Ok("off") => LevelFilter::Off,
        _ => LevelFilter::Info,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() {
    init_logging();
    let config = StressConfig::from_args();
    log::debug!(
        "threads={} iterations={} repetitions={} recursive={} depth={}",
        config.threads,
        config.iterations,
        config.repetitions,
        config.recursive,
        config.depth
    );

    let depth = if config.recursive { config.depth } else { 1 };
    let counter = Arc::new(Counter::new(config.recursive));
    let begin = Instant::now();

    for repeat in 0..config.repetitions {
        log::info!("Repetition {}", repeat + 1);
        let handles: Vec<_> = (0..config.threads)
            .map(|_| {
                let counter = counter.clone();
                let iterations = config.iterations;
                std::thread::spawn(move || {
                    for _ in 0..iterations {
                        counter.increment(depth);
                    }
                })
            })
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                log::error!("worker panicked in repetition {}", repeat + 1);
                std::process::exit(1);
            }
        }
    }

    let elapsed = begin.elapsed();
    let value = counter.get();
    println!("Value: {value}");
    println!("Elapsed time: {:.6} micro-seconds.", elapsed.as_secs_f64() * 1e6);

    if value != config.expected() {
        log::error!("lost updates: expected {}, got {}", config.expected(), value);
        std::process::exit(1);
    }
    if log::log_enabled!(Level::Debug) {
        let per_op = elapsed.as_nanos() as f64 / config.expected().max(1) as f64;
        log::debug!("{per_op:.1} ns per locked increment");
    }
}
