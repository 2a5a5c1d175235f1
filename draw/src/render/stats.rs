//! Pipeline statistics.

use alloc::{format, string::String};
use core::fmt::{self, Display, Formatter};
use core::ops::AddAssign;
use core::time::Duration;
#[cfg(feature = "std")]
use std::time::Instant;

//
// Types
//

/// Collects and accumulates pipeline statistics and performance data.
#[derive(Clone, Debug, Default)]
pub struct Stats {
    /// Time spent drawing.
    pub time: Duration,
    /// Number of draw calls issued.
    pub calls: f32,
    /// Number of vertex shader invocations.
    pub batches: f32,
    /// Number of primitive queue flushes.
    pub flushes: f32,

    /// Primitives assembled / primitives reaching the sink.
    pub prims: Throughput,
    /// Vertices fetched / vertices shaded.
    pub verts: Throughput,

    #[cfg(feature = "std")]
    start: Option<Instant>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Throughput {
    // Count of items input.
    pub i: usize,
    // Count of items output.
    pub o: usize,
}

//
// Impls
//

impl Stats {
    /// Creates a new zeroed `Stats` instance.
    pub fn new() -> Self {
        Self::default()
    }
    /// Creates a `Stats` instance that records the time of its creation.
    ///
    /// Call [`finish`][Self::finish] to write the elapsed time to `self.time`.
    ///
    /// Equivalent to [`Stats::new`] if the `std` feature is not enabled.
    pub fn start() -> Self {
        Self {
            #[cfg(feature = "std")]
            start: Some(Instant::now()),
            ..Self::default()
        }
    }

    /// Stops the timer and records the elapsed time to `self.time`.
    ///
    /// No-op if the timer was not running. This method is also no-op unless
    /// the `std` feature is enabled.
    pub fn finish(self) -> Self {
        Self {
            #[cfg(feature = "std")]
            time: self
                .start
                .map(|st| st.elapsed())
                .unwrap_or(self.time),
            ..self
        }
    }

    /// Returns the average throughput in items per second.
    pub fn per_sec(&self) -> Self {
        let secs = if self.time.is_zero() {
            1.0
        } else {
            self.time.as_secs_f32()
        };
        let [prims, verts] = self.throughput().map(|stat| stat.per_sec(secs));
        Self {
            calls: self.calls / secs,
            batches: self.batches / secs,
            flushes: self.flushes / secs,
            time: Duration::from_secs(1),
            prims,
            verts,
            #[cfg(feature = "std")]
            start: None,
        }
    }
    /// Returns the average throughput in items per draw call.
    pub fn per_call(&self) -> Self {
        let calls = self.calls.max(1.0);
        let [prims, verts] =
            self.throughput().map(|stat| stat.per_call(calls));
        Self {
            calls: 1.0,
            batches: self.batches / calls,
            flushes: self.flushes / calls,
            time: self.time.div_f32(calls),
            prims,
            verts,
            #[cfg(feature = "std")]
            start: None,
        }
    }

    fn throughput(&self) -> [Throughput; 2] {
        [self.prims, self.verts]
    }

    fn counters(&self) -> [f32; 3] {
        [self.calls, self.batches, self.flushes]
    }
}

impl Throughput {
    fn per_sec(&self, secs: f32) -> Self {
        Self {
            i: (self.i as f32 / secs) as usize,
            o: (self.o as f32 / secs) as usize,
        }
    }
    fn per_call(&self, calls: f32) -> Self {
        Self {
            i: self.i / calls as usize,
            o: self.o / calls as usize,
        }
    }
}

impl Display for Stats {
    #[rustfmt::skip]
    #[inline(never)]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let w = f.width().unwrap_or(16);
        let per_s = self.per_sec();
        let per_c = self.per_call();
        writeln!(f, " STATS   {:>w$} │ {:>w$} │ {:>w$}",
            "TOTAL", "PER SEC", "PER CALL")?;
        rule(f, w)?;
        writeln!(f, " time    {:>w$} │ {empty:w$} │ {:>w$}",
            human_time(self.time), human_time(per_c.time), empty = "")?;

        let labels = ["calls", "batches", "flushes"];
        for (i, lbl) in (0..3).zip(labels) {
            let [tot, per_s, per_c] = [self, &per_s, &per_c].map(|s| s.counters()[i]);
            writeln!(f, " {lbl:7} {tot:>w$} │ {per_s:>w$.1} │ {per_c:>w$.1}")?;
        }
        rule(f, w)?;

        let labels = ["prims", "verts"];
        for (i, lbl) in (0..2).zip(labels) {
            let [tot, per_s, per_c] = [self, &per_s, &per_c].map(|s| s.throughput()[i]);

            if f.alternate() {
                writeln!(f, " {lbl:7} {tot:#w$} │ {per_s:#w$} │ {per_c:#w$}")?;
            } else {
                writeln!(f, " {lbl:7} {tot:w$} │ {per_s:w$} │ {per_c:w$}")?;
            }
        }
        Ok(())
    }
}

impl Display for Throughput {
    #[inline(never)]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let &Self { i, o } = self;
        let w = f.width().unwrap_or(10);
        if f.alternate() {
            if i == 0 {
                write!(f, "{:>w$}", "--")
            } else {
                let pct = 100.0 * o as f32 / i as f32;
                write!(f, "{pct:>w$.1}%", w = w - 1)
            }
        } else {
            let io = format!("{} / {}", human_num(i), human_num(o));
            write!(f, "{io:>w$}")
        }
    }
}

impl AddAssign for Stats {
    /// Appends the stats of `other` to `self`.
    fn add_assign(&mut self, other: Self) {
        self.time += other.time;
        self.calls += other.calls;
        self.batches += other.batches;
        self.flushes += other.flushes;
        self.prims += other.prims;
        self.verts += other.verts;
    }
}

impl AddAssign for Throughput {
    fn add_assign(&mut self, rhs: Self) {
        self.i += rhs.i;
        self.o += rhs.o;
    }
}

fn rule(f: &mut Formatter<'_>, w: usize) -> fmt::Result {
    writeln!(f, "─────────{empty:─>w$}─┼─{empty:─>w$}─┼─{empty:─>w$}─", empty = "")
}

#[inline(never)]
fn human_num(n: usize) -> String {
    if n < 1_000 {
        format!("{n:5}")
    } else if n < 100_000 {
        format!("{:4.1}k", n as f32 / 1_000.)
    } else if n < 1_000_000 {
        format!("{:4}k", n / 1_000)
    } else if n < 100_000_000 {
        format!("{:4.1}M", n as f32 / 1_000_000.)
    } else if n < 1_000_000_000 {
        format!("{:4}M", n / 1_000_000)
    } else if (n as u64) < 100_000_000_000 {
        format!("{:4.1}G", n as f32 / 1_000_000_000.)
    } else {
        format!("{n:5.1e}")
    }
}

#[inline(never)]
fn human_time(d: Duration) -> String {
    let secs = d.as_secs_f32();
    if secs < 1e-3 {
        format!("{:4.1}μs", secs * 1_000_000.)
    } else if secs < 1.0 {
        format!("{:4.1}ms", secs * 1_000.)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}min {:02.0}s", secs / 60.0, secs % 60.0)
    }
}
