//! Warm-up adaptation: step size by dual averaging (Hoffman & Gelman 2014)
//! and the inverse metric from expanding variance windows.

use putt_math::sample::RunningMoments;

const GAMMA: f64 = 0.05;
const T0: f64 = 10.0;
const KAPPA: f64 = 0.75;

/// Nesterov dual averaging of `ln ε` towards a target acceptance statistic.
#[derive(Debug, Clone)]
pub struct DualAveraging {
    target_accept: f64,
    mu: f64,
    counter: f64,
    h_bar: f64,
    log_step: f64,
    log_step_bar: f64,
}

impl DualAveraging {
    pub fn new(initial_step: f64, target_accept: f64) -> Self {
        let mut da = Self {
            target_accept,
            mu: 0.0,
            counter: 0.0,
            h_bar: 0.0,
            log_step: 0.0,
            log_step_bar: 0.0,
        };
        da.restart(initial_step);
        da
    }

    /// Forget the history and shrink towards `10 · step`.
    pub fn restart(&mut self, step: f64) {
        self.mu = (10.0 * step).ln();
        self.counter = 0.0;
        self.h_bar = 0.0;
        self.log_step = step.ln();
        self.log_step_bar = 0.0;
    }

    /// Feed one acceptance statistic; returns the next step size.
    pub fn update(&mut self, accept_stat: f64) -> f64 {
        let accept_stat = if accept_stat.is_finite() {
            accept_stat.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.counter += 1.0;
        let eta = 1.0 / (self.counter + T0);
        self.h_bar = (1.0 - eta) * self.h_bar + eta * (self.target_accept - accept_stat);
        self.log_step = self.mu - self.counter.sqrt() / GAMMA * self.h_bar;
        let weight = self.counter.powf(-KAPPA);
        self.log_step_bar = weight * self.log_step + (1.0 - weight) * self.log_step_bar;
        self.current()
    }

    pub fn current(&self) -> f64 {
        self.log_step.exp()
    }

    /// Averaged step size used after warm-up.
    pub fn final_step(&self) -> f64 {
        if self.counter == 0.0 {
            self.current()
        } else {
            self.log_step_bar.exp()
        }
    }
}

const INIT_BUFFER: usize = 75;
const TERM_BUFFER: usize = 50;
const BASE_WINDOW: usize = 25;
/// Below this many warm-up iterations only the step size adapts.
const MIN_METRIC_WARMUP: usize = 20;

/// Inverse-metric estimation over doubling windows between a fast initial
/// buffer and a terminal step-size-only buffer.
///
/// ```text
/// |init|  w  |   2w   |      4w (stretched)      |term|
/// ```
#[derive(Debug, Clone)]
pub struct WindowedAdaptation {
    num_warmup: usize,
    init_buffer: usize,
    term_buffer: usize,
    window_size: usize,
    next_window: usize,
    counter: usize,
    enabled: bool,
    moments: RunningMoments,
}

impl WindowedAdaptation {
    pub fn new(num_warmup: usize) -> Self {
        let enabled = num_warmup >= MIN_METRIC_WARMUP;
        let (init_buffer, term_buffer, base_window) =
            if INIT_BUFFER + TERM_BUFFER + BASE_WINDOW > num_warmup {
                let init = (0.15 * num_warmup as f64) as usize;
                let term = (0.1 * num_warmup as f64) as usize;
                (init, term, num_warmup.saturating_sub(init + term))
            } else {
                (INIT_BUFFER, TERM_BUFFER, BASE_WINDOW)
            };
        Self {
            num_warmup,
            init_buffer,
            term_buffer,
            window_size: base_window,
            next_window: (init_buffer + base_window).saturating_sub(1),
            counter: 0,
            enabled,
            moments: RunningMoments::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn last_window_end(&self) -> usize {
        self.num_warmup.saturating_sub(self.term_buffer + 1)
    }

    fn in_window(&self) -> bool {
        self.counter >= self.init_buffer
            && self.counter < self.num_warmup - self.term_buffer
            && self.counter != self.num_warmup
    }

    fn end_of_window(&self) -> bool {
        self.counter == self.next_window && self.counter != self.num_warmup
    }

    fn compute_next_window(&mut self) {
        if self.next_window == self.last_window_end() {
            return;
        }
        self.window_size *= 2;
        self.next_window = self.counter + self.window_size;
        if self.next_window != self.last_window_end() {
            let boundary = self.next_window + 2 * self.window_size;
            if boundary >= self.num_warmup - self.term_buffer {
                self.next_window = self.last_window_end();
            }
        }
    }

    /// Record one warm-up position. At the end of a window returns the new
    /// regularized variance estimate for the inverse metric.
    pub fn learn(&mut self, position: f64) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        if self.in_window() {
            self.moments.push(position);
        }
        let estimate = if self.end_of_window() {
            self.compute_next_window();
            let n = self.moments.count() as f64;
            let estimate = self
                .moments
                .variance()
                .map(|var| (n / (n + 5.0)) * var + 1e-3 * (5.0 / (n + 5.0)));
            self.moments.reset();
            estimate
        } else {
            None
        };
        self.counter += 1;
        estimate
    }
}
