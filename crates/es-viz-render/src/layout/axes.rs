/// Widest period span that still gets a minor tick per period.
pub const MAX_MINOR_TICK_SPAN: i128 = 200;

/// Axis configuration with tick generation and data→pixel mapping.
#[derive(Debug, Clone)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub tick_positions: Vec<f64>,
    pub tick_labels: Vec<String>,
    pub minor_ticks: Vec<f64>,
}

impl Axis {
    /// Auto-scale linear axis with "nice number" ticks.
    pub fn auto_linear(data_min: f64, data_max: f64, target_ticks: usize) -> Self {
        let (nice_min, nice_max, step) = nice_range(data_min, data_max, target_ticks);
        let n_steps = ((nice_max - nice_min) / step).round() as i64;
        let ticks: Vec<f64> = (0..=n_steps).map(|i| nice_min + i as f64 * step).collect();
        let labels = ticks.iter().map(|&v| format_tick(v, step)).collect();

        // 5 subdivisions per major
        let minor_step = step / 5.0;
        let minor = (0..=n_steps * 5)
            .filter(|i| i % 5 != 0)
            .map(|i| nice_min + i as f64 * minor_step)
            .collect();

        Self {
            min: nice_min,
            max: nice_max,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    /// Axis over integer periods `lo..=hi`, padded by `padding` on both sides.
    ///
    /// Ticks sit on integers; every period is labelled while that stays
    /// readable, otherwise every 2nd/5th/10th/20th/50th/100th... so at most
    /// `max_labels` ticks are produced for any span. Minor ticks mark the
    /// unlabelled periods only while the span is at most
    /// [`MAX_MINOR_TICK_SPAN`].
    pub fn periods(lo: i64, hi: i64, padding: f64, max_labels: usize) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        // i128 keeps `hi - lo + 1` exact for any pair of i64.
        let (lo_w, hi_w) = (i128::from(lo), i128::from(hi));
        let span = hi_w - lo_w + 1;
        let budget = max_labels.max(2) as i128;
        let every = label_stride(span, budget);

        let first = lo_w.div_euclid(every) * every + if lo_w.rem_euclid(every) == 0 { 0 } else { every };
        let mut ticks = Vec::new();
        let mut k = first;
        while k <= hi_w {
            ticks.push(k as f64);
            k += every;
        }
        let labels = ticks.iter().map(|&v| format!("{}", v as i64)).collect();
        let minor = if every > 1 && span <= MAX_MINOR_TICK_SPAN {
            (lo..=hi).filter(|k| i128::from(*k).rem_euclid(every) != 0).map(|k| k as f64).collect()
        } else {
            Vec::new()
        };

        Self {
            min: lo as f64 - padding,
            max: hi as f64 + padding,
            label: String::new(),
            tick_positions: ticks,
            tick_labels: labels,
            minor_ticks: minor,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Map a data value to pixel coordinate.
    pub fn data_to_pixel(&self, value: f64, px_min: f64, px_max: f64) -> f64 {
        let frac = (value - self.min) / (self.max - self.min);
        px_min + frac * (px_max - px_min)
    }

    /// True when `value` lies inside the axis limits.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Smallest 1-2-5 stride that labels `span` periods with at most `budget`
/// ticks.
fn label_stride(span: i128, budget: i128) -> i128 {
    let mut decade: i128 = 1;
    loop {
        for m in [1, 2, 5] {
            let every = m * decade;
            if (span + every - 1) / every <= budget {
                return every;
            }
        }
        decade *= 10;
    }
}

/// "Nice numbers" algorithm for pleasant tick spacing.
fn nice_range(data_min: f64, data_max: f64, target_ticks: usize) -> (f64, f64, f64) {
    if (data_max - data_min).abs() < 1e-12 {
        return (data_min - 1.0, data_max + 1.0, 1.0);
    }
    let range = data_max - data_min;
    let rough_step = range / (target_ticks.max(2) - 1) as f64;
    let step = nice_step(rough_step);
    let nice_min = (data_min / step).floor() * step;
    let nice_max = (data_max / step).ceil() * step;
    (nice_min, nice_max, step)
}

fn nice_step(rough: f64) -> f64 {
    let exp = rough.abs().log10().floor();
    let frac = rough / 10.0_f64.powf(exp);
    let nice_frac = if frac <= 1.5 {
        1.0
    } else if frac <= 3.5 {
        2.0
    } else if frac <= 7.5 {
        5.0
    } else {
        10.0
    };
    nice_frac * 10.0_f64.powf(exp)
}

fn format_tick(value: f64, step: f64) -> String {
    // Avoid "-0"
    let value = if value.abs() < step * 0.01 { 0.0 } else { value };
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    format!("{value:.decimals$}")
}
