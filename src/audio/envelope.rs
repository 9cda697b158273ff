//! Gain automation
//!
//! A small timeline of automation events evaluated in the time domain,
//! following the usual audio-parameter rules: a ramp runs from the previous
//! event's time and value to its own end time and value, and the value holds
//! after the last event.

/// One automation event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    /// Jump to `value` at `time`
    SetValue { value: f32, time: f64 },
    /// Straight line to `value`, arriving at `end_time`
    LinearRamp { value: f32, end_time: f64 },
    /// Exponential curve to `value`, arriving at `end_time`
    ///
    /// Both endpoints must be non-zero with the same sign; otherwise the
    /// previous value holds until `end_time`.
    ExponentialRamp { value: f32, end_time: f64 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. } => time,
            Automation::LinearRamp { end_time, .. } => end_time,
            Automation::ExponentialRamp { end_time, .. } => end_time,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. }
            | Automation::LinearRamp { value, .. }
            | Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

/// Amplitude envelope built from automation events
///
/// # Example
/// ```
/// use stillness::audio::Envelope;
///
/// let env = Envelope::new(0.0)
///     .set_value_at(0.0, 0.0)
///     .linear_ramp_to(1.0, 1.0);
/// assert_eq!(env.value_at(0.5), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    initial: f32,
    events: Vec<Automation>,
}

impl Envelope {
    /// Empty envelope holding `initial` forever
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    pub fn set_value_at(self, value: f32, time: f64) -> Self {
        self.push(Automation::SetValue { value, time })
    }

    pub fn linear_ramp_to(self, value: f32, end_time: f64) -> Self {
        self.push(Automation::LinearRamp { value, end_time })
    }

    pub fn exponential_ramp_to(self, value: f32, end_time: f64) -> Self {
        self.push(Automation::ExponentialRamp { value, end_time })
    }

    pub fn events(&self) -> &[Automation] {
        &self.events
    }

    /// Time of the last event, or 0 for an empty envelope
    pub fn end_time(&self) -> f64 {
        self.events.last().map(Automation::time).unwrap_or(0.0)
    }

    // Events are kept sorted by time; equal times keep insertion order.
    fn push(mut self, event: Automation) -> Self {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
        self
    }

    /// Gain at time `t` in seconds
    pub fn value_at(&self, t: f64) -> f32 {
        let mut prev_time = 0.0_f64;
        let mut prev_value = self.initial;

        for event in &self.events {
            let end = event.time();
            if t < end {
                return match *event {
                    Automation::SetValue { .. } => prev_value,
                    Automation::LinearRamp { value, .. } => {
                        let span = end - prev_time;
                        if span <= 0.0 {
                            return value;
                        }
                        let progress = ((t - prev_time) / span) as f32;
                        prev_value + (value - prev_value) * progress
                    }
                    Automation::ExponentialRamp { value, .. } => {
                        let span = end - prev_time;
                        if span <= 0.0 {
                            return value;
                        }
                        if prev_value == 0.0 || value == 0.0 || (prev_value < 0.0) != (value < 0.0) {
                            return prev_value;
                        }
                        let progress = (t - prev_time) / span;
                        let ratio = (value / prev_value) as f64;
                        (prev_value as f64 * ratio.powf(progress)) as f32
                    }
                };
            }
            prev_time = end;
            prev_value = event.value();
        }

        prev_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chord_voice() -> Envelope {
        Envelope::new(1.0)
            .set_value_at(0.0, 0.0)
            .linear_ramp_to(0.2 / 3.0, 0.02)
            .exponential_ramp_to(0.1 / 3.0, 0.5)
            .exponential_ramp_to(0.0001, 4.0)
    }

    #[test]
    fn test_empty_envelope_holds_initial() {
        let env = Envelope::new(0.7);
        assert_eq!(env.value_at(0.0), 0.7);
        assert_eq!(env.value_at(100.0), 0.7);
    }

    #[test]
    fn test_breakpoints() {
        let env = chord_voice();
        assert_eq!(env.value_at(0.0), 0.0);
        assert_relative_eq!(env.value_at(0.02), 0.2 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(env.value_at(0.5), 0.1 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(env.value_at(4.0), 0.0001, epsilon = 1e-7);
        assert_relative_eq!(env.value_at(10.0), 0.0001, epsilon = 1e-7);
    }

    #[test]
    fn test_linear_midpoint() {
        let env = chord_voice();
        assert_relative_eq!(env.value_at(0.01), 0.1 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_exponential_midpoint_is_geometric_mean() {
        let env = chord_voice();
        let expected = ((0.2_f64 / 3.0) * (0.1 / 3.0)).sqrt();
        assert_relative_eq!(env.value_at(0.26) as f64, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_rises_then_never_increases() {
        let env = chord_voice();
        let rate = 48000.0;
        let mut previous = env.value_at(0.0);
        for k in 1..(4 * 48000) {
            let t = k as f64 / rate;
            let value = env.value_at(t);
            if t <= 0.02 {
                assert!(value > previous, "not rising at t={}", t);
            } else {
                assert!(value <= previous, "rising at t={}", t);
            }
            previous = value;
        }
    }

    #[test]
    fn test_exponential_to_zero_holds() {
        let env = Envelope::new(0.5).exponential_ramp_to(0.0, 1.0);
        assert_eq!(env.value_at(0.5), 0.5);
        assert_eq!(env.value_at(1.0), 0.0);
    }

    #[test]
    fn test_events_sorted_by_time() {
        let env = Envelope::new(0.0)
            .linear_ramp_to(1.0, 2.0)
            .set_value_at(0.5, 1.0);
        assert_eq!(env.end_time(), 2.0);
        assert_eq!(env.events()[0], Automation::SetValue { value: 0.5, time: 1.0 });
    }
}
